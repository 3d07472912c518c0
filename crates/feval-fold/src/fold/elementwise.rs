//! The elementwise lift: applying a scalar operation across constant
//! array operands, e.g. rewriting `[A,1]+[B,2]` into `[A+B,3]`.
//!
//! The lift has three phases.  Flattening turns a constant, a flat array
//! constructor, or parentheses around either into a per-element expression
//! list.  Mapping applies the operation element by element, folding each
//! result.  Reassembly folds the produced constructor back into a shaped
//! constant when possible.

use crate::context::FoldingContext;
use crate::fold::Fold;
use crate::shape::{
    character_shape, check_conformance, complex_shape, constant_extents, derived_shape,
    integer_shape, logical_shape, real_shape, Shape,
};
use crate::traverse::{
    is_expandable_scalar_character, is_expandable_scalar_complex, is_expandable_scalar_integer,
    is_expandable_scalar_logical, is_expandable_scalar_real,
};
use feval_core::constant::Constant;
use feval_core::expr::{
    ArrayConstructor, ArrayConstructorValue, CharacterExpr, ComplexExpr, DerivedExpr, IntegerExpr,
    LogicalExpr, RealExpr,
};
use feval_core::types::DynamicType;
use itertools::Itertools;

/// What the lift needs from a category expression type.
pub(crate) trait FoldCategory: Fold + Clone + PartialEq + Sized {
    fn rank_of(&self) -> usize;
    fn shape_of(&self, ctx: &mut FoldingContext) -> Option<Shape>;
    fn as_constant(&self) -> Option<&Constant>;
    fn from_constant(constant: Constant) -> Self;
    fn as_array_constructor(&self) -> Option<&ArrayConstructor<Self>>;
    fn wrap_array_constructor(ac: ArrayConstructor<Self>) -> Self;
    fn parenthesized_operand(&self) -> Option<&Self>;
    fn is_expandable_scalar(&self) -> bool;
}

macro_rules! impl_fold_category {
    ($ty:ident, $shape_fn:path, $expandable:expr) => {
        impl FoldCategory for $ty {
            fn rank_of(&self) -> usize {
                self.rank()
            }

            fn shape_of(&self, ctx: &mut FoldingContext) -> Option<Shape> {
                $shape_fn(ctx, self)
            }

            fn as_constant(&self) -> Option<&Constant> {
                match self {
                    $ty::Constant(c) => Some(c),
                    _ => None,
                }
            }

            fn from_constant(constant: Constant) -> Self {
                $ty::Constant(constant)
            }

            fn as_array_constructor(&self) -> Option<&ArrayConstructor<Self>> {
                match self {
                    $ty::ArrayConstructor(a) => Some(a),
                    _ => None,
                }
            }

            fn wrap_array_constructor(ac: ArrayConstructor<Self>) -> Self {
                $ty::ArrayConstructor(Box::new(ac))
            }

            fn parenthesized_operand(&self) -> Option<&Self> {
                match self {
                    $ty::Parentheses(p) => Some(&p.operand),
                    _ => None,
                }
            }

            fn is_expandable_scalar(&self) -> bool {
                $expandable(self)
            }
        }
    };
}

impl_fold_category!(IntegerExpr, integer_shape, is_expandable_scalar_integer);
impl_fold_category!(RealExpr, real_shape, is_expandable_scalar_real);
impl_fold_category!(ComplexExpr, complex_shape, is_expandable_scalar_complex);
impl_fold_category!(LogicalExpr, logical_shape, is_expandable_scalar_logical);

// Character expressions carry a length; derived expressions have no
// parentheses variant and never expand.

impl FoldCategory for CharacterExpr {
    fn rank_of(&self) -> usize {
        self.rank()
    }

    fn shape_of(&self, ctx: &mut FoldingContext) -> Option<Shape> {
        character_shape(ctx, self)
    }

    fn as_constant(&self) -> Option<&Constant> {
        match self {
            CharacterExpr::Constant(c) => Some(c),
            _ => None,
        }
    }

    fn from_constant(constant: Constant) -> Self {
        CharacterExpr::Constant(constant)
    }

    fn as_array_constructor(&self) -> Option<&ArrayConstructor<Self>> {
        match self {
            CharacterExpr::ArrayConstructor(a) => Some(a),
            _ => None,
        }
    }

    fn wrap_array_constructor(ac: ArrayConstructor<Self>) -> Self {
        CharacterExpr::ArrayConstructor(Box::new(ac))
    }

    fn parenthesized_operand(&self) -> Option<&Self> {
        match self {
            CharacterExpr::Parentheses(p) => Some(&p.operand),
            _ => None,
        }
    }

    fn is_expandable_scalar(&self) -> bool {
        is_expandable_scalar_character(self)
    }
}

impl FoldCategory for DerivedExpr {
    fn rank_of(&self) -> usize {
        self.rank()
    }

    fn shape_of(&self, ctx: &mut FoldingContext) -> Option<Shape> {
        derived_shape(ctx, self)
    }

    fn as_constant(&self) -> Option<&Constant> {
        match self {
            DerivedExpr::Constant(c) => Some(c),
            _ => None,
        }
    }

    fn from_constant(constant: Constant) -> Self {
        DerivedExpr::Constant(constant)
    }

    fn as_array_constructor(&self) -> Option<&ArrayConstructor<Self>> {
        match self {
            DerivedExpr::ArrayConstructor(a) => Some(a),
            _ => None,
        }
    }

    fn wrap_array_constructor(ac: ArrayConstructor<Self>) -> Self {
        DerivedExpr::ArrayConstructor(Box::new(ac))
    }

    fn parenthesized_operand(&self) -> Option<&Self> {
        None
    }

    fn is_expandable_scalar(&self) -> bool {
        false
    }
}

/// Phase one: linearize into one expression per element, in array element
/// order, when the operand is a constant, an implied-DO-free constructor,
/// or parentheses around either.
pub(crate) fn as_flat_elements<E: FoldCategory>(expr: &E) -> Option<Vec<E>> {
    if let Some(constant) = expr.as_constant() {
        let mut out = Vec::with_capacity(constant.size());
        for element in constant.elements() {
            out.push(E::from_constant(Constant::scalar(element.clone())));
        }
        return Some(out);
    }
    if let Some(ac) = expr.as_array_constructor() {
        let mut out = Vec::with_capacity(ac.values.len());
        for value in &ac.values {
            match value {
                ArrayConstructorValue::Expr(e) => out.push(e.clone()),
                ArrayConstructorValue::ImpliedDo(_) => return None,
            }
        }
        return Some(out);
    }
    if let Some(inner) = expr.parenthesized_operand() {
        return as_flat_elements(inner);
    }
    None
}

/// Phase three: rebuild a constructor from mapped elements, fold it, and
/// reshape the folded constant to the operand shape.
fn from_mapped_elements<R: FoldCategory>(
    ctx: &mut FoldingContext,
    result_ty: DynamicType,
    length: Option<IntegerExpr>,
    elements: Vec<R>,
    extents: Option<Vec<i64>>,
) -> R {
    let mut ac = ArrayConstructor::new(
        result_ty,
        elements.into_iter().map(ArrayConstructorValue::Expr).collect(),
    );
    if let Some(length) = length {
        ac = ac.with_length(length);
    }
    let folded = R::wrap_array_constructor(ac).fold(ctx);
    if let Some(extents) = extents {
        if let Some(constant) = folded.as_constant() {
            if let Ok(reshaped) = constant.clone().with_shape(extents) {
                return R::from_constant(reshaped);
            }
        }
    }
    folded
}

/// Unary lift.  `result_ty`/`length` describe the constructor to build for
/// the mapped elements; `rebuild` re-wraps one element in the operation.
pub(crate) fn apply_elementwise_unary<O, R>(
    ctx: &mut FoldingContext,
    operand: &O,
    result_ty: DynamicType,
    length: Option<IntegerExpr>,
    rebuild: &dyn Fn(O) -> R,
) -> Option<R>
where
    O: FoldCategory,
    R: FoldCategory,
{
    if operand.rank_of() == 0 {
        return None;
    }
    let shape = operand.shape_of(ctx)?;
    let elements = as_flat_elements(operand)?;
    let extents = constant_extents(ctx, &shape);
    let mut mapped = Vec::with_capacity(elements.len());
    for element in elements {
        mapped.push(rebuild(element).fold(ctx));
    }
    Some(from_mapped_elements(ctx, result_ty, length, mapped, extents))
}

/// Binary lift over array/array, array/scalar, and scalar/array operand
/// combinations.  Non-conforming known shapes emit one diagnostic and
/// leave the operation unfolded; scalars expand only when doing so cannot
/// duplicate side effects.
pub(crate) fn apply_elementwise_binary<L, R, RES>(
    ctx: &mut FoldingContext,
    left: &L,
    right: &R,
    result_ty: DynamicType,
    length: Option<IntegerExpr>,
    rebuild: &dyn Fn(L, R) -> RES,
) -> Option<RES>
where
    L: FoldCategory,
    R: FoldCategory,
    RES: FoldCategory,
{
    if left.rank_of() > 0 {
        let left_shape = left.shape_of(ctx)?;
        let left_elements = as_flat_elements(left)?;
        if right.rank_of() > 0 {
            let right_shape = right.shape_of(ctx)?;
            let right_elements = as_flat_elements(right)?;
            if !check_conformance(ctx, &left_shape, &right_shape, "left operand", "right operand")
            {
                return None;
            }
            if left_elements.len() != right_elements.len() {
                return None;
            }
            let extents = constant_extents(ctx, &left_shape);
            let mut mapped = Vec::with_capacity(left_elements.len());
            for (l, r) in left_elements.into_iter().zip_eq(right_elements) {
                mapped.push(rebuild(l, r).fold(ctx));
            }
            Some(from_mapped_elements(ctx, result_ty, length, mapped, extents))
        } else if right.is_expandable_scalar() {
            let extents = constant_extents(ctx, &left_shape);
            let mut mapped = Vec::with_capacity(left_elements.len());
            for l in left_elements {
                mapped.push(rebuild(l, right.clone()).fold(ctx));
            }
            Some(from_mapped_elements(ctx, result_ty, length, mapped, extents))
        } else {
            None
        }
    } else if right.rank_of() > 0 && left.is_expandable_scalar() {
        let shape = right.shape_of(ctx)?;
        let right_elements = as_flat_elements(right)?;
        let extents = constant_extents(ctx, &shape);
        let mut mapped = Vec::with_capacity(right_elements.len());
        for r in right_elements {
            mapped.push(rebuild(left.clone(), r).fold(ctx));
        }
        Some(from_mapped_elements(ctx, result_ty, length, mapped, extents))
    } else {
        None
    }
}
