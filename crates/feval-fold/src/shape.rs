//! Shape inference: the rank and per-dimension extent of any expression,
//! when they can be determined at compile time.
//!
//! A shape is an ordered sequence of optional SubscriptInteger extent
//! expressions: `None` at the outer level means the shape itself cannot be
//! inferred, `None` in one slot means only that extent is unknown.

use crate::context::FoldingContext;
use crate::fold::Fold;
use crate::traverse::{contains_any_implied_do_index, to_int64_integer};
use feval_core::constant::{Constant, Scalar};
use feval_core::expr::{
    ArrayConstructor, ArrayConstructorValue, ArrayRef, ArrayRefBase, CharacterExpr, CoarrayRef,
    ComplexExpr, Component, DataRef, DerivedExpr, Designator, Expr, IntegerExpr, LogicalExpr,
    NumericExpr, RealExpr, Relational, Subscript, SubstringParent, Triplet,
};
use feval_core::symbol::Symbol;
use feval_core::types::{DynamicType, Ordering};
use feval_core::value::IntValue;

pub type ExtentExpr = IntegerExpr;
pub type MaybeExtent = Option<ExtentExpr>;
pub type Shape = Vec<MaybeExtent>;

/// The trip count of `lower:upper:stride`: MAX(0, (upper-lower+stride)/stride),
/// folded as far as the bounds allow.
pub fn count_trips(
    ctx: &mut FoldingContext,
    lower: ExtentExpr,
    upper: ExtentExpr,
    stride: ExtentExpr,
) -> ExtentExpr {
    let span = (upper - lower + stride.clone()) / stride;
    let counted = IntegerExpr::extremum(Ordering::Greater, IntegerExpr::subscript(0), span)
        .unwrap_or_else(|_| IntegerExpr::subscript(0));
    counted.fold(ctx)
}

/// SIZE() == the product of the extents, when they are all known.
pub fn get_size(ctx: &mut FoldingContext, shape: &Shape) -> MaybeExtent {
    let mut product = IntegerExpr::subscript(1);
    for extent in shape {
        product = (product * extent.clone()?).fold(ctx);
    }
    Some(product)
}

/// All extents as compile-time values, or nothing.
pub fn constant_extents(ctx: &mut FoldingContext, shape: &Shape) -> Option<Vec<i64>> {
    shape
        .iter()
        .map(|extent| {
            let folded = extent.clone()?.fold(ctx);
            to_int64_integer(&folded)
        })
        .collect()
}

/// The shape as a rank-1 SubscriptInteger array expression, defined only
/// when every extent is known.
pub fn as_extent_array_expr(shape: &Shape) -> Option<IntegerExpr> {
    let values: Option<Vec<ArrayConstructorValue<IntegerExpr>>> = shape
        .iter()
        .map(|extent| extent.clone().map(ArrayConstructorValue::Expr))
        .collect();
    Some(IntegerExpr::ArrayConstructor(Box::new(
        ArrayConstructor::new(DynamicType::subscript_integer(), values?),
    )))
}

/// Compare corresponding extents where both are known constants.  Emits an
/// error and returns false on any mismatch; symbolic extents are presumed
/// conformable.
pub fn check_conformance(
    ctx: &mut FoldingContext,
    left: &Shape,
    right: &Shape,
    left_name: &str,
    right_name: &str,
) -> bool {
    if left.len() != right.len() {
        ctx.messages_mut().say_error(format!(
            "{} and {} shapes are not conformable",
            left_name, right_name
        ));
        return false;
    }
    for (left_extent, right_extent) in left.iter().zip(right) {
        let (Some(left_extent), Some(right_extent)) = (left_extent, right_extent) else {
            continue;
        };
        let left_value = to_int64_integer(&left_extent.clone().fold(ctx));
        let right_value = to_int64_integer(&right_extent.clone().fold(ctx));
        if let (Some(l), Some(r)) = (left_value, right_value) {
            if l != r {
                ctx.messages_mut().say_error(format!(
                    "{} and {} shapes are not conformable",
                    left_name, right_name
                ));
                return false;
            }
        }
    }
    true
}

fn scalar_shape() -> Option<Shape> {
    Some(Shape::new())
}

fn constant_shape(constant: &Constant) -> Option<Shape> {
    Some(
        constant
            .shape()
            .iter()
            .map(|&extent| Some(IntegerExpr::subscript(extent)))
            .collect(),
    )
}

fn symbol_shape(symbol: &Symbol) -> Option<Shape> {
    Some(
        symbol
            .declared_shape
            .iter()
            .map(|extent| extent.map(IntegerExpr::subscript))
            .collect(),
    )
}

fn triplet_extent(
    ctx: &mut FoldingContext,
    triplet: &Triplet,
    declared: Option<i64>,
) -> MaybeExtent {
    let lower = match &triplet.lower {
        Some(e) => (**e).clone(),
        None => IntegerExpr::subscript(1),
    };
    let upper = match &triplet.upper {
        Some(e) => (**e).clone(),
        None => IntegerExpr::subscript(declared?),
    };
    Some(count_trips(ctx, lower, upper, (*triplet.stride).clone()))
}

fn subscripts_shape(
    ctx: &mut FoldingContext,
    subscripts: &[Subscript],
    declared: &[Option<i64>],
) -> Option<Shape> {
    let mut shape = Shape::new();
    for (dimension, subscript) in subscripts.iter().enumerate() {
        match subscript {
            Subscript::Expr(e) if e.rank() == 0 => {}
            Subscript::Expr(e) => {
                // vector subscript: contributes its own rank-1 extent
                let vector_shape = integer_shape(ctx, e)?;
                shape.extend(vector_shape);
            }
            Subscript::Triplet(t) => {
                let declared_extent = declared.get(dimension).copied().flatten();
                shape.push(triplet_extent(ctx, t, declared_extent));
            }
        }
    }
    Some(shape)
}

fn array_ref_shape(ctx: &mut FoldingContext, array_ref: &ArrayRef) -> Option<Shape> {
    let declared = match &array_ref.base {
        ArrayRefBase::Symbol(s) => s.declared_shape.clone(),
        ArrayRefBase::Component(c) => c.symbol.declared_shape.clone(),
    };
    subscripts_shape(ctx, &array_ref.subscripts, &declared)
}

fn coarray_ref_shape(ctx: &mut FoldingContext, coarray: &CoarrayRef) -> Option<Shape> {
    subscripts_shape(ctx, &coarray.subscripts, &coarray.base.declared_shape)
}

fn component_shape(ctx: &mut FoldingContext, component: &Component) -> Option<Shape> {
    if component.symbol.rank() > 0 {
        symbol_shape(&component.symbol)
    } else {
        data_ref_shape(ctx, &component.base)
    }
}

fn data_ref_shape(ctx: &mut FoldingContext, data_ref: &DataRef) -> Option<Shape> {
    match data_ref {
        DataRef::Symbol(s) => symbol_shape(s),
        DataRef::Component(c) => component_shape(ctx, c),
        DataRef::ArrayRef(a) => array_ref_shape(ctx, a),
        DataRef::CoarrayRef(c) => coarray_ref_shape(ctx, c),
    }
}

pub fn designator_shape(ctx: &mut FoldingContext, designator: &Designator) -> Option<Shape> {
    match designator {
        Designator::Symbol(s) => symbol_shape(s),
        Designator::Component(c) => component_shape(ctx, c),
        Designator::ArrayRef(a) => array_ref_shape(ctx, a),
        Designator::CoarrayRef(c) => coarray_ref_shape(ctx, c),
        Designator::Substring(s) => match &s.parent {
            SubstringParent::DataRef(d) => data_ref_shape(ctx, d),
            SubstringParent::Literal(_) => scalar_shape(),
        },
        Designator::ComplexPart(p) => data_ref_shape(ctx, &p.complex),
    }
}

/// The extent a constructor element contributes: the size of an expression
/// element, or trip-count times body extent for an implied-DO whose bounds
/// do not depend on other implied-DO indices (triangular nests give up).
fn constructor_extent<E>(
    ctx: &mut FoldingContext,
    values: &[ArrayConstructorValue<E>],
    element_shape: fn(&mut FoldingContext, &E) -> Option<Shape>,
) -> MaybeExtent {
    let mut result = IntegerExpr::subscript(0);
    for value in values {
        match value {
            ArrayConstructorValue::Expr(e) => {
                let shape = element_shape(ctx, e)?;
                let size = get_size(ctx, &shape)?;
                result = (result + size).fold(ctx);
            }
            ArrayConstructorValue::ImpliedDo(ido) => {
                if contains_any_implied_do_index(&ido.lower)
                    || contains_any_implied_do_index(&ido.upper)
                    || contains_any_implied_do_index(&ido.stride)
                {
                    return None;
                }
                let body = constructor_extent(ctx, &ido.values, element_shape)?;
                let trips = count_trips(
                    ctx,
                    (*ido.lower).clone(),
                    (*ido.upper).clone(),
                    (*ido.stride).clone(),
                );
                result = (result + body * trips).fold(ctx);
            }
        }
    }
    Some(result)
}

pub fn integer_shape(ctx: &mut FoldingContext, expr: &IntegerExpr) -> Option<Shape> {
    match expr {
        IntegerExpr::Constant(c) => constant_shape(c),
        IntegerExpr::Designator(d) => designator_shape(ctx, d),
        IntegerExpr::FunctionRef(_) => scalar_shape(),
        IntegerExpr::ArrayConstructor(a) => {
            Some(vec![constructor_extent(ctx, &a.values, integer_shape)])
        }
        IntegerExpr::TypeParamInquiry(_) => scalar_shape(),
        IntegerExpr::ImpliedDoIndex(_) => scalar_shape(),
        IntegerExpr::Parentheses(p) => integer_shape(ctx, &p.operand),
        IntegerExpr::Negate(n) => integer_shape(ctx, &n.operand),
        IntegerExpr::Convert(c) => numeric_shape(ctx, &c.operand),
        IntegerExpr::Binary(b) => {
            if b.right.rank() > 0 {
                integer_shape(ctx, &b.right)
            } else {
                integer_shape(ctx, &b.left)
            }
        }
        IntegerExpr::Extremum(e) => {
            if e.right.rank() > 0 {
                integer_shape(ctx, &e.right)
            } else {
                integer_shape(ctx, &e.left)
            }
        }
    }
}

pub fn real_shape(ctx: &mut FoldingContext, expr: &RealExpr) -> Option<Shape> {
    match expr {
        RealExpr::Constant(c) => constant_shape(c),
        RealExpr::Designator(d) => designator_shape(ctx, d),
        RealExpr::FunctionRef(_) => scalar_shape(),
        RealExpr::ArrayConstructor(a) => Some(vec![constructor_extent(ctx, &a.values, real_shape)]),
        RealExpr::Parentheses(p) => real_shape(ctx, &p.operand),
        RealExpr::Negate(n) => real_shape(ctx, &n.operand),
        RealExpr::Convert(c) => numeric_shape(ctx, &c.operand),
        RealExpr::ComplexComponent(c) => complex_shape(ctx, &c.operand),
        RealExpr::Binary(b) => {
            if b.right.rank() > 0 {
                real_shape(ctx, &b.right)
            } else {
                real_shape(ctx, &b.left)
            }
        }
        RealExpr::RealToIntPower(p) => {
            if p.exponent.rank() > 0 {
                integer_shape(ctx, &p.exponent)
            } else {
                real_shape(ctx, &p.base)
            }
        }
        RealExpr::Extremum(e) => {
            if e.right.rank() > 0 {
                real_shape(ctx, &e.right)
            } else {
                real_shape(ctx, &e.left)
            }
        }
    }
}

pub fn complex_shape(ctx: &mut FoldingContext, expr: &ComplexExpr) -> Option<Shape> {
    match expr {
        ComplexExpr::Constant(c) => constant_shape(c),
        ComplexExpr::Designator(d) => designator_shape(ctx, d),
        ComplexExpr::FunctionRef(_) => scalar_shape(),
        ComplexExpr::ArrayConstructor(a) => {
            Some(vec![constructor_extent(ctx, &a.values, complex_shape)])
        }
        ComplexExpr::Parentheses(p) => complex_shape(ctx, &p.operand),
        ComplexExpr::Construct(c) => {
            if c.im.rank() > 0 {
                real_shape(ctx, &c.im)
            } else {
                real_shape(ctx, &c.re)
            }
        }
        ComplexExpr::Binary(b) => {
            if b.right.rank() > 0 {
                complex_shape(ctx, &b.right)
            } else {
                complex_shape(ctx, &b.left)
            }
        }
        ComplexExpr::RealToIntPower(p) => {
            if p.exponent.rank() > 0 {
                integer_shape(ctx, &p.exponent)
            } else {
                complex_shape(ctx, &p.base)
            }
        }
    }
}

pub fn character_shape(ctx: &mut FoldingContext, expr: &CharacterExpr) -> Option<Shape> {
    match expr {
        CharacterExpr::Constant(c) => constant_shape(c),
        CharacterExpr::Designator(d) => designator_shape(ctx, d),
        CharacterExpr::FunctionRef(_) => scalar_shape(),
        CharacterExpr::ArrayConstructor(a) => {
            Some(vec![constructor_extent(ctx, &a.values, character_shape)])
        }
        CharacterExpr::Parentheses(p) => character_shape(ctx, &p.operand),
        CharacterExpr::Convert(c) => character_shape(ctx, &c.operand),
        CharacterExpr::Concat(c) => {
            if c.right.rank() > 0 {
                character_shape(ctx, &c.right)
            } else {
                character_shape(ctx, &c.left)
            }
        }
        CharacterExpr::SetLength(s) => character_shape(ctx, &s.string),
        CharacterExpr::Extremum(e) => {
            if e.right.rank() > 0 {
                character_shape(ctx, &e.right)
            } else {
                character_shape(ctx, &e.left)
            }
        }
    }
}

pub fn logical_shape(ctx: &mut FoldingContext, expr: &LogicalExpr) -> Option<Shape> {
    match expr {
        LogicalExpr::Constant(c) => constant_shape(c),
        LogicalExpr::Designator(d) => designator_shape(ctx, d),
        LogicalExpr::FunctionRef(_) => scalar_shape(),
        LogicalExpr::ArrayConstructor(a) => {
            Some(vec![constructor_extent(ctx, &a.values, logical_shape)])
        }
        LogicalExpr::Parentheses(p) => logical_shape(ctx, &p.operand),
        LogicalExpr::Convert(c) => logical_shape(ctx, &c.operand),
        LogicalExpr::Not(n) => logical_shape(ctx, &n.operand),
        LogicalExpr::Binary(b) => {
            if b.right.rank() > 0 {
                logical_shape(ctx, &b.right)
            } else {
                logical_shape(ctx, &b.left)
            }
        }
        LogicalExpr::Relational(r) => relational_shape(ctx, r),
    }
}

fn relational_shape(ctx: &mut FoldingContext, relation: &Relational) -> Option<Shape> {
    match relation {
        Relational::Integer(r) => {
            if r.right.rank() > 0 {
                integer_shape(ctx, &r.right)
            } else {
                integer_shape(ctx, &r.left)
            }
        }
        Relational::Real(r) => {
            if r.right.rank() > 0 {
                real_shape(ctx, &r.right)
            } else {
                real_shape(ctx, &r.left)
            }
        }
        Relational::Character(r) => {
            if r.right.rank() > 0 {
                character_shape(ctx, &r.right)
            } else {
                character_shape(ctx, &r.left)
            }
        }
    }
}

pub fn derived_shape(ctx: &mut FoldingContext, expr: &DerivedExpr) -> Option<Shape> {
    match expr {
        DerivedExpr::Constant(c) => constant_shape(c),
        DerivedExpr::ArrayConstructor(a) => {
            Some(vec![constructor_extent(ctx, &a.values, derived_shape)])
        }
        DerivedExpr::StructureConstructor(_) => scalar_shape(),
        DerivedExpr::Designator(d) => designator_shape(ctx, d),
        DerivedExpr::FunctionRef(_) => scalar_shape(),
    }
}

fn numeric_shape(ctx: &mut FoldingContext, expr: &NumericExpr) -> Option<Shape> {
    match expr {
        NumericExpr::Integer(e) => integer_shape(ctx, e),
        NumericExpr::Real(e) => real_shape(ctx, e),
    }
}

/// Shape inference over a generic expression.  Typeless expressions are
/// scalar by definition.
pub fn get_shape(ctx: &mut FoldingContext, expr: &Expr) -> Option<Shape> {
    match expr {
        Expr::Integer(e) => integer_shape(ctx, e),
        Expr::Real(e) => real_shape(ctx, e),
        Expr::Complex(e) => complex_shape(ctx, e),
        Expr::Character(e) => character_shape(ctx, e),
        Expr::Logical(e) => logical_shape(ctx, e),
        Expr::Derived(e) => derived_shape(ctx, e),
        Expr::BozLiteral(_)
        | Expr::NullPointer(_)
        | Expr::ProcedureDesignator(_)
        | Expr::ProcedureRef(_) => scalar_shape(),
    }
}

/// The total element count of a shape, as a plain integer.
pub fn get_constant_size(ctx: &mut FoldingContext, shape: &Shape) -> Option<i64> {
    let size = get_size(ctx, shape)?;
    to_int64_integer(&size)
}

/// A constant shape from inferred extents, for reshaping folded arrays.
pub fn as_constant_shape(ctx: &mut FoldingContext, shape: &Shape) -> Option<Constant> {
    let extents = constant_extents(ctx, shape)?;
    let elements = extents
        .iter()
        .map(|&e| {
            Scalar::Integer(IntValue::wrapped(
                feval_core::types::SUBSCRIPT_INTEGER_KIND,
                e as i128,
            ))
        })
        .collect();
    Constant::array(
        DynamicType::subscript_integer(),
        vec![extents.len() as i64],
        elements,
    )
    .ok()
}
