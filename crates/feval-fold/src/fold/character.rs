//! Folding of character expressions: concatenation, length adjustment,
//! ASCII-only kind conversion, extrema, and substring extraction from
//! literals.

use crate::context::FoldingContext;
use crate::fold::variable::{fold_designator, fold_substring};
use crate::fold::{
    apply_elementwise_binary, apply_elementwise_unary, constant_char, fold_array_constructor,
    intrinsics, scalar_char, scalar_int, Fold,
};
use crate::traverse::to_int64_integer;
use feval_core::expr::{
    CharacterExpr, ConcatOp, Convert, Designator, ExtremumOperation, IntegerExpr, Parenthesized,
    SetLengthOp, SubstringParent,
};
use feval_core::types::{DynamicType, Ordering, TypeCategory};
use feval_core::value::CharValue;

impl Fold for CharacterExpr {
    fn fold(self, ctx: &mut FoldingContext) -> Self {
        match self {
            CharacterExpr::Constant(c) => CharacterExpr::Constant(c),
            CharacterExpr::Designator(d) => fold_character_designator(ctx, *d),
            CharacterExpr::FunctionRef(f) => intrinsics::fold_character_function_ref(ctx, *f),
            CharacterExpr::ArrayConstructor(a) => fold_array_constructor(ctx, *a),
            CharacterExpr::Parentheses(p) => {
                let operand = p.operand.fold(ctx);
                CharacterExpr::Parentheses(Box::new(Parenthesized {
                    kind: p.kind,
                    operand,
                }))
            }
            CharacterExpr::Convert(c) => fold_convert(ctx, *c),
            CharacterExpr::Concat(c) => fold_concat(ctx, *c),
            CharacterExpr::SetLength(s) => fold_set_length(ctx, *s),
            CharacterExpr::Extremum(e) => fold_extremum(ctx, *e),
        }
    }
}

fn character_ty(kind: u8) -> DynamicType {
    DynamicType::Intrinsic {
        category: TypeCategory::Character,
        kind,
    }
}

/// Designator folding, plus the one value-producing case: a substring of a
/// character literal with constant bounds.  A substring whose folded
/// length is provably zero reduces to the empty constant regardless of
/// the parent.
fn fold_character_designator(ctx: &mut FoldingContext, designator: Designator) -> CharacterExpr {
    match designator {
        Designator::Substring(substring) => {
            let kind = substring.kind();
            let folded = fold_substring(ctx, substring);
            let lower = match &folded.lower {
                Some(e) => to_int64_integer(e),
                None => Some(1),
            };
            let upper = match &folded.upper {
                Some(e) => to_int64_integer(e),
                None => match &folded.parent {
                    SubstringParent::Literal(value) => Some(value.len()),
                    SubstringParent::DataRef(d) => d.last_symbol().char_length,
                },
            };
            if let (Some(lower), Some(upper)) = (lower, upper) {
                if let SubstringParent::Literal(value) = &folded.parent {
                    return constant_char(value.substring(lower, upper));
                }
                if upper < lower {
                    return constant_char(CharValue::empty(kind));
                }
            }
            CharacterExpr::Designator(Box::new(Designator::Substring(folded)))
        }
        other => CharacterExpr::Designator(Box::new(fold_designator(ctx, other))),
    }
}

fn fold_concat(ctx: &mut FoldingContext, node: ConcatOp) -> CharacterExpr {
    let ConcatOp { kind, left, right } = node;
    let left = left.fold(ctx);
    let right = right.fold(ctx);
    let length = concat_length(&left, &right);
    if let Some(mapped) =
        apply_elementwise_binary(ctx, &left, &right, character_ty(kind), length, &|l, r| {
            CharacterExpr::Concat(Box::new(ConcatOp {
                kind,
                left: l,
                right: r,
            }))
        })
    {
        return mapped;
    }
    if let (Some(x), Some(y)) = (scalar_char(&left), scalar_char(&right)) {
        // The result length is the sum of the operand lengths.
        return constant_char(x.concat(&y));
    }
    CharacterExpr::Concat(Box::new(ConcatOp { kind, left, right }))
}

fn concat_length(left: &CharacterExpr, right: &CharacterExpr) -> Option<IntegerExpr> {
    let l = left.len_expr()?;
    let r = right.len_expr()?;
    IntegerExpr::binary(feval_core::expr::NumericOp::Add, l, r).ok()
}

fn fold_set_length(ctx: &mut FoldingContext, node: SetLengthOp) -> CharacterExpr {
    let SetLengthOp {
        kind,
        string,
        length,
    } = node;
    let string = string.fold(ctx);
    let length = length.fold(ctx);
    if let Some(mapped) = apply_elementwise_binary::<CharacterExpr, IntegerExpr, CharacterExpr>(
        ctx,
        &string,
        &length,
        character_ty(kind),
        Some(length.clone()),
        &|s, l| {
            CharacterExpr::SetLength(Box::new(SetLengthOp {
                kind,
                string: s,
                length: l,
            }))
        },
    ) {
        return mapped;
    }
    if let (Some(value), Some(new_length)) = (scalar_char(&string), scalar_int(&length)) {
        if let Some(new_length) = new_length.to_i64() {
            // Truncate or blank-pad to exactly the requested length.
            return constant_char(value.set_length(new_length));
        }
    }
    CharacterExpr::SetLength(Box::new(SetLengthOp {
        kind,
        string,
        length,
    }))
}

fn fold_convert(ctx: &mut FoldingContext, node: Convert<CharacterExpr>) -> CharacterExpr {
    let kind = node.kind;
    let operand = node.operand.fold(ctx);
    let length = operand.len_expr();
    if let Some(mapped) =
        apply_elementwise_unary(ctx, &operand, character_ty(kind), length, &|x| {
            CharacterExpr::Convert(Box::new(Convert { kind, operand: x }))
        })
    {
        return mapped;
    }
    if let Some(value) = scalar_char(&operand) {
        // Defined only when every code point is 7-bit ASCII; otherwise the
        // conversion stays in the tree without complaint.
        if let Some(converted) = value.convert(kind) {
            return constant_char(converted);
        }
    }
    CharacterExpr::Convert(Box::new(Convert { kind, operand }))
}

fn fold_extremum(ctx: &mut FoldingContext, node: ExtremumOperation<CharacterExpr>) -> CharacterExpr {
    let ExtremumOperation {
        kind,
        ordering,
        left,
        right,
    } = node;
    let left = left.fold(ctx);
    let right = right.fold(ctx);
    if let Some(mapped) =
        apply_elementwise_binary(ctx, &left, &right, character_ty(kind), None, &|l, r| {
            CharacterExpr::Extremum(Box::new(ExtremumOperation {
                kind,
                ordering,
                left: l,
                right: r,
            }))
        })
    {
        return mapped;
    }
    if let (Some(x), Some(y)) = (scalar_char(&left), scalar_char(&right)) {
        let comparison = x.compare(&y);
        let first = comparison == Ordering::Equal || comparison == ordering;
        return constant_char(if first { x } else { y });
    }
    CharacterExpr::Extremum(Box::new(ExtremumOperation {
        kind,
        ordering,
        left,
        right,
    }))
}
