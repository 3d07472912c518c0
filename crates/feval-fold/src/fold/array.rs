//! Array constructor folding: flattening constant elements in array
//! element order and unrolling implied-DO loops with constant bounds.

use crate::context::FoldingContext;
use crate::fold::{FoldCategory, Fold};
use crate::traverse::to_int64_integer;
use feval_core::constant::{Constant, Scalar};
use feval_core::expr::{ArrayConstructor, ArrayConstructorValue, ImpliedDo};
use feval_core::types::TypeCategory;
use tracing::trace;

/// Reduce a constructor to a constant when every element and bound folds;
/// otherwise return the constructor with all embedded expressions folded.
/// A zero implied-DO stride abandons the fold.
pub(crate) fn fold_array_constructor<E: FoldCategory>(
    ctx: &mut FoldingContext,
    ac: ArrayConstructor<E>,
) -> E {
    let ty = ac.ty.clone();
    let length = ac
        .length
        .map(|l| Box::new((*l).fold(ctx)));
    let values = fold_values(ctx, ac.values);

    // An explicit character length must itself be constant for the whole
    // constructor to become one.
    let length_value = length.as_deref().map(to_int64_integer);
    if length_value == Some(None) && ty.category() == Some(TypeCategory::Character) {
        return E::wrap_array_constructor(ArrayConstructor { ty, length, values });
    }
    let length_value = length_value.flatten();

    let mut elements: Vec<Scalar> = Vec::new();
    if unroll_values(ctx, &mut elements, &values) {
        let extent = elements.len() as i64;
        trace!(elements = elements.len(), "array constructor folded");
        let derived_length = length_value.or_else(|| elements.first().and_then(Scalar::char_len));
        if let Ok(constant) =
            Constant::array_with_length(ty.clone(), vec![extent], elements, derived_length)
        {
            return E::from_constant(constant);
        }
    }
    E::wrap_array_constructor(ArrayConstructor { ty, length, values })
}

/// Fold the expressions embedded in constructor values in place; bodies of
/// implied-DOs fold with their index unbound, which leaves index
/// references intact for the unroll.
fn fold_values<E: FoldCategory>(
    ctx: &mut FoldingContext,
    values: Vec<ArrayConstructorValue<E>>,
) -> Vec<ArrayConstructorValue<E>> {
    values
        .into_iter()
        .map(|value| match value {
            ArrayConstructorValue::Expr(e) => ArrayConstructorValue::Expr(e.fold(ctx)),
            ArrayConstructorValue::ImpliedDo(ido) => {
                ArrayConstructorValue::ImpliedDo(ImpliedDo {
                    name: ido.name,
                    lower: Box::new((*ido.lower).fold(ctx)),
                    upper: Box::new((*ido.upper).fold(ctx)),
                    stride: Box::new((*ido.stride).fold(ctx)),
                    values: fold_values(ctx, ido.values),
                })
            }
        })
        .collect()
}

/// Append the linearized scalars of every value; false abandons the fold.
fn unroll_values<E: FoldCategory>(
    ctx: &mut FoldingContext,
    out: &mut Vec<Scalar>,
    values: &[ArrayConstructorValue<E>],
) -> bool {
    for value in values {
        match value {
            ArrayConstructorValue::Expr(e) => {
                // Re-fold: inside an implied-DO the index is now bound.
                let folded = e.clone().fold(ctx);
                match folded.as_constant() {
                    // Constant elements contribute their elements in array
                    // element order, already linearized.
                    Some(c) => out.extend(c.elements().iter().cloned()),
                    None => return false,
                }
            }
            ArrayConstructorValue::ImpliedDo(ido) => {
                if !unroll_implied_do(ctx, out, ido) {
                    return false;
                }
            }
        }
    }
    true
}

fn unroll_implied_do<E: FoldCategory>(
    ctx: &mut FoldingContext,
    out: &mut Vec<Scalar>,
    ido: &ImpliedDo<E>,
) -> bool {
    let lower = (*ido.lower).clone().fold(ctx);
    let upper = (*ido.upper).clone().fold(ctx);
    let stride = (*ido.stride).clone().fold(ctx);
    let (Some(lower), Some(upper), Some(stride)) = (
        to_int64_integer(&lower),
        to_int64_integer(&upper),
        to_int64_integer(&stride),
    ) else {
        return false;
    };
    if stride == 0 {
        return false;
    }
    ctx.start_implied_do(&ido.name, lower);
    let mut j = lower;
    let mut ok = true;
    loop {
        let done = if stride > 0 { j > upper } else { j < upper };
        if done {
            break;
        }
        ctx.update_implied_do(&ido.name, j);
        if !unroll_values(ctx, out, &ido.values) {
            ok = false;
            break;
        }
        match j.checked_add(stride) {
            Some(next) => j = next,
            None => break,
        }
    }
    ctx.end_implied_do(&ido.name);
    ok
}
