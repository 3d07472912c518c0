//! Folding of complex expressions.  Only multiplication, division, power,
//! and construction appear here; addition, subtraction, and negation are
//! represented piecewise over the real components by earlier phases.

use crate::context::FoldingContext;
use crate::fold::variable::fold_designator;
use crate::fold::{
    apply_elementwise_binary, constant_complex, fold_array_constructor, intrinsics,
    real_flag_warnings, scalar_complex, scalar_int, scalar_real, Fold,
};
use feval_core::expr::{
    BinaryOperation, ComplexConstructorOp, ComplexExpr, IntegerExpr, NumericOp, Parenthesized,
    RealExpr, RealToIntPowerOp,
};
use feval_core::types::{DynamicType, TypeCategory};
use feval_core::value::{ComplexValue, IntValue, RealFlags, RealValue, Rounding, ValueWithRealFlags};

impl Fold for ComplexExpr {
    fn fold(self, ctx: &mut FoldingContext) -> Self {
        match self {
            ComplexExpr::Constant(c) => ComplexExpr::Constant(c),
            ComplexExpr::Designator(d) => {
                ComplexExpr::Designator(Box::new(fold_designator(ctx, *d)))
            }
            ComplexExpr::FunctionRef(f) => intrinsics::fold_complex_function_ref(ctx, *f),
            ComplexExpr::ArrayConstructor(a) => fold_array_constructor(ctx, *a),
            ComplexExpr::Parentheses(p) => {
                let operand = p.operand.fold(ctx);
                ComplexExpr::Parentheses(Box::new(Parenthesized {
                    kind: p.kind,
                    operand,
                }))
            }
            ComplexExpr::Construct(c) => fold_construct(ctx, *c),
            ComplexExpr::Binary(b) => fold_binary(ctx, *b),
            ComplexExpr::RealToIntPower(p) => fold_real_to_int_power(ctx, *p),
        }
    }
}

fn complex_ty(kind: u8) -> DynamicType {
    DynamicType::Intrinsic {
        category: TypeCategory::Complex,
        kind,
    }
}

fn finish_complex(
    ctx: &mut FoldingContext,
    result: ValueWithRealFlags<ComplexValue>,
    operation: &str,
) -> ComplexExpr {
    real_flag_warnings(ctx, &result.flags, operation);
    let value = if ctx.flush_subnormals_to_zero() {
        result.value.flush_subnormal_to_zero()
    } else {
        result.value
    };
    constant_complex(value)
}

fn fold_construct(ctx: &mut FoldingContext, node: ComplexConstructorOp) -> ComplexExpr {
    let ComplexConstructorOp { kind, re, im } = node;
    let re = re.fold(ctx);
    let im = im.fold(ctx);
    if let Some(mapped) = apply_elementwise_binary::<RealExpr, RealExpr, ComplexExpr>(
        ctx,
        &re,
        &im,
        complex_ty(kind),
        None,
        &|r, i| {
            ComplexExpr::Construct(Box::new(ComplexConstructorOp {
                kind,
                re: r,
                im: i,
            }))
        },
    ) {
        return mapped;
    }
    if let (Some(x), Some(y)) = (scalar_real(&re), scalar_real(&im)) {
        return constant_complex(ComplexValue::from_parts(x, y));
    }
    ComplexExpr::Construct(Box::new(ComplexConstructorOp { kind, re, im }))
}

fn fold_binary(ctx: &mut FoldingContext, node: BinaryOperation<ComplexExpr>) -> ComplexExpr {
    let BinaryOperation {
        kind,
        op,
        left,
        right,
    } = node;
    let left = left.fold(ctx);
    let right = right.fold(ctx);
    if let Some(mapped) =
        apply_elementwise_binary(ctx, &left, &right, complex_ty(kind), None, &|l, r| {
            ComplexExpr::Binary(Box::new(BinaryOperation {
                kind,
                op,
                left: l,
                right: r,
            }))
        })
    {
        return mapped;
    }
    if let (Some(x), Some(y)) = (scalar_complex(&left), scalar_complex(&right)) {
        let rounding = ctx.rounding();
        match op {
            NumericOp::Multiply => {
                return finish_complex(ctx, x.multiply(&y, rounding), "multiplication")
            }
            NumericOp::Divide => return finish_complex(ctx, x.divide(&y, rounding), "division"),
            // Complex powers with complex exponents await host support.
            _ => {}
        }
    }
    ComplexExpr::Binary(Box::new(BinaryOperation {
        kind,
        op,
        left,
        right,
    }))
}

/// Repeated squaring, as for real bases, using complex multiplication.
pub(crate) fn int_power_complex(
    base: ComplexValue,
    exponent: &IntValue,
    rounding: Rounding,
) -> ValueWithRealFlags<ComplexValue> {
    let kind = base.kind();
    let mut flags = RealFlags::default();
    let mut remaining = exponent.to_i128().unsigned_abs();
    let negative = exponent.to_i128() < 0;
    let one = ComplexValue::from_parts(
        RealValue::new(kind, 1.0).unwrap_or_else(|_| RealValue::zero(kind)),
        RealValue::zero(kind),
    );
    let mut result = one;
    let mut square = base;
    while remaining > 0 {
        if remaining & 1 == 1 {
            let product = result.multiply(&square, rounding);
            flags.merge(product.flags);
            result = product.value;
        }
        remaining >>= 1;
        if remaining > 0 {
            let squared = square.multiply(&square, rounding);
            flags.merge(squared.flags);
            square = squared.value;
        }
    }
    if negative {
        let quotient = one.divide(&result, rounding);
        flags.merge(quotient.flags);
        result = quotient.value;
    }
    ValueWithRealFlags {
        value: result,
        flags,
    }
}

fn fold_real_to_int_power(
    ctx: &mut FoldingContext,
    node: RealToIntPowerOp<ComplexExpr>,
) -> ComplexExpr {
    let RealToIntPowerOp {
        kind,
        base,
        exponent,
    } = node;
    let base = base.fold(ctx);
    let exponent = exponent.fold(ctx);
    if let Some(mapped) = apply_elementwise_binary::<ComplexExpr, IntegerExpr, ComplexExpr>(
        ctx,
        &base,
        &exponent,
        complex_ty(kind),
        None,
        &|b, e| {
            ComplexExpr::RealToIntPower(Box::new(RealToIntPowerOp {
                kind,
                base: b,
                exponent: e,
            }))
        },
    ) {
        return mapped;
    }
    if let (Some(z), Some(n)) = (scalar_complex(&base), scalar_int(&exponent)) {
        let power = int_power_complex(z, &n, ctx.rounding());
        return finish_complex(ctx, power, "power with INTEGER exponent");
    }
    ComplexExpr::RealToIntPower(Box::new(RealToIntPowerOp {
        kind,
        base,
        exponent,
    }))
}
