//! Folding of real expressions: IEEE-flavored arithmetic under the
//! context's rounding mode, with flag aggregation and optional subnormal
//! flushing.

use crate::context::FoldingContext;
use crate::fold::variable::fold_designator;
use crate::fold::{
    apply_elementwise_binary, apply_elementwise_unary, constant_real, fold_array_constructor,
    intrinsics, real_flag_warnings, scalar_complex, scalar_int, scalar_real, Fold,
};
use feval_core::expr::{
    BinaryOperation, ComplexComponentOp, Convert, ExtremumOperation, IntegerExpr, Negated,
    NumericExpr, NumericOp, Parenthesized, RealExpr, RealToIntPowerOp,
};
use feval_core::types::{DynamicType, Ordering, Relation, TypeCategory};
use feval_core::value::{IntValue, RealFlags, RealValue, Rounding, ValueWithRealFlags};

impl Fold for RealExpr {
    fn fold(self, ctx: &mut FoldingContext) -> Self {
        match self {
            RealExpr::Constant(c) => RealExpr::Constant(c),
            RealExpr::Designator(d) => RealExpr::Designator(Box::new(fold_designator(ctx, *d))),
            RealExpr::FunctionRef(f) => intrinsics::fold_real_function_ref(ctx, *f),
            RealExpr::ArrayConstructor(a) => fold_array_constructor(ctx, *a),
            RealExpr::Parentheses(p) => {
                let operand = p.operand.fold(ctx);
                RealExpr::Parentheses(Box::new(Parenthesized {
                    kind: p.kind,
                    operand,
                }))
            }
            RealExpr::Negate(n) => fold_negate(ctx, *n),
            RealExpr::Convert(c) => fold_convert(ctx, *c),
            RealExpr::ComplexComponent(c) => fold_complex_component(ctx, *c),
            RealExpr::Binary(b) => fold_binary(ctx, *b),
            RealExpr::RealToIntPower(p) => fold_real_to_int_power(ctx, *p),
            RealExpr::Extremum(e) => fold_extremum(ctx, *e),
        }
    }
}

fn real_ty(kind: u8) -> DynamicType {
    DynamicType::Intrinsic {
        category: TypeCategory::Real,
        kind,
    }
}

pub(crate) fn finish_real(
    ctx: &mut FoldingContext,
    result: ValueWithRealFlags<RealValue>,
    operation: &str,
) -> RealExpr {
    real_flag_warnings(ctx, &result.flags, operation);
    let value = if ctx.flush_subnormals_to_zero() {
        result.value.flush_subnormal_to_zero()
    } else {
        result.value
    };
    constant_real(value)
}

fn fold_negate(ctx: &mut FoldingContext, node: Negated<RealExpr>) -> RealExpr {
    let kind = node.kind;
    let operand = node.operand.fold(ctx);
    if let Some(mapped) = apply_elementwise_unary(ctx, &operand, real_ty(kind), None, &|x| {
        RealExpr::Negate(Box::new(Negated { kind, operand: x }))
    }) {
        return mapped;
    }
    if let Some(value) = scalar_real(&operand) {
        // Real negation raises no exceptions.
        return constant_real(value.negate());
    }
    RealExpr::Negate(Box::new(Negated { kind, operand }))
}

fn fold_binary(ctx: &mut FoldingContext, node: BinaryOperation<RealExpr>) -> RealExpr {
    let BinaryOperation {
        kind,
        op,
        left,
        right,
    } = node;
    let left = left.fold(ctx);
    let right = right.fold(ctx);
    if let Some(mapped) =
        apply_elementwise_binary(ctx, &left, &right, real_ty(kind), None, &|l, r| {
            RealExpr::Binary(Box::new(BinaryOperation {
                kind,
                op,
                left: l,
                right: r,
            }))
        })
    {
        return mapped;
    }
    if let (Some(x), Some(y)) = (scalar_real(&left), scalar_real(&right)) {
        let rounding = ctx.rounding();
        match op {
            NumericOp::Add => return finish_real(ctx, x.add(&y, rounding), "addition"),
            NumericOp::Subtract => {
                return finish_real(ctx, x.subtract(&y, rounding), "subtraction")
            }
            NumericOp::Multiply => {
                return finish_real(ctx, x.multiply(&y, rounding), "multiplication")
            }
            NumericOp::Divide => return finish_real(ctx, x.divide(&y, rounding), "division"),
            // Real powers with real exponents await host support.
            NumericOp::Power => {}
        }
    }
    RealExpr::Binary(Box::new(BinaryOperation {
        kind,
        op,
        left,
        right,
    }))
}

/// Exponentiation by an integer exponent, via repeated squaring.
pub(crate) fn int_power_real(
    base: RealValue,
    exponent: &IntValue,
    rounding: Rounding,
) -> ValueWithRealFlags<RealValue> {
    let kind = base.kind();
    let mut flags = RealFlags::default();
    let mut remaining = exponent.to_i128().unsigned_abs();
    let negative = exponent.to_i128() < 0;
    let mut result = RealValue::new(kind, 1.0).unwrap_or(base);
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
        let one = RealValue::new(kind, 1.0).unwrap_or(base);
        let quotient = one.divide(&result, rounding);
        flags.merge(quotient.flags);
        result = quotient.value;
    }
    ValueWithRealFlags {
        value: result,
        flags,
    }
}

fn fold_real_to_int_power(ctx: &mut FoldingContext, node: RealToIntPowerOp<RealExpr>) -> RealExpr {
    let RealToIntPowerOp {
        kind,
        base,
        exponent,
    } = node;
    let base = base.fold(ctx);
    let exponent = exponent.fold(ctx);
    if let Some(mapped) = apply_elementwise_binary::<RealExpr, IntegerExpr, RealExpr>(
        ctx,
        &base,
        &exponent,
        real_ty(kind),
        None,
        &|b, e| {
            RealExpr::RealToIntPower(Box::new(RealToIntPowerOp {
                kind,
                base: b,
                exponent: e,
            }))
        },
    ) {
        return mapped;
    }
    if let (Some(x), Some(n)) = (scalar_real(&base), scalar_int(&exponent)) {
        let power = int_power_real(x, &n, ctx.rounding());
        return finish_real(ctx, power, "power with INTEGER exponent");
    }
    RealExpr::RealToIntPower(Box::new(RealToIntPowerOp {
        kind,
        base,
        exponent,
    }))
}

fn fold_extremum(ctx: &mut FoldingContext, node: ExtremumOperation<RealExpr>) -> RealExpr {
    let ExtremumOperation {
        kind,
        ordering,
        left,
        right,
    } = node;
    let left = left.fold(ctx);
    let right = right.fold(ctx);
    if let Some(mapped) =
        apply_elementwise_binary(ctx, &left, &right, real_ty(kind), None, &|l, r| {
            RealExpr::Extremum(Box::new(ExtremumOperation {
                kind,
                ordering,
                left: l,
                right: r,
            }))
        })
    {
        return mapped;
    }
    if let (Some(x), Some(y)) = (scalar_real(&left), scalar_real(&right)) {
        // With a NaN on either side, the first operand is the result.
        let first = if x.is_not_a_number() || y.is_not_a_number() {
            true
        } else {
            match x.compare(&y) {
                Relation::Equal => true,
                Relation::Less => ordering == Ordering::Less,
                Relation::Greater => ordering == Ordering::Greater,
                Relation::Unordered => true,
            }
        };
        return constant_real(if first { x } else { y });
    }
    RealExpr::Extremum(Box::new(ExtremumOperation {
        kind,
        ordering,
        left,
        right,
    }))
}

fn fold_complex_component(ctx: &mut FoldingContext, node: ComplexComponentOp) -> RealExpr {
    let ComplexComponentOp {
        kind,
        imaginary,
        operand,
    } = node;
    let operand = operand.fold(ctx);
    if let Some(mapped) = apply_elementwise_unary(ctx, &operand, real_ty(kind), None, &|z| {
        RealExpr::ComplexComponent(Box::new(ComplexComponentOp {
            kind,
            imaginary,
            operand: z,
        }))
    }) {
        return mapped;
    }
    if let Some(value) = scalar_complex(&operand) {
        return constant_real(if imaginary {
            value.aimag()
        } else {
            value.real_part()
        });
    }
    RealExpr::ComplexComponent(Box::new(ComplexComponentOp {
        kind,
        imaginary,
        operand,
    }))
}

fn fold_convert(ctx: &mut FoldingContext, node: Convert<NumericExpr>) -> RealExpr {
    let kind = node.kind;
    match node.operand {
        NumericExpr::Integer(operand) => {
            let operand = operand.fold(ctx);
            if let Some(mapped) = apply_elementwise_unary(ctx, &operand, real_ty(kind), None, &|x| {
                RealExpr::Convert(Box::new(Convert {
                    kind,
                    operand: NumericExpr::Integer(x),
                }))
            }) {
                return mapped;
            }
            if let Some(value) = scalar_int(&operand) {
                let converted = RealValue::from_integer(kind, &value);
                if !converted.flags.empty() {
                    let operation =
                        format!("INTEGER({}) to REAL({}) conversion", value.kind(), kind);
                    real_flag_warnings(ctx, &converted.flags, &operation);
                }
                return constant_real(converted.value);
            }
            RealExpr::Convert(Box::new(Convert {
                kind,
                operand: NumericExpr::Integer(operand),
            }))
        }
        NumericExpr::Real(operand) => {
            let operand = operand.fold(ctx);
            if let Some(mapped) = apply_elementwise_unary(ctx, &operand, real_ty(kind), None, &|x| {
                RealExpr::Convert(Box::new(Convert {
                    kind,
                    operand: NumericExpr::Real(x),
                }))
            }) {
                return mapped;
            }
            if let Some(value) = scalar_real(&operand) {
                let mut converted = value.convert(kind);
                if !converted.flags.empty() {
                    let operation = format!("REAL({}) to REAL({}) conversion", value.kind(), kind);
                    real_flag_warnings(ctx, &converted.flags, &operation);
                }
                if ctx.flush_subnormals_to_zero() {
                    converted.value = converted.value.flush_subnormal_to_zero();
                }
                return constant_real(converted.value);
            }
            RealExpr::Convert(Box::new(Convert {
                kind,
                operand: NumericExpr::Real(operand),
            }))
        }
    }
}
