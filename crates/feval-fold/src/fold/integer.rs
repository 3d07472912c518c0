//! Folding of integer expressions: two's-complement arithmetic with a
//! wrap-and-diagnose overflow policy.

use crate::context::FoldingContext;
use crate::fold::variable::{fold_component, fold_designator};
use crate::fold::{
    apply_elementwise_binary, apply_elementwise_unary, constant_int, fold_array_constructor,
    intrinsics, scalar_int, scalar_real, Fold,
};
use feval_core::expr::{
    BinaryOperation, Convert, ExtremumOperation, IntegerExpr, Negated, NumericExpr, NumericOp,
    Parenthesized, TypeParamInquiry,
};
use feval_core::types::{DynamicType, Ordering};
use feval_core::value::{IntValue, Rounding};

impl Fold for IntegerExpr {
    fn fold(self, ctx: &mut FoldingContext) -> Self {
        match self {
            IntegerExpr::Constant(c) => IntegerExpr::Constant(c),
            IntegerExpr::Designator(d) => {
                IntegerExpr::Designator(Box::new(fold_designator(ctx, *d)))
            }
            IntegerExpr::FunctionRef(f) => intrinsics::fold_integer_function_ref(ctx, *f),
            IntegerExpr::ArrayConstructor(a) => fold_array_constructor(ctx, *a),
            IntegerExpr::TypeParamInquiry(i) => fold_type_param_inquiry(ctx, *i),
            IntegerExpr::ImpliedDoIndex(index) => match ctx.get_implied_do(&index.name) {
                Some(value) => IntegerExpr::subscript(value),
                None => IntegerExpr::ImpliedDoIndex(index),
            },
            IntegerExpr::Parentheses(p) => {
                let operand = p.operand.fold(ctx);
                // Parentheses survive folding, even around constants.
                IntegerExpr::Parentheses(Box::new(Parenthesized {
                    kind: p.kind,
                    operand,
                }))
            }
            IntegerExpr::Negate(n) => fold_negate(ctx, *n),
            IntegerExpr::Convert(c) => fold_convert(ctx, *c),
            IntegerExpr::Binary(b) => fold_binary(ctx, *b),
            IntegerExpr::Extremum(e) => fold_extremum(ctx, *e),
        }
    }
}

fn integer_ty(kind: u8) -> DynamicType {
    DynamicType::Intrinsic {
        category: feval_core::types::TypeCategory::Integer,
        kind,
    }
}

fn fold_negate(ctx: &mut FoldingContext, node: Negated<IntegerExpr>) -> IntegerExpr {
    let kind = node.kind;
    let operand = node.operand.fold(ctx);
    if let Some(mapped) = apply_elementwise_unary(ctx, &operand, integer_ty(kind), None, &|x| {
        IntegerExpr::Negate(Box::new(Negated { kind, operand: x }))
    }) {
        return mapped;
    }
    if let Some(value) = scalar_int(&operand) {
        let negated = value.negate();
        if negated.overflow {
            ctx.messages_mut()
                .say_warning(format!("INTEGER({}) negation overflowed", kind));
        }
        return constant_int(negated.value);
    }
    IntegerExpr::Negate(Box::new(Negated { kind, operand }))
}

fn fold_binary(ctx: &mut FoldingContext, node: BinaryOperation<IntegerExpr>) -> IntegerExpr {
    let BinaryOperation {
        kind,
        op,
        left,
        right,
    } = node;
    let left = left.fold(ctx);
    let right = right.fold(ctx);
    if let Some(mapped) =
        apply_elementwise_binary(ctx, &left, &right, integer_ty(kind), None, &|l, r| {
            IntegerExpr::Binary(Box::new(BinaryOperation {
                kind,
                op,
                left: l,
                right: r,
            }))
        })
    {
        return mapped;
    }
    let (Some(x), Some(y)) = (scalar_int(&left), scalar_int(&right)) else {
        return IntegerExpr::Binary(Box::new(BinaryOperation {
            kind,
            op,
            left,
            right,
        }));
    };
    match op {
        NumericOp::Add => {
            let sum = x.add_signed(&y);
            if sum.overflow {
                ctx.messages_mut()
                    .say_warning(format!("INTEGER({}) addition overflowed", kind));
            }
            constant_int(sum.value)
        }
        NumericOp::Subtract => {
            let difference = x.subtract_signed(&y);
            if difference.overflow {
                ctx.messages_mut()
                    .say_warning(format!("INTEGER({}) subtraction overflowed", kind));
            }
            constant_int(difference.value)
        }
        NumericOp::Multiply => {
            let product = x.multiply_signed(&y);
            if product.overflow {
                ctx.messages_mut()
                    .say_warning(format!("INTEGER({}) multiplication overflowed", kind));
            }
            constant_int(product.value)
        }
        NumericOp::Divide => {
            let quotient = x.divide_signed(&y);
            if quotient.division_by_zero {
                ctx.messages_mut()
                    .say_warning(format!("INTEGER({}) division by zero", kind));
            }
            if quotient.overflow {
                ctx.messages_mut()
                    .say_warning(format!("INTEGER({}) division overflowed", kind));
            }
            constant_int(quotient.quotient)
        }
        NumericOp::Power => {
            let power = x.power(&y);
            if power.division_by_zero {
                ctx.messages_mut()
                    .say_warning(format!("INTEGER({}) zero to negative power", kind));
            } else if power.overflow {
                ctx.messages_mut()
                    .say_warning(format!("INTEGER({}) power overflowed", kind));
            } else if power.zero_to_zero {
                ctx.messages_mut()
                    .say_warning(format!("INTEGER({}) 0**0 is not defined", kind));
            }
            constant_int(power.power)
        }
    }
}

fn fold_extremum(ctx: &mut FoldingContext, node: ExtremumOperation<IntegerExpr>) -> IntegerExpr {
    let ExtremumOperation {
        kind,
        ordering,
        left,
        right,
    } = node;
    let left = left.fold(ctx);
    let right = right.fold(ctx);
    if let Some(mapped) =
        apply_elementwise_binary(ctx, &left, &right, integer_ty(kind), None, &|l, r| {
            IntegerExpr::Extremum(Box::new(ExtremumOperation {
                kind,
                ordering,
                left: l,
                right: r,
            }))
        })
    {
        return mapped;
    }
    if let (Some(x), Some(y)) = (scalar_int(&left), scalar_int(&right)) {
        let comparison = x.compare_signed(&y);
        // The first operand wins ties.
        let first = comparison == Ordering::Equal || comparison == ordering;
        return constant_int(if first { x } else { y });
    }
    IntegerExpr::Extremum(Box::new(ExtremumOperation {
        kind,
        ordering,
        left,
        right,
    }))
}

fn fold_convert(ctx: &mut FoldingContext, node: Convert<NumericExpr>) -> IntegerExpr {
    let kind = node.kind;
    match node.operand {
        NumericExpr::Integer(operand) => {
            let operand = operand.fold(ctx);
            if let Some(mapped) =
                apply_elementwise_unary(ctx, &operand, integer_ty(kind), None, &|x| {
                    IntegerExpr::Convert(Box::new(Convert {
                        kind,
                        operand: NumericExpr::Integer(x),
                    }))
                })
            {
                return mapped;
            }
            if let Some(value) = scalar_int(&operand) {
                let converted = value.convert_signed(kind);
                if converted.overflow {
                    ctx.messages_mut().say_warning(format!(
                        "INTEGER({}) to INTEGER({}) conversion overflowed",
                        value.kind(),
                        kind
                    ));
                }
                return constant_int(converted.value);
            }
            IntegerExpr::Convert(Box::new(Convert {
                kind,
                operand: NumericExpr::Integer(operand),
            }))
        }
        NumericExpr::Real(operand) => {
            let operand = operand.fold(ctx);
            if let Some(mapped) =
                apply_elementwise_unary(ctx, &operand, integer_ty(kind), None, &|x| {
                    IntegerExpr::Convert(Box::new(Convert {
                        kind,
                        operand: NumericExpr::Real(x),
                    }))
                })
            {
                return mapped;
            }
            if let Some(value) = scalar_real(&operand) {
                let converted = value.to_integer(kind, Rounding::ToZero);
                if converted.flags.invalid_argument {
                    ctx.messages_mut().say_warning(format!(
                        "REAL({}) to INTEGER({}) conversion: invalid argument",
                        value.kind(),
                        kind
                    ));
                } else if converted.flags.overflow {
                    ctx.messages_mut().say_warning(format!(
                        "REAL({}) to INTEGER({}) conversion overflowed",
                        value.kind(),
                        kind
                    ));
                }
                return constant_int(converted.value);
            }
            IntegerExpr::Convert(Box::new(Convert {
                kind,
                operand: NumericExpr::Real(operand),
            }))
        }
    }
}

/// Substitute a bare type parameter reference with its bound value from
/// the context's PDT instance, when one is available.
fn fold_type_param_inquiry(ctx: &mut FoldingContext, inquiry: TypeParamInquiry) -> IntegerExpr {
    let TypeParamInquiry {
        base,
        parameter,
        attr,
        kind,
    } = inquiry;
    if let Some(component) = base {
        let component = fold_component(ctx, component);
        return IntegerExpr::TypeParamInquiry(Box::new(TypeParamInquiry {
            base: Some(component),
            parameter,
            attr,
            kind,
        }));
    }
    if let Some(instance) = ctx.pdt_instance() {
        if let Some(bound) = instance.find_parameter(&parameter) {
            if let Some(value) = bound.value {
                return constant_int(IntValue::wrapped(kind, value as i128));
            }
        }
    }
    IntegerExpr::TypeParamInquiry(Box::new(TypeParamInquiry {
        base: None,
        parameter,
        attr,
        kind,
    }))
}
