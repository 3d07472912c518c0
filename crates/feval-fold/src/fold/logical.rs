//! Folding of logical expressions and relational comparisons.

use crate::context::FoldingContext;
use crate::fold::variable::fold_designator;
use crate::fold::{
    apply_elementwise_binary, apply_elementwise_unary, fold_array_constructor, intrinsics,
    scalar_char, scalar_int, scalar_logical, scalar_real, Fold,
};
use feval_core::constant::{Constant, Scalar};
use feval_core::expr::{
    CharacterExpr, Convert, IntegerExpr, LogicalBinaryOp, LogicalExpr, LogicalOperator, NotOp,
    Parenthesized, RealExpr, Relational, RelationalOperation,
};
use feval_core::types::{DynamicType, TypeCategory, LOGICAL_RESULT_KIND};
use feval_core::value::LogicalValue;

impl Fold for LogicalExpr {
    fn fold(self, ctx: &mut FoldingContext) -> Self {
        match self {
            LogicalExpr::Constant(c) => LogicalExpr::Constant(c),
            LogicalExpr::Designator(d) => {
                LogicalExpr::Designator(Box::new(fold_designator(ctx, *d)))
            }
            LogicalExpr::FunctionRef(f) => intrinsics::fold_logical_function_ref(ctx, *f),
            LogicalExpr::ArrayConstructor(a) => fold_array_constructor(ctx, *a),
            LogicalExpr::Parentheses(p) => {
                let operand = p.operand.fold(ctx);
                LogicalExpr::Parentheses(Box::new(Parenthesized {
                    kind: p.kind,
                    operand,
                }))
            }
            LogicalExpr::Convert(c) => fold_convert(ctx, *c),
            LogicalExpr::Not(n) => fold_not(ctx, *n),
            LogicalExpr::Binary(b) => fold_binary(ctx, *b),
            LogicalExpr::Relational(r) => fold_relational(ctx, *r),
        }
    }
}

fn logical_ty(kind: u8) -> DynamicType {
    DynamicType::Intrinsic {
        category: TypeCategory::Logical,
        kind,
    }
}

pub(crate) fn constant_logical(value: LogicalValue) -> LogicalExpr {
    LogicalExpr::Constant(Constant::scalar(Scalar::Logical(value)))
}

fn fold_not(ctx: &mut FoldingContext, node: NotOp) -> LogicalExpr {
    let NotOp { kind, operand } = node;
    let operand = operand.fold(ctx);
    if let Some(mapped) = apply_elementwise_unary(ctx, &operand, logical_ty(kind), None, &|x| {
        LogicalExpr::Not(Box::new(NotOp { kind, operand: x }))
    }) {
        return mapped;
    }
    if let Some(value) = scalar_logical(&operand) {
        return constant_logical(value.not());
    }
    LogicalExpr::Not(Box::new(NotOp { kind, operand }))
}

fn fold_binary(ctx: &mut FoldingContext, node: LogicalBinaryOp) -> LogicalExpr {
    let LogicalBinaryOp {
        kind,
        op,
        left,
        right,
    } = node;
    let left = left.fold(ctx);
    let right = right.fold(ctx);
    if let Some(mapped) =
        apply_elementwise_binary(ctx, &left, &right, logical_ty(kind), None, &|l, r| {
            LogicalExpr::Binary(Box::new(LogicalBinaryOp {
                kind,
                op,
                left: l,
                right: r,
            }))
        })
    {
        return mapped;
    }
    if let (Some(x), Some(y)) = (scalar_logical(&left), scalar_logical(&right)) {
        let value = match op {
            LogicalOperator::And => x.and(&y),
            LogicalOperator::Or => x.or(&y),
            LogicalOperator::Eqv => x.eqv(&y),
            LogicalOperator::Neqv => x.neqv(&y),
        };
        return constant_logical(value);
    }
    LogicalExpr::Binary(Box::new(LogicalBinaryOp {
        kind,
        op,
        left,
        right,
    }))
}

fn fold_convert(ctx: &mut FoldingContext, node: Convert<LogicalExpr>) -> LogicalExpr {
    let kind = node.kind;
    let operand = node.operand.fold(ctx);
    if let Some(mapped) = apply_elementwise_unary(ctx, &operand, logical_ty(kind), None, &|x| {
        LogicalExpr::Convert(Box::new(Convert { kind, operand: x }))
    }) {
        return mapped;
    }
    if let Some(value) = scalar_logical(&operand) {
        // Truth value is preserved across any pair of logical kinds.
        return constant_logical(value.convert(kind));
    }
    LogicalExpr::Convert(Box::new(Convert { kind, operand }))
}

fn fold_relational(ctx: &mut FoldingContext, relation: Relational) -> LogicalExpr {
    let result_ty = logical_ty(LOGICAL_RESULT_KIND);
    match relation {
        Relational::Integer(r) => {
            let RelationalOperation { op, left, right } = *r;
            let left = left.fold(ctx);
            let right = right.fold(ctx);
            if let Some(mapped) = apply_elementwise_binary::<IntegerExpr, IntegerExpr, LogicalExpr>(
                ctx,
                &left,
                &right,
                result_ty.clone(),
                None,
                &|l, r| {
                    LogicalExpr::relational(Relational::Integer(Box::new(RelationalOperation {
                        op,
                        left: l,
                        right: r,
                    })))
                },
            ) {
                return mapped;
            }
            if let (Some(x), Some(y)) = (scalar_int(&left), scalar_int(&right)) {
                return constant_logical(LogicalValue::result(
                    op.satisfied_by(x.compare_signed(&y)),
                ));
            }
            LogicalExpr::relational(Relational::Integer(Box::new(RelationalOperation {
                op,
                left,
                right,
            })))
        }
        Relational::Real(r) => {
            let RelationalOperation { op, left, right } = *r;
            let left = left.fold(ctx);
            let right = right.fold(ctx);
            if let Some(mapped) = apply_elementwise_binary::<RealExpr, RealExpr, LogicalExpr>(
                ctx,
                &left,
                &right,
                result_ty.clone(),
                None,
                &|l, r| {
                    LogicalExpr::relational(Relational::Real(Box::new(RelationalOperation {
                        op,
                        left: l,
                        right: r,
                    })))
                },
            ) {
                return mapped;
            }
            if let (Some(x), Some(y)) = (scalar_real(&left), scalar_real(&right)) {
                return constant_logical(LogicalValue::result(
                    op.satisfied_by_relation(x.compare(&y)),
                ));
            }
            LogicalExpr::relational(Relational::Real(Box::new(RelationalOperation {
                op,
                left,
                right,
            })))
        }
        Relational::Character(r) => {
            let RelationalOperation { op, left, right } = *r;
            let left = left.fold(ctx);
            let right = right.fold(ctx);
            if let Some(mapped) = apply_elementwise_binary::<CharacterExpr, CharacterExpr, LogicalExpr>(
                ctx,
                &left,
                &right,
                result_ty,
                None,
                &|l, r| {
                    LogicalExpr::relational(Relational::Character(Box::new(RelationalOperation {
                        op,
                        left: l,
                        right: r,
                    })))
                },
            ) {
                return mapped;
            }
            if let (Some(x), Some(y)) = (scalar_char(&left), scalar_char(&right)) {
                return constant_logical(LogicalValue::result(op.satisfied_by(x.compare(&y))));
            }
            LogicalExpr::relational(Relational::Character(Box::new(RelationalOperation {
                op,
                left,
                right,
            })))
        }
    }
}
