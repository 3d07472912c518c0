//! The constant folder: one rewrite per expression variant, mutually
//! recursive, always total.
//!
//! Every rewrite folds its operands first (depth-first, left-to-right),
//! then lifts elementwise over constant arrays where the node is an
//! elementwise operation, then attempts scalar evaluation, and otherwise
//! reconstructs the node around the folded operands.  Anomalies go to the
//! context's message sink; the folder itself never fails.

mod array;
mod character;
mod complex;
mod derived;
mod elementwise;
mod integer;
mod intrinsics;
mod logical;
mod real;
mod variable;

pub(crate) use array::fold_array_constructor;
pub(crate) use elementwise::{apply_elementwise_binary, apply_elementwise_unary, FoldCategory};

use crate::context::FoldingContext;
use feval_core::constant::{Constant, Scalar};
use feval_core::expr::{CharacterExpr, ComplexExpr, Expr, IntegerExpr, LogicalExpr, RealExpr};
use feval_core::value::{CharValue, ComplexValue, IntValue, LogicalValue, RealFlags, RealValue};

/// The folding rewrite.  Returns a structurally equal tree when nothing
/// can be reduced; folding is idempotent and purely functional apart from
/// diagnostics and the scoped implied-DO bindings.
pub trait Fold: Sized {
    fn fold(self, ctx: &mut FoldingContext) -> Self;
}

impl Fold for Expr {
    fn fold(self, ctx: &mut FoldingContext) -> Self {
        match self {
            Expr::Integer(e) => Expr::Integer(e.fold(ctx)),
            Expr::Real(e) => Expr::Real(e.fold(ctx)),
            Expr::Complex(e) => Expr::Complex(e.fold(ctx)),
            Expr::Character(e) => Expr::Character(e.fold(ctx)),
            Expr::Logical(e) => Expr::Logical(e.fold(ctx)),
            Expr::Derived(e) => Expr::Derived(e.fold(ctx)),
            // Typeless expressions have nothing to reduce.
            other @ (Expr::BozLiteral(_)
            | Expr::NullPointer(_)
            | Expr::ProcedureDesignator(_)
            | Expr::ProcedureRef(_)) => other,
        }
    }
}

impl Fold for feval_core::expr::NumericExpr {
    fn fold(self, ctx: &mut FoldingContext) -> Self {
        match self {
            feval_core::expr::NumericExpr::Integer(e) => {
                feval_core::expr::NumericExpr::Integer(e.fold(ctx))
            }
            feval_core::expr::NumericExpr::Real(e) => {
                feval_core::expr::NumericExpr::Real(e.fold(ctx))
            }
        }
    }
}

/// Top-level convenience wrapper around [`Fold::fold`].
pub fn fold_expr(ctx: &mut FoldingContext, expr: Expr) -> Expr {
    expr.fold(ctx)
}

// ----- scalar constant extraction -----
//
// Scalar extraction looks through parentheses: `(2)+3` still folds, the
// parentheses only survive around the folded result of their own subtree.

pub(crate) fn scalar_int(expr: &IntegerExpr) -> Option<IntValue> {
    match expr {
        IntegerExpr::Constant(c) => c.scalar_value().and_then(Scalar::as_integer).copied(),
        IntegerExpr::Parentheses(p) => scalar_int(&p.operand),
        _ => None,
    }
}

pub(crate) fn scalar_real(expr: &RealExpr) -> Option<RealValue> {
    match expr {
        RealExpr::Constant(c) => c.scalar_value().and_then(Scalar::as_real).copied(),
        RealExpr::Parentheses(p) => scalar_real(&p.operand),
        _ => None,
    }
}

pub(crate) fn scalar_complex(expr: &ComplexExpr) -> Option<ComplexValue> {
    match expr {
        ComplexExpr::Constant(c) => c.scalar_value().and_then(Scalar::as_complex).copied(),
        ComplexExpr::Parentheses(p) => scalar_complex(&p.operand),
        _ => None,
    }
}

pub(crate) fn scalar_char(expr: &CharacterExpr) -> Option<CharValue> {
    match expr {
        CharacterExpr::Constant(c) => c.scalar_value().and_then(Scalar::as_character).cloned(),
        CharacterExpr::Parentheses(p) => scalar_char(&p.operand),
        _ => None,
    }
}

pub(crate) fn scalar_logical(expr: &LogicalExpr) -> Option<LogicalValue> {
    match expr {
        LogicalExpr::Constant(c) => c.scalar_value().and_then(Scalar::as_logical).copied(),
        LogicalExpr::Parentheses(p) => scalar_logical(&p.operand),
        _ => None,
    }
}

// ----- constant wrapping -----

pub(crate) fn constant_int(value: IntValue) -> IntegerExpr {
    IntegerExpr::Constant(Constant::scalar(Scalar::Integer(value)))
}

pub(crate) fn constant_real(value: RealValue) -> RealExpr {
    RealExpr::Constant(Constant::scalar(Scalar::Real(value)))
}

pub(crate) fn constant_complex(value: ComplexValue) -> ComplexExpr {
    ComplexExpr::Constant(Constant::scalar(Scalar::Complex(value)))
}

pub(crate) fn constant_char(value: CharValue) -> CharacterExpr {
    CharacterExpr::Constant(Constant::scalar(Scalar::Character(value)))
}

/// Report any raised real flags as enabled warnings naming the operation,
/// e.g. "overflow on addition".  Inexact results are not worth reporting.
pub(crate) fn real_flag_warnings(ctx: &mut FoldingContext, flags: &RealFlags, operation: &str) {
    if flags.overflow {
        ctx.messages_mut()
            .say_warning(format!("overflow on {}", operation));
    }
    if flags.divide_by_zero {
        ctx.messages_mut()
            .say_warning(format!("division by zero on {}", operation));
    }
    if flags.invalid_argument {
        ctx.messages_mut()
            .say_warning(format!("invalid argument on {}", operation));
    }
    if flags.underflow {
        ctx.messages_mut()
            .say_warning(format!("underflow on {}", operation));
    }
}
