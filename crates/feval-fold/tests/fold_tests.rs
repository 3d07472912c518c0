// Folding scenarios: scalar arithmetic with diagnosis, elementwise lifts,
// conformance failures, intrinsic inquiries, and the universal folding
// invariants.  Every test runs against a fresh default context (rounding
// to nearest, no subnormal flush, no host library).

use feval_core::constant::{Constant, Scalar};
use feval_core::diagnostics::Severity;
use feval_core::expr::{
    ActualArgument, ArrayConstructor, ArrayConstructorValue, Convert, Designator, Expr,
    FunctionRef, ImpliedDo, ImpliedDoIndex, IntegerExpr, NumericExpr, NumericOp, RealExpr,
};
use feval_core::symbol::Symbol;
use feval_core::types::{DynamicType, Ordering};
use feval_core::value::IntValue;
use feval_fold::{Fold, FoldingContext, HostIntrinsicLibrary};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn int4(value: i128) -> IntegerExpr {
    IntegerExpr::literal(4, value).unwrap()
}

fn real4(value: f64) -> RealExpr {
    RealExpr::literal(4, value).unwrap()
}

fn int4_array(shape: Vec<i64>, values: &[i128]) -> IntegerExpr {
    let elements = values
        .iter()
        .map(|&v| Scalar::Integer(IntValue::new(4, v).unwrap()))
        .collect();
    IntegerExpr::Constant(
        Constant::array(DynamicType::integer(4).unwrap(), shape, elements).unwrap(),
    )
}

fn constant_values(expr: &IntegerExpr) -> Option<(Vec<i64>, Vec<i128>)> {
    match expr {
        IntegerExpr::Constant(c) => Some((
            c.shape().to_vec(),
            c.elements()
                .iter()
                .map(|s| s.as_integer().unwrap().to_i128())
                .collect(),
        )),
        _ => None,
    }
}

// ===== SCALAR ARITHMETIC WITH DIAGNOSIS =====

#[test]
fn integer_addition_overflow_wraps_and_warns() {
    let mut ctx = FoldingContext::new();
    let sum = (int4(2_000_000_000) + int4(2_000_000_000)).fold(&mut ctx);
    assert_eq!(sum, int4(-294_967_296));
    assert_eq!(
        ctx.messages().texts(),
        vec!["INTEGER(4) addition overflowed"]
    );
}

#[test]
fn integer_division_by_zero() {
    let mut ctx = FoldingContext::new();
    let quotient = (int4(7) / int4(0)).fold(&mut ctx);
    assert_eq!(quotient, int4(0));
    assert_eq!(ctx.messages().texts(), vec!["INTEGER(4) division by zero"]);
}

#[test]
fn parentheses_are_preserved_around_constants() {
    let mut ctx = FoldingContext::new();
    let folded = IntegerExpr::parenthesize(int4(1) + int4(2)).fold(&mut ctx);
    assert_eq!(folded, IntegerExpr::parenthesize(int4(3)));
    assert!(ctx.messages().is_empty());
    // ... but do not block folding from outside.
    let mut ctx = FoldingContext::new();
    let through = (IntegerExpr::parenthesize(int4(2)) + int4(3)).fold(&mut ctx);
    assert_eq!(through, int4(5));
}

#[test]
fn power_edge_cases() {
    let mut ctx = FoldingContext::new();
    let zz = IntegerExpr::binary(NumericOp::Power, int4(0), int4(0))
        .unwrap()
        .fold(&mut ctx);
    assert_eq!(zz, int4(1));
    assert_eq!(ctx.messages().texts(), vec!["INTEGER(4) 0**0 is not defined"]);

    let mut ctx = FoldingContext::new();
    let dbz = IntegerExpr::binary(NumericOp::Power, int4(0), int4(-1))
        .unwrap()
        .fold(&mut ctx);
    assert_eq!(dbz, int4(0));
    assert_eq!(
        ctx.messages().texts(),
        vec!["INTEGER(4) zero to negative power"]
    );

    let mut ctx = FoldingContext::new();
    let negative = IntegerExpr::binary(NumericOp::Power, int4(3), int4(-2))
        .unwrap()
        .fold(&mut ctx);
    assert_eq!(negative, int4(0));
    assert!(ctx.messages().is_empty());
}

// ===== ELEMENTWISE LIFT =====

#[test]
fn conforming_arrays_fold_elementwise() {
    let mut ctx = FoldingContext::new();
    let left = int4_array(vec![2, 2], &[1, 2, 3, 4]);
    let right = int4_array(vec![2, 2], &[10, 20, 30, 40]);
    let folded = (left + right).fold(&mut ctx);
    let (shape, values) = constant_values(&folded).expect("should fold to a constant");
    assert_eq!(shape, vec![2, 2]);
    assert_eq!(values, vec![11, 22, 33, 44]);
    assert!(ctx.messages().is_empty());
}

#[test]
fn nonconforming_arrays_stay_unfolded_with_error() {
    let mut ctx = FoldingContext::new();
    let left = int4_array(vec![3], &[1, 2, 3]);
    let right = int4_array(vec![2], &[1, 2]);
    let folded = (left.clone() + right.clone()).fold(&mut ctx);
    assert!(matches!(folded, IntegerExpr::Binary(_)));
    let texts = ctx.messages().texts();
    assert_eq!(texts.len(), 1);
    assert!(texts[0].contains("shapes are not conformable"), "{}", texts[0]);
    assert!(ctx.messages().any_errors());
}

#[test]
fn scalar_operands_broadcast() {
    let mut ctx = FoldingContext::new();
    let folded = (int4_array(vec![3], &[1, 2, 3]) + int4(10)).fold(&mut ctx);
    let (shape, values) = constant_values(&folded).unwrap();
    assert_eq!(shape, vec![3]);
    assert_eq!(values, vec![11, 12, 13]);

    let mut ctx = FoldingContext::new();
    let folded = (int4(10) + int4_array(vec![3], &[1, 2, 3])).fold(&mut ctx);
    let (_, values) = constant_values(&folded).unwrap();
    assert_eq!(values, vec![11, 12, 13]);
}

#[test]
fn function_reference_scalars_do_not_expand() {
    // Expanding a call per element could duplicate side effects.
    let mut ctx = FoldingContext::new();
    let call = IntegerExpr::FunctionRef(Box::new(FunctionRef::intrinsic(
        "some_unknown_function",
        vec![],
        DynamicType::integer(4).unwrap(),
    )));
    let folded = (int4_array(vec![2], &[1, 2]) + call).fold(&mut ctx);
    assert!(matches!(folded, IntegerExpr::Binary(_)));
    assert!(ctx.messages().is_empty());
}

// ===== SIZE AND SHAPE INQUIRIES =====

fn rank2_array_arg() -> Expr {
    let symbol = Arc::new(Symbol::array(
        "a",
        DynamicType::integer(4).unwrap(),
        vec![Some(3), Some(4)],
    ));
    Expr::Integer(IntegerExpr::Designator(Box::new(Designator::Symbol(
        symbol,
    ))))
}

fn size_call(dim: Option<i64>) -> IntegerExpr {
    let mut args = vec![Some(ActualArgument::new(rank2_array_arg()))];
    if let Some(dim) = dim {
        args.push(Some(ActualArgument::keyword(
            "dim",
            Expr::Integer(int4(dim as i128)),
        )));
    }
    IntegerExpr::FunctionRef(Box::new(FunctionRef::intrinsic(
        "size",
        args,
        DynamicType::integer(4).unwrap(),
    )))
}

#[test]
fn size_with_dim_returns_extent() {
    let mut ctx = FoldingContext::new();
    let folded = size_call(Some(2)).fold(&mut ctx);
    assert_eq!(folded, int4(4));
    assert!(ctx.messages().is_empty());
}

#[test]
fn size_without_dim_returns_element_count() {
    let mut ctx = FoldingContext::new();
    let folded = size_call(None).fold(&mut ctx);
    assert_eq!(folded, int4(12));
}

#[test]
fn size_with_out_of_range_dim_stays_unfolded() {
    let mut ctx = FoldingContext::new();
    let folded = size_call(Some(3)).fold(&mut ctx);
    assert!(matches!(folded, IntegerExpr::FunctionRef(_)));
    assert_eq!(
        ctx.messages().texts(),
        vec!["size(array,dim=3) dimension is out of range for rank-2 array"]
    );
}

// ===== IMPLIED-DO UNROLLING =====

#[test]
fn implied_do_of_squares_unrolls() {
    let mut ctx = FoldingContext::new();
    let index = || IntegerExpr::ImpliedDoIndex(ImpliedDoIndex { name: "i".into() });
    let body = IntegerExpr::Convert(Box::new(Convert {
        kind: 4,
        operand: NumericExpr::Integer(index() * index()),
    }));
    let constructor = IntegerExpr::ArrayConstructor(Box::new(ArrayConstructor::new(
        DynamicType::integer(4).unwrap(),
        vec![ArrayConstructorValue::ImpliedDo(ImpliedDo {
            name: "i".into(),
            lower: Box::new(IntegerExpr::subscript(1)),
            upper: Box::new(IntegerExpr::subscript(5)),
            stride: Box::new(IntegerExpr::subscript(1)),
            values: vec![ArrayConstructorValue::Expr(body)],
        })],
    )));
    let folded = constructor.fold(&mut ctx);
    let (shape, values) = constant_values(&folded).expect("constructor should fold");
    assert_eq!(shape, vec![5]);
    assert_eq!(values, vec![1, 4, 9, 16, 25]);
    assert!(ctx.messages().is_empty());
}

// ===== HOST INTRINSIC LIBRARY =====

fn sqrt_call() -> RealExpr {
    RealExpr::FunctionRef(Box::new(FunctionRef::intrinsic(
        "sqrt",
        vec![Some(ActualArgument::new(Expr::Real(real4(4.0))))],
        DynamicType::real(4).unwrap(),
    )))
}

#[test]
fn sqrt_without_host_library_stays_unfolded() {
    let mut ctx = FoldingContext::new();
    let folded = sqrt_call().fold(&mut ctx);
    assert!(matches!(folded, RealExpr::FunctionRef(_)));
    let messages: Vec<_> = ctx.messages().iter().collect();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].text, "sqrt(real(kind=4)) cannot be folded on host");
    assert_eq!(messages[0].severity, Severity::Info);
}

#[test]
fn sqrt_with_host_library_folds() {
    let mut ctx = FoldingContext::new().with_host_library(HostIntrinsicLibrary::host_default());
    let folded = sqrt_call().fold(&mut ctx);
    assert_eq!(folded, real4(2.0));
    assert!(ctx.messages().is_empty());
}

// ===== UNIVERSAL INVARIANTS =====

fn sample_expressions() -> Vec<IntegerExpr> {
    let symbol = Arc::new(Symbol::scalar("n", DynamicType::integer(4).unwrap()));
    vec![
        int4(42),
        int4(1) + int4(2) * int4(3),
        IntegerExpr::parenthesize(int4(7)),
        -int4(2_000_000_000) - int4(2_000_000_000),
        int4_array(vec![2, 2], &[1, 2, 3, 4]) + int4(1),
        IntegerExpr::Designator(Box::new(Designator::Symbol(symbol.clone())))
            + int4(1),
        IntegerExpr::extremum(
            Ordering::Greater,
            int4(3),
            IntegerExpr::Designator(Box::new(Designator::Symbol(symbol))),
        )
        .unwrap(),
        size_call(Some(1)),
    ]
}

#[test]
fn folding_is_idempotent() {
    for expr in sample_expressions() {
        let mut ctx = FoldingContext::new();
        let once = expr.fold(&mut ctx);
        let mut ctx2 = FoldingContext::new();
        let twice = once.clone().fold(&mut ctx2);
        assert_eq!(once, twice);
    }
}

#[test]
fn constants_fold_to_themselves_without_diagnostics() {
    let constants = [int4(5), int4_array(vec![2], &[1, 2])];
    for constant in constants {
        let mut ctx = FoldingContext::new();
        let folded = constant.clone().fold(&mut ctx);
        assert_eq!(folded, constant);
        assert!(ctx.messages().is_empty());
    }
}

#[test]
fn folding_preserves_type_and_kind() {
    for expr in sample_expressions() {
        let kind = expr.kind();
        let mut ctx = FoldingContext::new();
        let folded = expr.fold(&mut ctx);
        assert_eq!(folded.kind(), kind);
    }
}

#[test]
fn add_of_negation_cancels() {
    for value in [0i128, 1, -1, 1234567, -2_147_483_648] {
        let mut ctx = FoldingContext::new();
        let folded = (int4(value) + (-int4(value))).fold(&mut ctx);
        // MIN negation overflows and wraps back, so the sum is still zero.
        assert_eq!(folded, int4(0));
    }
}

#[test]
fn multiply_by_real_one_is_exact() {
    let mut ctx = FoldingContext::new();
    let x = real4(1234.5);
    let folded = (x.clone() * real4(1.0)).fold(&mut ctx);
    assert_eq!(folded, x);
    assert!(ctx.messages().is_empty());
}

#[test]
fn character_concat_folds_with_summed_length() {
    use feval_core::expr::CharacterExpr;
    let mut ctx = FoldingContext::new();
    let concat = CharacterExpr::concat(
        CharacterExpr::literal(1, "AB").unwrap(),
        CharacterExpr::literal(1, "CD").unwrap(),
    )
    .unwrap()
    .fold(&mut ctx);
    match &concat {
        CharacterExpr::Constant(c) => {
            assert_eq!(c.len(), Some(4));
            assert_eq!(concat, CharacterExpr::literal(1, "ABCD").unwrap());
        }
        other => panic!("expected a constant, got {}", other),
    }
}

#[test]
fn shape_is_preserved_by_folding() {
    let expr = int4_array(vec![2, 2], &[1, 2, 3, 4]) + int4(1);
    let mut ctx = FoldingContext::new();
    let before = feval_fold::get_shape(&mut ctx, &Expr::Integer(expr.clone())).unwrap();
    let folded = expr.fold(&mut ctx);
    let after = feval_fold::get_shape(&mut ctx, &Expr::Integer(folded)).unwrap();
    assert_eq!(before.len(), after.len());
    for (b, a) in before.iter().zip(&after) {
        let b = feval_fold::to_int64_integer(&b.clone().unwrap().fold(&mut ctx));
        let a = feval_fold::to_int64_integer(&a.clone().unwrap().fold(&mut ctx));
        assert_eq!(b, a);
    }
}
