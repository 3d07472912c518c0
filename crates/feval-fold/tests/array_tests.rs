// Array constructor folding, implied-DO edge cases, character and logical
// folding, and the constant-expression predicate.

use feval_core::constant::{Constant, Scalar};
use feval_core::expr::{
    ArrayConstructor, ArrayConstructorValue, CharacterExpr, Designator, Expr, ImpliedDo,
    ImpliedDoIndex, IntegerExpr, LogicalExpr, LogicalOperator, RealExpr, Relational,
    RelationalOperation, Substring, SubstringParent,
};
use feval_core::symbol::Symbol;
use feval_core::types::{DynamicType, Ordering, RelationalOperator};
use feval_core::value::{CharValue, IntValue};
use feval_fold::{is_constant_expr, Fold, FoldingContext};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn subscript_index(name: &str) -> IntegerExpr {
    IntegerExpr::ImpliedDoIndex(ImpliedDoIndex { name: name.into() })
}

fn implied_do(
    name: &str,
    lower: i64,
    upper: i64,
    stride: i64,
    values: Vec<ArrayConstructorValue<IntegerExpr>>,
) -> ArrayConstructorValue<IntegerExpr> {
    ArrayConstructorValue::ImpliedDo(ImpliedDo {
        name: name.into(),
        lower: Box::new(IntegerExpr::subscript(lower)),
        upper: Box::new(IntegerExpr::subscript(upper)),
        stride: Box::new(IntegerExpr::subscript(stride)),
        values,
    })
}

fn int_constructor(values: Vec<ArrayConstructorValue<IntegerExpr>>) -> IntegerExpr {
    IntegerExpr::ArrayConstructor(Box::new(ArrayConstructor::new(
        DynamicType::subscript_integer(),
        values,
    )))
}

fn folded_values(expr: &IntegerExpr) -> Option<Vec<i128>> {
    match expr {
        IntegerExpr::Constant(c) => Some(
            c.elements()
                .iter()
                .map(|s| s.as_integer().unwrap().to_i128())
                .collect(),
        ),
        _ => None,
    }
}

#[test]
fn nested_implied_dos_compose() {
    let mut ctx = FoldingContext::new();
    // ((i*10 + j, j = 1,2), i = 1,2) -> [11, 12, 21, 22]
    let body = subscript_index("i") * IntegerExpr::subscript(10) + subscript_index("j");
    let constructor = int_constructor(vec![implied_do(
        "i",
        1,
        2,
        1,
        vec![implied_do(
            "j",
            1,
            2,
            1,
            vec![ArrayConstructorValue::Expr(body)],
        )],
    )]);
    let folded = constructor.fold(&mut ctx);
    assert_eq!(folded_values(&folded), Some(vec![11, 12, 21, 22]));
    // The index bindings are scoped to the unroll.
    assert_eq!(ctx.get_implied_do("i"), None);
    assert_eq!(ctx.get_implied_do("j"), None);
}

#[test]
fn negative_stride_counts_down() {
    let mut ctx = FoldingContext::new();
    let constructor = int_constructor(vec![implied_do(
        "i",
        5,
        1,
        -2,
        vec![ArrayConstructorValue::Expr(subscript_index("i"))],
    )]);
    let folded = constructor.fold(&mut ctx);
    assert_eq!(folded_values(&folded), Some(vec![5, 3, 1]));
}

#[test]
fn zero_stride_abandons_the_fold() {
    let mut ctx = FoldingContext::new();
    let constructor = int_constructor(vec![implied_do(
        "i",
        1,
        3,
        0,
        vec![ArrayConstructorValue::Expr(subscript_index("i"))],
    )]);
    let folded = constructor.fold(&mut ctx);
    assert!(matches!(folded, IntegerExpr::ArrayConstructor(_)));
    assert!(ctx.messages().is_empty());
    assert_eq!(ctx.get_implied_do("i"), None);
}

#[test]
fn empty_iteration_spaces_fold_to_empty_arrays() {
    let mut ctx = FoldingContext::new();
    let constructor = int_constructor(vec![implied_do(
        "i",
        5,
        1,
        1,
        vec![ArrayConstructorValue::Expr(subscript_index("i"))],
    )]);
    let folded = constructor.fold(&mut ctx);
    match &folded {
        IntegerExpr::Constant(c) => {
            assert_eq!(c.shape(), &[0]);
            assert_eq!(c.size(), 0);
        }
        other => panic!("expected an empty constant, got {}", other),
    }
}

#[test]
fn symbolic_elements_abandon_the_fold_with_folded_subtrees() {
    let mut ctx = FoldingContext::new();
    let symbol = Arc::new(Symbol::scalar("n", DynamicType::subscript_integer()));
    let symbolic = IntegerExpr::Designator(Box::new(Designator::Symbol(symbol)));
    let constructor = int_constructor(vec![
        ArrayConstructorValue::Expr(IntegerExpr::subscript(1) + IntegerExpr::subscript(2)),
        ArrayConstructorValue::Expr(symbolic),
    ]);
    let folded = constructor.fold(&mut ctx);
    match &folded {
        IntegerExpr::ArrayConstructor(ac) => match &ac.values[0] {
            ArrayConstructorValue::Expr(e) => {
                assert_eq!(e, &IntegerExpr::subscript(3));
            }
            other => panic!("expected an expression element, got {:?}", other),
        },
        other => panic!("expected a constructor, got {}", other),
    }
}

#[test]
fn lower_rank_array_elements_linearize() {
    let mut ctx = FoldingContext::new();
    let nested = IntegerExpr::Constant(
        Constant::array(
            DynamicType::subscript_integer(),
            vec![2, 2],
            [10, 20, 30, 40]
                .iter()
                .map(|&v| Scalar::Integer(IntValue::wrapped(8, v)))
                .collect(),
        )
        .unwrap(),
    );
    let constructor = int_constructor(vec![
        ArrayConstructorValue::Expr(IntegerExpr::subscript(1)),
        ArrayConstructorValue::Expr(nested),
    ]);
    let folded = constructor.fold(&mut ctx);
    assert_eq!(folded_values(&folded), Some(vec![1, 10, 20, 30, 40]));
}

#[test]
fn character_constructors_carry_length() {
    let mut ctx = FoldingContext::new();
    let constructor = CharacterExpr::ArrayConstructor(Box::new(
        ArrayConstructor::new(
            DynamicType::character(1).unwrap(),
            vec![
                ArrayConstructorValue::Expr(CharacterExpr::literal(1, "AB").unwrap()),
                ArrayConstructorValue::Expr(CharacterExpr::literal(1, "CD").unwrap()),
            ],
        )
        .with_length(IntegerExpr::subscript(2)),
    ));
    let folded = constructor.fold(&mut ctx);
    match &folded {
        CharacterExpr::Constant(c) => {
            assert_eq!(c.shape(), &[2]);
            assert_eq!(c.len(), Some(2));
        }
        other => panic!("expected a constant, got {}", other),
    }
}

// ===== CHARACTER FOLDING =====

#[test]
fn substring_of_literal_folds() {
    let mut ctx = FoldingContext::new();
    let substring = CharacterExpr::Designator(Box::new(Designator::Substring(Substring {
        parent: SubstringParent::Literal(CharValue::from_str(1, "HELLO").unwrap()),
        lower: Some(Box::new(IntegerExpr::subscript(2))),
        upper: Some(Box::new(IntegerExpr::subscript(4))),
    })));
    let folded = substring.fold(&mut ctx);
    assert_eq!(folded, CharacterExpr::literal(1, "ELL").unwrap());
}

#[test]
fn set_length_truncates_and_pads() {
    let mut ctx = FoldingContext::new();
    let padded = CharacterExpr::set_length(
        CharacterExpr::literal(1, "AB").unwrap(),
        IntegerExpr::subscript(4),
    )
    .fold(&mut ctx);
    assert_eq!(padded, CharacterExpr::literal(1, "AB  ").unwrap());

    let truncated = CharacterExpr::set_length(
        CharacterExpr::literal(1, "ABCD").unwrap(),
        IntegerExpr::subscript(2),
    )
    .fold(&mut ctx);
    assert_eq!(truncated, CharacterExpr::literal(1, "AB").unwrap());
}

#[test]
fn non_ascii_conversion_stays_unfolded() {
    let mut ctx = FoldingContext::new();
    let wide = CharacterExpr::Constant(Constant::scalar(Scalar::Character(
        CharValue::new(4, vec![0x3042]).unwrap(),
    )));
    let conversion = CharacterExpr::convert(1, wide).unwrap().fold(&mut ctx);
    assert!(matches!(conversion, CharacterExpr::Convert(_)));
    assert!(ctx.messages().is_empty());

    let ascii = CharacterExpr::convert(4, CharacterExpr::literal(1, "ok").unwrap())
        .unwrap()
        .fold(&mut ctx);
    assert_eq!(ascii, CharacterExpr::literal(4, "ok").unwrap());
}

#[test]
fn character_extremum_ties_prefer_the_first() {
    let mut ctx = FoldingContext::new();
    let max = CharacterExpr::extremum(
        Ordering::Greater,
        CharacterExpr::literal(1, "AB").unwrap(),
        CharacterExpr::literal(1, "AB  ").unwrap(),
    )
    .unwrap()
    .fold(&mut ctx);
    // Blank padding makes these equal; the first operand wins.
    assert_eq!(max, CharacterExpr::literal(1, "AB").unwrap());
}

// ===== REAL EXTREMA =====

#[test]
fn real_extremum_with_nan_returns_first() {
    let mut ctx = FoldingContext::new();
    let nan = RealExpr::literal(4, f64::NAN).unwrap();
    let one = RealExpr::literal(4, 1.0).unwrap();
    let folded = RealExpr::extremum(Ordering::Greater, nan.clone(), one.clone())
        .unwrap()
        .fold(&mut ctx);
    match &folded {
        RealExpr::Constant(c) => {
            assert!(c.scalar_value().unwrap().as_real().unwrap().is_not_a_number());
        }
        other => panic!("expected a constant, got {}", other),
    }

    let folded = RealExpr::extremum(Ordering::Greater, one.clone(), nan)
        .unwrap()
        .fold(&mut ctx);
    assert_eq!(folded, one);
}

// ===== LOGICAL AND RELATIONAL =====

#[test]
fn logical_operations_fold_truth_tables() {
    let mut ctx = FoldingContext::new();
    let t = || LogicalExpr::literal(4, true).unwrap();
    let f = || LogicalExpr::literal(4, false).unwrap();
    for (op, expected) in [
        (LogicalOperator::And, false),
        (LogicalOperator::Or, true),
        (LogicalOperator::Eqv, false),
        (LogicalOperator::Neqv, true),
    ] {
        let folded = LogicalExpr::binary(op, t(), f()).unwrap().fold(&mut ctx);
        assert_eq!(folded, LogicalExpr::literal(4, expected).unwrap());
    }
    let folded = LogicalExpr::not(f()).fold(&mut ctx);
    assert_eq!(folded, t());
}

#[test]
fn relational_comparisons_produce_logical_kind_one() {
    let mut ctx = FoldingContext::new();
    let relation = LogicalExpr::relational(Relational::Integer(Box::new(RelationalOperation {
        op: RelationalOperator::LT,
        left: IntegerExpr::literal(4, 1).unwrap(),
        right: IntegerExpr::literal(4, 2).unwrap(),
    })));
    let folded = relation.fold(&mut ctx);
    assert_eq!(folded, LogicalExpr::result(true));
    assert_eq!(folded.kind(), 1);
}

#[test]
fn nan_comparisons_are_unordered() {
    let mut ctx = FoldingContext::new();
    let nan = || RealExpr::literal(4, f64::NAN).unwrap();
    let make = |op| {
        LogicalExpr::relational(Relational::Real(Box::new(RelationalOperation {
            op,
            left: nan(),
            right: RealExpr::literal(4, 1.0).unwrap(),
        })))
    };
    assert_eq!(make(RelationalOperator::EQ).fold(&mut ctx), LogicalExpr::result(false));
    assert_eq!(make(RelationalOperator::NE).fold(&mut ctx), LogicalExpr::result(true));
    assert_eq!(make(RelationalOperator::LT).fold(&mut ctx), LogicalExpr::result(false));
}

#[test]
fn relational_lifts_elementwise() {
    let mut ctx = FoldingContext::new();
    let array = |values: &[i128]| {
        IntegerExpr::Constant(
            Constant::array(
                DynamicType::integer(4).unwrap(),
                vec![values.len() as i64],
                values
                    .iter()
                    .map(|&v| Scalar::Integer(IntValue::wrapped(4, v)))
                    .collect(),
            )
            .unwrap(),
        )
    };
    let relation = LogicalExpr::relational(Relational::Integer(Box::new(RelationalOperation {
        op: RelationalOperator::GT,
        left: array(&[1, 5, 3]),
        right: array(&[2, 4, 3]),
    })));
    let folded = relation.fold(&mut ctx);
    match &folded {
        LogicalExpr::Constant(c) => {
            assert_eq!(c.shape(), &[3]);
            let values: Vec<bool> = c
                .elements()
                .iter()
                .map(|s| s.as_logical().unwrap().is_true())
                .collect();
            assert_eq!(values, vec![false, true, false]);
        }
        other => panic!("expected a constant, got {}", other),
    }
}

// ===== REAL VALUE SEMANTICS UNDER CONTEXT OPTIONS =====

#[test]
fn subnormal_flush_is_context_controlled() {
    let tiny = f64::from_bits(1); // smallest positive subnormal binary64
    let mut plain = FoldingContext::new();
    let kept = (RealExpr::literal(8, tiny).unwrap() * RealExpr::literal(8, 1.0).unwrap())
        .fold(&mut plain);
    match kept {
        RealExpr::Constant(c) => {
            assert!(c.scalar_value().unwrap().as_real().unwrap().to_f64() != 0.0)
        }
        other => panic!("expected a constant, got {}", other),
    }

    let mut flushing = FoldingContext::new().with_flush_subnormals_to_zero(true);
    let flushed = (RealExpr::literal(8, tiny).unwrap() * RealExpr::literal(8, 1.0).unwrap())
        .fold(&mut flushing);
    assert_eq!(flushed, RealExpr::literal(8, 0.0).unwrap());
}

// ===== CONSTANT EXPRESSION PREDICATE =====

#[test]
fn constant_expression_classification() {
    let literal: Expr = IntegerExpr::literal(4, 1).unwrap().into();
    assert!(is_constant_expr(&literal));

    let parameter = Arc::new(
        Symbol::scalar("p", DynamicType::integer(4).unwrap()).parameter(),
    );
    let named: Expr = IntegerExpr::Designator(Box::new(Designator::Symbol(parameter))).into();
    assert!(is_constant_expr(&named));

    let variable = Arc::new(Symbol::scalar("v", DynamicType::integer(4).unwrap()));
    let reference: Expr = IntegerExpr::Designator(Box::new(Designator::Symbol(variable))).into();
    assert!(!is_constant_expr(&reference));

    // Only the KIND inquiry is admitted among function references.
    use feval_core::expr::{ActualArgument, FunctionRef};
    let kind_call: Expr = IntegerExpr::FunctionRef(Box::new(FunctionRef::intrinsic(
        "kind",
        vec![Some(ActualArgument::new(literal.clone()))],
        DynamicType::integer(4).unwrap(),
    )))
    .into();
    assert!(is_constant_expr(&kind_call));

    let other_call: Expr = IntegerExpr::FunctionRef(Box::new(FunctionRef::intrinsic(
        "size",
        vec![Some(ActualArgument::new(literal))],
        DynamicType::integer(4).unwrap(),
    )))
    .into();
    assert!(!is_constant_expr(&other_call));
}

#[test]
fn to_int64_requires_folded_scalar_constants() {
    use feval_fold::to_int64;
    let scalar: Expr = IntegerExpr::literal(4, 7).unwrap().into();
    assert_eq!(to_int64(&scalar), Some(7));

    let unfolded: Expr = (IntegerExpr::literal(4, 3).unwrap() + IntegerExpr::literal(4, 4).unwrap()).into();
    assert_eq!(to_int64(&unfolded), None);

    let real: Expr = RealExpr::literal(4, 7.0).unwrap().into();
    assert_eq!(to_int64(&real), None);
}
