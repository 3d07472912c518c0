// Expression algebra tests: construction, structural equality, Fortran
// rendering, and serde round-trips.

use feval_core::expr::{
    CharacterExpr, Expr, IntegerExpr, LogicalExpr, NumericExpr, NumericOp, RealExpr, Relational,
    RelationalOperation,
};
use feval_core::types::{DynamicType, Ordering, RelationalOperator};
use pretty_assertions::assert_eq;

fn int4(value: i128) -> IntegerExpr {
    IntegerExpr::literal(4, value).unwrap()
}

// ===== RENDERING =====

#[test]
fn renders_literals_and_operations() {
    assert_eq!(int4(666).to_string(), "666_4");
    assert_eq!((-int4(1)).to_string(), "(-1_4)");
    let expr = int4(2) + int4(3) * -int4(4);
    assert_eq!(expr.to_string(), "2_4+3_4*(-4_4)");
    assert_eq!((int4(1) / int4(2)).to_string(), "1_4/2_4");
}

#[test]
fn renders_parentheses_and_extrema() {
    let wrapped = IntegerExpr::parenthesize(int4(3));
    assert_eq!(wrapped.to_string(), "(3_4)");
    let max = IntegerExpr::extremum(Ordering::Greater, int4(1), int4(2)).unwrap();
    assert_eq!(max.to_string(), "max(1_4,2_4)");
    let min = IntegerExpr::extremum(Ordering::Less, int4(1), int4(2)).unwrap();
    assert_eq!(min.to_string(), "min(1_4,2_4)");
}

#[test]
fn renders_type_names() {
    assert_eq!(DynamicType::integer(4).unwrap().to_string(), "Integer(4)");
}

#[test]
fn renders_relational_and_logical() {
    let relation = LogicalExpr::relational(Relational::Integer(Box::new(RelationalOperation {
        op: RelationalOperator::LT,
        left: int4(1),
        right: int4(2),
    })));
    assert_eq!(relation.to_string(), "1_4<2_4");
    let not = LogicalExpr::not(LogicalExpr::literal(4, true).unwrap());
    assert_eq!(not.to_string(), ".NOT..true._4");
}

// ===== STRUCTURAL EQUALITY AND OWNERSHIP =====

#[test]
fn expressions_compare_structurally() {
    let a = int4(2) + int4(3);
    let b = int4(2) + int4(3);
    let c = int4(3) + int4(2);
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn assignment_copies_deeply() {
    let mut a = int4(1);
    let b = int4(2);
    assert_eq!(a.to_string(), "1_4");
    a = b.clone();
    assert_eq!(a.to_string(), "2_4");
    assert_eq!(b.to_string(), "2_4");
}

// ===== CONSTRUCTION CHECKS =====

#[test]
fn operand_kinds_must_agree() {
    let narrow = IntegerExpr::literal(2, 1).unwrap();
    let wide = IntegerExpr::literal(8, 1).unwrap();
    assert!(IntegerExpr::binary(NumericOp::Add, narrow, wide).is_err());

    let left = RealExpr::literal(4, 1.0).unwrap();
    let right = RealExpr::literal(8, 1.0).unwrap();
    assert!(RealExpr::binary(NumericOp::Add, left, right).is_err());
}

#[test]
fn invalid_kinds_are_rejected() {
    assert!(IntegerExpr::literal(3, 0).is_err());
    assert!(RealExpr::literal(5, 0.0).is_err());
    assert!(CharacterExpr::literal(3, "x").is_err());
}

#[test]
fn convert_validates_target_kind() {
    let value = NumericExpr::Integer(int4(1));
    assert!(IntegerExpr::convert(16, value.clone()).is_ok());
    assert!(IntegerExpr::convert(3, value).is_err());
}

// ===== CHARACTER LENGTH SYNTHESIS =====

#[test]
fn concat_length_is_sum() {
    let left = CharacterExpr::literal(1, "AB").unwrap();
    let right = CharacterExpr::literal(1, "CDE").unwrap();
    let concat = CharacterExpr::concat(left, right).unwrap();
    let len = concat.len_expr().unwrap();
    assert_eq!(len.to_string(), "2_8+3_8");
}

#[test]
fn set_length_wins_over_operand_length() {
    let value = CharacterExpr::literal(1, "ABCDEF").unwrap();
    let adjusted = CharacterExpr::set_length(value, IntegerExpr::subscript(3));
    assert_eq!(adjusted.len_expr().unwrap().to_string(), "3_8");
}

// ===== SERIALIZATION =====

#[test]
fn serde_round_trip_preserves_structure() {
    let expr: Expr = (int4(2) + int4(3) * -int4(4)).into();
    let json = serde_json::to_string(&expr).unwrap();
    let back: Expr = serde_json::from_str(&json).unwrap();
    assert_eq!(expr, back);
}

#[test]
fn typed_accessors() {
    let expr: Expr = int4(7).into();
    assert_eq!(expr.ty(), Some(DynamicType::integer(4).unwrap()));
    assert_eq!(expr.rank(), 0);
    assert!(expr.as_integer().is_some());
}
