// Intrinsic-function folding: bitwise table, argument marshalling (BOZ
// reinterpretation, count narrowing, comparison widening), inquiries, and
// host-delegated elementary functions.

use feval_core::constant::{Constant, Scalar};
use feval_core::expr::{
    ActualArgument, BozLiteral, CharacterExpr, ComplexExpr, Expr, FunctionRef, IntegerExpr,
    LogicalExpr, RealExpr,
};
use feval_core::types::DynamicType;
use feval_core::value::{ComplexValue, RealValue};
use feval_fold::{Fold, FoldingContext, HostIntrinsicLibrary};
use pretty_assertions::assert_eq;

fn int4(value: i128) -> IntegerExpr {
    IntegerExpr::literal(4, value).unwrap()
}

fn real4(value: f64) -> RealExpr {
    RealExpr::literal(4, value).unwrap()
}

fn real8(value: f64) -> RealExpr {
    RealExpr::literal(8, value).unwrap()
}

fn args(values: Vec<Expr>) -> Vec<Option<ActualArgument>> {
    values
        .into_iter()
        .map(|v| Some(ActualArgument::new(v)))
        .collect()
}

fn int_call(name: &str, kind: u8, arguments: Vec<Expr>) -> IntegerExpr {
    IntegerExpr::FunctionRef(Box::new(FunctionRef::intrinsic(
        name,
        args(arguments),
        DynamicType::integer(kind).unwrap(),
    )))
}

fn real_call(name: &str, kind: u8, arguments: Vec<Expr>) -> RealExpr {
    RealExpr::FunctionRef(Box::new(FunctionRef::intrinsic(
        name,
        args(arguments),
        DynamicType::real(kind).unwrap(),
    )))
}

fn fold_int(name: &str, arguments: Vec<Expr>) -> (IntegerExpr, FoldingContext) {
    let mut ctx = FoldingContext::new();
    let folded = int_call(name, 4, arguments).fold(&mut ctx);
    (folded, ctx)
}

// ===== INTEGER ARITHMETIC AND BIT OPERATIONS =====

#[test]
fn abs_and_dim() {
    let (folded, ctx) = fold_int("abs", vec![Expr::Integer(int4(-5))]);
    assert_eq!(folded, int4(5));
    assert!(ctx.messages().is_empty());

    let (folded, _) = fold_int("dim", vec![Expr::Integer(int4(7)), Expr::Integer(int4(3))]);
    assert_eq!(folded, int4(4));
    let (folded, _) = fold_int("dim", vec![Expr::Integer(int4(3)), Expr::Integer(int4(7))]);
    assert_eq!(folded, int4(0));
}

#[test]
fn abs_of_most_negative_warns() {
    let (folded, ctx) = fold_int("abs", vec![Expr::Integer(int4(-2_147_483_648))]);
    assert_eq!(folded, int4(-2_147_483_648));
    assert_eq!(
        ctx.messages().texts(),
        vec!["abs(integer(kind=4)) folding overflowed"]
    );
}

#[test]
fn bitwise_table() {
    let (folded, _) = fold_int(
        "iand",
        vec![Expr::Integer(int4(0b1100)), Expr::Integer(int4(0b1010))],
    );
    assert_eq!(folded, int4(0b1000));
    let (folded, _) = fold_int(
        "ior",
        vec![Expr::Integer(int4(0b1100)), Expr::Integer(int4(0b1010))],
    );
    assert_eq!(folded, int4(0b1110));
    let (folded, _) = fold_int(
        "ieor",
        vec![Expr::Integer(int4(0b1100)), Expr::Integer(int4(0b1010))],
    );
    assert_eq!(folded, int4(0b0110));
}

#[test]
fn boz_arguments_take_the_result_kind() {
    let boz = Expr::BozLiteral(BozLiteral { bits: 0xF0 });
    let (folded, _) = fold_int("iand", vec![boz, Expr::Integer(int4(0xFF))]);
    assert_eq!(folded, int4(0xF0));
}

#[test]
fn shift_count_kind_is_narrowed() {
    // The count may be of any integer kind.
    let count = Expr::Integer(IntegerExpr::literal(8, 3).unwrap());
    let (folded, _) = fold_int("ishft", vec![Expr::Integer(int4(1)), count]);
    assert_eq!(folded, int4(8));

    let (folded, _) = fold_int("ishft", vec![Expr::Integer(int4(8)), Expr::Integer(int4(-3))]);
    assert_eq!(folded, int4(1));
    let (folded, _) = fold_int("shifta", vec![Expr::Integer(int4(-8)), Expr::Integer(int4(1))]);
    assert_eq!(folded, int4(-4));
    let (folded, _) = fold_int("shiftl", vec![Expr::Integer(int4(1)), Expr::Integer(int4(31))]);
    assert_eq!(folded, int4(-2_147_483_648));
}

#[test]
fn bit_inquiries() {
    let (folded, _) = fold_int("leadz", vec![Expr::Integer(int4(1))]);
    assert_eq!(folded, int4(31));
    let (folded, _) = fold_int("trailz", vec![Expr::Integer(int4(8))]);
    assert_eq!(folded, int4(3));
    let (folded, _) = fold_int("popcnt", vec![Expr::Integer(int4(7))]);
    assert_eq!(folded, int4(3));
    let (folded, _) = fold_int("poppar", vec![Expr::Integer(int4(7))]);
    assert_eq!(folded, int4(1));
    // The argument kind need not match the result kind.
    let wide = Expr::Integer(IntegerExpr::literal(8, -1).unwrap());
    let (folded, _) = fold_int("popcnt", vec![wide]);
    assert_eq!(folded, int4(64));
}

#[test]
fn masks_and_merges() {
    let (folded, _) = fold_int("maskr", vec![Expr::Integer(int4(4))]);
    assert_eq!(folded, int4(15));
    let (folded, _) = fold_int("maskl", vec![Expr::Integer(int4(1))]);
    assert_eq!(folded, int4(-2_147_483_648));
    let (folded, _) = fold_int(
        "merge_bits",
        vec![
            Expr::Integer(int4(0b1010)),
            Expr::Integer(int4(0b0101)),
            Expr::Integer(int4(0b1100)),
        ],
    );
    assert_eq!(folded, int4(0b1001));
    let (folded, _) = fold_int(
        "dshiftl",
        vec![
            Expr::Integer(int4(1)),
            Expr::Integer(int4(0)),
            Expr::Integer(int4(1)),
        ],
    );
    assert_eq!(folded, int4(2));
}

#[test]
fn int_conversion_reports_overflow() {
    let mut ctx = FoldingContext::new();
    let wide = Expr::Integer(IntegerExpr::literal(8, 300).unwrap());
    let folded = int_call("int", 1, vec![wide]).fold(&mut ctx);
    assert_eq!(folded, IntegerExpr::literal(1, 44).unwrap());
    assert_eq!(
        ctx.messages().texts(),
        vec!["INTEGER(8) to INTEGER(1) conversion overflowed"]
    );
}

#[test]
fn int_of_real_truncates() {
    let (folded, ctx) = fold_int("int", vec![Expr::Real(real4(3.75))]);
    assert_eq!(folded, int4(3));
    assert!(ctx.messages().is_empty());

    let mut ctx = FoldingContext::new();
    let nan = Expr::Real(RealExpr::literal(4, f64::NAN).unwrap());
    let folded = int_call("int", 4, vec![nan]).fold(&mut ctx);
    assert_eq!(folded, int4(0));
    assert_eq!(
        ctx.messages().texts(),
        vec!["REAL(4) to INTEGER(4) conversion: invalid argument"]
    );
}

#[test]
fn kind_rank_and_len_inquiries() {
    let (folded, _) = fold_int("kind", vec![Expr::Real(real8(0.0))]);
    assert_eq!(folded, int4(8));

    let (folded, _) = fold_int("rank", vec![Expr::Integer(int4(1))]);
    assert_eq!(folded, int4(0));

    let string = Expr::Character(CharacterExpr::literal(1, "HELLO").unwrap());
    let (folded, _) = fold_int("len", vec![string]);
    assert_eq!(folded, int4(5));
}

#[test]
fn exponent_inquiry() {
    let (folded, _) = fold_int("exponent", vec![Expr::Real(real4(4.0))]);
    assert_eq!(folded, int4(3));
}

// ===== REAL INTRINSICS =====

#[test]
fn direct_real_intrinsics() {
    let mut ctx = FoldingContext::new();
    let folded = real_call("abs", 4, vec![Expr::Real(real4(-2.5))]).fold(&mut ctx);
    assert_eq!(folded, real4(2.5));

    let folded = real_call("aint", 4, vec![Expr::Real(real4(3.7))]).fold(&mut ctx);
    assert_eq!(folded, real4(3.0));

    let folded = real_call("epsilon", 4, vec![Expr::Real(real4(0.0))]).fold(&mut ctx);
    assert_eq!(folded, real4(f32::EPSILON as f64));
    assert!(ctx.messages().is_empty());
}

#[test]
fn aint_converts_its_argument_kind_first() {
    let mut ctx = FoldingContext::new();
    let folded = real_call("aint", 8, vec![Expr::Real(real4(2.5))]).fold(&mut ctx);
    assert_eq!(folded, real8(2.0));
}

#[test]
fn dprod_multiplies_in_double_precision() {
    let mut ctx = FoldingContext::new();
    let folded = real_call(
        "dprod",
        8,
        vec![Expr::Real(real4(1.5)), Expr::Real(real4(2.0))],
    )
    .fold(&mut ctx);
    assert_eq!(folded, real8(3.0));
}

#[test]
fn real_of_boz_moves_bits() {
    let mut ctx = FoldingContext::new();
    let bits = Expr::BozLiteral(BozLiteral { bits: 0x3f80_0000 });
    let folded = real_call("real", 4, vec![bits]).fold(&mut ctx);
    assert_eq!(folded, real4(1.0));
    assert!(ctx.messages().is_empty());

    let mut ctx = FoldingContext::new();
    let truncated = Expr::BozLiteral(BozLiteral {
        bits: 0x1_3f80_0000,
    });
    let folded = real_call("real", 4, vec![truncated]).fold(&mut ctx);
    assert_eq!(folded, real4(1.0));
    assert_eq!(
        ctx.messages().texts(),
        vec!["Nonzero bits truncated from BOZ literal constant in REAL intrinsic"]
    );
}

#[test]
fn host_binary_intrinsics() {
    let mut ctx = FoldingContext::new().with_host_library(HostIntrinsicLibrary::host_default());
    let folded = real_call(
        "hypot",
        8,
        vec![Expr::Real(real8(3.0)), Expr::Real(real8(4.0))],
    )
    .fold(&mut ctx);
    assert_eq!(folded, real8(5.0));

    let folded = real_call(
        "mod",
        8,
        vec![Expr::Real(real8(7.5)), Expr::Real(real8(2.0))],
    )
    .fold(&mut ctx);
    assert_eq!(folded, real8(1.5));
    assert!(ctx.messages().is_empty());
}

#[test]
fn missing_host_entries_report_informational() {
    // The default library has no error function.
    let mut ctx = FoldingContext::new().with_host_library(HostIntrinsicLibrary::host_default());
    let folded = real_call("erf", 4, vec![Expr::Real(real4(0.5))]).fold(&mut ctx);
    assert!(matches!(folded, RealExpr::FunctionRef(_)));
    assert_eq!(
        ctx.messages().texts(),
        vec!["erf(real(kind=4)) cannot be folded on host"]
    );

    let mut ctx = FoldingContext::new();
    let folded = real_call(
        "atan2",
        4,
        vec![Expr::Real(real4(1.0)), Expr::Real(real4(1.0))],
    )
    .fold(&mut ctx);
    assert!(matches!(folded, RealExpr::FunctionRef(_)));
    assert_eq!(
        ctx.messages().texts(),
        vec!["atan2(real(kind=4), real(kind4)) cannot be folded on host"]
    );

    let mut ctx = FoldingContext::new();
    let folded = real_call(
        "bessel_jn",
        4,
        vec![Expr::Integer(int4(1)), Expr::Real(real4(1.0))],
    )
    .fold(&mut ctx);
    assert!(matches!(folded, RealExpr::FunctionRef(_)));
    assert_eq!(
        ctx.messages().texts(),
        vec!["bessel_jn(integer(kind=4), real(kind=4)) cannot be folded on host"]
    );
}

// ===== COMPLEX INTRINSICS =====

fn complex8(re: f64, im: f64) -> ComplexExpr {
    ComplexExpr::Constant(Constant::scalar(Scalar::Complex(ComplexValue::from_parts(
        RealValue::new(8, re).unwrap(),
        RealValue::new(8, im).unwrap(),
    ))))
}

#[test]
fn conjg_and_aimag() {
    let mut ctx = FoldingContext::new();
    let call = ComplexExpr::FunctionRef(Box::new(FunctionRef::intrinsic(
        "conjg",
        args(vec![Expr::Complex(complex8(1.0, 2.0))]),
        DynamicType::complex(8).unwrap(),
    )));
    assert_eq!(call.fold(&mut ctx), complex8(1.0, -2.0));

    let call = real_call("aimag", 8, vec![Expr::Complex(complex8(1.0, 2.0))]);
    assert_eq!(call.fold(&mut ctx), real8(2.0));
}

#[test]
fn abs_of_complex_uses_host() {
    let mut ctx = FoldingContext::new().with_host_library(HostIntrinsicLibrary::host_default());
    let folded = real_call("abs", 8, vec![Expr::Complex(complex8(3.0, 4.0))]).fold(&mut ctx);
    assert_eq!(folded, real8(5.0));

    let mut ctx = FoldingContext::new();
    let folded = real_call("abs", 8, vec![Expr::Complex(complex8(3.0, 4.0))]).fold(&mut ctx);
    assert!(matches!(folded, RealExpr::FunctionRef(_)));
    assert_eq!(
        ctx.messages().texts(),
        vec!["abs(complex(kind=8)) cannot be folded on host"]
    );
}

#[test]
fn cmplx_constructs_from_parts() {
    let mut ctx = FoldingContext::new();
    let call = ComplexExpr::FunctionRef(Box::new(FunctionRef::intrinsic(
        "cmplx",
        vec![
            Some(ActualArgument::new(Expr::Integer(int4(3)))),
            Some(ActualArgument::new(Expr::Real(real8(0.5)))),
            None,
        ],
        DynamicType::complex(8).unwrap(),
    )));
    assert_eq!(call.fold(&mut ctx), complex8(3.0, 0.5));
}

#[test]
fn complex_transcendentals_via_host() {
    let mut ctx = FoldingContext::new().with_host_library(HostIntrinsicLibrary::host_default());
    let call = ComplexExpr::FunctionRef(Box::new(FunctionRef::intrinsic(
        "sqrt",
        args(vec![Expr::Complex(complex8(-4.0, 0.0))]),
        DynamicType::complex(8).unwrap(),
    )));
    assert_eq!(call.fold(&mut ctx), complex8(0.0, 2.0));

    // Entries absent from the host table report and stay put.
    let mut ctx = FoldingContext::new().with_host_library(HostIntrinsicLibrary::host_default());
    let call = ComplexExpr::FunctionRef(Box::new(FunctionRef::intrinsic(
        "asin",
        args(vec![Expr::Complex(complex8(0.5, 0.0))]),
        DynamicType::complex(8).unwrap(),
    )));
    let folded = call.fold(&mut ctx);
    assert!(matches!(folded, ComplexExpr::FunctionRef(_)));
    assert_eq!(
        ctx.messages().texts(),
        vec!["asin(complex(kind=8)) cannot be folded on host"]
    );
}

// ===== BIT COMPARISONS =====

#[test]
fn bit_comparisons_widen_operands() {
    let mut ctx = FoldingContext::new();
    let call = LogicalExpr::FunctionRef(Box::new(FunctionRef::intrinsic(
        "bgt",
        args(vec![
            Expr::Integer(IntegerExpr::literal(1, -1).unwrap()),
            Expr::Integer(IntegerExpr::literal(8, 1).unwrap()),
        ]),
        DynamicType::logical(4).unwrap(),
    )));
    // -1 widens sign-extended, so its bit pattern compares high.
    let folded = call.fold(&mut ctx);
    assert_eq!(folded, LogicalExpr::literal(4, true).unwrap());

    let call = LogicalExpr::FunctionRef(Box::new(FunctionRef::intrinsic(
        "ble",
        args(vec![
            Expr::Integer(int4(1)),
            Expr::BozLiteral(BozLiteral { bits: 2 }),
        ]),
        DynamicType::logical(4).unwrap(),
    )));
    let folded = call.fold(&mut ctx);
    assert_eq!(folded, LogicalExpr::literal(4, true).unwrap());
}

// ===== UNKNOWN INTRINSICS =====

#[test]
fn unknown_intrinsics_fold_arguments_only() {
    let mut ctx = FoldingContext::new();
    let call = int_call(
        "not_an_intrinsic_we_fold",
        4,
        vec![Expr::Integer(int4(1) + int4(2))],
    );
    let folded = call.fold(&mut ctx);
    match &folded {
        IntegerExpr::FunctionRef(fr) => {
            assert_eq!(fr.argument(0, "a"), Some(&Expr::Integer(int4(3))));
        }
        other => panic!("expected an unfolded reference, got {}", other),
    }
    assert!(ctx.messages().is_empty());
}

// ===== SNAPSHOTS =====

#[test]
fn folded_constants_serialize() {
    let mut ctx = FoldingContext::new();
    let folded = (int4(20) + int4(22)).fold(&mut ctx);
    let json = serde_json::to_value(&folded).unwrap();
    assert!(json.is_object());
    let back: IntegerExpr = serde_json::from_value(json).unwrap();
    assert_eq!(back, folded);
}
