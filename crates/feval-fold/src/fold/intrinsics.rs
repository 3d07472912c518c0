//! Folding of references to specific intrinsic functions, dispatched on
//! the lowercase name resolved by earlier phases.
//!
//! Argument marshalling is uniform: BOZ arguments of bitwise intrinsics
//! are reinterpreted into the result type, count/shift arguments narrow to
//! integer kind 4, and the bit-comparison intrinsics widen both arguments
//! to the largest integer kind.  Unsupported intrinsics are returned
//! unfolded; that is not an error.  Elementary math delegates to the host
//! intrinsic library when one is present.

use crate::context::FoldingContext;
use crate::fold::{constant_int, constant_real, Fold};
use crate::shape::{as_extent_array_expr, get_shape, get_size};
use crate::traverse::to_int64;
use feval_core::constant::{Constant, Scalar};
use feval_core::expr::{
    BinaryOperation, CharacterExpr, ComplexConstructorOp, ComplexExpr, Convert, Expr, FunctionRef,
    IntegerExpr, LogicalExpr, NullPointer, NumericExpr, NumericOp, RealExpr, DEFAULT_INTEGER_KIND,
    DEFAULT_LOGICAL_KIND, DEFAULT_REAL_KIND,
};
use feval_core::types::{DynamicType, TypeCategory, LARGEST_INTEGER_KIND};
use feval_core::value::{IntValue, LogicalValue, RealValue};
use tracing::debug;

/// Fold every present argument in place.
pub(crate) fn fold_arguments(ctx: &mut FoldingContext, fr: &mut FunctionRef) {
    for arg in fr.args.iter_mut().flatten() {
        let value = std::mem::replace(&mut arg.value, Expr::NullPointer(NullPointer));
        arg.value = value.fold(ctx);
    }
}

// ----- constant extraction through parentheses -----

fn integer_constant(expr: &IntegerExpr) -> Option<&Constant> {
    match expr {
        IntegerExpr::Constant(c) => Some(c),
        IntegerExpr::Parentheses(p) => integer_constant(&p.operand),
        _ => None,
    }
}

fn real_constant(expr: &RealExpr) -> Option<&Constant> {
    match expr {
        RealExpr::Constant(c) => Some(c),
        RealExpr::Parentheses(p) => real_constant(&p.operand),
        _ => None,
    }
}

fn complex_constant(expr: &ComplexExpr) -> Option<&Constant> {
    match expr {
        ComplexExpr::Constant(c) => Some(c),
        ComplexExpr::Parentheses(p) => complex_constant(&p.operand),
        _ => None,
    }
}

fn expr_constant(expr: &Expr) -> Option<&Constant> {
    match expr {
        Expr::Integer(e) => integer_constant(e),
        Expr::Real(e) => real_constant(e),
        Expr::Complex(e) => complex_constant(e),
        _ => None,
    }
}

fn arg_constant(fr: &FunctionRef, index: usize, keyword: &str) -> Option<Constant> {
    expr_constant(fr.argument(index, keyword)?).cloned()
}

fn arg_value_mut(fr: &mut FunctionRef, index: usize) -> Option<&mut Expr> {
    fr.args.get_mut(index)?.as_mut().map(|a| &mut a.value)
}

// ----- argument marshalling -----

/// Reinterpret a BOZ argument's bits into an integer of the result kind.
fn convert_boz_arg(fr: &mut FunctionRef, index: usize, kind: u8) {
    if let Some(slot) = arg_value_mut(fr, index) {
        if let Expr::BozLiteral(b) = slot {
            let converted = IntValue::convert_unsigned(kind, b.bits);
            *slot = Expr::Integer(constant_int(converted.value));
        }
    }
}

/// Narrow or widen an integer argument to the given kind; counts and shift
/// amounts are bounded by BIT_SIZE, so kind 4 always suffices for them.
fn convert_int_arg(ctx: &mut FoldingContext, fr: &mut FunctionRef, index: usize, kind: u8) {
    if let Some(slot) = arg_value_mut(fr, index) {
        if let Expr::Integer(e) = slot {
            if e.kind() != kind {
                let owned = std::mem::replace(e, IntegerExpr::subscript(0));
                *e = IntegerExpr::Convert(Box::new(Convert {
                    kind,
                    operand: NumericExpr::Integer(owned),
                }))
                .fold(ctx);
            }
        }
    }
}

/// Bit-comparison arguments widen to the largest integer kind; BOZ
/// arguments already are bags of bits of that width.
fn widen_bit_compare_arg(ctx: &mut FoldingContext, fr: &mut FunctionRef, index: usize) {
    if let Some(slot) = arg_value_mut(fr, index) {
        match slot {
            Expr::Integer(e) if e.kind() != LARGEST_INTEGER_KIND => {
                let owned = std::mem::replace(e, IntegerExpr::subscript(0));
                *e = IntegerExpr::Convert(Box::new(Convert {
                    kind: LARGEST_INTEGER_KIND,
                    operand: NumericExpr::Integer(owned),
                }))
                .fold(ctx);
            }
            Expr::BozLiteral(b) => {
                let converted = IntValue::convert_unsigned(LARGEST_INTEGER_KIND, b.bits);
                *slot = Expr::Integer(constant_int(converted.value));
            }
            _ => {}
        }
    }
}

// ----- elemental application over constant arguments -----

fn elemental_unary(
    ctx: &mut FoldingContext,
    result_ty: DynamicType,
    arg: &Constant,
    f: &mut dyn FnMut(&mut FoldingContext, &Scalar) -> Option<Scalar>,
) -> Option<Constant> {
    let mut elements = Vec::with_capacity(arg.size());
    for element in arg.elements() {
        elements.push(f(ctx, element)?);
    }
    Constant::array(result_ty, arg.shape().to_vec(), elements).ok()
}

fn elemental_binary(
    ctx: &mut FoldingContext,
    result_ty: DynamicType,
    a: &Constant,
    b: &Constant,
    f: &mut dyn FnMut(&mut FoldingContext, &Scalar, &Scalar) -> Option<Scalar>,
) -> Option<Constant> {
    if a.rank() > 0 && b.rank() > 0 && a.shape() != b.shape() {
        ctx.messages_mut()
            .say_error("arguments in elemental intrinsic function are not conformable");
        return None;
    }
    let (shape, count) = if a.rank() > 0 {
        (a.shape().to_vec(), a.size())
    } else if b.rank() > 0 {
        (b.shape().to_vec(), b.size())
    } else {
        (Vec::new(), 1)
    };
    let mut elements = Vec::with_capacity(count);
    for i in 0..count {
        let x = if a.rank() > 0 {
            a.elements().get(i)?
        } else {
            a.scalar_value()?
        };
        let y = if b.rank() > 0 {
            b.elements().get(i)?
        } else {
            b.scalar_value()?
        };
        elements.push(f(ctx, x, y)?);
    }
    Constant::array(result_ty, shape, elements).ok()
}

fn elemental_ternary(
    ctx: &mut FoldingContext,
    result_ty: DynamicType,
    a: &Constant,
    b: &Constant,
    c: &Constant,
    f: &mut dyn FnMut(&mut FoldingContext, &Scalar, &Scalar, &Scalar) -> Option<Scalar>,
) -> Option<Constant> {
    let arrays: Vec<&Constant> = [a, b, c].into_iter().filter(|v| v.rank() > 0).collect();
    for window in arrays.windows(2) {
        if window[0].shape() != window[1].shape() {
            ctx.messages_mut()
                .say_error("arguments in elemental intrinsic function are not conformable");
            return None;
        }
    }
    let (shape, count) = match arrays.first() {
        Some(array) => (array.shape().to_vec(), array.size()),
        None => (Vec::new(), 1),
    };
    let mut elements = Vec::with_capacity(count);
    for i in 0..count {
        let pick = |v: &'_ Constant| -> Option<Scalar> {
            if v.rank() > 0 {
                v.elements().get(i).cloned()
            } else {
                v.scalar_value().cloned()
            }
        };
        let (x, y, z) = (pick(a)?, pick(b)?, pick(c)?);
        elements.push(f(ctx, &x, &y, &z)?);
    }
    Constant::array(result_ty, shape, elements).ok()
}

// ----- integer intrinsics -----

pub(crate) fn fold_integer_function_ref(
    ctx: &mut FoldingContext,
    mut fr: FunctionRef,
) -> IntegerExpr {
    fold_arguments(ctx, &mut fr);
    let kind = fr.ty.kind().unwrap_or(DEFAULT_INTEGER_KIND);
    let ty = DynamicType::Intrinsic {
        category: TypeCategory::Integer,
        kind,
    };
    let Some(name) = fr.proc.intrinsic_name().map(str::to_owned) else {
        return IntegerExpr::FunctionRef(Box::new(fr));
    };
    debug!(name = %name, kind, "folding integer intrinsic");
    match name.as_str() {
        "abs" => {
            if let Some(arg) = arg_constant(&fr, 0, "a") {
                if let Some(folded) = elemental_unary(ctx, ty, &arg, &mut |ctx, s| {
                    let value = s.as_integer()?;
                    let magnitude = value.abs();
                    if magnitude.overflow {
                        ctx.messages_mut().say_warning(format!(
                            "abs(integer(kind={})) folding overflowed",
                            kind
                        ));
                    }
                    Some(Scalar::Integer(magnitude.value))
                }) {
                    return IntegerExpr::Constant(folded);
                }
            }
        }
        "dim" => {
            if let (Some(x), Some(y)) = (arg_constant(&fr, 0, "x"), arg_constant(&fr, 1, "y")) {
                if let Some(folded) = elemental_binary(ctx, ty, &x, &y, &mut |_, a, b| {
                    Some(Scalar::Integer(a.as_integer()?.dim(b.as_integer()?).value))
                }) {
                    return IntegerExpr::Constant(folded);
                }
            }
        }
        "dshiftl" | "dshiftr" => {
            convert_boz_arg(&mut fr, 0, kind);
            convert_boz_arg(&mut fr, 1, kind);
            // The shift is bounded by BIT_SIZE; narrow it to kind 4.
            convert_int_arg(ctx, &mut fr, 2, 4);
            if let (Some(i), Some(j), Some(shift)) = (
                arg_constant(&fr, 0, "i"),
                arg_constant(&fr, 1, "j"),
                arg_constant(&fr, 2, "shift"),
            ) {
                let left = name == "dshiftl";
                if let Some(folded) =
                    elemental_ternary(ctx, ty, &i, &j, &shift, &mut |_, a, b, s| {
                        let (a, b) = (a.as_integer()?, b.as_integer()?);
                        let s = s.as_integer()?.to_i64()?;
                        Some(Scalar::Integer(if left {
                            a.dshiftl(b, s)
                        } else {
                            a.dshiftr(b, s)
                        }))
                    })
                {
                    return IntegerExpr::Constant(folded);
                }
            }
        }
        "exponent" => {
            if let Some(arg) = arg_constant(&fr, 0, "x") {
                if let Some(folded) = elemental_unary(ctx, ty, &arg, &mut |_, s| {
                    Some(Scalar::Integer(IntValue::wrapped(
                        kind,
                        s.as_real()?.exponent() as i128,
                    )))
                }) {
                    return IntegerExpr::Constant(folded);
                }
            }
        }
        "iand" | "ior" | "ieor" => {
            convert_boz_arg(&mut fr, 0, kind);
            convert_boz_arg(&mut fr, 1, kind);
            if let (Some(i), Some(j)) = (arg_constant(&fr, 0, "i"), arg_constant(&fr, 1, "j")) {
                if let Some(folded) = elemental_binary(ctx, ty, &i, &j, &mut |_, a, b| {
                    let (a, b) = (a.as_integer()?, b.as_integer()?);
                    Some(Scalar::Integer(match name.as_str() {
                        "iand" => a.iand(b),
                        "ior" => a.ior(b),
                        _ => a.ieor(b),
                    }))
                }) {
                    return IntegerExpr::Constant(folded);
                }
            }
        }
        "ibclr" | "ibset" | "ishft" | "shifta" | "shiftr" | "shiftl" => {
            // The position or count argument may be of any kind but is
            // bounded by BIT_SIZE; narrow it to kind 4.
            convert_int_arg(ctx, &mut fr, 1, 4);
            if let (Some(i), Some(pos)) = (arg_constant(&fr, 0, "i"), arg_constant(&fr, 1, "pos"))
            {
                if let Some(folded) = elemental_binary(ctx, ty, &i, &pos, &mut |_, a, p| {
                    let a = a.as_integer()?;
                    let p = p.as_integer()?.to_i64()?;
                    Some(Scalar::Integer(match name.as_str() {
                        "ibclr" => a.ibclr(p),
                        "ibset" => a.ibset(p),
                        "ishft" => a.ishft(p),
                        "shifta" => a.shifta(p),
                        "shiftr" => a.shiftr(p),
                        _ => a.shiftl(p),
                    }))
                }) {
                    return IntegerExpr::Constant(folded);
                }
            }
        }
        "int" => {
            if let Some(arg) = fr.argument(0, "a") {
                match arg {
                    Expr::Integer(e) => {
                        let e = e.clone();
                        return IntegerExpr::Convert(Box::new(Convert {
                            kind,
                            operand: NumericExpr::Integer(e),
                        }))
                        .fold(ctx);
                    }
                    Expr::Real(e) => {
                        let e = e.clone();
                        return IntegerExpr::Convert(Box::new(Convert {
                            kind,
                            operand: NumericExpr::Real(e),
                        }))
                        .fold(ctx);
                    }
                    Expr::BozLiteral(b) => {
                        return constant_int(IntValue::convert_unsigned(kind, b.bits).value);
                    }
                    _ => {
                        ctx.messages_mut()
                            .say_error("int() argument must be numeric");
                    }
                }
            }
        }
        "kind" => {
            if let Some(k) = fr
                .argument(0, "x")
                .and_then(Expr::ty)
                .and_then(|t| t.kind())
            {
                if let Ok(value) = IntegerExpr::literal(kind, k as i128) {
                    return value;
                }
            }
        }
        "leadz" | "trailz" | "popcnt" | "poppar" => {
            if let Some(arg) = arg_constant(&fr, 0, "i") {
                if let Some(folded) = elemental_unary(ctx, ty, &arg, &mut |_, s| {
                    let i = s.as_integer()?;
                    let count = match name.as_str() {
                        "leadz" => i.leadz(),
                        "trailz" => i.trailz(),
                        "popcnt" => i.popcnt(),
                        _ => i64::from(i.poppar()),
                    };
                    Some(Scalar::Integer(IntValue::wrapped(kind, count as i128)))
                }) {
                    return IntegerExpr::Constant(folded);
                }
            }
        }
        "len" => {
            if let Some(Expr::Character(string)) = fr.argument(0, "string") {
                if let Some(length) = string.len_expr() {
                    return IntegerExpr::Convert(Box::new(Convert {
                        kind,
                        operand: NumericExpr::Integer(length),
                    }))
                    .fold(ctx);
                }
            }
        }
        "maskl" | "maskr" => {
            // The count is bounded by BIT_SIZE; narrow it to kind 4.
            convert_int_arg(ctx, &mut fr, 0, 4);
            if let Some(places) = arg_constant(&fr, 0, "i") {
                let left = name == "maskl";
                if let Some(folded) = elemental_unary(ctx, ty, &places, &mut |_, s| {
                    let places = s.as_integer()?.to_i64()?;
                    Some(Scalar::Integer(if left {
                        IntValue::maskl(kind, places)
                    } else {
                        IntValue::maskr(kind, places)
                    }))
                }) {
                    return IntegerExpr::Constant(folded);
                }
            }
        }
        "merge_bits" => {
            for index in 0..=2 {
                convert_boz_arg(&mut fr, index, kind);
            }
            if let (Some(i), Some(j), Some(mask)) = (
                arg_constant(&fr, 0, "i"),
                arg_constant(&fr, 1, "j"),
                arg_constant(&fr, 2, "mask"),
            ) {
                if let Some(folded) =
                    elemental_ternary(ctx, ty, &i, &j, &mask, &mut |_, a, b, m| {
                        Some(Scalar::Integer(a.as_integer()?.merge_bits(
                            b.as_integer()?,
                            m.as_integer()?,
                        )))
                    })
                {
                    return IntegerExpr::Constant(folded);
                }
            }
        }
        "rank" => {
            if let Some(arg) = fr.argument(0, "a") {
                if let Ok(value) = IntegerExpr::literal(kind, arg.rank() as i128) {
                    return value;
                }
            }
        }
        "shape" => {
            if let Some(array) = fr.argument(0, "source").cloned() {
                if let Some(shape) = get_shape(ctx, &array) {
                    // Partial shapes stay unfolded.
                    if let Some(extents) = as_extent_array_expr(&shape) {
                        return IntegerExpr::Convert(Box::new(Convert {
                            kind,
                            operand: NumericExpr::Integer(extents),
                        }))
                        .fold(ctx);
                    }
                }
            }
        }
        "size" => {
            if let Some(array) = fr.argument(0, "array").cloned() {
                if let Some(shape) = get_shape(ctx, &array) {
                    if let Some(dim_expr) = fr.argument(1, "dim") {
                        if let Some(dim) = to_int64(dim_expr) {
                            let rank = shape.len() as i64;
                            if dim >= 1 && dim <= rank {
                                if let Some(extent) = shape[(dim - 1) as usize].clone() {
                                    return IntegerExpr::Convert(Box::new(Convert {
                                        kind,
                                        operand: NumericExpr::Integer(extent),
                                    }))
                                    .fold(ctx);
                                }
                            } else {
                                ctx.messages_mut().say_error(format!(
                                    "size(array,dim={}) dimension is out of range for rank-{} array",
                                    dim, rank
                                ));
                            }
                        }
                    } else if let Some(size) = get_size(ctx, &shape) {
                        // DIM= absent: PRODUCT(SHAPE())
                        return IntegerExpr::Convert(Box::new(Convert {
                            kind,
                            operand: NumericExpr::Integer(size),
                        }))
                        .fold(ctx);
                    }
                }
            }
        }
        _ => {}
    }
    IntegerExpr::FunctionRef(Box::new(fr))
}

// ----- real intrinsics -----

const HOST_REAL_UNARY: &[&str] = &[
    "acos",
    "acosh",
    "asin",
    "asinh",
    "atan",
    "atanh",
    "bessel_j0",
    "bessel_j1",
    "bessel_y0",
    "bessel_y1",
    "cos",
    "cosh",
    "erf",
    "erfc",
    "erfc_scaled",
    "exp",
    "gamma",
    "log",
    "log10",
    "log_gamma",
    "sin",
    "sinh",
    "sqrt",
    "tan",
    "tanh",
];

fn present_args(fr: &FunctionRef) -> usize {
    fr.args.iter().flatten().count()
}

pub(crate) fn fold_real_function_ref(ctx: &mut FoldingContext, mut fr: FunctionRef) -> RealExpr {
    fold_arguments(ctx, &mut fr);
    let kind = fr.ty.kind().unwrap_or(DEFAULT_REAL_KIND);
    let ty = DynamicType::Intrinsic {
        category: TypeCategory::Real,
        kind,
    };
    let Some(name) = fr.proc.intrinsic_name().map(str::to_owned) else {
        return RealExpr::FunctionRef(Box::new(fr));
    };
    debug!(name = %name, kind, "folding real intrinsic");
    if HOST_REAL_UNARY.contains(&name.as_str()) && present_args(&fr) == 1 {
        match ctx.host_library().and_then(|l| l.real_unary(&name)) {
            Some(f) => {
                if let Some(arg) = arg_constant(&fr, 0, "x") {
                    if let Some(folded) = elemental_unary(ctx, ty, &arg, &mut |_, s| {
                        let x = s.as_real()?;
                        Some(Scalar::Real(RealValue::new(kind, f(x.to_f64())).ok()?))
                    }) {
                        return RealExpr::Constant(folded);
                    }
                }
            }
            None => {
                ctx.messages_mut().say_info(format!(
                    "{}(real(kind={})) cannot be folded on host",
                    name, kind
                ));
            }
        }
        return RealExpr::FunctionRef(Box::new(fr));
    }
    match name.as_str() {
        "atan" | "atan2" | "hypot" | "mod" => {
            // Two-argument ATAN and ATAN2 share the host's atan2.
            let local_name = if name == "atan2" { "atan" } else { name.as_str() };
            match ctx.host_library().and_then(|l| l.real_binary(local_name)) {
                Some(f) => {
                    if let (Some(x), Some(y)) =
                        (arg_constant(&fr, 0, "x"), arg_constant(&fr, 1, "y"))
                    {
                        if let Some(folded) = elemental_binary(ctx, ty, &x, &y, &mut |_, a, b| {
                            Some(Scalar::Real(
                                RealValue::new(kind, f(a.as_real()?.to_f64(), b.as_real()?.to_f64()))
                                    .ok()?,
                            ))
                        }) {
                            return RealExpr::Constant(folded);
                        }
                    }
                }
                None => {
                    ctx.messages_mut().say_info(format!(
                        "{}(real(kind={}), real(kind{})) cannot be folded on host",
                        name, kind, kind
                    ));
                }
            }
        }
        "bessel_jn" | "bessel_yn" if present_args(&fr) == 2 => {
            // The order argument is an int on the host.
            convert_int_arg(ctx, &mut fr, 0, 4);
            match ctx.host_library().and_then(|l| l.real_int_real(&name)) {
                Some(f) => {
                    if let (Some(n), Some(x)) =
                        (arg_constant(&fr, 0, "n"), arg_constant(&fr, 1, "x"))
                    {
                        if let Some(folded) = elemental_binary(ctx, ty, &n, &x, &mut |_, a, b| {
                            let order = i32::try_from(a.as_integer()?.to_i64()?).ok()?;
                            Some(Scalar::Real(
                                RealValue::new(kind, f(order, b.as_real()?.to_f64())).ok()?,
                            ))
                        }) {
                            return RealExpr::Constant(folded);
                        }
                    }
                }
                None => {
                    ctx.messages_mut().say_info(format!(
                        "{}(integer(kind=4), real(kind={})) cannot be folded on host",
                        name, kind
                    ));
                }
            }
        }
        "abs" => match fr.argument(0, "a") {
            Some(Expr::Real(_)) => {
                if let Some(arg) = arg_constant(&fr, 0, "a") {
                    if let Some(folded) = elemental_unary(ctx, ty, &arg, &mut |_, s| {
                        Some(Scalar::Real(s.as_real()?.abs()))
                    }) {
                        return RealExpr::Constant(folded);
                    }
                }
            }
            Some(Expr::Complex(_)) => {
                match ctx.host_library().and_then(|l| l.real_from_complex("abs")) {
                    Some(f) => {
                        if let Some(arg) = arg_constant(&fr, 0, "a") {
                            if let Some(folded) = elemental_unary(ctx, ty, &arg, &mut |_, s| {
                                let z = s.as_complex()?;
                                Some(Scalar::Real(
                                    RealValue::new(
                                        kind,
                                        f(z.real_part().to_f64(), z.aimag().to_f64()),
                                    )
                                    .ok()?,
                                ))
                            }) {
                                return RealExpr::Constant(folded);
                            }
                        }
                    }
                    None => {
                        ctx.messages_mut().say_info(format!(
                            "abs(complex(kind={})) cannot be folded on host",
                            kind
                        ));
                    }
                }
            }
            _ => {}
        },
        "aimag" => {
            if let Some(arg) = arg_constant(&fr, 0, "z") {
                if let Some(folded) = elemental_unary(ctx, ty, &arg, &mut |_, s| {
                    Some(Scalar::Real(s.as_complex()?.aimag()))
                }) {
                    return RealExpr::Constant(folded);
                }
            }
        }
        "aint" => {
            // Convert the argument to the result kind before truncating.
            convert_real_arg(ctx, &mut fr, 0, kind);
            if let Some(arg) = arg_constant(&fr, 0, "a") {
                if let Some(folded) = elemental_unary(ctx, ty, &arg, &mut |ctx, s| {
                    let truncated = s.as_real()?.aint();
                    if truncated.flags.overflow {
                        ctx.messages_mut()
                            .say_warning(format!("{} intrinsic folding overflow", name));
                    }
                    Some(Scalar::Real(truncated.value))
                }) {
                    return RealExpr::Constant(folded);
                }
            }
        }
        "dprod" => {
            if let (Some(Expr::Real(x)), Some(Expr::Real(y))) =
                (fr.argument(0, "x"), fr.argument(1, "y"))
            {
                let left = RealExpr::Convert(Box::new(Convert {
                    kind,
                    operand: NumericExpr::Real(x.clone()),
                }));
                let right = RealExpr::Convert(Box::new(Convert {
                    kind,
                    operand: NumericExpr::Real(y.clone()),
                }));
                return RealExpr::Binary(Box::new(BinaryOperation {
                    kind,
                    op: NumericOp::Multiply,
                    left,
                    right,
                }))
                .fold(ctx);
            }
        }
        "epsilon" => {
            return constant_real(RealValue::epsilon(kind));
        }
        "real" => {
            if let Some(arg) = fr.argument(0, "a").cloned() {
                if let Some(folded) = to_real(ctx, kind, arg) {
                    return folded;
                }
            }
        }
        _ => {}
    }
    RealExpr::FunctionRef(Box::new(fr))
}

fn convert_real_arg(ctx: &mut FoldingContext, fr: &mut FunctionRef, index: usize, kind: u8) {
    if let Some(slot) = arg_value_mut(fr, index) {
        if let Expr::Real(e) = slot {
            if e.kind() != kind {
                let owned = std::mem::replace(e, RealExpr::Constant(Constant::scalar(
                    Scalar::Real(RealValue::zero(kind)),
                )));
                *e = RealExpr::Convert(Box::new(Convert {
                    kind,
                    operand: NumericExpr::Real(owned),
                }))
                .fold(ctx);
            }
        }
    }
}

/// Move integer, real, or BOZ bits into a real of the given kind.  BOZ
/// transfers are bit-level; truncating nonzero bits draws a warning.
pub(crate) fn to_real(ctx: &mut FoldingContext, kind: u8, expr: Expr) -> Option<RealExpr> {
    match expr {
        Expr::Integer(e) => Some(
            RealExpr::Convert(Box::new(Convert {
                kind,
                operand: NumericExpr::Integer(e),
            }))
            .fold(ctx),
        ),
        Expr::Real(e) => Some(
            RealExpr::Convert(Box::new(Convert {
                kind,
                operand: NumericExpr::Real(e),
            }))
            .fold(ctx),
        ),
        Expr::BozLiteral(b) => {
            let value = RealValue::from_raw_bits(kind, b.bits);
            if value.to_raw_bits() != b.bits {
                ctx.messages_mut().say_warning(
                    "Nonzero bits truncated from BOZ literal constant in REAL intrinsic",
                );
            }
            Some(constant_real(value))
        }
        _ => None,
    }
}

// ----- complex intrinsics -----

const HOST_COMPLEX_UNARY: &[&str] = &[
    "acos", "acosh", "asin", "asinh", "atan", "atanh", "cos", "cosh", "exp", "log", "sin", "sinh",
    "sqrt", "tan", "tanh",
];

pub(crate) fn fold_complex_function_ref(
    ctx: &mut FoldingContext,
    mut fr: FunctionRef,
) -> ComplexExpr {
    fold_arguments(ctx, &mut fr);
    let kind = fr.ty.kind().unwrap_or(DEFAULT_REAL_KIND);
    let ty = DynamicType::Intrinsic {
        category: TypeCategory::Complex,
        kind,
    };
    let Some(name) = fr.proc.intrinsic_name().map(str::to_owned) else {
        return ComplexExpr::FunctionRef(Box::new(fr));
    };
    debug!(name = %name, kind, "folding complex intrinsic");
    if HOST_COMPLEX_UNARY.contains(&name.as_str()) {
        match ctx.host_library().and_then(|l| l.complex_unary(&name)) {
            Some(f) => {
                if let Some(arg) = arg_constant(&fr, 0, "x") {
                    if let Some(folded) = elemental_unary(ctx, ty, &arg, &mut |_, s| {
                        let z = s.as_complex()?;
                        let (re, im) = f(z.real_part().to_f64(), z.aimag().to_f64());
                        Some(Scalar::Complex(feval_core::value::ComplexValue::from_parts(
                            RealValue::new(kind, re).ok()?,
                            RealValue::new(kind, im).ok()?,
                        )))
                    }) {
                        return ComplexExpr::Constant(folded);
                    }
                }
            }
            None => {
                ctx.messages_mut().say_info(format!(
                    "{}(complex(kind={})) cannot be folded on host",
                    name, kind
                ));
            }
        }
        return ComplexExpr::FunctionRef(Box::new(fr));
    }
    match name.as_str() {
        "conjg" => {
            if let Some(arg) = arg_constant(&fr, 0, "z") {
                if let Some(folded) = elemental_unary(ctx, ty, &arg, &mut |_, s| {
                    Some(Scalar::Complex(s.as_complex()?.conjg()))
                }) {
                    return ComplexExpr::Constant(folded);
                }
            }
        }
        "cmplx" => {
            if present_args(&fr) <= 2 {
                // cmplx(x [, kind]) with a complex X: piecewise conversion.
                if let Some(Expr::Complex(z)) = fr.argument(0, "x") {
                    let z = z.clone();
                    let re = RealExpr::Convert(Box::new(Convert {
                        kind,
                        operand: NumericExpr::Real(RealExpr::complex_component(false, z.clone())),
                    }));
                    let im = RealExpr::Convert(Box::new(Convert {
                        kind,
                        operand: NumericExpr::Real(RealExpr::complex_component(true, z)),
                    }));
                    return ComplexExpr::Construct(Box::new(ComplexConstructorOp {
                        kind,
                        re,
                        im,
                    }))
                    .fold(ctx);
                }
            }
            // cmplx(x [, y, kind]): real and imaginary parts, Y defaulting
            // to zero.
            if let Some(re_arg) = fr.argument(0, "x").cloned() {
                let im_arg = fr.argument(1, "y").cloned();
                let re = to_real(ctx, kind, re_arg);
                let im = match im_arg {
                    Some(expr) => to_real(ctx, kind, expr),
                    None => Some(constant_real(RealValue::zero(kind))),
                };
                if let (Some(re), Some(im)) = (re, im) {
                    return ComplexExpr::Construct(Box::new(ComplexConstructorOp {
                        kind,
                        re,
                        im,
                    }))
                    .fold(ctx);
                }
            }
        }
        _ => {}
    }
    ComplexExpr::FunctionRef(Box::new(fr))
}

// ----- logical intrinsics -----

pub(crate) fn fold_logical_function_ref(
    ctx: &mut FoldingContext,
    mut fr: FunctionRef,
) -> LogicalExpr {
    fold_arguments(ctx, &mut fr);
    let kind = fr.ty.kind().unwrap_or(DEFAULT_LOGICAL_KIND);
    let ty = DynamicType::Intrinsic {
        category: TypeCategory::Logical,
        kind,
    };
    let Some(name) = fr.proc.intrinsic_name().map(str::to_owned) else {
        return LogicalExpr::FunctionRef(Box::new(fr));
    };
    debug!(name = %name, kind, "folding logical intrinsic");
    match name.as_str() {
        "bge" | "bgt" | "ble" | "blt" => {
            // Operands need not share a kind; compare in the widest one.
            widen_bit_compare_arg(ctx, &mut fr, 0);
            widen_bit_compare_arg(ctx, &mut fr, 1);
            if let (Some(i), Some(j)) = (arg_constant(&fr, 0, "i"), arg_constant(&fr, 1, "j")) {
                if let Some(folded) = elemental_binary(ctx, ty, &i, &j, &mut |_, a, b| {
                    let (a, b) = (a.as_integer()?, b.as_integer()?);
                    let satisfied = match name.as_str() {
                        "bge" => a.bge(b),
                        "bgt" => a.bgt(b),
                        "ble" => a.ble(b),
                        _ => a.blt(b),
                    };
                    Some(Scalar::Logical(LogicalValue::new(kind, satisfied).ok()?))
                }) {
                    return LogicalExpr::Constant(folded);
                }
            }
        }
        _ => {}
    }
    LogicalExpr::FunctionRef(Box::new(fr))
}

// ----- character intrinsics -----

/// Character intrinsic folding is not yet implemented; arguments are still
/// folded so later passes see reduced subtrees.
pub(crate) fn fold_character_function_ref(
    ctx: &mut FoldingContext,
    mut fr: FunctionRef,
) -> CharacterExpr {
    fold_arguments(ctx, &mut fr);
    CharacterExpr::FunctionRef(Box::new(fr))
}
