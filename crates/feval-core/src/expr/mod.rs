//! Typed Fortran expression trees.
//!
//! Expressions are the sole owners of their constituents: there is no
//! sharing of common subexpressions, so these are trees, not DAGs.  Deep
//! copy and move construction are both supported, and equality is
//! structural.
//!
//! One enum represents each intrinsic type category, with the kind carried
//! as data on every operation node.  Constructors verify the standard's
//! operand rules; the folder assumes trees are well formed and never
//! re-checks them.

mod call;
mod constructor;
mod display;
mod variable;

pub use call::*;
pub use constructor::*;
pub use variable::*;

use crate::constant::{Constant, Scalar};
use crate::error::{Error, Result};
use crate::types::{
    DynamicType, Ordering, RelationalOperator, TypeCategory, LOGICAL_RESULT_KIND,
    SUBSCRIPT_INTEGER_KIND,
};
use crate::value::IntValue;
use crate::{common_enum, common_struct};

pub const DEFAULT_INTEGER_KIND: u8 = 4;
pub const DEFAULT_REAL_KIND: u8 = 4;
pub const DEFAULT_CHARACTER_KIND: u8 = 1;
pub const DEFAULT_LOGICAL_KIND: u8 = 4;

common_enum! {
    #[derive(Copy, Hash)]
    pub enum NumericOp {
        Add,
        Subtract,
        Multiply,
        Divide,
        Power,
    }
}

impl NumericOp {
    pub fn infix(self) -> &'static str {
        match self {
            NumericOp::Add => "+",
            NumericOp::Subtract => "-",
            NumericOp::Multiply => "*",
            NumericOp::Divide => "/",
            NumericOp::Power => "**",
        }
    }
}

common_enum! {
    #[derive(Copy, Hash)]
    pub enum LogicalOperator {
        And,
        Or,
        Eqv,
        Neqv,
    }
}

impl LogicalOperator {
    pub fn infix(self) -> &'static str {
        match self {
            LogicalOperator::And => ".AND.",
            LogicalOperator::Or => ".OR.",
            LogicalOperator::Eqv => ".EQV.",
            LogicalOperator::Neqv => ".NEQV.",
        }
    }
}

// ----- shared operation node shapes -----

common_struct! {
    /// Parentheses are never elided, even around constants; they inhibit
    /// reassociation.
    pub struct Parenthesized<E> {
        pub kind: u8,
        pub operand: E,
    }
}

common_struct! {
    pub struct Negated<E> {
        pub kind: u8,
        pub operand: E,
    }
}

common_struct! {
    pub struct BinaryOperation<E> {
        pub kind: u8,
        pub op: NumericOp,
        pub left: E,
        pub right: E,
    }
}

common_struct! {
    /// MAX/MIN.  `Ordering::Greater` selects the greater operand (MAX).
    pub struct ExtremumOperation<E> {
        pub kind: u8,
        pub ordering: Ordering,
        pub left: E,
        pub right: E,
    }
}

common_struct! {
    /// Kind/category conversion producing kind `kind` of the target
    /// category.
    pub struct Convert<E> {
        pub kind: u8,
        pub operand: E,
    }
}

common_enum! {
    /// The operand of a numeric conversion: an integer or real expression
    /// of any kind.
    pub enum NumericExpr {
        Integer(IntegerExpr),
        Real(RealExpr),
    }
}

impl NumericExpr {
    pub fn rank(&self) -> usize {
        match self {
            NumericExpr::Integer(e) => e.rank(),
            NumericExpr::Real(e) => e.rank(),
        }
    }

    pub fn kind(&self) -> u8 {
        match self {
            NumericExpr::Integer(e) => e.kind(),
            NumericExpr::Real(e) => e.kind(),
        }
    }
}

common_struct! {
    /// %RE / %IM access on a complex operand of the same kind.
    pub struct ComplexComponentOp {
        pub kind: u8,
        pub imaginary: bool,
        pub operand: ComplexExpr,
    }
}

common_struct! {
    /// Base ** integer-exponent, with the numeric contract of repeated
    /// squaring.
    pub struct RealToIntPowerOp<E> {
        pub kind: u8,
        pub base: E,
        pub exponent: IntegerExpr,
    }
}

common_struct! {
    /// `(re, im)` complex construction from two same-kind reals.
    pub struct ComplexConstructorOp {
        pub kind: u8,
        pub re: RealExpr,
        pub im: RealExpr,
    }
}

common_struct! {
    pub struct ConcatOp {
        pub kind: u8,
        pub left: CharacterExpr,
        pub right: CharacterExpr,
    }
}

common_struct! {
    /// Adjusts a character value to exactly the requested length by
    /// truncation or blank padding.
    pub struct SetLengthOp {
        pub kind: u8,
        pub string: CharacterExpr,
        pub length: IntegerExpr,
    }
}

common_struct! {
    pub struct NotOp {
        pub kind: u8,
        pub operand: LogicalExpr,
    }
}

common_struct! {
    pub struct LogicalBinaryOp {
        pub kind: u8,
        pub op: LogicalOperator,
        pub left: LogicalExpr,
        pub right: LogicalExpr,
    }
}

common_struct! {
    pub struct RelationalOperation<E> {
        pub op: RelationalOperator,
        pub left: E,
        pub right: E,
    }
}

common_enum! {
    /// A comparison between same-category, same-kind operands, always
    /// producing LOGICAL(1).  There are no relations between LOGICAL
    /// values, and COMPLEX data are compared piecewise.
    pub enum Relational {
        Integer(Box<RelationalOperation<IntegerExpr>>),
        Real(Box<RelationalOperation<RealExpr>>),
        Character(Box<RelationalOperation<CharacterExpr>>),
    }
}

impl Relational {
    pub fn rank(&self) -> usize {
        match self {
            Relational::Integer(r) => r.left.rank().max(r.right.rank()),
            Relational::Real(r) => r.left.rank().max(r.right.rank()),
            Relational::Character(r) => r.left.rank().max(r.right.rank()),
        }
    }
}

common_struct! {
    /// A bare reference to an implied-DO index.  Only meaningful while the
    /// enclosing implied-DO is being unrolled; kind is SubscriptInteger.
    pub struct ImpliedDoIndex {
        pub name: String,
    }
}

common_struct! {
    /// An inquiry into a kind or length parameter of a derived type,
    /// `designator%param` or a bare `param` inside a PDT scope.
    pub struct TypeParamInquiry {
        pub base: Option<Component>,
        pub parameter: String,
        pub attr: crate::types::TypeParamAttr,
        pub kind: u8,
    }
}

// ----- category expression enums -----

common_enum! {
    pub enum IntegerExpr {
        Constant(Constant),
        Designator(Box<Designator>),
        FunctionRef(Box<FunctionRef>),
        ArrayConstructor(Box<ArrayConstructor<IntegerExpr>>),
        TypeParamInquiry(Box<TypeParamInquiry>),
        ImpliedDoIndex(ImpliedDoIndex),
        Parentheses(Box<Parenthesized<IntegerExpr>>),
        Negate(Box<Negated<IntegerExpr>>),
        Convert(Box<Convert<NumericExpr>>),
        Binary(Box<BinaryOperation<IntegerExpr>>),
        Extremum(Box<ExtremumOperation<IntegerExpr>>),
    }
}

common_enum! {
    pub enum RealExpr {
        Constant(Constant),
        Designator(Box<Designator>),
        FunctionRef(Box<FunctionRef>),
        ArrayConstructor(Box<ArrayConstructor<RealExpr>>),
        Parentheses(Box<Parenthesized<RealExpr>>),
        Negate(Box<Negated<RealExpr>>),
        Convert(Box<Convert<NumericExpr>>),
        ComplexComponent(Box<ComplexComponentOp>),
        Binary(Box<BinaryOperation<RealExpr>>),
        RealToIntPower(Box<RealToIntPowerOp<RealExpr>>),
        Extremum(Box<ExtremumOperation<RealExpr>>),
    }
}

common_enum! {
    /// Note that complex negation, addition, and subtraction are
    /// represented piecewise over the real components by earlier phases.
    pub enum ComplexExpr {
        Constant(Constant),
        Designator(Box<Designator>),
        FunctionRef(Box<FunctionRef>),
        ArrayConstructor(Box<ArrayConstructor<ComplexExpr>>),
        Parentheses(Box<Parenthesized<ComplexExpr>>),
        Construct(Box<ComplexConstructorOp>),
        Binary(Box<BinaryOperation<ComplexExpr>>),
        RealToIntPower(Box<RealToIntPowerOp<ComplexExpr>>),
    }
}

common_enum! {
    pub enum CharacterExpr {
        Constant(Constant),
        Designator(Box<Designator>),
        FunctionRef(Box<FunctionRef>),
        ArrayConstructor(Box<ArrayConstructor<CharacterExpr>>),
        Parentheses(Box<Parenthesized<CharacterExpr>>),
        Convert(Box<Convert<CharacterExpr>>),
        Concat(Box<ConcatOp>),
        SetLength(Box<SetLengthOp>),
        Extremum(Box<ExtremumOperation<CharacterExpr>>),
    }
}

common_enum! {
    pub enum LogicalExpr {
        Constant(Constant),
        Designator(Box<Designator>),
        FunctionRef(Box<FunctionRef>),
        ArrayConstructor(Box<ArrayConstructor<LogicalExpr>>),
        Parentheses(Box<Parenthesized<LogicalExpr>>),
        Convert(Box<Convert<LogicalExpr>>),
        Not(Box<NotOp>),
        Binary(Box<LogicalBinaryOp>),
        /// Only logical kind 1 expressions may hold relations; enforced by
        /// [`LogicalExpr::relational`].
        Relational(Box<Relational>),
    }
}

common_enum! {
    pub enum DerivedExpr {
        Constant(Constant),
        ArrayConstructor(Box<ArrayConstructor<DerivedExpr>>),
        StructureConstructor(Box<StructureConstructor>),
        Designator(Box<Designator>),
        FunctionRef(Box<FunctionRef>),
    }
}

common_struct! {
    /// A binary/octal/hex literal: an as-yet typeless bag of bits wide
    /// enough for any supported numeric kind.
    #[derive(Copy, Hash)]
    pub struct BozLiteral {
        pub bits: u128,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct NullPointer;

common_enum! {
    /// A completely generic expression, polymorphic across the intrinsic
    /// categories, derived types, and the typeless alternatives.
    pub enum Expr {
        Integer(IntegerExpr),
        Real(RealExpr),
        Complex(ComplexExpr),
        Character(CharacterExpr),
        Logical(LogicalExpr),
        Derived(DerivedExpr),
        BozLiteral(BozLiteral),
        NullPointer(NullPointer),
        ProcedureDesignator(ProcedureDesignator),
        ProcedureRef(Box<ProcedureRef>),
    }
}

// ----- per-category accessors and checked constructors -----

macro_rules! same_kind {
    ($left:expr, $right:expr, $what:literal) => {{
        let kind = $left.kind();
        if $right.kind() != kind {
            return Err(Error::OperandMismatch(format!(
                concat!($what, " operands have kinds {} and {}"),
                kind,
                $right.kind()
            )));
        }
        kind
    }};
}

impl IntegerExpr {
    pub fn literal(kind: u8, value: i128) -> Result<Self> {
        Ok(IntegerExpr::Constant(Constant::scalar(Scalar::Integer(
            IntValue::new(kind, value)?,
        ))))
    }

    /// A SubscriptInteger (kind 8) literal; bounds, extents, and lengths.
    pub fn subscript(value: i64) -> Self {
        IntegerExpr::Constant(Constant::scalar(Scalar::Integer(IntValue::wrapped(
            SUBSCRIPT_INTEGER_KIND,
            value as i128,
        ))))
    }

    pub fn from_constant(constant: Constant) -> Result<Self> {
        if constant.category() != Some(TypeCategory::Integer) {
            return Err(Error::OperandMismatch(format!(
                "expected an Integer constant, got {}",
                constant.ty()
            )));
        }
        Ok(IntegerExpr::Constant(constant))
    }

    pub fn parenthesize(operand: Self) -> Self {
        let kind = operand.kind();
        IntegerExpr::Parentheses(Box::new(Parenthesized { kind, operand }))
    }

    pub fn negated(operand: Self) -> Self {
        let kind = operand.kind();
        IntegerExpr::Negate(Box::new(Negated { kind, operand }))
    }

    pub fn binary(op: NumericOp, left: Self, right: Self) -> Result<Self> {
        let kind = same_kind!(left, right, "integer binary");
        Ok(IntegerExpr::Binary(Box::new(BinaryOperation {
            kind,
            op,
            left,
            right,
        })))
    }

    pub fn extremum(ordering: Ordering, left: Self, right: Self) -> Result<Self> {
        let kind = same_kind!(left, right, "integer extremum");
        Ok(IntegerExpr::Extremum(Box::new(ExtremumOperation {
            kind,
            ordering,
            left,
            right,
        })))
    }

    pub fn convert(kind: u8, operand: NumericExpr) -> Result<Self> {
        DynamicType::integer(kind)?;
        Ok(IntegerExpr::Convert(Box::new(Convert { kind, operand })))
    }

    pub fn kind(&self) -> u8 {
        match self {
            IntegerExpr::Constant(c) => c.kind().unwrap_or(DEFAULT_INTEGER_KIND),
            IntegerExpr::Designator(d) => d.ty().kind().unwrap_or(DEFAULT_INTEGER_KIND),
            IntegerExpr::FunctionRef(f) => f.ty.kind().unwrap_or(DEFAULT_INTEGER_KIND),
            IntegerExpr::ArrayConstructor(a) => a.ty.kind().unwrap_or(DEFAULT_INTEGER_KIND),
            IntegerExpr::TypeParamInquiry(t) => t.kind,
            IntegerExpr::ImpliedDoIndex(_) => SUBSCRIPT_INTEGER_KIND,
            IntegerExpr::Parentheses(p) => p.kind,
            IntegerExpr::Negate(n) => n.kind,
            IntegerExpr::Convert(c) => c.kind,
            IntegerExpr::Binary(b) => b.kind,
            IntegerExpr::Extremum(e) => e.kind,
        }
    }

    pub fn ty(&self) -> DynamicType {
        DynamicType::Intrinsic {
            category: TypeCategory::Integer,
            kind: self.kind(),
        }
    }

    pub fn rank(&self) -> usize {
        match self {
            IntegerExpr::Constant(c) => c.rank(),
            IntegerExpr::Designator(d) => d.rank(),
            IntegerExpr::FunctionRef(_) => 0,
            IntegerExpr::ArrayConstructor(_) => 1,
            IntegerExpr::TypeParamInquiry(_) => 0,
            IntegerExpr::ImpliedDoIndex(_) => 0,
            IntegerExpr::Parentheses(p) => p.operand.rank(),
            IntegerExpr::Negate(n) => n.operand.rank(),
            IntegerExpr::Convert(c) => c.operand.rank(),
            IntegerExpr::Binary(b) => b.left.rank().max(b.right.rank()),
            IntegerExpr::Extremum(e) => e.left.rank().max(e.right.rank()),
        }
    }
}

impl RealExpr {
    pub fn literal(kind: u8, value: f64) -> Result<Self> {
        Ok(RealExpr::Constant(Constant::scalar(Scalar::Real(
            crate::value::RealValue::new(kind, value)?,
        ))))
    }

    pub fn from_constant(constant: Constant) -> Result<Self> {
        if constant.category() != Some(TypeCategory::Real) {
            return Err(Error::OperandMismatch(format!(
                "expected a Real constant, got {}",
                constant.ty()
            )));
        }
        Ok(RealExpr::Constant(constant))
    }

    pub fn parenthesize(operand: Self) -> Self {
        let kind = operand.kind();
        RealExpr::Parentheses(Box::new(Parenthesized { kind, operand }))
    }

    pub fn negated(operand: Self) -> Self {
        let kind = operand.kind();
        RealExpr::Negate(Box::new(Negated { kind, operand }))
    }

    pub fn binary(op: NumericOp, left: Self, right: Self) -> Result<Self> {
        let kind = same_kind!(left, right, "real binary");
        Ok(RealExpr::Binary(Box::new(BinaryOperation {
            kind,
            op,
            left,
            right,
        })))
    }

    pub fn extremum(ordering: Ordering, left: Self, right: Self) -> Result<Self> {
        let kind = same_kind!(left, right, "real extremum");
        Ok(RealExpr::Extremum(Box::new(ExtremumOperation {
            kind,
            ordering,
            left,
            right,
        })))
    }

    pub fn convert(kind: u8, operand: NumericExpr) -> Result<Self> {
        DynamicType::real(kind)?;
        Ok(RealExpr::Convert(Box::new(Convert { kind, operand })))
    }

    pub fn complex_component(imaginary: bool, operand: ComplexExpr) -> Self {
        let kind = operand.kind();
        RealExpr::ComplexComponent(Box::new(ComplexComponentOp {
            kind,
            imaginary,
            operand,
        }))
    }

    pub fn real_to_int_power(base: Self, exponent: IntegerExpr) -> Self {
        let kind = base.kind();
        RealExpr::RealToIntPower(Box::new(RealToIntPowerOp {
            kind,
            base,
            exponent,
        }))
    }

    pub fn kind(&self) -> u8 {
        match self {
            RealExpr::Constant(c) => c.kind().unwrap_or(DEFAULT_REAL_KIND),
            RealExpr::Designator(d) => d.ty().kind().unwrap_or(DEFAULT_REAL_KIND),
            RealExpr::FunctionRef(f) => f.ty.kind().unwrap_or(DEFAULT_REAL_KIND),
            RealExpr::ArrayConstructor(a) => a.ty.kind().unwrap_or(DEFAULT_REAL_KIND),
            RealExpr::Parentheses(p) => p.kind,
            RealExpr::Negate(n) => n.kind,
            RealExpr::Convert(c) => c.kind,
            RealExpr::ComplexComponent(c) => c.kind,
            RealExpr::Binary(b) => b.kind,
            RealExpr::RealToIntPower(p) => p.kind,
            RealExpr::Extremum(e) => e.kind,
        }
    }

    pub fn ty(&self) -> DynamicType {
        DynamicType::Intrinsic {
            category: TypeCategory::Real,
            kind: self.kind(),
        }
    }

    pub fn rank(&self) -> usize {
        match self {
            RealExpr::Constant(c) => c.rank(),
            RealExpr::Designator(d) => d.rank(),
            RealExpr::FunctionRef(_) => 0,
            RealExpr::ArrayConstructor(_) => 1,
            RealExpr::Parentheses(p) => p.operand.rank(),
            RealExpr::Negate(n) => n.operand.rank(),
            RealExpr::Convert(c) => c.operand.rank(),
            RealExpr::ComplexComponent(c) => c.operand.rank(),
            RealExpr::Binary(b) => b.left.rank().max(b.right.rank()),
            RealExpr::RealToIntPower(p) => p.base.rank().max(p.exponent.rank()),
            RealExpr::Extremum(e) => e.left.rank().max(e.right.rank()),
        }
    }
}

impl ComplexExpr {
    pub fn from_constant(constant: Constant) -> Result<Self> {
        if constant.category() != Some(TypeCategory::Complex) {
            return Err(Error::OperandMismatch(format!(
                "expected a Complex constant, got {}",
                constant.ty()
            )));
        }
        Ok(ComplexExpr::Constant(constant))
    }

    pub fn parenthesize(operand: Self) -> Self {
        let kind = operand.kind();
        ComplexExpr::Parentheses(Box::new(Parenthesized { kind, operand }))
    }

    pub fn construct(re: RealExpr, im: RealExpr) -> Result<Self> {
        let kind = same_kind!(re, im, "complex constructor");
        Ok(ComplexExpr::Construct(Box::new(ComplexConstructorOp {
            kind,
            re,
            im,
        })))
    }

    /// Complex binaries are multiply, divide, and power only; addition and
    /// subtraction are represented piecewise over the parts.
    pub fn binary(op: NumericOp, left: Self, right: Self) -> Result<Self> {
        if matches!(op, NumericOp::Add | NumericOp::Subtract) {
            return Err(Error::OperandMismatch(
                "complex addition is represented piecewise over real parts".into(),
            ));
        }
        let kind = same_kind!(left, right, "complex binary");
        Ok(ComplexExpr::Binary(Box::new(BinaryOperation {
            kind,
            op,
            left,
            right,
        })))
    }

    pub fn real_to_int_power(base: Self, exponent: IntegerExpr) -> Self {
        let kind = base.kind();
        ComplexExpr::RealToIntPower(Box::new(RealToIntPowerOp {
            kind,
            base,
            exponent,
        }))
    }

    pub fn kind(&self) -> u8 {
        match self {
            ComplexExpr::Constant(c) => c.kind().unwrap_or(DEFAULT_REAL_KIND),
            ComplexExpr::Designator(d) => d.ty().kind().unwrap_or(DEFAULT_REAL_KIND),
            ComplexExpr::FunctionRef(f) => f.ty.kind().unwrap_or(DEFAULT_REAL_KIND),
            ComplexExpr::ArrayConstructor(a) => a.ty.kind().unwrap_or(DEFAULT_REAL_KIND),
            ComplexExpr::Parentheses(p) => p.kind,
            ComplexExpr::Construct(c) => c.kind,
            ComplexExpr::Binary(b) => b.kind,
            ComplexExpr::RealToIntPower(p) => p.kind,
        }
    }

    pub fn ty(&self) -> DynamicType {
        DynamicType::Intrinsic {
            category: TypeCategory::Complex,
            kind: self.kind(),
        }
    }

    pub fn rank(&self) -> usize {
        match self {
            ComplexExpr::Constant(c) => c.rank(),
            ComplexExpr::Designator(d) => d.rank(),
            ComplexExpr::FunctionRef(_) => 0,
            ComplexExpr::ArrayConstructor(_) => 1,
            ComplexExpr::Parentheses(p) => p.operand.rank(),
            ComplexExpr::Construct(c) => c.re.rank().max(c.im.rank()),
            ComplexExpr::Binary(b) => b.left.rank().max(b.right.rank()),
            ComplexExpr::RealToIntPower(p) => p.base.rank().max(p.exponent.rank()),
        }
    }
}

impl CharacterExpr {
    pub fn literal(kind: u8, value: &str) -> Result<Self> {
        Ok(CharacterExpr::Constant(Constant::scalar(Scalar::Character(
            crate::value::CharValue::from_str(kind, value)?,
        ))))
    }

    pub fn from_constant(constant: Constant) -> Result<Self> {
        if constant.category() != Some(TypeCategory::Character) {
            return Err(Error::OperandMismatch(format!(
                "expected a Character constant, got {}",
                constant.ty()
            )));
        }
        Ok(CharacterExpr::Constant(constant))
    }

    pub fn parenthesize(operand: Self) -> Self {
        let kind = operand.kind();
        CharacterExpr::Parentheses(Box::new(Parenthesized { kind, operand }))
    }

    pub fn concat(left: Self, right: Self) -> Result<Self> {
        let kind = same_kind!(left, right, "character concatenation");
        Ok(CharacterExpr::Concat(Box::new(ConcatOp {
            kind,
            left,
            right,
        })))
    }

    pub fn set_length(string: Self, length: IntegerExpr) -> Self {
        let kind = string.kind();
        CharacterExpr::SetLength(Box::new(SetLengthOp {
            kind,
            string,
            length,
        }))
    }

    pub fn convert(kind: u8, operand: Self) -> Result<Self> {
        DynamicType::character(kind)?;
        Ok(CharacterExpr::Convert(Box::new(Convert { kind, operand })))
    }

    pub fn extremum(ordering: Ordering, left: Self, right: Self) -> Result<Self> {
        let kind = same_kind!(left, right, "character extremum");
        Ok(CharacterExpr::Extremum(Box::new(ExtremumOperation {
            kind,
            ordering,
            left,
            right,
        })))
    }

    pub fn kind(&self) -> u8 {
        match self {
            CharacterExpr::Constant(c) => c.kind().unwrap_or(DEFAULT_CHARACTER_KIND),
            CharacterExpr::Designator(d) => d.ty().kind().unwrap_or(DEFAULT_CHARACTER_KIND),
            CharacterExpr::FunctionRef(f) => f.ty.kind().unwrap_or(DEFAULT_CHARACTER_KIND),
            CharacterExpr::ArrayConstructor(a) => a.ty.kind().unwrap_or(DEFAULT_CHARACTER_KIND),
            CharacterExpr::Parentheses(p) => p.kind,
            CharacterExpr::Convert(c) => c.kind,
            CharacterExpr::Concat(c) => c.kind,
            CharacterExpr::SetLength(s) => s.kind,
            CharacterExpr::Extremum(e) => e.kind,
        }
    }

    pub fn ty(&self) -> DynamicType {
        DynamicType::Intrinsic {
            category: TypeCategory::Character,
            kind: self.kind(),
        }
    }

    pub fn rank(&self) -> usize {
        match self {
            CharacterExpr::Constant(c) => c.rank(),
            CharacterExpr::Designator(d) => d.rank(),
            CharacterExpr::FunctionRef(_) => 0,
            CharacterExpr::ArrayConstructor(_) => 1,
            CharacterExpr::Parentheses(p) => p.operand.rank(),
            CharacterExpr::Convert(c) => c.operand.rank(),
            CharacterExpr::Concat(c) => c.left.rank().max(c.right.rank()),
            CharacterExpr::SetLength(s) => s.string.rank(),
            CharacterExpr::Extremum(e) => e.left.rank().max(e.right.rank()),
        }
    }

    /// A SubscriptInteger expression for the value's length, when one can
    /// be synthesized from the tree.
    pub fn len_expr(&self) -> Option<IntegerExpr> {
        match self {
            CharacterExpr::Constant(c) => c.len().map(IntegerExpr::subscript),
            CharacterExpr::Designator(d) => d
                .last_symbol()
                .and_then(|s| s.char_length)
                .map(IntegerExpr::subscript),
            CharacterExpr::FunctionRef(_) => None,
            CharacterExpr::ArrayConstructor(a) => a.length.as_deref().cloned(),
            CharacterExpr::Parentheses(p) => p.operand.len_expr(),
            CharacterExpr::Convert(c) => c.operand.len_expr(),
            CharacterExpr::Concat(c) => {
                let left = c.left.len_expr()?;
                let right = c.right.len_expr()?;
                IntegerExpr::binary(NumericOp::Add, left, right).ok()
            }
            CharacterExpr::SetLength(s) => Some(s.length.clone()),
            CharacterExpr::Extremum(e) => {
                let left = e.left.len_expr()?;
                let right = e.right.len_expr()?;
                IntegerExpr::extremum(Ordering::Greater, left, right).ok()
            }
        }
    }
}

impl LogicalExpr {
    pub fn literal(kind: u8, value: bool) -> Result<Self> {
        Ok(LogicalExpr::Constant(Constant::scalar(Scalar::Logical(
            crate::value::LogicalValue::new(kind, value)?,
        ))))
    }

    /// A LOGICAL(1) constant, the type of relational results.
    pub fn result(value: bool) -> Self {
        LogicalExpr::Constant(Constant::scalar(Scalar::Logical(
            crate::value::LogicalValue::result(value),
        )))
    }

    pub fn from_constant(constant: Constant) -> Result<Self> {
        if constant.category() != Some(TypeCategory::Logical) {
            return Err(Error::OperandMismatch(format!(
                "expected a Logical constant, got {}",
                constant.ty()
            )));
        }
        Ok(LogicalExpr::Constant(constant))
    }

    pub fn parenthesize(operand: Self) -> Self {
        let kind = operand.kind();
        LogicalExpr::Parentheses(Box::new(Parenthesized { kind, operand }))
    }

    pub fn not(operand: Self) -> Self {
        let kind = operand.kind();
        LogicalExpr::Not(Box::new(NotOp { kind, operand }))
    }

    pub fn binary(op: LogicalOperator, left: Self, right: Self) -> Result<Self> {
        let kind = same_kind!(left, right, "logical operation");
        Ok(LogicalExpr::Binary(Box::new(LogicalBinaryOp {
            kind,
            op,
            left,
            right,
        })))
    }

    pub fn convert(kind: u8, operand: Self) -> Result<Self> {
        DynamicType::logical(kind)?;
        Ok(LogicalExpr::Convert(Box::new(Convert { kind, operand })))
    }

    /// Relations always produce LOGICAL(1); the variant exists only there.
    pub fn relational(relation: Relational) -> Self {
        LogicalExpr::Relational(Box::new(relation))
    }

    pub fn kind(&self) -> u8 {
        match self {
            LogicalExpr::Constant(c) => c.kind().unwrap_or(DEFAULT_LOGICAL_KIND),
            LogicalExpr::Designator(d) => d.ty().kind().unwrap_or(DEFAULT_LOGICAL_KIND),
            LogicalExpr::FunctionRef(f) => f.ty.kind().unwrap_or(DEFAULT_LOGICAL_KIND),
            LogicalExpr::ArrayConstructor(a) => a.ty.kind().unwrap_or(DEFAULT_LOGICAL_KIND),
            LogicalExpr::Parentheses(p) => p.kind,
            LogicalExpr::Convert(c) => c.kind,
            LogicalExpr::Not(n) => n.kind,
            LogicalExpr::Binary(b) => b.kind,
            LogicalExpr::Relational(_) => LOGICAL_RESULT_KIND,
        }
    }

    pub fn ty(&self) -> DynamicType {
        DynamicType::Intrinsic {
            category: TypeCategory::Logical,
            kind: self.kind(),
        }
    }

    pub fn rank(&self) -> usize {
        match self {
            LogicalExpr::Constant(c) => c.rank(),
            LogicalExpr::Designator(d) => d.rank(),
            LogicalExpr::FunctionRef(_) => 0,
            LogicalExpr::ArrayConstructor(_) => 1,
            LogicalExpr::Parentheses(p) => p.operand.rank(),
            LogicalExpr::Convert(c) => c.operand.rank(),
            LogicalExpr::Not(n) => n.operand.rank(),
            LogicalExpr::Binary(b) => b.left.rank().max(b.right.rank()),
            LogicalExpr::Relational(r) => r.rank(),
        }
    }
}

impl DerivedExpr {
    pub fn spec(&self) -> Option<crate::types::DerivedTypeSpec> {
        match self {
            DerivedExpr::Constant(c) => c.ty().derived_spec().cloned(),
            DerivedExpr::ArrayConstructor(a) => a.ty.derived_spec().cloned(),
            DerivedExpr::StructureConstructor(s) => Some(s.spec.clone()),
            DerivedExpr::Designator(d) => match d.ty() {
                DynamicType::Derived(spec) => Some(spec),
                DynamicType::Intrinsic { .. } => None,
            },
            DerivedExpr::FunctionRef(f) => f.ty.derived_spec().cloned(),
        }
    }

    pub fn ty(&self) -> Option<DynamicType> {
        match self {
            DerivedExpr::Constant(c) => Some(c.ty().clone()),
            DerivedExpr::ArrayConstructor(a) => Some(a.ty.clone()),
            DerivedExpr::StructureConstructor(s) => Some(DynamicType::Derived(s.spec.clone())),
            DerivedExpr::Designator(d) => Some(d.ty()),
            DerivedExpr::FunctionRef(f) => Some(f.ty.clone()),
        }
    }

    pub fn rank(&self) -> usize {
        match self {
            DerivedExpr::Constant(c) => c.rank(),
            DerivedExpr::ArrayConstructor(_) => 1,
            DerivedExpr::StructureConstructor(_) => 0,
            DerivedExpr::Designator(d) => d.rank(),
            DerivedExpr::FunctionRef(_) => 0,
        }
    }
}

impl Expr {
    pub fn ty(&self) -> Option<DynamicType> {
        match self {
            Expr::Integer(e) => Some(e.ty()),
            Expr::Real(e) => Some(e.ty()),
            Expr::Complex(e) => Some(e.ty()),
            Expr::Character(e) => Some(e.ty()),
            Expr::Logical(e) => Some(e.ty()),
            Expr::Derived(e) => e.ty(),
            Expr::BozLiteral(_)
            | Expr::NullPointer(_)
            | Expr::ProcedureDesignator(_)
            | Expr::ProcedureRef(_) => None,
        }
    }

    pub fn rank(&self) -> usize {
        match self {
            Expr::Integer(e) => e.rank(),
            Expr::Real(e) => e.rank(),
            Expr::Complex(e) => e.rank(),
            Expr::Character(e) => e.rank(),
            Expr::Logical(e) => e.rank(),
            Expr::Derived(e) => e.rank(),
            Expr::BozLiteral(_)
            | Expr::NullPointer(_)
            | Expr::ProcedureDesignator(_)
            | Expr::ProcedureRef(_) => 0,
        }
    }

    pub fn as_integer(&self) -> Option<&IntegerExpr> {
        match self {
            Expr::Integer(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_boz(&self) -> Option<BozLiteral> {
        match self {
            Expr::BozLiteral(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<IntegerExpr> for Expr {
    fn from(e: IntegerExpr) -> Self {
        Expr::Integer(e)
    }
}

impl From<RealExpr> for Expr {
    fn from(e: RealExpr) -> Self {
        Expr::Real(e)
    }
}

impl From<ComplexExpr> for Expr {
    fn from(e: ComplexExpr) -> Self {
        Expr::Complex(e)
    }
}

impl From<CharacterExpr> for Expr {
    fn from(e: CharacterExpr) -> Self {
        Expr::Character(e)
    }
}

impl From<LogicalExpr> for Expr {
    fn from(e: LogicalExpr) -> Self {
        Expr::Logical(e)
    }
}

impl From<DerivedExpr> for Expr {
    fn from(e: DerivedExpr) -> Self {
        Expr::Derived(e)
    }
}

// ----- operator-overload builders -----
//
// Construction conveniences for clients and tests; the operands must agree
// in kind, which these assert rather than propagate.

macro_rules! arith_ops {
    ($ty:ident) => {
        arith_ops!($ty, Add, add, NumericOp::Add);
        arith_ops!($ty, Sub, sub, NumericOp::Subtract);
        arith_ops!($ty, Mul, mul, NumericOp::Multiply);
        arith_ops!($ty, Div, div, NumericOp::Divide);

        impl std::ops::Neg for $ty {
            type Output = $ty;
            fn neg(self) -> $ty {
                $ty::negated(self)
            }
        }
    };
    ($ty:ident, $trait:ident, $method:ident, $op:expr) => {
        impl std::ops::$trait for $ty {
            type Output = $ty;
            fn $method(self, rhs: $ty) -> $ty {
                let kind = self.kind();
                assert_eq!(kind, rhs.kind(), "mixed kinds in operator builder");
                $ty::Binary(Box::new(BinaryOperation {
                    kind,
                    op: $op,
                    left: self,
                    right: rhs,
                }))
            }
        }
    };
}

arith_ops!(IntegerExpr);
arith_ops!(RealExpr);
