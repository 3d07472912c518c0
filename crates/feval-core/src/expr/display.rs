//! Fortran-style rendering of expression trees.
//!
//! Each operation contributes prefix/infix/suffix spellings; the single
//! walker below assembles them.  Output is meant for diagnostics and tests,
//! e.g. `2_4+3_4*(-4_4)`.

use crate::expr::*;
use itertools::Itertools;
use std::fmt::{Display, Formatter, Result};

impl Display for IntegerExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            IntegerExpr::Constant(c) => Display::fmt(c, f),
            IntegerExpr::Designator(d) => Display::fmt(d, f),
            IntegerExpr::FunctionRef(r) => Display::fmt(r, f),
            IntegerExpr::ArrayConstructor(a) => Display::fmt(a, f),
            IntegerExpr::TypeParamInquiry(t) => Display::fmt(t, f),
            IntegerExpr::ImpliedDoIndex(i) => f.write_str(&i.name),
            IntegerExpr::Parentheses(p) => write!(f, "({})", p.operand),
            IntegerExpr::Negate(n) => write!(f, "(-{})", n.operand),
            IntegerExpr::Convert(c) => write!(f, "int({},kind={})", c.operand, c.kind),
            IntegerExpr::Binary(b) => write!(f, "{}{}{}", b.left, b.op.infix(), b.right),
            IntegerExpr::Extremum(e) => write!(
                f,
                "{}({},{})",
                extremum_name(e.ordering),
                e.left,
                e.right
            ),
        }
    }
}

impl Display for RealExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            RealExpr::Constant(c) => Display::fmt(c, f),
            RealExpr::Designator(d) => Display::fmt(d, f),
            RealExpr::FunctionRef(r) => Display::fmt(r, f),
            RealExpr::ArrayConstructor(a) => Display::fmt(a, f),
            RealExpr::Parentheses(p) => write!(f, "({})", p.operand),
            RealExpr::Negate(n) => write!(f, "(-{})", n.operand),
            RealExpr::Convert(c) => write!(f, "real({},kind={})", c.operand, c.kind),
            RealExpr::ComplexComponent(c) => write!(
                f,
                "({}%{})",
                c.operand,
                if c.imaginary { "IM" } else { "RE" }
            ),
            RealExpr::Binary(b) => write!(f, "{}{}{}", b.left, b.op.infix(), b.right),
            RealExpr::RealToIntPower(p) => write!(f, "{}**{}", p.base, p.exponent),
            RealExpr::Extremum(e) => write!(
                f,
                "{}({},{})",
                extremum_name(e.ordering),
                e.left,
                e.right
            ),
        }
    }
}

impl Display for ComplexExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            ComplexExpr::Constant(c) => Display::fmt(c, f),
            ComplexExpr::Designator(d) => Display::fmt(d, f),
            ComplexExpr::FunctionRef(r) => Display::fmt(r, f),
            ComplexExpr::ArrayConstructor(a) => Display::fmt(a, f),
            ComplexExpr::Parentheses(p) => write!(f, "({})", p.operand),
            ComplexExpr::Construct(c) => write!(f, "({},{})", c.re, c.im),
            ComplexExpr::Binary(b) => write!(f, "{}{}{}", b.left, b.op.infix(), b.right),
            ComplexExpr::RealToIntPower(p) => write!(f, "{}**{}", p.base, p.exponent),
        }
    }
}

impl Display for CharacterExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            CharacterExpr::Constant(c) => Display::fmt(c, f),
            CharacterExpr::Designator(d) => Display::fmt(d, f),
            CharacterExpr::FunctionRef(r) => Display::fmt(r, f),
            CharacterExpr::ArrayConstructor(a) => Display::fmt(a, f),
            CharacterExpr::Parentheses(p) => write!(f, "({})", p.operand),
            CharacterExpr::Convert(c) => write!(f, "character({},kind={})", c.operand, c.kind),
            CharacterExpr::Concat(c) => write!(f, "{}//{}", c.left, c.right),
            CharacterExpr::SetLength(s) => {
                write!(f, "%SET_LENGTH({},{})", s.string, s.length)
            }
            CharacterExpr::Extremum(e) => write!(
                f,
                "{}({},{})",
                extremum_name(e.ordering),
                e.left,
                e.right
            ),
        }
    }
}

impl Display for LogicalExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            LogicalExpr::Constant(c) => Display::fmt(c, f),
            LogicalExpr::Designator(d) => Display::fmt(d, f),
            LogicalExpr::FunctionRef(r) => Display::fmt(r, f),
            LogicalExpr::ArrayConstructor(a) => Display::fmt(a, f),
            LogicalExpr::Parentheses(p) => write!(f, "({})", p.operand),
            LogicalExpr::Convert(c) => write!(f, "logical({},kind={})", c.operand, c.kind),
            LogicalExpr::Not(n) => write!(f, ".NOT.{}", n.operand),
            LogicalExpr::Binary(b) => write!(f, "{}{}{}", b.left, b.op.infix(), b.right),
            LogicalExpr::Relational(r) => Display::fmt(r, f),
        }
    }
}

impl Display for DerivedExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            DerivedExpr::Constant(c) => Display::fmt(c, f),
            DerivedExpr::ArrayConstructor(a) => Display::fmt(a, f),
            DerivedExpr::StructureConstructor(s) => Display::fmt(s, f),
            DerivedExpr::Designator(d) => Display::fmt(d, f),
            DerivedExpr::FunctionRef(r) => Display::fmt(r, f),
        }
    }
}

impl Display for Relational {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Relational::Integer(r) => write!(f, "{}{}{}", r.left, r.op.infix(), r.right),
            Relational::Real(r) => write!(f, "{}{}{}", r.left, r.op.infix(), r.right),
            Relational::Character(r) => write!(f, "{}{}{}", r.left, r.op.infix(), r.right),
        }
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Expr::Integer(e) => Display::fmt(e, f),
            Expr::Real(e) => Display::fmt(e, f),
            Expr::Complex(e) => Display::fmt(e, f),
            Expr::Character(e) => Display::fmt(e, f),
            Expr::Logical(e) => Display::fmt(e, f),
            Expr::Derived(e) => Display::fmt(e, f),
            Expr::BozLiteral(b) => write!(f, "z'{:x}'", b.bits),
            Expr::NullPointer(_) => f.write_str("NULL()"),
            Expr::ProcedureDesignator(p) => f.write_str(p.name()),
            Expr::ProcedureRef(r) => {
                write!(f, "{}({})", r.proc.name(), format_args_list(&r.args))
            }
        }
    }
}

impl Display for NumericExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            NumericExpr::Integer(e) => Display::fmt(e, f),
            NumericExpr::Real(e) => Display::fmt(e, f),
        }
    }
}

impl Display for FunctionRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{}({})", self.proc.name(), format_args_list(&self.args))
    }
}

fn format_args_list(args: &[Option<ActualArgument>]) -> String {
    args.iter()
        .map(|arg| match arg {
            None => String::new(),
            Some(a) => match &a.keyword {
                Some(kw) => format!("{}={}", kw, a.value),
                None => a.value.to_string(),
            },
        })
        .join(",")
}

impl Display for TypeParamInquiry {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match &self.base {
            Some(component) => write!(f, "{}%{}", component, self.parameter),
            None => f.write_str(&self.parameter),
        }
    }
}

impl<E: Display> Display for ArrayConstructor<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "[{}::", self.ty)?;
        let mut first = true;
        for value in &self.values {
            if !first {
                write!(f, ",")?;
            }
            first = false;
            Display::fmt(value, f)?;
        }
        write!(f, "]")
    }
}

impl<E: Display> Display for ArrayConstructorValue<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            ArrayConstructorValue::Expr(e) => Display::fmt(e, f),
            ArrayConstructorValue::ImpliedDo(ido) => Display::fmt(ido, f),
        }
    }
}

impl<E: Display> Display for ImpliedDo<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "(")?;
        for value in &self.values {
            write!(f, "{},", value)?;
        }
        write!(
            f,
            "{}={},{},{})",
            self.name, self.lower, self.upper, self.stride
        )
    }
}

// ----- designators -----

impl Display for Designator {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Designator::Symbol(s) => f.write_str(&s.name),
            Designator::Component(c) => Display::fmt(c, f),
            Designator::ArrayRef(a) => Display::fmt(a, f),
            Designator::CoarrayRef(c) => Display::fmt(c, f),
            Designator::Substring(s) => Display::fmt(s, f),
            Designator::ComplexPart(p) => Display::fmt(p, f),
        }
    }
}

impl Display for Component {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{}%{}", self.base, self.symbol.name)
    }
}

impl Display for DataRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            DataRef::Symbol(s) => f.write_str(&s.name),
            DataRef::Component(c) => Display::fmt(c, f),
            DataRef::ArrayRef(a) => Display::fmt(a, f),
            DataRef::CoarrayRef(c) => Display::fmt(c, f),
        }
    }
}

impl Display for ArrayRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match &self.base {
            ArrayRefBase::Symbol(s) => f.write_str(&s.name)?,
            ArrayRefBase::Component(c) => Display::fmt(c, f)?,
        }
        write!(f, "({})", self.subscripts.iter().format(","))
    }
}

impl Display for CoarrayRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.write_str(&self.base.name)?;
        if !self.subscripts.is_empty() {
            write!(f, "({})", self.subscripts.iter().format(","))?;
        }
        write!(f, "[{}]", self.cosubscripts.iter().format(","))
    }
}

impl Display for Subscript {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Subscript::Expr(e) => Display::fmt(e, f),
            Subscript::Triplet(t) => Display::fmt(t, f),
        }
    }
}

impl Display for Triplet {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        if let Some(lower) = &self.lower {
            Display::fmt(lower, f)?;
        }
        write!(f, ":")?;
        if let Some(upper) = &self.upper {
            Display::fmt(upper, f)?;
        }
        write!(f, ":{}", self.stride)
    }
}

impl Display for Substring {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match &self.parent {
            SubstringParent::DataRef(d) => Display::fmt(d, f)?,
            SubstringParent::Literal(c) => Display::fmt(c, f)?,
        }
        write!(f, "(")?;
        if let Some(lower) = &self.lower {
            Display::fmt(lower, f)?;
        }
        write!(f, ":")?;
        if let Some(upper) = &self.upper {
            Display::fmt(upper, f)?;
        }
        write!(f, ")")
    }
}

impl Display for ComplexPart {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(
            f,
            "{}%{}",
            self.complex,
            match self.part {
                ComplexPartKind::Re => "RE",
                ComplexPartKind::Im => "IM",
            }
        )
    }
}

fn extremum_name(ordering: crate::types::Ordering) -> &'static str {
    if ordering == crate::types::Ordering::Less {
        "min"
    } else {
        "max"
    }
}
