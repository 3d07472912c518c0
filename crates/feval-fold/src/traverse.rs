//! A small traversal combinator over expression trees, shared by the
//! predicate visitors: constant-expression classification, scalar
//! expandability, and implied-DO index detection.

use feval_core::expr::{
    ArrayConstructor, ArrayConstructorValue, ArrayRef, ArrayRefBase, CharacterExpr, CoarrayRef,
    ComplexExpr, ComplexPart, Component, DataRef, DerivedExpr, Designator, Expr, FunctionRef,
    ImpliedDo, ImpliedDoIndex, IntegerExpr, LogicalExpr, NumericExpr, ProcedureDesignator,
    RealExpr, Relational, Subscript, Substring, SubstringParent, TypeParamInquiry,
};
use feval_core::symbol::Symbol;
use feval_core::types::TypeParamAttr;

/// Hooks return `false` to abort the walk; every walk function reports
/// whether traversal ran to completion.
pub trait Visitor {
    fn symbol(&mut self, _symbol: &Symbol) -> bool {
        true
    }
    fn function_ref(&mut self, _call: &FunctionRef) -> bool {
        true
    }
    fn coarray_ref(&mut self, _coarray: &CoarrayRef) -> bool {
        true
    }
    fn implied_do_index(&mut self, _index: &ImpliedDoIndex) -> bool {
        true
    }
    fn type_param_inquiry(&mut self, _inquiry: &TypeParamInquiry) -> bool {
        true
    }
}

pub fn walk_expr<V: Visitor>(expr: &Expr, v: &mut V) -> bool {
    match expr {
        Expr::Integer(e) => walk_integer(e, v),
        Expr::Real(e) => walk_real(e, v),
        Expr::Complex(e) => walk_complex(e, v),
        Expr::Character(e) => walk_character(e, v),
        Expr::Logical(e) => walk_logical(e, v),
        Expr::Derived(e) => walk_derived(e, v),
        Expr::BozLiteral(_) | Expr::NullPointer(_) | Expr::ProcedureDesignator(_) => true,
        Expr::ProcedureRef(r) => {
            if let ProcedureDesignator::Symbol(s) = &r.proc {
                if !v.symbol(s) {
                    return false;
                }
            }
            r.args
                .iter()
                .flatten()
                .all(|arg| walk_expr(&arg.value, v))
        }
    }
}

pub fn walk_integer<V: Visitor>(expr: &IntegerExpr, v: &mut V) -> bool {
    match expr {
        IntegerExpr::Constant(_) => true,
        IntegerExpr::Designator(d) => walk_designator(d, v),
        IntegerExpr::FunctionRef(f) => walk_function_ref(f, v),
        IntegerExpr::ArrayConstructor(a) => walk_array_constructor(a, v, walk_integer),
        IntegerExpr::TypeParamInquiry(t) => {
            if !v.type_param_inquiry(t) {
                return false;
            }
            match &t.base {
                Some(component) => walk_component(component, v),
                None => true,
            }
        }
        IntegerExpr::ImpliedDoIndex(i) => v.implied_do_index(i),
        IntegerExpr::Parentheses(p) => walk_integer(&p.operand, v),
        IntegerExpr::Negate(n) => walk_integer(&n.operand, v),
        IntegerExpr::Convert(c) => walk_numeric(&c.operand, v),
        IntegerExpr::Binary(b) => walk_integer(&b.left, v) && walk_integer(&b.right, v),
        IntegerExpr::Extremum(e) => walk_integer(&e.left, v) && walk_integer(&e.right, v),
    }
}

pub fn walk_real<V: Visitor>(expr: &RealExpr, v: &mut V) -> bool {
    match expr {
        RealExpr::Constant(_) => true,
        RealExpr::Designator(d) => walk_designator(d, v),
        RealExpr::FunctionRef(f) => walk_function_ref(f, v),
        RealExpr::ArrayConstructor(a) => walk_array_constructor(a, v, walk_real),
        RealExpr::Parentheses(p) => walk_real(&p.operand, v),
        RealExpr::Negate(n) => walk_real(&n.operand, v),
        RealExpr::Convert(c) => walk_numeric(&c.operand, v),
        RealExpr::ComplexComponent(c) => walk_complex(&c.operand, v),
        RealExpr::Binary(b) => walk_real(&b.left, v) && walk_real(&b.right, v),
        RealExpr::RealToIntPower(p) => walk_real(&p.base, v) && walk_integer(&p.exponent, v),
        RealExpr::Extremum(e) => walk_real(&e.left, v) && walk_real(&e.right, v),
    }
}

pub fn walk_complex<V: Visitor>(expr: &ComplexExpr, v: &mut V) -> bool {
    match expr {
        ComplexExpr::Constant(_) => true,
        ComplexExpr::Designator(d) => walk_designator(d, v),
        ComplexExpr::FunctionRef(f) => walk_function_ref(f, v),
        ComplexExpr::ArrayConstructor(a) => walk_array_constructor(a, v, walk_complex),
        ComplexExpr::Parentheses(p) => walk_complex(&p.operand, v),
        ComplexExpr::Construct(c) => walk_real(&c.re, v) && walk_real(&c.im, v),
        ComplexExpr::Binary(b) => walk_complex(&b.left, v) && walk_complex(&b.right, v),
        ComplexExpr::RealToIntPower(p) => walk_complex(&p.base, v) && walk_integer(&p.exponent, v),
    }
}

pub fn walk_character<V: Visitor>(expr: &CharacterExpr, v: &mut V) -> bool {
    match expr {
        CharacterExpr::Constant(_) => true,
        CharacterExpr::Designator(d) => walk_designator(d, v),
        CharacterExpr::FunctionRef(f) => walk_function_ref(f, v),
        CharacterExpr::ArrayConstructor(a) => walk_array_constructor(a, v, walk_character),
        CharacterExpr::Parentheses(p) => walk_character(&p.operand, v),
        CharacterExpr::Convert(c) => walk_character(&c.operand, v),
        CharacterExpr::Concat(c) => walk_character(&c.left, v) && walk_character(&c.right, v),
        CharacterExpr::SetLength(s) => {
            walk_character(&s.string, v) && walk_integer(&s.length, v)
        }
        CharacterExpr::Extremum(e) => walk_character(&e.left, v) && walk_character(&e.right, v),
    }
}

pub fn walk_logical<V: Visitor>(expr: &LogicalExpr, v: &mut V) -> bool {
    match expr {
        LogicalExpr::Constant(_) => true,
        LogicalExpr::Designator(d) => walk_designator(d, v),
        LogicalExpr::FunctionRef(f) => walk_function_ref(f, v),
        LogicalExpr::ArrayConstructor(a) => walk_array_constructor(a, v, walk_logical),
        LogicalExpr::Parentheses(p) => walk_logical(&p.operand, v),
        LogicalExpr::Convert(c) => walk_logical(&c.operand, v),
        LogicalExpr::Not(n) => walk_logical(&n.operand, v),
        LogicalExpr::Binary(b) => walk_logical(&b.left, v) && walk_logical(&b.right, v),
        LogicalExpr::Relational(r) => walk_relational(r, v),
    }
}

pub fn walk_derived<V: Visitor>(expr: &DerivedExpr, v: &mut V) -> bool {
    match expr {
        DerivedExpr::Constant(_) => true,
        DerivedExpr::ArrayConstructor(a) => walk_array_constructor(a, v, walk_derived),
        DerivedExpr::StructureConstructor(s) => s
            .values
            .iter()
            .all(|(_, value)| walk_expr(value, v)),
        DerivedExpr::Designator(d) => walk_designator(d, v),
        DerivedExpr::FunctionRef(f) => walk_function_ref(f, v),
    }
}

fn walk_relational<V: Visitor>(relation: &Relational, v: &mut V) -> bool {
    match relation {
        Relational::Integer(r) => walk_integer(&r.left, v) && walk_integer(&r.right, v),
        Relational::Real(r) => walk_real(&r.left, v) && walk_real(&r.right, v),
        Relational::Character(r) => walk_character(&r.left, v) && walk_character(&r.right, v),
    }
}

fn walk_numeric<V: Visitor>(expr: &NumericExpr, v: &mut V) -> bool {
    match expr {
        NumericExpr::Integer(e) => walk_integer(e, v),
        NumericExpr::Real(e) => walk_real(e, v),
    }
}

fn walk_function_ref<V: Visitor>(call: &FunctionRef, v: &mut V) -> bool {
    if !v.function_ref(call) {
        return false;
    }
    call.args
        .iter()
        .flatten()
        .all(|arg| walk_expr(&arg.value, v))
}

fn walk_array_constructor<E, V: Visitor>(
    ac: &ArrayConstructor<E>,
    v: &mut V,
    walk_element: fn(&E, &mut V) -> bool,
) -> bool {
    if let Some(length) = &ac.length {
        if !walk_integer(length, v) {
            return false;
        }
    }
    walk_values(&ac.values, v, walk_element)
}

fn walk_values<E, V: Visitor>(
    values: &[ArrayConstructorValue<E>],
    v: &mut V,
    walk_element: fn(&E, &mut V) -> bool,
) -> bool {
    values.iter().all(|value| match value {
        ArrayConstructorValue::Expr(e) => walk_element(e, v),
        ArrayConstructorValue::ImpliedDo(ido) => walk_implied_do(ido, v, walk_element),
    })
}

fn walk_implied_do<E, V: Visitor>(
    ido: &ImpliedDo<E>,
    v: &mut V,
    walk_element: fn(&E, &mut V) -> bool,
) -> bool {
    walk_integer(&ido.lower, v)
        && walk_integer(&ido.upper, v)
        && walk_integer(&ido.stride, v)
        && walk_values(&ido.values, v, walk_element)
}

pub fn walk_designator<V: Visitor>(designator: &Designator, v: &mut V) -> bool {
    match designator {
        Designator::Symbol(s) => v.symbol(s),
        Designator::Component(c) => walk_component(c, v),
        Designator::ArrayRef(a) => walk_array_ref(a, v),
        Designator::CoarrayRef(c) => walk_coarray_ref(c, v),
        Designator::Substring(s) => walk_substring(s, v),
        Designator::ComplexPart(p) => walk_complex_part(p, v),
    }
}

fn walk_component<V: Visitor>(component: &Component, v: &mut V) -> bool {
    v.symbol(&component.symbol) && walk_data_ref(&component.base, v)
}

fn walk_data_ref<V: Visitor>(data_ref: &DataRef, v: &mut V) -> bool {
    match data_ref {
        DataRef::Symbol(s) => v.symbol(s),
        DataRef::Component(c) => walk_component(c, v),
        DataRef::ArrayRef(a) => walk_array_ref(a, v),
        DataRef::CoarrayRef(c) => walk_coarray_ref(c, v),
    }
}

fn walk_array_ref<V: Visitor>(array_ref: &ArrayRef, v: &mut V) -> bool {
    let base_ok = match &array_ref.base {
        ArrayRefBase::Symbol(s) => v.symbol(s),
        ArrayRefBase::Component(c) => walk_component(c, v),
    };
    base_ok
        && array_ref.subscripts.iter().all(|s| match s {
            Subscript::Expr(e) => walk_integer(e, v),
            Subscript::Triplet(t) => {
                t.lower.as_deref().map_or(true, |e| walk_integer(e, v))
                    && t.upper.as_deref().map_or(true, |e| walk_integer(e, v))
                    && walk_integer(&t.stride, v)
            }
        })
}

fn walk_coarray_ref<V: Visitor>(coarray: &CoarrayRef, v: &mut V) -> bool {
    if !v.coarray_ref(coarray) {
        return false;
    }
    v.symbol(&coarray.base)
        && coarray.subscripts.iter().all(|s| match s {
            Subscript::Expr(e) => walk_integer(e, v),
            Subscript::Triplet(t) => {
                t.lower.as_deref().map_or(true, |e| walk_integer(e, v))
                    && t.upper.as_deref().map_or(true, |e| walk_integer(e, v))
                    && walk_integer(&t.stride, v)
            }
        })
        && coarray.cosubscripts.iter().all(|e| walk_integer(e, v))
        && coarray.stat.as_deref().map_or(true, |e| walk_integer(e, v))
        && coarray.team.as_deref().map_or(true, |e| walk_integer(e, v))
}

fn walk_substring<V: Visitor>(substring: &Substring, v: &mut V) -> bool {
    let parent_ok = match &substring.parent {
        SubstringParent::DataRef(d) => walk_data_ref(d, v),
        SubstringParent::Literal(_) => true,
    };
    parent_ok
        && substring
            .lower
            .as_deref()
            .map_or(true, |e| walk_integer(e, v))
        && substring
            .upper
            .as_deref()
            .map_or(true, |e| walk_integer(e, v))
}

fn walk_complex_part<V: Visitor>(part: &ComplexPart, v: &mut V) -> bool {
    walk_data_ref(&part.complex, v)
}

// ----- predicates built on the combinator -----

struct ConstantExprVisitor;

impl Visitor for ConstantExprVisitor {
    fn symbol(&mut self, symbol: &Symbol) -> bool {
        symbol.is_parameter
    }

    fn function_ref(&mut self, call: &FunctionRef) -> bool {
        // Of the intrinsics, only inquiry by KIND is currently admitted.
        call.proc.intrinsic_name() == Some("kind")
    }

    fn coarray_ref(&mut self, _: &CoarrayRef) -> bool {
        false
    }

    fn type_param_inquiry(&mut self, inquiry: &TypeParamInquiry) -> bool {
        inquiry.attr == TypeParamAttr::Kind
    }
}

/// Is this a "constant expression" in the sense of the standard's 10.1.12?
/// That is weaker than being foldable to a value: derived-type kind
/// parameters may still be unbound.
pub fn is_constant_expr(expr: &Expr) -> bool {
    walk_expr(expr, &mut ConstantExprVisitor)
}

struct UnexpandabilityVisitor;

impl Visitor for UnexpandabilityVisitor {
    fn function_ref(&mut self, _: &FunctionRef) -> bool {
        false
    }

    fn coarray_ref(&mut self, _: &CoarrayRef) -> bool {
        false
    }
}

/// May a scalar be naively replicated per element during the elementwise
/// lift?  Function references could duplicate side effects and coarray
/// references could observe remote state, so both veto expansion.
pub fn is_expandable_scalar_integer(expr: &IntegerExpr) -> bool {
    walk_integer(expr, &mut UnexpandabilityVisitor)
}

pub fn is_expandable_scalar_real(expr: &RealExpr) -> bool {
    walk_real(expr, &mut UnexpandabilityVisitor)
}

pub fn is_expandable_scalar_complex(expr: &ComplexExpr) -> bool {
    walk_complex(expr, &mut UnexpandabilityVisitor)
}

pub fn is_expandable_scalar_character(expr: &CharacterExpr) -> bool {
    walk_character(expr, &mut UnexpandabilityVisitor)
}

pub fn is_expandable_scalar_logical(expr: &LogicalExpr) -> bool {
    walk_logical(expr, &mut UnexpandabilityVisitor)
}

struct ImpliedDoIndexFinder;

impl Visitor for ImpliedDoIndexFinder {
    fn implied_do_index(&mut self, _: &ImpliedDoIndex) -> bool {
        false
    }
}

pub fn contains_any_implied_do_index(expr: &IntegerExpr) -> bool {
    !walk_integer(expr, &mut ImpliedDoIndexFinder)
}

// ----- constant extraction -----

/// A folded scalar integer constant's value, if that is what this is.
/// Parentheses around the constant do not hide it.
pub fn to_int64_integer(expr: &IntegerExpr) -> Option<i64> {
    match expr {
        IntegerExpr::Constant(c) => c
            .scalar_value()
            .and_then(|s| s.as_integer())
            .and_then(|v| v.to_i64()),
        IntegerExpr::Parentheses(p) => to_int64_integer(&p.operand),
        _ => None,
    }
}

pub fn to_int64(expr: &Expr) -> Option<i64> {
    match expr {
        Expr::Integer(e) => to_int64_integer(e),
        _ => None,
    }
}
