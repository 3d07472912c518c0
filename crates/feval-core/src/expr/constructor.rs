//! Array constructors, implied-DO loops, and structure constructors.

use crate::expr::{Expr, IntegerExpr};
use crate::symbol::SymbolRef;
use crate::types::{DerivedTypeSpec, DynamicType};
use crate::{common_enum, common_struct};

common_enum! {
    /// One item of an array constructor: a scalar or lower-rank expression
    /// linearized in array element order, or a nested implied-DO.
    pub enum ArrayConstructorValue<E> {
        Expr(E),
        ImpliedDo(ImpliedDo<E>),
    }
}

common_struct! {
    /// `(values, name = lower, upper [, stride])`.  Nested implied-DOs use
    /// distinct names; that is an input invariant from earlier phases.
    pub struct ImpliedDo<E> {
        pub name: String,
        pub lower: Box<IntegerExpr>,
        pub upper: Box<IntegerExpr>,
        pub stride: Box<IntegerExpr>,
        pub values: Vec<ArrayConstructorValue<E>>,
    }
}

common_struct! {
    /// A rank-1 array constructor.  `ty` fixes the element type; character
    /// constructors additionally carry a length expression and derived
    /// constructors carry their spec inside `ty`.
    pub struct ArrayConstructor<E> {
        pub ty: DynamicType,
        pub length: Option<Box<IntegerExpr>>,
        pub values: Vec<ArrayConstructorValue<E>>,
    }
}

impl<E> ArrayConstructor<E> {
    pub fn new(ty: DynamicType, values: Vec<ArrayConstructorValue<E>>) -> Self {
        Self {
            ty,
            length: None,
            values,
        }
    }

    pub fn with_length(mut self, length: IntegerExpr) -> Self {
        self.length = Some(Box::new(length));
        self
    }

    pub fn push(&mut self, value: ArrayConstructorValue<E>) {
        self.values.push(value);
    }

    /// True when no element is an implied-DO.
    pub fn is_flat(&self) -> bool {
        self.values
            .iter()
            .all(|v| matches!(v, ArrayConstructorValue::Expr(_)))
    }
}

common_struct! {
    /// A scalar value of derived type built from per-component expressions.
    /// Components are keyed by symbol identity; order is not significant.
    pub struct StructureConstructor {
        pub spec: DerivedTypeSpec,
        pub values: Vec<(SymbolRef, Expr)>,
    }
}

impl StructureConstructor {
    pub fn new(spec: DerivedTypeSpec) -> Self {
        Self {
            spec,
            values: Vec::new(),
        }
    }

    pub fn add(&mut self, symbol: SymbolRef, value: Expr) -> &mut Self {
        self.values.push((symbol, value));
        self
    }

    pub fn find(&self, symbol: &SymbolRef) -> Option<&Expr> {
        self.values
            .iter()
            .find(|(s, _)| std::sync::Arc::ptr_eq(s, symbol))
            .map(|(_, v)| v)
    }
}

impl std::fmt::Display for StructureConstructor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}(", self.spec.name)?;
        let mut first = true;
        for (symbol, value) in &self.values {
            if !first {
                write!(f, ",")?;
            }
            first = false;
            write!(f, "{}={}", symbol.name, value)?;
        }
        write!(f, ")")
    }
}
