//! Resolved symbols, as handed over by semantic analysis.
//!
//! The folder never creates symbols; it only reads the attributes that
//! matter to folding and shape inference.  Symbols are shared by reference
//! so that structure-constructor components can key on identity.

use crate::common_struct;
use crate::types::DynamicType;
use std::sync::Arc;

common_struct! {
    pub struct Symbol {
        pub name: String,
        pub ty: DynamicType,
        /// Set for named constants (PARAMETER attribute).
        pub is_parameter: bool,
        /// Declared extent per dimension, outermost last; `None` marks a
        /// deferred or assumed extent.  Empty for scalars.  Lower bounds
        /// are normalized to 1 by earlier phases.
        pub declared_shape: Vec<Option<i64>>,
        /// Declared character length, when the type is character and the
        /// length is a compile-time constant.
        pub char_length: Option<i64>,
        /// Corank, nonzero for coarrays.
        pub corank: usize,
    }
}

pub type SymbolRef = Arc<Symbol>;

impl Symbol {
    pub fn scalar(name: impl Into<String>, ty: DynamicType) -> Self {
        Self {
            name: name.into(),
            ty,
            is_parameter: false,
            declared_shape: Vec::new(),
            char_length: None,
            corank: 0,
        }
    }

    pub fn array(name: impl Into<String>, ty: DynamicType, extents: Vec<Option<i64>>) -> Self {
        Self {
            declared_shape: extents,
            ..Self::scalar(name, ty)
        }
    }

    pub fn parameter(mut self) -> Self {
        self.is_parameter = true;
        self
    }

    pub fn with_char_length(mut self, len: i64) -> Self {
        self.char_length = Some(len);
        self
    }

    pub fn rank(&self) -> usize {
        self.declared_shape.len()
    }
}
