//! Core data model for a Fortran expression evaluator: scalar value
//! primitives with explicit flag-bearing arithmetic, dynamic type
//! descriptors, the typed expression tree family, and the diagnostics
//! channel the folder reports through.
//!
//! This crate holds no rewriting logic; see `feval-fold` for the folder,
//! shape inference, and intrinsic evaluation.

#[macro_use]
pub mod macros;

pub mod constant;
pub mod diagnostics;
pub mod error;
pub mod expr;
pub mod symbol;
pub mod types;
pub mod value;

pub use error::{Error, Result};

// Re-export for users of the `bail!` and logging idioms.
pub use tracing;
