//! Constant folding and shape analysis over `feval-core` expression trees.
//!
//! The folder reduces a fully resolved expression as far as the standard
//! permits at compile time, diagnosing arithmetic anomalies and
//! non-conforming shapes through the context's message sink.  It never
//! fails: every entry point accepts a tree and returns a well-formed tree.
//!
//! ```
//! use feval_core::expr::IntegerExpr;
//! use feval_fold::{Fold, FoldingContext};
//!
//! let mut ctx = FoldingContext::new();
//! let two = IntegerExpr::literal(4, 2).unwrap();
//! let three = IntegerExpr::literal(4, 3).unwrap();
//! let sum = (two + three).fold(&mut ctx);
//! assert_eq!(sum.to_string(), "5_4");
//! ```

pub mod context;
pub mod fold;
pub mod host;
pub mod shape;
pub mod traverse;

pub use context::FoldingContext;
pub use fold::{fold_expr, Fold};
pub use host::HostIntrinsicLibrary;
pub use shape::{
    check_conformance, count_trips, get_constant_size, get_shape, get_size, Shape,
};
pub use traverse::{is_constant_expr, to_int64, to_int64_integer};
