//! Scalar value primitives for the five intrinsic type categories.
//!
//! Each category provides total, flag-bearing arithmetic; nothing in this
//! module panics on anomalous inputs.

pub mod character;
pub mod complex;
pub mod int;
pub mod logical;
pub mod real;

pub use character::CharValue;
pub use complex::ComplexValue;
pub use int::{IntValue, PowerWithErrors, QuotientWithRemainder, ValueWithOverflow};
pub use logical::LogicalValue;
pub use real::{RealFlags, RealValue, Rounding, ValueWithRealFlags};
