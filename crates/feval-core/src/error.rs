use eyre::Error as EyreError;
use std::result;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A kind value outside the supported set for its type category.
    #[error("invalid kind {kind} for {category}")]
    InvalidKind { category: String, kind: u8 },
    /// Operand types that violate the standard's conformance rules.
    /// Raised when a tree is built, never while folding it.
    #[error("operand mismatch: {0}")]
    OperandMismatch(String),
    /// A constant whose element count disagrees with its shape.
    #[error("constant has {elements} element(s) but shape {shape:?}")]
    ShapeMismatch { elements: usize, shape: Vec<i64> },
    #[error("generic error: {0}")]
    Generic(EyreError),
}

pub type Result<T> = result::Result<T, Error>;

impl From<EyreError> for Error {
    fn from(err: EyreError) -> Self {
        Error::Generic(err)
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Generic(EyreError::msg(s))
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Generic(EyreError::msg(s.to_string()))
    }
}
