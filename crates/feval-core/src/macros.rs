/// Macro to return early with a generic error
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::error::Error::Generic(eyre::Error::msg(format!($($arg)*))))
    };
}

/// Declare a struct with the common set of derives used across the
/// expression and value types: Debug, Clone, PartialEq, Eq, Serialize,
/// Deserialize.  Leaf types holding floating-point data implement the
/// comparison traits by hand instead (see `value::real`).
#[macro_export]
macro_rules! common_struct {
    (
        $(#[$attr:meta])*
        pub struct $name:ident $($t:tt)*
    ) => {
        #[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
        $(#[$attr])*
        pub struct $name $($t)*
    };
}

/// Enum companion of `common_struct!`.
#[macro_export]
macro_rules! common_enum {
    (
        $(#[$attr:meta])*
        pub enum $name:ident $($t:tt)*
    ) => {
        #[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
        $(#[$attr])*
        pub enum $name $($t)*
    };
}
