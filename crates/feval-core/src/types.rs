//! Intrinsic type categories, kind parameters, and dynamic type descriptors.

use crate::error::{Error, Result};
use crate::{common_enum, common_struct};
use std::fmt::{Display, Formatter};

common_enum! {
    #[derive(Copy, Hash)]
    pub enum TypeCategory {
        Integer,
        Real,
        Complex,
        Character,
        Logical,
    }
}

impl Display for TypeCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TypeCategory::Integer => "Integer",
            TypeCategory::Real => "Real",
            TypeCategory::Complex => "Complex",
            TypeCategory::Character => "Character",
            TypeCategory::Logical => "Logical",
        };
        f.write_str(name)
    }
}

/// Kind of the integer type used for subscripts, extents, and lengths.
/// Must be able to address the largest supported extent.
pub const SUBSCRIPT_INTEGER_KIND: u8 = 8;

/// Relational operators and intrinsic logical results are logical kind 1.
pub const LOGICAL_RESULT_KIND: u8 = 1;

/// The widest supported integer kind; BOZ comparisons widen to it.
pub const LARGEST_INTEGER_KIND: u8 = 16;

pub fn supported_kinds(category: TypeCategory) -> &'static [u8] {
    match category {
        TypeCategory::Integer => &[1, 2, 4, 8, 16],
        TypeCategory::Real | TypeCategory::Complex => &[2, 4, 8, 10, 16],
        TypeCategory::Character => &[1, 2, 4],
        TypeCategory::Logical => &[1, 2, 4, 8],
    }
}

pub fn is_valid_kind(category: TypeCategory, kind: u8) -> bool {
    supported_kinds(category).contains(&kind)
}

fn check_kind(category: TypeCategory, kind: u8) -> Result<u8> {
    if is_valid_kind(category, kind) {
        Ok(kind)
    } else {
        Err(Error::InvalidKind {
            category: category.to_string(),
            kind,
        })
    }
}

common_enum! {
    #[derive(Copy, Hash)]
    pub enum TypeParamAttr {
        Kind,
        Len,
    }
}

common_struct! {
    /// One bound parameter of a parameterized derived type instance.
    pub struct TypeParamValue {
        pub name: String,
        pub attr: TypeParamAttr,
        /// Explicit value, when one is known.  Deferred and assumed
        /// parameters carry `None`.
        pub value: Option<i64>,
    }
}

impl TypeParamValue {
    pub fn is_explicit(&self) -> bool {
        self.value.is_some()
    }
}

common_struct! {
    /// A realized derived type specification: name plus bound parameters.
    pub struct DerivedTypeSpec {
        pub name: String,
        pub parameters: Vec<TypeParamValue>,
    }
}

impl DerivedTypeSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, param: TypeParamValue) -> Self {
        self.parameters.push(param);
        self
    }

    pub fn find_parameter(&self, name: &str) -> Option<&TypeParamValue> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

common_enum! {
    /// The type of an expression: an intrinsic (category, kind) pair or a
    /// derived type specification.
    pub enum DynamicType {
        Intrinsic { category: TypeCategory, kind: u8 },
        Derived(DerivedTypeSpec),
    }
}

impl DynamicType {
    pub fn new(category: TypeCategory, kind: u8) -> Result<Self> {
        Ok(DynamicType::Intrinsic {
            category,
            kind: check_kind(category, kind)?,
        })
    }

    pub fn integer(kind: u8) -> Result<Self> {
        Self::new(TypeCategory::Integer, kind)
    }

    pub fn real(kind: u8) -> Result<Self> {
        Self::new(TypeCategory::Real, kind)
    }

    pub fn complex(kind: u8) -> Result<Self> {
        Self::new(TypeCategory::Complex, kind)
    }

    pub fn character(kind: u8) -> Result<Self> {
        Self::new(TypeCategory::Character, kind)
    }

    pub fn logical(kind: u8) -> Result<Self> {
        Self::new(TypeCategory::Logical, kind)
    }

    pub fn subscript_integer() -> Self {
        DynamicType::Intrinsic {
            category: TypeCategory::Integer,
            kind: SUBSCRIPT_INTEGER_KIND,
        }
    }

    pub fn logical_result() -> Self {
        DynamicType::Intrinsic {
            category: TypeCategory::Logical,
            kind: LOGICAL_RESULT_KIND,
        }
    }

    pub fn category(&self) -> Option<TypeCategory> {
        match self {
            DynamicType::Intrinsic { category, .. } => Some(*category),
            DynamicType::Derived(_) => None,
        }
    }

    pub fn kind(&self) -> Option<u8> {
        match self {
            DynamicType::Intrinsic { kind, .. } => Some(*kind),
            DynamicType::Derived(_) => None,
        }
    }

    pub fn derived_spec(&self) -> Option<&DerivedTypeSpec> {
        match self {
            DynamicType::Derived(spec) => Some(spec),
            DynamicType::Intrinsic { .. } => None,
        }
    }
}

impl Display for DynamicType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DynamicType::Intrinsic { category, kind } => {
                write!(f, "{}({})", category, kind)
            }
            DynamicType::Derived(spec) => write!(f, "Type({})", spec.name),
        }
    }
}

common_enum! {
    /// Three-valued ordering used by comparisons and extrema.
    #[derive(Copy, Hash)]
    pub enum Ordering {
        Less,
        Equal,
        Greater,
    }
}

impl From<std::cmp::Ordering> for Ordering {
    fn from(o: std::cmp::Ordering) -> Self {
        match o {
            std::cmp::Ordering::Less => Ordering::Less,
            std::cmp::Ordering::Equal => Ordering::Equal,
            std::cmp::Ordering::Greater => Ordering::Greater,
        }
    }
}

common_enum! {
    /// Four-valued result of a floating-point comparison.
    #[derive(Copy)]
    pub enum Relation {
        Less,
        Equal,
        Greater,
        Unordered,
    }
}

common_enum! {
    #[derive(Copy, Hash)]
    pub enum RelationalOperator {
        LT,
        LE,
        EQ,
        NE,
        GE,
        GT,
    }
}

impl RelationalOperator {
    /// Does an ordered comparison result satisfy the operator?
    pub fn satisfied_by(self, ordering: Ordering) -> bool {
        match self {
            RelationalOperator::LT => ordering == Ordering::Less,
            RelationalOperator::LE => ordering != Ordering::Greater,
            RelationalOperator::EQ => ordering == Ordering::Equal,
            RelationalOperator::NE => ordering != Ordering::Equal,
            RelationalOperator::GE => ordering != Ordering::Less,
            RelationalOperator::GT => ordering == Ordering::Greater,
        }
    }

    /// Relation-based variant: unordered operands satisfy only `NE`.
    pub fn satisfied_by_relation(self, relation: Relation) -> bool {
        match relation {
            Relation::Less => self.satisfied_by(Ordering::Less),
            Relation::Equal => self.satisfied_by(Ordering::Equal),
            Relation::Greater => self.satisfied_by(Ordering::Greater),
            Relation::Unordered => self == RelationalOperator::NE,
        }
    }

    pub fn infix(self) -> &'static str {
        match self {
            RelationalOperator::LT => "<",
            RelationalOperator::LE => "<=",
            RelationalOperator::EQ => "==",
            RelationalOperator::NE => "/=",
            RelationalOperator::GE => ">=",
            RelationalOperator::GT => ">",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn kind_validation() {
        assert!(DynamicType::integer(4).is_ok());
        assert!(DynamicType::integer(3).is_err());
        assert!(DynamicType::real(10).is_ok());
        assert!(DynamicType::real(1).is_err());
        assert!(DynamicType::character(4).is_ok());
        assert!(DynamicType::character(8).is_err());
        assert!(DynamicType::logical(8).is_ok());
    }

    #[test]
    fn type_display() {
        assert_eq!(DynamicType::integer(4).unwrap().to_string(), "Integer(4)");
        assert_eq!(DynamicType::real(8).unwrap().to_string(), "Real(8)");
        assert_eq!(
            DynamicType::Derived(DerivedTypeSpec::new("point")).to_string(),
            "Type(point)"
        );
    }

    #[test]
    fn relational_satisfaction() {
        assert!(RelationalOperator::LE.satisfied_by(Ordering::Equal));
        assert!(!RelationalOperator::LT.satisfied_by(Ordering::Equal));
        assert!(RelationalOperator::NE.satisfied_by_relation(Relation::Unordered));
        assert!(!RelationalOperator::EQ.satisfied_by_relation(Relation::Unordered));
    }
}
