//! Logical values, kinds 1/2/4/8.

use crate::common_struct;
use crate::error::{Error, Result};
use crate::types::TypeCategory;
use crate::value::int::IntValue;
use std::fmt::{Display, Formatter};

common_struct! {
    #[derive(Copy, Hash)]
    pub struct LogicalValue {
        kind: u8,
        value: bool,
    }
}

impl LogicalValue {
    pub fn new(kind: u8, value: bool) -> Result<Self> {
        if !crate::types::is_valid_kind(TypeCategory::Logical, kind) {
            return Err(Error::InvalidKind {
                category: TypeCategory::Logical.to_string(),
                kind,
            });
        }
        Ok(Self { kind, value })
    }

    /// LOGICAL(1) result of a relational operation.
    pub fn result(value: bool) -> Self {
        Self {
            kind: crate::types::LOGICAL_RESULT_KIND,
            value,
        }
    }

    pub fn kind(&self) -> u8 {
        self.kind
    }

    pub fn is_true(&self) -> bool {
        self.value
    }

    pub fn not(&self) -> LogicalValue {
        Self {
            kind: self.kind,
            value: !self.value,
        }
    }

    pub fn and(&self, other: &LogicalValue) -> LogicalValue {
        Self {
            kind: self.kind,
            value: self.value && other.value,
        }
    }

    pub fn or(&self, other: &LogicalValue) -> LogicalValue {
        Self {
            kind: self.kind,
            value: self.value || other.value,
        }
    }

    pub fn eqv(&self, other: &LogicalValue) -> LogicalValue {
        Self {
            kind: self.kind,
            value: self.value == other.value,
        }
    }

    pub fn neqv(&self, other: &LogicalValue) -> LogicalValue {
        Self {
            kind: self.kind,
            value: self.value != other.value,
        }
    }

    /// Truth-preserving conversion between logical kinds.
    pub fn convert(&self, to_kind: u8) -> LogicalValue {
        Self {
            kind: to_kind,
            value: self.value,
        }
    }

    /// The in-memory representation: 1 or 0 in an integer of matching width.
    pub fn to_integer_representation(&self) -> IntValue {
        IntValue::wrapped(self.kind, i128::from(self.value))
    }
}

impl Display for LogicalValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}_{}",
            if self.value { ".true." } else { ".false." },
            self.kind
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn truth_tables() {
        let t = LogicalValue::new(4, true).unwrap();
        let f = LogicalValue::new(4, false).unwrap();
        assert!(t.and(&t).is_true());
        assert!(!t.and(&f).is_true());
        assert!(t.or(&f).is_true());
        assert!(!f.or(&f).is_true());
        assert!(t.eqv(&t).is_true());
        assert!(!t.eqv(&f).is_true());
        assert!(t.neqv(&f).is_true());
        assert!(!t.neqv(&t).is_true());
        assert!(f.not().is_true());
    }

    #[test]
    fn conversion_preserves_truth() {
        let t = LogicalValue::new(8, true).unwrap();
        assert!(t.convert(1).is_true());
        assert_eq!(t.convert(1).kind(), 1);
    }

    #[test]
    fn display() {
        assert_eq!(LogicalValue::result(true).to_string(), ".true._1");
    }
}
