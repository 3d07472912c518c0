//! Character strings of kinds 1/2/4, stored as widened code units.

use crate::common_struct;
use crate::error::{Error, Result};
use crate::types::{Ordering, TypeCategory};
use std::fmt::{Display, Formatter};

common_struct! {
    #[derive(Hash)]
    pub struct CharValue {
        kind: u8,
        units: Vec<u32>,
    }
}

impl CharValue {
    pub fn new(kind: u8, units: Vec<u32>) -> Result<Self> {
        if !crate::types::is_valid_kind(TypeCategory::Character, kind) {
            return Err(Error::InvalidKind {
                category: TypeCategory::Character.to_string(),
                kind,
            });
        }
        let max = Self::max_code_unit(kind);
        if let Some(bad) = units.iter().find(|&&u| u > max) {
            return Err(Error::OperandMismatch(format!(
                "code unit {:#x} does not fit character kind {}",
                bad, kind
            )));
        }
        Ok(Self { kind, units })
    }

    pub fn from_str(kind: u8, s: &str) -> Result<Self> {
        let units = match kind {
            1 => s.bytes().map(u32::from).collect(),
            _ => s.chars().map(u32::from).collect(),
        };
        Self::new(kind, units)
    }

    pub fn empty(kind: u8) -> Self {
        Self {
            kind,
            units: Vec::new(),
        }
    }

    fn max_code_unit(kind: u8) -> u32 {
        match kind {
            1 => 0xff,
            2 => 0xffff,
            _ => u32::MAX,
        }
    }

    fn blank() -> u32 {
        b' ' as u32
    }

    pub fn kind(&self) -> u8 {
        self.kind
    }

    pub fn len(&self) -> i64 {
        self.units.len() as i64
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn units(&self) -> &[u32] {
        &self.units
    }

    pub fn concat(&self, other: &CharValue) -> CharValue {
        debug_assert_eq!(self.kind, other.kind);
        let mut units = self.units.clone();
        units.extend_from_slice(&other.units);
        Self {
            kind: self.kind,
            units,
        }
    }

    /// One-based inclusive substring; bounds are clamped to the string and
    /// an empty range yields the empty string.
    pub fn substring(&self, lower: i64, upper: i64) -> CharValue {
        let lower = lower.max(1);
        let upper = upper.min(self.len());
        if lower > upper {
            return Self::empty(self.kind);
        }
        Self {
            kind: self.kind,
            units: self.units[(lower - 1) as usize..upper as usize].to_vec(),
        }
    }

    /// Three-way lexical comparison with blank padding of the shorter
    /// operand, following the Fortran collation rules for the kind.
    pub fn compare(&self, other: &CharValue) -> Ordering {
        let n = self.units.len().max(other.units.len());
        for i in 0..n {
            let a = self.units.get(i).copied().unwrap_or_else(Self::blank);
            let b = other.units.get(i).copied().unwrap_or_else(Self::blank);
            match a.cmp(&b) {
                std::cmp::Ordering::Equal => continue,
                unequal => return unequal.into(),
            }
        }
        Ordering::Equal
    }

    /// Conversion between kinds is defined only when every code point is
    /// 7-bit ASCII.
    pub fn convert(&self, to_kind: u8) -> Option<CharValue> {
        if to_kind == self.kind {
            return Some(self.clone());
        }
        if self.units.iter().any(|&u| u > 127) {
            return None;
        }
        Some(Self {
            kind: to_kind,
            units: self.units.clone(),
        })
    }

    /// Truncate or blank-pad to exactly `length` code units.
    pub fn set_length(&self, length: i64) -> CharValue {
        let length = length.max(0) as usize;
        let mut units = self.units.clone();
        units.resize(length, Self::blank());
        Self {
            kind: self.kind,
            units,
        }
    }
}

impl Display for CharValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"")?;
        for &u in &self.units {
            match char::from_u32(u) {
                Some(c) => write!(f, "{}", c)?,
                None => write!(f, "\\u{{{:x}}}", u)?,
            }
        }
        write!(f, "\"_{}", self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ch(s: &str) -> CharValue {
        CharValue::from_str(1, s).unwrap()
    }

    #[test]
    fn concat_and_length() {
        let joined = ch("AB").concat(&ch("CD"));
        assert_eq!(joined, ch("ABCD"));
        assert_eq!(joined.len(), 4);
    }

    #[test]
    fn substring_bounds() {
        let s = ch("HELLO");
        assert_eq!(s.substring(2, 4), ch("ELL"));
        assert_eq!(s.substring(-3, 2), ch("HE"));
        assert_eq!(s.substring(4, 99), ch("LO"));
        assert_eq!(s.substring(4, 2), CharValue::empty(1));
    }

    #[test]
    fn padded_comparison() {
        assert_eq!(ch("AB").compare(&ch("AB   ")), Ordering::Equal);
        assert_eq!(ch("AB").compare(&ch("AC")), Ordering::Less);
        assert_eq!(ch("B").compare(&ch("AZ")), Ordering::Greater);
    }

    #[test]
    fn ascii_only_conversion() {
        assert!(ch("plain").convert(4).is_some());
        let wide = CharValue::new(4, vec!['\u{3042}' as u32]).unwrap();
        assert!(wide.convert(1).is_none());
    }

    #[test]
    fn set_length_pads_and_truncates() {
        assert_eq!(ch("AB").set_length(4), ch("AB  "));
        assert_eq!(ch("ABCD").set_length(2), ch("AB"));
        assert_eq!(ch("AB").set_length(0), ch(""));
    }
}
