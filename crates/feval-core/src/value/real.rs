//! IEEE-flavored real arithmetic, kinds 2/4/8/10/16.
//!
//! Values are carried in host binary64 and rounded into the kind's value
//! set after every operation.  Kinds 2 and 4 get exact demotion through
//! their native bit formats; kinds 10 and 16 fold with binary64 precision
//! on this host (see DESIGN.md).  All operations are total and report
//! anomalies through [`RealFlags`].

use crate::common_struct;
use crate::error::{Error, Result};
use crate::types::{Relation, TypeCategory};
use crate::value::int::IntValue;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Rounding {
    #[default]
    ToNearest,
    ToZero,
    Down,
    Up,
    TiesAwayFromZero,
}

common_struct! {
    #[derive(Copy, Default)]
    pub struct RealFlags {
        pub overflow: bool,
        pub underflow: bool,
        pub inexact: bool,
        pub invalid_argument: bool,
        pub divide_by_zero: bool,
    }
}

impl RealFlags {
    pub fn empty(&self) -> bool {
        !(self.overflow
            || self.underflow
            || self.inexact
            || self.invalid_argument
            || self.divide_by_zero)
    }

    pub fn merge(&mut self, other: RealFlags) {
        self.overflow |= other.overflow;
        self.underflow |= other.underflow;
        self.inexact |= other.inexact;
        self.invalid_argument |= other.invalid_argument;
        self.divide_by_zero |= other.divide_by_zero;
    }
}

common_struct! {
    /// A computed value together with the IEEE flags the computation raised.
    pub struct ValueWithRealFlags<T> {
        pub value: T,
        pub flags: RealFlags,
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RealValue {
    kind: u8,
    value: f64,
}

// Equality is total and structural: NaNs of the same bit class compare
// equal, and -0.0 differs from +0.0.
impl PartialEq for RealValue {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.value.total_cmp(&other.value) == std::cmp::Ordering::Equal
    }
}

impl Eq for RealValue {}

impl Hash for RealValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.value.to_bits().hash(state);
    }
}

// ----- binary16 demotion helpers -----

fn f32_to_f16_bits(value: f32) -> u16 {
    let x = value.to_bits();
    let sign = ((x >> 16) & 0x8000) as u16;
    let biased = (x >> 23) & 0xff;
    let man = x & 0x007f_ffff;
    if biased == 0xff {
        let payload = if man == 0 {
            0
        } else {
            0x0200 | ((man >> 13) as u16 & 0x03ff)
        };
        return sign | 0x7c00 | payload;
    }
    let exp = biased as i32 - 127 + 15;
    if exp >= 0x1f {
        return sign | 0x7c00;
    }
    if exp <= 0 {
        if exp < -10 {
            return sign;
        }
        let man = man | 0x0080_0000;
        let shift = (14 - exp) as u32;
        let mut v = man >> shift;
        let rem = man & ((1u32 << shift) - 1);
        let half = 1u32 << (shift - 1);
        if rem > half || (rem == half && (v & 1) == 1) {
            v += 1;
        }
        return sign | v as u16;
    }
    let mut v = ((exp as u32) << 10) | (man >> 13);
    let rem = man & 0x1fff;
    if rem > 0x1000 || (rem == 0x1000 && (v & 1) == 1) {
        v += 1; // a carry here correctly bumps the exponent
    }
    sign | v as u16
}

fn f16_bits_to_f64(bits: u16) -> f64 {
    let sign = if bits & 0x8000 != 0 { -1.0 } else { 1.0 };
    let exp = (bits >> 10) & 0x1f;
    let man = (bits & 0x03ff) as f64;
    match exp {
        0 => sign * man * (-24f64).exp2(),
        0x1f => {
            if man == 0.0 {
                sign * f64::INFINITY
            } else {
                f64::NAN
            }
        }
        _ => sign * (1.0 + man / 1024.0) * f64::from(exp as i32 - 15).exp2(),
    }
}

impl RealValue {
    pub fn new(kind: u8, value: f64) -> Result<Self> {
        if !crate::types::is_valid_kind(TypeCategory::Real, kind) {
            return Err(Error::InvalidKind {
                category: TypeCategory::Real.to_string(),
                kind,
            });
        }
        Ok(Self::make(kind, value))
    }

    /// Round an arbitrary binary64 value into the kind's value set.
    pub(crate) fn make(kind: u8, value: f64) -> Self {
        let (value, _) = Self::demote(kind, value);
        Self { kind, value }
    }

    pub fn zero(kind: u8) -> Self {
        Self { kind, value: 0.0 }
    }

    pub fn kind(&self) -> u8 {
        self.kind
    }

    pub fn to_f64(&self) -> f64 {
        self.value
    }

    pub fn epsilon(kind: u8) -> Self {
        let value = match kind {
            2 => (-10f64).exp2(),
            4 => f32::EPSILON as f64,
            _ => f64::EPSILON,
        };
        Self { kind, value }
    }

    fn min_normal(kind: u8) -> f64 {
        match kind {
            2 => (-14f64).exp2(),
            4 => f32::MIN_POSITIVE as f64,
            _ => f64::MIN_POSITIVE,
        }
    }

    /// Round into the kind and report what the rounding did.
    fn demote(kind: u8, x: f64) -> (f64, RealFlags) {
        let mut flags = RealFlags::default();
        if x.is_nan() {
            return (x, flags);
        }
        let y = match kind {
            2 => f16_bits_to_f64(f32_to_f16_bits(x as f32)),
            4 => x as f32 as f64,
            _ => return (x, flags),
        };
        if y != x {
            flags.inexact = true;
        }
        if y.is_infinite() && x.is_finite() {
            flags.overflow = true;
        }
        if x != 0.0 && y.abs() < Self::min_normal(kind) {
            flags.underflow = true;
        }
        (y, flags)
    }

    fn finish(kind: u8, exact: f64, mut flags: RealFlags) -> ValueWithRealFlags<RealValue> {
        let (value, demotion) = Self::demote(kind, exact);
        flags.merge(demotion);
        ValueWithRealFlags {
            value: Self { kind, value },
            flags,
        }
    }

    fn common_flags(a: f64, b: f64, result: f64) -> RealFlags {
        let mut flags = RealFlags::default();
        if result.is_nan() && !a.is_nan() && !b.is_nan() {
            flags.invalid_argument = true;
        }
        if result.is_infinite() && a.is_finite() && b.is_finite() {
            flags.overflow = true;
            flags.inexact = true;
        }
        flags
    }

    pub fn add(&self, rhs: &RealValue, _rounding: Rounding) -> ValueWithRealFlags<RealValue> {
        let (a, b) = (self.value, rhs.value);
        let sum = a + b;
        let mut flags = Self::common_flags(a, b, sum);
        if sum.is_finite() {
            // two-sum residual is the exact binary64 rounding error
            let bb = sum - a;
            let err = (a - (sum - bb)) + (b - bb);
            if err != 0.0 {
                flags.inexact = true;
            }
        }
        Self::finish(self.kind, sum, flags)
    }

    pub fn subtract(&self, rhs: &RealValue, rounding: Rounding) -> ValueWithRealFlags<RealValue> {
        self.add(&rhs.negate(), rounding)
    }

    pub fn multiply(&self, rhs: &RealValue, _rounding: Rounding) -> ValueWithRealFlags<RealValue> {
        let (a, b) = (self.value, rhs.value);
        let product = a * b;
        let mut flags = Self::common_flags(a, b, product);
        if product.is_finite() && a.mul_add(b, -product) != 0.0 {
            flags.inexact = true;
        }
        Self::finish(self.kind, product, flags)
    }

    pub fn divide(&self, rhs: &RealValue, _rounding: Rounding) -> ValueWithRealFlags<RealValue> {
        let (a, b) = (self.value, rhs.value);
        let quotient = a / b;
        let mut flags = Self::common_flags(a, b, quotient);
        if b == 0.0 && a.is_finite() && a != 0.0 {
            flags.divide_by_zero = true;
        }
        if quotient.is_finite() && b.is_finite() && quotient.mul_add(b, -a) != 0.0 {
            flags.inexact = true;
        }
        Self::finish(self.kind, quotient, flags)
    }

    pub fn negate(&self) -> RealValue {
        Self {
            kind: self.kind,
            value: -self.value,
        }
    }

    pub fn abs(&self) -> RealValue {
        Self {
            kind: self.kind,
            value: self.value.abs(),
        }
    }

    /// AINT: truncation toward zero, still a real value.
    pub fn aint(&self) -> ValueWithRealFlags<RealValue> {
        ValueWithRealFlags {
            value: Self {
                kind: self.kind,
                value: self.value.trunc(),
            },
            flags: RealFlags::default(),
        }
    }

    pub fn compare(&self, other: &RealValue) -> Relation {
        match self.value.partial_cmp(&other.value) {
            Some(std::cmp::Ordering::Less) => Relation::Less,
            Some(std::cmp::Ordering::Equal) => Relation::Equal,
            Some(std::cmp::Ordering::Greater) => Relation::Greater,
            None => Relation::Unordered,
        }
    }

    pub fn is_not_a_number(&self) -> bool {
        self.value.is_nan()
    }

    pub fn is_negative(&self) -> bool {
        self.value.is_sign_negative() && !self.value.is_nan()
    }

    pub fn from_integer(kind: u8, int: &IntValue) -> ValueWithRealFlags<RealValue> {
        let v = int.to_i128();
        let x = v as f64;
        let mut flags = RealFlags::default();
        let bound = 127f64.exp2();
        let exact = x >= -bound && x < bound && (x as i128) == v;
        if !exact {
            flags.inexact = true;
        }
        Self::finish(kind, x, flags)
    }

    /// Conversion to integer.  NaN and infinity raise `invalid_argument`;
    /// values outside the target's range raise `overflow` and saturate.
    pub fn to_integer(&self, int_kind: u8, rounding: Rounding) -> ValueWithRealFlags<IntValue> {
        let mut flags = RealFlags::default();
        if self.value.is_nan() {
            flags.invalid_argument = true;
            return ValueWithRealFlags {
                value: IntValue::zero(int_kind),
                flags,
            };
        }
        if self.value.is_infinite() {
            flags.invalid_argument = true;
            let value = if self.value > 0.0 {
                IntValue::huge(int_kind)
            } else {
                IntValue::most_negative(int_kind)
            };
            return ValueWithRealFlags { value, flags };
        }
        let rounded = match rounding {
            Rounding::ToNearest => self.value.round_ties_even(),
            Rounding::ToZero => self.value.trunc(),
            Rounding::Down => self.value.floor(),
            Rounding::Up => self.value.ceil(),
            Rounding::TiesAwayFromZero => self.value.round(),
        };
        if rounded != self.value {
            flags.inexact = true;
        }
        let bits = int_kind as i32 * 8;
        let bound = f64::from(bits - 1).exp2();
        if rounded >= bound || rounded < -bound {
            flags.overflow = true;
            let value = if rounded > 0.0 {
                IntValue::huge(int_kind)
            } else {
                IntValue::most_negative(int_kind)
            };
            return ValueWithRealFlags { value, flags };
        }
        ValueWithRealFlags {
            value: IntValue::wrapped(int_kind, rounded as i128),
            flags,
        }
    }

    /// Conversion to another real kind.
    pub fn convert(&self, to_kind: u8) -> ValueWithRealFlags<RealValue> {
        Self::finish(to_kind, self.value, RealFlags::default())
    }

    /// The Fortran EXPONENT inquiry: e such that the value is m * 2**e
    /// with 0.5 <= |m| < 1.  Zero yields zero.
    pub fn exponent(&self) -> i64 {
        if self.value == 0.0 || self.value.is_nan() || self.value.is_infinite() {
            return 0;
        }
        let bits = self.value.to_bits();
        let biased = ((bits >> 52) & 0x7ff) as i64;
        if biased == 0 {
            // subnormal binary64: value = man * 2**-1074
            let man = bits & 0x000f_ffff_ffff_ffff;
            64 - man.leading_zeros() as i64 - 1074
        } else {
            biased - 1022
        }
    }

    pub fn flush_subnormal_to_zero(&self) -> RealValue {
        if self.value != 0.0 && self.value.abs() < Self::min_normal(self.kind) {
            Self {
                kind: self.kind,
                value: if self.value.is_sign_negative() { -0.0 } else { 0.0 },
            }
        } else {
            *self
        }
    }

    pub fn is_subnormal_in_kind(&self) -> bool {
        self.value != 0.0 && self.value.abs() < Self::min_normal(self.kind) && self.value.is_finite()
    }

    /// The value's bit pattern in the kind's interchange format, widened.
    /// Kinds 10 and 16 use the binary64 pattern on this host.
    pub fn to_raw_bits(&self) -> u128 {
        match self.kind {
            2 => f32_to_f16_bits(self.value as f32) as u128,
            4 => (self.value as f32).to_bits() as u128,
            _ => self.value.to_bits() as u128,
        }
    }

    pub fn from_raw_bits(kind: u8, bits: u128) -> RealValue {
        let value = match kind {
            2 => f16_bits_to_f64(bits as u16),
            4 => f32::from_bits(bits as u32) as f64,
            _ => f64::from_bits(bits as u64),
        };
        Self { kind, value }
    }
}

impl Display for RealValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}_{}", self.value, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn real4(v: f64) -> RealValue {
        RealValue::new(4, v).unwrap()
    }

    fn real8(v: f64) -> RealValue {
        RealValue::new(8, v).unwrap()
    }

    #[test]
    fn multiply_by_one_is_exact() {
        let x = real4(1234.5);
        let product = x.multiply(&real4(1.0), Rounding::ToNearest);
        assert_eq!(product.value, x);
        assert!(product.flags.empty());
    }

    #[test]
    fn addition_flags() {
        let exact = real8(1.5).add(&real8(2.25), Rounding::ToNearest);
        assert!(exact.flags.empty());
        assert_eq!(exact.value.to_f64(), 3.75);

        let inexact = real8(1.0).add(&real8(1e-300), Rounding::ToNearest);
        assert!(inexact.flags.inexact);

        let overflow = real4(3e38).add(&real4(3e38), Rounding::ToNearest);
        assert!(overflow.flags.overflow);
        assert!(overflow.value.to_f64().is_infinite());
    }

    #[test]
    fn division_flags() {
        let dbz = real4(7.0).divide(&real4(0.0), Rounding::ToNearest);
        assert!(dbz.flags.divide_by_zero);
        assert!(dbz.value.to_f64().is_infinite());

        let invalid = real4(0.0).divide(&real4(0.0), Rounding::ToNearest);
        assert!(invalid.flags.invalid_argument);
        assert!(invalid.value.is_not_a_number());

        let third = real8(1.0).divide(&real8(3.0), Rounding::ToNearest);
        assert!(third.flags.inexact);

        let half = real8(1.0).divide(&real8(2.0), Rounding::ToNearest);
        assert!(half.flags.empty());
    }

    #[test]
    fn kind_demotion() {
        let narrowed = real8(1.0 + f64::EPSILON).convert(4);
        assert!(narrowed.flags.inexact);
        assert_eq!(narrowed.value.to_f64(), 1.0);

        let widened = real4(0.5).convert(8);
        assert!(widened.flags.empty());
    }

    #[test]
    fn half_precision_round_trip() {
        for v in [0.0, 1.0, -2.5, 65504.0, 0.0009765625] {
            let half = RealValue::new(2, v).unwrap();
            assert_eq!(half.to_f64(), v, "binary16 should represent {v}");
        }
        let overflowed = RealValue::new(2, 1e6).unwrap();
        assert!(overflowed.to_f64().is_infinite());
    }

    #[test]
    fn integer_conversions() {
        let from = RealValue::from_integer(4, &IntValue::new(4, 42).unwrap());
        assert!(from.flags.empty());
        assert_eq!(from.value.to_f64(), 42.0);

        let truncated = real4(3.75).to_integer(4, Rounding::ToZero);
        assert_eq!(truncated.value.to_i128(), 3);
        assert!(truncated.flags.inexact);

        let nan = RealValue::new(4, f64::NAN).unwrap().to_integer(4, Rounding::ToZero);
        assert!(nan.flags.invalid_argument);

        let big = real8(1e30).to_integer(4, Rounding::ToZero);
        assert!(big.flags.overflow);
        assert_eq!(big.value, IntValue::huge(4));
    }

    #[test]
    fn exponent_inquiry() {
        assert_eq!(real8(1.0).exponent(), 1);
        assert_eq!(real8(0.5).exponent(), 0);
        assert_eq!(real8(4.0).exponent(), 3);
        assert_eq!(real8(0.0).exponent(), 0);
    }

    #[test]
    fn raw_bits() {
        let x = real4(1.0);
        assert_eq!(x.to_raw_bits(), 0x3f80_0000);
        assert_eq!(RealValue::from_raw_bits(4, 0x3f80_0000), x);
    }

    #[test]
    fn structural_equality() {
        let nan = RealValue::new(8, f64::NAN).unwrap();
        assert_eq!(nan, nan);
        assert_ne!(RealValue::new(8, 0.0).unwrap(), RealValue::new(8, -0.0).unwrap());
    }
}
