//! Fixed-width two's-complement signed integers, kinds 1/2/4/8/16.
//!
//! Every arithmetic operation is total and reports anomalies through an
//! explicit result struct instead of panicking: overflow wraps, division by
//! zero yields a zero quotient, and the caller decides what to diagnose.

use crate::common_struct;
use crate::error::{Error, Result};
use crate::types::{Ordering, TypeCategory};
use std::fmt::{Display, Formatter};

common_struct! {
    #[derive(Copy, Hash, PartialOrd, Ord)]
    pub struct IntValue {
        kind: u8,
        /// Sign-extended value; always representable in the kind's width.
        value: i128,
    }
}

common_struct! {
    #[derive(Copy)]
    pub struct ValueWithOverflow {
        pub value: IntValue,
        pub overflow: bool,
    }
}

common_struct! {
    #[derive(Copy)]
    pub struct QuotientWithRemainder {
        pub quotient: IntValue,
        pub remainder: IntValue,
        pub division_by_zero: bool,
        pub overflow: bool,
    }
}

common_struct! {
    #[derive(Copy)]
    pub struct PowerWithErrors {
        pub power: IntValue,
        pub division_by_zero: bool,
        pub overflow: bool,
        pub zero_to_zero: bool,
    }
}

/// Dispatch a binary `overflowing_*` operation to the kind's native width.
macro_rules! per_kind_overflowing {
    ($x:expr, $y:expr, $method:ident) => {{
        match $x.kind {
            1 => {
                let (v, o) = ($x.value as i8).$method($y.value as i8);
                (v as i128, o)
            }
            2 => {
                let (v, o) = ($x.value as i16).$method($y.value as i16);
                (v as i128, o)
            }
            4 => {
                let (v, o) = ($x.value as i32).$method($y.value as i32);
                (v as i128, o)
            }
            8 => {
                let (v, o) = ($x.value as i64).$method($y.value as i64);
                (v as i128, o)
            }
            _ => {
                let (v, o) = $x.value.$method($y.value);
                (v, o)
            }
        }
    }};
}

impl IntValue {
    pub fn new(kind: u8, value: i128) -> Result<Self> {
        if !crate::types::is_valid_kind(TypeCategory::Integer, kind) {
            return Err(Error::InvalidKind {
                category: TypeCategory::Integer.to_string(),
                kind,
            });
        }
        Ok(Self::wrapped(kind, value))
    }

    /// Wrap an arbitrary value into the kind's width, sign-extending; the
    /// two's-complement analogue of modular reduction.
    pub fn wrapped(kind: u8, value: i128) -> Self {
        let wrapped = match kind {
            1 => value as i8 as i128,
            2 => value as i16 as i128,
            4 => value as i32 as i128,
            8 => value as i64 as i128,
            _ => value,
        };
        Self {
            kind,
            value: wrapped,
        }
    }

    pub fn zero(kind: u8) -> Self {
        Self { kind, value: 0 }
    }

    pub fn kind(&self) -> u8 {
        self.kind
    }

    pub fn bit_size(&self) -> u32 {
        self.kind as u32 * 8
    }

    pub fn to_i128(&self) -> i128 {
        self.value
    }

    pub fn to_i64(&self) -> Option<i64> {
        i64::try_from(self.value).ok()
    }

    pub fn is_zero(&self) -> bool {
        self.value == 0
    }

    pub fn huge(kind: u8) -> Self {
        let bits = kind as u32 * 8;
        Self {
            kind,
            value: (i128::MAX >> (128 - bits)),
        }
    }

    pub fn most_negative(kind: u8) -> Self {
        let bits = kind as u32 * 8;
        Self {
            kind,
            value: i128::MIN >> (128 - bits),
        }
    }

    /// The value's bit pattern, zero-extended into a word.
    pub fn to_unsigned_bits(&self) -> u128 {
        (self.value as u128) & Self::word_mask(self.kind)
    }

    fn word_mask(kind: u8) -> u128 {
        let bits = kind as u32 * 8;
        if bits >= 128 {
            u128::MAX
        } else {
            (1u128 << bits) - 1
        }
    }

    fn from_word(kind: u8, word: u128) -> Self {
        Self::wrapped(kind, word as i128)
    }

    // ----- signed arithmetic -----

    pub fn negate(&self) -> ValueWithOverflow {
        let (value, overflow) = match self.kind {
            1 => {
                let (v, o) = (self.value as i8).overflowing_neg();
                (v as i128, o)
            }
            2 => {
                let (v, o) = (self.value as i16).overflowing_neg();
                (v as i128, o)
            }
            4 => {
                let (v, o) = (self.value as i32).overflowing_neg();
                (v as i128, o)
            }
            8 => {
                let (v, o) = (self.value as i64).overflowing_neg();
                (v as i128, o)
            }
            _ => self.value.overflowing_neg(),
        };
        ValueWithOverflow {
            value: Self::wrapped(self.kind, value),
            overflow,
        }
    }

    pub fn abs(&self) -> ValueWithOverflow {
        if self.value < 0 {
            self.negate()
        } else {
            ValueWithOverflow {
                value: *self,
                overflow: false,
            }
        }
    }

    pub fn add_signed(&self, other: &IntValue) -> ValueWithOverflow {
        let (value, overflow) = per_kind_overflowing!(self, other, overflowing_add);
        ValueWithOverflow {
            value: Self::wrapped(self.kind, value),
            overflow,
        }
    }

    pub fn subtract_signed(&self, other: &IntValue) -> ValueWithOverflow {
        let (value, overflow) = per_kind_overflowing!(self, other, overflowing_sub);
        ValueWithOverflow {
            value: Self::wrapped(self.kind, value),
            overflow,
        }
    }

    pub fn multiply_signed(&self, other: &IntValue) -> ValueWithOverflow {
        let (value, overflow) = per_kind_overflowing!(self, other, overflowing_mul);
        ValueWithOverflow {
            value: Self::wrapped(self.kind, value),
            overflow,
        }
    }

    /// Signed division.  The remainder carries the sign of the dividend.
    /// Division by zero produces a zero quotient and remainder == dividend.
    pub fn divide_signed(&self, other: &IntValue) -> QuotientWithRemainder {
        if other.is_zero() {
            return QuotientWithRemainder {
                quotient: Self::zero(self.kind),
                remainder: *self,
                division_by_zero: true,
                overflow: false,
            };
        }
        let (q, overflow) = per_kind_overflowing!(self, other, overflowing_div);
        let remainder = match self.kind {
            1 => (self.value as i8).wrapping_rem(other.value as i8) as i128,
            2 => (self.value as i16).wrapping_rem(other.value as i16) as i128,
            4 => (self.value as i32).wrapping_rem(other.value as i32) as i128,
            8 => (self.value as i64).wrapping_rem(other.value as i64) as i128,
            _ => self.value.wrapping_rem(other.value),
        };
        QuotientWithRemainder {
            quotient: Self::wrapped(self.kind, q),
            remainder: Self::wrapped(self.kind, remainder),
            division_by_zero: false,
            overflow,
        }
    }

    /// Integer exponentiation by repeated squaring.
    ///
    /// A negative exponent yields zero for any base other than +-1, and
    /// raises `division_by_zero` only for a zero base.  0**0 is reported
    /// with `zero_to_zero` and folds to 1.
    pub fn power(&self, exponent: &IntValue) -> PowerWithErrors {
        let mut result = PowerWithErrors {
            power: Self::wrapped(self.kind, 1),
            division_by_zero: false,
            overflow: false,
            zero_to_zero: false,
        };
        let exp = exponent.to_i128();
        if exp < 0 {
            if self.is_zero() {
                result.division_by_zero = true;
                result.power = Self::zero(self.kind);
            } else if self.value == 1 {
                result.power = *self;
            } else if self.value == -1 {
                result.power = if exp % 2 == 0 {
                    Self::wrapped(self.kind, 1)
                } else {
                    *self
                };
            } else {
                result.power = Self::zero(self.kind);
            }
            return result;
        }
        if exp == 0 {
            if self.is_zero() {
                result.zero_to_zero = true;
            }
            return result;
        }
        let mut base = *self;
        let mut remaining = exp as u128;
        loop {
            if remaining & 1 == 1 {
                let product = result.power.multiply_signed(&base);
                result.overflow |= product.overflow;
                result.power = product.value;
            }
            remaining >>= 1;
            if remaining == 0 {
                break;
            }
            let squared = base.multiply_signed(&base);
            // Overflow in the square only matters if that square is used by
            // a later product; detecting that precisely is not worth it, so
            // any square overflow while bits remain is reported.
            result.overflow |= squared.overflow;
            base = squared.value;
        }
        result
    }

    /// DIM(x, y) = MAX(x - y, 0)
    pub fn dim(&self, other: &IntValue) -> ValueWithOverflow {
        if self.compare_signed(other) == Ordering::Greater {
            self.subtract_signed(other)
        } else {
            ValueWithOverflow {
                value: Self::zero(self.kind),
                overflow: false,
            }
        }
    }

    pub fn compare_signed(&self, other: &IntValue) -> Ordering {
        self.value.cmp(&other.value).into()
    }

    // ----- bitwise operations on the kind-width word -----

    pub fn iand(&self, other: &IntValue) -> IntValue {
        Self::from_word(self.kind, self.to_unsigned_bits() & other.to_unsigned_bits())
    }

    pub fn ior(&self, other: &IntValue) -> IntValue {
        Self::from_word(self.kind, self.to_unsigned_bits() | other.to_unsigned_bits())
    }

    pub fn ieor(&self, other: &IntValue) -> IntValue {
        Self::from_word(self.kind, self.to_unsigned_bits() ^ other.to_unsigned_bits())
    }

    pub fn not(&self) -> IntValue {
        Self::from_word(self.kind, !self.to_unsigned_bits())
    }

    pub fn ibclr(&self, pos: i64) -> IntValue {
        if pos < 0 || pos as u32 >= self.bit_size() {
            return *self;
        }
        Self::from_word(self.kind, self.to_unsigned_bits() & !(1u128 << pos))
    }

    pub fn ibset(&self, pos: i64) -> IntValue {
        if pos < 0 || pos as u32 >= self.bit_size() {
            return *self;
        }
        Self::from_word(self.kind, self.to_unsigned_bits() | (1u128 << pos))
    }

    /// ISHFT: positive count shifts left, negative shifts right, both
    /// logical.  |count| >= bit size yields zero.
    pub fn ishft(&self, count: i64) -> IntValue {
        let bits = self.bit_size() as i64;
        if count >= bits || count <= -bits {
            Self::zero(self.kind)
        } else if count >= 0 {
            Self::from_word(self.kind, self.to_unsigned_bits() << count)
        } else {
            Self::from_word(self.kind, self.to_unsigned_bits() >> (-count))
        }
    }

    pub fn shiftl(&self, count: i64) -> IntValue {
        if count < 0 || count as u32 >= self.bit_size() {
            Self::zero(self.kind)
        } else {
            Self::from_word(self.kind, self.to_unsigned_bits() << count)
        }
    }

    pub fn shiftr(&self, count: i64) -> IntValue {
        if count < 0 || count as u32 >= self.bit_size() {
            Self::zero(self.kind)
        } else {
            Self::from_word(self.kind, self.to_unsigned_bits() >> count)
        }
    }

    /// Arithmetic right shift; counts past the width fill with the sign.
    pub fn shifta(&self, count: i64) -> IntValue {
        if count <= 0 {
            return *self;
        }
        let bits = self.bit_size() as i64;
        let count = count.min(bits - 1).min(127);
        Self::wrapped(self.kind, self.value >> count)
    }

    /// High word bits of (self || low) shifted left by `shift`.
    pub fn dshiftl(&self, low: &IntValue, shift: i64) -> IntValue {
        let bits = self.bit_size() as i64;
        if shift <= 0 {
            *self
        } else if shift >= bits {
            *low
        } else {
            let hi = self.to_unsigned_bits() << shift;
            let lo = low.to_unsigned_bits() >> (bits - shift);
            Self::from_word(self.kind, hi | lo)
        }
    }

    /// Low word bits of (self || low) shifted right by `shift`.
    pub fn dshiftr(&self, low: &IntValue, shift: i64) -> IntValue {
        let bits = self.bit_size() as i64;
        if shift <= 0 {
            *low
        } else if shift >= bits {
            *self
        } else {
            let hi = self.to_unsigned_bits() << (bits - shift);
            let lo = low.to_unsigned_bits() >> shift;
            Self::from_word(self.kind, hi | lo)
        }
    }

    /// MERGE_BITS(i, j, mask) = IOR(IAND(i, mask), IAND(j, NOT(mask)))
    pub fn merge_bits(&self, other: &IntValue, mask: &IntValue) -> IntValue {
        let m = mask.to_unsigned_bits();
        Self::from_word(
            self.kind,
            (self.to_unsigned_bits() & m) | (other.to_unsigned_bits() & !m),
        )
    }

    /// A word with the leftmost `places` bits set.
    pub fn maskl(kind: u8, places: i64) -> IntValue {
        let bits = kind as i64 * 8;
        let places = places.clamp(0, bits);
        let mask = Self::word_mask(kind);
        let word = if places == 0 {
            0
        } else {
            mask & !(mask >> places)
        };
        Self::from_word(kind, word)
    }

    /// A word with the rightmost `places` bits set.
    pub fn maskr(kind: u8, places: i64) -> IntValue {
        let bits = kind as i64 * 8;
        let places = places.clamp(0, bits);
        let word = if places == 0 {
            0
        } else {
            Self::word_mask(kind) >> (bits - places)
        };
        Self::from_word(kind, word)
    }

    pub fn leadz(&self) -> i64 {
        let word = self.to_unsigned_bits();
        if word == 0 {
            self.bit_size() as i64
        } else {
            word.leading_zeros() as i64 - (128 - self.bit_size() as i64)
        }
    }

    pub fn trailz(&self) -> i64 {
        let word = self.to_unsigned_bits();
        if word == 0 {
            self.bit_size() as i64
        } else {
            word.trailing_zeros() as i64
        }
    }

    pub fn popcnt(&self) -> i64 {
        self.to_unsigned_bits().count_ones() as i64
    }

    pub fn poppar(&self) -> bool {
        self.popcnt() % 2 != 0
    }

    // ----- unsigned (bit-pattern) comparison -----

    pub fn bge(&self, other: &IntValue) -> bool {
        self.to_unsigned_bits() >= other.to_unsigned_bits()
    }

    pub fn bgt(&self, other: &IntValue) -> bool {
        self.to_unsigned_bits() > other.to_unsigned_bits()
    }

    pub fn ble(&self, other: &IntValue) -> bool {
        self.to_unsigned_bits() <= other.to_unsigned_bits()
    }

    pub fn blt(&self, other: &IntValue) -> bool {
        self.to_unsigned_bits() < other.to_unsigned_bits()
    }

    // ----- conversions -----

    /// Value-preserving conversion to another kind; overflow is reported
    /// when the value does not survive the round trip.
    pub fn convert_signed(&self, to_kind: u8) -> ValueWithOverflow {
        let converted = Self::wrapped(to_kind, self.value);
        ValueWithOverflow {
            overflow: converted.value != self.value,
            value: converted,
        }
    }

    /// Bit-pattern conversion from a wide unsigned word; overflow means
    /// nonzero bits were truncated.
    pub fn convert_unsigned(to_kind: u8, word: u128) -> ValueWithOverflow {
        let value = Self::from_word(to_kind, word);
        ValueWithOverflow {
            overflow: word & !Self::word_mask(to_kind) != 0,
            value,
        }
    }
}

impl Display for IntValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.value, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn int4(v: i128) -> IntValue {
        IntValue::new(4, v).unwrap()
    }

    fn int1(v: i128) -> IntValue {
        IntValue::new(1, v).unwrap()
    }

    #[test]
    fn addition_wraps_and_reports() {
        let sum = int4(2_000_000_000).add_signed(&int4(2_000_000_000));
        assert!(sum.overflow);
        assert_eq!(sum.value.to_i128(), -294_967_296);

        let ok = int4(40).add_signed(&int4(2));
        assert!(!ok.overflow);
        assert_eq!(ok.value.to_i128(), 42);
    }

    #[test]
    fn division_semantics() {
        let q = int4(7).divide_signed(&int4(2));
        assert_eq!(q.quotient.to_i128(), 3);
        assert_eq!(q.remainder.to_i128(), 1);

        let q = int4(-7).divide_signed(&int4(2));
        assert_eq!(q.quotient.to_i128(), -3);
        assert_eq!(q.remainder.to_i128(), -1);

        let z = int4(7).divide_signed(&int4(0));
        assert!(z.division_by_zero);
        assert_eq!(z.quotient.to_i128(), 0);

        let m = IntValue::most_negative(4).divide_signed(&int4(-1));
        assert!(m.overflow);
    }

    #[test]
    fn power_cases() {
        assert_eq!(int4(2).power(&int4(10)).power.to_i128(), 1024);
        assert_eq!(int4(3).power(&int4(0)).power.to_i128(), 1);
        assert_eq!(int4(2).power(&int4(-1)).power.to_i128(), 0);
        assert_eq!(int4(-1).power(&int4(-3)).power.to_i128(), -1);
        assert_eq!(int4(1).power(&int4(-5)).power.to_i128(), 1);

        let zz = int4(0).power(&int4(0));
        assert!(zz.zero_to_zero);
        assert_eq!(zz.power.to_i128(), 1);

        let dz = int4(0).power(&int4(-2));
        assert!(dz.division_by_zero);

        let big = int1(3).power(&int1(6));
        assert!(big.overflow);
    }

    #[test]
    fn shifts() {
        assert_eq!(int4(1).ishft(3).to_i128(), 8);
        assert_eq!(int4(8).ishft(-3).to_i128(), 1);
        assert_eq!(int4(1).ishft(32).to_i128(), 0);
        assert_eq!(int4(-1).ishft(-32).to_i128(), 0);
        assert_eq!(int4(-8).shifta(1).to_i128(), -4);
        assert_eq!(int4(-8).shifta(64).to_i128(), -1);
        assert_eq!(int4(-1).shiftr(28).to_i128(), 15);
    }

    #[test]
    fn masks_and_counts() {
        assert_eq!(IntValue::maskr(4, 4).to_i128(), 15);
        assert_eq!(IntValue::maskl(1, 1).to_i128(), -128);
        assert_eq!(IntValue::maskl(4, 0).to_i128(), 0);
        assert_eq!(int4(1).leadz(), 31);
        assert_eq!(int4(0).leadz(), 32);
        assert_eq!(int4(8).trailz(), 3);
        assert_eq!(int4(-1).popcnt(), 32);
        assert!(!int4(-1).poppar());
        assert!(int4(7).poppar());
    }

    #[test]
    fn double_shifts() {
        let i = int1(0b0101_0101);
        let j = int1(0b0011_0011u8 as i8 as i128);
        assert_eq!(
            i.dshiftl(&j, 4).to_unsigned_bits(),
            0b0101_0011u128
        );
        assert_eq!(
            i.dshiftr(&j, 4).to_unsigned_bits(),
            0b0101_0011u128
        );
        assert_eq!(i.dshiftl(&j, 0), i);
        assert_eq!(i.dshiftl(&j, 8), j);
    }

    #[test]
    fn unsigned_comparison() {
        assert!(int4(-1).bgt(&int4(1)));
        assert!(int4(1).blt(&int4(-1)));
        assert!(int4(5).bge(&int4(5)));
    }

    #[test]
    fn conversions() {
        let wide = IntValue::new(8, 300).unwrap();
        let narrowed = wide.convert_signed(1);
        assert!(narrowed.overflow);
        assert_eq!(narrowed.value.to_i128(), 44);

        let fits = IntValue::new(8, -42).unwrap().convert_signed(1);
        assert!(!fits.overflow);
        assert_eq!(fits.value.to_i128(), -42);

        let boz = IntValue::convert_unsigned(1, 0x1_F0);
        assert!(boz.overflow);
        assert_eq!(boz.value.to_unsigned_bits(), 0xF0);
    }

    #[test]
    fn display() {
        assert_eq!(int4(666).to_string(), "666_4");
        assert_eq!(int4(-1).to_string(), "-1_4");
    }
}
