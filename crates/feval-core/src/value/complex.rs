//! Complex values as pairs of same-kind reals.

use crate::common_struct;
use crate::error::{Error, Result};
use crate::value::real::{RealFlags, RealValue, Rounding, ValueWithRealFlags};
use std::fmt::{Display, Formatter};

common_struct! {
    #[derive(Copy, Hash)]
    pub struct ComplexValue {
        re: RealValue,
        im: RealValue,
    }
}

impl ComplexValue {
    pub fn new(re: RealValue, im: RealValue) -> Result<Self> {
        if re.kind() != im.kind() {
            return Err(Error::OperandMismatch(format!(
                "complex parts must have the same kind, got {} and {}",
                re.kind(),
                im.kind()
            )));
        }
        Ok(Self { re, im })
    }

    pub(crate) fn pair(re: RealValue, im: RealValue) -> Self {
        debug_assert_eq!(re.kind(), im.kind());
        Self { re, im }
    }

    /// Pair two parts whose kinds are already known to agree, as when both
    /// come out of the same folded operation.
    pub fn from_parts(re: RealValue, im: RealValue) -> Self {
        debug_assert_eq!(re.kind(), im.kind());
        Self { re, im }
    }

    pub fn flush_subnormal_to_zero(&self) -> ComplexValue {
        Self {
            re: self.re.flush_subnormal_to_zero(),
            im: self.im.flush_subnormal_to_zero(),
        }
    }

    pub fn zero(kind: u8) -> Self {
        Self {
            re: RealValue::zero(kind),
            im: RealValue::zero(kind),
        }
    }

    pub fn kind(&self) -> u8 {
        self.re.kind()
    }

    /// REAL(z)
    pub fn real_part(&self) -> RealValue {
        self.re
    }

    /// AIMAG(z)
    pub fn aimag(&self) -> RealValue {
        self.im
    }

    /// CONJG(z)
    pub fn conjg(&self) -> ComplexValue {
        Self {
            re: self.re,
            im: self.im.negate(),
        }
    }

    pub fn negate(&self) -> ComplexValue {
        Self {
            re: self.re.negate(),
            im: self.im.negate(),
        }
    }

    pub fn add(&self, rhs: &ComplexValue, rounding: Rounding) -> ValueWithRealFlags<ComplexValue> {
        let re = self.re.add(&rhs.re, rounding);
        let im = self.im.add(&rhs.im, rounding);
        let mut flags = re.flags;
        flags.merge(im.flags);
        ValueWithRealFlags {
            value: Self::pair(re.value, im.value),
            flags,
        }
    }

    pub fn subtract(
        &self,
        rhs: &ComplexValue,
        rounding: Rounding,
    ) -> ValueWithRealFlags<ComplexValue> {
        self.add(&rhs.negate(), rounding)
    }

    pub fn multiply(
        &self,
        rhs: &ComplexValue,
        rounding: Rounding,
    ) -> ValueWithRealFlags<ComplexValue> {
        let mut flags = RealFlags::default();
        let ac = self.re.multiply(&rhs.re, rounding);
        let bd = self.im.multiply(&rhs.im, rounding);
        let ad = self.re.multiply(&rhs.im, rounding);
        let bc = self.im.multiply(&rhs.re, rounding);
        let re = ac.value.subtract(&bd.value, rounding);
        let im = ad.value.add(&bc.value, rounding);
        for part in [&ac.flags, &bd.flags, &ad.flags, &bc.flags, &re.flags, &im.flags] {
            flags.merge(*part);
        }
        ValueWithRealFlags {
            value: Self::pair(re.value, im.value),
            flags,
        }
    }

    pub fn divide(
        &self,
        rhs: &ComplexValue,
        rounding: Rounding,
    ) -> ValueWithRealFlags<ComplexValue> {
        // Smith's algorithm: scale by the larger denominator component to
        // dodge premature overflow.
        let mut flags = RealFlags::default();
        let (c, d) = (rhs.re, rhs.im);
        let swap = c.abs().to_f64() < d.abs().to_f64();
        let (p, q) = if swap { (d, c) } else { (c, d) };
        let r = q.divide(&p, rounding);
        let qr = q.multiply(&r.value, rounding);
        let den = p.add(&qr.value, rounding);
        // numerators: (a + b*r) and (b - a*r), with a/b swapped to match
        let (a, b) = if swap {
            (self.im, self.re)
        } else {
            (self.re, self.im)
        };
        let br = b.multiply(&r.value, rounding);
        let re_num = a.add(&br.value, rounding);
        let ar = a.multiply(&r.value, rounding);
        let im_num = b.subtract(&ar.value, rounding);
        let re = re_num.value.divide(&den.value, rounding);
        let im_raw = im_num.value.divide(&den.value, rounding);
        let im = if swap { im_raw.value.negate() } else { im_raw.value };
        for part in [
            &r.flags,
            &qr.flags,
            &den.flags,
            &br.flags,
            &re_num.flags,
            &ar.flags,
            &im_num.flags,
            &re.flags,
            &im_raw.flags,
        ] {
            flags.merge(*part);
        }
        ValueWithRealFlags {
            value: Self::pair(re.value, im),
            flags,
        }
    }
}

impl Display for ComplexValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})", self.re, self.im)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn z(re: f64, im: f64) -> ComplexValue {
        ComplexValue::new(
            RealValue::new(8, re).unwrap(),
            RealValue::new(8, im).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn parts_and_conjugate() {
        let v = z(3.0, -4.0);
        assert_eq!(v.real_part().to_f64(), 3.0);
        assert_eq!(v.aimag().to_f64(), -4.0);
        assert_eq!(v.conjg(), z(3.0, 4.0));
    }

    #[test]
    fn multiplication() {
        // (1+2i)(3+4i) = -5+10i
        let p = z(1.0, 2.0).multiply(&z(3.0, 4.0), Rounding::ToNearest);
        assert_eq!(p.value, z(-5.0, 10.0));
        assert!(p.flags.empty());
    }

    #[test]
    fn division() {
        // (-5+10i)/(3+4i) = 1+2i
        let q = z(-5.0, 10.0).divide(&z(3.0, 4.0), Rounding::ToNearest);
        assert_eq!(q.value, z(1.0, 2.0));
    }

    #[test]
    fn kind_mismatch_rejected() {
        let err = ComplexValue::new(
            RealValue::new(4, 1.0).unwrap(),
            RealValue::new(8, 1.0).unwrap(),
        );
        assert!(err.is_err());
    }
}
