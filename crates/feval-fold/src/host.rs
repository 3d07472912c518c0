//! Host math adapters for elementary intrinsic folding.
//!
//! The folder never calls the host directly; it looks procedures up here
//! by name and signature.  Entries the host cannot supply (Bessel
//! functions, the error and gamma families, most complex transcendentals)
//! are simply absent, and the folder reports that the call cannot be
//! folded on this host.

use once_cell::sync::Lazy;
use std::collections::HashMap;

pub type RealUnary = fn(f64) -> f64;
pub type RealBinary = fn(f64, f64) -> f64;
pub type RealIntReal = fn(i32, f64) -> f64;
pub type RealFromComplex = fn(f64, f64) -> f64;
pub type ComplexUnary = fn(f64, f64) -> (f64, f64);

#[derive(Debug, Clone, Default)]
pub struct HostIntrinsicLibrary {
    real_unary: HashMap<&'static str, RealUnary>,
    real_binary: HashMap<&'static str, RealBinary>,
    real_int_real: HashMap<&'static str, RealIntReal>,
    real_from_complex: HashMap<&'static str, RealFromComplex>,
    complex_unary: HashMap<&'static str, ComplexUnary>,
}

fn complex_exp(re: f64, im: f64) -> (f64, f64) {
    let scale = re.exp();
    (scale * im.cos(), scale * im.sin())
}

fn complex_log(re: f64, im: f64) -> (f64, f64) {
    (re.hypot(im).ln(), im.atan2(re))
}

fn complex_sqrt(re: f64, im: f64) -> (f64, f64) {
    let modulus = re.hypot(im);
    if modulus == 0.0 {
        return (0.0, 0.0);
    }
    let part = ((modulus + re) / 2.0).sqrt();
    let other = ((modulus - re) / 2.0).sqrt();
    (part, if im < 0.0 { -other } else { other })
}

static HOST_PROCEDURES: Lazy<HostIntrinsicLibrary> = Lazy::new(|| {
    let mut library = HostIntrinsicLibrary::default();
    let unary: &[(&str, RealUnary)] = &[
        ("acos", f64::acos),
        ("acosh", f64::acosh),
        ("asin", f64::asin),
        ("asinh", f64::asinh),
        ("atan", f64::atan),
        ("atanh", f64::atanh),
        ("cos", f64::cos),
        ("cosh", f64::cosh),
        ("exp", f64::exp),
        ("log", f64::ln),
        ("log10", f64::log10),
        ("sin", f64::sin),
        ("sinh", f64::sinh),
        ("sqrt", f64::sqrt),
        ("tan", f64::tan),
        ("tanh", f64::tanh),
    ];
    for &(name, f) in unary {
        library.real_unary.insert(name, f);
    }
    // Two-argument ATAN is the host's atan2.
    library.real_binary.insert("atan", f64::atan2);
    library.real_binary.insert("hypot", f64::hypot);
    library.real_binary.insert("mod", |a, p| a % p);
    library.real_from_complex.insert("abs", f64::hypot);
    library.complex_unary.insert("exp", complex_exp);
    library.complex_unary.insert("log", complex_log);
    library.complex_unary.insert("sqrt", complex_sqrt);
    library
});

impl HostIntrinsicLibrary {
    /// The adapters this host's `f64` provides.
    pub fn host_default() -> Self {
        HOST_PROCEDURES.clone()
    }

    pub fn real_unary(&self, name: &str) -> Option<RealUnary> {
        self.real_unary.get(name).copied()
    }

    pub fn real_binary(&self, name: &str) -> Option<RealBinary> {
        self.real_binary.get(name).copied()
    }

    pub fn real_int_real(&self, name: &str) -> Option<RealIntReal> {
        self.real_int_real.get(name).copied()
    }

    pub fn real_from_complex(&self, name: &str) -> Option<RealFromComplex> {
        self.real_from_complex.get(name).copied()
    }

    pub fn complex_unary(&self, name: &str) -> Option<ComplexUnary> {
        self.complex_unary.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_library_contents() {
        let library = HostIntrinsicLibrary::host_default();
        assert!(library.real_unary("sqrt").is_some());
        assert!(library.real_binary("atan").is_some());
        // No Bessel functions on this host.
        assert!(library.real_int_real("bessel_jn").is_none());
        assert!(library.real_unary("bessel_j0").is_none());
        assert!(library.real_unary("erf").is_none());
    }

    #[test]
    fn complex_adapters() {
        let library = HostIntrinsicLibrary::host_default();
        let sqrt = library.complex_unary("sqrt").unwrap();
        let (re, im) = sqrt(-4.0, 0.0);
        assert!(re.abs() < 1e-12);
        assert!((im - 2.0).abs() < 1e-12);
    }
}
