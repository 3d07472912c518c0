//! Folded constant values: a scalar union plus the shaped constant carrier.

use crate::error::{Error, Result};
use crate::expr::StructureConstructor;
use crate::types::{DynamicType, TypeCategory};
use crate::value::{CharValue, ComplexValue, IntValue, LogicalValue, RealValue};
use crate::{common_enum, common_struct};
use itertools::Itertools;
use std::fmt::{Display, Formatter};

common_enum! {
    /// A single element of a constant, for any category.
    ///
    /// Derived-type elements are structure constructors whose component
    /// values are themselves constant expressions.
    pub enum Scalar {
        Integer(IntValue),
        Real(RealValue),
        Complex(ComplexValue),
        Character(CharValue),
        Logical(LogicalValue),
        Derived(Box<StructureConstructor>),
    }
}

impl Scalar {
    pub fn ty(&self) -> DynamicType {
        match self {
            Scalar::Integer(v) => DynamicType::Intrinsic {
                category: TypeCategory::Integer,
                kind: v.kind(),
            },
            Scalar::Real(v) => DynamicType::Intrinsic {
                category: TypeCategory::Real,
                kind: v.kind(),
            },
            Scalar::Complex(v) => DynamicType::Intrinsic {
                category: TypeCategory::Complex,
                kind: v.kind(),
            },
            Scalar::Character(v) => DynamicType::Intrinsic {
                category: TypeCategory::Character,
                kind: v.kind(),
            },
            Scalar::Logical(v) => DynamicType::Intrinsic {
                category: TypeCategory::Logical,
                kind: v.kind(),
            },
            Scalar::Derived(s) => DynamicType::Derived(s.spec.clone()),
        }
    }

    pub fn char_len(&self) -> Option<i64> {
        match self {
            Scalar::Character(v) => Some(v.len()),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<&IntValue> {
        match self {
            Scalar::Integer(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<&RealValue> {
        match self {
            Scalar::Real(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_complex(&self) -> Option<&ComplexValue> {
        match self {
            Scalar::Complex(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_character(&self) -> Option<&CharValue> {
        match self {
            Scalar::Character(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_logical(&self) -> Option<&LogicalValue> {
        match self {
            Scalar::Logical(v) => Some(v),
            _ => None,
        }
    }
}

impl Display for Scalar {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Scalar::Integer(v) => Display::fmt(v, f),
            Scalar::Real(v) => Display::fmt(v, f),
            Scalar::Complex(v) => Display::fmt(v, f),
            Scalar::Character(v) => Display::fmt(v, f),
            Scalar::Logical(v) => Display::fmt(v, f),
            Scalar::Derived(s) => Display::fmt(s, f),
        }
    }
}

impl From<IntValue> for Scalar {
    fn from(v: IntValue) -> Self {
        Scalar::Integer(v)
    }
}

impl From<RealValue> for Scalar {
    fn from(v: RealValue) -> Self {
        Scalar::Real(v)
    }
}

impl From<ComplexValue> for Scalar {
    fn from(v: ComplexValue) -> Self {
        Scalar::Complex(v)
    }
}

impl From<CharValue> for Scalar {
    fn from(v: CharValue) -> Self {
        Scalar::Character(v)
    }
}

impl From<LogicalValue> for Scalar {
    fn from(v: LogicalValue) -> Self {
        Scalar::Logical(v)
    }
}

common_struct! {
    /// A constant of any rank: a shape plus its elements linearized in
    /// Fortran array element order (first subscript varies fastest).
    pub struct Constant {
        ty: DynamicType,
        shape: Vec<i64>,
        /// Character length; `None` for other categories.
        len: Option<i64>,
        elements: Vec<Scalar>,
    }
}

fn shape_size(shape: &[i64]) -> Option<usize> {
    let mut product: i64 = 1;
    for &extent in shape {
        if extent < 0 {
            return None;
        }
        product = product.checked_mul(extent)?;
    }
    usize::try_from(product).ok()
}

impl Constant {
    pub fn scalar(value: Scalar) -> Self {
        Self {
            ty: value.ty(),
            shape: Vec::new(),
            len: value.char_len(),
            elements: vec![value],
        }
    }

    /// Build a shaped constant.  The element count must equal the product
    /// of the extents; character constants take their length from the
    /// first element.
    pub fn array(ty: DynamicType, shape: Vec<i64>, elements: Vec<Scalar>) -> Result<Self> {
        let len = elements.first().and_then(Scalar::char_len);
        Self::array_with_length(ty, shape, elements, len)
    }

    pub fn array_with_length(
        ty: DynamicType,
        shape: Vec<i64>,
        elements: Vec<Scalar>,
        len: Option<i64>,
    ) -> Result<Self> {
        match shape_size(&shape) {
            Some(size) if size == elements.len() => Ok(Self {
                ty,
                shape,
                len,
                elements,
            }),
            _ => Err(Error::ShapeMismatch {
                elements: elements.len(),
                shape,
            }),
        }
    }

    pub fn ty(&self) -> &DynamicType {
        &self.ty
    }

    pub fn category(&self) -> Option<TypeCategory> {
        self.ty.category()
    }

    pub fn kind(&self) -> Option<u8> {
        self.ty.kind()
    }

    pub fn shape(&self) -> &[i64] {
        &self.shape
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn size(&self) -> usize {
        self.elements.len()
    }

    /// Character length, when the category is character.
    pub fn len(&self) -> Option<i64> {
        self.len
    }

    pub fn is_scalar(&self) -> bool {
        self.shape.is_empty()
    }

    pub fn scalar_value(&self) -> Option<&Scalar> {
        if self.is_scalar() {
            self.elements.first()
        } else {
            None
        }
    }

    pub fn elements(&self) -> &[Scalar] {
        &self.elements
    }

    pub fn into_elements(self) -> Vec<Scalar> {
        self.elements
    }

    /// The same elements under a different shape of equal total size.
    pub fn with_shape(self, shape: Vec<i64>) -> Result<Self> {
        Self::array_with_length(self.ty, shape, self.elements, self.len)
    }
}

impl Display for Constant {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if let Some(value) = self.scalar_value() {
            return Display::fmt(value, f);
        }
        if self.rank() == 1 {
            write!(f, "[{}::{}]", self.ty, self.elements.iter().format(","))
        } else {
            write!(
                f,
                "reshape([{}::{}],shape=[{}])",
                self.ty,
                self.elements.iter().format(","),
                self.shape.iter().format(",")
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn int4(v: i128) -> Scalar {
        Scalar::Integer(IntValue::new(4, v).unwrap())
    }

    #[test]
    fn shape_element_agreement() {
        let ok = Constant::array(
            DynamicType::integer(4).unwrap(),
            vec![2, 2],
            vec![int4(1), int4(2), int4(3), int4(4)],
        );
        assert!(ok.is_ok());

        let bad = Constant::array(
            DynamicType::integer(4).unwrap(),
            vec![3],
            vec![int4(1), int4(2)],
        );
        assert!(bad.is_err());
    }

    #[test]
    fn scalar_constant() {
        let c = Constant::scalar(int4(7));
        assert!(c.is_scalar());
        assert_eq!(c.rank(), 0);
        assert_eq!(c.size(), 1);
        assert_eq!(c.to_string(), "7_4");
    }

    #[test]
    fn character_length() {
        let c = Constant::scalar(Scalar::Character(
            crate::value::CharValue::from_str(1, "ABCD").unwrap(),
        ));
        assert_eq!(c.len(), Some(4));
    }

    #[test]
    fn reshape_display() {
        let c = Constant::array(
            DynamicType::integer(4).unwrap(),
            vec![2, 2],
            vec![int4(1), int4(2), int4(3), int4(4)],
        )
        .unwrap();
        assert_eq!(
            c.to_string(),
            "reshape([Integer(4)::1_4,2_4,3_4,4_4],shape=[2,2])"
        );
    }
}
