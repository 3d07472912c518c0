//! Designators: references to (parts of) variables.
//!
//! A designator denotes a symbol, possibly narrowed by component selection,
//! array subscripts, cosubscripts, substring bounds, or complex part
//! selection.  Designators carry no values; the folder only rewrites the
//! expressions embedded in them.

use crate::expr::IntegerExpr;
use crate::symbol::SymbolRef;
use crate::types::{DynamicType, TypeCategory};
use crate::value::CharValue;
use crate::{common_enum, common_struct};

common_struct! {
    /// A component selection, `base%symbol`.
    pub struct Component {
        pub base: Box<DataRef>,
        pub symbol: SymbolRef,
    }
}

impl Component {
    pub fn ty(&self) -> DynamicType {
        self.symbol.ty.clone()
    }

    pub fn rank(&self) -> usize {
        if self.symbol.rank() > 0 {
            self.symbol.rank()
        } else {
            self.base.rank()
        }
    }
}

common_struct! {
    /// A subscript triplet `lower:upper:stride`.  Omitted bounds default to
    /// the array's declared bounds; an omitted stride is built as 1.
    pub struct Triplet {
        pub lower: Option<Box<IntegerExpr>>,
        pub upper: Option<Box<IntegerExpr>>,
        pub stride: Box<IntegerExpr>,
    }
}

common_enum! {
    pub enum Subscript {
        /// A scalar subscript, or a rank-1 vector subscript.
        Expr(Box<IntegerExpr>),
        Triplet(Triplet),
    }
}

impl Subscript {
    /// How many dimensions this subscript contributes to the section.
    pub fn rank(&self) -> usize {
        match self {
            Subscript::Expr(e) => e.rank(),
            Subscript::Triplet(_) => 1,
        }
    }
}

common_enum! {
    pub enum ArrayRefBase {
        Symbol(SymbolRef),
        Component(Component),
    }
}

impl ArrayRefBase {
    pub fn ty(&self) -> DynamicType {
        match self {
            ArrayRefBase::Symbol(s) => s.ty.clone(),
            ArrayRefBase::Component(c) => c.ty(),
        }
    }

    pub fn last_symbol(&self) -> &SymbolRef {
        match self {
            ArrayRefBase::Symbol(s) => s,
            ArrayRefBase::Component(c) => &c.symbol,
        }
    }
}

common_struct! {
    pub struct ArrayRef {
        pub base: ArrayRefBase,
        pub subscripts: Vec<Subscript>,
    }
}

impl ArrayRef {
    pub fn ty(&self) -> DynamicType {
        self.base.ty()
    }

    pub fn rank(&self) -> usize {
        self.subscripts.iter().map(Subscript::rank).sum()
    }
}

common_struct! {
    /// An image-qualified reference, `base(subscripts)[cosubscripts]`.
    pub struct CoarrayRef {
        pub base: SymbolRef,
        pub subscripts: Vec<Subscript>,
        pub cosubscripts: Vec<IntegerExpr>,
        pub stat: Option<Box<IntegerExpr>>,
        pub team: Option<Box<IntegerExpr>>,
        pub team_is_team_number: bool,
    }
}

impl CoarrayRef {
    pub fn ty(&self) -> DynamicType {
        self.base.ty.clone()
    }

    pub fn rank(&self) -> usize {
        self.subscripts.iter().map(Subscript::rank).sum()
    }
}

common_enum! {
    pub enum DataRef {
        Symbol(SymbolRef),
        Component(Component),
        ArrayRef(ArrayRef),
        CoarrayRef(CoarrayRef),
    }
}

impl DataRef {
    pub fn ty(&self) -> DynamicType {
        match self {
            DataRef::Symbol(s) => s.ty.clone(),
            DataRef::Component(c) => c.ty(),
            DataRef::ArrayRef(a) => a.ty(),
            DataRef::CoarrayRef(c) => c.ty(),
        }
    }

    pub fn rank(&self) -> usize {
        match self {
            DataRef::Symbol(s) => s.rank(),
            DataRef::Component(c) => c.rank(),
            DataRef::ArrayRef(a) => a.rank(),
            DataRef::CoarrayRef(c) => c.rank(),
        }
    }

    pub fn last_symbol(&self) -> &SymbolRef {
        match self {
            DataRef::Symbol(s) => s,
            DataRef::Component(c) => &c.symbol,
            DataRef::ArrayRef(a) => a.base.last_symbol(),
            DataRef::CoarrayRef(c) => &c.base,
        }
    }
}

common_enum! {
    pub enum SubstringParent {
        DataRef(Box<DataRef>),
        /// A character literal; the only parent a substring can fold over.
        Literal(CharValue),
    }
}

common_struct! {
    /// `parent(lower:upper)` over a character base.
    pub struct Substring {
        pub parent: SubstringParent,
        pub lower: Option<Box<IntegerExpr>>,
        pub upper: Option<Box<IntegerExpr>>,
    }
}

impl Substring {
    pub fn kind(&self) -> u8 {
        match &self.parent {
            SubstringParent::DataRef(d) => d.ty().kind().unwrap_or(1),
            SubstringParent::Literal(c) => c.kind(),
        }
    }

    pub fn rank(&self) -> usize {
        match &self.parent {
            SubstringParent::DataRef(d) => d.rank(),
            SubstringParent::Literal(_) => 0,
        }
    }
}

common_enum! {
    #[derive(Copy)]
    pub enum ComplexPartKind {
        Re,
        Im,
    }
}

common_struct! {
    /// `z%RE` or `z%IM` of a complex base.
    pub struct ComplexPart {
        pub complex: DataRef,
        pub part: ComplexPartKind,
    }
}

impl ComplexPart {
    pub fn kind(&self) -> u8 {
        self.complex.ty().kind().unwrap_or(4)
    }

    pub fn rank(&self) -> usize {
        self.complex.rank()
    }
}

common_enum! {
    pub enum Designator {
        Symbol(SymbolRef),
        Component(Component),
        ArrayRef(ArrayRef),
        CoarrayRef(CoarrayRef),
        Substring(Substring),
        ComplexPart(ComplexPart),
    }
}

impl Designator {
    pub fn ty(&self) -> DynamicType {
        match self {
            Designator::Symbol(s) => s.ty.clone(),
            Designator::Component(c) => c.ty(),
            Designator::ArrayRef(a) => a.ty(),
            Designator::CoarrayRef(c) => c.ty(),
            Designator::Substring(s) => DynamicType::Intrinsic {
                category: TypeCategory::Character,
                kind: s.kind(),
            },
            Designator::ComplexPart(p) => DynamicType::Intrinsic {
                category: TypeCategory::Real,
                kind: p.kind(),
            },
        }
    }

    pub fn rank(&self) -> usize {
        match self {
            Designator::Symbol(s) => s.rank(),
            Designator::Component(c) => c.rank(),
            Designator::ArrayRef(a) => a.rank(),
            Designator::CoarrayRef(c) => c.rank(),
            Designator::Substring(s) => s.rank(),
            Designator::ComplexPart(p) => p.rank(),
        }
    }

    pub fn last_symbol(&self) -> Option<&SymbolRef> {
        match self {
            Designator::Symbol(s) => Some(s),
            Designator::Component(c) => Some(&c.symbol),
            Designator::ArrayRef(a) => Some(a.base.last_symbol()),
            Designator::CoarrayRef(c) => Some(&c.base),
            Designator::Substring(s) => match &s.parent {
                SubstringParent::DataRef(d) => Some(d.last_symbol()),
                SubstringParent::Literal(_) => None,
            },
            Designator::ComplexPart(p) => Some(p.complex.last_symbol()),
        }
    }
}
