//! Folding of designator structure: subscripts, bounds, cosubscripts, and
//! substring limits are rewritten in place.  The designator itself denotes
//! a variable and never becomes a value here, with one exception handled
//! by the character folder: a substring of a literal with constant bounds.

use crate::context::FoldingContext;
use crate::fold::Fold;
use feval_core::expr::{
    ArrayRef, ArrayRefBase, CoarrayRef, ComplexPart, Component, DataRef, Designator, Substring,
    SubstringParent, Subscript, Triplet,
};

pub(crate) fn fold_triplet(ctx: &mut FoldingContext, triplet: Triplet) -> Triplet {
    Triplet {
        lower: triplet.lower.map(|e| Box::new((*e).fold(ctx))),
        upper: triplet.upper.map(|e| Box::new((*e).fold(ctx))),
        stride: Box::new((*triplet.stride).fold(ctx)),
    }
}

pub(crate) fn fold_subscript(ctx: &mut FoldingContext, subscript: Subscript) -> Subscript {
    match subscript {
        Subscript::Expr(e) => Subscript::Expr(Box::new((*e).fold(ctx))),
        Subscript::Triplet(t) => Subscript::Triplet(fold_triplet(ctx, t)),
    }
}

pub(crate) fn fold_component(ctx: &mut FoldingContext, component: Component) -> Component {
    Component {
        base: Box::new(fold_data_ref(ctx, *component.base)),
        symbol: component.symbol,
    }
}

pub(crate) fn fold_array_ref(ctx: &mut FoldingContext, array_ref: ArrayRef) -> ArrayRef {
    ArrayRef {
        base: match array_ref.base {
            ArrayRefBase::Symbol(s) => ArrayRefBase::Symbol(s),
            ArrayRefBase::Component(c) => ArrayRefBase::Component(fold_component(ctx, c)),
        },
        subscripts: array_ref
            .subscripts
            .into_iter()
            .map(|s| fold_subscript(ctx, s))
            .collect(),
    }
}

pub(crate) fn fold_coarray_ref(ctx: &mut FoldingContext, coarray: CoarrayRef) -> CoarrayRef {
    CoarrayRef {
        base: coarray.base,
        subscripts: coarray
            .subscripts
            .into_iter()
            .map(|s| fold_subscript(ctx, s))
            .collect(),
        cosubscripts: coarray
            .cosubscripts
            .into_iter()
            .map(|e| e.fold(ctx))
            .collect(),
        stat: coarray.stat.map(|e| Box::new((*e).fold(ctx))),
        team: coarray.team.map(|e| Box::new((*e).fold(ctx))),
        team_is_team_number: coarray.team_is_team_number,
    }
}

pub(crate) fn fold_data_ref(ctx: &mut FoldingContext, data_ref: DataRef) -> DataRef {
    match data_ref {
        DataRef::Symbol(s) => DataRef::Symbol(s),
        DataRef::Component(c) => DataRef::Component(fold_component(ctx, c)),
        DataRef::ArrayRef(a) => DataRef::ArrayRef(fold_array_ref(ctx, a)),
        DataRef::CoarrayRef(c) => DataRef::CoarrayRef(fold_coarray_ref(ctx, c)),
    }
}

pub(crate) fn fold_substring(ctx: &mut FoldingContext, substring: Substring) -> Substring {
    Substring {
        parent: match substring.parent {
            SubstringParent::DataRef(d) => SubstringParent::DataRef(Box::new(fold_data_ref(ctx, *d))),
            literal @ SubstringParent::Literal(_) => literal,
        },
        lower: substring.lower.map(|e| Box::new((*e).fold(ctx))),
        upper: substring.upper.map(|e| Box::new((*e).fold(ctx))),
    }
}

pub(crate) fn fold_complex_part(ctx: &mut FoldingContext, part: ComplexPart) -> ComplexPart {
    ComplexPart {
        complex: fold_data_ref(ctx, part.complex),
        part: part.part,
    }
}

pub(crate) fn fold_designator(ctx: &mut FoldingContext, designator: Designator) -> Designator {
    match designator {
        Designator::Symbol(s) => Designator::Symbol(s),
        Designator::Component(c) => Designator::Component(fold_component(ctx, c)),
        Designator::ArrayRef(a) => Designator::ArrayRef(fold_array_ref(ctx, a)),
        Designator::CoarrayRef(c) => Designator::CoarrayRef(fold_coarray_ref(ctx, c)),
        Designator::Substring(s) => Designator::Substring(fold_substring(ctx, s)),
        Designator::ComplexPart(p) => Designator::ComplexPart(fold_complex_part(ctx, p)),
    }
}
