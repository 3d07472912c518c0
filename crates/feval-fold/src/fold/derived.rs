//! Folding of derived-type expressions.  A structure constructor folds its
//! component values and becomes a scalar derived constant.

use crate::context::FoldingContext;
use crate::fold::variable::fold_designator;
use crate::fold::{fold_array_constructor, intrinsics, Fold};
use feval_core::constant::{Constant, Scalar};
use feval_core::expr::{DerivedExpr, StructureConstructor};

impl Fold for DerivedExpr {
    fn fold(self, ctx: &mut FoldingContext) -> Self {
        match self {
            DerivedExpr::Constant(c) => DerivedExpr::Constant(c),
            DerivedExpr::ArrayConstructor(a) => fold_array_constructor(ctx, *a),
            DerivedExpr::StructureConstructor(s) => fold_structure_constructor(ctx, *s),
            DerivedExpr::Designator(d) => {
                DerivedExpr::Designator(Box::new(fold_designator(ctx, *d)))
            }
            DerivedExpr::FunctionRef(mut f) => {
                intrinsics::fold_arguments(ctx, &mut f);
                DerivedExpr::FunctionRef(f)
            }
        }
    }
}

fn fold_structure_constructor(
    ctx: &mut FoldingContext,
    structure: StructureConstructor,
) -> DerivedExpr {
    let mut folded = StructureConstructor::new(structure.spec);
    for (symbol, value) in structure.values {
        folded.add(symbol, value.fold(ctx));
    }
    DerivedExpr::Constant(Constant::scalar(Scalar::Derived(Box::new(folded))))
}
