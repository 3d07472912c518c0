//! Procedure designators and references.

use crate::expr::Expr;
use crate::symbol::SymbolRef;
use crate::types::DynamicType;
use crate::{common_enum, common_struct};

common_struct! {
    /// A resolved reference to a standard intrinsic procedure, identified
    /// by its lowercase name.
    pub struct SpecificIntrinsic {
        pub name: String,
    }
}

impl SpecificIntrinsic {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

common_enum! {
    pub enum ProcedureDesignator {
        Intrinsic(SpecificIntrinsic),
        Symbol(SymbolRef),
    }
}

impl ProcedureDesignator {
    pub fn intrinsic_name(&self) -> Option<&str> {
        match self {
            ProcedureDesignator::Intrinsic(i) => Some(&i.name),
            ProcedureDesignator::Symbol(_) => None,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ProcedureDesignator::Intrinsic(i) => &i.name,
            ProcedureDesignator::Symbol(s) => &s.name,
        }
    }
}

common_struct! {
    pub struct ActualArgument {
        pub keyword: Option<String>,
        pub value: Expr,
    }
}

impl ActualArgument {
    pub fn new(value: Expr) -> Self {
        Self {
            keyword: None,
            value,
        }
    }

    pub fn keyword(name: impl Into<String>, value: Expr) -> Self {
        Self {
            keyword: Some(name.into()),
            value,
        }
    }
}

common_struct! {
    /// A function reference with its resolved result type.  Omitted
    /// optional arguments appear as `None` in their positions.
    pub struct FunctionRef {
        pub proc: ProcedureDesignator,
        pub args: Vec<Option<ActualArgument>>,
        pub ty: DynamicType,
    }
}

impl FunctionRef {
    pub fn new(proc: ProcedureDesignator, args: Vec<Option<ActualArgument>>, ty: DynamicType) -> Self {
        Self { proc, args, ty }
    }

    pub fn intrinsic(
        name: impl Into<String>,
        args: Vec<Option<ActualArgument>>,
        ty: DynamicType,
    ) -> Self {
        Self {
            proc: ProcedureDesignator::Intrinsic(SpecificIntrinsic::new(name)),
            args,
            ty,
        }
    }

    /// The expression of the argument at `position`, also matching an
    /// argument passed by `keyword`.
    pub fn argument(&self, position: usize, keyword: &str) -> Option<&Expr> {
        if let Some(found) = self.args.iter().flatten().find(|a| {
            a.keyword.as_deref() == Some(keyword)
        }) {
            return Some(&found.value);
        }
        match self.args.get(position) {
            Some(Some(arg)) if arg.keyword.is_none() => Some(&arg.value),
            _ => None,
        }
    }
}

common_struct! {
    /// A reference to a procedure in a context where no typed result is
    /// required (treated as typeless).
    pub struct ProcedureRef {
        pub proc: ProcedureDesignator,
        pub args: Vec<Option<ActualArgument>>,
    }
}
