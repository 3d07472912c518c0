//! The folding context: diagnostics sink, numeric environment, implied-DO
//! index bindings, and optional host/PDT hooks.
//!
//! A context is single-threaded and re-entrant; independent contexts may
//! run on separate threads.  The folder's only side effects are appending
//! messages here and the balanced implied-DO mutations.

use crate::host::HostIntrinsicLibrary;
use feval_core::diagnostics::Messages;
use feval_core::types::DerivedTypeSpec;
use feval_core::value::Rounding;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct FoldingContext {
    messages: Messages,
    rounding: Rounding,
    flush_subnormals_to_zero: bool,
    pdt_instance: Option<DerivedTypeSpec>,
    host_library: Option<HostIntrinsicLibrary>,
    implied_do: HashMap<String, i64>,
}

impl FoldingContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rounding(mut self, rounding: Rounding) -> Self {
        self.rounding = rounding;
        self
    }

    pub fn with_flush_subnormals_to_zero(mut self, flush: bool) -> Self {
        self.flush_subnormals_to_zero = flush;
        self
    }

    pub fn with_host_library(mut self, library: HostIntrinsicLibrary) -> Self {
        self.host_library = Some(library);
        self
    }

    pub fn with_pdt_instance(mut self, instance: DerivedTypeSpec) -> Self {
        self.pdt_instance = Some(instance);
        self
    }

    pub fn messages(&self) -> &Messages {
        &self.messages
    }

    pub fn messages_mut(&mut self) -> &mut Messages {
        &mut self.messages
    }

    pub fn rounding(&self) -> Rounding {
        self.rounding
    }

    pub fn flush_subnormals_to_zero(&self) -> bool {
        self.flush_subnormals_to_zero
    }

    pub fn host_library(&self) -> Option<&HostIntrinsicLibrary> {
        self.host_library.as_ref()
    }

    pub fn pdt_instance(&self) -> Option<&DerivedTypeSpec> {
        self.pdt_instance.as_ref()
    }

    /// Bind an implied-DO index for the duration of a body walk.  Calls
    /// must be balanced with [`FoldingContext::end_implied_do`]; the array
    /// constructor folder is the only caller.
    pub fn start_implied_do(&mut self, name: &str, value: i64) {
        self.implied_do.insert(name.to_string(), value);
    }

    pub fn update_implied_do(&mut self, name: &str, value: i64) {
        if let Some(slot) = self.implied_do.get_mut(name) {
            *slot = value;
        }
    }

    pub fn end_implied_do(&mut self, name: &str) {
        self.implied_do.remove(name);
    }

    pub fn get_implied_do(&self, name: &str) -> Option<i64> {
        self.implied_do.get(name).copied()
    }
}
