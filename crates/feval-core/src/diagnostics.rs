//! Structured messages emitted while folding.
//!
//! The folder never fails; everything it has to report goes through an
//! append-only [`Messages`] sink owned by the folding context.  Ordering is
//! significant: messages appear in the order the folder discovers them,
//! which is post-order over the expression tree.

use crate::{common_enum, common_struct};
use std::fmt::{Display, Formatter};

common_enum! {
    #[derive(Copy)]
    pub enum Severity {
        /// Stops further folding of the enclosing subtree.
        Error,
        /// Enabled warning, e.g. arithmetic overflow.
        Warning,
        Info,
    }
}

common_struct! {
    pub struct Message {
        pub severity: Severity,
        pub text: String,
    }
}

impl Display for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.severity {
            Severity::Error => write!(f, "error: {}", self.text),
            Severity::Warning => write!(f, "warning: {}", self.text),
            Severity::Info => write!(f, "info: {}", self.text),
        }
    }
}

/// Append-only message sink.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Messages {
    messages: Vec<Message>,
}

impl Messages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn say(&mut self, severity: Severity, text: impl Into<String>) {
        self.messages.push(Message {
            severity,
            text: text.into(),
        });
    }

    pub fn say_error(&mut self, text: impl Into<String>) {
        self.say(Severity::Error, text);
    }

    pub fn say_warning(&mut self, text: impl Into<String>) {
        self.say(Severity::Warning, text);
    }

    pub fn say_info(&mut self, text: impl Into<String>) {
        self.say(Severity::Info, text);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn any_errors(&self) -> bool {
        self.messages
            .iter()
            .any(|m| m.severity == Severity::Error)
    }

    /// Message texts, in emission order.  Convenient for assertions.
    pub fn texts(&self) -> Vec<&str> {
        self.messages.iter().map(|m| m.text.as_str()).collect()
    }
}

impl<'a> IntoIterator for &'a Messages {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;
    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}
