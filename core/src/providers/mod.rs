pub mod completion;
pub mod definition;
pub mod hover;
pub mod outline;
pub mod references;

#[cfg(test)]
mod provider_test;

use serde::Serialize;

use crate::token::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CompletionKind {
    Command,
    Function,
    Variable,
    Label,
    Global,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletionItem {
    pub label: String,
    pub kind: CompletionKind,
    pub detail: Option<String>,
    pub documentation: Option<String>,
    /// Text to insert when it differs from the label (sigil already typed).
    pub insert_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoverText {
    pub markdown: String,
    pub span: Option<Span>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutlineEntry {
    pub name: String,
    pub detail: Option<String>,
    /// Full extent of the entry point, up to the next level-0 label.
    pub span: Span,
    pub selection_span: Span,
}

/// Result of a cancellable query. Cancellation is prompt: the query
/// returns instead of blocking the update that supersedes it.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult<T> {
    Complete(T),
    Cancelled,
}

impl<T> QueryResult<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            QueryResult::Complete(v) => Some(v),
            QueryResult::Cancelled => None,
        }
    }
}
