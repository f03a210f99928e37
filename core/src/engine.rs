use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::diag::Diagnostic;
use crate::providers::{self, CompletionItem, HoverText, OutlineEntry, QueryResult};
use crate::store::{self, DocumentStore, Snapshot};
use crate::token::Span;

/// Configuration consumed by the analysis core.
#[derive(Debug, Clone, Copy)]
pub struct AnalyzerConfig {
    /// Bounds subscript retention in the index; at least 1.
    pub max_global_depth: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self { max_global_depth: 10 }
    }
}

impl AnalyzerConfig {
    fn clamped(mut self) -> Self {
        self.max_global_depth = self.max_global_depth.max(1);
        self
    }
}

/// The synchronous request surface over the document store. One logical
/// writer per uri (the transport layer delivers edits for a uri in
/// order); queries are read-only, run against the latest published
/// snapshot, and never block on an in-flight reanalysis.
#[derive(Default)]
pub struct Analyzer {
    store: DocumentStore,
    config: Mutex<AnalyzerConfig>,
}

impl Analyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: AnalyzerConfig) -> Self {
        Self {
            store: DocumentStore::new(),
            config: Mutex::new(config.clamped()),
        }
    }

    pub fn set_config(&self, config: AnalyzerConfig) {
        *self.config.lock().unwrap() = config.clamped();
    }

    pub fn config(&self) -> AnalyzerConfig {
        *self.config.lock().unwrap()
    }

    /// Full pipeline over the given text; publishes the snapshot and
    /// returns its diagnostics. Used on open and on every change.
    pub fn analyze(&self, uri: &str, text: &str, version: i32) -> Vec<Diagnostic> {
        let depth = self.config().max_global_depth;
        let snapshot = store::analyze_text(uri, text, version, depth);
        let published = self.store.publish(snapshot);
        debug!(uri, version, diagnostics = published.diagnostics.len(), "analyzed");
        published.diagnostics.clone()
    }

    pub fn close(&self, uri: &str) {
        self.store.close(uri);
    }

    pub fn snapshot(&self, uri: &str) -> Option<Arc<Snapshot>> {
        self.store.get(uri)
    }

    pub fn complete(&self, uri: &str, line: u32, column: u32) -> Vec<CompletionItem> {
        match self.store.get(uri) {
            Some(snap) => providers::completion::complete(&snap, line, column),
            None => Vec::new(),
        }
    }

    pub fn hover(&self, uri: &str, line: u32, column: u32) -> Option<HoverText> {
        let snap = self.store.get(uri)?;
        providers::hover::hover(&snap, line, column)
    }

    /// Same-document definition only; cross-file resolution belongs to a
    /// workspace index this crate does not own.
    pub fn definition(&self, uri: &str, line: u32, column: u32) -> Option<Span> {
        let snap = self.store.get(uri)?;
        providers::definition::definition(&snap, line, column)
    }

    pub fn references(
        &self,
        uri: &str,
        line: u32,
        column: u32,
        cancel: &CancellationToken,
    ) -> QueryResult<Vec<Span>> {
        match self.store.get(uri) {
            Some(snap) => providers::references::references(&snap, line, column, cancel),
            None => QueryResult::Complete(Vec::new()),
        }
    }

    pub fn outline(&self, uri: &str) -> Vec<OutlineEntry> {
        match self.store.get(uri) {
            Some(snap) => providers::outline::outline(&snap),
            None => Vec::new(),
        }
    }
}
