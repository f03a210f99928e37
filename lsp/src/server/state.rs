use std::sync::Arc;

use dashmap::DashMap;
use ropey::Rope;
use tokio_util::sync::CancellationToken;
use tower_lsp::Client;
use tower_lsp::lsp_types::Url;

use mls_core::Analyzer;

/// In-memory text buffer for an open document. Analysis snapshots live
/// in the core's document store; this only tracks the editable rope.
#[derive(Debug, Default)]
pub(crate) struct DocumentBuffer {
    pub(crate) content: Rope,
    pub(crate) version: i32,
}

/// Primary LSP server state shared across handlers.
pub(crate) struct MumpsLanguageServer {
    pub(crate) client: Client,
    pub(crate) buffers: Arc<DashMap<Url, DocumentBuffer>>,
    pub(crate) engine: Arc<Analyzer>,
    /// Per-uri cancellation for in-flight queries; cancelled and replaced
    /// whenever an edit supersedes the snapshot they read.
    pub(crate) query_guards: DashMap<Url, CancellationToken>,
}

impl MumpsLanguageServer {
    pub(crate) fn new(client: Client) -> Self {
        Self {
            client,
            buffers: Arc::new(DashMap::new()),
            engine: Arc::new(Analyzer::new()),
            query_guards: DashMap::new(),
        }
    }

    /// Token for a read query against the current snapshot of `uri`.
    pub(crate) fn query_token(&self, uri: &Url) -> CancellationToken {
        self.query_guards
            .entry(uri.clone())
            .or_insert_with(CancellationToken::new)
            .child_token()
    }

    /// Cancel outstanding queries for `uri`; called when an edit lands.
    pub(crate) fn supersede_queries(&self, uri: &Url) {
        if let Some((_, token)) = self.query_guards.remove(uri) {
            token.cancel();
        }
    }
}
