use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::diag::Diagnostic;
use crate::index::{self, SymbolIndex};
use crate::stmt::{self, Document};

/// One fully analyzed, immutable version of a document. Providers borrow
/// snapshots read-only and never retain them across versions.
#[derive(Debug)]
pub struct Snapshot {
    pub uri: String,
    pub version: i32,
    pub text: String,
    pub document: Document,
    pub index: SymbolIndex,
    pub diagnostics: Vec<Diagnostic>,
}

/// Run the full pipeline over one text: lex, parse, index, resolve naked
/// references. Always total; errors surface as diagnostics.
pub fn analyze_text(uri: &str, text: &str, version: i32, max_global_depth: usize) -> Snapshot {
    let stmt::ParseOutcome {
        document,
        mut diagnostics,
    } = stmt::parse(text);
    let index::IndexOutcome {
        index,
        diagnostics: index_diags,
    } = index::build(&document, text, max_global_depth);
    diagnostics.extend(index_diags);
    Snapshot {
        uri: uri.to_string(),
        version,
        text: text.to_string(),
        document,
        index,
        diagnostics,
    }
}

/// Latest published snapshot per uri. Re-analysis always reruns the full
/// pipeline over the new text: MUMPS's context sensitivity (naked
/// references, abbreviation resolution) makes partial re-analysis
/// error-prone, and routine-sized files reparse quickly.
#[derive(Default)]
pub struct DocumentStore {
    docs: DashMap<String, Arc<Snapshot>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a computed snapshot. A snapshot older than the currently
    /// published version is discarded, so readers only ever observe the
    /// newest fully built analysis.
    pub fn publish(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let snapshot = Arc::new(snapshot);
        let mut published = snapshot.clone();
        self.docs
            .entry(snapshot.uri.clone())
            .and_modify(|current| {
                if snapshot.version >= current.version {
                    *current = snapshot.clone();
                } else {
                    debug!(
                        uri = %snapshot.uri,
                        stale = snapshot.version,
                        current = current.version,
                        "discarding stale snapshot"
                    );
                    published = current.clone();
                }
            })
            .or_insert_with(|| snapshot.clone());
        published
    }

    pub fn get(&self, uri: &str) -> Option<Arc<Snapshot>> {
        self.docs.get(uri).map(|s| s.clone())
    }

    pub fn close(&self, uri: &str) {
        self.docs.remove(uri);
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}
