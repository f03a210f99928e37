use tokio_util::sync::CancellationToken;

use crate::providers::QueryResult;
use crate::store::Snapshot;
use crate::token::Span;

/// All recorded reference spans for the symbol under the cursor. Naked
/// global references are included with the spans of the symbol they
/// resolved to. The scan honors cancellation so a superseding update is
/// never blocked by a long-running query.
pub fn references(
    snapshot: &Snapshot,
    line: u32,
    column: u32,
    cancel: &CancellationToken,
) -> QueryResult<Vec<Span>> {
    let Some(sym) = snapshot.index.symbol_at(line, column) else {
        return QueryResult::Complete(Vec::new());
    };
    let mut out = Vec::with_capacity(sym.references.len());
    for (i, span) in sym.references.iter().enumerate() {
        if i % 64 == 0 && cancel.is_cancelled() {
            return QueryResult::Cancelled;
        }
        out.push(span.clone());
    }
    QueryResult::Complete(out)
}
