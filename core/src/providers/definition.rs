use crate::store::Snapshot;
use crate::token::Span;

/// Declaring span of the symbol under the cursor: the label declaration
/// for label references, the first assignment for locals, and the first
/// fully-qualified reference for globals (globals have no declaration in
/// the language; their definition is the point of first qualification).
pub fn definition(snapshot: &Snapshot, line: u32, column: u32) -> Option<Span> {
    snapshot
        .index
        .symbol_at(line, column)
        .and_then(|sym| sym.declaration.clone())
}
