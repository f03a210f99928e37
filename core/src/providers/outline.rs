use crate::providers::OutlineEntry;
use crate::store::Snapshot;
use crate::token::Span;

/// Flat routine outline: every label in source order, each spanning from
/// its declaration to the line before the next level-0 label. MUMPS
/// routines do not nest, so the outline is a list, not a tree.
pub fn outline(snapshot: &Snapshot) -> Vec<OutlineEntry> {
    let labels = &snapshot.index.labels;
    let mut entries = Vec::with_capacity(labels.len());
    for (k, &id) in labels.iter().enumerate() {
        let sym = &snapshot.index.symbols[id];
        let Some(decl) = sym.declaration.clone() else { continue };

        let end_line = labels
            .get(k + 1)
            .and_then(|&next| snapshot.index.symbols[next].declaration.as_ref())
            .map(|s| s.start.line.saturating_sub(1))
            .unwrap_or(snapshot.document.lines.len() as u32);
        let end = last_position_in_lines(snapshot, decl.start.line, end_line).unwrap_or(decl.end.clone());

        let params = sym.params.as_deref().unwrap_or(&[]);
        let detail = if params.is_empty() {
            None
        } else {
            Some(format!("({})", params.join(",")))
        };
        entries.push(OutlineEntry {
            name: sym.name.clone(),
            detail,
            span: Span::new(decl.start.clone(), end),
            selection_span: decl,
        });
    }
    entries
}

/// End of the last token within a 1-based inclusive line range.
fn last_position_in_lines(
    snapshot: &Snapshot,
    first_line: u32,
    last_line: u32,
) -> Option<crate::token::Position> {
    let lo = first_line.saturating_sub(1) as usize;
    let hi = (last_line as usize).min(snapshot.document.lines.len());
    snapshot.document.lines[lo..hi]
        .iter()
        .rev()
        .find(|l| l.tokens.0 < l.tokens.1)
        .map(|l| snapshot.document.tokens[l.tokens.1 - 1].span.end.clone())
}
