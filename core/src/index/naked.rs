//! Naked-reference resolution: a single left-to-right fold over the
//! document's global references in source order.
//!
//! This is a conservative static approximation. It follows textual order
//! only and does not model runtime control flow (loops, conditionals);
//! callers treating the resolved targets as exact runtime behavior will
//! be wrong in code that branches between global references.

use crate::diag::{Diagnostic, DiagnosticKind};
use crate::index::GlobalReference;
use crate::token::Span;

/// A global reference as collected by the index builder, before naked
/// resolution. `name` is `None` for a naked reference. Subscripts are the
/// full parsed list; depth truncation happens on emission.
#[derive(Debug, Clone)]
pub struct RawGlobalRef {
    pub name: Option<String>,
    pub subscripts: Vec<String>,
    /// 0-based source line, used for routine-boundary resets.
    pub line: u32,
    pub span: Span,
}

#[derive(Debug, Default)]
pub struct NakedOutcome {
    pub refs: Vec<GlobalReference>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Resolve naked references against the most recent explicit global
/// reference. State resets at every routine boundary (level-0 label
/// line): naked scope does not cross entry points in this model.
pub fn resolve(raws: &[RawGlobalRef], routine_starts: &[u32], max_depth: usize) -> NakedOutcome {
    let mut out = NakedOutcome::default();
    let mut base: Option<(String, Vec<String>)> = None;
    let mut boundary = 0usize;

    for raw in raws {
        while boundary < routine_starts.len() && routine_starts[boundary] <= raw.line {
            base = None;
            boundary += 1;
        }

        match &raw.name {
            Some(name) => {
                out.refs.push(emit(name.clone(), &raw.subscripts, false, raw.span.clone(), max_depth));
                base = Some((name.clone(), raw.subscripts.clone()));
            }
            None => match &base {
                Some((name, prefix)) => {
                    // The naked subscripts replace the trailing level of
                    // the base; outer levels are inherited.
                    let mut effective: Vec<String> =
                        prefix[..prefix.len().saturating_sub(1)].to_vec();
                    effective.extend(raw.subscripts.iter().cloned());
                    out.refs
                        .push(emit(name.clone(), &effective, true, raw.span.clone(), max_depth));
                }
                None => {
                    out.diagnostics.push(Diagnostic::warning(
                        DiagnosticKind::UnresolvedNakedReference,
                        "naked reference with no prior global in scope",
                        raw.span.clone(),
                    ));
                }
            },
        }
    }
    out
}

fn emit(name: String, subscripts: &[String], was_naked: bool, span: Span, max_depth: usize) -> GlobalReference {
    GlobalReference {
        name,
        subscripts: subscripts.iter().take(max_depth).cloned().collect(),
        subscript_count: subscripts.len().min(u8::MAX as usize) as u8,
        was_naked,
        span,
    }
}
