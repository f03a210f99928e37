use ropey::Rope;
use tower_lsp::lsp_types::{Position, Range, TextDocumentContentChangeEvent};

use mls_core::diag::{Diagnostic as CoreDiagnostic, Severity};
use mls_core::token::Span as CoreSpan;
use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity, NumberOrString};

// Convert LSP UTF-16 position to Rope char index, clamped to line end.
pub(crate) fn position_to_char_idx(text: &Rope, pos: Position) -> usize {
    let line_idx = pos.line as usize;
    if line_idx >= text.len_lines() {
        return text.len_chars();
    }
    let line_start_char = text.line_to_char(line_idx);
    let line_slice = text.line(line_idx);
    let target_utf16 = pos.character as usize;

    if let Some(s) = line_slice.as_str() {
        if s.is_ascii() {
            let clamped = target_utf16.min(s.len());
            return line_start_char + clamped;
        }
    }

    let mut seen_utf16 = 0usize;
    let mut chars_in_line = 0usize;
    for ch in line_slice.chars() {
        let u16_len = ch.len_utf16();
        if seen_utf16 + u16_len > target_utf16 {
            break;
        }
        seen_utf16 += u16_len;
        chars_in_line += 1;
        if seen_utf16 == target_utf16 {
            break;
        }
    }
    line_start_char + chars_in_line
}

// Apply incremental LSP changes to a rope buffer.
pub(crate) fn apply_incremental_change_rope(text: &mut Rope, change: &TextDocumentContentChangeEvent) {
    if let Some(range) = &change.range {
        let start_char = position_to_char_idx(text, range.start);
        let end_char = position_to_char_idx(text, range.end);
        let (s, e) = if start_char <= end_char {
            (start_char, end_char)
        } else {
            (end_char, start_char)
        };
        if s != e {
            text.remove(s..e);
        }
        if !change.text.is_empty() {
            text.insert(s, &change.text);
        }
    } else {
        *text = Rope::from_str(&change.text);
    }
}

/// LSP 0-based UTF-16 position to the core's 1-based line/char column.
pub(crate) fn lsp_to_core_position(text: &Rope, pos: Position) -> (u32, u32) {
    let char_idx = position_to_char_idx(text, pos);
    let line_idx = text.try_char_to_line(char_idx).unwrap_or(0);
    let within_line = char_idx.saturating_sub(text.line_to_char(line_idx));
    (line_idx as u32 + 1, within_line as u32 + 1)
}

/// Core 1-based span to an LSP 0-based range.
pub(crate) fn core_span_to_range(span: &CoreSpan) -> Range {
    Range::new(
        Position::new(span.start.line - 1, span.start.column - 1),
        Position::new(span.end.line - 1, span.end.column - 1),
    )
}

pub(crate) fn core_diagnostic_to_lsp(diag: &CoreDiagnostic) -> Diagnostic {
    let severity = match diag.severity {
        Severity::Error => DiagnosticSeverity::ERROR,
        Severity::Warning => DiagnosticSeverity::WARNING,
    };
    Diagnostic {
        range: core_span_to_range(&diag.span),
        severity: Some(severity),
        code: Some(NumberOrString::String(format!("{:?}", diag.kind))),
        source: Some("mumps".to_string()),
        message: diag.message.clone(),
        ..Default::default()
    }
}
