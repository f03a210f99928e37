use crate::index::SymbolKind;
use crate::lang;
use crate::providers::{CompletionItem, CompletionKind};
use crate::store::Snapshot;

/// Context-sensitive completion at a 1-based line/column cursor.
///
/// Lexical context decides the candidate set: `$` offers intrinsic
/// functions and special variables, `$$` and a DO/GOTO prefix offer
/// labels, `^` offers structured system variables plus this document's
/// globals, anything else offers commands, labels, and locals.
pub fn complete(snapshot: &Snapshot, line: u32, column: u32) -> Vec<CompletionItem> {
    let Some(line_text) = snapshot.text.split('\n').nth(line.saturating_sub(1) as usize) else {
        return Vec::new();
    };
    let prefix: String = line_text.chars().take(column.saturating_sub(1) as usize).collect();

    let tail_start = prefix
        .char_indices()
        .rev()
        .take_while(|&(_, c)| c.is_ascii_alphanumeric() || matches!(c, '%' | '$' | '^'))
        .last()
        .map(|(i, _)| i)
        .unwrap_or(prefix.len());
    let tail = &prefix[tail_start..];
    let pre = &prefix[..tail_start];

    let mut items = Vec::new();
    if tail.starts_with("$$") {
        push_labels(snapshot, &mut items);
    } else if tail.starts_with("^$") {
        push_ssvns(&mut items);
    } else if tail.starts_with('^') {
        push_ssvns(&mut items);
        push_globals(snapshot, &mut items);
    } else if tail.starts_with('$') {
        push_functions(&mut items);
        push_special_vars(&mut items);
    } else if is_call_prefix(pre) {
        push_labels(snapshot, &mut items);
    } else {
        push_commands(&mut items);
        push_labels(snapshot, &mut items);
        push_locals(snapshot, &mut items);
    }
    items
}

/// Whether the text before the word being typed ends in a DO/GOTO
/// command, i.e. the cursor sits on a label-call target.
fn is_call_prefix(pre: &str) -> bool {
    let trimmed = pre.trim_end_matches(' ');
    if trimmed.len() == pre.len() {
        return false;
    }
    let word: String = trimmed
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    matches!(word.to_ascii_uppercase().as_str(), "D" | "DO" | "G" | "GOTO")
}

fn push_commands(items: &mut Vec<CompletionItem>) {
    for entry in lang::COMMANDS {
        items.push(CompletionItem {
            label: entry.name.to_string(),
            kind: CompletionKind::Command,
            detail: Some(format!("({}) {}", entry.abbrev, entry.doc)),
            documentation: Some(entry.doc.to_string()),
            insert_text: None,
        });
        items.push(CompletionItem {
            label: entry.abbrev.to_string(),
            kind: CompletionKind::Command,
            detail: Some(format!("{} - {}", entry.name, entry.doc)),
            documentation: Some(entry.doc.to_string()),
            insert_text: None,
        });
    }
}

fn push_functions(items: &mut Vec<CompletionItem>) {
    for entry in lang::FUNCTIONS {
        items.push(CompletionItem {
            label: entry.name.to_string(),
            kind: CompletionKind::Function,
            detail: Some(format!("({}) {}", entry.abbrev, entry.doc)),
            documentation: Some(entry.doc.to_string()),
            // The `$` trigger is already in the buffer.
            insert_text: Some(entry.name[1..].to_string()),
        });
    }
}

fn push_special_vars(items: &mut Vec<CompletionItem>) {
    for entry in lang::SPECIAL_VARS {
        items.push(CompletionItem {
            label: entry.name.to_string(),
            kind: CompletionKind::Variable,
            detail: Some(format!("({}) {}", entry.abbrev, entry.doc)),
            documentation: Some(entry.doc.to_string()),
            insert_text: Some(entry.name[1..].to_string()),
        });
    }
}

fn push_ssvns(items: &mut Vec<CompletionItem>) {
    for entry in lang::SSVNS {
        items.push(CompletionItem {
            label: entry.name.to_string(),
            kind: CompletionKind::Variable,
            detail: Some(format!("({}) {}", entry.abbrev, entry.doc)),
            documentation: Some(entry.doc.to_string()),
            insert_text: Some(entry.name[1..].to_string()),
        });
    }
}

fn push_globals(snapshot: &Snapshot, items: &mut Vec<CompletionItem>) {
    for sym in &snapshot.index.symbols {
        if sym.kind == SymbolKind::GlobalVariable {
            items.push(CompletionItem {
                label: sym.name.clone(),
                kind: CompletionKind::Global,
                detail: Some("Global variable".to_string()),
                documentation: None,
                insert_text: Some(sym.name[1..].to_string()),
            });
        }
    }
}

fn push_labels(snapshot: &Snapshot, items: &mut Vec<CompletionItem>) {
    for &id in &snapshot.index.labels {
        let sym = &snapshot.index.symbols[id];
        let params = sym.params.as_deref().unwrap_or(&[]);
        let param_str = if params.is_empty() {
            String::new()
        } else {
            format!("({})", params.join(","))
        };
        let line = sym
            .declaration
            .as_ref()
            .map(|s| s.start.line)
            .unwrap_or_default();
        items.push(CompletionItem {
            label: sym.name.clone(),
            kind: CompletionKind::Label,
            detail: Some(format!("Label at line {line}{param_str}")),
            documentation: None,
            insert_text: None,
        });
    }
}

fn push_locals(snapshot: &Snapshot, items: &mut Vec<CompletionItem>) {
    for sym in &snapshot.index.symbols {
        if sym.kind == SymbolKind::LocalVariable {
            items.push(CompletionItem {
                label: sym.name.clone(),
                kind: CompletionKind::Variable,
                detail: Some("Local variable".to_string()),
                documentation: None,
                insert_text: None,
            });
        }
    }
}
