use crate::index::SymbolKind;
use crate::lang;
use crate::providers::HoverText;
use crate::store::Snapshot;
use crate::token::TokenKind;

/// Hover documentation for the token or symbol under a 1-based cursor.
pub fn hover(snapshot: &Snapshot, line: u32, column: u32) -> Option<HoverText> {
    if let Some((_, token)) = snapshot.document.token_at(line, column) {
        match token.kind {
            TokenKind::Command => return command_hover(snapshot, line, column),
            TokenKind::Intrinsic => {
                if let Some(entry) = lang::lookup_function(&token.text) {
                    return Some(HoverText {
                        markdown: table_hover(&token.text, entry.name, entry.abbrev, "Intrinsic function", entry.doc),
                        span: Some(token.span.clone()),
                    });
                }
            }
            TokenKind::SpecialVar => {
                if let Some(entry) = lang::lookup_special_var(&token.text) {
                    return Some(HoverText {
                        markdown: table_hover(&token.text, entry.name, entry.abbrev, "Special variable", entry.doc),
                        span: Some(token.span.clone()),
                    });
                }
            }
            _ => {}
        }
    }
    symbol_hover(snapshot, line, column)
}

/// `**$P** ($PIECE)` when the abbreviation was written, else
/// `**$PIECE** (abbrev: $P)`.
fn table_hover(written: &str, canonical: &str, abbrev: &str, category: &str, doc: &str) -> String {
    let upper = written.to_ascii_uppercase();
    if upper == canonical {
        format!("**{canonical}** (abbrev: {abbrev})\n\n{category}: {doc}")
    } else {
        format!("**{upper}** ({canonical})\n\n{category}: {doc}")
    }
}

fn command_hover(snapshot: &Snapshot, line: u32, column: u32) -> Option<HoverText> {
    let stmt = snapshot.document.statement_at_line(line.saturating_sub(1))?;
    let cmd = stmt.commands.iter().find(|c| c.span.contains(line, column))?;
    let mut markdown = if cmd.known {
        let entry = lang::canonical_command(&cmd.raw, cmd.args.is_empty())?;
        table_hover(&cmd.raw, entry.name, entry.abbrev, "Command", entry.doc)
    } else {
        format!("**{}**\n\nUnknown command", cmd.canonical)
    };
    if let Some(post) = &cmd.postcondition {
        markdown.push_str(&format!("\n\nPostcondition: `{}`", post.text));
    }
    Some(HoverText {
        markdown,
        span: Some(cmd.span.clone()),
    })
}

fn symbol_hover(snapshot: &Snapshot, line: u32, column: u32) -> Option<HoverText> {
    let sym = snapshot.index.symbol_at(line, column)?;
    let markdown = match sym.kind {
        SymbolKind::Label => {
            let decl_line = sym.declaration.as_ref().map(|s| s.start.line).unwrap_or_default();
            let params = match sym.params.as_deref() {
                Some([]) | None => "No parameters".to_string(),
                Some(params) => format!("Parameters: {}", params.join(", ")),
            };
            format!("**{}**\n\nLabel at line {decl_line}\n\n{params}", sym.name)
        }
        SymbolKind::LocalVariable => {
            format!(
                "**{}**\n\nLocal variable\n\nReferenced on lines: {}",
                sym.name,
                reference_lines(&sym.references)
            )
        }
        SymbolKind::GlobalVariable => {
            let mut text = format!("**{}**\n\nGlobal variable", sym.name);
            if sym.max_subscript_depth > 0 {
                text.push_str(&format!(", deepest subscript level {}", sym.max_subscript_depth));
            }
            if let Some(gref) = snapshot.index.global_ref_at(line, column) {
                if gref.was_naked {
                    text.push_str(&format!(
                        "\n\nNaked reference resolving to ^{}({})",
                        gref.name,
                        gref.subscripts.join(",")
                    ));
                }
            }
            text
        }
        SymbolKind::StructuredSystemVariable => match lang::lookup_ssvn(&sym.name) {
            Some(entry) => format!(
                "**{}** (abbrev: {})\n\nStructured system variable: {}",
                entry.name, entry.abbrev, entry.doc
            ),
            None => format!("**{}**\n\nStructured system variable", sym.name),
        },
        SymbolKind::IntrinsicFunction | SymbolKind::SpecialVariable => return None,
    };
    let span = sym.references.iter().find(|r| r.contains(line, column)).cloned();
    Some(HoverText { markdown, span })
}

fn reference_lines(references: &[crate::token::Span]) -> String {
    let mut lines: Vec<u32> = Vec::new();
    for r in references {
        if !lines.contains(&r.start.line) {
            lines.push(r.start.line);
        }
        if lines.len() == 10 {
            break;
        }
    }
    lines
        .into_iter()
        .map(|l| l.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
