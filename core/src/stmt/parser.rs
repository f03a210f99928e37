use tracing::debug;

use crate::diag::{Diagnostic, DiagnosticKind};
use crate::lang;
use crate::stmt::{ArgExpr, Command, Document, LabelDecl, LineEntry, Statement};
use crate::token::{Lexer, Span, Token, TokenKind};

#[derive(Debug, Default)]
pub struct ParseOutcome {
    pub document: Document,
    pub diagnostics: Vec<Diagnostic>,
}

/// Lex and parse a full document. Total: malformed lines degrade to
/// best-effort partial statements plus diagnostics.
pub fn parse(text: &str) -> ParseOutcome {
    let tokens = Lexer::tokenize(text);
    let line_count = text.split('\n').count();

    let mut document = Document {
        tokens,
        lines: Vec::with_capacity(line_count),
        statements: Vec::new(),
    };
    let mut diagnostics = Vec::new();

    let mut cursor = 0usize;
    for line_no in 0..line_count {
        let start = cursor;
        while cursor < document.tokens.len() && document.tokens[cursor].span.start.line == line_no as u32 + 1 {
            cursor += 1;
        }
        let statement = parse_line(line_no as u32, &document.tokens, (start, cursor), text, &mut diagnostics);
        let statement = statement.map(|s| {
            document.statements.push(s);
            document.statements.len() - 1
        });
        document.lines.push(LineEntry {
            tokens: (start, cursor),
            statement,
        });
    }

    check_nesting(&document, &mut diagnostics);
    debug!(
        lines = line_count,
        statements = document.statements.len(),
        diagnostics = diagnostics.len(),
        "parsed document"
    );
    ParseOutcome { document, diagnostics }
}

fn parse_line(
    line_no: u32,
    tokens: &[Token],
    range: (usize, usize),
    text: &str,
    diags: &mut Vec<Diagnostic>,
) -> Option<Statement> {
    let (lo, hi) = range;
    if lo == hi {
        return None;
    }
    for t in &tokens[lo..hi] {
        if t.kind == TokenKind::Error {
            let msg = if t.text.starts_with('"') {
                "unterminated string literal"
            } else {
                "unrecognized character"
            };
            diags.push(Diagnostic::error(DiagnosticKind::LexError, msg, t.span.clone()));
        }
    }
    if tokens[lo..hi]
        .iter()
        .all(|t| matches!(t.kind, TokenKind::Space | TokenKind::Comment))
    {
        return None;
    }

    let mut i = lo;
    let mut label = None;
    if tokens[i].kind == TokenKind::Ident && tokens[i].span.start.column == 1 {
        let name = tokens[i].text.clone();
        let mut span = tokens[i].span.clone();
        i += 1;
        let mut params = Vec::new();
        if i < hi && tokens[i].kind == TokenKind::LParen {
            i += 1;
            while i < hi && tokens[i].kind != TokenKind::RParen {
                if tokens[i].kind == TokenKind::Ident {
                    params.push(tokens[i].text.clone());
                }
                i += 1;
            }
            if i < hi {
                span.end = tokens[i].span.end.clone();
                i += 1;
            } else {
                diags.push(Diagnostic::error(
                    DiagnosticKind::SyntaxError,
                    format!("unclosed parameter list on label {name}"),
                    span.clone(),
                ));
            }
        }
        label = Some(LabelDecl { name, params, span });
    }

    let mut level: u8 = 0;
    while i < hi {
        match tokens[i].kind {
            TokenKind::Space => i += 1,
            TokenKind::Dot => {
                level = level.saturating_add(1);
                i += 1;
            }
            _ => break,
        }
    }

    let mut commands = Vec::new();
    while i < hi {
        match tokens[i].kind {
            TokenKind::Space | TokenKind::Error => i += 1,
            TokenKind::Comment => break,
            TokenKind::Command => {
                let (cmd, next) = parse_command(tokens, i, hi, text, diags);
                commands.push(cmd);
                i = next;
            }
            _ => {
                // Stray expression run (e.g. an unclosed subscript list
                // spilling over a space). Fold it into the previous
                // command's arguments so the index still sees its symbols.
                let region_start = i;
                let (split, next) = read_arg_region(tokens, i, hi, text);
                i = next;
                match commands.last_mut() {
                    Some(last) => last.args.extend(split),
                    None => diags.push(Diagnostic::error(
                        DiagnosticKind::SyntaxError,
                        "expected a command",
                        tokens[region_start].span.clone(),
                    )),
                }
            }
        }
    }

    let first = tokens[lo..hi]
        .iter()
        .find(|t| !matches!(t.kind, TokenKind::Space))?;
    let last = tokens[lo..hi]
        .iter()
        .rev()
        .find(|t| !matches!(t.kind, TokenKind::Space))?;
    Some(Statement {
        line: line_no,
        level,
        label,
        commands,
        span: Span::new(first.span.start.clone(), last.span.end.clone()),
    })
}

fn parse_command(
    tokens: &[Token],
    mut i: usize,
    hi: usize,
    text: &str,
    diags: &mut Vec<Diagnostic>,
) -> (Command, usize) {
    let cmd_tok = &tokens[i];
    let raw = cmd_tok.text.clone();
    let span = cmd_tok.span.clone();
    i += 1;

    // Postconditional: a colon glued to the command word, expression up
    // to the next space. Truth is never evaluated, only recorded.
    let mut postcondition = None;
    if i < hi && tokens[i].kind == TokenKind::Colon && tokens[i].span.start.offset == span.end.offset {
        let colon_span = tokens[i].span.clone();
        i += 1;
        let pstart = i;
        while i < hi && !tokens[i].is_space() && tokens[i].kind != TokenKind::Comment {
            i += 1;
        }
        if pstart == i {
            diags.push(Diagnostic::error(
                DiagnosticKind::SyntaxError,
                "empty postconditional",
                colon_span,
            ));
        } else {
            postcondition = Some(make_arg(tokens, pstart, i, text));
        }
    }

    let mut args = Vec::new();
    if i < hi && tokens[i].is_space() {
        let single = tokens[i].text.chars().count() == 1;
        if single {
            i += 1;
            if i < hi && tokens[i].kind != TokenKind::Comment {
                let (split, next) = read_arg_region(tokens, i, hi, text);
                args = split;
                i = next;
            }
        }
        // Two or more spaces: argumentless, the next word is a command.
    }

    let canonical = lang::canonical_command(&raw, args.is_empty());
    let (known, canonical) = match canonical {
        Some(entry) => (true, entry.name.to_string()),
        None => {
            diags.push(Diagnostic::warning(
                DiagnosticKind::UnknownSymbol,
                format!("unknown command {}", raw.to_ascii_uppercase()),
                span.clone(),
            ));
            (false, raw.to_ascii_uppercase())
        }
    };

    (
        Command {
            canonical,
            known,
            raw,
            span,
            postcondition,
            args,
        },
        i,
    )
}

/// Consume one argument region (until a space at paren depth zero, a
/// comment, or end of line) and split it on top-level commas.
fn read_arg_region(tokens: &[Token], start: usize, hi: usize, text: &str) -> (Vec<ArgExpr>, usize) {
    let mut i = start;
    let mut depth = 0i32;
    let mut args = Vec::new();
    let mut seg_start = start;

    while i < hi {
        match tokens[i].kind {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => depth -= 1,
            TokenKind::Space => {
                if depth <= 0 {
                    break;
                }
            }
            TokenKind::Comment => break,
            TokenKind::Comma if depth == 0 => {
                if seg_start < i {
                    args.push(make_arg(tokens, seg_start, i, text));
                }
                seg_start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    if seg_start < i {
        args.push(make_arg(tokens, seg_start, i, text));
    }
    (args, i)
}

fn make_arg(tokens: &[Token], start: usize, end: usize, text: &str) -> ArgExpr {
    let span = Span::new(tokens[start].span.start.clone(), tokens[end - 1].span.end.clone());
    let raw = crate::token::slice_chars(text, span.start.offset, span.end.offset);
    ArgExpr {
        tokens: (start, end),
        text: raw,
        span,
    }
}

/// Document-level dot-nesting consistency. A level increase is legal only
/// by one step at a time, and only after a statement that opens a block
/// (argumentless DO, FOR, IF, ELSE).
fn check_nesting(document: &Document, diags: &mut Vec<Diagnostic>) {
    let mut prev_level: u8 = 0;
    let mut prev_opens = false;
    for stmt in &document.statements {
        if stmt.level > prev_level + 1 {
            diags.push(Diagnostic::error(
                DiagnosticKind::SyntaxError,
                format!(
                    "nesting level {} is unreachable from level {}",
                    stmt.level, prev_level
                ),
                stmt.span.clone(),
            ));
        } else if stmt.level == prev_level + 1 && !prev_opens {
            diags.push(Diagnostic::error(
                DiagnosticKind::SyntaxError,
                format!("nesting level {} has no block opener above it", stmt.level),
                stmt.span.clone(),
            ));
        }
        prev_level = stmt.level;
        prev_opens = stmt.opens_block();
    }
}
