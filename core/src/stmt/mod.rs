pub mod parser;

#[cfg(test)]
mod stmt_test;

pub use parser::{ParseOutcome, parse};

use serde::Serialize;

use crate::token::{Span, Token};

/// A fully lexed and parsed source snapshot. Owns the token arena; lines
/// and statements refer back into it by index.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub tokens: Vec<Token>,
    pub lines: Vec<LineEntry>,
    pub statements: Vec<Statement>,
}

impl Document {
    /// Statement covering a 0-based source line, if the line has one.
    pub fn statement_at_line(&self, line: u32) -> Option<&Statement> {
        self.lines
            .get(line as usize)
            .and_then(|l| l.statement)
            .map(|i| &self.statements[i])
    }

    /// Token under a 1-based line/column cursor.
    pub fn token_at(&self, line: u32, column: u32) -> Option<(usize, &Token)> {
        let entry = self.lines.get(line.checked_sub(1)? as usize)?;
        for i in entry.tokens.0..entry.tokens.1 {
            if self.tokens[i].span.contains(line, column) {
                return Some((i, &self.tokens[i]));
            }
        }
        None
    }
}

#[derive(Debug, Clone)]
pub struct LineEntry {
    /// Half-open token index range of this line within the arena.
    pub tokens: (usize, usize),
    pub statement: Option<usize>,
}

/// One source line's parse. MUMPS permits several space-separated commands
/// per line; the first is the statement's principal command.
#[derive(Debug, Clone)]
pub struct Statement {
    /// 0-based source line.
    pub line: u32,
    /// Count of leading dots; 0 is top level.
    pub level: u8,
    pub label: Option<LabelDecl>,
    pub commands: Vec<Command>,
    pub span: Span,
}

impl Statement {
    pub fn principal(&self) -> Option<&Command> {
        self.commands.first()
    }

    /// Whether this statement opens a dot-block for the following lines:
    /// an argumentless DO, or a FOR/IF/ELSE scope.
    pub fn opens_block(&self) -> bool {
        self.commands.iter().any(|c| {
            matches!(c.canonical.as_str(), "FOR" | "IF" | "ELSE") || (c.canonical == "DO" && c.args.is_empty())
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LabelDecl {
    pub name: String,
    pub params: Vec<String>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Command {
    /// Canonical command name; the uppercased raw word when unknown.
    pub canonical: String,
    pub known: bool,
    /// The abbreviation (or full word) as written.
    pub raw: String,
    pub span: Span,
    pub postcondition: Option<ArgExpr>,
    pub args: Vec<ArgExpr>,
}

/// An argument expression kept opaque: a token slice plus its source text.
/// Indirection and pattern-match bodies are never interpreted further.
#[derive(Debug, Clone)]
pub struct ArgExpr {
    /// Half-open token index range into the owning document's arena.
    pub tokens: (usize, usize),
    pub text: String,
    pub span: Span,
}
