use serde::Serialize;

use crate::lang;
use crate::token::{Position, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    /// Identifier outside command position: label, variable, routine name.
    Ident,
    /// Identifier in command position (after label/dots at line start, or
    /// after a space that terminated the previous argument list).
    Command,
    /// `$NAME` immediately followed by `(`.
    Intrinsic,
    /// `$NAME` not followed by `(`.
    SpecialVar,
    /// `^` introducing a global name.
    GlobalSigil,
    /// `^$` introducing a structured system variable.
    SsvnSigil,
    /// Double-quoted string literal, `""` as the escaped quote.
    Str,
    Number,
    /// Single-char MUMPS operator: `' [ ] ? = + - * / \ # _ < > & !`.
    Operator,
    /// `@` indirection marker.
    Indirection,
    /// Leading dot denoting one block nesting level.
    Dot,
    Colon,
    Comma,
    LParen,
    RParen,
    /// Run of one or more blanks. Significant: a single space separates a
    /// command from its arguments, two or more mark the command as
    /// argumentless.
    Space,
    /// `;` to end of line.
    Comment,
    /// Malformed input recovered in place (unterminated string literal,
    /// unrecognized character). Lexing never aborts.
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn is_space(&self) -> bool {
        self.kind == TokenKind::Space
    }
}

/// Where we are within the current line. MUMPS token classification is
/// position-dependent: the same word is a label at column one, a command
/// after the line-start whitespace, and a variable inside an argument.
#[derive(Debug, Clone, Copy, PartialEq)]
enum LineState {
    LineStart,
    /// Past the label (if any); consuming indent, nesting dots, or the
    /// formal parameter list before the first command.
    PreCommand,
    /// Just consumed a command word; a postconditional and the separating
    /// space run are still ahead.
    AfterCommand,
    Arguments,
    /// A space run ended the previous argument list; the next word begins
    /// a new command.
    ExpectCommand,
}

pub struct Lexer {
    chars: Vec<char>,
    idx: usize,
    len: usize,
    line: u32,
    column: u32,
    state: LineState,
    paren_depth: u32,
    tokens: Vec<Token>,
}

impl Lexer {
    /// Tokenize a full document. Restartable and total: malformed input is
    /// represented as `TokenKind::Error` tokens, never an `Err`.
    pub fn tokenize(text: &str) -> Vec<Token> {
        let chars: Vec<char> = text.chars().collect();
        let mut lx = Lexer {
            len: chars.len(),
            chars,
            idx: 0,
            line: 1,
            column: 1,
            state: LineState::LineStart,
            paren_depth: 0,
            tokens: Vec::with_capacity(text.len() / 3),
        };
        lx.run();
        lx.tokens
    }

    fn eof(&self) -> bool {
        self.idx >= self.len
    }

    fn cur(&self) -> char {
        self.chars[self.idx]
    }

    fn peek(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.idx + ahead).copied()
    }

    fn pos(&self) -> Position {
        Position::new(self.line, self.column, self.idx)
    }

    fn advance(&mut self) {
        if !self.eof() && self.chars[self.idx] == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        self.idx += 1;
    }

    fn push(&mut self, kind: TokenKind, text: String, start: Position) {
        let span = Span::new(start, self.pos());
        self.tokens.push(Token { kind, text, span });
    }

    fn run(&mut self) {
        while !self.eof() {
            let c = self.cur();
            if c == '\n' {
                self.advance();
                self.state = LineState::LineStart;
                self.paren_depth = 0;
                continue;
            }
            if c == '\r' {
                self.advance();
                continue;
            }
            match self.state {
                LineState::LineStart => self.lex_line_start(),
                LineState::PreCommand => self.lex_pre_command(),
                LineState::AfterCommand => self.lex_after_command(),
                LineState::Arguments => self.lex_arguments(),
                LineState::ExpectCommand => self.lex_expect_command(),
            }
        }
    }

    fn lex_line_start(&mut self) {
        let c = self.cur();
        if is_blank(c) {
            self.lex_space();
            self.state = LineState::PreCommand;
        } else if c == ';' {
            self.lex_comment();
        } else if is_name_start(c) {
            // Column one: a label, unless the word is a command keyword
            // followed by its argument space (tolerance for code pasted
            // without indent).
            let start = self.pos();
            let name = self.read_name();
            if lang::lookup_command(&name).is_some() && self.peek(0) != Some('(') {
                self.push(TokenKind::Command, name, start);
                self.state = LineState::AfterCommand;
            } else {
                self.push(TokenKind::Ident, name, start);
                self.state = LineState::PreCommand;
            }
        } else {
            // Numeric labels and stray punctuation both land here; emit a
            // generic token and let the parser diagnose the line shape.
            self.lex_expr_token();
            self.state = LineState::PreCommand;
        }
    }

    fn lex_pre_command(&mut self) {
        let c = self.cur();
        if is_blank(c) {
            self.lex_space();
        } else if c == '.' {
            let start = self.pos();
            self.advance();
            self.push(TokenKind::Dot, ".".to_string(), start);
        } else if c == ';' {
            self.lex_comment();
        } else if c == '(' || self.paren_depth > 0 {
            // Formal parameter list of the label.
            self.lex_expr_token();
        } else if is_name_start(c) {
            let start = self.pos();
            let name = self.read_name();
            self.push(TokenKind::Command, name, start);
            self.state = LineState::AfterCommand;
        } else {
            self.lex_expr_token();
            self.state = LineState::Arguments;
        }
    }

    fn lex_after_command(&mut self) {
        let c = self.cur();
        if is_blank(c) {
            let run = self.lex_space();
            self.state = if run == 1 {
                LineState::Arguments
            } else {
                LineState::ExpectCommand
            };
        } else if c == ';' {
            self.lex_comment();
        } else {
            // Postconditional `:expr` glued to the command word.
            self.lex_expr_token();
        }
    }

    fn lex_arguments(&mut self) {
        let c = self.cur();
        if is_blank(c) {
            self.lex_space();
            self.state = LineState::ExpectCommand;
        } else if c == ';' {
            self.lex_comment();
        } else {
            self.lex_expr_token();
        }
    }

    fn lex_expect_command(&mut self) {
        let c = self.cur();
        if is_blank(c) {
            self.lex_space();
        } else if c == ';' {
            self.lex_comment();
        } else if is_name_start(c) && self.paren_depth == 0 {
            let start = self.pos();
            let name = self.read_name();
            self.push(TokenKind::Command, name, start);
            self.state = LineState::AfterCommand;
        } else {
            // An unclosed subscript list or a malformed chain; keep lexing
            // the expression so the index still sees its symbols.
            self.lex_expr_token();
            self.state = LineState::Arguments;
        }
    }

    fn lex_space(&mut self) -> usize {
        let start = self.pos();
        let mut text = String::new();
        while !self.eof() && is_blank(self.cur()) {
            text.push(self.cur());
            self.advance();
        }
        let run = text.len();
        self.push(TokenKind::Space, text, start);
        run
    }

    fn lex_comment(&mut self) {
        let start = self.pos();
        let mut text = String::new();
        while !self.eof() && self.cur() != '\n' {
            text.push(self.cur());
            self.advance();
        }
        self.push(TokenKind::Comment, text, start);
    }

    fn read_name(&mut self) -> String {
        let mut name = String::new();
        if !self.eof() && self.cur() == '%' {
            name.push('%');
            self.advance();
        }
        while !self.eof() && self.cur().is_ascii_alphanumeric() {
            name.push(self.cur());
            self.advance();
        }
        name
    }

    /// One expression-level token: literal, name, sigil, or operator.
    fn lex_expr_token(&mut self) {
        let c = self.cur();
        let start = self.pos();
        match c {
            '"' => self.lex_string(),
            '0'..='9' => self.lex_number(),
            '.' => {
                if self.peek(1).is_some_and(|d| d.is_ascii_digit()) {
                    self.lex_number();
                } else {
                    self.advance();
                    self.push(TokenKind::Operator, ".".to_string(), start);
                }
            }
            '$' => {
                if self.peek(1) == Some('$') {
                    // `$$LABEL` extrinsic call; the name follows as Ident.
                    self.advance();
                    self.advance();
                    self.push(TokenKind::Operator, "$$".to_string(), start);
                } else if self.peek(1).is_some_and(is_name_start) {
                    self.advance();
                    let name = self.read_name();
                    let kind = if self.peek(0) == Some('(') {
                        TokenKind::Intrinsic
                    } else {
                        TokenKind::SpecialVar
                    };
                    self.push(kind, format!("${name}"), start);
                } else {
                    self.advance();
                    self.push(TokenKind::Error, "$".to_string(), start);
                }
            }
            '^' => {
                if self.peek(1) == Some('$') {
                    self.advance();
                    self.advance();
                    self.push(TokenKind::SsvnSigil, "^$".to_string(), start);
                } else {
                    self.advance();
                    self.push(TokenKind::GlobalSigil, "^".to_string(), start);
                }
            }
            '@' => {
                self.advance();
                self.push(TokenKind::Indirection, "@".to_string(), start);
            }
            '(' => {
                self.advance();
                self.paren_depth += 1;
                self.push(TokenKind::LParen, "(".to_string(), start);
            }
            ')' => {
                self.advance();
                self.paren_depth = self.paren_depth.saturating_sub(1);
                self.push(TokenKind::RParen, ")".to_string(), start);
            }
            ',' => {
                self.advance();
                self.push(TokenKind::Comma, ",".to_string(), start);
            }
            ':' => {
                self.advance();
                self.push(TokenKind::Colon, ":".to_string(), start);
            }
            '\'' | '[' | ']' | '?' | '=' | '+' | '-' | '*' | '/' | '\\' | '#' | '_' | '<' | '>' | '&' | '!' => {
                self.advance();
                self.push(TokenKind::Operator, c.to_string(), start);
            }
            _ => {
                if is_name_start(c) {
                    let name = self.read_name();
                    self.push(TokenKind::Ident, name, start);
                } else {
                    self.advance();
                    self.push(TokenKind::Error, c.to_string(), start);
                }
            }
        }
    }

    fn lex_string(&mut self) {
        let start = self.pos();
        let mut text = String::new();
        let mut raw = String::from("\"");
        self.advance(); // opening quote
        while !self.eof() && self.cur() != '\n' {
            let c = self.cur();
            if c == '"' {
                if self.peek(1) == Some('"') {
                    text.push('"');
                    raw.push_str("\"\"");
                    self.advance();
                    self.advance();
                } else {
                    self.advance(); // closing quote
                    self.push(TokenKind::Str, text, start);
                    return;
                }
            } else {
                text.push(c);
                raw.push(c);
                self.advance();
            }
        }
        // Unterminated at end of line: error token (raw text keeps the
        // opening quote so the parser can tell it apart), resume next line.
        self.push(TokenKind::Error, raw, start);
    }

    fn lex_number(&mut self) {
        let start = self.pos();
        let mut text = String::new();
        let mut seen_dot = false;
        while !self.eof() {
            let c = self.cur();
            if c.is_ascii_digit() {
                text.push(c);
                self.advance();
            } else if c == '.' && !seen_dot && self.peek(1).is_some_and(|d| d.is_ascii_digit()) {
                seen_dot = true;
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        self.push(TokenKind::Number, text, start);
    }
}

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '%'
}
