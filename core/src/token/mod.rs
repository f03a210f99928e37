pub mod lexer;
pub mod span;


pub use lexer::{Lexer, Token, TokenKind};
pub use span::{Position, Span, offset_to_position, slice_chars};
