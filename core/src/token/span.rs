use std::fmt;

use serde::Serialize;

/// 1-based line/column plus absolute char offset into the document text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
    pub offset: usize,
}

impl Position {
    pub fn new(line: u32, column: u32, offset: usize) -> Self {
        Self { line, column, offset }
    }

    pub fn start() -> Self {
        Self {
            line: 1,
            column: 1,
            offset: 0,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    pub fn single(pos: Position) -> Self {
        Self {
            start: pos.clone(),
            end: pos,
        }
    }

    /// Half-open containment test against an absolute char offset.
    pub fn contains_offset(&self, offset: usize) -> bool {
        offset >= self.start.offset && offset < self.end.offset
    }

    /// Containment test against a 1-based line/column cursor.
    pub fn contains(&self, line: u32, column: u32) -> bool {
        if line != self.start.line {
            return false;
        }
        column >= self.start.column && column < self.end.column
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start.line == self.end.line {
            write!(f, "{}:{}-{}", self.start.line, self.start.column, self.end.column)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// Slice a text by char offsets (spans count chars, not bytes).
pub fn slice_chars(text: &str, start: usize, end: usize) -> String {
    text.chars().skip(start).take(end.saturating_sub(start)).collect()
}

/// Helper to convert a char offset to a line/column position.
pub fn offset_to_position(text: &str, offset: usize) -> Position {
    let mut line = 1;
    let mut column = 1;

    for (i, ch) in text.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }

    Position::new(line, column, offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_to_position() {
        let text = "EN ;entry\n S X=1\n Q";

        assert_eq!(offset_to_position(text, 0), Position::new(1, 1, 0));
        assert_eq!(offset_to_position(text, 9), Position::new(1, 10, 9)); // at '\n'
        assert_eq!(offset_to_position(text, 10), Position::new(2, 1, 10)); // start of line 2
    }

    #[test]
    fn test_span_contains() {
        let span = Span::new(Position::new(2, 4, 14), Position::new(2, 9, 19));
        assert!(span.contains(2, 4));
        assert!(span.contains(2, 8));
        assert!(!span.contains(2, 9));
        assert!(!span.contains(1, 5));
        assert!(span.contains_offset(14));
        assert!(!span.contains_offset(19));
    }

    #[test]
    fn test_span_display() {
        let span = Span::new(Position::new(1, 5, 4), Position::new(1, 10, 9));
        assert_eq!(span.to_string(), "1:5-10");
    }
}
