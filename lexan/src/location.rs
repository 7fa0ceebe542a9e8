use std::fmt;

/// A single point in the input text: byte offset plus 1-based line/column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn start() -> Self {
        Self {
            offset: 0,
            line: 1,
            column: 1,
        }
    }
}

/// The span of text a token or reduction covers.
///
/// `end_offset` is exclusive; lines and columns are 1-based and column
/// resets to 1 immediately after a `\n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Location {
    pub start_offset: usize,
    pub end_offset: usize,
    pub start_line: usize,
    pub end_line: usize,
    pub start_column: usize,
    pub end_column: usize,
}

impl Location {
    pub fn span(start: Position, end: Position) -> Self {
        Self {
            start_offset: start.offset,
            end_offset: end.offset,
            start_line: start.line,
            end_line: end.line,
            start_column: start.column,
            end_column: end.column,
        }
    }

    /// A zero-width location at `pos`, used for epsilon reductions.
    pub fn zero_width(pos: Position) -> Self {
        Self::span(pos, pos)
    }

    /// The span from `self`'s start to `other`'s end.
    pub fn through(&self, other: &Location) -> Self {
        Self {
            start_offset: self.start_offset,
            end_offset: other.end_offset,
            start_line: self.start_line,
            end_line: other.end_line,
            start_column: self.start_column,
            end_column: other.end_column,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}:{}-{}:{}",
            self.start_line, self.start_column, self.end_line, self.end_column
        )
    }
}
