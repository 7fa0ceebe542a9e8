use std::fmt;

/// Errors raised while compiling a [`crate::LexGrammar`].
#[derive(Debug)]
pub enum LexBuildError {
    RegexError(regex::Error),
    EmptyPattern,
    UnknownMacro(String),
    UnknownStartCondition(String),
    RecursiveMacro(String),
}

impl From<regex::Error> for LexBuildError {
    fn from(error: regex::Error) -> Self {
        LexBuildError::RegexError(error)
    }
}

impl fmt::Display for LexBuildError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LexBuildError::RegexError(err) => write!(f, "bad lex pattern: {err}"),
            LexBuildError::EmptyPattern => write!(f, "lex rule has an empty pattern"),
            LexBuildError::UnknownMacro(name) => write!(f, "undefined macro \"{{{name}}}\""),
            LexBuildError::UnknownStartCondition(name) => {
                write!(f, "undefined start condition \"{name}\"")
            }
            LexBuildError::RecursiveMacro(name) => {
                write!(f, "macro \"{name}\" expands to itself")
            }
        }
    }
}

impl std::error::Error for LexBuildError {}

/// A runtime lexical error: no lex rule matched at the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexError {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
    pub ch: Option<char>,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.ch {
            Some(ch) => write!(
                f,
                "unexpected character '{}' at {}:{} (offset {})",
                ch, self.line, self.column, self.offset
            ),
            None => write!(
                f,
                "unexpected end of input at {}:{} (offset {})",
                self.line, self.column, self.offset
            ),
        }
    }
}

impl std::error::Error for LexError {}
