//! Hand-written error types. Every fallible construction or parse
//! returns one of these; nothing here prints — formatting a message for
//! a human is a caller concern.

use std::collections::BTreeSet;
use std::fmt;

use crate::symbol::Symbol;

/// Malformed grammar description, detected during normalization
/// (`Grammar::from`) or table construction.
#[derive(Debug, Clone)]
pub enum GrammarError {
    UndefinedStartSymbol(String),
    UnknownPrecedenceTag(String),
    EpsilonOnAugmentedRhs,
    EmptyGrammar,
    UnmatchedTerminal(Symbol),
    LexGrammarError(String),
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GrammarError::UndefinedStartSymbol(name) => {
                write!(f, "start symbol \"{name}\" has no productions")
            }
            GrammarError::UnknownPrecedenceTag(tag) => {
                write!(f, "precedence tag \"{tag}\" does not name a declared operator")
            }
            GrammarError::EpsilonOnAugmentedRhs => {
                write!(f, "augmented production's RHS may not be empty")
            }
            GrammarError::EmptyGrammar => write!(f, "grammar has no productions"),
            GrammarError::UnmatchedTerminal(symbol) => {
                write!(f, "terminal {symbol} has no matching lex rule")
            }
            GrammarError::LexGrammarError(message) => write!(f, "lex grammar error: {message}"),
        }
    }
}

impl std::error::Error for GrammarError {}

/// An unresolved conflict in an LR or LL table, surfaced when the table
/// was built with `resolve_conflicts = false`.
#[derive(Debug, Clone)]
pub enum ConflictError {
    ShiftReduce {
        state: u32,
        terminal: Symbol,
        production: u32,
    },
    ReduceReduce {
        state: u32,
        terminal: Symbol,
        production_a: u32,
        production_b: u32,
    },
    FirstFirst {
        non_terminal: Symbol,
        terminal: Symbol,
        production_a: u32,
        production_b: u32,
    },
}

impl fmt::Display for ConflictError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConflictError::ShiftReduce {
                state,
                terminal,
                production,
            } => write!(
                f,
                "shift/reduce conflict in state {state} on {terminal}: shift vs reduce by production {production}"
            ),
            ConflictError::ReduceReduce {
                state,
                terminal,
                production_a,
                production_b,
            } => write!(
                f,
                "reduce/reduce conflict in state {state} on {terminal}: production {production_a} vs {production_b}"
            ),
            ConflictError::FirstFirst {
                non_terminal,
                terminal,
                production_a,
                production_b,
            } => write!(
                f,
                "FIRST/FIRST conflict on {non_terminal} under {terminal}: production {production_a} vs {production_b}"
            ),
        }
    }
}

impl std::error::Error for ConflictError {}

/// A runtime parse failure: the tokenizer or the driven automaton
/// rejected the input.
#[derive(Debug, Clone)]
pub enum ParseError {
    UnexpectedToken {
        found: Symbol,
        found_text: String,
        state: u32,
        expected: BTreeSet<Symbol>,
    },
    UnexpectedInput {
        offset: usize,
        line: usize,
        column: usize,
        ch: Option<char>,
    },
    NonAssociativeConflict {
        terminal: Symbol,
        offset: usize,
    },
    Internal(InternalError),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParseError::UnexpectedToken {
                found,
                found_text,
                state,
                expected,
            } => {
                let expected_list: Vec<String> = expected.iter().map(|s| s.to_string()).collect();
                write!(
                    f,
                    "unexpected token {found} (\"{found_text}\") in state {state}; expected one of: {}",
                    expected_list.join(", ")
                )
            }
            ParseError::UnexpectedInput {
                offset,
                line,
                column,
                ch,
            } => match ch {
                Some(ch) => write!(
                    f,
                    "unexpected character '{ch}' at {line}:{column} (offset {offset})"
                ),
                None => write!(f, "unexpected end of input at {line}:{column} (offset {offset})"),
            },
            ParseError::NonAssociativeConflict { terminal, offset } => write!(
                f,
                "non-associative operator {terminal} used consecutively at offset {offset}"
            ),
            ParseError::Internal(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ParseError {}

impl From<lexan::LexError> for ParseError {
    fn from(err: lexan::LexError) -> Self {
        ParseError::UnexpectedInput {
            offset: err.offset,
            line: err.line,
            column: err.column,
            ch: err.ch,
        }
    }
}

impl From<InternalError> for ParseError {
    fn from(err: InternalError) -> Self {
        ParseError::Internal(err)
    }
}

/// Invariant violation that should never happen; indicates a bug in
/// this crate rather than a malformed grammar or input.
#[derive(Debug, Clone)]
pub struct InternalError(pub String);

impl fmt::Display for InternalError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "internal error: {}", self.0)
    }
}

impl std::error::Error for InternalError {}
