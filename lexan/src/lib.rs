//! Regex-based longest-match tokenizer with start-condition stacks.
//!
//! `lexan` compiles an ordered list of lex rules (each an anchored regex,
//! an action, and a set of start conditions) into a [`LexGrammar`], and
//! drives it over an input string with a [`Tokenizer`].

mod error;
mod grammar;
mod location;
mod rule;
mod tokenizer;

pub use error::{LexBuildError, LexError};
pub use grammar::{LexGrammar, LexGrammarSpec, StartConditionKind, INITIAL};
pub use location::{Location, Position};
pub use rule::{LexAction, LexRule, LexRuleSpec, StartConditions};
pub use tokenizer::{tokenize, Token, Tokenizer};
