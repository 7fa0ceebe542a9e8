//! Shift/reduce driver (C11).
//!
//! Keeps the shape of `lalr1_plus::Parser`'s drive loop — a stack of
//! `(state, value, location)` frames, shift/reduce/accept dispatch, a
//! pluggable semantic-action evaluator — but looks actions up in a
//! computed [`LRParsingTable`] instead of a generated per-state match.

use lexan::{Location, Token, Tokenizer};

use crate::error::{InternalError, ParseError};
use crate::grammar::Grammar;
use crate::lr_table::{LRAction, LRParsingTable};
use crate::symbol::Symbol;

/// Computes the semantic value of a reduction and the value attached
/// to a shifted token. The production's opaque `action` text (if any)
/// is the caller's concern: the driver only tells the evaluator which
/// production fired and hands it the already-computed child values.
pub trait SemanticActionEvaluator<V> {
    fn default_value(&self) -> V;
    fn token_value(&self, token: &Token<Symbol>) -> V;
    fn evaluate(&mut self, production_number: u32, rhs_values: Vec<V>) -> V;
}

struct StackFrame<V> {
    state: u32,
    value: V,
    location: Option<Location>,
}

pub struct ParseOutcome<V> {
    pub value: V,
    pub location: Option<Location>,
}

fn zero_width_at(location: &Location) -> Location {
    Location {
        start_offset: location.start_offset,
        end_offset: location.start_offset,
        start_line: location.start_line,
        end_line: location.start_line,
        start_column: location.start_column,
        end_column: location.start_column,
    }
}

fn combine_locations<V>(popped: &[StackFrame<V>], lookahead: Option<&Location>) -> Option<Location> {
    let first = popped.first().and_then(|f| f.location.as_ref());
    let last = popped.last().and_then(|f| f.location.as_ref());
    match (first, last) {
        (Some(first), Some(last)) => Some(first.through(last)),
        _ => lookahead.map(zero_width_at),
    }
}

pub fn parse_lr<V: Clone>(
    grammar: &Grammar,
    table: &LRParsingTable,
    input: &str,
    evaluator: &mut impl SemanticActionEvaluator<V>,
) -> Result<ParseOutcome<V>, ParseError> {
    let mut tokenizer = Tokenizer::new(
        grammar.lex_grammar(),
        input,
        Symbol::EndOfInput,
        grammar.capture_locations(),
    );
    let mut stack: Vec<StackFrame<V>> = vec![StackFrame {
        state: 0,
        value: evaluator.default_value(),
        location: None,
    }];

    loop {
        let current_state = stack
            .last()
            .ok_or_else(|| InternalError("parse stack is empty".to_string()))?
            .state;
        let token = tokenizer.peek()?.clone();
        let tag = token.tag().clone();

        match table.action(current_state, &tag).cloned() {
            Some(LRAction::Shift(next_state)) => {
                let value = evaluator.token_value(&token);
                let location = token.location().cloned();
                stack.push(StackFrame {
                    state: next_state,
                    value,
                    location,
                });
                tokenizer.consume();
            }
            Some(LRAction::Reduce(production_number)) => {
                let production = grammar.production(production_number).ok_or_else(|| {
                    InternalError(format!("reduce targets unknown production {production_number}"))
                })?;
                let rhs_len = production.rhs().len();
                let start_index = stack.len() - rhs_len;
                let popped = stack.split_off(start_index);
                let location = combine_locations(&popped, token.location());
                let result_value = if production.action().is_some() {
                    let rhs_values: Vec<V> = popped.iter().map(|frame| frame.value.clone()).collect();
                    evaluator.evaluate(production_number, rhs_values)
                } else if let Some(first) = popped.into_iter().next() {
                    first.value
                } else {
                    evaluator.default_value()
                };
                let base_state = stack
                    .last()
                    .ok_or_else(|| InternalError("parse stack is empty".to_string()))?
                    .state;
                let goto_state = table.goto(base_state, production.lhs()).ok_or_else(|| {
                    InternalError(format!(
                        "GOTO[{base_state}, {}] missing after reducing by production {production_number}",
                        production.lhs()
                    ))
                })?;
                stack.push(StackFrame {
                    state: goto_state,
                    value: result_value,
                    location,
                });
            }
            Some(LRAction::Accept) => {
                let top = stack
                    .pop()
                    .ok_or_else(|| InternalError("parse stack is empty at accept".to_string()))?;
                return Ok(ParseOutcome {
                    value: top.value,
                    location: top.location,
                });
            }
            Some(LRAction::Error) => {
                return Err(ParseError::NonAssociativeConflict {
                    terminal: tag,
                    offset: token.location().map(|loc| loc.start_offset).unwrap_or(0),
                });
            }
            None => {
                return Err(ParseError::UnexpectedToken {
                    found: tag,
                    found_text: token.value().to_string(),
                    state: current_state,
                    expected: table.expected_terminals(current_state),
                });
            }
        }
    }
}
