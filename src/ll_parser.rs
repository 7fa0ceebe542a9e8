//! Predictive (LL) driver (C12).
//!
//! A table-driven top-down parser needs an explicit stack since the
//! host language's call stack can't be rewound to try a different
//! alternative; the control stack mixes pending grammar symbols with
//! `Reduce` markers that fire a production's semantic action once all
//! of its RHS symbols have been matched.

use lexan::{Location, Tokenizer};

use crate::error::{InternalError, ParseError};
use crate::grammar::Grammar;
use crate::ll_table::LLParsingTable;
use crate::lr_parser::SemanticActionEvaluator;
use crate::symbol::Symbol;

enum ControlEntry {
    Symbol(Symbol),
    Reduce(u32),
}

struct ValueSlot<V> {
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

fn combine_locations<V>(popped: &[ValueSlot<V>], lookahead: Option<&Location>) -> Option<Location> {
    let first = popped.first().and_then(|slot| slot.location.as_ref());
    let last = popped.last().and_then(|slot| slot.location.as_ref());
    match (first, last) {
        (Some(first), Some(last)) => Some(first.through(last)),
        _ => lookahead.map(zero_width_at),
    }
}

pub fn parse_ll<V: Clone>(
    grammar: &Grammar,
    table: &LLParsingTable,
    input: &str,
    evaluator: &mut impl SemanticActionEvaluator<V>,
) -> Result<ParseOutcome<V>, ParseError> {
    let mut tokenizer = Tokenizer::new(
        grammar.lex_grammar(),
        input,
        Symbol::EndOfInput,
        grammar.capture_locations(),
    );

    let mut control_stack = vec![
        ControlEntry::Symbol(Symbol::EndOfInput),
        ControlEntry::Symbol(grammar.start_symbol().clone()),
    ];
    let mut value_stack: Vec<ValueSlot<V>> = Vec::new();

    loop {
        let token = tokenizer.peek()?.clone();
        let tag = token.tag().clone();

        match control_stack.last() {
            None => {
                return Err(InternalError("control stack is empty".to_string()).into());
            }
            Some(ControlEntry::Symbol(symbol)) if symbol.is_end_of_input() => {
                if tag.is_end_of_input() {
                    let top = value_stack
                        .pop()
                        .ok_or_else(|| InternalError("value stack empty at accept".to_string()))?;
                    return Ok(ParseOutcome {
                        value: top.value,
                        location: top.location,
                    });
                }
                return Err(ParseError::UnexpectedToken {
                    found: tag,
                    found_text: token.value().to_string(),
                    state: 0,
                    expected: std::iter::once(Symbol::EndOfInput).collect(),
                });
            }
            Some(ControlEntry::Symbol(symbol)) if symbol.is_terminal() => {
                if *symbol != tag {
                    return Err(ParseError::UnexpectedToken {
                        found: tag,
                        found_text: token.value().to_string(),
                        state: 0,
                        expected: std::iter::once(symbol.clone()).collect(),
                    });
                }
                control_stack.pop();
                value_stack.push(ValueSlot {
                    value: evaluator.token_value(&token),
                    location: token.location().cloned(),
                });
                tokenizer.consume();
            }
            Some(ControlEntry::Symbol(non_terminal)) => {
                let Some(production_number) = table.production_for(non_terminal, &tag) else {
                    return Err(ParseError::UnexpectedToken {
                        found: tag,
                        found_text: token.value().to_string(),
                        state: 0,
                        expected: std::iter::once(non_terminal.clone()).collect(),
                    });
                };
                control_stack.pop();
                let production = grammar.production(production_number).ok_or_else(|| {
                    InternalError(format!("predicted production {production_number} does not exist"))
                })?;
                control_stack.push(ControlEntry::Reduce(production_number));
                for symbol in production.rhs().iter().rev() {
                    control_stack.push(ControlEntry::Symbol(symbol.clone()));
                }
            }
            Some(ControlEntry::Reduce(production_number)) => {
                let production_number = *production_number;
                let production = grammar.production(production_number).ok_or_else(|| {
                    InternalError(format!("reduce marker names unknown production {production_number}"))
                })?;
                let rhs_len = production.rhs().len();
                let start_index = value_stack.len() - rhs_len;
                let popped = value_stack.split_off(start_index);
                let location = combine_locations(&popped, token.location());
                let result_value = if production.action().is_some() {
                    let rhs_values: Vec<V> = popped.iter().map(|slot| slot.value.clone()).collect();
                    evaluator.evaluate(production_number, rhs_values)
                } else if let Some(first) = popped.into_iter().next() {
                    first.value
                } else {
                    evaluator.default_value()
                };
                control_stack.pop();
                value_stack.push(ValueSlot {
                    value: result_value,
                    location,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{AlternativeSpec, GrammarDescription, LexRuleDescription, LexSpec};
    use crate::mode::ParserMode;
    use crate::sets::SetsEngine;

    struct UnitEvaluator;

    impl SemanticActionEvaluator<()> for UnitEvaluator {
        fn default_value(&self) {}
        fn token_value(&self, _token: &lexan::Token<Symbol>) {}
        fn evaluate(&mut self, _production_number: u32, _rhs_values: Vec<()>) {}
    }

    fn matched_brackets() -> (Grammar, LLParsingTable) {
        let mut description = GrammarDescription::new(ParserMode::LL1);
        description.bnf = vec![(
            "S".to_string(),
            vec![
                AlternativeSpec::new(vec!["'a'".to_string(), "S".to_string(), "'b'".to_string()]),
                AlternativeSpec::new(vec![]),
            ],
        )];
        description.lex = Some(LexSpec {
            macros: vec![],
            start_conditions: vec![],
            rules: vec![LexRuleDescription::token("a", "a"), LexRuleDescription::token("b", "b")],
        });
        let grammar = Grammar::from(description).unwrap();
        let sets = SetsEngine::compute(&grammar);
        let table = LLParsingTable::build(&grammar, &sets, false).unwrap();
        (grammar, table)
    }

    #[test]
    fn accepts_balanced_input() {
        let (grammar, table) = matched_brackets();
        let mut evaluator = UnitEvaluator;
        assert!(parse_ll(&grammar, &table, "aabb", &mut evaluator).is_ok());
    }

    #[test]
    fn rejects_unbalanced_input() {
        let (grammar, table) = matched_brackets();
        let mut evaluator = UnitEvaluator;
        let err = parse_ll(&grammar, &table, "aab", &mut evaluator).unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { .. }));
    }

    #[test]
    fn accepts_empty_input() {
        let (grammar, table) = matched_brackets();
        let mut evaluator = UnitEvaluator;
        assert!(parse_ll(&grammar, &table, "", &mut evaluator).is_ok());
    }
}
