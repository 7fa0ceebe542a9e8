//! LR ACTION/GOTO table assembly (C9): conflict detection and
//! precedence/associativity arbitration.

use std::collections::{BTreeMap, BTreeSet};

use crate::canonical::CanonicalCollection;
use crate::error::ConflictError;
use crate::grammar::Grammar;
use crate::mode::ParserMode;
use crate::production::Associativity;
use crate::sets::SetsEngine;
use crate::symbol::Symbol;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LRAction {
    Shift(u32),
    Reduce(u32),
    Accept,
    /// A non-associative operator used where associativity would be
    /// required to decide; a hard error at parse time rather than the
    /// ordinary "no entry" case.
    Error,
}

/// `ACTION: (state, terminal) -> Action`, `GOTO: (state, non-terminal)
/// -> state`, plus every conflict encountered while building them.
pub struct LRParsingTable {
    action: BTreeMap<(u32, Symbol), LRAction>,
    goto: BTreeMap<(u32, Symbol), u32>,
    conflicts: Vec<ConflictError>,
}

impl LRParsingTable {
    pub fn build(
        grammar: &Grammar,
        sets: &SetsEngine,
        collection: &CanonicalCollection,
        resolve_conflicts: bool,
    ) -> Result<Self, ConflictError> {
        let mut action: BTreeMap<(u32, Symbol), LRAction> = BTreeMap::new();
        let mut goto: BTreeMap<(u32, Symbol), u32> = BTreeMap::new();
        let mut conflicts: Vec<ConflictError> = Vec::new();

        for state in collection.states() {
            for (symbol, &target) in &state.transitions {
                if symbol.is_terminal() {
                    set_action(
                        &mut action,
                        &mut conflicts,
                        grammar,
                        state.id,
                        symbol.clone(),
                        LRAction::Shift(target),
                        resolve_conflicts,
                    )?;
                } else {
                    goto.insert((state.id, symbol.clone()), target);
                }
            }

            for key in state.items.reducible_keys(grammar) {
                let production = grammar
                    .production(key.production)
                    .expect("reducible item names a production that exists");
                if production.lhs().is_augmented_start() {
                    set_action(
                        &mut action,
                        &mut conflicts,
                        grammar,
                        state.id,
                        Symbol::EndOfInput,
                        LRAction::Accept,
                        resolve_conflicts,
                    )?;
                    continue;
                }
                let lookahead: Vec<Symbol> = match grammar.mode() {
                    ParserMode::LR0 => {
                        let mut all: Vec<Symbol> = grammar.terminals().iter().cloned().collect();
                        all.push(Symbol::EndOfInput);
                        all
                    }
                    ParserMode::SLR1 => sets.follow(production.lhs()).iter().cloned().collect(),
                    ParserMode::CLR1 | ParserMode::LALR1 => state
                        .items
                        .get(&key)
                        .cloned()
                        .unwrap_or_default()
                        .into_iter()
                        .collect(),
                    ParserMode::LL1 => {
                        unreachable!("LR table construction requires an LR-family grammar")
                    }
                };
                for terminal in lookahead {
                    set_action(
                        &mut action,
                        &mut conflicts,
                        grammar,
                        state.id,
                        terminal,
                        LRAction::Reduce(key.production),
                        resolve_conflicts,
                    )?;
                }
            }
        }

        Ok(Self {
            action,
            goto,
            conflicts,
        })
    }

    pub fn action(&self, state: u32, terminal: &Symbol) -> Option<&LRAction> {
        self.action.get(&(state, terminal.clone()))
    }

    pub fn goto(&self, state: u32, non_terminal: &Symbol) -> Option<u32> {
        self.goto.get(&(state, non_terminal.clone())).copied()
    }

    pub fn conflicts(&self) -> &[ConflictError] {
        &self.conflicts
    }

    /// Terminals with an ACTION entry in `state`; used to populate
    /// `UnexpectedToken`'s `expected` set.
    pub fn expected_terminals(&self, state: u32) -> BTreeSet<Symbol> {
        self.action
            .keys()
            .filter(|(s, _)| *s == state)
            .map(|(_, t)| t.clone())
            .collect()
    }
}

fn set_action(
    action: &mut BTreeMap<(u32, Symbol), LRAction>,
    conflicts: &mut Vec<ConflictError>,
    grammar: &Grammar,
    state: u32,
    terminal: Symbol,
    new_action: LRAction,
    resolve_conflicts: bool,
) -> Result<(), ConflictError> {
    let key = (state, terminal.clone());
    let Some(existing) = action.get(&key).cloned() else {
        action.insert(key, new_action);
        return Ok(());
    };

    let resolved = match (&existing, &new_action) {
        (LRAction::Shift(_), LRAction::Reduce(p)) | (LRAction::Reduce(p), LRAction::Shift(_)) => {
            let shift_action = if matches!(existing, LRAction::Shift(_)) {
                existing.clone()
            } else {
                new_action.clone()
            };
            let reduce_production = *p;
            match (
                grammar.operator_for(&terminal),
                grammar.production_precedence(reduce_production),
            ) {
                (Some((term_prec, _)), Some((prod_prec, assoc))) if term_prec != prod_prec => {
                    if term_prec > prod_prec {
                        Some(shift_action)
                    } else {
                        Some(LRAction::Reduce(reduce_production))
                    }
                }
                (Some(_), Some((_, assoc))) => match assoc {
                    Associativity::Left => Some(LRAction::Reduce(reduce_production)),
                    Associativity::Right => Some(shift_action),
                    Associativity::NonAssoc => Some(LRAction::Error),
                },
                _ => {
                    let conflict = ConflictError::ShiftReduce {
                        state,
                        terminal: terminal.clone(),
                        production: reduce_production,
                    };
                    if resolve_conflicts {
                        conflicts.push(conflict);
                        Some(shift_action)
                    } else {
                        return Err(conflict);
                    }
                }
            }
        }
        (LRAction::Reduce(p1), LRAction::Reduce(p2)) if p1 != p2 => {
            let winner = (*p1).min(*p2);
            let loser = (*p1).max(*p2);
            let conflict = ConflictError::ReduceReduce {
                state,
                terminal: terminal.clone(),
                production_a: winner,
                production_b: loser,
            };
            if resolve_conflicts {
                conflicts.push(conflict);
                Some(LRAction::Reduce(winner))
            } else {
                return Err(conflict);
            }
        }
        _ => None,
    };

    if let Some(resolved) = resolved {
        action.insert(key, resolved);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{AlternativeSpec, GrammarDescription, LexRuleDescription, LexSpec};

    fn build_table(
        mode: ParserMode,
        extra_alternatives: Vec<AlternativeSpec>,
        operators: Vec<(Associativity, Vec<String>)>,
        resolve_conflicts: bool,
    ) -> (Grammar, LRParsingTable) {
        let mut description = GrammarDescription::new(mode);
        description.tokens = vec!["NUM".to_string()];
        description.operators = operators;
        let mut alts = vec![
            AlternativeSpec::new(vec!["E".to_string(), "'+'".to_string(), "E".to_string()]),
            AlternativeSpec::new(vec!["'('".to_string(), "E".to_string(), "')'".to_string()]),
            AlternativeSpec::new(vec!["NUM".to_string()]),
        ];
        alts.extend(extra_alternatives);
        description.bnf = vec![("E".to_string(), alts)];
        description.lex = Some(LexSpec {
            macros: vec![],
            start_conditions: vec![],
            rules: vec![LexRuleDescription::token("[0-9]+", "NUM"), LexRuleDescription::skip("[ \t]+")],
        });
        let grammar = Grammar::from(description).unwrap();
        let sets = SetsEngine::compute(&grammar);
        let collection = CanonicalCollection::build(&grammar, &sets);
        let table = LRParsingTable::build(&grammar, &sets, &collection, resolve_conflicts).unwrap();
        (grammar, table)
    }

    #[test]
    fn precedence_resolves_shift_reduce_without_conflict_report() {
        let (_, table) = build_table(
            ParserMode::SLR1,
            vec![AlternativeSpec::new(vec!["E".to_string(), "'*'".to_string(), "E".to_string()])],
            vec![
                (Associativity::Left, vec!["+".to_string()]),
                (Associativity::Left, vec!["*".to_string()]),
            ],
            false,
        );
        assert!(table.conflicts().is_empty());
    }

    #[test]
    fn right_assoc_prefers_shift_at_equal_precedence() {
        let (grammar, table) = build_table(
            ParserMode::SLR1,
            vec![AlternativeSpec::new(vec!["E".to_string(), "'^'".to_string(), "E".to_string()])],
            vec![(Associativity::Right, vec!["^".to_string()])],
            false,
        );
        // Find a state with a shift on '^' reachable after "E ^ E" and
        // confirm the action at that state on '^' is a shift, not a reduce.
        let _ = &grammar;
        let caret = Symbol::terminal("^");
        let has_shift_on_caret =
            (0..10u32).any(|state| matches!(table.action(state, &caret), Some(LRAction::Shift(_))));
        assert!(has_shift_on_caret);
    }

    #[test]
    fn nonassoc_yields_error_action_at_equal_precedence() {
        let (_, table) = build_table(
            ParserMode::SLR1,
            vec![AlternativeSpec::new(vec!["E".to_string(), "'<'".to_string(), "E".to_string()])],
            vec![(Associativity::NonAssoc, vec!["<".to_string()])],
            false,
        );
        let less = Symbol::terminal("<");
        let has_error_action = (0..10u32).any(|state| matches!(table.action(state, &less), Some(LRAction::Error)));
        assert!(has_error_action);
    }

    #[test]
    fn missing_precedence_conflict_aborts_unless_resolved() {
        let mut description = GrammarDescription::new(ParserMode::SLR1);
        description.tokens = vec!["NUM".to_string()];
        description.bnf = vec![(
            "E".to_string(),
            vec![
                AlternativeSpec::new(vec!["E".to_string(), "'+'".to_string(), "E".to_string()]),
                AlternativeSpec::new(vec!["NUM".to_string()]),
            ],
        )];
        description.lex = Some(LexSpec {
            macros: vec![],
            start_conditions: vec![],
            rules: vec![LexRuleDescription::token("[0-9]+", "NUM"), LexRuleDescription::skip("[ \t]+")],
        });
        let grammar = Grammar::from(description).unwrap();
        let sets = SetsEngine::compute(&grammar);
        let collection = CanonicalCollection::build(&grammar, &sets);
        assert!(LRParsingTable::build(&grammar, &sets, &collection, false).is_err());
        let resolved = LRParsingTable::build(&grammar, &sets, &collection, true).unwrap();
        assert!(!resolved.conflicts().is_empty());
    }
}
