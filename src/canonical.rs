//! Canonical collection construction (C8): closures, GOTO, and the BFS
//! worklist that assembles the states for the chosen [`ParserMode`].

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::grammar::Grammar;
use crate::item::{ItemKey, ItemSet, LookaheadSet};
use crate::mode::ParserMode;
use crate::sets::SetsEngine;
use crate::symbol::Symbol;

/// One state of the canonical collection: its closed item set and its
/// outgoing transitions on symbols.
#[derive(Debug, Clone)]
pub struct ParserState {
    pub id: u32,
    pub items: ItemSet,
    pub transitions: BTreeMap<Symbol, u32>,
}

/// The canonical collection of LR states, built for one [`ParserMode`].
pub struct CanonicalCollection {
    states: Vec<ParserState>,
    mode: ParserMode,
}

/// Repeatedly add items for each closable item's producing
/// non-terminal until no change (spec 4.3's `closure`).
fn closure(grammar: &Grammar, sets: &SetsEngine, mode: ParserMode, kernel: ItemSet) -> ItemSet {
    let mut items = kernel;
    loop {
        let mut changed = false;
        for (key, lookahead) in items.closables(grammar) {
            let target = key.next_symbol(grammar).expect("closable item has a next symbol").clone();
            let beta = key.rhs_tail(grammar).to_vec();
            for &production_number in grammar.productions_with_lhs(&target) {
                let new_key = ItemKey::start(production_number);
                let new_lookahead: LookaheadSet = if mode.tracks_item_lookaheads() {
                    let mut set = sets.first_of_string(&beta);
                    if sets.nullable_string(&beta) {
                        set.extend(lookahead.iter().cloned());
                    }
                    set
                } else {
                    LookaheadSet::new()
                };
                match items.get_mut(&new_key) {
                    Some(existing) => {
                        let before = existing.len();
                        existing.extend(new_lookahead);
                        if existing.len() != before {
                            changed = true;
                        }
                    }
                    None => {
                        items.insert(new_key, new_lookahead);
                        changed = true;
                    }
                }
            }
        }
        if !changed {
            break;
        }
    }
    items
}

/// The identity signature used to recognize "the same state": kernel
/// item keys always, plus lookaheads too under CLR(1) (where distinct
/// lookaheads mean distinct states rather than a merge target).
fn kernel_signature(
    closed: &ItemSet,
    grammar: &Grammar,
    mode: ParserMode,
) -> Vec<(ItemKey, LookaheadSet)> {
    closed
        .iter()
        .filter(|(key, _)| key.is_kernel_item(grammar))
        .map(|(key, lookahead)| {
            let lookahead = if mode == ParserMode::CLR1 {
                lookahead.clone()
            } else {
                LookaheadSet::new()
            };
            (key.clone(), lookahead)
        })
        .collect()
}

impl CanonicalCollection {
    pub fn build(grammar: &Grammar, sets: &SetsEngine) -> Self {
        let mode = grammar.mode();
        let start_production = grammar
            .augmented_production()
            .expect("canonical collection construction requires an LR (augmented) grammar")
            .number();

        let initial_lookahead = if mode.tracks_item_lookaheads() {
            let mut set = LookaheadSet::new();
            set.insert(Symbol::EndOfInput);
            set
        } else {
            LookaheadSet::new()
        };
        let mut initial_kernel = ItemSet::new();
        initial_kernel.insert(ItemKey::start(start_production), initial_lookahead);
        let initial = closure(grammar, sets, mode, initial_kernel);

        let mut kernel_index: BTreeMap<Vec<(ItemKey, LookaheadSet)>, u32> = BTreeMap::new();
        kernel_index.insert(kernel_signature(&initial, grammar, mode), 0);

        let mut states = vec![ParserState {
            id: 0,
            items: initial,
            transitions: BTreeMap::new(),
        }];

        let mut worklist: VecDeque<u32> = VecDeque::new();
        worklist.push_back(0);

        while let Some(state_id) = worklist.pop_front() {
            let symbols: Vec<Symbol> = {
                let mut syms: BTreeSet<Symbol> = BTreeSet::new();
                for key in states[state_id as usize].items.keys() {
                    if let Some(symbol) = key.next_symbol(grammar) {
                        syms.insert(symbol.clone());
                    }
                }
                syms.into_iter().collect()
            };

            for symbol in symbols {
                let goto_kernel = states[state_id as usize]
                    .items
                    .generate_goto_kernel(grammar, &symbol);
                if goto_kernel.is_empty() {
                    continue;
                }
                let closed = closure(grammar, sets, mode, goto_kernel);
                let signature = kernel_signature(&closed, grammar, mode);

                if let Some(&existing_id) = kernel_index.get(&signature) {
                    if mode == ParserMode::LALR1 {
                        let mut grew = false;
                        for (key, lookahead) in closed.iter() {
                            if !key.is_kernel_item(grammar) {
                                continue;
                            }
                            if let Some(existing_set) =
                                states[existing_id as usize].items.get_mut(key)
                            {
                                let before = existing_set.len();
                                existing_set.extend(lookahead.iter().cloned());
                                if existing_set.len() != before {
                                    grew = true;
                                }
                            }
                        }
                        if grew {
                            let kernel_only =
                                states[existing_id as usize].items.kernel_item_set(grammar);
                            states[existing_id as usize].items =
                                closure(grammar, sets, mode, kernel_only);
                            worklist.push_back(existing_id);
                        }
                    }
                    states[state_id as usize]
                        .transitions
                        .insert(symbol, existing_id);
                } else {
                    let new_id = states.len() as u32;
                    kernel_index.insert(signature, new_id);
                    states.push(ParserState {
                        id: new_id,
                        items: closed,
                        transitions: BTreeMap::new(),
                    });
                    states[state_id as usize].transitions.insert(symbol, new_id);
                    worklist.push_back(new_id);
                }
            }
        }

        Self { states, mode }
    }

    pub fn states(&self) -> &[ParserState] {
        &self.states
    }

    pub fn state(&self, id: u32) -> &ParserState {
        &self.states[id as usize]
    }

    pub fn mode(&self) -> ParserMode {
        self.mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{AlternativeSpec, GrammarDescription, LexRuleDescription, LexSpec};
    use crate::production::Associativity;

    fn calc_grammar(mode: ParserMode) -> Grammar {
        let mut description = GrammarDescription::new(mode);
        description.tokens = vec!["NUM".to_string()];
        description.operators = vec![
            (Associativity::Left, vec!["+".to_string()]),
            (Associativity::Left, vec!["*".to_string()]),
        ];
        description.bnf = vec![(
            "E".to_string(),
            vec![
                AlternativeSpec::new(vec!["E".to_string(), "'+'".to_string(), "E".to_string()]),
                AlternativeSpec::new(vec!["E".to_string(), "'*'".to_string(), "E".to_string()]),
                AlternativeSpec::new(vec!["'('".to_string(), "E".to_string(), "')'".to_string()]),
                AlternativeSpec::new(vec!["NUM".to_string()]),
            ],
        )];
        description.lex = Some(LexSpec {
            macros: vec![],
            start_conditions: vec![],
            rules: vec![LexRuleDescription::token("[0-9]+", "NUM"), LexRuleDescription::skip("[ \t]+")],
        });
        Grammar::from(description).unwrap()
    }

    #[test]
    fn lalr1_has_same_state_count_as_lr0() {
        let lr0_grammar = calc_grammar(ParserMode::LR0);
        let lr0_sets = SetsEngine::compute(&lr0_grammar);
        let lr0 = CanonicalCollection::build(&lr0_grammar, &lr0_sets);

        let lalr1_grammar = calc_grammar(ParserMode::LALR1);
        let lalr1_sets = SetsEngine::compute(&lalr1_grammar);
        let lalr1 = CanonicalCollection::build(&lalr1_grammar, &lalr1_sets);

        assert_eq!(lr0.states().len(), lalr1.states().len());
    }

    #[test]
    fn clr1_has_at_least_as_many_states_as_lalr1() {
        let lalr1_grammar = calc_grammar(ParserMode::LALR1);
        let lalr1_sets = SetsEngine::compute(&lalr1_grammar);
        let lalr1 = CanonicalCollection::build(&lalr1_grammar, &lalr1_sets);

        let clr1_grammar = calc_grammar(ParserMode::CLR1);
        let clr1_sets = SetsEngine::compute(&clr1_grammar);
        let clr1 = CanonicalCollection::build(&clr1_grammar, &clr1_sets);

        assert!(clr1.states().len() >= lalr1.states().len());
    }

    #[test]
    fn initial_state_contains_augmented_item() {
        let grammar = calc_grammar(ParserMode::SLR1);
        let sets = SetsEngine::compute(&grammar);
        let collection = CanonicalCollection::build(&grammar, &sets);
        assert!(collection.state(0).items.get(&ItemKey::start(0)).is_some());
    }
}
