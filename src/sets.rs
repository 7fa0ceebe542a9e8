//! Nullable / FIRST / FOLLOW / PREDICT computation (C6) over a
//! normalized [`Grammar`], by iteration to a fixed point.

use std::collections::BTreeSet;
use std::collections::BTreeMap;

use crate::grammar::Grammar;
use crate::symbol::Symbol;

/// FIRST/nullable of `seq`, read from already-finalized tables (no
/// further iteration is needed once `nullable`/`first` are fixed).
fn first_of_string_live(
    seq: &[Symbol],
    first: &BTreeMap<Symbol, BTreeSet<Symbol>>,
    nullable: &BTreeSet<Symbol>,
) -> (BTreeSet<Symbol>, bool) {
    let mut result = BTreeSet::new();
    for symbol in seq {
        if symbol.is_terminal() {
            result.insert(symbol.clone());
            return (result, false);
        }
        if let Some(set) = first.get(symbol) {
            result.extend(set.iter().cloned());
        }
        if !nullable.contains(symbol) {
            return (result, false);
        }
    }
    (result, true)
}

/// Cached nullable/FIRST/FOLLOW/PREDICT sets for a [`Grammar`].
pub struct SetsEngine {
    nullable: BTreeSet<Symbol>,
    first: BTreeMap<Symbol, BTreeSet<Symbol>>,
    follow: BTreeMap<Symbol, BTreeSet<Symbol>>,
    predict: BTreeMap<u32, BTreeSet<Symbol>>,
}

impl SetsEngine {
    pub fn compute(grammar: &Grammar) -> Self {
        let mut nullable: BTreeSet<Symbol> = BTreeSet::new();
        let mut first: BTreeMap<Symbol, BTreeSet<Symbol>> = grammar
            .non_terminals()
            .iter()
            .map(|s| (s.clone(), BTreeSet::new()))
            .collect();

        loop {
            let mut changed = false;
            for production in grammar.productions() {
                let lhs = production.lhs().clone();
                let mut additions = BTreeSet::new();
                let mut rhs_nullable = true;
                for symbol in production.rhs() {
                    if symbol.is_terminal() {
                        additions.insert(symbol.clone());
                        rhs_nullable = false;
                        break;
                    }
                    if let Some(set) = first.get(symbol) {
                        additions.extend(set.iter().cloned());
                    }
                    if !nullable.contains(symbol) {
                        rhs_nullable = false;
                        break;
                    }
                }
                let entry = first.entry(lhs.clone()).or_default();
                let before = entry.len();
                entry.extend(additions);
                if entry.len() != before {
                    changed = true;
                }
                if rhs_nullable && nullable.insert(lhs) {
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        let mut follow: BTreeMap<Symbol, BTreeSet<Symbol>> = grammar
            .non_terminals()
            .iter()
            .map(|s| (s.clone(), BTreeSet::new()))
            .collect();
        follow
            .entry(grammar.start_symbol().clone())
            .or_default()
            .insert(Symbol::EndOfInput);

        loop {
            let mut changed = false;
            for production in grammar.productions() {
                let rhs = production.rhs();
                for i in 0..rhs.len() {
                    if !rhs[i].is_non_terminal() {
                        continue;
                    }
                    let (first_beta, beta_nullable) = first_of_string_live(&rhs[i + 1..], &first, &nullable);
                    let lhs_follow = follow.get(production.lhs()).cloned().unwrap_or_default();
                    let entry = follow.entry(rhs[i].clone()).or_default();
                    let before = entry.len();
                    entry.extend(first_beta);
                    if beta_nullable {
                        entry.extend(lhs_follow);
                    }
                    if entry.len() != before {
                        changed = true;
                    }
                }
            }
            if !changed {
                break;
            }
        }

        let mut predict: BTreeMap<u32, BTreeSet<Symbol>> = BTreeMap::new();
        for production in grammar.productions() {
            let (mut set, rhs_nullable) = first_of_string_live(production.rhs(), &first, &nullable);
            if rhs_nullable {
                if let Some(lhs_follow) = follow.get(production.lhs()) {
                    set.extend(lhs_follow.iter().cloned());
                }
            }
            predict.insert(production.number(), set);
        }

        Self {
            nullable,
            first,
            follow,
            predict,
        }
    }

    pub fn is_nullable(&self, symbol: &Symbol) -> bool {
        symbol.is_epsilon() || self.nullable.contains(symbol)
    }

    pub fn first_of_symbol(&self, symbol: &Symbol) -> BTreeSet<Symbol> {
        if symbol.is_terminal() {
            let mut set = BTreeSet::new();
            set.insert(symbol.clone());
            set
        } else {
            self.first.get(symbol).cloned().unwrap_or_default()
        }
    }

    pub fn first_of_string(&self, seq: &[Symbol]) -> BTreeSet<Symbol> {
        first_of_string_live(seq, &self.first, &self.nullable).0
    }

    pub fn nullable_string(&self, seq: &[Symbol]) -> bool {
        first_of_string_live(seq, &self.first, &self.nullable).1
    }

    pub fn follow(&self, non_terminal: &Symbol) -> &BTreeSet<Symbol> {
        self.follow.get(non_terminal).unwrap_or_else(|| empty_symbol_set())
    }

    pub fn predict(&self, production_number: u32) -> &BTreeSet<Symbol> {
        self.predict.get(&production_number).unwrap_or_else(|| empty_symbol_set())
    }
}

fn empty_symbol_set() -> &'static BTreeSet<Symbol> {
    static CELL: std::sync::OnceLock<BTreeSet<Symbol>> = std::sync::OnceLock::new();
    CELL.get_or_init(BTreeSet::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{AlternativeSpec, GrammarDescription};
    use crate::mode::ParserMode;
    use crate::production::Associativity;

    fn calc_grammar() -> Grammar {
        let mut description = GrammarDescription::new(ParserMode::SLR1);
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
        description.lex = Some(crate::grammar::LexSpec {
            macros: vec![],
            start_conditions: vec![],
            rules: vec![
                crate::grammar::LexRuleDescription::token("[0-9]+", "NUM"),
                crate::grammar::LexRuleDescription::skip("[ \t]+"),
            ],
        });
        Grammar::from(description).unwrap()
    }

    #[test]
    fn follow_of_start_contains_end_of_input() {
        let grammar = calc_grammar();
        let sets = SetsEngine::compute(&grammar);
        assert!(sets.follow(grammar.start_symbol()).contains(&Symbol::EndOfInput));
    }

    #[test]
    fn predict_sets_are_terminals_or_end_of_input() {
        let grammar = calc_grammar();
        let sets = SetsEngine::compute(&grammar);
        for production in grammar.productions() {
            for symbol in sets.predict(production.number()) {
                assert!(symbol.is_terminal());
            }
        }
    }

    #[test]
    fn epsilon_grammar_nullable() {
        let mut description = GrammarDescription::new(ParserMode::LL1);
        description.bnf = vec![(
            "S".to_string(),
            vec![
                AlternativeSpec::new(vec!["'a'".to_string(), "S".to_string(), "'b'".to_string()]),
                AlternativeSpec::new(vec![]),
            ],
        )];
        let grammar = Grammar::from(description).unwrap();
        let sets = SetsEngine::compute(&grammar);
        assert!(sets.is_nullable(&Symbol::non_terminal("S")));
        assert!(sets.follow(&Symbol::non_terminal("S")).contains(&Symbol::terminal("b")));
    }
}
