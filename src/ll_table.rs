//! LL(1) parsing table (C10): PREDICT-set driven, `(nonTerminal,
//! terminal) -> productionNumber`.

use std::collections::BTreeMap;

use crate::error::ConflictError;
use crate::grammar::Grammar;
use crate::sets::SetsEngine;
use crate::symbol::Symbol;

pub struct LLParsingTable {
    table: BTreeMap<(Symbol, Symbol), u32>,
    conflicts: Vec<ConflictError>,
}

impl LLParsingTable {
    pub fn build(grammar: &Grammar, sets: &SetsEngine, resolve_conflicts: bool) -> Result<Self, ConflictError> {
        let mut table: BTreeMap<(Symbol, Symbol), u32> = BTreeMap::new();
        let mut conflicts = Vec::new();

        for production in grammar.productions() {
            for terminal in sets.predict(production.number()) {
                let key = (production.lhs().clone(), terminal.clone());
                match table.get(&key).copied() {
                    None => {
                        table.insert(key, production.number());
                    }
                    Some(existing) if existing != production.number() => {
                        let winner = existing.min(production.number());
                        let loser = existing.max(production.number());
                        let conflict = ConflictError::FirstFirst {
                            non_terminal: production.lhs().clone(),
                            terminal: terminal.clone(),
                            production_a: winner,
                            production_b: loser,
                        };
                        if resolve_conflicts {
                            conflicts.push(conflict);
                            table.insert(key, winner);
                        } else {
                            return Err(conflict);
                        }
                    }
                    Some(_) => {}
                }
            }
        }

        Ok(Self { table, conflicts })
    }

    pub fn production_for(&self, non_terminal: &Symbol, terminal: &Symbol) -> Option<u32> {
        self.table.get(&(non_terminal.clone(), terminal.clone())).copied()
    }

    pub fn conflicts(&self) -> &[ConflictError] {
        &self.conflicts
    }
}
