//! LR items and item sets (C8): `(production, dotPosition, lookaheadSet?)`.
//!
//! `ItemKey` is deliberately lightweight — just production number and
//! dot position — so it is cheap to use as a map key; anything that
//! needs the symbols either side of the dot looks them up on the
//! [`Grammar`] that owns the production.

use std::collections::{BTreeMap, BTreeSet};

use crate::grammar::Grammar;
use crate::symbol::Symbol;

pub type LookaheadSet = BTreeSet<Symbol>;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemKey {
    pub production: u32,
    pub dot: usize,
}

impl ItemKey {
    pub fn start(production: u32) -> Self {
        Self { production, dot: 0 }
    }

    pub fn shifted(&self) -> Self {
        Self {
            production: self.production,
            dot: self.dot + 1,
        }
    }

    pub fn next_symbol<'g>(&self, grammar: &'g Grammar) -> Option<&'g Symbol> {
        grammar.production(self.production)?.rhs().get(self.dot)
    }

    pub fn is_closable(&self, grammar: &Grammar) -> bool {
        matches!(self.next_symbol(grammar), Some(symbol) if symbol.is_non_terminal())
    }

    pub fn is_reducible(&self, grammar: &Grammar) -> bool {
        match grammar.production(self.production) {
            Some(p) => self.dot >= p.rhs().len(),
            None => false,
        }
    }

    /// Dot not at position 0, or this is the augmented start item —
    /// the stable identity basis for a state.
    pub fn is_kernel_item(&self, grammar: &Grammar) -> bool {
        if self.dot > 0 {
            return true;
        }
        grammar
            .production(self.production)
            .map(|p| p.lhs().is_augmented_start())
            .unwrap_or(false)
    }

    /// The symbols strictly after the one the dot currently precedes;
    /// used to seed lookaheads during closure (`FIRST(beta . L)`).
    pub fn rhs_tail<'g>(&self, grammar: &'g Grammar) -> &'g [Symbol] {
        match grammar.production(self.production) {
            Some(p) if self.dot < p.rhs().len() => &p.rhs()[self.dot + 1..],
            _ => &[],
        }
    }
}

/// A set of LR items with their lookahead sets, keyed by `ItemKey`.
/// `BTreeMap` keeps iteration deterministic, which matters for
/// declaration-order tie-breaks downstream.
#[derive(Debug, Clone, Default)]
pub struct ItemSet(BTreeMap<ItemKey, LookaheadSet>);

impl ItemSet {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn insert(&mut self, key: ItemKey, lookahead: LookaheadSet) -> Option<LookaheadSet> {
        self.0.insert(key, lookahead)
    }

    pub fn get(&self, key: &ItemKey) -> Option<&LookaheadSet> {
        self.0.get(key)
    }

    pub fn get_mut(&mut self, key: &ItemKey) -> Option<&mut LookaheadSet> {
        self.0.get_mut(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ItemKey, &LookaheadSet)> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &ItemKey> {
        self.0.keys()
    }

    /// Items whose next symbol (after the dot) is a non-terminal —
    /// these are the ones that trigger closure.
    pub fn closables(&self, grammar: &Grammar) -> Vec<(ItemKey, LookaheadSet)> {
        self.0
            .iter()
            .filter(|(key, _)| key.is_closable(grammar))
            .map(|(key, set)| (key.clone(), set.clone()))
            .collect()
    }

    pub fn reducible_keys(&self, grammar: &Grammar) -> Vec<ItemKey> {
        self.0
            .keys()
            .filter(|key| key.is_reducible(grammar))
            .cloned()
            .collect()
    }

    /// The kernel subset — the identity of a state, ignoring
    /// lookaheads.
    pub fn kernel(&self, grammar: &Grammar) -> BTreeSet<ItemKey> {
        self.0
            .keys()
            .filter(|key| key.is_kernel_item(grammar))
            .cloned()
            .collect()
    }

    /// A fresh `ItemSet` containing only the kernel entries, lookaheads
    /// intact; feeding this through `closure` regenerates the rest.
    pub fn kernel_item_set(&self, grammar: &Grammar) -> ItemSet {
        let mut result = ItemSet::new();
        for (key, lookahead) in self.0.iter() {
            if key.is_kernel_item(grammar) {
                result.insert(key.clone(), lookahead.clone());
            }
        }
        result
    }

    /// The kernel of the state reached via `GOTO(self, symbol)`: every
    /// item whose next symbol is `symbol`, shifted one place, keeping
    /// its lookahead.
    pub fn generate_goto_kernel(&self, grammar: &Grammar, symbol: &Symbol) -> ItemSet {
        let mut result = ItemSet::new();
        for (key, lookahead) in self.0.iter() {
            if key.next_symbol(grammar) == Some(symbol) {
                result.insert(key.shifted(), lookahead.clone());
            }
        }
        result
    }
}
