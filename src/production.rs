//! Productions and the operator precedence/associativity table.

use std::collections::HashMap;

use crate::symbol::Symbol;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Associativity {
    Left,
    Right,
    NonAssoc,
}

/// One level of the operator table: a shared associativity and the
/// terminals that sit at that precedence.
#[derive(Debug, Clone)]
pub struct OperatorLevel {
    pub associativity: Associativity,
    pub terminals: Vec<Symbol>,
}

impl OperatorLevel {
    pub fn new(associativity: Associativity, terminals: Vec<Symbol>) -> Self {
        Self {
            associativity,
            terminals,
        }
    }
}

/// Ordered operator table. Level index is 1-based; higher index binds
/// tighter, matching the declaration-order convention of `%left`/`%right`
/// directives where later declarations take precedence.
#[derive(Debug, Clone, Default)]
pub struct OperatorTable {
    levels: Vec<OperatorLevel>,
    precedence_of: HashMap<String, (u32, Associativity)>,
}

impl OperatorTable {
    pub fn from_levels(levels: Vec<OperatorLevel>) -> Self {
        let mut precedence_of = HashMap::new();
        for (index, level) in levels.iter().enumerate() {
            let precedence = (index + 1) as u32;
            for terminal in &level.terminals {
                precedence_of.insert(terminal.name().to_string(), (precedence, level.associativity));
            }
        }
        Self {
            levels,
            precedence_of,
        }
    }

    pub fn levels(&self) -> &[OperatorLevel] {
        &self.levels
    }

    /// Looks up a terminal by its bare name (e.g. `+`, not `'+'`).
    pub fn precedence(&self, terminal_name: &str) -> Option<u32> {
        self.precedence_of.get(terminal_name).map(|(p, _)| *p)
    }

    pub fn associativity(&self, terminal_name: &str) -> Option<Associativity> {
        self.precedence_of.get(terminal_name).map(|(_, a)| a).copied()
    }

    pub fn contains(&self, terminal_name: &str) -> bool {
        self.precedence_of.contains_key(terminal_name)
    }
}

/// `(number, LHS, RHS, action?, precedence?)`.
///
/// `precedence_tag` is the terminal name an explicit `%prec` annotation
/// names; when absent, the production inherits the precedence of the
/// last terminal in its RHS (resolved by [`crate::grammar::Grammar`]).
#[derive(Debug, Clone)]
pub struct Production {
    number: u32,
    lhs: Symbol,
    rhs: Vec<Symbol>,
    action: Option<String>,
    precedence_tag: Option<String>,
}

impl Production {
    pub fn new(
        number: u32,
        lhs: Symbol,
        rhs: Vec<Symbol>,
        action: Option<String>,
        precedence_tag: Option<String>,
    ) -> Self {
        Self {
            number,
            lhs,
            rhs,
            action,
            precedence_tag,
        }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn lhs(&self) -> &Symbol {
        &self.lhs
    }

    pub fn rhs(&self) -> &[Symbol] {
        &self.rhs
    }

    pub fn is_empty(&self) -> bool {
        self.rhs.is_empty()
    }

    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    pub fn precedence_tag(&self) -> Option<&str> {
        self.precedence_tag.as_deref()
    }

    /// The last terminal in the RHS, used as the implicit precedence
    /// source when no `%prec` tag is given.
    pub fn rhs_last_terminal(&self) -> Option<&Symbol> {
        self.rhs.iter().rev().find(|s| s.is_terminal() && !s.is_end_of_input())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_level_binds_tighter() {
        let table = OperatorTable::from_levels(vec![
            OperatorLevel::new(Associativity::Left, vec![Symbol::terminal("+")]),
            OperatorLevel::new(Associativity::Left, vec![Symbol::terminal("*")]),
        ]);
        assert!(table.precedence("*").unwrap() > table.precedence("+").unwrap());
        assert_eq!(table.associativity("+"), Some(Associativity::Left));
        assert!(!table.contains("^"));
    }

    #[test]
    fn rhs_last_terminal_skips_non_terminals() {
        let p = Production::new(
            1,
            Symbol::non_terminal("E"),
            vec![
                Symbol::non_terminal("E"),
                Symbol::terminal("+"),
                Symbol::non_terminal("E"),
            ],
            None,
            None,
        );
        assert_eq!(p.rhs_last_terminal(), Some(&Symbol::terminal("+")));
    }
}
