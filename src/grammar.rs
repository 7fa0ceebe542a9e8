//! Grammar normalization (C5): turns a loosely-structured description
//! into a `Grammar` with numbered productions, classified symbols, an
//! operator table and a compiled lex grammar.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use lexan::{LexAction, LexGrammar, LexGrammarSpec, LexRuleSpec, StartConditionKind, StartConditions};

use crate::error::GrammarError;
use crate::mode::ParserMode;
use crate::production::{Associativity, OperatorLevel, OperatorTable, Production};
use crate::symbol::Symbol;

/// One `RHS` alternative as supplied by the caller, in one of the three
/// shapes the normalizer recognizes: `[rhs, action]`, `[rhs, action,
/// {prec: tag}]`, or `[rhs, {prec: tag}]`.
#[derive(Debug, Clone, Default)]
pub struct AlternativeSpec {
    /// RHS symbols as they appear in source: a quoted literal (`"'+'"`),
    /// a declared token name, or a non-terminal identifier.
    pub rhs: Vec<String>,
    pub action: Option<String>,
    pub precedence_tag: Option<String>,
}

impl AlternativeSpec {
    pub fn new(rhs: Vec<String>) -> Self {
        Self {
            rhs,
            action: None,
            precedence_tag: None,
        }
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn with_precedence_tag(mut self, tag: impl Into<String>) -> Self {
        self.precedence_tag = Some(tag.into());
        self
    }
}

/// One lex rule as supplied by the caller, pre-compilation.
#[derive(Debug, Clone)]
pub struct LexRuleDescription {
    pub pattern: String,
    pub start_conditions: StartConditions,
    /// `Some(name)` emits the named terminal; `None` is a skip rule
    /// unless `more` is set.
    pub terminal: Option<String>,
    pub more: bool,
    pub push: Option<String>,
    pub pop: bool,
}

impl LexRuleDescription {
    pub fn token(pattern: impl Into<String>, terminal: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            start_conditions: StartConditions::Always,
            terminal: Some(terminal.into()),
            more: false,
            push: None,
            pop: false,
        }
    }

    pub fn skip(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            start_conditions: StartConditions::Always,
            terminal: None,
            more: false,
            push: None,
            pop: false,
        }
    }

    pub fn under(mut self, start_conditions: StartConditions) -> Self {
        self.start_conditions = start_conditions;
        self
    }

    pub fn push_condition(mut self, name: impl Into<String>) -> Self {
        self.push = Some(name.into());
        self
    }

    pub fn pop_condition(mut self) -> Self {
        self.pop = true;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct LexSpec {
    pub macros: Vec<(String, String)>,
    pub start_conditions: Vec<(String, StartConditionKind)>,
    pub rules: Vec<LexRuleDescription>,
}

/// The whole, unnormalized grammar description: the input to
/// [`Grammar::from`].
#[derive(Debug, Clone)]
pub struct GrammarDescription {
    pub bnf: Vec<(String, Vec<AlternativeSpec>)>,
    pub lex: Option<LexSpec>,
    pub tokens: Vec<String>,
    pub operators: Vec<(Associativity, Vec<String>)>,
    pub start: Option<String>,
    pub module_include: Option<String>,
    pub mode: ParserMode,
    pub capture_locations: bool,
}

impl GrammarDescription {
    pub fn new(mode: ParserMode) -> Self {
        Self {
            bnf: Vec::new(),
            lex: None,
            tokens: Vec::new(),
            operators: Vec::new(),
            start: None,
            module_include: None,
            mode,
            capture_locations: false,
        }
    }
}

fn classify(name: &str, declared_tokens: &HashSet<String>) -> Symbol {
    if name.len() >= 2 && name.starts_with('\'') && name.ends_with('\'') {
        Symbol::terminal(&name[1..name.len() - 1])
    } else if declared_tokens.contains(name) {
        Symbol::terminal(name)
    } else {
        Symbol::non_terminal(name)
    }
}

/// Normalized view of the whole grammar (C5): numbered productions,
/// classified symbols, operator table, augmented production and
/// compiled lex grammar. Built once by [`Grammar::from`] and immutable
/// thereafter.
pub struct Grammar {
    productions: Vec<Production>,
    terminals: BTreeSet<Symbol>,
    non_terminals: BTreeSet<Symbol>,
    tokens: BTreeSet<Symbol>,
    operators: OperatorTable,
    start_symbol: Symbol,
    augmented_production: Option<u32>,
    lex_grammar: LexGrammar<Symbol>,
    mode: ParserMode,
    capture_locations: bool,
    effective_precedence: BTreeMap<u32, (u32, Associativity)>,
    productions_by_lhs: BTreeMap<Symbol, Vec<u32>>,
    productions_containing: BTreeMap<Symbol, Vec<u32>>,
}

impl Grammar {
    pub fn from(description: GrammarDescription) -> Result<Self, GrammarError> {
        if description.bnf.is_empty() {
            return Err(GrammarError::EmptyGrammar);
        }

        let declared_tokens: HashSet<String> = description.tokens.iter().cloned().collect();

        let start_name = description
            .start
            .clone()
            .unwrap_or_else(|| description.bnf[0].0.clone());
        if !description.bnf.iter().any(|(lhs, _)| lhs == &start_name) {
            return Err(GrammarError::UndefinedStartSymbol(start_name));
        }
        let start_symbol = Symbol::non_terminal(start_name.as_str());

        let operators = OperatorTable::from_levels(
            description
                .operators
                .iter()
                .map(|(assoc, names)| {
                    OperatorLevel::new(*assoc, names.iter().map(|n| Symbol::terminal(n.as_str())).collect())
                })
                .collect(),
        );

        let mut productions = Vec::new();
        let mut literal_terminal_names: BTreeSet<String> = BTreeSet::new();
        let mut token_terminal_names: BTreeSet<String> = BTreeSet::new();

        let augmented_production = if description.mode.is_lr() {
            productions.push(Production::new(0, Symbol::augmented_start(), vec![start_symbol.clone()], None, None));
            Some(0)
        } else {
            None
        };

        let mut number = 1u32;
        for (lhs_name, alternatives) in &description.bnf {
            let lhs = Symbol::non_terminal(lhs_name.as_str());
            for alt in alternatives {
                let mut rhs = Vec::with_capacity(alt.rhs.len());
                for raw in &alt.rhs {
                    let symbol = classify(raw, &declared_tokens);
                    match &symbol {
                        Symbol::Terminal(name) => {
                            if raw.starts_with('\'') {
                                literal_terminal_names.insert(name.to_string());
                            } else {
                                token_terminal_names.insert(name.to_string());
                            }
                        }
                        _ => {}
                    }
                    rhs.push(symbol);
                }
                if augmented_production == Some(0) && rhs.is_empty() && lhs == start_symbol {
                    return Err(GrammarError::EpsilonOnAugmentedRhs);
                }
                productions.push(Production::new(
                    number,
                    lhs.clone(),
                    rhs,
                    alt.action.clone(),
                    alt.precedence_tag.clone(),
                ));
                number += 1;
            }
        }

        let mut effective_precedence = BTreeMap::new();
        for production in &productions {
            let resolved = if let Some(tag) = production.precedence_tag() {
                let (prec, assoc) = operators
                    .precedence(tag)
                    .zip(operators.associativity(tag))
                    .ok_or_else(|| GrammarError::UnknownPrecedenceTag(tag.to_string()))?;
                Some((prec, assoc))
            } else if let Some(terminal) = production.rhs_last_terminal() {
                operators
                    .precedence(terminal.name())
                    .zip(operators.associativity(terminal.name()))
            } else {
                None
            };
            if let Some(resolved) = resolved {
                effective_precedence.insert(production.number(), resolved);
            }
        }

        let mut terminals: BTreeSet<Symbol> = BTreeSet::new();
        let mut non_terminals: BTreeSet<Symbol> = BTreeSet::new();
        let mut tokens: BTreeSet<Symbol> = BTreeSet::new();
        for production in &productions {
            non_terminals.insert(production.lhs().clone());
            for symbol in production.rhs() {
                match symbol {
                    Symbol::Terminal(name) => {
                        terminals.insert(symbol.clone());
                        if token_terminal_names.contains(&**name) {
                            tokens.insert(symbol.clone());
                        }
                    }
                    Symbol::NonTerminal(_) => {
                        non_terminals.insert(symbol.clone());
                    }
                    _ => {}
                }
            }
        }

        let lex_grammar = build_lex_grammar(
            description.lex,
            &literal_terminal_names,
            &token_terminal_names,
            &terminals,
        )?;

        let mut productions_by_lhs: BTreeMap<Symbol, Vec<u32>> = BTreeMap::new();
        let mut productions_containing: BTreeMap<Symbol, Vec<u32>> = BTreeMap::new();
        for production in &productions {
            productions_by_lhs
                .entry(production.lhs().clone())
                .or_default()
                .push(production.number());
            for symbol in production.rhs() {
                productions_containing
                    .entry(symbol.clone())
                    .or_default()
                    .push(production.number());
            }
        }

        Ok(Self {
            productions,
            terminals,
            non_terminals,
            tokens,
            operators,
            start_symbol,
            augmented_production,
            lex_grammar,
            mode: description.mode,
            capture_locations: description.capture_locations,
            effective_precedence,
            productions_by_lhs,
            productions_containing,
        })
    }

    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    pub fn production(&self, number: u32) -> Option<&Production> {
        self.productions.get(number as usize)
    }

    pub fn terminals(&self) -> &BTreeSet<Symbol> {
        &self.terminals
    }

    pub fn non_terminals(&self) -> &BTreeSet<Symbol> {
        &self.non_terminals
    }

    pub fn tokens(&self) -> &BTreeSet<Symbol> {
        &self.tokens
    }

    pub fn operators(&self) -> &OperatorTable {
        &self.operators
    }

    pub fn operator_for(&self, terminal: &Symbol) -> Option<(u32, Associativity)> {
        self.operators
            .precedence(terminal.name())
            .zip(self.operators.associativity(terminal.name()))
    }

    pub fn production_precedence(&self, production_number: u32) -> Option<(u32, Associativity)> {
        self.effective_precedence.get(&production_number).copied()
    }

    pub fn productions_with_lhs(&self, symbol: &Symbol) -> &[u32] {
        self.productions_by_lhs
            .get(symbol)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn productions_containing(&self, symbol: &Symbol) -> &[u32] {
        self.productions_containing
            .get(symbol)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn augmented_production(&self) -> Option<&Production> {
        self.augmented_production.map(|n| &self.productions[n as usize])
    }

    pub fn lex_grammar(&self) -> &LexGrammar<Symbol> {
        &self.lex_grammar
    }

    pub fn mode(&self) -> ParserMode {
        self.mode
    }

    pub fn capture_locations(&self) -> bool {
        self.capture_locations
    }

    pub fn start_symbol(&self) -> &Symbol {
        &self.start_symbol
    }
}

fn build_lex_grammar(
    lex: Option<LexSpec>,
    literal_terminal_names: &BTreeSet<String>,
    token_terminal_names: &BTreeSet<String>,
    all_terminals: &BTreeSet<Symbol>,
) -> Result<LexGrammar<Symbol>, GrammarError> {
    let lex = lex.unwrap_or_default();
    let mut spec: LexGrammarSpec<Symbol> = LexGrammarSpec::new();
    for (name, pattern) in lex.macros {
        spec = spec.with_macro(name, pattern);
    }
    for (name, kind) in lex.start_conditions {
        spec = spec.with_start_condition(name, kind);
    }

    let mut covered: BTreeSet<String> = BTreeSet::new();
    for rule in lex.rules {
        if let Some(name) = &rule.terminal {
            covered.insert(name.clone());
        }
        let mut action = if let Some(name) = &rule.terminal {
            LexAction::token(Symbol::terminal(name.as_str()))
        } else if rule.more {
            LexAction::more()
        } else {
            LexAction::skip()
        };
        if let Some(push_to) = rule.push {
            action = action.push_condition(push_to);
        }
        if rule.pop {
            action = action.pop_condition();
        }
        spec = spec.with_rule(LexRuleSpec::new(rule.pattern, action).under(rule.start_conditions));
    }

    for name in literal_terminal_names {
        if !covered.contains(name) {
            spec = spec.with_rule(LexRuleSpec::new(
                regex::escape(name),
                LexAction::token(Symbol::terminal(name.as_str())),
            ));
            covered.insert(name.clone());
        }
    }

    for name in token_terminal_names {
        if !covered.contains(name) {
            let terminal = all_terminals
                .iter()
                .find(|t| t.name() == name)
                .cloned()
                .unwrap_or_else(|| Symbol::terminal(name.as_str()));
            return Err(GrammarError::UnmatchedTerminal(terminal));
        }
    }

    LexGrammar::compile(spec).map_err(|err| GrammarError::LexGrammarError(err.to_string()))
}
