use std::collections::HashMap;

use regex::Regex;

use crate::error::LexBuildError;
use crate::rule::{LexRule, LexRuleSpec, StartConditions};

pub const INITIAL: &str = "INITIAL";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartConditionKind {
    Inclusive,
    Exclusive,
}

/// Uncompiled lexical grammar: macros, start-condition declarations and
/// rules in declaration order.
#[derive(Debug, Clone, Default)]
pub struct LexGrammarSpec<T> {
    pub macros: Vec<(String, String)>,
    pub start_conditions: Vec<(String, StartConditionKind)>,
    pub rules: Vec<LexRuleSpec<T>>,
}

impl<T> LexGrammarSpec<T> {
    pub fn new() -> Self {
        Self {
            macros: Vec::new(),
            start_conditions: Vec::new(),
            rules: Vec::new(),
        }
    }

    pub fn with_macro(mut self, name: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.macros.push((name.into(), pattern.into()));
        self
    }

    pub fn with_start_condition(mut self, name: impl Into<String>, kind: StartConditionKind) -> Self {
        self.start_conditions.push((name.into(), kind));
        self
    }

    pub fn with_rule(mut self, rule: LexRuleSpec<T>) -> Self {
        self.rules.push(rule);
        self
    }
}

fn is_macro_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn expand_macros(pattern: &str, macros: &HashMap<&str, &str>) -> Result<String, LexBuildError> {
    let mut out = String::with_capacity(pattern.len());
    let bytes = pattern.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'{' {
            if let Some(end) = pattern[i + 1..].find('}') {
                let name = &pattern[i + 1..i + 1 + end];
                // Regex repetition counts ("{2}", "{2,3}") use the same
                // braces; only identifier-shaped names are macro references.
                if is_macro_name(name) {
                    let replacement = macros
                        .get(name)
                        .ok_or_else(|| LexBuildError::UnknownMacro(name.to_string()))?;
                    out.push_str(replacement);
                    i += end + 2;
                    continue;
                }
            }
        }
        // Safe: we only need to find ASCII '{'/'}'; everything else is
        // copied byte-for-byte including multi-byte UTF-8 sequences.
        out.push(pattern[i..].chars().next().unwrap());
        i += pattern[i..].chars().next().unwrap().len_utf8();
    }
    Ok(out)
}

fn expand_macros_fully(
    name: Option<&str>,
    pattern: &str,
    macros: &HashMap<&str, &str>,
) -> Result<String, LexBuildError> {
    // One textual expansion pass, as macros are not expected to
    // reference each other recursively; a macro that still contains its
    // own name after expansion is rejected rather than looped forever.
    let expanded = expand_macros(pattern, macros)?;
    if let Some(name) = name {
        if expanded.contains(&format!("{{{name}}}")) {
            return Err(LexBuildError::RecursiveMacro(name.to_string()));
        }
    }
    Ok(expanded)
}

/// A compiled lexical grammar: the ordered rule list plus precomputed
/// per-start-condition active-rule indices.
#[derive(Debug)]
pub struct LexGrammar<T> {
    rules: Vec<LexRule<T>>,
    start_conditions: HashMap<String, StartConditionKind>,
    active_rules: HashMap<String, Vec<usize>>,
}

impl<T> LexGrammar<T> {
    pub fn compile(spec: LexGrammarSpec<T>) -> Result<Self, LexBuildError> {
        let macro_map: HashMap<&str, &str> = spec
            .macros
            .iter()
            .map(|(n, p)| (n.as_str(), p.as_str()))
            .collect();

        let mut rules = Vec::with_capacity(spec.rules.len());
        for rule_spec in spec.rules {
            if rule_spec.pattern.is_empty() {
                return Err(LexBuildError::EmptyPattern);
            }
            let expanded = expand_macros_fully(None, &rule_spec.pattern, &macro_map)?;
            let anchored = format!("\\A(?:{expanded})");
            let regex = Regex::new(&anchored)?;
            rules.push(LexRule {
                pattern: expanded,
                regex,
                start_conditions: rule_spec.start_conditions,
                action: rule_spec.action,
            });
        }

        let mut start_conditions: HashMap<String, StartConditionKind> = spec
            .start_conditions
            .into_iter()
            .collect();
        start_conditions
            .entry(INITIAL.to_string())
            .or_insert(StartConditionKind::Inclusive);

        // Validate that every condition a rule names was declared (or is INITIAL).
        for rule in &rules {
            if let StartConditions::Named(names) = &rule.start_conditions {
                for name in names {
                    if !start_conditions.contains_key(name) {
                        return Err(LexBuildError::UnknownStartCondition(name.clone()));
                    }
                }
            }
        }

        let mut active_rules = HashMap::new();
        for condition in start_conditions.keys() {
            let kind = start_conditions[condition];
            let indices: Vec<usize> = rules
                .iter()
                .enumerate()
                .filter(|(_, rule)| match &rule.start_conditions {
                    StartConditions::Always => kind != StartConditionKind::Exclusive,
                    StartConditions::Named(names) => names.iter().any(|n| n == condition),
                })
                .map(|(idx, _)| idx)
                .collect();
            active_rules.insert(condition.clone(), indices);
        }

        Ok(Self {
            rules,
            start_conditions,
            active_rules,
        })
    }

    pub fn rules(&self) -> &[LexRule<T>] {
        &self.rules
    }

    pub fn start_condition_kind(&self, name: &str) -> Option<StartConditionKind> {
        self.start_conditions.get(name).copied()
    }

    pub fn active_rule_indices(&self, condition: &str) -> &[usize] {
        self.active_rules
            .get(condition)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}
