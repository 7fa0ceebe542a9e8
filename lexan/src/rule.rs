use regex::Regex;

/// Which start conditions a rule is active under.
#[derive(Debug, Clone)]
pub enum StartConditions {
    /// Active under every inclusive start condition (and under any
    /// exclusive condition is never reached unless also named).
    Always,
    /// Active only under the named conditions.
    Named(Vec<String>),
}

impl StartConditions {
    pub fn named<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        StartConditions::Named(names.into_iter().map(Into::into).collect())
    }
}

/// What a rule does once it wins the longest-match competition.
///
/// Fields are independent instructions; the tokenizer applies them in a
/// fixed order after the match: first `push`/`pop` the start-condition
/// stack, then either emit a token, `skip` the lexeme, or extend the
/// current lexeme with `more` and keep scanning.
#[derive(Debug, Clone, Default)]
pub struct LexAction<T> {
    pub emit: Option<T>,
    pub skip: bool,
    pub more: bool,
    pub push: Option<String>,
    pub pop: bool,
}

impl<T> LexAction<T> {
    pub fn token(tag: T) -> Self {
        Self {
            emit: Some(tag),
            ..Default::default()
        }
    }

    pub fn skip() -> Self {
        Self {
            skip: true,
            ..Default::default()
        }
    }

    pub fn more() -> Self {
        Self {
            more: true,
            ..Default::default()
        }
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

/// An uncompiled lex rule, as supplied by a grammar description.
#[derive(Debug, Clone)]
pub struct LexRuleSpec<T> {
    /// Regex source, possibly containing `{macro_name}` references.
    pub pattern: String,
    pub start_conditions: StartConditions,
    pub action: LexAction<T>,
}

impl<T> LexRuleSpec<T> {
    pub fn new(pattern: impl Into<String>, action: LexAction<T>) -> Self {
        Self {
            pattern: pattern.into(),
            start_conditions: StartConditions::Always,
            action,
        }
    }

    pub fn under(mut self, start_conditions: StartConditions) -> Self {
        self.start_conditions = start_conditions;
        self
    }
}

/// A compiled lex rule: an anchored regex matcher plus its action.
#[derive(Debug)]
pub struct LexRule<T> {
    pub(crate) pattern: String,
    pub(crate) regex: Regex,
    pub(crate) start_conditions: StartConditions,
    pub(crate) action: LexAction<T>,
}

impl<T> LexRule<T> {
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn action(&self) -> &LexAction<T> {
        &self.action
    }

    pub fn start_conditions(&self) -> &StartConditions {
        &self.start_conditions
    }
}
