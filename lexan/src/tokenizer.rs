use std::fmt;

use crate::error::LexError;
use crate::grammar::{LexGrammar, INITIAL};
use crate::location::{Location, Position};

/// A single lexed token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<T> {
    tag: T,
    value: String,
    location: Option<Location>,
}

impl<T> Token<T> {
    pub fn tag(&self) -> &T {
        &self.tag
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }
}

impl<T: fmt::Display> fmt::Display for Token<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} \"{}\"", self.tag, self.value)
    }
}

/// Stream of tokens over one input string, driven by a [`LexGrammar`].
///
/// Holds the mutable cursor, start-condition stack and one-token
/// lookahead cache; not shareable across parses.
pub struct Tokenizer<'g, T> {
    grammar: &'g LexGrammar<T>,
    text: &'g str,
    cursor: usize,
    line: usize,
    column: usize,
    condition_stack: Vec<String>,
    end_of_input: T,
    capture_locations: bool,
    lookahead: Option<Result<Token<T>, LexError>>,
}

impl<'g, T: Clone> Tokenizer<'g, T> {
    pub fn new(grammar: &'g LexGrammar<T>, text: &'g str, end_of_input: T, capture_locations: bool) -> Self {
        Self {
            grammar,
            text,
            cursor: 0,
            line: 1,
            column: 1,
            condition_stack: vec![INITIAL.to_string()],
            end_of_input,
            capture_locations,
            lookahead: None,
        }
    }

    fn position(&self) -> Position {
        Position {
            offset: self.cursor,
            line: self.line,
            column: self.column,
        }
    }

    fn advance_cursor(&mut self, byte_len: usize) {
        let slice = &self.text[self.cursor..self.cursor + byte_len];
        for ch in slice.chars() {
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.cursor += byte_len;
    }

    fn current_condition(&self) -> String {
        self.condition_stack
            .last()
            .cloned()
            .unwrap_or_else(|| INITIAL.to_string())
    }

    fn push_condition(&mut self, name: String) {
        self.condition_stack.push(name);
    }

    fn pop_condition(&mut self) {
        if self.condition_stack.len() > 1 {
            self.condition_stack.pop();
        }
    }

    fn location_between(&self, start: Position, end: Position) -> Option<Location> {
        if self.capture_locations {
            Some(Location::span(start, end))
        } else {
            None
        }
    }

    /// Longest-match scan for one emitted token, honoring `skip`/`more`
    /// and applying start-condition `push`/`pop` as each rule fires.
    fn scan(&mut self) -> Result<Token<T>, LexError> {
        let mut value = String::new();
        let mut token_start = self.position();
        loop {
            if self.cursor >= self.text.len() {
                return Ok(Token {
                    tag: self.end_of_input.clone(),
                    value,
                    location: self.location_between(token_start, token_start),
                });
            }

            let condition = self.current_condition();
            let active = self.grammar.active_rule_indices(&condition);
            let remaining = &self.text[self.cursor..];

            let mut best: Option<(usize, usize)> = None;
            for &idx in active {
                let rule = &self.grammar.rules()[idx];
                if let Some(m) = rule.regex.find(remaining) {
                    let len = m.end();
                    match best {
                        Some((_, best_len)) if len <= best_len => {}
                        _ => best = Some((idx, len)),
                    }
                }
            }

            let Some((idx, len)) = best else {
                let ch = remaining.chars().next();
                let err = LexError {
                    offset: self.cursor,
                    line: self.line,
                    column: self.column,
                    ch,
                };
                // Advance past the offending byte/char so a caller that
                // chooses to continue scanning does not spin forever.
                let skip_len = ch.map(|c| c.len_utf8()).unwrap_or(1);
                self.advance_cursor(skip_len.min(self.text.len() - self.cursor));
                return Err(err);
            };

            let matched_text = remaining[..len].to_string();
            self.advance_cursor(len);

            let push = self.grammar.rules()[idx].action.push.clone();
            let pop = self.grammar.rules()[idx].action.pop;
            let skip = self.grammar.rules()[idx].action.skip;
            let more = self.grammar.rules()[idx].action.more;
            let emit = self.grammar.rules()[idx].action.emit.clone();

            if let Some(name) = push {
                self.push_condition(name);
            }
            if pop {
                self.pop_condition();
            }

            if skip {
                value.clear();
                token_start = self.position();
                continue;
            }
            if more {
                value.push_str(&matched_text);
                continue;
            }
            value.push_str(&matched_text);
            if let Some(tag) = emit {
                let end = self.position();
                return Ok(Token {
                    tag,
                    value,
                    location: self.location_between(token_start, end),
                });
            }
            // No emit, not skip/more: treat as an implicit skip.
            value.clear();
            token_start = self.position();
        }
    }

    /// Returns the current lookahead token without consuming it,
    /// scanning lazily on first use.
    pub fn peek(&mut self) -> Result<&Token<T>, LexError> {
        if self.lookahead.is_none() {
            self.lookahead = Some(self.scan());
        }
        match self.lookahead.as_ref().unwrap() {
            Ok(token) => Ok(token),
            Err(err) => Err(*err),
        }
    }

    /// Consumes the current lookahead token, forcing the next `peek` to scan again.
    pub fn consume(&mut self) {
        self.lookahead = None;
    }
}

/// Tokenizes `text` eagerly into a vector, stopping at the first error
/// or once the end-of-input token has been produced.
pub fn tokenize<T: Clone>(
    grammar: &LexGrammar<T>,
    text: &str,
    end_of_input: T,
    capture_locations: bool,
) -> Result<Vec<Token<T>>, LexError>
where
    T: PartialEq,
{
    let mut tokenizer = Tokenizer::new(grammar, text, end_of_input.clone(), capture_locations);
    let mut tokens = Vec::new();
    loop {
        let token = tokenizer.peek()?.clone();
        let is_eoi = *token.tag() == end_of_input;
        tokenizer.consume();
        tokens.push(token);
        if is_eoi {
            break;
        }
    }
    Ok(tokens)
}
