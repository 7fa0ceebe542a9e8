//! End-to-end parsing scenarios: build a grammar, construct tables, and
//! drive real input strings through the LR and LL automata.

use lalrgen::{
    AlternativeSpec, CanonicalCollection, Grammar, GrammarDescription, LLParsingTable,
    LRParsingTable, LexRuleDescription, LexSpec, ParseError, ParserMode, SemanticActionEvaluator,
    SetsEngine, Symbol, Token,
};

#[derive(Debug, Clone, PartialEq)]
enum CalcValue {
    Number(i64),
    None,
}

impl CalcValue {
    fn as_i64(&self) -> i64 {
        match self {
            CalcValue::Number(n) => *n,
            CalcValue::None => 0,
        }
    }
}

struct CalcEvaluator;

impl SemanticActionEvaluator<CalcValue> for CalcEvaluator {
    fn default_value(&self) -> CalcValue {
        CalcValue::None
    }

    fn token_value(&self, token: &Token<Symbol>) -> CalcValue {
        token.value().parse::<i64>().map(CalcValue::Number).unwrap_or(CalcValue::None)
    }

    fn evaluate(&mut self, production_number: u32, rhs: Vec<CalcValue>) -> CalcValue {
        match production_number {
            1 => CalcValue::Number(if rhs[0].as_i64() < rhs[2].as_i64() { 1 } else { 0 }),
            2 => CalcValue::Number(rhs[0].as_i64() + rhs[2].as_i64()),
            3 => CalcValue::Number(rhs[0].as_i64() * rhs[2].as_i64()),
            4 => CalcValue::Number(rhs[0].as_i64().pow(rhs[2].as_i64() as u32)),
            5 => rhs[1].clone(),
            _ => CalcValue::None,
        }
    }
}

/// `E -> E'<'E | E'+'E | E'*'E | E'^'E | '('E')' | NUM`, with `<`
/// loosest, `^` tightest and right-associative, matching a
/// conventional calculator precedence ladder.
fn calc_description(mode: ParserMode, capture_locations: bool) -> GrammarDescription {
    use lalrgen::Associativity::*;
    let mut description = GrammarDescription::new(mode);
    description.tokens = vec!["NUM".to_string()];
    description.capture_locations = capture_locations;
    description.operators = vec![
        (NonAssoc, vec!["<".to_string()]),
        (Left, vec!["+".to_string()]),
        (Left, vec!["*".to_string()]),
        (Right, vec!["^".to_string()]),
    ];
    description.bnf = vec![(
        "E".to_string(),
        vec![
            AlternativeSpec::new(vec!["E".to_string(), "'<'".to_string(), "E".to_string()]).with_action("cmp"),
            AlternativeSpec::new(vec!["E".to_string(), "'+'".to_string(), "E".to_string()]).with_action("add"),
            AlternativeSpec::new(vec!["E".to_string(), "'*'".to_string(), "E".to_string()]).with_action("mul"),
            AlternativeSpec::new(vec!["E".to_string(), "'^'".to_string(), "E".to_string()]).with_action("pow"),
            AlternativeSpec::new(vec!["'('".to_string(), "E".to_string(), "')'".to_string()]).with_action("paren"),
            AlternativeSpec::new(vec!["NUM".to_string()]),
        ],
    )];
    description.lex = Some(LexSpec {
        macros: vec![],
        start_conditions: vec![],
        rules: vec![LexRuleDescription::token("[0-9]+", "NUM"), LexRuleDescription::skip("[ \t]+")],
    });
    description
}

fn calc_table(mode: ParserMode, capture_locations: bool) -> (Grammar, LRParsingTable) {
    let grammar = Grammar::from(calc_description(mode, capture_locations)).unwrap();
    let sets = SetsEngine::compute(&grammar);
    let collection = CanonicalCollection::build(&grammar, &sets);
    let table = LRParsingTable::build(&grammar, &sets, &collection, false).unwrap();
    (grammar, table)
}

#[test]
fn calculator_respects_precedence() {
    let (grammar, table) = calc_table(ParserMode::SLR1, false);
    let mut evaluator = CalcEvaluator;
    let outcome = lalrgen::parse_lr(&grammar, &table, "2 + 3 * 4", &mut evaluator).unwrap();
    assert_eq!(outcome.value, CalcValue::Number(14));
}

#[test]
fn parens_override_precedence() {
    let (grammar, table) = calc_table(ParserMode::SLR1, false);
    let mut evaluator = CalcEvaluator;
    let outcome = lalrgen::parse_lr(&grammar, &table, "(2+3)*4", &mut evaluator).unwrap();
    assert_eq!(outcome.value, CalcValue::Number(20));
}

#[test]
fn doubled_operator_is_a_syntax_error() {
    let (grammar, table) = calc_table(ParserMode::SLR1, false);
    let mut evaluator = CalcEvaluator;
    let err = lalrgen::parse_lr(&grammar, &table, "2 + + 3", &mut evaluator).unwrap_err();
    assert!(matches!(err, ParseError::UnexpectedToken { .. }));
}

#[test]
fn right_associative_power_nests_to_the_right() {
    let (grammar, table) = calc_table(ParserMode::SLR1, false);
    let mut evaluator = CalcEvaluator;
    // 2 ^ 3 ^ 2 == 2 ^ (3 ^ 2) == 2 ^ 9 == 512, not (2 ^ 3) ^ 2 == 64.
    let outcome = lalrgen::parse_lr(&grammar, &table, "2 ^ 3 ^ 2", &mut evaluator).unwrap();
    assert_eq!(outcome.value, CalcValue::Number(512));
}

#[test]
fn chained_comparison_is_a_nonassociative_runtime_error() {
    let (grammar, table) = calc_table(ParserMode::SLR1, false);
    let mut evaluator = CalcEvaluator;
    let err = lalrgen::parse_lr(&grammar, &table, "1 < 2 < 3", &mut evaluator).unwrap_err();
    assert!(matches!(err, ParseError::NonAssociativeConflict { .. }));
}

#[test]
fn location_capture_spans_the_whole_expression() {
    let (grammar, table) = calc_table(ParserMode::SLR1, true);
    let mut evaluator = CalcEvaluator;
    let outcome = lalrgen::parse_lr(&grammar, &table, "12 + 345", &mut evaluator).unwrap();
    let location = outcome.location.expect("location capture was enabled");
    assert_eq!(location.start_offset, 0);
    assert_eq!(location.end_offset, 8);
}

#[test]
fn lalr1_and_clr1_agree_on_value_but_clr1_never_has_fewer_states() {
    let (lalr_grammar, lalr_table) = calc_table(ParserMode::LALR1, false);
    let (clr_grammar, clr_table) = calc_table(ParserMode::CLR1, false);

    let mut evaluator = CalcEvaluator;
    let lalr_outcome = lalrgen::parse_lr(&lalr_grammar, &lalr_table, "2 + 3 * 4", &mut evaluator).unwrap();
    let clr_outcome = lalrgen::parse_lr(&clr_grammar, &clr_table, "2 + 3 * 4", &mut evaluator).unwrap();
    assert_eq!(lalr_outcome.value, clr_outcome.value);

    let lalr_sets = SetsEngine::compute(&lalr_grammar);
    let lalr_states = CanonicalCollection::build(&lalr_grammar, &lalr_sets).states().len();
    let clr_sets = SetsEngine::compute(&clr_grammar);
    let clr_states = CanonicalCollection::build(&clr_grammar, &clr_sets).states().len();
    assert!(clr_states >= lalr_states);
}

struct UnitEvaluator;

impl SemanticActionEvaluator<()> for UnitEvaluator {
    fn default_value(&self) {}
    fn token_value(&self, _token: &Token<Symbol>) {}
    fn evaluate(&mut self, _production_number: u32, _rhs: Vec<()>) {}
}

fn matched_brackets_ll_table() -> (Grammar, LLParsingTable) {
    let mut description = GrammarDescription::new(ParserMode::LL1);
    description.bnf = vec![(
        "S".to_string(),
        vec![
            AlternativeSpec::new(vec!["'a'".to_string(), "S".to_string(), "'b'".to_string()]),
            AlternativeSpec::new(vec![]),
        ],
    )];
    description.lex = Some(LexSpec {
        macros: vec![],
        start_conditions: vec![],
        rules: vec![LexRuleDescription::token("a", "a"), LexRuleDescription::token("b", "b")],
    });
    let grammar = Grammar::from(description).unwrap();
    let sets = SetsEngine::compute(&grammar);
    let table = LLParsingTable::build(&grammar, &sets, false).unwrap();
    (grammar, table)
}

#[test]
fn ll1_accepts_balanced_nesting() {
    let (grammar, table) = matched_brackets_ll_table();
    let mut evaluator = UnitEvaluator;
    assert!(lalrgen::parse_ll(&grammar, &table, "aabb", &mut evaluator).is_ok());
}

#[test]
fn ll1_rejects_unbalanced_nesting() {
    let (grammar, table) = matched_brackets_ll_table();
    let mut evaluator = UnitEvaluator;
    let err = lalrgen::parse_ll(&grammar, &table, "aab", &mut evaluator).unwrap_err();
    assert!(matches!(err, ParseError::UnexpectedToken { .. }));
}
