//! Property-based tests for macro expansion and the scanner.
//!
//! Expansion is checked against generated acyclic macro tables (references
//! only point at later-declared macros, so a fixpoint always exists); the
//! scanner is checked against generated inputs of a small word/number
//! grammar where the expected token sequence can be computed independently.

use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;

use relex::{expand_macros, Grammar, Lexer};

const MACRO_COUNT: usize = 4;

/// Body fragments for macro `index`: literal runs or references to
/// macros declared after it, so the table can never be cyclic.
fn body_strategy(index: usize) -> BoxedStrategy<String> {
    let refs: Vec<String> = ((index + 1)..MACRO_COUNT)
        .map(|j| format!("{{m{}}}", j))
        .collect();
    let segment = if refs.is_empty() {
        "[a-z]{1,3}".prop_map(|s: String| s).boxed()
    } else {
        prop_oneof![
            2 => "[a-z]{1,3}".prop_map(|s: String| s),
            1 => proptest::sample::select(refs),
        ]
        .boxed()
    };
    prop::collection::vec(segment, 1..4)
        .prop_map(|segments| segments.concat())
        .boxed()
}

fn acyclic_table_strategy() -> impl Strategy<Value = Vec<(String, String)>> {
    (
        body_strategy(0),
        body_strategy(1),
        body_strategy(2),
        body_strategy(3),
    )
        .prop_map(|(b0, b1, b2, b3)| {
            [b0, b1, b2, b3]
                .into_iter()
                .enumerate()
                .map(|(i, body)| (format!("m{}", i), body))
                .collect()
        })
}

proptest! {
    #[test]
    fn expansion_is_idempotent(table in acyclic_table_strategy()) {
        let expanded = expand_macros(&table).unwrap();
        let again = expand_macros(&expanded).unwrap();
        prop_assert_eq!(expanded, again);
    }

    #[test]
    fn expansion_resolves_every_reference(table in acyclic_table_strategy()) {
        let expanded = expand_macros(&table).unwrap();
        for (_, body) in &expanded {
            prop_assert!(!body.contains("{m"), "unresolved reference in {:?}", body);
        }
    }
}

/// Reference tokenization of `[a-z0-9 ]` text: maximal letter runs are
/// WORDs, maximal digit runs are NUMBERs, spaces separate.
fn expected_tokens(input: &str) -> Vec<&'static str> {
    let mut tokens = Vec::new();
    let mut prev: Option<char> = None;
    for c in input.chars() {
        let same_run = match (prev, c) {
            (Some(p), c) => p.is_ascii_lowercase() == c.is_ascii_lowercase() && p != ' ' && c != ' ',
            (None, _) => false,
        };
        if !same_run {
            if c.is_ascii_lowercase() {
                tokens.push("WORD");
            } else if c.is_ascii_digit() {
                tokens.push("NUMBER");
            }
        }
        prev = Some(c);
    }
    tokens
}

fn word_number_grammar() -> Grammar {
    Grammar::new()
        .skip("[ ]+")
        .rule("WORD", "[a-z]+")
        .rule("NUMBER", "[0-9]+")
        .tokens("WORD NUMBER")
}

proptest! {
    #[test]
    fn scanner_is_total_over_its_alphabet(input in "[a-z0-9 ]{0,40}") {
        let mut lexer = Lexer::with_input(word_number_grammar(), input.as_str()).unwrap();
        let mut tokens = Vec::new();
        while let Some(token) = lexer.next_token() {
            tokens.push(token);
        }
        prop_assert!(lexer.is_finished());
        prop_assert_eq!(tokens, expected_tokens(&input));
    }

    #[test]
    fn scanner_never_panics_on_arbitrary_input(input in "\\PC{0,40}") {
        // Outside the grammar's alphabet the default policy stops the scan;
        // either way every input terminates without panicking.
        let mut lexer = Lexer::with_input(word_number_grammar(), input.as_str()).unwrap();
        while lexer.next_token().is_some() {}
        prop_assert!(lexer.is_finished());
    }
}
