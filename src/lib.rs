//! # relex
//!
//! A regex-backed lexer generator: declare named pattern rules (with
//! optional macros and per-rule handlers), compile them into one scanning
//! automaton, and pull tokens from an input text one at a time.
//!
//! In the spirit of the classic lex family, but matching is delegated to
//! the [`regex`] crate instead of a hand-rolled DFA. The engine's job is
//! the part regex doesn't give you for free: macro expansion to a
//! fixpoint, rule patterns combined into one anchored alternation, and
//! leftmost-longest disambiguation recovered from a leftmost-first
//! alternation engine (see [`scanner`] for the re-probe algorithm).
//!
//! ```rust
//! use relex::{Grammar, Lexer};
//!
//! let grammar = Grammar::new()
//!     .define("digit", "[0-9]")
//!     .skip("[ \\t]+")
//!     .rule_with("number", "-?{digit}+", |_text, _state| Some("NUMBER".to_string()))
//!     .rule("comma", ",")
//!     .tokens("NUMBER comma");
//!
//! let mut lexer = Lexer::with_input(grammar, "12, -7").unwrap();
//! assert_eq!(lexer.next_token().as_deref(), Some("NUMBER"));
//! assert_eq!(lexer.next_token().as_deref(), Some("comma"));
//! assert_eq!(lexer.next_token().as_deref(), Some("NUMBER"));
//! assert_eq!(lexer.next_token(), None);
//! ```

pub mod errors;
pub mod grammar;
pub mod macros;
pub mod scanner;

pub use errors::GrammarError;
pub use grammar::{
    CompiledGrammar, Grammar, Handler, Pattern, Rule, TokenSet, ERROR_RULE, SKIP_RULE,
};
pub use macros::expand_macros;
pub use scanner::{Lexer, Scan, ScanState};
