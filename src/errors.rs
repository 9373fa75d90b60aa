//! Error types for grammar construction.
//!
//! Building a lexer is all-or-nothing: any of these errors aborts the build
//! and no partially usable instance is produced. Runtime unmatched input is
//! not an error value; the scanner recovers through the registered error
//! handler or degrades to end-of-input (see [`crate::scanner`]).

use std::fmt;

/// Errors raised while compiling a grammar descriptor into a lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    /// A rule is missing its name or, for scanning rules, its pattern.
    IllegalRule {
        /// Position of the offending rule in the declaration list.
        index: usize,
    },
    /// Two rules with handlers were registered under the same name.
    DuplicateRule(String),
    /// A rewritten rule pattern (or the combined alternation built from it)
    /// was rejected by the regex engine. Duplicate rule names end up here
    /// too: they collide as capture group names.
    InvalidPattern {
        /// Name of the rule the rejected pattern belongs to.
        rule: String,
        /// The regex engine's own description of the problem.
        message: String,
    },
    /// Macro expansion was still rewriting bodies at the pass ceiling,
    /// which means the macro graph contains a cycle.
    MacroRecursionLimit {
        /// Number of full passes attempted before giving up.
        passes: usize,
    },
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarError::IllegalRule { index } => {
                write!(f, "Illegal rule at position {}: name and pattern are required", index)
            }
            GrammarError::DuplicateRule(name) => {
                write!(f, "Duplicate name is not allowed: '{}'", name)
            }
            GrammarError::InvalidPattern { rule, message } => {
                write!(f, "Invalid pattern for rule '{}': {}", rule, message)
            }
            GrammarError::MacroRecursionLimit { passes } => {
                write!(
                    f,
                    "Macro expansion did not converge after {} passes; the macro table is cyclic",
                    passes
                )
            }
        }
    }
}

impl std::error::Error for GrammarError {}
