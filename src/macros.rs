//! Macro table expansion.
//!
//! Macros are named, reusable pattern fragments referenced as `{name}` from
//! other macros and from rules. Expansion rewrites every reference into the
//! parenthesized body of the referenced macro and repeats whole passes until
//! a pass changes nothing, so macros may reference macros in any declaration
//! order. A macro never substitutes into itself: a direct `{self}` reference
//! stays literal. Mutual references can never converge, so a pass ceiling
//! turns them into a construction error instead of an endless loop.

use crate::errors::GrammarError;
use once_cell::sync::Lazy;
use regex::Regex;

/// Upper bound on expansion passes. A well-formed table converges in at most
/// one pass per macro; a table still changing at this depth is cyclic.
pub(crate) const MACRO_EXPANSION_PASS_LIMIT: usize = 64;

/// Matches a `{name}` reference inside a pattern fragment. Quantifiers such
/// as `{4}` or `{2,}` don't qualify: references start with an identifier
/// character.
static MACRO_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap());

/// Replace every `{name}` reference in `pattern` with the parenthesized
/// replacement, preserving the replacement's precedence inside the
/// surrounding pattern.
pub(crate) fn substitute(pattern: &str, name: &str, replacement: &str) -> String {
    pattern.replace(&format!("{{{}}}", name), &format!("({})", replacement))
}

/// List the `{name}` references still present in a pattern fragment.
pub(crate) fn literal_refs(pattern: &str) -> Vec<String> {
    MACRO_REF
        .captures_iter(pattern)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Expand all macro bodies to a fixpoint.
///
/// Returns the table with every inter-macro reference resolved. Expanding an
/// already-expanded table is a no-op. Fails with
/// [`GrammarError::MacroRecursionLimit`] when the table is still changing at
/// the pass ceiling.
pub fn expand_macros(macros: &[(String, String)]) -> Result<Vec<(String, String)>, GrammarError> {
    let mut table: Vec<(String, String)> = macros.to_vec();
    for _ in 0..MACRO_EXPANSION_PASS_LIMIT {
        let mut changed = false;
        for i in 0..table.len() {
            for j in 0..table.len() {
                if i == j {
                    continue;
                }
                let needle = format!("{{{}}}", table[j].0);
                if table[i].1.contains(&needle) {
                    let (name, body) = (table[j].0.clone(), table[j].1.clone());
                    table[i].1 = substitute(&table[i].1, &name, &body);
                    changed = true;
                }
            }
        }
        if !changed {
            return Ok(table);
        }
    }
    Err(GrammarError::MacroRecursionLimit {
        passes: MACRO_EXPANSION_PASS_LIMIT,
    })
}
