//! Grammar descriptor and rule compilation.
//!
//! A grammar is an ordered list of named pattern rules plus optional macros
//! and the declared token set. Compilation works through the list in
//! declaration order:
//! 1. Rewrites each string pattern: `{macro}` references first, then
//!    references to *earlier* rules by name (forward references stay
//!    literal, so rule order is load-bearing, not cosmetic)
//! 2. Wraps every rule as a named capture group `(?P<name>pattern)`
//! 3. Joins the wrapped patterns into one alternation and compiles it
//!    anchored, together with every suffix of it (the scanner re-probes
//!    suffixes to recover longest-match semantics)
//! 4. Resolves each rule's dispatch once: discard, invoke handler, or emit
//!    a token type from the declared set
//!
//! The reserved rule names are [`SKIP_RULE`] (match and discard) and
//! [`ERROR_RULE`] (registers the unmatched-input handler instead of a
//! scanning rule).

use std::collections::HashSet;

use regex::Regex;

use crate::errors::GrammarError;
use crate::macros::{expand_macros, literal_refs, substitute};
use crate::scanner::ScanState;

/// Name reserved for match-and-discard rules.
pub const SKIP_RULE: &str = "skip";

/// Name reserved for registering the unmatched-input handler.
pub const ERROR_RULE: &str = "error";

/// A rule or error-policy callback.
///
/// Receives the matched text (for the error handler, the single offending
/// character) and the live scan state. Returning a token type emits it to
/// the caller; returning `None` discards the match like a skip rule, which
/// is the usual shape for pure side effects such as newline bookkeeping.
pub type Handler = Box<dyn FnMut(&str, &mut ScanState) -> Option<String>>;

/// A rule pattern: either regex source text (subject to macro and
/// prior-rule substitution) or an already-built [`Regex`] taken verbatim.
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Regex source text; `{name}` references are rewritten at compile time.
    Source(String),
    /// A prebuilt regex; its source is used as-is, no substitution.
    Native(Regex),
}

impl Pattern {
    fn source(&self) -> &str {
        match self {
            Pattern::Source(s) => s,
            Pattern::Native(r) => r.as_str(),
        }
    }

    fn is_native(&self) -> bool {
        matches!(self, Pattern::Native(_))
    }
}

impl From<&str> for Pattern {
    fn from(source: &str) -> Self {
        Pattern::Source(source.to_string())
    }
}

impl From<String> for Pattern {
    fn from(source: String) -> Self {
        Pattern::Source(source)
    }
}

impl From<Regex> for Pattern {
    fn from(regex: Regex) -> Self {
        Pattern::Native(regex)
    }
}

/// The closed set of token type names a grammar may emit.
///
/// Used only for validation: a handler-less rule that resolves to an
/// undeclared name is logged and left unmapped, never a hard error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenSet(Vec<String>);

impl TokenSet {
    /// Declared names, in declaration order.
    pub fn names(&self) -> &[String] {
        &self.0
    }

    fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|t| t == name)
    }
}

impl From<&str> for TokenSet {
    /// Whitespace-separated declaration, e.g. `"STRING NUMBER COMMA"`.
    fn from(decl: &str) -> Self {
        TokenSet(decl.split_whitespace().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for TokenSet {
    fn from(names: Vec<String>) -> Self {
        TokenSet(names)
    }
}

impl From<&[&str]> for TokenSet {
    fn from(names: &[&str]) -> Self {
        TokenSet(names.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for TokenSet {
    fn from(names: [&str; N]) -> Self {
        TokenSet(names.iter().map(|s| s.to_string()).collect())
    }
}

/// One named pattern rule with an optional handler.
pub struct Rule {
    name: String,
    pattern: Pattern,
    handler: Option<Handler>,
}

impl Rule {
    /// A plain rule: on match, the token type comes from the declared
    /// token set (pattern text or rule name).
    pub fn new(name: impl Into<String>, pattern: impl Into<Pattern>) -> Self {
        Rule {
            name: name.into(),
            pattern: pattern.into(),
            handler: None,
        }
    }

    /// A rule whose handler decides what (if anything) is emitted.
    pub fn with_handler(
        name: impl Into<String>,
        pattern: impl Into<Pattern>,
        handler: impl FnMut(&str, &mut ScanState) -> Option<String> + 'static,
    ) -> Self {
        Rule {
            name: name.into(),
            pattern: pattern.into(),
            handler: Some(Box::new(handler)),
        }
    }
}

/// Grammar descriptor: macros, ordered rules, declared tokens.
///
/// Built fluently and consumed once by [`crate::scanner::Lexer::new`]:
///
/// ```rust
/// use relex::{Grammar, Lexer};
///
/// let grammar = Grammar::new()
///     .define("digit", "[0-9]")
///     .skip("[ \\t]+")
///     .rule_with("number", "{digit}+", |_text, _state| Some("NUMBER".to_string()))
///     .rule("comma", ",")
///     .tokens("NUMBER comma");
/// let mut lexer = Lexer::with_input(grammar, "1, 2").unwrap();
/// assert_eq!(lexer.next_token().as_deref(), Some("NUMBER"));
/// ```
#[derive(Default)]
pub struct Grammar {
    macros: Vec<(String, String)>,
    rules: Vec<Rule>,
    tokens: TokenSet,
}

impl Grammar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a macro: a reusable pattern fragment referenced as `{name}`.
    pub fn define(mut self, name: impl Into<String>, fragment: impl Into<String>) -> Self {
        self.macros.push((name.into(), fragment.into()));
        self
    }

    /// Append a plain rule.
    pub fn rule(mut self, name: impl Into<String>, pattern: impl Into<Pattern>) -> Self {
        self.rules.push(Rule::new(name, pattern));
        self
    }

    /// Append a rule with a handler.
    pub fn rule_with(
        mut self,
        name: impl Into<String>,
        pattern: impl Into<Pattern>,
        handler: impl FnMut(&str, &mut ScanState) -> Option<String> + 'static,
    ) -> Self {
        self.rules.push(Rule::with_handler(name, pattern, handler));
        self
    }

    /// Append a match-and-discard rule.
    pub fn skip(mut self, pattern: impl Into<Pattern>) -> Self {
        self.rules.push(Rule::new(SKIP_RULE, pattern));
        self
    }

    /// Register the unmatched-input handler (equivalent to a rule named
    /// [`ERROR_RULE`]).
    pub fn on_error(
        mut self,
        handler: impl FnMut(&str, &mut ScanState) -> Option<String> + 'static,
    ) -> Self {
        self.rules.push(Rule {
            name: ERROR_RULE.to_string(),
            pattern: Pattern::Source(String::new()),
            handler: Some(Box::new(handler)),
        });
        self
    }

    /// Declare the emittable token set, from a whitespace-separated string
    /// or an explicit list.
    pub fn tokens(mut self, decl: impl Into<TokenSet>) -> Self {
        self.tokens = decl.into();
        self
    }

    /// Append an already-built [`Rule`].
    pub fn push_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }
}

/// How a matched rule is dispatched by the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Dispatch {
    /// Consume and discard (skip rules).
    Discard,
    /// Invoke the handler stored at the same rule index.
    Invoke,
    /// Emit this token type.
    Emit(String),
    /// The rule maps to no declared token; a match is a diagnostic no-op.
    Unmapped,
}

/// One compiled rule: rewritten pattern, its wrapped form in the
/// alternation, and the resolved dispatch.
#[derive(Debug, Clone)]
pub(crate) struct CompiledRule {
    pub(crate) name: String,
    pub(crate) pattern: String,
    pub(crate) wrapped: String,
    pub(crate) dispatch: Dispatch,
}

/// The immutable scanning tables built from a [`Grammar`].
///
/// Holds the ordered compiled rules, the combined alternation source, and
/// an anchored regex per alternation suffix: `suffix(0)` is the full
/// scanning automaton, `suffix(k)` drops the first `k` rules and backs the
/// longest-match re-probe. Never mutated after construction.
#[derive(Debug, Clone)]
pub struct CompiledGrammar {
    rules: Vec<CompiledRule>,
    suffixes: Vec<Regex>,
    alternation: String,
}

impl CompiledGrammar {
    /// The combined alternation source: every rule wrapped as
    /// `(?P<name>pattern)`, joined by `|`.
    pub fn alternation_pattern(&self) -> &str {
        &self.alternation
    }

    /// Rule names in declaration order.
    pub fn rule_names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.name.as_str())
    }

    /// Rewritten pattern source for a rule, if the rule exists.
    pub fn rule_pattern(&self, name: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.pattern.as_str())
    }

    pub(crate) fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub(crate) fn rule(&self, index: usize) -> &CompiledRule {
        &self.rules[index]
    }

    pub(crate) fn suffix(&self, from: usize) -> &Regex {
        &self.suffixes[from]
    }
}

/// Everything [`compile`] produces: the shared immutable tables plus the
/// handler tables, which stay outside [`CompiledGrammar`] because handlers
/// need `&mut` at invocation.
pub(crate) struct CompileOutput {
    pub(crate) grammar: CompiledGrammar,
    /// Parallel to the compiled rule list; `Some` exactly for
    /// [`Dispatch::Invoke`] rules.
    pub(crate) handlers: Vec<Option<Handler>>,
    pub(crate) error_handler: Option<Handler>,
}

impl std::fmt::Debug for CompileOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompileOutput")
            .field("handlers", &self.handlers.len())
            .field("error_handler", &self.error_handler.is_some())
            .finish_non_exhaustive()
    }
}

/// Compile a grammar descriptor into scanning tables.
pub(crate) fn compile(grammar: Grammar) -> Result<CompileOutput, GrammarError> {
    let Grammar {
        macros,
        rules,
        tokens,
    } = grammar;
    let macros = expand_macros(&macros)?;

    // Rewrite pass: macros first, then earlier rules by name. Runs over the
    // whole list so later rules see every prior rule's finished pattern.
    let mut sources: Vec<String> = Vec::with_capacity(rules.len());
    for (i, rule) in rules.iter().enumerate() {
        let mut source = rule.pattern.source().to_string();
        if !rule.pattern.is_native() {
            for (name, body) in &macros {
                source = substitute(&source, name, body);
            }
            for j in 0..i {
                source = substitute(&source, &rules[j].name, &sources[j]);
            }
        }
        sources.push(source);
    }

    // Registration pass: validate, wrap, and resolve dispatch.
    let mut compiled: Vec<CompiledRule> = Vec::new();
    let mut handlers: Vec<Option<Handler>> = Vec::new();
    let mut error_handler: Option<Handler> = None;
    let mut handler_names: HashSet<String> = HashSet::new();

    for (i, rule) in rules.into_iter().enumerate() {
        if rule.name == ERROR_RULE {
            error_handler = rule.handler;
            continue;
        }
        let source = sources[i].clone();
        if rule.name.is_empty() || source.is_empty() {
            return Err(GrammarError::IllegalRule { index: i });
        }

        let leftover = literal_refs(&source);
        if !leftover.is_empty() {
            log::debug!(
                "rule '{}' keeps literal reference(s) {:?}: not a macro or earlier rule",
                rule.name,
                leftover
            );
        }

        let wrapped = format!("(?P<{}>{})", rule.name, source);
        // Validate each rule's pattern on its own so the error names the
        // culprit; the combined compile below only adds name collisions.
        Regex::new(&format!(r"\A(?:{})", wrapped)).map_err(|e| GrammarError::InvalidPattern {
            rule: rule.name.clone(),
            message: e.to_string(),
        })?;

        let dispatch = if rule.name == SKIP_RULE {
            // A skip rule never emits; a handler attached to one is dropped.
            handlers.push(None);
            Dispatch::Discard
        } else if let Some(handler) = rule.handler {
            if !handler_names.insert(rule.name.clone()) {
                return Err(GrammarError::DuplicateRule(rule.name));
            }
            handlers.push(Some(handler));
            Dispatch::Invoke
        } else {
            handlers.push(None);
            if tokens.contains(&source) {
                Dispatch::Emit(source.clone())
            } else if tokens.contains(&rule.name) {
                Dispatch::Emit(rule.name.clone())
            } else {
                log::warn!("token '{}' undefined", source);
                Dispatch::Unmapped
            }
        };

        compiled.push(CompiledRule {
            name: rule.name,
            pattern: source,
            wrapped,
            dispatch,
        });
    }

    let alternation = compiled
        .iter()
        .map(|r| r.wrapped.as_str())
        .collect::<Vec<_>>()
        .join("|");

    let mut suffixes = Vec::with_capacity(compiled.len());
    for k in 0..compiled.len() {
        let joined = compiled[k..]
            .iter()
            .map(|r| r.wrapped.as_str())
            .collect::<Vec<_>>()
            .join("|");
        let suffix =
            Regex::new(&format!(r"\A(?:{})", joined)).map_err(|e| GrammarError::InvalidPattern {
                rule: compiled[k].name.clone(),
                message: e.to_string(),
            })?;
        suffixes.push(suffix);
    }

    Ok(CompileOutput {
        grammar: CompiledGrammar {
            rules: compiled,
            suffixes,
            alternation,
        },
        handlers,
        error_handler,
    })
}
