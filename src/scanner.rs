//! Scan engine: longest-match tokenization over the compiled alternation.
//!
//! The regex engine reports the first alternative that matches at the
//! anchor, not the longest. Classic lexer semantics want leftmost-longest:
//! among all rules matching at the current offset, the longest match wins
//! and only length ties fall to declaration order. The scanner recovers
//! that on top of a first-match engine:
//! 1. Probe the full anchored alternation at the current offset
//! 2. If the winner sits at alternation position `k`, re-probe the suffix
//!    alternation that starts after `k` at the same offset; a strictly
//!    longer match replaces the winner
//! 3. Repeat until no strictly longer match remains
//!
//! Each cycle then advances the offset and either emits a token, invokes
//! the rule's handler, or consumes silently (skip rules). Unmatched input
//! goes through the error policy: a registered handler recovers one
//! character at a time, the default logs and latches end-of-input.

use crate::errors::GrammarError;
use crate::grammar::{compile, CompiledGrammar, Dispatch, Grammar, Handler};

/// Raw result of one scan cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scan {
    /// A rule matched and emitted this token type.
    Token(String),
    /// A rule matched but nothing surfaces this cycle (skip rule, handler
    /// that returned `None`, or unmapped rule).
    Skip,
    /// End of input. Terminal until new input is supplied.
    Eof,
}

/// Live scanning state, visible to rule handlers.
///
/// Handlers may mutate `line` and `column` (newline bookkeeping) and
/// override the matched text; the offset and finished flag are read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanState {
    /// Current line number, 1-based. The engine never touches it; a
    /// newline rule's handler is expected to increment it.
    pub line: usize,
    /// Current column number, 1-based, handler-maintained like `line`.
    pub column: usize,
    matched: String,
    offset: usize,
    finished: bool,
}

impl ScanState {
    fn new() -> Self {
        ScanState {
            line: 1,
            column: 1,
            matched: String::new(),
            offset: 0,
            finished: false,
        }
    }

    /// Text of the last match (traditionally `yytext`).
    pub fn matched_text(&self) -> &str {
        &self.matched
    }

    /// Override the matched text, e.g. to strip quotes off a string
    /// literal inside its rule handler.
    pub fn set_matched_text(&mut self, text: impl Into<String>) {
        self.matched = text.into();
    }

    /// Byte offset of the next scan position.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Whether the scanner has latched end-of-input.
    pub fn finished(&self) -> bool {
        self.finished
    }
}

/// A lexer instance: compiled grammar plus the scanning cursor over one
/// input text.
///
/// Single-threaded and synchronous; one `Lexer` owns its state exclusively,
/// independent instances share nothing. Also iterates over meaningful
/// tokens: `for token in lexer { ... }`.
pub struct Lexer {
    grammar: CompiledGrammar,
    handlers: Vec<Option<Handler>>,
    error_handler: Option<Handler>,
    input: String,
    state: ScanState,
}

impl Lexer {
    /// Compile `grammar` into a lexer with no input yet.
    pub fn new(grammar: Grammar) -> Result<Self, GrammarError> {
        let out = compile(grammar)?;
        Ok(Lexer {
            grammar: out.grammar,
            handlers: out.handlers,
            error_handler: out.error_handler,
            input: String::new(),
            state: ScanState::new(),
        })
    }

    /// Compile `grammar` and supply the initial input.
    pub fn with_input(grammar: Grammar, input: impl Into<String>) -> Result<Self, GrammarError> {
        let mut lexer = Self::new(grammar)?;
        lexer.set_input(input);
        Ok(lexer)
    }

    /// Supply or replace the input text, resetting the scanning state:
    /// offset 0, line 1, column 1, finished flag cleared.
    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
        self.state = ScanState::new();
    }

    /// The compiled scanning tables.
    pub fn grammar(&self) -> &CompiledGrammar {
        &self.grammar
    }

    /// Text of the last match.
    pub fn matched_text(&self) -> &str {
        self.state.matched_text()
    }

    /// Current line number, 1-based.
    pub fn line(&self) -> usize {
        self.state.line
    }

    /// Current column number, 1-based.
    pub fn column(&self) -> usize {
        self.state.column
    }

    /// Byte offset of the next scan position.
    pub fn offset(&self) -> usize {
        self.state.offset()
    }

    /// Whether end-of-input has been reached (or forced by the default
    /// error policy).
    pub fn is_finished(&self) -> bool {
        self.state.finished()
    }

    /// One raw scan cycle: match at the current offset, advance, and
    /// report what happened. Callers usually want [`Lexer::next_token`],
    /// which swallows the [`Scan::Skip`] cycles.
    pub fn scan_once(&mut self) -> Scan {
        if self.state.finished {
            return Scan::Eof;
        }
        if self.grammar.rule_count() == 0 || self.state.offset >= self.input.len() {
            self.state.finished = true;
            return Scan::Eof;
        }
        self.state.matched.clear();

        let Some((index, len)) = self.best_match_at(self.state.offset) else {
            return self.recover_unmatched();
        };

        let end = self.state.offset + len;
        let text = self.input[self.state.offset..end].to_string();
        self.state.offset = end;
        self.state.matched = text.clone();

        match &self.grammar.rule(index).dispatch {
            Dispatch::Discard => Scan::Skip,
            Dispatch::Invoke => match self.handlers[index].as_mut() {
                Some(handler) => match handler(&text, &mut self.state) {
                    Some(token) => Scan::Token(token),
                    None => Scan::Skip,
                },
                // Invoke dispatch is only ever built alongside a handler.
                None => Scan::Skip,
            },
            Dispatch::Emit(token) => Scan::Token(token.clone()),
            Dispatch::Unmapped => Scan::Skip,
        }
    }

    /// Next meaningful token, or `None` once end of input is reached.
    ///
    /// Loops raw scan cycles iteratively: a long run of skip matches must
    /// not grow the call stack.
    pub fn next_token(&mut self) -> Option<String> {
        loop {
            match self.scan_once() {
                Scan::Token(token) => return Some(token),
                Scan::Skip => continue,
                Scan::Eof => return None,
            }
        }
    }

    /// Resolve the winning rule at `offset`: probe the full alternation,
    /// then keep re-probing past the current winner while a strictly
    /// longer match exists. Length ties fall to the earlier-declared rule
    /// because an equal-length later match never displaces the winner.
    fn best_match_at(&self, offset: usize) -> Option<(usize, usize)> {
        let haystack = &self.input[offset..];
        let mut best: Option<(usize, usize)> = None;
        let mut from = 0;
        while from < self.grammar.rule_count() {
            let Some((index, len)) = self.probe(from, haystack) else {
                break;
            };
            match best {
                Some((_, best_len)) if len <= best_len => break,
                _ => {
                    best = Some((index, len));
                    from = index + 1;
                }
            }
        }
        best
    }

    /// Probe the anchored suffix alternation starting at rule `from`.
    /// Exactly one top-level branch populates per match; a zero-length
    /// match counts as no match at all (accepting one would stall the
    /// scan).
    fn probe(&self, from: usize, haystack: &str) -> Option<(usize, usize)> {
        let caps = self.grammar.suffix(from).captures(haystack)?;
        for index in from..self.grammar.rule_count() {
            if let Some(m) = caps.name(&self.grammar.rule(index).name) {
                if m.is_empty() {
                    return None;
                }
                return Some((index, m.len()));
            }
        }
        None
    }

    /// No rule matched at the current offset. With a registered handler,
    /// hand it the single offending character and keep scanning; without
    /// one, log and latch end-of-input, because an unhandled lexical error
    /// stops tokenization rather than skipping forever.
    fn recover_unmatched(&mut self) -> Scan {
        let Some(offending) = self.input[self.state.offset..].chars().next() else {
            self.state.finished = true;
            return Scan::Eof;
        };
        match self.error_handler.as_mut() {
            Some(handler) => {
                // The handler runs at the offending character's position;
                // the offset moves past it only afterwards.
                let text = offending.to_string();
                self.state.matched = text.clone();
                let result = match handler(&text, &mut self.state) {
                    Some(token) => Scan::Token(token),
                    None => Scan::Skip,
                };
                self.state.offset += offending.len_utf8();
                result
            }
            None => {
                log::error!(
                    "illegal character {:?} at offset {}",
                    offending,
                    self.state.offset
                );
                self.state.offset += offending.len_utf8();
                self.state.finished = true;
                Scan::Eof
            }
        }
    }
}

impl Iterator for Lexer {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.next_token()
    }
}
