//! Error taxonomy, parse metrics, and the parse result envelope.
//!
//! Three tiers, matching how failures propagate:
//!
//! - [`GrammarError`] — load-time table validation; a bad artifact never
//!   becomes a [`crate::grammar::Grammar`].
//! - [`ParseFault`] — fatal conditions that abort a parse: an inconsistent
//!   table observed mid-run, cancellation, or an advisory timeout firing at
//!   a step boundary.
//! - [`ParseError`] — non-fatal damage reports carried inside a
//!   [`ParseResult`]; the caller still gets a tree, with ERROR nodes marking
//!   the affected spans.
//!
//! Lexer no-match conditions are handled by the recovery controller and
//! never cross the public API.

use crate::grammar::{StateId, SymbolId};
use crate::syntax::{TextRange, TextSize, Tree};
use std::time::Duration;
use thiserror::Error;

#[cfg(feature = "diagnostics")]
use miette::Diagnostic;

/// Rejected grammar tables. Indicates a corrupt or mismatched compiled
/// artifact, not a property of any input text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum GrammarError {
    #[error("grammar defines no symbols")]
    NoSymbols,

    #[error("grammar defines no lexer states")]
    NoLexStates,

    #[error("token count {token_count} exceeds symbol count {symbol_count}")]
    TokenCountOutOfRange {
        token_count: u16,
        symbol_count: usize,
    },

    #[error("symbol id {symbol} out of range in {context}")]
    SymbolOutOfRange { symbol: u16, context: &'static str },

    #[error("state id {state} out of range in {context}")]
    StateOutOfRange { state: u16, context: &'static str },

    #[error("lex state id {lex_state} out of range")]
    LexStateOutOfRange { lex_state: u16 },

    #[error("lex mode table has {actual} entries, expected one per parse state ({expected})")]
    LexModeCountMismatch { expected: usize, actual: usize },

    #[error("dense table shape mismatch: {detail}")]
    DenseShapeMismatch { detail: &'static str },

    #[error("ambiguous table entry: state {state}, symbol {symbol} resolves to two actions")]
    AmbiguousEntry { state: u16, symbol: u16 },

    #[error("misplaced table entry: state {state}, symbol {symbol} ({detail})")]
    MisplacedEntry {
        state: u16,
        symbol: u16,
        detail: &'static str,
    },

    #[error("field id {field} out of range")]
    FieldOutOfRange { field: u16 },
}

/// Fatal parse abort. No tree is produced.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum ParseFault {
    /// The action table yielded something it never legally can, e.g. a goto
    /// where an action was required or a missing goto after a reduce. This
    /// is a corrupt or mismatched table, never a recoverable parse
    /// condition; the engine fails loudly instead of guessing.
    #[error("inconsistent action table at state {state:?} on symbol {symbol:?}: {detail}")]
    TableInconsistency {
        state: StateId,
        symbol: SymbolId,
        detail: &'static str,
    },

    #[error("parse cancelled")]
    Cancelled,

    #[error("parse exceeded its time budget")]
    TimedOut,
}

/// Non-fatal damage recorded while recovering from malformed input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum ParseError {
    /// Recovery resynchronized by skipping the given span.
    #[error("skipped malformed input at {span}")]
    SkippedText {
        #[cfg_attr(feature = "diagnostics", label("skipped"))]
        span: TextRange,
    },

    /// Recovery exhausted its budget; the remainder of the input is wrapped
    /// in a trailing ERROR node.
    #[error("could not resynchronize at byte {offset} (state {state:?})")]
    Malformed {
        offset: TextSize,
        state: StateId,
    },
}

impl ParseError {
    /// Location of the damage.
    #[must_use]
    pub fn span(&self) -> TextRange {
        match self {
            Self::SkippedText { span } => *span,
            Self::Malformed { offset, .. } => TextRange::empty(*offset),
        }
    }
}

/// Counters collected during one parse invocation.
#[derive(Debug, Clone, Default)]
pub struct ParseMetrics {
    /// Tokens shifted, including reused ones.
    pub tokens_consumed: usize,
    /// Tokens taken from a previous tree instead of the lexer.
    pub tokens_reused: usize,
    /// Tree nodes created (leaves and interior).
    pub nodes_created: usize,
    /// Recovery sessions entered.
    pub recoveries: usize,
    pub parse_time: Duration,
}

/// What a parse hands back: always a tree, plus the damage report and
/// counters. `tree.has_errors()` is the cheap check; `errors` carries the
/// locations.
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub tree: Tree,
    pub errors: Vec<ParseError>,
    pub metrics: ParseMetrics,
}

impl ParseResult {
    /// True when the input parsed without any recovery.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && !self.tree.has_errors()
    }
}
