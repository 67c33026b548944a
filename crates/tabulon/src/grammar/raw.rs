//! Plain-data description of a compiled grammar.
//!
//! This is the boundary artifact an external grammar compiler emits and this
//! engine only reads. All ids are bare `u16` indices into the sibling
//! vectors; [`crate::grammar::Grammar::new`] validates them and builds the
//! compact runtime representation.

use compact_str::CompactString;
#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Everything the engine needs to know about one compiled grammar.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct GrammarTables {
    /// Symbol metadata, indexed by symbol id. Entry 0 must be the
    /// end-of-input terminal.
    pub symbols: Vec<SymbolSpec>,
    /// Symbols below this id are terminals; the rest are non-terminals.
    pub token_count: u16,
    /// Lexer automaton states, indexed by lex state id.
    pub lex_states: Vec<LexStateSpec>,
    /// Entry lex state per parser state. Length must equal the total state
    /// count. Kept as a real indirection even for grammars that use a single
    /// lex mode everywhere.
    pub lex_modes: Vec<u16>,
    /// States `0..large_state_count` are stored densely in `dense_rows`.
    pub large_state_count: u16,
    /// One row per large state; each row has one slot per symbol.
    pub dense_rows: Vec<Vec<Option<EntrySpec>>>,
    /// Run-length encoded rows for the remaining states, in state order.
    pub sparse_rows: Vec<SparseRowSpec>,
    /// Field maps and alias sequences, indexed by production id.
    pub productions: Vec<ProductionSpec>,
    /// Field names, indexed by field id.
    pub field_names: Vec<CompactString>,
    /// The parser's start state.
    pub start_state: u16,
}

/// Metadata of a single symbol.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct SymbolSpec {
    pub name: CompactString,
    /// Invisible symbols never appear in the tree; their children are
    /// spliced into the enclosing node on reduce.
    pub visible: bool,
    /// Named symbols get a human-readable kind; anonymous ones are literal
    /// tokens like `"+"`.
    pub named: bool,
}

impl SymbolSpec {
    #[must_use]
    pub fn named(name: impl Into<CompactString>) -> Self {
        Self {
            name: name.into(),
            visible: true,
            named: true,
        }
    }

    #[must_use]
    pub fn anonymous(name: impl Into<CompactString>) -> Self {
        Self {
            name: name.into(),
            visible: true,
            named: false,
        }
    }

    #[must_use]
    pub fn hidden(name: impl Into<CompactString>) -> Self {
        Self {
            name: name.into(),
            visible: false,
            named: true,
        }
    }
}

/// One lexer state: an optional accepted symbol plus transitions checked in
/// declaration order (the grammar author's alternative ordering).
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct LexStateSpec {
    /// Token accepted when the walk ends in this state.
    pub accept: Option<u16>,
    pub transitions: Vec<LexTransitionSpec>,
}

/// A single lexer transition.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct LexTransitionSpec {
    pub on: CharSpec,
    pub target: u16,
    /// Skip transitions consume input without contributing it to the token
    /// (whitespace and similar token-free spans).
    pub skip: bool,
}

impl LexTransitionSpec {
    #[must_use]
    pub fn advance(on: CharSpec, target: u16) -> Self {
        Self {
            on,
            target,
            skip: false,
        }
    }

    #[must_use]
    pub fn skip(on: CharSpec, target: u16) -> Self {
        Self {
            on,
            target,
            skip: true,
        }
    }
}

/// What a lexer transition matches.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum CharSpec {
    /// The distinguished end-of-input pseudo-character.
    Eof,
    /// Any character inside one of the inclusive ranges.
    Ranges(Vec<RangeInclusive<char>>),
}

impl CharSpec {
    #[must_use]
    pub fn char(c: char) -> Self {
        Self::Ranges(vec![c..=c])
    }

    #[must_use]
    pub fn one_of(chars: &str) -> Self {
        Self::Ranges(chars.chars().map(|c| c..=c).collect())
    }

    #[must_use]
    pub fn range(lo: char, hi: char) -> Self {
        Self::Ranges(vec![lo..=hi])
    }
}

/// A parse action, or a goto for non-terminal columns.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum EntrySpec {
    Shift {
        state: u16,
        /// Clear for tokens whose lexing depends on parse context; an
        /// incremental re-parse must re-lex them instead of reusing a
        /// cached token.
        reusable: bool,
    },
    Reduce {
        /// Head symbol of the production.
        symbol: u16,
        /// Stack entries popped by the reduction.
        child_count: u16,
        /// Production id, keying the field map and alias sequence.
        production: u16,
    },
    Accept,
    /// Explicit instruction to enter error recovery.
    Recover,
    /// Non-terminal column: state to enter after a reduction exposes this
    /// state with the given head symbol.
    Goto { state: u16 },
}

impl EntrySpec {
    #[must_use]
    pub const fn shift(state: u16) -> Self {
        Self::Shift {
            state,
            reusable: true,
        }
    }

    #[must_use]
    pub const fn reduce(symbol: u16, child_count: u16, production: u16) -> Self {
        Self::Reduce {
            symbol,
            child_count,
            production,
        }
    }

    #[must_use]
    pub const fn goto(state: u16) -> Self {
        Self::Goto { state }
    }
}

/// Run-length encoded table row: each group applies one entry to every
/// listed symbol. A symbol appearing in two groups of the same row is an
/// ambiguity and rejected at load time.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct SparseRowSpec {
    pub groups: Vec<(EntrySpec, Vec<u16>)>,
}

impl SparseRowSpec {
    #[must_use]
    pub fn group(mut self, entry: EntrySpec, symbols: &[u16]) -> Self {
        self.groups.push((entry, symbols.to_vec()));
        self
    }
}

/// Field map and alias sequence of one production.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct ProductionSpec {
    /// `(field id, child index)` pairs. Indices address the reduced node's
    /// children after invisible-symbol splicing.
    pub fields: Vec<(u16, u16)>,
    /// `(child index, public symbol)` renames applied when the node is built.
    pub aliases: Vec<(u16, u16)>,
}

impl ProductionSpec {
    #[must_use]
    pub fn field(mut self, field: u16, child: u16) -> Self {
        self.fields.push((field, child));
        self
    }

    #[must_use]
    pub fn alias(mut self, child: u16, symbol: u16) -> Self {
        self.aliases.push((child, symbol));
        self
    }
}
