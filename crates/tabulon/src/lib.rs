//! # Tabulon
//!
//! A runtime engine for compiled grammar tables: a deterministic lexer
//! automaton plus an LR-style shift/reduce action table, interpreted to turn
//! a flat character stream into a concrete syntax tree.
//!
//! Tabulon does not compile grammars. An external table compiler produces a
//! [`grammar::GrammarTables`] artifact; this crate validates it once, then
//! parses any number of inputs against it:
//!
//! - **Lexing** is driven by per-state character-dispatch rows with maximal
//!   munch, trivia skipping, and context-sensitive lex-mode selection per
//!   parser state.
//! - **Parsing** is a shift/reduce stack machine; reduces resolve per
//!   production field maps and symbol aliases while building the tree.
//! - **Error recovery** resynchronizes past malformed input within a
//!   bounded budget, wrapping the damage in ERROR nodes; callers always get
//!   a tree.
//! - **Incremental re-parse** reuses tokens from a previous tree outside the
//!   edited region, producing a result identical to parsing from scratch.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tabulon::{Grammar, Parser};
//!
//! // `tables` is the artifact your grammar compiler emitted.
//! let grammar = Arc::new(Grammar::new(tables)?);
//! let parser = Parser::new(grammar);
//!
//! let result = parser.parse("1 + 2 * 3")?;
//! assert!(!result.tree.has_errors());
//! println!("{}", result.tree.root().to_sexp());
//!
//! // After an edit, reuse what the edit did not touch.
//! let edit = tabulon::Edit::insert(4.into(), 2.into());
//! let again = parser.reparse(&result.tree, &[edit], "1 + 42 * 3")?;
//! ```
//!
//! ## Concurrency
//!
//! A [`Grammar`] is immutable after construction; share it behind an `Arc`
//! across as many threads and parsers as needed. Each parse keeps its stack
//! and cursor on the call stack, so concurrent parses never contend.
//! Cancellation and timeouts are cooperative, checked only between
//! lex/shift/reduce steps.
//!
//! ## Modules
//!
//! - [`grammar`] — table input structures, validation, loaded grammars
//! - [`parser`] — parse entry points and configuration
//! - [`syntax`] — trees, nodes, cursors, byte ranges
//! - [`error`] — error taxonomy, metrics, result envelope
//!
//! The lexer driver and the token reuse machinery are internal; tokens
//! surface only as tree leaves, and edits through [`Edit`].

pub mod error;
pub mod grammar;
pub(crate) mod incremental;
pub(crate) mod lexer;
pub mod parser;
pub mod syntax;

pub use error::{GrammarError, ParseError, ParseFault, ParseMetrics, ParseResult};
pub use grammar::{Grammar, GrammarTables};
pub use incremental::Edit;
pub use parser::{ParseConfig, Parser};
pub use syntax::{Cursor, NodeRef, TextRange, TextSize, Tree};
