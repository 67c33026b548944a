//! Syntax tree types: byte ranges, nodes, and the walk interface.
//!
//! Trees are immutable after a parse. Nodes own their children (`Arc`-shared
//! so re-parses can reuse them) and know nothing about their parents; upward
//! navigation goes through [`Cursor`].

mod cursor;
mod node;
mod text;

pub use cursor::Cursor;
pub use node::{NodeRef, Tree};
pub use text::{TextRange, TextSize};

pub(crate) use node::{LeafInfo, Node};
