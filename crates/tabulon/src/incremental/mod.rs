//! Incremental re-parse support: edit descriptions and the token reuse
//! stream.
//!
//! A re-parse runs the full stack machine over the new text; what it reuses
//! are *tokens* from the previous tree, offered back to the parser at their
//! shifted positions. A leaf qualifies only when every condition a fresh lex
//! would depend on is provably unchanged:
//!
//! - it lies outside every edit's damage range, extended by the lexer's
//!   recorded lookahead past the token end;
//! - the current parse state selects the same lex mode the token was
//!   originally produced in;
//! - the action consuming it is not flagged non-reusable;
//! - its (shifted) padded start is exactly the parser's cursor position.
//!
//! Everything else is re-lexed, so the result is structurally identical to
//! parsing the new text from scratch.

use crate::lexer::Lexeme;
use crate::syntax::{Node, TextRange, TextSize, Tree};
use crate::grammar::{LexStateId, SymbolId};
use std::sync::Arc;

/// A byte-range edit: `start..old_end` in the pre-edit text was replaced by
/// `start..new_end` in the post-edit text.
///
/// When passing several edits, each must be expressed in the coordinates
/// produced by applying the previous ones, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edit {
    pub start: TextSize,
    pub old_end: TextSize,
    pub new_end: TextSize,
}

impl Edit {
    /// Replace `range` with `new_len` bytes.
    #[must_use]
    pub fn replace(range: TextRange, new_len: TextSize) -> Self {
        Self {
            start: range.start(),
            old_end: range.end(),
            new_end: range.start() + new_len,
        }
    }

    /// Insert `len` bytes at `offset`.
    #[must_use]
    pub fn insert(offset: TextSize, len: TextSize) -> Self {
        Self {
            start: offset,
            old_end: offset,
            new_end: offset + len,
        }
    }

    /// Delete `range`.
    #[must_use]
    pub fn delete(range: TextRange) -> Self {
        Self {
            start: range.start(),
            old_end: range.end(),
            new_end: range.start(),
        }
    }

    /// The pre-edit span this edit damages.
    #[must_use]
    pub fn old_range(&self) -> TextRange {
        TextRange::new(self.start, self.old_end)
    }
}

/// A leaf carried over from the previous tree, at its post-edit position.
#[derive(Debug, Clone)]
struct CachedLeaf {
    node: Arc<Node>,
    padded_start: TextSize,
    range: TextRange,
    dirty: bool,
}

/// Document-ordered queue of previous-tree leaves the parser may reuse.
pub(crate) struct ReuseStream {
    leaves: Vec<CachedLeaf>,
    cursor: usize,
}

impl ReuseStream {
    /// Stream that never offers anything (from-scratch parse).
    pub(crate) const fn empty() -> Self {
        Self {
            leaves: Vec::new(),
            cursor: 0,
        }
    }

    pub(crate) fn from_tree(tree: &Tree, edits: &[Edit]) -> Self {
        let mut collected = Vec::new();
        collect_leaves(tree.root_node(), false, &mut collected);
        let mut leaves: Vec<CachedLeaf> = collected
            .into_iter()
            .map(|(node, in_error)| CachedLeaf {
                padded_start: node.padded_range().start(),
                range: node.range(),
                // Leaves inside ERROR wrappers were accepted under recovery,
                // not a normal shift; never offer them back.
                dirty: in_error || node.leaf_info().is_none(),
                node,
            })
            .collect();
        for edit in edits {
            apply_edit(&mut leaves, *edit);
        }
        Self { leaves, cursor: 0 }
    }

    /// Offer the leaf sitting exactly at `pos`, lexed in `mode`, whose
    /// symbol passes the caller's action-table check.
    pub(crate) fn take(
        &mut self,
        pos: TextSize,
        mode: LexStateId,
        valid: impl Fn(SymbolId) -> bool,
    ) -> Option<(Lexeme, Arc<Node>)> {
        while self
            .leaves
            .get(self.cursor)
            .is_some_and(|leaf| leaf.dirty || leaf.padded_start < pos)
        {
            self.cursor += 1;
        }
        let cached = self.leaves.get(self.cursor)?;
        if cached.padded_start != pos {
            return None;
        }
        let info = cached.node.leaf_info()?;
        if info.lex_state != mode || !info.reusable || !valid(cached.node.symbol()) {
            return None;
        }
        // Aliases were applied by the old parent production; the new parse
        // re-applies them on reduce, so the offered leaf starts alias-free.
        let unmoved = cached.range == cached.node.range()
            && cached.node.effective_symbol() == cached.node.symbol();
        let node = if unmoved {
            Arc::clone(&cached.node)
        } else {
            Node::relocated(&cached.node, cached.range, cached.node.padding())
        };
        let lexeme = Lexeme {
            symbol: node.symbol(),
            padded_start: pos,
            range: cached.range,
            lex_state: info.lex_state,
            lookahead: info.lookahead,
        };
        self.cursor += 1;
        Some((lexeme, node))
    }
}

fn collect_leaves(node: &Arc<Node>, in_error: bool, out: &mut Vec<(Arc<Node>, bool)>) {
    let in_error = in_error || node.is_error();
    if node.is_leaf() {
        out.push((Arc::clone(node), in_error));
    } else {
        for child in node.children() {
            collect_leaves(child, in_error, out);
        }
    }
}

/// Shift clean leaves past the edit and mark damaged ones dirty. Leaves are
/// in the coordinate space of all previously applied edits, matching the
/// convention for the `edits` slice.
fn apply_edit(leaves: &mut [CachedLeaf], edit: Edit) {
    for leaf in leaves.iter_mut() {
        if leaf.dirty {
            continue;
        }
        let lookahead = leaf.node.leaf_info().map_or(TextSize::zero(), |i| i.lookahead);
        let guarded = TextRange::new(leaf.padded_start, leaf.range.end() + lookahead);
        if guarded.touches(edit.old_range()) {
            leaf.dirty = true;
        } else if leaf.padded_start >= edit.old_end {
            let shift = |offset: TextSize| edit.new_end + (offset - edit.old_end);
            leaf.padded_start = shift(leaf.padded_start);
            leaf.range = TextRange::new(shift(leaf.range.start()), shift(leaf.range.end()));
        }
    }
}
