use crate::grammar::{FieldId, Grammar, LexStateId, SymbolId};
use crate::syntax::{Cursor, TextRange, TextSize};
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;

/// Lex bookkeeping carried by leaf nodes.
///
/// Used only to decide whether a leaf may be reused by an incremental
/// re-parse; invisible to the walk interface.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LeafInfo {
    /// Lex state the token was produced in.
    pub(crate) lex_state: LexStateId,
    /// Reusability flag from the shift action that consumed the token.
    pub(crate) reusable: bool,
    /// Bytes the lexer examined beyond the token's end (maximal munch
    /// overshoot plus the terminating character).
    pub(crate) lookahead: TextSize,
}

/// A node of the concrete syntax tree.
///
/// Created exactly once, on shift (leaf) or reduce (interior), immutable
/// afterwards. Children are `Arc`-shared so unaffected subtrees can be reused
/// across re-parses of edited text.
pub struct Node {
    symbol: SymbolId,
    alias: Option<SymbolId>,
    range: TextRange,
    /// Leading trivia bytes preceding `range.start()` (leaves only; zero on
    /// interior nodes).
    padding: TextSize,
    is_error: bool,
    contains_error: bool,
    children: Box<[Arc<Node>]>,
    /// `(field, child index)` annotations from the production's field map.
    fields: Box<[(FieldId, u16)]>,
    leaf: Option<LeafInfo>,
}

impl Node {
    pub(crate) fn leaf(
        symbol: SymbolId,
        range: TextRange,
        padding: TextSize,
        info: LeafInfo,
    ) -> Arc<Self> {
        Arc::new(Self {
            symbol,
            alias: None,
            range,
            padding,
            is_error: false,
            contains_error: false,
            children: Box::new([]),
            fields: Box::new([]),
            leaf: Some(info),
        })
    }

    pub(crate) fn interior(
        symbol: SymbolId,
        range: TextRange,
        children: Vec<Arc<Self>>,
        fields: Box<[(FieldId, u16)]>,
    ) -> Arc<Self> {
        let contains_error = children.iter().any(|c| c.is_error || c.contains_error);
        Arc::new(Self {
            symbol,
            alias: None,
            range,
            padding: TextSize::zero(),
            is_error: false,
            contains_error,
            children: children.into_boxed_slice(),
            fields,
            leaf: None,
        })
    }

    /// Wrapper for skipped text and abandoned subtrees during recovery.
    pub(crate) fn error(range: TextRange, children: Vec<Arc<Self>>) -> Arc<Self> {
        Arc::new(Self {
            symbol: SymbolId::ERROR,
            alias: None,
            range,
            padding: TextSize::zero(),
            is_error: true,
            contains_error: true,
            children: children.into_boxed_slice(),
            fields: Box::new([]),
            leaf: None,
        })
    }

    /// Shallow copy under a public-facing symbol (alias sequences).
    pub(crate) fn aliased(node: &Arc<Self>, alias: SymbolId) -> Arc<Self> {
        Arc::new(Self {
            symbol: node.symbol,
            alias: Some(alias),
            range: node.range,
            padding: node.padding,
            is_error: node.is_error,
            contains_error: node.contains_error,
            children: node.children.clone(),
            fields: node.fields.clone(),
            leaf: node.leaf,
        })
    }

    /// Shallow copy with a widened span; used to stretch the accepted root
    /// over leading/trailing trivia.
    pub(crate) fn with_range(node: &Arc<Self>, range: TextRange) -> Arc<Self> {
        Arc::new(Self {
            symbol: node.symbol,
            alias: node.alias,
            range,
            padding: node.padding,
            is_error: node.is_error,
            contains_error: node.contains_error,
            children: node.children.clone(),
            fields: node.fields.clone(),
            leaf: node.leaf,
        })
    }

    /// Shallow copy at a shifted position; used when reusing a leaf from a
    /// previous tree after an edit moved it.
    pub(crate) fn relocated(node: &Arc<Self>, range: TextRange, padding: TextSize) -> Arc<Self> {
        Arc::new(Self {
            symbol: node.symbol,
            alias: None,
            range,
            padding,
            is_error: node.is_error,
            contains_error: node.contains_error,
            children: node.children.clone(),
            fields: node.fields.clone(),
            leaf: node.leaf,
        })
    }

    #[inline]
    pub(crate) const fn symbol(&self) -> SymbolId {
        self.symbol
    }

    /// Symbol the node is reported under: its alias when one was applied.
    #[inline]
    pub(crate) fn effective_symbol(&self) -> SymbolId {
        self.alias.unwrap_or(self.symbol)
    }

    #[inline]
    pub(crate) const fn range(&self) -> TextRange {
        self.range
    }

    #[inline]
    pub(crate) const fn padding(&self) -> TextSize {
        self.padding
    }

    /// Content range extended left over the leading trivia.
    pub(crate) fn padded_range(&self) -> TextRange {
        TextRange::new(self.range.start() - self.padding, self.range.end())
    }

    #[inline]
    pub(crate) const fn is_error(&self) -> bool {
        self.is_error
    }

    #[inline]
    pub(crate) const fn has_error(&self) -> bool {
        self.is_error || self.contains_error
    }

    #[inline]
    pub(crate) fn children(&self) -> &[Arc<Self>] {
        &self.children
    }

    #[inline]
    pub(crate) fn is_leaf(&self) -> bool {
        self.leaf.is_some()
    }

    #[inline]
    pub(crate) const fn leaf_info(&self) -> Option<LeafInfo> {
        self.leaf
    }

    pub(crate) fn fields(&self) -> &[(FieldId, u16)] {
        &self.fields
    }

    pub(crate) fn field_for_child(&self, index: usize) -> Option<FieldId> {
        let index = u16::try_from(index).ok()?;
        self.fields
            .iter()
            .find(|(_, idx)| *idx == index)
            .map(|(field, _)| *field)
    }

}

// Structural identity: spans, symbols, annotations, children. Lex
// bookkeeping is derived from the same text and excluded.
impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.symbol == other.symbol
            && self.alias == other.alias
            && self.range == other.range
            && self.padding == other.padding
            && self.is_error == other.is_error
            && self.fields == other.fields
            && self.children.len() == other.children.len()
            && self
                .children
                .iter()
                .zip(other.children.iter())
                .all(|(a, b)| a == b)
    }
}

impl Eq for Node {}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("symbol", &self.symbol)
            .field("range", &self.range)
            .field("children", &self.children.len())
            .finish()
    }
}

/// A parsed syntax tree: the root node plus the source text and grammar it
/// was produced from.
#[derive(Clone)]
pub struct Tree {
    grammar: Arc<Grammar>,
    source: Arc<str>,
    root: Arc<Node>,
}

impl Tree {
    pub(crate) fn new(grammar: Arc<Grammar>, source: Arc<str>, root: Arc<Node>) -> Self {
        Self {
            grammar,
            source,
            root,
        }
    }

    #[must_use]
    pub fn root(&self) -> NodeRef<'_> {
        NodeRef {
            tree: self,
            node: self.root.as_ref(),
        }
    }

    #[must_use]
    pub fn grammar(&self) -> &Arc<Grammar> {
        &self.grammar
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// True when recovery inserted any ERROR node.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.root.has_error()
    }

    /// Cursor positioned at the root.
    #[must_use]
    pub fn walk(&self) -> Cursor<'_> {
        Cursor::new(self)
    }

    pub(crate) fn root_node(&self) -> &Arc<Node> {
        &self.root
    }
}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tree({})", self.root().to_sexp())
    }
}

/// Borrowed view of a node, tied to its tree for name resolution and text
/// slicing. This is the walk interface surrounding tooling should depend on.
#[derive(Clone, Copy)]
pub struct NodeRef<'t> {
    tree: &'t Tree,
    node: &'t Node,
}

impl<'t> NodeRef<'t> {
    pub(crate) fn new(tree: &'t Tree, node: &'t Node) -> Self {
        Self { tree, node }
    }

    /// Human-readable kind, after alias resolution.
    #[must_use]
    pub fn kind(&self) -> &'t str {
        self.tree.grammar.symbol_name(self.node.effective_symbol())
    }

    #[must_use]
    pub fn symbol(&self) -> SymbolId {
        self.node.effective_symbol()
    }

    #[must_use]
    pub fn is_named(&self) -> bool {
        self.tree.grammar.is_named(self.node.effective_symbol())
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.node.is_error()
    }

    /// True for this node or any descendant being an ERROR wrapper.
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.node.has_error()
    }

    #[must_use]
    pub fn range(&self) -> TextRange {
        self.node.range()
    }

    /// Content range extended left over the leading trivia (whitespace and
    /// comments skipped before this leaf). In document order, these ranges
    /// tile the input.
    #[must_use]
    pub fn range_with_trivia(&self) -> TextRange {
        self.node.padded_range()
    }

    #[must_use]
    pub fn text(&self) -> &'t str {
        &self.tree.source[self.node.range().as_usize()]
    }

    #[must_use]
    pub fn child_count(&self) -> usize {
        self.node.children().len()
    }

    #[must_use]
    pub fn child(&self, index: usize) -> Option<NodeRef<'t>> {
        self.node.children().get(index).map(|child| NodeRef {
            tree: self.tree,
            node: child.as_ref(),
        })
    }

    pub fn children(&self) -> impl Iterator<Item = NodeRef<'t>> + '_ {
        let tree = self.tree;
        self.node
            .children()
            .iter()
            .map(move |child| NodeRef {
                tree,
                node: child.as_ref(),
            })
    }

    pub fn named_children(&self) -> impl Iterator<Item = NodeRef<'t>> + '_ {
        self.children().filter(|c| c.is_named())
    }

    /// First child annotated with the given field name.
    #[must_use]
    pub fn child_by_field(&self, name: &str) -> Option<NodeRef<'t>> {
        let field = self.tree.grammar.field_id(name)?;
        self.child_by_field_id(field)
    }

    #[must_use]
    pub fn child_by_field_id(&self, field: FieldId) -> Option<NodeRef<'t>> {
        self.node
            .fields()
            .iter()
            .find(|(f, _)| *f == field)
            .and_then(|(_, idx)| self.child(usize::from(*idx)))
    }

    /// Field name of the child at `index`, when the production annotated it.
    #[must_use]
    pub fn field_for_child(&self, index: usize) -> Option<&'t str> {
        let field = self.node.field_for_child(index)?;
        Some(self.tree.grammar.field_name(field))
    }

    /// S-expression of the named structure, the ecosystem's standard display
    /// format: `(binary_expression lhs: (number) rhs: (number))`.
    #[must_use]
    pub fn to_sexp(&self) -> String {
        let mut out = String::new();
        self.write_sexp(&mut out, None);
        out
    }

    fn write_sexp(&self, out: &mut String, field: Option<&str>) {
        if !self.is_named() && !self.is_error() {
            return;
        }
        if !out.is_empty() && !out.ends_with('(') {
            out.push(' ');
        }
        if let Some(field) = field {
            out.push_str(field);
            out.push_str(": ");
        }
        out.push('(');
        out.push_str(self.kind());
        let named: SmallVec<[usize; 8]> = (0..self.child_count())
            .filter(|&i| {
                self.child(i)
                    .is_some_and(|c| c.is_named() || c.is_error())
            })
            .collect();
        for i in named {
            if let Some(child) = self.child(i) {
                child.write_sexp(out, self.field_for_child(i));
            }
        }
        out.push(')');
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.kind(), self.range())
    }
}
