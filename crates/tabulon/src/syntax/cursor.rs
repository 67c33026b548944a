use crate::syntax::{Node, NodeRef, Tree};

/// Tree walker that remembers the path from the root.
///
/// Nodes hold no parent back-pointers; parent and sibling navigation is
/// reconstructed from the path recorded while descending, so a cursor is the
/// only way to move upwards.
pub struct Cursor<'t> {
    tree: &'t Tree,
    /// `(parent, index of the current node within parent)` frames, root-first.
    path: Vec<(&'t Node, usize)>,
    current: &'t Node,
}

impl<'t> Cursor<'t> {
    pub(crate) fn new(tree: &'t Tree) -> Self {
        Self {
            tree,
            path: Vec::new(),
            current: tree.root_node().as_ref(),
        }
    }

    #[must_use]
    pub fn node(&self) -> NodeRef<'t> {
        NodeRef::new(self.tree, self.current)
    }

    /// Field name of the current node's slot in its parent, if any.
    #[must_use]
    pub fn field_name(&self) -> Option<&'t str> {
        let (parent, index) = self.path.last()?;
        let field = parent.field_for_child(*index)?;
        Some(self.tree.grammar().field_name(field))
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// Descend to the first child. Returns false (and stays put) on a leaf.
    pub fn goto_first_child(&mut self) -> bool {
        match self.current.children().first() {
            Some(child) => {
                self.path.push((self.current, 0));
                self.current = child.as_ref();
                true
            }
            None => false,
        }
    }

    /// Move to the next sibling, staying at the same depth.
    pub fn goto_next_sibling(&mut self) -> bool {
        let Some((parent, index)) = self.path.last_mut() else {
            return false;
        };
        match parent.children().get(*index + 1) {
            Some(sibling) => {
                *index += 1;
                self.current = sibling.as_ref();
                true
            }
            None => false,
        }
    }

    /// Climb back to the parent. Returns false at the root.
    pub fn goto_parent(&mut self) -> bool {
        match self.path.pop() {
            Some((parent, _)) => {
                self.current = parent;
                true
            }
            None => false,
        }
    }
}
