//! Field and alias resolution, applied while a reduce builds its node.

use crate::grammar::{FieldId, Grammar, ProductionId};
use crate::syntax::Node;
use smallvec::SmallVec;
use std::sync::Arc;

/// Resolve a production's field map and alias sequence against the children
/// collected by a reduce.
///
/// Pure: a production with no registered map yields no annotations, which is
/// as valid as one with a full map. Map indices address the production's
/// own children; ERROR extras collected during recovery are transparent to
/// them, and indices beyond the actual child list (possible when
/// invisible-symbol splicing changed the arity) are ignored. Aliased
/// children are rebuilt under their public symbol before the parent takes
/// ownership.
///
/// Returns the field annotations as `(field, actual child index)` pairs.
pub(super) fn attach(
    grammar: &Grammar,
    production: ProductionId,
    children: &mut [Arc<Node>],
) -> Box<[(FieldId, u16)]> {
    // Map production positions to actual positions, skipping error extras.
    let logical: SmallVec<[u16; 8]> = children
        .iter()
        .enumerate()
        .filter(|(_, child)| !child.is_error())
        .map(|(actual, _)| actual as u16)
        .collect();

    for &(index, alias) in grammar.alias_entries(production) {
        if let Some(&actual) = logical.get(usize::from(index)) {
            let child = &mut children[usize::from(actual)];
            *child = Node::aliased(child, alias);
        }
    }
    grammar
        .field_entries(production)
        .iter()
        .filter_map(|&(field, index)| {
            logical
                .get(usize::from(index))
                .map(|&actual| (field, actual))
        })
        .collect()
}
