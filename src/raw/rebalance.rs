use core::borrow::Borrow;

use smallvec::SmallVec;
use tracing::trace;

use super::node::{Body, NodeHandle};
use super::raw_temporal_tree::RawTemporalTree;
use crate::Revision;

impl<K: Ord + Clone, V> RawTemporalTree<K, V> {
    /// Restores the fanout bounds after an element was added to `leaf` at `t`,
    /// splitting upward for as long as parents overflow.
    pub(crate) fn remedy_overflow(&mut self, leaf: NodeHandle<K, V>, t: Revision) {
        let mut next = Some(leaf);
        while let Some(node) = next.take() {
            let node = self.ensure_fresh(node, t);
            let Some(parent) = self.restructure(node, t) else {
                break;
            };
            if self.fanout.is_overflowing(self.nodes.get(parent).live_len(t)) {
                next = Some(parent);
            }
        }
    }

    /// Restores the fanout bounds after an element of `leaf` died at `t`,
    /// merging upward for as long as non-root parents underflow.
    pub(crate) fn remedy_underflow(&mut self, leaf: NodeHandle<K, V>, t: Revision) {
        let mut next = Some(leaf);
        while let Some(node) = next.take() {
            let node = self.ensure_fresh(node, t);
            let Some(parent) = self.restructure(node, t) else {
                break;
            };
            if self.fanout.is_underflowing(self.nodes.get(parent).live_len(t)) && !self.is_root_at(parent, t) {
                next = Some(parent);
            }
        }
    }

    /// Splits an overflowing node or merges an underflowing non-root one.
    /// Returns the parent that may now need attention.
    fn restructure(&mut self, node: NodeHandle<K, V>, t: Revision) -> Option<NodeHandle<K, V>> {
        let live = self.nodes.get(node).live_len(t);
        if self.fanout.is_overflowing(live) {
            Some(self.split(node, t).1)
        } else if self.fanout.is_underflowing(live) && !self.is_root_at(node, t) {
            self.merge_with_neighbor(node, t)
        } else {
            None
        }
    }

    /// Version-copies the internal nodes on the path to `key` at `t` whose
    /// dead routing elements have piled up, deepest first.
    ///
    /// Routing elements replaced by a child's version copy stay in place, so
    /// a node that is never restructured would otherwise grow with every
    /// write below it.
    pub(crate) fn compact_path<Q>(&mut self, key: &Q, t: Revision)
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let Some(root) = self.roots.get(t) else {
            return;
        };
        let mut path: SmallVec<[NodeHandle<K, V>; 8]> = SmallVec::new();
        let mut current = root;
        while let Body::Internal(internal) = self.nodes.get(current).body() {
            path.push(current);
            match internal.route(key, t) {
                Some(child) => current = child,
                None => break,
            }
        }

        for node in path.into_iter().rev() {
            let stored = self.nodes.get(node).as_internal().elements().len();
            if stored > self.fanout.compact_len && !self.nodes.get(node).is_fresh_at(t) {
                trace!(target: "temporal_btree::version_copy", revision = %t, ?node, stored, "compacting");
                self.version_copy(node, t);
            }
        }
    }
}
