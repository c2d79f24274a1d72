use tracing::trace;

use super::element::MortalElement;
use super::node::{Body, ExternalNode, InternalNode, Node, NodeHandle, ValueHandle};
use super::raw_temporal_tree::RawTemporalTree;
use crate::Revision;

/// Elements detached from one node on their way to another.
enum Detached<K, V> {
    Internal(Vec<MortalElement<K, NodeHandle<K, V>>>),
    External(Vec<MortalElement<K, ValueHandle<V>>>),
}

impl<K: Ord + Clone, V> RawTemporalTree<K, V> {
    /// Moves the upper half of the fresh node `node` into a new sibling
    /// placed right after it, creating a new root if `node` was the root.
    /// Returns the new sibling and the (possibly new) parent.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not fresh at `t` or its live count is outside the
    /// splittable range.
    pub(crate) fn split(&mut self, node: NodeHandle<K, V>, t: Revision) -> (NodeHandle<K, V>, NodeHandle<K, V>) {
        let current = self.nodes.get(node);
        let live = current.live_len(t);
        assert!(current.is_fresh_at(t), "`split()` - {node:?} is not fresh at {t}");
        assert!(
            self.fanout.can_split(live),
            "`split()` - {node:?} holds {live} live elements, outside {}..={}",
            self.fanout.resplit,
            self.fanout.split_max
        );
        debug_assert!(
            match current.body() {
                Body::Internal(elements) => elements.elements().iter().all(MortalElement::is_immortal),
                Body::External(elements) => elements.elements().iter().all(MortalElement::is_immortal),
            },
            "`split()` - a fresh node holds only live elements"
        );
        let internal = current.is_internal();
        let sibling = current.new_sibling();

        let parent = self.parent_at(node, t);
        let sibling = self.nodes.alloc(sibling);
        let upper = self.detach(node, |elements| elements.drop_upper_half(), |elements| elements.drop_upper_half());
        self.attach(node, sibling, upper);

        let sibling_key = self.first_key(sibling, t);
        let routing = MortalElement::new(sibling_key, sibling, t);
        let parent = match parent {
            Some(parent) => {
                let index = self
                    .nodes
                    .get(parent)
                    .as_internal()
                    .find_routing_element_to(node, t)
                    .expect("`split()` - parent has no live edge to the split node");
                self.add_child(parent, index + 1, routing);
                parent
            }
            None => {
                let node_key = self.first_key(node, t);
                let root = self.nodes.alloc(Node::new_internal());
                self.push_child(root, MortalElement::new(node_key, node, t));
                self.push_child(root, routing);
                self.roots.set(t, Some(root));
                root
            }
        };

        if internal {
            self.stats.internal_splits += 1;
        } else {
            self.stats.leaf_splits += 1;
        }
        trace!(
            target: "temporal_btree::split",
            revision = %t,
            ?node,
            ?sibling,
            ?parent,
            live,
            "split"
        );
        (sibling, parent)
    }

    /// Folds the fresh node `right` into its fresh left neighbor `left`.
    ///
    /// Collapses the parent when it is the root and `left` is its last live
    /// child, and re-splits `left` when the merge made it too full. Returns
    /// the parent unless it was collapsed.
    ///
    /// # Panics
    ///
    /// Panics if either node is not fresh at `t`, the variants differ or
    /// `right` has no parent.
    pub(crate) fn merge(&mut self, left: NodeHandle<K, V>, right: NodeHandle<K, V>, t: Revision) -> Option<NodeHandle<K, V>> {
        let internal = self.nodes.get(left).is_internal();
        assert!(
            self.nodes.get(left).is_fresh_at(t) && self.nodes.get(right).is_fresh_at(t),
            "`merge()` - {left:?} and {right:?} must both be fresh at {t}"
        );
        assert_eq!(
            internal,
            self.nodes.get(right).is_internal(),
            "`merge()` - cannot merge an internal node with an external one"
        );
        let parent = self
            .parent_at(right, t)
            .expect("`merge()` - the right node has no parent");
        debug_assert_eq!(self.parent_at(left, t), Some(parent), "`merge()` - nodes are not siblings");

        let elements = self.detach(right, |elements| elements.drop_all(), |elements| elements.drop_all());
        self.attach(right, left, elements);
        self.remove_edge_to(parent, right, t);

        if internal {
            self.stats.internal_merges += 1;
        } else {
            self.stats.leaf_merges += 1;
        }
        trace!(
            target: "temporal_btree::merge",
            revision = %t,
            ?left,
            ?right,
            ?parent,
            live = self.nodes.get(left).live_len(t),
            "merge"
        );

        let collapsed = self.is_root_at(parent, t) && self.nodes.get(parent).live_len(t) == 1;
        if collapsed {
            self.remove_edge_to(parent, left, t);
            self.roots.set(t, Some(left));
            self.stats.root_collapses += 1;
            trace!(target: "temporal_btree::merge", revision = %t, old_root = ?parent, new_root = ?left, "root collapse");
        }

        if self.nodes.get(left).live_len(t) >= self.fanout.resplit {
            self.split(left, t);
        }

        (!collapsed).then_some(parent)
    }

    /// Merges the underflowing non-root node `node` with an adjacent
    /// sibling, preferring the left one. Returns the parent if it survived.
    ///
    /// # Panics
    ///
    /// Panics if `node` is the only live child of its parent.
    pub(crate) fn merge_with_neighbor(&mut self, node: NodeHandle<K, V>, t: Revision) -> Option<NodeHandle<K, V>> {
        let siblings = self.neighboring_siblings_at(node, t)?;
        if let Some(left) = siblings.left {
            let left = self.ensure_fresh(left, t);
            self.merge(left, node, t)
        } else if let Some(right) = siblings.right {
            let right = self.ensure_fresh(right, t);
            self.merge(node, right, t)
        } else {
            // Non-root internal nodes keep at least two children from `MIN_ORDER` up.
            unreachable!("`merge_with_neighbor()` - {node:?} has no live sibling at {t}")
        }
    }

    fn first_key(&self, node: NodeHandle<K, V>, t: Revision) -> K {
        self.nodes
            .get(node)
            .first_live_key(t)
            .expect("`split()` - both halves of a split hold live elements")
            .clone()
    }

    fn detach(
        &mut self,
        node: NodeHandle<K, V>,
        internal: impl FnOnce(&mut InternalNode<K, V>) -> Vec<MortalElement<K, NodeHandle<K, V>>>,
        external: impl FnOnce(&mut ExternalNode<K, V>) -> Vec<MortalElement<K, ValueHandle<V>>>,
    ) -> Detached<K, V> {
        let node = self.nodes.get_mut(node);
        if node.is_internal() {
            Detached::Internal(internal(node.as_internal_mut()))
        } else {
            Detached::External(external(node.as_external_mut()))
        }
    }

    /// Appends `elements` taken from `from` to `to`, moving the children's
    /// back-references along for internal nodes.
    fn attach(&mut self, from: NodeHandle<K, V>, to: NodeHandle<K, V>, elements: Detached<K, V>) {
        match elements {
            Detached::Internal(elements) => {
                for element in elements {
                    let child = element.payload();
                    self.forget_parent_if_unlinked(from, child);
                    self.push_child(to, element);
                }
            }
            Detached::External(elements) => self.nodes.get_mut(to).as_external_mut().add_all(elements),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use crate::config::TreeConfig;
    use crate::raw::RawTemporalTree;
    use crate::Revision;

    fn order_six() -> RawTemporalTree<i32, i32> {
        RawTemporalTree::new(TreeConfig::new().with_order(6))
    }

    #[test]
    fn leaf_split_grows_a_root() {
        let mut tree = order_six();
        for key in 1..=7 {
            tree.insert(key, key).unwrap();
        }
        let t = Revision(7);
        assert_eq!(tree.depth_at(Revision(6)), 1);
        assert_eq!(tree.depth_at(t), 2);

        let root = tree.root_at(t).unwrap();
        let sizes: Vec<usize> = tree
            .node(root)
            .as_internal()
            .children_at(t)
            .map(|child| tree.node(child).live_len(t))
            .collect();
        assert_eq!(sizes, [3, 4]);
        assert_eq!(tree.stats().leaf_splits, 1);
        tree.validate_invariants();
    }

    #[test]
    fn internal_split_adds_a_level() {
        let mut tree = order_six();
        let mut key = 0;
        while tree.depth_at(tree.current_revision()) < 3 {
            tree.insert(key, key).unwrap();
            key += 1;
        }
        assert_eq!(tree.stats().internal_splits, 1);
        assert_eq!(tree.root_fanout_at(tree.current_revision()), 2);
        tree.validate_invariants();
    }

    #[test]
    fn merge_collapses_root() {
        let mut tree = order_six();
        for key in 1..=7 {
            tree.insert(key, key).unwrap();
        }
        // Leaves are {1, 2, 3} and {4, 5, 6, 7}.
        tree.delete(&7).unwrap();
        tree.delete(&6).unwrap();
        tree.delete(&1).unwrap();
        let t = tree.delete(&2).unwrap();

        assert_eq!(t, Revision(11));
        assert_eq!(tree.depth_at(t), 1);
        assert_eq!(tree.depth_at(Revision(10)), 2);
        let stats = tree.stats();
        assert_eq!(stats.leaf_merges, 1);
        assert_eq!(stats.root_collapses, 1);
        assert_eq!(stats.leaf_splits, 1);

        let root = tree.root_at(t).unwrap();
        let keys: Vec<i32> = tree.iter_at(t).map(|(k, _)| *k).collect();
        assert_eq!(keys, [3, 4, 5]);
        assert!(tree.node(root).is_external());
        assert!(tree.node(root).parents().is_empty());
        tree.validate_invariants();
    }

    #[test]
    fn merge_that_overfills_resplits() {
        let mut tree = order_six();
        for key in 1..=7 {
            tree.insert(key, key).unwrap();
        }
        tree.delete(&1).unwrap();
        let t = tree.delete(&2).unwrap();

        // {3} + {4, 5, 6, 7} reaches the re-split size, so the tree keeps two leaves.
        assert_eq!(tree.depth_at(t), 2);
        assert_eq!(tree.stats().root_collapses, 1);
        assert_eq!(tree.stats().leaf_splits, 2);
        assert_eq!(tree.iter_at(t).count(), 5);
        tree.validate_invariants();
    }

    #[test]
    fn draining_from_both_ends_keeps_fanout_bounds() {
        let mut tree = order_six();
        for key in 0..80 {
            tree.insert(key, key).unwrap();
        }
        let (mut low, mut high) = (0, 79);
        while low <= high {
            tree.delete(&low).unwrap();
            tree.validate_revision(tree.current_revision());
            if low < high {
                tree.delete(&high).unwrap();
                tree.validate_revision(tree.current_revision());
            }
            low += 1;
            high -= 1;
        }
        assert_eq!(tree.iter_at(tree.current_revision()).count(), 0);
        assert_eq!(tree.depth_at(tree.current_revision()), 1);
    }

    #[test]
    #[should_panic(expected = "`split()`")]
    fn split_requires_a_fresh_node() {
        let mut tree = order_six();
        for key in 1..=3 {
            tree.insert(key, key).unwrap();
        }
        let root = tree.root_at(Revision(3)).unwrap();
        let t = tree.roots.begin();
        tree.split(root, t);
    }

    #[test]
    #[should_panic(expected = "`split()`")]
    fn split_requires_enough_live_elements() {
        let mut tree = order_six();
        tree.insert(1, 1).unwrap();
        let root = tree.root_at(Revision(1)).unwrap();
        let t = tree.roots.begin();
        let root = tree.ensure_fresh(root, t);
        tree.split(root, t);
    }
}
