use core::borrow::Borrow;

use smallvec::SmallVec;
use tracing::{debug, warn};

use super::arena::Arena;
use super::element::MortalElement;
use super::node::{Body, Node, NodeHandle, Siblings};
use super::roots::RootTable;
use crate::config::{ARENA_LIMIT, Fanout, TreeConfig};
use crate::error::{Result, TreeError};
use crate::{Revision, TreeStats};

/// The core partially persistent B-tree backing `TemporalBTree`.
///
/// Nodes and values live in append-only arenas; the root table maps every
/// revision to its root. A write opens revision `T + 1`, edits element
/// lifetimes in the target leaf and then lets the rebalancing driver
/// version-copy, split and merge its way back to the root.
pub(crate) struct RawTemporalTree<K, V> {
    /// Every node ever created, retired ones included.
    pub(super) nodes: Arena<Node<K, V>>,
    /// Every value ever inserted. Elements refer to values by handle so a
    /// version copy never clones a value.
    pub(super) values: Arena<V>,
    pub(super) roots: RootTable<K, V>,
    pub(super) config: TreeConfig,
    pub(super) fanout: Fanout,
    pub(super) stats: TreeStats,
}

impl<K, V> RawTemporalTree<K, V> {
    /// Creates an empty tree. `config` must already be validated.
    pub(crate) fn new(config: TreeConfig) -> Self {
        Self {
            nodes: Arena::with_limit(config.max_nodes),
            values: Arena::with_limit(ARENA_LIMIT),
            roots: RootTable::new(),
            config,
            fanout: config.fanout(),
            stats: TreeStats::default(),
        }
    }

    pub(crate) fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub(crate) fn stats(&self) -> TreeStats {
        self.stats
    }

    pub(crate) fn current_revision(&self) -> Revision {
        self.roots.current()
    }

    pub(crate) fn contains_revision(&self, t: Revision) -> bool {
        self.roots.contains(t)
    }

    pub(crate) fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn value_count(&self) -> usize {
        self.values.len()
    }

    #[cfg(test)]
    pub(crate) fn root_at(&self, t: Revision) -> Option<NodeHandle<K, V>> {
        self.roots.get(t)
    }

    #[cfg(test)]
    pub(crate) fn node(&self, handle: NodeHandle<K, V>) -> &Node<K, V> {
        self.nodes.get(handle)
    }

    /// The unique internal node routing to `node` at `t`, if any.
    pub(crate) fn parent_at(&self, node: NodeHandle<K, V>, t: Revision) -> Option<NodeHandle<K, V>> {
        self.nodes.get(node).parents().iter().copied().find(|&parent| {
            self.nodes.get(parent).as_internal().find_routing_element_to(node, t).is_some()
        })
    }

    pub(crate) fn is_root_at(&self, node: NodeHandle<K, V>, t: Revision) -> bool {
        self.parent_at(node, t).is_none()
    }

    /// The live siblings adjacent to `node` at `t`; `None` for a root.
    pub(crate) fn neighboring_siblings_at(&self, node: NodeHandle<K, V>, t: Revision) -> Option<Siblings<K, V>> {
        let parent = self.parent_at(node, t)?;
        self.nodes.get(parent).as_internal().neighbors_of(node, t)
    }

    /// Number of levels between the root at `t` and its leaves (0 when empty).
    pub(crate) fn depth_at(&self, t: Revision) -> usize {
        let Some(mut current) = self.roots.get(t) else {
            return 0;
        };
        let mut depth = 1;
        while let Body::Internal(internal) = self.nodes.get(current).body() {
            current = internal
                .children_at(t)
                .next()
                .expect("`RawTemporalTree::depth_at()` - internal node without live children");
            depth += 1;
        }
        depth
    }

    /// Number of live elements in the root at `t`.
    pub(crate) fn root_fanout_at(&self, t: Revision) -> usize {
        self.roots.get(t).map_or(0, |root| self.nodes.get(root).live_len(t))
    }

    /// Inserts a routing element into `parent` at `index` and registers
    /// `parent` as a parent of the routed child.
    pub(crate) fn add_child(
        &mut self,
        parent: NodeHandle<K, V>,
        index: usize,
        element: MortalElement<K, NodeHandle<K, V>>,
    ) {
        let child = element.payload();
        self.nodes.get_mut(parent).as_internal_mut().insert(index, element);
        self.nodes.get_mut(child).add_parent(parent);
    }

    /// Appends a routing element to `parent`.
    pub(crate) fn push_child(&mut self, parent: NodeHandle<K, V>, element: MortalElement<K, NodeHandle<K, V>>) {
        let index = self.nodes.get(parent).as_internal().elements().len();
        self.add_child(parent, index, element);
    }

    /// Ends the live edge `parent -> child` at `t`.
    ///
    /// # Panics
    ///
    /// Panics if no such edge is alive at `t`.
    pub(crate) fn remove_edge_to(&mut self, parent: NodeHandle<K, V>, child: NodeHandle<K, V>, t: Revision) {
        let internal = self.nodes.get_mut(parent).as_internal_mut();
        assert!(
            internal.remove_edge_to(child, t),
            "`RawTemporalTree::remove_edge_to()` - {parent:?} has no live edge to {child:?} at {t}"
        );
        self.forget_parent_if_unlinked(parent, child);
    }

    /// Drops `parent` from `child`'s back-references once no routing
    /// element in `parent` (dead or alive) leads to `child` anymore.
    pub(crate) fn forget_parent_if_unlinked(&mut self, parent: NodeHandle<K, V>, child: NodeHandle<K, V>) {
        if !self.nodes.get(parent).as_internal().has_edge_to(child) {
            self.nodes.get_mut(child).remove_parent(parent);
        }
    }

    /// Leftmost-to-rightmost iterator over the pairs live at `t`.
    pub(crate) fn iter_at(&self, t: Revision) -> RawIter<'_, K, V> {
        RawIter {
            tree: self,
            t,
            stack: self.roots.get(t).into_iter().collect(),
            leaf: None,
        }
    }

    /// Rejects the write up front when the worst case would not fit, so a
    /// failed write never leaves a half-restructured revision behind.
    fn reserve(&self, latest: Revision, values: usize) -> Result<()> {
        // Per level: one version copy, one sibling copy, one split. Plus a new root.
        let required = 3 * self.depth_at(latest) + 1;
        let available = self.nodes.available();
        if required > available {
            warn!(revision = %latest, required, available, "node arena exhausted, write rejected");
            return Err(TreeError::CapacityExhausted {
                resource: "node",
                required,
                available,
            });
        }
        let available = self.values.available();
        if values > available {
            warn!(revision = %latest, required = values, available, "value arena exhausted, write rejected");
            return Err(TreeError::CapacityExhausted {
                resource: "value",
                required: values,
                available,
            });
        }
        Ok(())
    }
}

impl<K: Ord + Clone, V> RawTemporalTree<K, V> {
    /// Walks from `root` to the external node responsible for `key` using
    /// the routing elements alive at `t`.
    fn descend<Q>(&self, root: NodeHandle<K, V>, key: &Q, t: Revision) -> NodeHandle<K, V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut current = root;
        loop {
            match self.nodes.get(current).body() {
                Body::Internal(internal) => {
                    current = internal
                        .route(key, t)
                        .expect("`RawTemporalTree::descend()` - internal node without live children");
                }
                Body::External(_) => return current,
            }
        }
    }

    /// Returns the value stored under `key` at revision `t`.
    pub(crate) fn lookup<Q>(&self, key: &Q, t: Revision) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let root = self.roots.get(t)?;
        let leaf = self.nodes.get(self.descend(root, key, t)).as_external();
        let index = leaf.position_at(key, t)?;
        Some(self.values.get(leaf.element(index).payload()))
    }

    /// Inserts or replaces `key` at a new revision and returns it.
    pub(crate) fn insert(&mut self, key: K, value: V) -> Result<Revision> {
        let latest = self.roots.current();
        self.reserve(latest, 1)?;

        let t = self.roots.begin();
        let value = self.values.alloc(value);

        let Some(root) = self.roots.get(latest) else {
            let leaf = self.nodes.alloc(Node::new_external());
            self.nodes.get_mut(leaf).as_external_mut().add(MortalElement::new(key, value, t));
            self.roots.set(t, Some(leaf));
            debug!(revision = %t, "insert into empty tree");
            return Ok(t);
        };

        let leaf = self.descend(root, &key, latest);
        let probe = key.clone();
        let external = self.nodes.get_mut(leaf).as_external_mut();
        let replaced = external.position_at(&key, latest);
        if let Some(index) = replaced {
            external.kill(index, t);
            self.stats.replaced_values += 1;
        }
        external.add(MortalElement::new(key, value, t));

        self.remedy_overflow(leaf, t);
        self.compact_path(&probe, t);
        debug!(revision = %t, replaced = replaced.is_some(), depth = self.depth_at(t), "insert");
        Ok(t)
    }

    /// Logically deletes `key` at a new revision and returns it.
    pub(crate) fn delete<Q>(&mut self, key: &Q) -> Result<Revision>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let latest = self.roots.current();
        let not_found = || TreeError::KeyNotFound { revision: latest };

        let root = self.roots.get(latest).ok_or_else(not_found)?;
        let leaf = self.descend(root, key, latest);
        let index = self.nodes.get(leaf).as_external().position_at(key, latest).ok_or_else(not_found)?;
        self.reserve(latest, 0)?;

        let t = self.roots.begin();
        self.nodes.get_mut(leaf).as_external_mut().kill(index, t);

        self.remedy_underflow(leaf, t);
        self.compact_path(key, t);
        debug!(revision = %t, depth = self.depth_at(t), "delete");
        Ok(t)
    }
}

/// In-order iterator over the key/value pairs alive at one revision.
pub(crate) struct RawIter<'a, K, V> {
    tree: &'a RawTemporalTree<K, V>,
    t: Revision,
    // Subtrees still to visit; the next one is on top.
    stack: SmallVec<[NodeHandle<K, V>; 16]>,
    // The external node being drained and the next element index in it.
    leaf: Option<(NodeHandle<K, V>, usize)>,
}

impl<'a, K, V> Iterator for RawIter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let tree = self.tree;
        let t = self.t;
        loop {
            if let Some((leaf, index)) = &mut self.leaf {
                let elements = tree.nodes.get(*leaf).as_external().elements();
                while let Some(element) = elements.get(*index) {
                    *index += 1;
                    if element.is_alive_at(t) {
                        return Some((element.key(), tree.values.get(element.payload())));
                    }
                }
                self.leaf = None;
            }

            let node = self.stack.pop()?;
            match tree.nodes.get(node).body() {
                Body::Internal(internal) => {
                    let children: SmallVec<[NodeHandle<K, V>; 16]> = internal.children_at(t).collect();
                    self.stack.extend(children.into_iter().rev());
                }
                Body::External(_) => self.leaf = Some((node, 0)),
            }
        }
    }
}
