use tracing::trace;

use super::element::MortalElement;
use super::node::NodeHandle;
use super::raw_temporal_tree::RawTemporalTree;
use crate::Revision;

impl<K: Ord + Clone, V> RawTemporalTree<K, V> {
    /// Returns `node` if it can be edited in place at `t`, otherwise a
    /// version copy of it.
    pub(crate) fn ensure_fresh(&mut self, node: NodeHandle<K, V>, t: Revision) -> NodeHandle<K, V> {
        if self.nodes.get(node).is_fresh_at(t) {
            node
        } else {
            self.version_copy(node, t)
        }
    }

    /// Retires `old` at `t` and moves its live content into a new node that
    /// takes `old`'s place under its parent (or as the root of `t`).
    ///
    /// # Panics
    ///
    /// Panics if `t` is the empty revision or is not the revision being written.
    pub(crate) fn version_copy(&mut self, old: NodeHandle<K, V>, t: Revision) -> NodeHandle<K, V> {
        assert!(t > Revision::EMPTY, "`version_copy()` - revision 0 is the empty tree");
        assert_eq!(
            t,
            self.roots.current(),
            "`version_copy()` - only the revision being written can change"
        );

        let parent = self.parent_at(old, t);
        let sibling = self.nodes.get(old).new_sibling();
        let new = self.nodes.alloc(sibling);

        if self.nodes.get(old).is_internal() {
            let copies = self.nodes.get_mut(old).as_internal_mut().retire_at(t);
            for copy in copies {
                let child = copy.payload();
                self.forget_parent_if_unlinked(old, child);
                self.push_child(new, copy);
            }
        } else {
            let copies = self.nodes.get_mut(old).as_external_mut().retire_at(t);
            self.nodes.get_mut(new).as_external_mut().add_all(copies);
        }

        match parent {
            Some(parent) => self.replace_edge(parent, old, new, t),
            None => self.roots.set(t, Some(new)),
        }

        self.stats.version_copies += 1;
        trace!(
            target: "temporal_btree::version_copy",
            revision = %t,
            ?old,
            ?new,
            ?parent,
            live = self.nodes.get(new).live_len(t),
            "version copy"
        );
        new
    }

    /// Points the routing element `parent -> old` live at `t` to `new`.
    fn replace_edge(&mut self, parent: NodeHandle<K, V>, old: NodeHandle<K, V>, new: NodeHandle<K, V>, t: Revision) {
        let internal = self.nodes.get_mut(parent).as_internal_mut();
        let index = internal
            .find_routing_element_to(old, t)
            .expect("`replace_edge()` - parent has no live edge to the copied node");
        let element = internal.routing_element_mut(index);

        if element.birth() == t {
            // Nobody has seen this edge yet; re-target it.
            element.set_payload(t, new);
        } else {
            let replacement = MortalElement::new(element.key().clone(), new, t);
            element.kill(t);
            internal.insert(index + 1, replacement);
        }

        self.forget_parent_if_unlinked(parent, old);
        self.nodes.get_mut(new).add_parent(parent);
    }
}
