use core::borrow::Borrow;

use smallvec::SmallVec;

use super::element::MortalElement;
use super::handle::Handle;
use crate::Revision;

pub(crate) type NodeHandle<K, V> = Handle<Node<K, V>>;
pub(crate) type ValueHandle<V> = Handle<V>;

/// Routing elements of an internal node: key plus child handle.
pub(crate) type InternalNode<K, V> = Entries<K, NodeHandle<K, V>>;
/// Data elements of an external node: key plus value handle.
pub(crate) type ExternalNode<K, V> = Entries<K, ValueHandle<V>>;

/// A tree node. Its identity (the arena handle) never changes; a node is
/// retired by killing its elements and superseded by a fresh copy.
pub(crate) struct Node<K, V> {
    body: Body<K, V>,
    // Every internal node that has ever routed to this node. Which one (if
    // any) is the parent at revision `t` is decided by the routing elements.
    parents: SmallVec<[NodeHandle<K, V>; 2]>,
}

#[allow(clippy::large_enum_variant)]
pub(crate) enum Body<K, V> {
    Internal(InternalNode<K, V>),
    External(ExternalNode<K, V>),
}

/// The live neighbors of a node under its parent at some revision.
#[derive(Debug)]
pub(crate) struct Siblings<K, V> {
    pub(crate) left: Option<NodeHandle<K, V>>,
    pub(crate) right: Option<NodeHandle<K, V>>,
}

impl<K, V> Node<K, V> {
    /// Creates a new internal node with no routing elements.
    pub(crate) fn new_internal() -> Self {
        Self::from_body(Body::Internal(Entries::new()))
    }

    /// Creates a new external node with no elements.
    pub(crate) fn new_external() -> Self {
        Self::from_body(Body::External(Entries::new()))
    }

    /// Creates an empty node of the same variant as `self`.
    pub(crate) fn new_sibling(&self) -> Self {
        match self.body {
            Body::Internal(_) => Self::new_internal(),
            Body::External(_) => Self::new_external(),
        }
    }

    fn from_body(body: Body<K, V>) -> Self {
        Self {
            body,
            parents: SmallVec::new(),
        }
    }

    pub(crate) fn body(&self) -> &Body<K, V> {
        &self.body
    }

    pub(crate) fn is_internal(&self) -> bool {
        matches!(self.body, Body::Internal(_))
    }

    #[cfg(test)]
    pub(crate) fn is_external(&self) -> bool {
        matches!(self.body, Body::External(_))
    }

    /// Returns the internal node, panicking if this is external.
    pub(crate) fn as_internal(&self) -> &InternalNode<K, V> {
        match &self.body {
            Body::Internal(internal) => internal,
            Body::External(_) => panic!("expected internal node"),
        }
    }

    /// Returns the internal node mutably, panicking if this is external.
    pub(crate) fn as_internal_mut(&mut self) -> &mut InternalNode<K, V> {
        match &mut self.body {
            Body::Internal(internal) => internal,
            Body::External(_) => panic!("expected internal node"),
        }
    }

    /// Returns the external node, panicking if this is internal.
    pub(crate) fn as_external(&self) -> &ExternalNode<K, V> {
        match &self.body {
            Body::External(external) => external,
            Body::Internal(_) => panic!("expected external node"),
        }
    }

    /// Returns the external node mutably, panicking if this is internal.
    pub(crate) fn as_external_mut(&mut self) -> &mut ExternalNode<K, V> {
        match &mut self.body {
            Body::External(external) => external,
            Body::Internal(_) => panic!("expected external node"),
        }
    }

    /// Number of elements alive at `t`.
    pub(crate) fn live_len(&self, t: Revision) -> usize {
        match &self.body {
            Body::Internal(internal) => internal.live_len(t),
            Body::External(external) => external.live_len(t),
        }
    }

    /// True if every stored element was born at `t`, i.e. no earlier
    /// revision can observe this node's contents.
    pub(crate) fn is_fresh_at(&self, t: Revision) -> bool {
        match &self.body {
            Body::Internal(internal) => internal.is_fresh_at(t),
            Body::External(external) => external.is_fresh_at(t),
        }
    }

    /// Key of the first element alive at `t`.
    pub(crate) fn first_live_key(&self, t: Revision) -> Option<&K> {
        match &self.body {
            Body::Internal(internal) => internal.first_live_key(t),
            Body::External(external) => external.first_live_key(t),
        }
    }

    pub(crate) fn parents(&self) -> &[NodeHandle<K, V>] {
        &self.parents
    }

    pub(crate) fn add_parent(&mut self, parent: NodeHandle<K, V>) {
        if !self.parents.contains(&parent) {
            self.parents.push(parent);
        }
    }

    pub(crate) fn remove_parent(&mut self, parent: NodeHandle<K, V>) {
        self.parents.retain(|p| *p != parent);
    }
}

/// Elements of one node, in routing order.
///
/// External nodes keep their elements sorted by key. Internal nodes keep
/// them in positional order: dead routing elements stay where they were and
/// a replacement is placed right after the element it replaces.
pub(crate) struct Entries<K, P> {
    items: Vec<MortalElement<K, P>>,
}

impl<K, P: Copy> Entries<K, P> {
    pub(crate) const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Every stored element, dead or alive.
    pub(crate) fn elements(&self) -> &[MortalElement<K, P>] {
        &self.items
    }

    /// Elements alive at `t`, in order.
    pub(crate) fn elements_at(&self, t: Revision) -> impl Iterator<Item = &MortalElement<K, P>> {
        self.items.iter().filter(move |e| e.is_alive_at(t))
    }

    pub(crate) fn live_len(&self, t: Revision) -> usize {
        self.elements_at(t).count()
    }

    pub(crate) fn is_fresh_at(&self, t: Revision) -> bool {
        self.items.iter().all(|e| e.birth() == t)
    }

    pub(crate) fn first_live_key(&self, t: Revision) -> Option<&K> {
        self.elements_at(t).next().map(MortalElement::key)
    }

    pub(crate) fn kill(&mut self, index: usize, t: Revision) {
        self.items[index].kill(t);
    }

    /// `indices` must be sorted ascending.
    pub(crate) fn remove_elements(&mut self, indices: &[usize]) {
        debug_assert!(indices.is_sorted(), "`Entries::remove_elements()` - indices must be sorted");
        for &index in indices.iter().rev() {
            self.items.remove(index);
        }
    }

    /// Freezes this node's content as of `t` and returns fresh copies of
    /// every element alive at `t`.
    ///
    /// Elements born before `t` are killed at `t`; elements born at `t` were
    /// never visible to anyone else and are dropped.
    pub(crate) fn retire_at(&mut self, t: Revision) -> Vec<MortalElement<K, P>>
    where
        K: Clone,
    {
        let mut survivors = Vec::with_capacity(self.items.len());
        let mut unpublished: SmallVec<[usize; 4]> = SmallVec::new();

        for (index, element) in self.items.iter_mut().enumerate() {
            if element.birth() == t {
                unpublished.push(index);
                if element.is_alive_at(t) {
                    survivors.push(element.reborn(t));
                }
            } else if element.is_alive_at(t) {
                survivors.push(element.reborn(t));
                element.kill(t);
            }
        }

        self.remove_elements(&unpublished);
        survivors
    }

    pub(crate) fn add_all(&mut self, elements: Vec<MortalElement<K, P>>) {
        self.items.extend(elements);
    }

    /// Detaches every element, leaving the node empty.
    pub(crate) fn drop_all(&mut self) -> Vec<MortalElement<K, P>> {
        core::mem::take(&mut self.items)
    }

    /// Detaches the upper half of the elements (the larger half when the
    /// count is odd).
    pub(crate) fn drop_upper_half(&mut self) -> Vec<MortalElement<K, P>> {
        self.items.split_off(self.items.len() / 2)
    }
}

impl<K: Ord, V> Entries<K, ValueHandle<V>> {
    /// Adds an element at its key position, after any equal keys.
    pub(crate) fn add(&mut self, element: MortalElement<K, ValueHandle<V>>) {
        let index = self.items.partition_point(|e| e.key() <= element.key());
        self.items.insert(index, element);
    }

    /// Index of the element with `key` alive at `t`.
    pub(crate) fn position_at<Q>(&self, key: &Q, t: Revision) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let start = self.items.partition_point(|e| e.key().borrow() < key);
        self.items[start..]
            .iter()
            .take_while(|e| e.key().borrow() == key)
            .position(|e| e.is_alive_at(t))
            .map(|offset| start + offset)
    }

    pub(crate) fn element(&self, index: usize) -> &MortalElement<K, ValueHandle<V>> {
        &self.items[index]
    }
}

impl<K, V> Entries<K, NodeHandle<K, V>> {
    /// Chooses the child whose key range contains `key` among the routing
    /// elements alive at `t`. The first live key is never consulted: the
    /// leftmost child also receives every key below the second routing key.
    pub(crate) fn route<Q>(&self, key: &Q, t: Revision) -> Option<NodeHandle<K, V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut live = self.elements_at(t);
        let mut chosen = live.next()?.payload();
        for element in live {
            if element.key().borrow() > key {
                break;
            }
            chosen = element.payload();
        }
        Some(chosen)
    }

    /// Children alive at `t`, in key order.
    pub(crate) fn children_at(&self, t: Revision) -> impl Iterator<Item = NodeHandle<K, V>> {
        self.elements_at(t).map(MortalElement::payload)
    }

    /// Index of the routing element to `child` alive at `t`.
    pub(crate) fn find_routing_element_to(&self, child: NodeHandle<K, V>, t: Revision) -> Option<usize> {
        self.items.iter().position(|e| e.payload() == child && e.is_alive_at(t))
    }

    /// True if any routing element, dead or alive, leads to `child`.
    pub(crate) fn has_edge_to(&self, child: NodeHandle<K, V>) -> bool {
        self.items.iter().any(|e| e.payload() == child)
    }

    pub(crate) fn routing_element_mut(&mut self, index: usize) -> &mut MortalElement<K, NodeHandle<K, V>> {
        &mut self.items[index]
    }

    pub(crate) fn insert(&mut self, index: usize, element: MortalElement<K, NodeHandle<K, V>>) {
        self.items.insert(index, element);
    }

    /// Ends the live edge to `child` at `t`: an edge born at `t` is removed
    /// outright, an older one is killed. Returns `false` if no edge was live.
    pub(crate) fn remove_edge_to(&mut self, child: NodeHandle<K, V>, t: Revision) -> bool {
        let Some(index) = self.find_routing_element_to(child, t) else {
            return false;
        };
        if self.items[index].birth() == t {
            self.items.remove(index);
        } else {
            self.items[index].kill(t);
        }
        true
    }

    /// The live children immediately left and right of `child` at `t`.
    pub(crate) fn neighbors_of(&self, child: NodeHandle<K, V>, t: Revision) -> Option<Siblings<K, V>> {
        let children: SmallVec<[NodeHandle<K, V>; 16]> = self.children_at(t).collect();
        let index = children.iter().position(|c| *c == child)?;
        Some(Siblings {
            left: index.checked_sub(1).map(|i| children[i]),
            right: children.get(index + 1).copied(),
        })
    }
}
