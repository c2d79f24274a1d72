use core::borrow::Borrow;
use core::fmt;
use core::iter::FusedIterator;

use crate::raw::{RawIter, RawTemporalTree};
use crate::Revision;

/// A read-only view of a [`TemporalBTree`](crate::TemporalBTree) frozen at
/// one revision.
///
/// Published revisions never change, so a snapshot stays valid for as long
/// as it borrows the tree.
///
/// # Examples
///
/// ```
/// use temporal_btree::TemporalBTree;
///
/// let mut tree = TemporalBTree::new();
/// let before = tree.insert(1, "one").unwrap();
/// tree.insert(2, "two").unwrap();
///
/// let old = tree.snapshot(before).unwrap();
/// assert_eq!(old.get(&1), Some(&"one"));
/// assert!(!old.contains_key(&2));
/// assert_eq!(tree.latest().len(), 2);
/// ```
pub struct Snapshot<'a, K, V> {
    tree: &'a RawTemporalTree<K, V>,
    revision: Revision,
}

impl<'a, K, V> Snapshot<'a, K, V> {
    pub(crate) fn new(tree: &'a RawTemporalTree<K, V>, revision: Revision) -> Self {
        Self { tree, revision }
    }

    /// The revision this snapshot reads.
    pub fn revision(&self) -> Revision {
        self.revision
    }

    /// Returns the number of live entries.
    ///
    /// # Complexity
    ///
    /// O(n)
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Returns `true` if no entry is live.
    ///
    /// # Complexity
    ///
    /// O(ORDER)
    pub fn is_empty(&self) -> bool {
        self.tree.root_fanout_at(self.revision) == 0
    }

    /// Number of levels from the root to the leaves; 0 for the empty tree.
    pub fn depth(&self) -> usize {
        self.tree.depth_at(self.revision)
    }

    /// Number of live elements in the root node.
    pub fn root_fanout(&self) -> usize {
        self.tree.root_fanout_at(self.revision)
    }

    /// Gets an iterator over the live entries, sorted by key.
    ///
    /// # Examples
    ///
    /// ```
    /// use temporal_btree::TemporalBTree;
    ///
    /// let mut tree = TemporalBTree::new();
    /// tree.insert(3, "c").unwrap();
    /// tree.insert(1, "a").unwrap();
    /// tree.insert(2, "b").unwrap();
    ///
    /// let keys: Vec<_> = tree.latest().iter().map(|(k, _)| *k).collect();
    /// assert_eq!(keys, [1, 2, 3]);
    /// ```
    pub fn iter(&self) -> Iter<'a, K, V> {
        Iter {
            inner: self.tree.iter_at(self.revision),
        }
    }
}

impl<K: Ord + Clone, V> Snapshot<'_, K, V> {
    /// Returns the value of `key` at this snapshot's revision.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.tree.lookup(key, self.revision)
    }

    /// Returns `true` if `key` is live at this snapshot's revision.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.get(key).is_some()
    }
}

impl<K, V> Clone for Snapshot<'_, K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for Snapshot<'_, K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Snapshot<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K, V> IntoIterator for Snapshot<'a, K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V> IntoIterator for &Snapshot<'a, K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over the entries of a [`Snapshot`], sorted by key.
///
/// This `struct` is created by [`Snapshot::iter`].
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Iter<'a, K, V> {
    inner: RawIter<'a, K, V>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K, V> fmt::Debug for Iter<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use crate::{Revision, TemporalBTree, TreeConfig};
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_snapshot() {
        let tree: TemporalBTree<i32, i32> = TemporalBTree::new();
        let snapshot = tree.latest();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.len(), 0);
        assert_eq!(snapshot.depth(), 0);
        assert_eq!(snapshot.root_fanout(), 0);
        assert_eq!(snapshot.iter().next(), None);
        assert_eq!(format!("{snapshot:?}"), "{}");
    }

    #[test]
    fn snapshots_are_frozen() {
        let mut tree = TemporalBTree::with_config(TreeConfig::new().with_order(6)).unwrap();
        for key in 0..20 {
            tree.insert(key, key * 2).unwrap();
        }
        let frozen = tree.current_revision();
        for key in (0..20).step_by(2) {
            tree.delete(&key).unwrap();
        }

        let old = tree.snapshot(frozen).unwrap();
        assert_eq!(old.revision(), frozen);
        assert_eq!(old.len(), 20);
        assert!(old.depth() >= 2);
        assert_eq!(old.get(&4), Some(&8));

        let latest: Vec<i32> = tree.latest().into_iter().map(|(k, _)| *k).collect();
        assert_eq!(latest, (1..20).step_by(2).collect::<Vec<_>>());
        assert!(!tree.latest().contains_key(&4));
    }

    #[test]
    fn iterator_is_fused() {
        let mut tree = TemporalBTree::new();
        tree.insert(1, ()).unwrap();
        let mut iter = tree.latest().iter();
        assert!(iter.next().is_some());
        assert!(iter.next().is_none());
        assert!(iter.next().is_none());
    }

    #[test]
    fn root_fanout_tracks_the_root() {
        let mut tree = TemporalBTree::with_config(TreeConfig::new().with_order(6)).unwrap();
        for key in 0..6 {
            tree.insert(key, key).unwrap();
        }
        assert_eq!(tree.latest().root_fanout(), 6);
        tree.insert(6, 6).unwrap();
        assert_eq!(tree.latest().root_fanout(), 2);
        assert_eq!(tree.snapshot(Revision(6)).unwrap().root_fanout(), 6);
    }
}
