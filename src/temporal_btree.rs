use core::borrow::Borrow;
use core::fmt;

use crate::config::TreeConfig;
use crate::error::Result;
use crate::raw::RawTemporalTree;
use crate::{Revision, TreeStats};

mod snapshot;

pub use snapshot::{Iter, Snapshot};

/// A partially persistent ordered map based on a multi-version [B-Tree].
///
/// Every successful [`insert`](TemporalBTree::insert) or
/// [`delete`](TemporalBTree::delete) publishes a new [`Revision`]. All earlier
/// revisions stay readable forever: [`lookup`](TemporalBTree::lookup) and
/// [`snapshot`](TemporalBTree::snapshot) answer queries against any of them,
/// while only the latest revision can be modified.
///
/// Revision 0 is the empty tree. The `n`-th successful write creates revision
/// `n`, so revisions are dense and increase by one per write.
///
/// Values are stored once and shared between revisions; history is never
/// garbage collected. Use [`TreeConfig::with_max_nodes`] to bound the memory
/// a tree may grow to.
///
/// [B-Tree]: https://en.wikipedia.org/wiki/B-tree
///
/// # Examples
///
/// ```
/// use temporal_btree::{Revision, TemporalBTree};
///
/// let mut prices = TemporalBTree::new();
///
/// let r1 = prices.insert("apple", 3).unwrap();
/// let r2 = prices.insert("pear", 5).unwrap();
/// let r3 = prices.insert("apple", 4).unwrap();
/// let r4 = prices.delete("pear").unwrap();
///
/// assert_eq!(prices.lookup("apple", r1), Some(&3));
/// assert_eq!(prices.lookup("apple", r3), Some(&4));
/// assert_eq!(prices.lookup("pear", r2), Some(&5));
/// assert_eq!(prices.lookup("pear", r4), None);
/// assert_eq!(prices.lookup("apple", Revision::EMPTY), None);
///
/// // Iterate the tree as it was at any revision.
/// let then: Vec<_> = prices.snapshot(r2).unwrap().iter().collect();
/// assert_eq!(then, [(&"apple", &3), (&"pear", &5)]);
/// ```
pub struct TemporalBTree<K, V> {
    raw: RawTemporalTree<K, V>,
}

impl<K, V> TemporalBTree<K, V> {
    /// Makes a new, empty `TemporalBTree` with the default [`TreeConfig`].
    ///
    /// # Examples
    ///
    /// ```
    /// use temporal_btree::{Revision, TemporalBTree};
    ///
    /// let tree: TemporalBTree<u32, &str> = TemporalBTree::new();
    /// assert_eq!(tree.current_revision(), Revision::EMPTY);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self {
            raw: RawTemporalTree::new(TreeConfig::new()),
        }
    }

    /// Makes a new, empty `TemporalBTree` with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::InvalidConfig`](crate::TreeError::InvalidConfig)
    /// if `config` fails [`TreeConfig::validate`].
    ///
    /// # Examples
    ///
    /// ```
    /// use temporal_btree::{TemporalBTree, TreeConfig, TreeError};
    ///
    /// let tree: Result<TemporalBTree<u32, u32>, _> = TemporalBTree::with_config(TreeConfig::new().with_order(2));
    /// assert!(matches!(tree, Err(TreeError::InvalidConfig(_))));
    /// ```
    pub fn with_config(config: TreeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            raw: RawTemporalTree::new(config),
        })
    }

    /// Returns the configuration the tree was created with.
    pub fn config(&self) -> &TreeConfig {
        self.raw.config()
    }

    /// Returns the latest published revision.
    pub fn current_revision(&self) -> Revision {
        self.raw.current_revision()
    }

    /// Returns counters for the structural work performed so far.
    ///
    /// # Examples
    ///
    /// ```
    /// use temporal_btree::{TemporalBTree, TreeConfig};
    ///
    /// let mut tree = TemporalBTree::with_config(TreeConfig::new().with_order(6)).unwrap();
    /// for key in 0..7 {
    ///     tree.insert(key, ()).unwrap();
    /// }
    /// assert_eq!(tree.stats().leaf_splits, 1);
    /// ```
    pub fn stats(&self) -> TreeStats {
        self.raw.stats()
    }

    /// Returns the number of nodes allocated over the whole history.
    pub fn node_count(&self) -> usize {
        self.raw.node_count()
    }

    /// Returns the number of values stored over the whole history.
    pub fn value_count(&self) -> usize {
        self.raw.value_count()
    }

    /// Returns a read-only view of the tree at revision `t`, or `None` if
    /// `t` has not been published.
    ///
    /// # Examples
    ///
    /// ```
    /// use temporal_btree::{Revision, TemporalBTree};
    ///
    /// let mut tree = TemporalBTree::new();
    /// tree.insert(1, "a").unwrap();
    /// tree.insert(2, "b").unwrap();
    ///
    /// let snapshot = tree.snapshot(Revision(1)).unwrap();
    /// assert_eq!(snapshot.len(), 1);
    /// assert!(tree.snapshot(Revision(3)).is_none());
    /// ```
    pub fn snapshot(&self, t: Revision) -> Option<Snapshot<'_, K, V>> {
        self.raw.contains_revision(t).then(|| Snapshot::new(&self.raw, t))
    }

    /// Returns a read-only view of the latest revision.
    pub fn latest(&self) -> Snapshot<'_, K, V> {
        Snapshot::new(&self.raw, self.raw.current_revision())
    }
}

impl<K: Ord + Clone, V> TemporalBTree<K, V> {
    /// Inserts a key-value pair as a new revision and returns that revision.
    ///
    /// If the key is live in the latest revision its old value stays visible
    /// in every earlier revision and is replaced from the new one on.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::CapacityExhausted`](crate::TreeError::CapacityExhausted)
    /// when the write might not fit in the remaining node or value budget. The
    /// tree is left exactly as it was and no revision is published.
    ///
    /// # Complexity
    ///
    /// O(ORDER · log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use temporal_btree::{Revision, TemporalBTree};
    ///
    /// let mut tree = TemporalBTree::new();
    /// assert_eq!(tree.insert(37, "a"), Ok(Revision(1)));
    /// assert_eq!(tree.insert(37, "b"), Ok(Revision(2)));
    /// assert_eq!(tree.get(&37), Some(&"b"));
    /// assert_eq!(tree.lookup(&37, Revision(1)), Some(&"a"));
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Result<Revision> {
        self.raw.insert(key, value)
    }

    /// Deletes a key as a new revision and returns that revision.
    ///
    /// The key remains visible in every revision before the returned one.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::KeyNotFound`](crate::TreeError::KeyNotFound) if
    /// the key is not live in the latest revision, and
    /// [`TreeError::CapacityExhausted`](crate::TreeError::CapacityExhausted)
    /// when the restructuring might not fit. In both cases no revision is
    /// published.
    ///
    /// # Complexity
    ///
    /// O(ORDER · log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use temporal_btree::{Revision, TemporalBTree, TreeError};
    ///
    /// let mut tree = TemporalBTree::new();
    /// tree.insert(1, "a").unwrap();
    /// assert_eq!(tree.delete(&1), Ok(Revision(2)));
    /// assert_eq!(tree.delete(&1), Err(TreeError::KeyNotFound { revision: Revision(2) }));
    /// assert_eq!(tree.lookup(&1, Revision(1)), Some(&"a"));
    /// ```
    pub fn delete<Q>(&mut self, key: &Q) -> Result<Revision>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.delete(key)
    }

    /// Returns the value `key` had at revision `t`.
    ///
    /// Returns `None` when the key was absent at `t` or when `t` has not been
    /// published yet.
    ///
    /// # Complexity
    ///
    /// O(ORDER · log n)
    pub fn lookup<Q>(&self, key: &Q, t: Revision) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.lookup(key, t)
    }

    /// Returns the value of `key` in the latest revision.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.lookup(key, self.raw.current_revision())
    }

    /// Returns `true` if `key` is live in the latest revision.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.get(key).is_some()
    }

    /// Returns `true` if `key` was live at revision `t`.
    pub fn contains_key_at<Q>(&self, key: &Q, t: Revision) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.lookup(key, t).is_some()
    }
}

impl<K, V> Default for TemporalBTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for TemporalBTree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemporalBTree")
            .field("revision", &self.current_revision())
            .field("latest", &self.latest())
            .finish()
    }
}
