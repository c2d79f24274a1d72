use super::node::NodeHandle;
use crate::Revision;

/// Revision-indexed root references. `roots[t]` is the root at revision `t`;
/// revision 0 is the empty tree.
pub(crate) struct RootTable<K, V> {
    roots: Vec<Option<NodeHandle<K, V>>>,
}

impl<K, V> RootTable<K, V> {
    pub(crate) fn new() -> Self {
        Self { roots: vec![None] }
    }

    /// The latest recorded revision.
    pub(crate) fn current(&self) -> Revision {
        Revision(self.roots.len() as u64 - 1)
    }

    /// Root at `t`, or `None` for an empty tree or an unrecorded revision.
    pub(crate) fn get(&self, t: Revision) -> Option<NodeHandle<K, V>> {
        t.to_index().and_then(|index| self.roots.get(index)).copied().flatten()
    }

    pub(crate) fn contains(&self, t: Revision) -> bool {
        t <= self.current()
    }

    /// Opens revision `T + 1` as an alias of revision `T` and returns it.
    pub(crate) fn begin(&mut self) -> Revision {
        let t = self.current().next();
        let previous = self.roots[self.roots.len() - 1];
        self.roots.push(previous);
        t
    }

    /// Records the root for the revision being written.
    pub(crate) fn set(&mut self, t: Revision, root: Option<NodeHandle<K, V>>) {
        assert_eq!(t, self.current(), "`RootTable::set()` - only the revision being written can change");
        let last = self.roots.len() - 1;
        self.roots[last] = root;
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::raw::handle::Handle;

    #[test]
    fn begin_aliases_previous_root() {
        let mut roots: RootTable<i32, i32> = RootTable::new();
        assert_eq!(roots.current(), Revision::EMPTY);
        assert_eq!(roots.get(Revision::EMPTY), None);

        let t = roots.begin();
        assert_eq!(t, Revision(1));
        roots.set(t, Some(Handle::from_index(0)));

        let t = roots.begin();
        assert_eq!(roots.get(t), Some(Handle::from_index(0)));
        roots.set(t, Some(Handle::from_index(3)));
        assert_eq!(roots.get(Revision(1)), Some(Handle::from_index(0)));
        assert_eq!(roots.get(Revision(2)), Some(Handle::from_index(3)));
        assert_eq!(roots.get(Revision(3)), None);
        assert_eq!(roots.get(Revision(u64::MAX)), None);
        assert_eq!(roots.get(Revision((1 << 32) + 1)), None);
        assert!(roots.contains(Revision(2)));
        assert!(!roots.contains(Revision(3)));
    }

    #[test]
    #[should_panic(expected = "`RootTable::set()`")]
    fn published_roots_are_frozen() {
        let mut roots: RootTable<i32, i32> = RootTable::new();
        roots.begin();
        roots.begin();
        roots.set(Revision(1), None);
    }
}
