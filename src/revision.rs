use core::fmt;

/// A revision number identifying one immutable snapshot of a
/// [`TemporalBTree`](crate::TemporalBTree).
///
/// Revisions start at [`Revision::EMPTY`] (the empty tree) and advance by
/// exactly one per successful write.
///
/// # Examples
///
/// ```
/// use temporal_btree::{Revision, TemporalBTree};
///
/// let mut tree = TemporalBTree::new();
/// assert_eq!(tree.current_revision(), Revision::EMPTY);
///
/// let revision = tree.insert("a", 1).unwrap();
/// assert_eq!(revision, Revision(1));
/// assert_eq!(revision.prev(), Some(Revision::EMPTY));
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Revision(pub u64);

impl Revision {
    /// The revision of the empty tree, before any write.
    pub const EMPTY: Self = Self(0);

    /// Returns the raw revision number.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Returns the revision that follows this one.
    ///
    /// # Panics
    ///
    /// Panics if the revision counter would overflow.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        match self.0.checked_add(1) {
            Some(next) => Self(next),
            None => panic!("`Revision::next()` - revision counter overflow"),
        }
    }

    /// Returns the revision before this one, or `None` for [`Revision::EMPTY`].
    #[inline]
    #[must_use]
    pub const fn prev(self) -> Option<Self> {
        match self.0.checked_sub(1) {
            Some(prev) => Some(Self(prev)),
            None => None,
        }
    }

    /// Position of this revision in a revision-indexed table, or `None` if
    /// it does not fit in `usize` on this target.
    #[inline]
    pub(crate) fn to_index(self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

impl From<u64> for Revision {
    fn from(revision: u64) -> Self {
        Self(revision)
    }
}

impl From<Revision> for u64 {
    fn from(revision: Revision) -> Self {
        revision.0
    }
}
