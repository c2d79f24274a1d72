/// Counters for the structural work done by writes since the tree was created.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct TreeStats {
    /// Number of nodes superseded by a version copy
    pub version_copies: u64,
    /// Number of external node splits
    pub leaf_splits: u64,
    /// Number of internal node splits
    pub internal_splits: u64,
    /// Number of external node merges
    pub leaf_merges: u64,
    /// Number of internal node merges
    pub internal_merges: u64,
    /// Number of times an internal root with a single child was removed
    pub root_collapses: u64,
    /// Number of inserts that replaced a live value
    pub replaced_values: u64,
}

impl TreeStats {
    /// Total number of splits of either variant.
    #[must_use]
    pub const fn splits(&self) -> u64 {
        self.leaf_splits + self.internal_splits
    }

    /// Total number of merges of either variant.
    #[must_use]
    pub const fn merges(&self) -> u64 {
        self.leaf_merges + self.internal_merges
    }
}
