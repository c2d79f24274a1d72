use crate::error::{Result, TreeError};

/// Default fanout of every node.
pub const ORDER: usize = 128;

/// Smallest fanout for which the split and merge thresholds stay consistent
/// and every non-root internal node keeps at least two children.
pub const MIN_ORDER: usize = 6;

/// Upper bound on arena slots, shared by nodes and values.
pub(crate) const ARENA_LIMIT: usize = u32::MAX as usize - 1;

/// Tuning knobs for a [`TemporalBTree`](crate::TemporalBTree).
///
/// # Examples
///
/// ```
/// use temporal_btree::{TemporalBTree, TreeConfig};
///
/// let config = TreeConfig::new().with_order(16).with_max_nodes(10_000);
/// let tree: TemporalBTree<u32, u32> = TemporalBTree::with_config(config).unwrap();
/// assert_eq!(tree.config().order, 16);
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TreeConfig {
    /// Maximum number of live elements per node.
    pub order: usize,
    /// Maximum number of nodes the tree may ever allocate. History is never
    /// reclaimed, so this bounds total memory across all revisions.
    pub max_nodes: usize,
}

impl TreeConfig {
    /// Returns the default configuration.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            order: ORDER,
            max_nodes: ARENA_LIMIT,
        }
    }

    /// Sets the node fanout.
    #[must_use]
    pub const fn with_order(mut self, order: usize) -> Self {
        self.order = order;
        self
    }

    /// Sets the node allocation limit.
    #[must_use]
    pub const fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    /// Checks that the configuration can drive a tree.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::InvalidConfig`] when `order` is below
    /// [`MIN_ORDER`] or `max_nodes` is zero or beyond the arena limit.
    pub fn validate(&self) -> Result<()> {
        if self.order < MIN_ORDER {
            return Err(TreeError::InvalidConfig(format!(
                "order must be at least {MIN_ORDER}, got {}",
                self.order
            )));
        }
        if self.max_nodes == 0 || self.max_nodes > ARENA_LIMIT {
            return Err(TreeError::InvalidConfig(format!(
                "max_nodes must be within 1..={ARENA_LIMIT}, got {}",
                self.max_nodes
            )));
        }
        Ok(())
    }

    pub(crate) const fn fanout(&self) -> Fanout {
        Fanout::new(self.order)
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Fanout thresholds derived from the order.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Fanout {
    /// A node holding more live elements than this is overflowing.
    pub(crate) order: usize,
    /// A non-root node below this merges with a sibling (3/8 of the order).
    pub(crate) min_live: usize,
    /// A merged node at or above this is re-split (3/4 of the order).
    pub(crate) resplit: usize,
    /// Largest live count a split accepts (11/8 of the order).
    pub(crate) split_max: usize,
    /// An internal node storing more routing elements than this, dead ones
    /// included, is version-copied to shed them.
    pub(crate) compact_len: usize,
}

impl Fanout {
    pub(crate) const fn new(order: usize) -> Self {
        Self {
            order,
            min_live: order * 3 / 8,
            resplit: order * 3 / 4,
            split_max: order * 11 / 8,
            compact_len: order * 2,
        }
    }

    #[inline]
    pub(crate) const fn is_overflowing(&self, live: usize) -> bool {
        live > self.order
    }

    #[inline]
    pub(crate) const fn is_underflowing(&self, live: usize) -> bool {
        live < self.min_live
    }

    #[inline]
    pub(crate) const fn can_split(&self, live: usize) -> bool {
        self.resplit <= live && live <= self.split_max
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn default_thresholds() {
        let fanout = TreeConfig::default().fanout();
        assert_eq!(fanout.order, 128);
        assert_eq!(fanout.min_live, 48);
        assert_eq!(fanout.resplit, 96);
        assert_eq!(fanout.split_max, 176);
        assert_eq!(fanout.compact_len, 256);
    }

    #[test]
    fn rejects_tiny_order() {
        let err = TreeConfig::new().with_order(MIN_ORDER - 1).validate().unwrap_err();
        assert!(matches!(err, TreeError::InvalidConfig(_)));
        assert!(TreeConfig::new().with_order(4).validate().is_err());
        assert!(TreeConfig::new().with_max_nodes(0).validate().is_err());
        assert!(TreeConfig::new().with_order(MIN_ORDER).validate().is_ok());
    }

    // Every split and merge the driver can request must land inside the split
    // range and leave both halves at or above the merge trigger. A non-root
    // node must always have a sibling to merge with.
    #[test]
    fn thresholds_are_consistent() {
        for order in MIN_ORDER..=512 {
            let fanout = Fanout::new(order);
            assert!(fanout.min_live >= 2, "order {order}");
            assert!(fanout.can_split(order + 1), "order {order}");
            assert!((order + 1) / 2 >= fanout.min_live, "order {order}");
            let largest_merge = fanout.min_live - 1 + order;
            assert!(fanout.can_split(largest_merge), "order {order}");
            assert!(fanout.resplit / 2 >= fanout.min_live, "order {order}");
            assert!(2 * fanout.min_live - 1 >= fanout.min_live, "order {order}");
        }
    }

    #[test]
    fn smaller_orders_allow_lone_children() {
        assert_eq!(Fanout::new(MIN_ORDER - 1).min_live, 1);
        assert_eq!(Fanout::new(MIN_ORDER).min_live, 2);
    }
}
