use thiserror::Error;

use crate::Revision;

/// Result alias used by every fallible tree operation.
pub type Result<T> = core::result::Result<T, TreeError>;

/// Recoverable errors reported by [`TemporalBTree`](crate::TemporalBTree).
///
/// Broken internal invariants are not represented here: they panic.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum TreeError {
    /// The key is not live at the latest revision.
    #[error("key not found at revision {revision}")]
    KeyNotFound {
        /// The latest revision at the time of the request.
        revision: Revision,
    },
    /// A write would need more arena slots than remain.
    ///
    /// Nothing was modified and no revision was allocated.
    #[error("{resource} capacity exhausted: write needs up to {required} slots, {available} remain")]
    CapacityExhausted {
        /// Which arena ran out (`"node"` or `"value"`).
        resource: &'static str,
        /// Worst-case slots the write needed.
        required: usize,
        /// Slots left under the configured limit.
        available: usize,
    },
    /// The supplied [`TreeConfig`](crate::TreeConfig) is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
