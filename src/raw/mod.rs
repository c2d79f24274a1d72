mod arena;
mod element;
mod handle;
mod node;
mod raw_temporal_tree;
mod rebalance;
mod restructure;
mod roots;
mod version_copy;

pub(crate) use raw_temporal_tree::{RawIter, RawTemporalTree};
