//! A partially persistent B-tree for Rust.
//!
//! This crate provides [`TemporalBTree`], an ordered map in which every write
//! publishes a new [`Revision`] and every earlier revision stays queryable:
//!
//! - [`insert`](TemporalBTree::insert) / [`delete`](TemporalBTree::delete) - Modify the latest revision
//! - [`lookup`](TemporalBTree::lookup) - Read a key as it was at any revision
//! - [`snapshot`](TemporalBTree::snapshot) - Iterate the whole map as it was at any revision
//!
//! # Example
//!
//! ```
//! use temporal_btree::{Revision, TemporalBTree};
//!
//! let mut inventory = TemporalBTree::new();
//! let r1 = inventory.insert("bolts", 120).unwrap();
//! let r2 = inventory.insert("nuts", 80).unwrap();
//! let r3 = inventory.delete("bolts").unwrap();
//!
//! assert_eq!(inventory.lookup("bolts", r1), Some(&120));
//! assert_eq!(inventory.lookup("bolts", r3), None);
//! assert_eq!(inventory.snapshot(r2).unwrap().len(), 2);
//! assert_eq!(inventory.lookup("nuts", Revision(99)), None);
//! ```
//!
//! # Implementation
//!
//! Every element carries a `[birth, death)` lifespan. Writes never overwrite
//! anything another revision can see: a node that needs to change at
//! revision `t` is version-copied, its live elements re-born at `t` in a
//! fresh node, and the old node is retired in place. A root table maps
//! every revision to its root, so a query at `t` descends only through
//! elements alive at `t`.
//!
//! Nodes hold at most [`ORDER`] live elements (configurable through
//! [`TreeConfig`]); non-root nodes hold at least 3/8 of that. Splits,
//! merges and root collapses keep these bounds at every revision, so each
//! historical query costs O(ORDER · log n).

// These forbid rules and lint groups are meant to be very restrictive.
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod config;
mod error;
mod raw;
mod revision;
mod stats;

pub mod temporal_btree;

pub use config::{MIN_ORDER, ORDER, TreeConfig};
pub use error::{Result, TreeError};
pub use revision::Revision;
pub use stats::TreeStats;
pub use temporal_btree::{Snapshot, TemporalBTree};
