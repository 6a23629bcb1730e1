//! Roadmap Store
//!
//! Persistence boundary of the roadmap engine. [`RoadmapStore`] is the document
//! store interface: filtered finds, optimistic updates, bulk writes, staged
//! transactions and group-and-count aggregation. [`MemoryStore`] implements it
//! in process with JSON snapshot load/save.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod error;
pub mod filter;
pub mod memory;
pub mod ops;
pub mod store;

pub use error::StoreError;
pub use filter::{FindOptions, GroupCount, GroupKey, RoadmapFilter, SortOrder};
pub use memory::{MemoryStore, Snapshot};
pub use ops::{Transaction, WriteOp, WriteReceipt};
pub use store::RoadmapStore;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
