//! Testing utilities for the roadmap engine workspace
//!
//! Scripted oracle, fault-injecting store and JSON fixtures.

#![allow(missing_docs)]

pub mod fixtures;
pub mod oracle;
pub mod store;

pub use fixtures::{missing_nodes_json, roadmap_json, store_with, three_node_json};
pub use oracle::ScriptedOracle;
pub use store::FailingStore;
