//! Core domain entities for the link store.
//!
//! # Entity Types
//!
//! - [`LinkRecord`] - A stored short token → long URL mapping with its owner and tombstone
//! - [`NewLink`] - Input for creating a mapping
//! - [`DeletionRequest`] - A (token, owner) pair travelling through the deletion pipeline
//! - [`DeleteSummary`] - Outcome of one batched tombstone operation
//! - [`StorageStats`] - Aggregate counters reported by a backend

pub mod deletion;
pub mod link;

pub use deletion::{DeleteSummary, DeletionRequest};
pub use link::{LinkRecord, NewLink, StorageStats};
