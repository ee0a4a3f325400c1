//! Domain layer containing the link model, the storage contract and the
//! deletion pipeline.
//!
//! # Architecture
//!
//! - [`entities`] - Core data structures
//! - [`repositories`] - Storage trait implemented by every backend
//! - [`deletion_pipeline`] - Background batching of soft-delete requests
//!
//! # Deletion Flow
//!
//! 1. A caller asks the Link Service to delete some tokens
//! 2. Each token is paired with the caller's owner id and sent to a bounded channel
//! 3. [`deletion_pipeline::DeletionPipeline`] buffers the requests and flushes them
//!    on a size threshold, a timer, or shutdown
//! 4. [`repositories::LinkRepository::batch_delete`] tombstones the matching rows

pub mod deletion_pipeline;
pub mod entities;
pub mod repositories;
