//! Infrastructure layer for external integrations.
//!
//! This layer implements the storage contract defined by the domain layer.
//!
//! # Modules
//!
//! - [`persistence`] - In-memory, file-snapshot and PostgreSQL link repositories

pub mod persistence;
