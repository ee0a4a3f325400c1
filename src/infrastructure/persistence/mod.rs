//! Link repository implementations.
//!
//! # Repositories
//!
//! - [`MemoryLinkRepository`] - Process-local maps, optionally persisted to a JSON-lines file
//! - [`PgLinkRepository`] - PostgreSQL storage with a partial unique index on active long URLs

pub mod memory_link_repository;
pub mod pg_link_repository;
pub mod snapshot;

pub use memory_link_repository::MemoryLinkRepository;
pub use pg_link_repository::PgLinkRepository;
