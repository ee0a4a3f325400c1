//! HTTP middleware and extractors.
//!
//! - [`owner`] - Caller identity from the `X-User-Id` header
//! - [`tracing`] - Structured request/response logging

pub mod owner;
pub mod tracing;

pub use owner::Owner;
