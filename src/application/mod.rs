//! Application layer services implementing business logic.
//!
//! Services coordinate the token generator, the storage backend and the
//! deletion pipeline, and give HTTP handlers and the admin CLI one API to call.
//!
//! # Available Services
//!
//! - [`services::link_service::LinkService`] - Shorten, resolve, list and delete links

pub mod services;
