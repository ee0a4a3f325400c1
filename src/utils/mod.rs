//! Utility functions shared across layers.
//!
//! - [`token_generator`] - Short token generation and short-URL composition
//! - [`url_validator`] - Long URL validation
//! - [`db_error`] - Database error classification

pub mod db_error;
pub mod token_generator;
pub mod url_validator;
