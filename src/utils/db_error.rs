//! Helpers for classifying database errors.

/// Primary key constraint on `links.short_token`.
pub const TOKEN_CONSTRAINT: &str = "links_pkey";

/// Partial unique index on `links.long_url` over non-deleted rows.
pub const LONG_URL_CONSTRAINT: &str = "links_long_url_active_idx";

/// Returns true if `e` is a unique violation raised by `constraint`.
pub fn is_unique_violation_on(e: &sqlx::Error, constraint: &str) -> bool {
    let Some(db_err) = e.as_database_error() else {
        return false;
    };

    if !db_err.is_unique_violation() {
        return false;
    }

    db_err.constraint() == Some(constraint)
}
