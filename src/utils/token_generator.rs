//! Short token generation and short-URL composition.
//!
//! Tokens are random but not cryptographically strong; uniqueness is enforced by
//! the storage backend, not here.

use rand::{Rng, distr::Alphanumeric};

/// Number of characters in a generated token.
pub const TOKEN_LENGTH: usize = 10;

/// Generates a random alphanumeric token of [`TOKEN_LENGTH`] characters.
///
/// # Examples
///
/// ```ignore
/// let token = generate_token();
/// assert_eq!(token.len(), 10);
/// assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
/// ```
pub fn generate_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Joins `base_url` and `token` with exactly one slash between them.
pub fn compose_short_url(base_url: &str, token: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), token)
}

/// Extracts the bare token from either a bare token or a full short URL.
///
/// Surrounding whitespace and a leading slash are ignored.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(extract_token("http://s.io/", "http://s.io/abc"), "abc");
/// assert_eq!(extract_token("http://s.io/", "abc"), "abc");
/// ```
pub fn extract_token<'a>(base_url: &str, input: &'a str) -> &'a str {
    let input = input.trim();
    let base = base_url.trim_end_matches('/');

    let rest = input
        .strip_prefix(base)
        .filter(|rest| rest.is_empty() || rest.starts_with('/'))
        .unwrap_or(input);

    rest.trim_start_matches('/')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_token_has_correct_length() {
        assert_eq!(generate_token().len(), TOKEN_LENGTH);
    }

    #[test]
    fn test_generate_token_alphanumeric() {
        let token = generate_token();
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_generate_token_produces_distinct_tokens() {
        let tokens: HashSet<String> = (0..1000).map(|_| generate_token()).collect();
        assert_eq!(tokens.len(), 1000);
    }

    #[test]
    fn test_compose_short_url_handles_trailing_slash() {
        assert_eq!(
            compose_short_url("http://localhost:8080/", "abc"),
            "http://localhost:8080/abc"
        );
        assert_eq!(
            compose_short_url("http://localhost:8080", "abc"),
            "http://localhost:8080/abc"
        );
    }

    #[test]
    fn test_generated_token_round_trips_through_short_url() {
        let token = generate_token();
        let short_url = compose_short_url("http://localhost:8080/", &token);

        assert_eq!(extract_token("http://localhost:8080", &short_url), token);
    }

    #[test]
    fn test_extract_token_from_short_url() {
        assert_eq!(
            extract_token("http://localhost:8080/", "http://localhost:8080/AbCdEfGhIj"),
            "AbCdEfGhIj"
        );
    }

    #[test]
    fn test_extract_token_from_bare_token() {
        assert_eq!(
            extract_token("http://localhost:8080/", " AbCdEfGhIj "),
            "AbCdEfGhIj"
        );
        assert_eq!(extract_token("http://localhost:8080/", "/AbCdEfGhIj"), "AbCdEfGhIj");
    }

    #[test]
    fn test_extract_token_ignores_other_hosts_sharing_prefix() {
        assert_eq!(
            extract_token("http://s.io", "http://s.iox/abc"),
            "http://s.iox/abc"
        );
    }
}
