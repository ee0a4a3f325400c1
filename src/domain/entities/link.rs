//! Link entity representing a shortened URL mapping.

/// A short token → long URL mapping owned by a caller.
///
/// `deleted` is a tombstone: once set it is never cleared, and the row is never
/// physically removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRecord {
    pub token: String,
    pub long_url: String,
    pub owner: String,
    pub deleted: bool,
}

impl LinkRecord {
    /// Creates an active (non-deleted) record.
    pub fn new(token: String, long_url: String, owner: String) -> Self {
        Self {
            token,
            long_url,
            owner,
            deleted: false,
        }
    }

    /// Returns true if `owner` may tombstone this record.
    ///
    /// Records created without an owner are never deletable by owner.
    pub fn is_owned_by(&self, owner: &str) -> bool {
        !self.owner.is_empty() && self.owner == owner
    }
}

/// Input data for creating a new link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLink {
    pub token: String,
    pub long_url: String,
    pub owner: String,
}

impl NewLink {
    pub fn new(
        token: impl Into<String>,
        long_url: impl Into<String>,
        owner: impl Into<String>,
    ) -> Self {
        Self {
            token: token.into(),
            long_url: long_url.into(),
            owner: owner.into(),
        }
    }
}

impl From<NewLink> for LinkRecord {
    fn from(link: NewLink) -> Self {
        LinkRecord::new(link.token, link.long_url, link.owner)
    }
}

/// Totals reported by a storage backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageStats {
    /// Number of stored mappings, tombstoned ones included.
    pub urls: i64,
    /// Number of distinct non-empty owners.
    pub users: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_is_active() {
        let record = LinkRecord::new(
            "abcdefghij".to_string(),
            "https://example.com".to_string(),
            "u1".to_string(),
        );

        assert!(!record.deleted);
        assert!(record.is_owned_by("u1"));
        assert!(!record.is_owned_by("u2"));
    }

    #[test]
    fn test_empty_owner_is_never_matched() {
        let record = LinkRecord::new(
            "abcdefghij".to_string(),
            "https://example.com".to_string(),
            String::new(),
        );

        assert!(!record.is_owned_by(""));
    }

    #[test]
    fn test_new_link_into_record() {
        let record: LinkRecord = NewLink::new("tok", "https://rust-lang.org", "owner").into();

        assert_eq!(record.token, "tok");
        assert_eq!(record.long_url, "https://rust-lang.org");
        assert_eq!(record.owner, "owner");
        assert!(!record.deleted);
    }
}
