//! JSON-lines snapshot file used by the in-memory backend.
//!
//! One object per line with the fields `short`, `long` and `user`, appended on
//! every write and replayed in full on startup. Tombstones are appended as a
//! repeat of the record with `"deleted": true`.

use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::warn;

use crate::domain::entities::{LinkRecord, NewLink};

/// One line of the snapshot file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    #[serde(rename = "short")]
    pub token: String,
    #[serde(rename = "long")]
    pub long_url: String,
    #[serde(rename = "user", default)]
    pub owner: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deleted: bool,
}

impl From<&NewLink> for SnapshotEntry {
    fn from(link: &NewLink) -> Self {
        Self {
            token: link.token.clone(),
            long_url: link.long_url.clone(),
            owner: link.owner.clone(),
            deleted: false,
        }
    }
}

impl From<&LinkRecord> for SnapshotEntry {
    fn from(record: &LinkRecord) -> Self {
        Self {
            token: record.token.clone(),
            long_url: record.long_url.clone(),
            owner: record.owner.clone(),
            deleted: record.deleted,
        }
    }
}

/// Append-only writer for the snapshot file.
///
/// Every append starts on a fresh line: a partial record left by a crash or a
/// failed write is terminated before anything new is written after it.
pub struct SnapshotWriter {
    path: PathBuf,
    file: File,
    /// Set when the file may end in the middle of a line.
    torn: bool,
}

impl SnapshotWriter {
    /// Opens `path` for appending, creating it if needed.
    pub async fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)
            .await?;

        let torn = !ends_with_newline(&mut file).await?;
        if torn {
            warn!(path = %path.display(), "Snapshot ends with a partial line");
        }

        Ok(Self { path, file, torn })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `entries` in a single write.
    pub async fn append(&mut self, entries: &[SnapshotEntry]) -> io::Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut buf = Vec::with_capacity(entries.len() * 96 + 1);
        if self.torn {
            buf.push(b'\n');
        }
        for entry in entries {
            serde_json::to_writer(&mut buf, entry)?;
            buf.push(b'\n');
        }

        // Part of `buf` may have reached the file before an error.
        self.torn = true;
        self.file.write_all(&buf).await?;
        self.file.flush().await?;
        self.torn = false;

        Ok(())
    }

    /// Flushes file contents to disk.
    pub async fn sync(&mut self) -> io::Result<()> {
        self.file.flush().await?;
        self.file.sync_all().await
    }
}

/// Returns true for an empty file or one whose last byte is a newline.
async fn ends_with_newline(file: &mut File) -> io::Result<bool> {
    if file.metadata().await?.len() == 0 {
        return Ok(true);
    }

    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1)).await?;
    file.read_exact(&mut last).await?;

    Ok(last[0] == b'\n')
}

/// Reads every entry from `path` in file order.
///
/// A missing file yields no entries. Lines that fail to parse (for example a
/// record truncated by a crash) are logged and skipped.
pub async fn replay(path: impl AsRef<Path>) -> io::Result<Vec<SnapshotEntry>> {
    let path = path.as_ref();
    let contents = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut entries = Vec::new();
    for (index, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<SnapshotEntry>(line) {
            Ok(entry) => entries.push(entry),
            Err(e) => warn!(
                path = %path.display(),
                line = index + 1,
                error = %e,
                "Skipping malformed snapshot line"
            ),
        }
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_uses_short_field_names() {
        let entry = SnapshotEntry::from(&NewLink::new("abc", "https://example.com", "u1"));
        let line = serde_json::to_string(&entry).unwrap();

        assert_eq!(
            line,
            r#"{"short":"abc","long":"https://example.com","user":"u1"}"#
        );
    }

    #[test]
    fn test_tombstone_entry_carries_deleted_flag() {
        let mut record = LinkRecord::new(
            "abc".to_string(),
            "https://example.com".to_string(),
            "u1".to_string(),
        );
        record.deleted = true;

        let line = serde_json::to_string(&SnapshotEntry::from(&record)).unwrap();
        assert!(line.ends_with(r#""deleted":true}"#));
    }

    #[test]
    fn test_entry_without_user_parses() {
        let entry: SnapshotEntry =
            serde_json::from_str(r#"{"short":"abc","long":"https://example.com"}"#).unwrap();

        assert_eq!(entry.owner, "");
        assert!(!entry.deleted);
    }

    #[tokio::test]
    async fn test_replay_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let entries = replay(dir.path().join("absent.json")).await.unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_replay_skips_malformed_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("links.json");
        tokio::fs::write(
            &path,
            "{\"short\":\"a\",\"long\":\"https://a.com\",\"user\":\"u\"}\n\nnot json\n{\"short\":\"b\",\"long\":\"https://b.com\",\"user\":\"u\"}\n{\"short\":\"c\",",
        )
        .await
        .unwrap();

        let entries = replay(&path).await.unwrap();
        let tokens: Vec<&str> = entries.iter().map(|e| e.token.as_str()).collect();
        assert_eq!(tokens, ["a", "b"]);
    }

    #[tokio::test]
    async fn test_writer_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("links.json");

        let mut writer = SnapshotWriter::open(&path).await.unwrap();
        writer
            .append(&[SnapshotEntry::from(&NewLink::new("a", "https://a.com", "u"))])
            .await
            .unwrap();
        writer
            .append(&[SnapshotEntry::from(&NewLink::new("b", "https://b.com", "u"))])
            .await
            .unwrap();
        writer.sync().await.unwrap();

        let entries = replay(&path).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(writer.path(), path.as_path());
    }

    #[tokio::test]
    async fn test_writer_starts_new_line_after_partial_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("links.json");
        tokio::fs::write(
            &path,
            "{\"short\":\"a\",\"long\":\"https://a.com\",\"user\":\"u\"}\n{\"short\":\"c\",",
        )
        .await
        .unwrap();

        let mut writer = SnapshotWriter::open(&path).await.unwrap();
        writer
            .append(&[SnapshotEntry::from(&NewLink::new("b", "https://b.com", "u"))])
            .await
            .unwrap();
        writer
            .append(&[SnapshotEntry::from(&NewLink::new("d", "https://d.com", "u"))])
            .await
            .unwrap();
        writer.sync().await.unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(contents.contains("{\"short\":\"c\",\n{\"short\":\"b\""));

        let entries = replay(&path).await.unwrap();
        let tokens: Vec<&str> = entries.iter().map(|e| e.token.as_str()).collect();
        assert_eq!(tokens, ["a", "b", "d"]);
    }

    #[tokio::test]
    async fn test_writer_does_not_pad_clean_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("links.json");
        tokio::fs::write(&path, "{\"short\":\"a\",\"long\":\"https://a.com\"}\n")
            .await
            .unwrap();

        let mut writer = SnapshotWriter::open(&path).await.unwrap();
        writer
            .append(&[SnapshotEntry::from(&NewLink::new("b", "https://b.com", "u"))])
            .await
            .unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(!contents.contains("\n\n"));
        assert_eq!(contents.lines().count(), 2);
    }
}
