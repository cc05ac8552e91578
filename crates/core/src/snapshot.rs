use crate::{PageContent, ScanError};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

pub const DEFAULT_RESULTS_DIR: &str = "./results";

/// One pretty-printed JSON file per content id, written at most once.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    directory: PathBuf,
}

impl SnapshotStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn path_for(&self, content_id: &str) -> Result<PathBuf, ScanError> {
        let is_plain = !content_id.is_empty()
            && content_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !is_plain {
            return Err(ScanError::InvalidContentId(content_id.to_string()));
        }
        Ok(self.directory.join(format!("page_{content_id}.json")))
    }

    pub fn exists(&self, content_id: &str) -> Result<bool, ScanError> {
        Ok(self.path_for(content_id)?.exists())
    }

    /// Returns `true` when a new file was written.
    pub fn persist(&self, content_id: &str, raw: &Value) -> Result<bool, ScanError> {
        let path = self.path_for(content_id)?;
        fs::create_dir_all(&self.directory)?;

        if path.exists() {
            debug!(content_id, "file for id already exists");
            return Ok(false);
        }

        fs::write(&path, serde_json::to_string_pretty(raw)?)?;
        Ok(true)
    }

    pub fn load(&self, content_id: &str) -> Result<PageContent, ScanError> {
        let raw: Value = serde_json::from_str(&fs::read_to_string(self.path_for(content_id)?)?)?;
        PageContent::from_raw(raw)
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new(DEFAULT_RESULTS_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn record(id: &str, title: &str) -> Value {
        json!({
            "id": id,
            "title": title,
            "body": {"view": {"value": "<p>secret</p>"}},
            "_links": {"base": "https://wiki", "webui": format!("/pages/{id}")}
        })
    }

    #[test]
    fn second_persist_leaves_file_untouched() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let store = SnapshotStore::new(dir.path().join("results"));

        assert!(store.persist("42", &record("42", "first"))?);
        let before = fs::read_to_string(store.path_for("42")?)?;

        assert!(!store.persist("42", &record("42", "second"))?);
        let after = fs::read_to_string(store.path_for("42")?)?;

        assert_eq!(before, after);
        assert!(after.contains("first"));
        Ok(())
    }

    #[test]
    fn distinct_ids_get_distinct_files() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let store = SnapshotStore::new(dir.path());

        store.persist("1", &record("1", "a"))?;
        store.persist("2", &record("2", "b"))?;

        assert!(dir.path().join("page_1.json").exists());
        assert!(dir.path().join("page_2.json").exists());
        assert_eq!(fs::read_dir(dir.path())?.count(), 2);
        Ok(())
    }

    #[test]
    fn snapshot_round_trips_into_page_content() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let store = SnapshotStore::new(dir.path());
        store.persist("9", &record("9", "Runbook"))?;

        let content = store.load("9")?;
        assert_eq!(content.title, "Runbook");
        assert_eq!(content.url, "https://wiki/pages/9");
        Ok(())
    }

    #[test]
    fn path_like_ids_are_rejected() {
        let store = SnapshotStore::default();
        assert!(store.path_for("../etc/passwd").is_err());
        assert!(store.path_for("").is_err());
    }
}
