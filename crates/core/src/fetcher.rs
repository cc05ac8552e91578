use crate::snapshot::SnapshotStore;
use crate::traits::ConfluenceApi;
use crate::{PageContent, ScanError};
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentSource {
    Network,
    Snapshot,
}

#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub content: PageContent,
    pub source: ContentSource,
    /// Whether this call created the snapshot file.
    pub snapshot_written: bool,
}

/// Resolves content ids to rendered pages and keeps the snapshot directory
/// in sync.
///
/// By default every id is fetched from the server even when a snapshot
/// already exists; only the write is skipped. With `reuse_snapshots` the
/// snapshot on disk is read instead and the request is not made.
#[derive(Debug, Clone)]
pub struct ContentFetcher {
    snapshots: SnapshotStore,
    reuse_snapshots: bool,
}

impl ContentFetcher {
    pub fn new(snapshots: SnapshotStore) -> Self {
        Self {
            snapshots,
            reuse_snapshots: false,
        }
    }

    pub fn reuse_snapshots(mut self, reuse: bool) -> Self {
        self.reuse_snapshots = reuse;
        self
    }

    pub async fn fetch(
        &self,
        api: &dyn ConfluenceApi,
        content_id: &str,
    ) -> Result<Value, ScanError> {
        api.page_by_id(content_id).await
    }

    /// Snapshot names follow the id the hit referenced.
    pub fn persist(&self, content_id: &str, record: &Value) -> Result<bool, ScanError> {
        self.snapshots.persist(content_id, record)
    }

    /// Fetch (or load) and persist in one step. The record is written before
    /// it is parsed, so a page without a rendered body still gets a snapshot.
    pub async fn resolve(
        &self,
        api: &dyn ConfluenceApi,
        content_id: &str,
    ) -> Result<FetchedPage, ScanError> {
        if self.reuse_snapshots && self.snapshots.exists(content_id)? {
            debug!(content_id, "loading content from snapshot");
            return Ok(FetchedPage {
                content: self.snapshots.load(content_id)?,
                source: ContentSource::Snapshot,
                snapshot_written: false,
            });
        }

        let record = self.fetch(api, content_id).await?;
        let snapshot_written = self.persist(content_id, &record)?;

        Ok(FetchedPage {
            content: PageContent::from_raw(record)?,
            source: ContentSource::Network,
            snapshot_written,
        })
    }
}
