use crate::{LogLine, ScanError, SearchResultPage};
use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait ConfluenceApi: Send + Sync {
    async fn search(&self, cql: &str, start: u64) -> Result<SearchResultPage, ScanError>;

    /// Returns the content record exactly as the server sent it.
    async fn page_by_id(&self, content_id: &str) -> Result<Value, ScanError>;
}

/// Receives every match line produced during a scan.
pub trait ResultSink {
    fn record(&self, line: &LogLine) -> Result<(), ScanError>;
}
