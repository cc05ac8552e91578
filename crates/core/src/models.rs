use crate::error::ScanError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One page of a CQL search response.
///
/// `limit` is whatever the server decided to return, which is not
/// necessarily the page size the client asked for.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultPage {
    #[serde(default)]
    pub start: u64,
    #[serde(default)]
    pub limit: u64,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub total_size: u64,
    #[serde(default)]
    pub results: Vec<Hit>,
}

impl SearchResultPage {
    /// A page holding fewer entries than the server limit is the last one.
    pub fn is_complete(&self) -> bool {
        self.size < self.limit
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Hit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<ContentRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Hit {
    pub fn content_id(&self) -> Option<&str> {
        self.content
            .as_ref()
            .map(|content| content.id.as_str())
            .filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentRef {
    #[serde(default)]
    pub id: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// A fetched content record. `raw` is the untouched server payload and is
/// what ends up in the snapshot file.
#[derive(Debug, Clone)]
pub struct PageContent {
    pub id: String,
    pub title: String,
    pub html: String,
    pub url: String,
    pub raw: Value,
}

impl PageContent {
    pub fn from_raw(raw: Value) -> Result<Self, ScanError> {
        let id = match raw.pointer("/id") {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            _ => return Err(missing_field("id")),
        };
        let title = string_at(&raw, "/title")?;
        let html = string_at(&raw, "/body/view/value")?;
        let base = string_at(&raw, "/_links/base")?;
        let webui = string_at(&raw, "/_links/webui")?;

        Ok(Self {
            id,
            title,
            html,
            url: format!("{base}{webui}"),
            raw,
        })
    }
}

fn string_at(raw: &Value, pointer: &str) -> Result<String, ScanError> {
    raw.pointer(pointer)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| missing_field(pointer))
}

fn missing_field(field: &str) -> ScanError {
    ScanError::BackendResponse {
        backend: "confluence".to_string(),
        status: 200,
        details: format!("content record is missing {field}"),
    }
}

/// One keyword occurrence rendered for output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub keyword: String,
    pub url: String,
    pub title: String,
    /// Single-line context snippet with highlight markers applied.
    pub snippet: String,
}

impl std::fmt::Display for LogLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[Keyword: {}] [URL: {}] [Title: {}] [{}]",
            self.keyword, self.url, self.title, self.snippet
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn search_page_parses_confluence_payload() {
        let page: SearchResultPage = serde_json::from_value(json!({
            "results": [
                {"content": {"id": "101", "type": "page"}, "title": "Ops runbook"},
                {"title": "A space without content"},
                {"content": {"type": "attachment"}}
            ],
            "start": 0,
            "limit": 25,
            "size": 3,
            "totalSize": 3,
            "cqlQuery": "text~\"secret\""
        }))
        .expect("payload should parse");

        assert_eq!(page.total_size, 3);
        assert!(page.is_complete());
        assert_eq!(page.results[0].content_id(), Some("101"));
        assert_eq!(page.results[1].content_id(), None);
        assert_eq!(page.results[2].content_id(), None);
    }

    #[test]
    fn page_content_builds_canonical_url() {
        let content = PageContent::from_raw(json!({
            "id": "101",
            "title": "Ops runbook",
            "body": {"view": {"value": "<p>secret</p>"}},
            "_links": {"base": "https://wiki.example.com", "webui": "/spaces/OPS/pages/101"}
        }))
        .expect("content should parse");

        assert_eq!(content.url, "https://wiki.example.com/spaces/OPS/pages/101");
        assert_eq!(content.html, "<p>secret</p>");
    }

    #[test]
    fn page_content_without_body_is_rejected() {
        let result = PageContent::from_raw(json!({"id": "7", "title": "x", "_links": {}}));
        assert!(result.is_err());
    }
}
