pub mod client;
pub mod config;
pub mod control;
pub mod dictionary;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod models;
pub mod orchestrator;
pub mod pagination;
pub mod query;
pub mod rate_limit;
pub mod sink;
pub mod snapshot;
pub mod traits;

pub use client::ConfluenceClient;
pub use config::{normalize_base_url, random_user_agent, ClientConfig};
pub use control::ScanControl;
pub use dictionary::{bundled_keywords, load_keywords, parse_keywords};
pub use error::ScanError;
pub use extractor::{
    HtmlToText, MatchMode, ScraperText, TextExtractor, DEFAULT_CONTEXT_LENGTH,
};
pub use fetcher::{ContentFetcher, ContentSource, FetchedPage};
pub use models::{ContentRef, Hit, LogLine, PageContent, SearchResultPage};
pub use orchestrator::{ScanReport, Scanner};
pub use pagination::expand_hits;
pub use query::{QueryTemplate, DEFAULT_CQL_TEMPLATE, KEYWORD_PLACEHOLDER};
pub use rate_limit::{RequestRateLimiter, DEFAULT_REQUESTS_PER_SECOND};
pub use sink::LogFile;
pub use snapshot::{SnapshotStore, DEFAULT_RESULTS_DIR};
pub use traits::{ConfluenceApi, ResultSink};
