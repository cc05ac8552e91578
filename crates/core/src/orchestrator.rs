use crate::control::ScanControl;
use crate::extractor::TextExtractor;
use crate::fetcher::{ContentFetcher, ContentSource};
use crate::pagination::expand_hits;
use crate::query::QueryTemplate;
use crate::traits::{ConfluenceApi, ResultSink};
use crate::ScanError;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ScanReport {
    pub keywords_searched: usize,
    pub hits_seen: usize,
    pub pages_fetched: usize,
    pub snapshots_loaded: usize,
    pub snapshots_written: usize,
    pub matches: usize,
    pub failures: usize,
    /// Set when a failed search ended the scan before the last keyword.
    pub stopped_by: Option<String>,
}

pub struct Scanner<A, S>
where
    A: ConfluenceApi,
    S: ResultSink,
{
    api: A,
    sink: S,
    template: QueryTemplate,
    fetcher: ContentFetcher,
    extractor: TextExtractor,
    control: ScanControl,
}

impl<A, S> Scanner<A, S>
where
    A: ConfluenceApi,
    S: ResultSink,
{
    pub fn new(
        api: A,
        sink: S,
        template: QueryTemplate,
        fetcher: ContentFetcher,
        extractor: TextExtractor,
    ) -> Self {
        Self {
            api,
            sink,
            template,
            fetcher,
            extractor,
            control: ScanControl::new(),
        }
    }

    pub fn with_control(mut self, control: ScanControl) -> Self {
        self.control = control;
        self
    }

    pub fn control(&self) -> &ScanControl {
        &self.control
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Runs every keyword in order. Only cancellation is returned as an
    /// error; everything else is logged and counted in the report.
    pub async fn run(&self, keywords: &[String]) -> Result<ScanReport, ScanError> {
        let mut report = ScanReport::default();

        for keyword in keywords {
            self.control.checkpoint().await?;

            let cql = self.template.render(keyword);
            debug!(keyword = %keyword, cql = %cql, "cql query");
            report.keywords_searched += 1;

            let initial = match self.api.search(&cql, 0).await {
                Ok(page) => page,
                Err(err) => {
                    error!(keyword = %keyword, "failed searching Confluence: {err}");
                    report.failures += 1;
                    report.stopped_by = Some(err.to_string());
                    break;
                }
            };

            let walked = expand_hits(keyword, &cql, &initial, &self.api, &self.control).await;
            let hits = match walked {
                Ok(hits) => hits,
                Err(ScanError::Cancelled) => return Err(ScanError::Cancelled),
                Err(err) => {
                    error!(keyword = %keyword, "failed loading result pages: {err}");
                    report.failures += 1;
                    initial.results
                }
            };
            report.hits_seen += hits.len();

            let mut seen = HashSet::new();
            for hit in &hits {
                let Some(content_id) = hit.content_id() else {
                    continue;
                };
                if !seen.insert(content_id) {
                    debug!(content_id, "duplicate hit for keyword");
                    continue;
                }
                self.control.checkpoint().await?;

                if let Err(err) = self.scan_content(keyword, content_id, &mut report).await {
                    error!(
                        content_id,
                        "failed getting content for id {content_id} due to: {err}"
                    );
                    report.failures += 1;
                }
            }
        }

        info!(
            keywords = report.keywords_searched,
            pages = report.pages_fetched,
            matches = report.matches,
            failures = report.failures,
            "scan finished"
        );
        Ok(report)
    }

    async fn scan_content(
        &self,
        keyword: &str,
        content_id: &str,
        report: &mut ScanReport,
    ) -> Result<(), ScanError> {
        let fetched = self.fetcher.resolve(&self.api, content_id).await?;
        match fetched.source {
            ContentSource::Network => report.pages_fetched += 1,
            ContentSource::Snapshot => report.snapshots_loaded += 1,
        }
        if fetched.snapshot_written {
            report.snapshots_written += 1;
        }

        let page = fetched.content;
        let lines = self
            .extractor
            .scan(&page.url, &page.title, &page.html, keyword, &self.sink);
        report.matches += lines.len();
        Ok(())
    }
}
