use crate::config::ClientConfig;
use crate::rate_limit::RequestRateLimiter;
use crate::traits::ConfluenceApi;
use crate::{ScanError, SearchResultPage};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, Proxy, Response};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

const SEARCH_PATH: &str = "rest/api/search";
const CONTENT_PATH: &str = "rest/api/content";
const BODY_EXPAND: &str = "body.view";

pub struct ConfluenceClient {
    client: Client,
    base_url: Url,
    username: String,
    password: String,
    limiter: RequestRateLimiter,
}

impl ConfluenceClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ScanError> {
        Self::with_limiter(config, RequestRateLimiter::new(config.requests_per_second))
    }

    pub fn with_limiter(
        config: &ClientConfig,
        limiter: RequestRateLimiter,
    ) -> Result<Self, ScanError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .danger_accept_invalid_certs(!config.verify_tls)
            .timeout(Duration::from_secs(60));

        if let Some(proxy) = &config.proxy {
            builder = builder.proxy(Proxy::all(proxy)?);
        }

        // Url::join drops the last path segment unless it ends with a slash.
        let base_url = Url::parse(&format!("{}/", config.base_url))?;
        if base_url.cannot_be_a_base() {
            return Err(ScanError::InvalidConfig(format!(
                "{} is not a usable base url",
                config.base_url
            )));
        }

        Ok(Self {
            client: builder.build()?,
            base_url,
            username: config.username.clone(),
            password: config.password.clone(),
            limiter,
        })
    }

    pub fn search_url(&self, cql: &str, start: u64) -> Result<Url, ScanError> {
        let mut url = self.base_url.join(SEARCH_PATH)?;
        url.query_pairs_mut()
            .append_pair("cql", cql)
            .append_pair("start", &start.to_string())
            .append_pair("includeArchivedSpaces", "true");
        Ok(url)
    }

    pub fn content_url(&self, content_id: &str) -> Result<Url, ScanError> {
        let mut url = self.base_url.join(CONTENT_PATH)?;
        url.path_segments_mut()
            .map_err(|_| ScanError::InvalidConfig(self.base_url.to_string()))?
            .push(content_id);
        url.query_pairs_mut().append_pair("expand", BODY_EXPAND);
        Ok(url)
    }

    async fn get_json(&self, url: Url) -> Result<Value, ScanError> {
        self.limiter.wait().await;
        debug!(url = %url, "confluence request");

        let response = self
            .client
            .get(url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        Ok(ensure_success(response).await?.json().await?)
    }
}

async fn ensure_success(response: Response) -> Result<Response, ScanError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let details = response.text().await.unwrap_or_default();
    Err(ScanError::BackendResponse {
        backend: "confluence".to_string(),
        status: status.as_u16(),
        details,
    })
}

#[async_trait]
impl ConfluenceApi for ConfluenceClient {
    async fn search(&self, cql: &str, start: u64) -> Result<SearchResultPage, ScanError> {
        let payload = self.get_json(self.search_url(cql, start)?).await?;
        Ok(serde_json::from_value(payload)?)
    }

    async fn page_by_id(&self, content_id: &str) -> Result<Value, ScanError> {
        self.get_json(self.content_url(content_id)?).await
    }
}
