use std::time::Duration;

use chart_core::RecordShape;
use chart_db::{CachedResponse, ResponseCache, cache_key};
use serde_json::Value;
use tracing::{debug, warn};

use crate::types::{IngestError, Result};

pub const DEFAULT_API_URL: &str = "http://ws.audioscrobbler.com/2.0/";
pub const DEFAULT_USER_AGENT: &str = "lastfm-etl";

/// One fetched chart page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResponse {
    pub status: u16,
    pub body: String,
    pub from_cache: bool,
}

impl PageResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    pub fn json(&self) -> Result<Value> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Anything that can hand the run controller chart pages by number.
pub trait PageSource {
    fn fetch_page(&mut self, page: u32) -> Result<PageResponse>;
}

/// Connection details for the chart API.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub api_url: String,
    pub api_key: String,
    pub limit: u32,
    pub user_agent: String,
}

impl ApiSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: api_key.into(),
            limit: 500,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Chart API client that answers repeated requests from its response cache.
/// The cache is cleared when the client is dropped.
pub struct ChartApiClient {
    http_client: ureq::Agent,
    settings: ApiSettings,
    shape: &'static RecordShape,
    cache: ResponseCache,
}

impl ChartApiClient {
    pub fn new(settings: ApiSettings, shape: &'static RecordShape, cache: ResponseCache) -> Self {
        let http_client = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(5))
            .timeout_read(Duration::from_secs(30))
            .timeout_write(Duration::from_secs(15))
            .build();
        Self {
            http_client,
            settings,
            shape,
            cache,
        }
    }

    pub fn base_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("api_key", self.settings.api_key.clone()),
            ("format", "json".to_string()),
            ("method", self.shape.api_method.to_string()),
            ("limit", self.settings.limit.to_string()),
        ]
    }

    pub fn page_url(&self, page: u32) -> String {
        request_url(&self.settings.api_url, &self.base_params(), page)
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }
}

impl PageSource for ChartApiClient {
    fn fetch_page(&mut self, page: u32) -> Result<PageResponse> {
        let url = self.page_url(page);
        let key = cache_key(&url);
        if let Some(cached) = self.cache.get(&key)? {
            debug!(page, method = self.shape.api_method, "served chart page from cache");
            return Ok(PageResponse {
                status: cached.status,
                body: cached.body,
                from_cache: true,
            });
        }

        let result = self
            .http_client
            .get(&url)
            .set("User-Agent", &self.settings.user_agent)
            .set("Accept", "application/json")
            .call();
        let (status, body) = match result {
            Ok(response) => {
                let status = response.status();
                (status, response.into_string()?)
            }
            Err(ureq::Error::Status(status, response)) => {
                (status, response.into_string().unwrap_or_default())
            }
            Err(err) => {
                return Err(IngestError::Http(format!(
                    "{} page {} request failed: {}",
                    self.shape.api_method, page, err
                )));
            }
        };

        if status == 200 {
            let cached = CachedResponse { status, body };
            self.cache.put(&key, &url, &cached)?;
            return Ok(PageResponse {
                status,
                body: cached.body,
                from_cache: false,
            });
        }
        Ok(PageResponse {
            status,
            body,
            from_cache: false,
        })
    }
}

impl Drop for ChartApiClient {
    fn drop(&mut self) {
        if let Err(err) = self.cache.clear() {
            warn!(namespace = self.cache.namespace(), "failed to clear response cache: {}", err);
        }
    }
}

/// Merges `page` into the base query parameters and renders the request URL.
pub fn request_url(api_url: &str, base_params: &[(&str, String)], page: u32) -> String {
    let page = page.to_string();
    let query = base_params
        .iter()
        .filter(|(key, _)| *key != "page")
        .map(|(key, value)| (*key, value.as_str()))
        .chain(std::iter::once(("page", page.as_str())))
        .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&");
    let separator = if api_url.contains('?') { '&' } else { '?' };
    format!("{api_url}{separator}{query}")
}
