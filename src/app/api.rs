//! Client for the upstream JSON Data API.

use std::time::Duration;

use async_trait::async_trait;
use axum::body::Bytes;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::config::DataApiConfig;
use crate::error::{FetchError, StartupError};

/// Raw upstream response, relayed as-is by the API proxy.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

/// Read access to the Data API.
///
/// Paths are given the way the browser would request them (`/api/...`);
/// implementations map them onto the upstream base.
#[async_trait]
pub trait DataApi: Send + Sync + std::fmt::Debug {
    /// Issue a GET and return the response whatever its status.
    async fn get_raw(&self, path: &str) -> Result<RawResponse, FetchError>;

    /// GET a JSON document. Non-2xx responses are errors.
    async fn get_json(&self, path: &str) -> Result<Value, FetchError> {
        let response = self.get_raw(path).await?;
        if !(200..300).contains(&response.status) {
            return Err(FetchError::Status {
                url: path.to_string(),
                status: response.status,
            });
        }
        serde_json::from_slice(&response.body).map_err(|source| FetchError::Decode {
            url: path.to_string(),
            source,
        })
    }
}

/// [`DataApi`] over HTTP with `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpDataApi {
    client: reqwest::Client,
    base: String,
    strip_prefix: String,
}

impl HttpDataApi {
    pub fn new(config: &DataApiConfig) -> Result<Self, StartupError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base: config.base_url.trim_end_matches('/').to_string(),
            strip_prefix: config.strip_prefix.trim_end_matches('/').to_string(),
        })
    }

    /// Map a browser-facing path onto the upstream base, dropping the proxy
    /// prefix: `/api/library/books/1` becomes `{base}/library/books/1`.
    pub fn resolve(&self, path: &str) -> Result<Url, FetchError> {
        let stripped = if self.strip_prefix.is_empty() {
            path
        } else {
            match path.strip_prefix(self.strip_prefix.as_str()) {
                Some(rest) if rest.is_empty() || rest.starts_with('/') || rest.starts_with('?') => {
                    rest
                }
                _ => path,
            }
        };
        let joined = if stripped.starts_with('/') {
            format!("{}{stripped}", self.base)
        } else {
            format!("{}/{stripped}", self.base)
        };
        Ok(Url::parse(&joined)?)
    }
}

#[async_trait]
impl DataApi for HttpDataApi {
    async fn get_raw(&self, path: &str) -> Result<RawResponse, FetchError> {
        let url = self.resolve(path)?;
        let started = std::time::Instant::now();
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        debug!(
            name: "data_api.fetch",
            url = %url,
            status,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Data API request"
        );

        Ok(RawResponse {
            status,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(base: &str) -> HttpDataApi {
        HttpDataApi::new(&DataApiConfig {
            base_url: base.to_string(),
            strip_prefix: "/api".to_string(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn test_resolve_strips_api_prefix() {
        let api = api("http://localhost:8000/");
        assert_eq!(
            api.resolve("/api/library/books/42").unwrap().as_str(),
            "http://localhost:8000/library/books/42"
        );
        assert_eq!(
            api.resolve("/api/library/books?page=2&page_size=50")
                .unwrap()
                .as_str(),
            "http://localhost:8000/library/books?page=2&page_size=50"
        );
    }

    #[test]
    fn test_resolve_keeps_unprefixed_paths() {
        let api = api("http://localhost");
        assert_eq!(
            api.resolve("/apiary").unwrap().as_str(),
            "http://localhost/apiary"
        );
        assert_eq!(
            api.resolve("/library/categories").unwrap().as_str(),
            "http://localhost/library/categories"
        );
    }
}
