//! HTTP plumbing shared by the API services.

use std::time::Duration;

use reqwest::{header, Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::config::Config;
use crate::openapi::pull_requests::PullRequests;

/// Errors returned by API calls.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid API url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// GitCode REST API client.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    token: Option<String>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("token_set", &self.token.is_some())
            .finish()
    }
}

impl ApiClient {
    /// Create a client rooted at `base_url`, e.g. `https://api.gitcode.com/api/v5/`.
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self, ApiError> {
        // Url::join drops the last segment unless the base ends with '/'.
        let base_url = if base_url.ends_with('/') {
            Url::parse(base_url)?
        } else {
            Url::parse(&format!("{}/", base_url))?
        };

        let http = Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url,
            token,
        })
    }

    /// Build a client from the REST settings in `config`.
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(
            &config.api_base_url,
            config.api_token.clone(),
            Duration::from_millis(config.request_timeout_ms),
        )
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Pull-request endpoints.
    pub fn pull_requests(&self) -> PullRequests<'_> {
        PullRequests::new(self)
    }

    /// Start a request against `path`, relative to the base URL.
    pub(crate) fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let url = self.base_url.join(path.trim_start_matches('/'))?;
        let mut builder = self
            .http
            .request(method, url)
            .header(header::ACCEPT, "application/json");
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        Ok(builder)
    }

    /// Send a request and decode its JSON body.
    ///
    /// `Ok(None)` means the resource does not exist (404).
    pub(crate) async fn send<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<Option<T>, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        let url = response.url().path().to_string();

        if status == StatusCode::NOT_FOUND {
            debug!(path = %url, "gitcode_api_not_found");
            return Ok(None);
        }

        let body = response.bytes().await?;

        if !status.is_success() {
            warn!(path = %url, status = status.as_u16(), "gitcode_api_error_status");
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        debug!(path = %url, status = status.as_u16(), body_length = body.len(), "gitcode_api_ok");

        Ok(Some(serde_json::from_slice(&body)?))
    }
}
