//! Shared HTTP plumbing for the backend endpoints.
//!
//! Every request carries the project API key twice: as the `apikey` header
//! the gateway checks and as a bearer token for row-level policies.

use std::time::Duration;

use petrank_core::{AppConfig, Error};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, header};
use url::Url;

use crate::RemoteError;

/// Connection settings for the backend.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Project base URL, e.g. `https://abc.supabase.co`.
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl RemoteConfig {
    /// Build from the application config.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if the backend URL or key is missing.
    pub fn from_app(config: &AppConfig) -> Result<Self, Error> {
        let (base_url, api_key) = config
            .require_remote()
            .map_err(|e| Error::InvalidInput(e.to_string()))?;

        Ok(Self {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            timeout: config.timeout(),
            user_agent: config.user_agent.clone(),
        })
    }
}

/// Authenticated HTTP client bound to one backend.
#[derive(Debug, Clone)]
pub struct RemoteHttp {
    http: Client,
    base: Url,
    api_key: String,
}

impl RemoteHttp {
    pub fn new(config: &RemoteConfig) -> Result<Self, Error> {
        if config.api_key.is_empty() {
            return Err(Error::InvalidInput("remote api key must not be empty".into()));
        }

        let base = Url::parse(&config.base_url).map_err(|e| RemoteError::InvalidUrl(format!("{}: {e}", config.base_url)))?;
        if base.cannot_be_a_base() {
            return Err(RemoteError::InvalidUrl(config.base_url.clone()).into());
        }

        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(RemoteError::from)?;

        Ok(Self { http, base, api_key: config.api_key.clone() })
    }

    /// Base URL extended with `segments`, each percent-encoded as one path segment.
    pub fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Url, RemoteError> {
        let mut url = self.base.clone();
        url.set_query(None);
        url.path_segments_mut()
            .map_err(|_| RemoteError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.api_key)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(header::ACCEPT, "application/json")
    }

    /// Send the request and map error statuses.
    pub async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response, RemoteError> {
        let response = request.send().await?;
        let status = response.status();
        tracing::debug!(what, status = status.as_u16(), "backend response");

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(RemoteError::Auth { status: status.as_u16() }),
            StatusCode::NOT_FOUND => Err(RemoteError::NotFound(what.to_string())),
            StatusCode::TOO_MANY_REQUESTS => Err(RemoteError::RateLimited),
            s if s.is_client_error() || s.is_server_error() => Err(RemoteError::HttpError { status: s.as_u16() }),
            _ => Ok(response),
        }
    }
}
