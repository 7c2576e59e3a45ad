//! Object storage URLs for gallery images.
//!
//! - **Public**: `<base>/storage/v1/object/public/<bucket>/<path>`, derived
//!   locally, only offered when the bucket is configured as public.
//! - **Signed**: `POST <base>/storage/v1/object/sign/<bucket>/<path>` with
//!   `{"expiresIn": <secs>}`; the response's `signedURL` is relative to
//!   `<base>/storage/v1`.

use std::time::Duration;

use petrank_core::{AppConfig, Error, ObjectStorage};
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use crate::{RemoteConfig, RemoteError, RemoteHttp};

#[derive(Debug, Deserialize)]
struct SignResponse {
    #[serde(rename = "signedURL", alias = "signedUrl")]
    signed_url: String,
}

/// [`ObjectStorage`] for one bucket.
#[derive(Debug, Clone)]
pub struct StorageClient {
    http: RemoteHttp,
    bucket: String,
    public_bucket: bool,
}

impl StorageClient {
    pub fn new(http: RemoteHttp, bucket: impl Into<String>, public_bucket: bool) -> Self {
        Self { http, bucket: bucket.into(), public_bucket }
    }

    /// Build from the application config.
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let http = RemoteHttp::new(&RemoteConfig::from_app(config)?)?;
        Ok(Self::new(http, &config.storage_bucket, config.public_bucket))
    }

    fn object_url(&self, kind: &str, resource_path: &str) -> Result<Url, RemoteError> {
        let segments = ["storage", "v1", "object", kind, self.bucket.as_str()]
            .into_iter()
            .chain(resource_path.split('/').filter(|segment| !segment.is_empty()));
        self.http.endpoint(segments)
    }

    fn absolute_signed_url(&self, signed_url: &str) -> Result<String, RemoteError> {
        if signed_url.starts_with("http://") || signed_url.starts_with("https://") {
            return Ok(signed_url.to_string());
        }

        let root = self.http.endpoint(["storage", "v1"])?;
        Ok(format!("{}/{}", root.as_str().trim_end_matches('/'), signed_url.trim_start_matches('/')))
    }
}

#[async_trait::async_trait]
impl ObjectStorage for StorageClient {
    fn public_url(&self, resource_path: &str) -> Option<String> {
        if !self.public_bucket || resource_path.is_empty() {
            return None;
        }
        self.object_url("public", resource_path).ok().map(String::from)
    }

    async fn issue_signed_url(&self, resource_path: &str, ttl: Duration) -> Result<String, Error> {
        let url = self.object_url("sign", resource_path)?;
        let request = self
            .http
            .request(Method::POST, url)
            .json(&json!({ "expiresIn": ttl.as_secs() }));

        let response = self.http.send(request, resource_path).await?;
        let body = response.bytes().await.map_err(RemoteError::from)?;
        let signed: SignResponse = serde_json::from_slice(&body).map_err(|e| RemoteError::Parse(e.to_string()))?;

        Ok(self.absolute_signed_url(&signed.signed_url)?)
    }
}
