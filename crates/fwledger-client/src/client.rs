//! Client for the fwledger REST API, as used by edge devices.

use crate::api::{FirmwareApi, NodeApi};
use crate::config::{build_http_client, default_user_agent, DEFAULT_TIMEOUT};
use fwledger_core::{FwError, Result};
use futures_util::StreamExt;
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Default API base URL of a local gateway
const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000/api";

/// fwledger API client
#[derive(Clone)]
pub struct FwClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: HttpClient,
    base_url: String,
}

impl FwClient {
    /// Create a new client for the API at `base_url` using default settings
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        FwClientBuilder::new().base_url(base_url).build()
    }

    /// Create a builder for custom configuration
    #[must_use]
    pub fn builder() -> FwClientBuilder {
        FwClientBuilder::new()
    }

    /// Access node lifecycle endpoints
    #[must_use]
    pub fn nodes(&self) -> NodeApi<'_> {
        NodeApi::new(self)
    }

    /// Access firmware endpoints
    #[must_use]
    pub fn firmware(&self) -> FirmwareApi<'_> {
        FirmwareApi::new(self)
    }

    /// Perform a POST request with a JSON body
    pub(crate) async fn post<T: DeserializeOwned, B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = format!("{}{}", self.inner.base_url, path);
        debug!(url = %url, "POST request");

        let response = self
            .inner
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| FwError::Http(e.to_string()))?;

        self.handle_response(response).await
    }

    /// Stream a download to `dest`, returning the number of bytes written.
    pub async fn download_to(&self, url: &str, dest: &Path) -> Result<u64> {
        debug!(url, dest = %dest.display(), "downloading");

        let response = self
            .inner
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| FwError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FwError::Api {
                code: status.as_u16(),
                message: format!("failed to download {url}"),
            });
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut written = 0u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| FwError::Http(e.to_string()))?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        Ok(written)
    }

    /// Handle an API response that returns JSON
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FwError::Http(e.to_string()))?;

        if status.is_success() {
            return serde_json::from_str(&body).map_err(FwError::Json);
        }

        // Error bodies are `{error, details?}`
        let parsed = serde_json::from_str::<serde_json::Value>(&body).ok();
        let error = parsed
            .as_ref()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from));
        let details = parsed
            .as_ref()
            .and_then(|v| v.get("details").and_then(|e| e.as_str()).map(String::from));

        let message = match (error, details) {
            (Some(error), Some(details)) => format!("{error}: {details}"),
            (Some(error), None) => error,
            _ => body,
        };

        if status.is_server_error() {
            warn!(status = status.as_u16(), %message, "API server error");
        }

        Err(FwError::Api {
            code: status.as_u16(),
            message,
        })
    }
}

/// Builder for configuring a [`FwClient`]
pub struct FwClientBuilder {
    base_url: String,
    timeout: Duration,
    user_agent: String,
    trust_roots: Vec<String>,
}

impl Default for FwClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FwClientBuilder {
    /// Create a new builder with default settings
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: default_user_agent(),
            trust_roots: Vec::new(),
        }
    }

    /// Set the base URL, including the API prefix (e.g. `https://host:3000/api`)
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the request timeout
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the User-Agent header
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// Trust an additional PEM root (the gateway's self-signed CA)
    #[must_use]
    pub fn trust_root(mut self, pem: impl Into<String>) -> Self {
        self.trust_roots.push(pem.into());
        self
    }

    /// Build the client
    pub fn build(self) -> Result<FwClient> {
        let http = build_http_client(self.timeout, &self.user_agent, &self.trust_roots)?;
        Ok(FwClient {
            inner: Arc::new(ClientInner {
                http,
                base_url: self.base_url,
            }),
        })
    }
}
