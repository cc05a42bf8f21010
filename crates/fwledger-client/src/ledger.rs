//! Ledger gateway client.
//!
//! The gateway holds the long-lived connections to peers and orderers. This
//! client opens a session bound to one identity, channel and contract,
//! submits or evaluates transactions through it, and closes it again.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use fwledger_core::{FwError, Identity, Result};
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::{build_http_client, default_user_agent, DEFAULT_TIMEOUT};
use crate::signer;

const SESSIONS_PATH: &str = "/api/v1/sessions";

/// Channel and contract a session binds to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractTarget {
    pub channel: String,
    pub contract: String,
    /// Peer/service discovery; disabled for fixed deployments
    pub discovery: bool,
}

impl ContractTarget {
    #[must_use]
    pub fn new(channel: impl Into<String>, contract: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            contract: contract.into(),
            discovery: false,
        }
    }
}

/// An open session on the ledger network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHandle {
    pub session_id: String,
    pub identity_label: String,
    pub channel: String,
    pub contract: String,
}

/// Session-oriented access to a contract on the ledger network.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Open a session as `identity`, resolving the target channel and contract.
    async fn connect(&self, identity: &Identity, target: &ContractTarget) -> Result<SessionHandle>;

    /// Endorse, order and commit a transaction; returns the contract's payload.
    async fn submit(&self, session: &SessionHandle, function: &str, args: &[&str])
        -> Result<Vec<u8>>;

    /// Run a read-only query; nothing is committed.
    async fn evaluate(
        &self,
        session: &SessionHandle,
        function: &str,
        args: &[&str],
    ) -> Result<Vec<u8>>;

    /// Release the session.
    async fn disconnect(&self, session: &SessionHandle) -> Result<()>;
}

/// REST client for the ledger gateway
#[derive(Clone)]
pub struct LedgerClient {
    inner: Arc<LedgerInner>,
}

struct LedgerInner {
    http: HttpClient,
    base_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConnectBody<'a> {
    msp_id: &'a str,
    certificate: &'a str,
    channel: &'a str,
    contract: &'a str,
    discovery: Discovery,
}

#[derive(Serialize)]
struct Discovery {
    enabled: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectResult {
    session_id: String,
}

#[derive(Serialize)]
struct TransactionBody<'a> {
    function: &'a str,
    args: &'a [&'a str],
    submit: bool,
}

#[derive(Deserialize)]
struct TransactionResult {
    #[serde(default)]
    payload: String,
}

impl LedgerClient {
    /// Create a client for the gateway at `base_url` using default settings
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        LedgerClientBuilder::new(base_url).build()
    }

    /// Create a builder for custom configuration
    #[must_use]
    pub fn builder(base_url: impl Into<String>) -> LedgerClientBuilder {
        LedgerClientBuilder::new(base_url)
    }

    async fn transact(
        &self,
        session: &SessionHandle,
        function: &str,
        args: &[&str],
        submit: bool,
    ) -> Result<Vec<u8>> {
        let url = format!(
            "{}{SESSIONS_PATH}/{}/transactions",
            self.inner.base_url, session.session_id
        );
        debug!(
            session = %session.session_id,
            function,
            submit,
            "ledger transaction"
        );

        let response = self
            .inner
            .http
            .post(&url)
            .json(&TransactionBody {
                function,
                args,
                submit,
            })
            .send()
            .await
            .map_err(|e| FwError::Transaction(format!("{function}: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FwError::Transaction(e.to_string()))?;

        if !status.is_success() {
            return Err(FwError::Transaction(error_message(&body, status)));
        }

        let result: TransactionResult = serde_json::from_str(&body)?;
        B64.decode(result.payload.as_bytes())
            .map_err(|e| FwError::Transaction(format!("invalid payload encoding: {e}")))
    }
}

#[async_trait]
impl LedgerGateway for LedgerClient {
    async fn connect(&self, identity: &Identity, target: &ContractTarget) -> Result<SessionHandle> {
        let body = serde_json::to_vec(&ConnectBody {
            msp_id: &identity.msp_id,
            certificate: &identity.certificate,
            channel: &target.channel,
            contract: &target.contract,
            discovery: Discovery {
                enabled: target.discovery,
            },
        })?;
        let token = signer::auth_token(identity, "POST", SESSIONS_PATH, &body)?;

        let response = self
            .inner
            .http
            .post(format!("{}{SESSIONS_PATH}", self.inner.base_url))
            .header(reqwest::header::AUTHORIZATION, token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| FwError::Connectivity(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| FwError::Connectivity(e.to_string()))?;
        if !status.is_success() {
            return Err(FwError::Connectivity(error_message(&text, status)));
        }

        let result: ConnectResult = serde_json::from_str(&text)
            .map_err(|e| FwError::Connectivity(format!("malformed session response: {e}")))?;

        debug!(
            session = %result.session_id,
            identity = %identity.label,
            channel = %target.channel,
            contract = %target.contract,
            "gateway session opened"
        );

        Ok(SessionHandle {
            session_id: result.session_id,
            identity_label: identity.label.clone(),
            channel: target.channel.clone(),
            contract: target.contract.clone(),
        })
    }

    async fn submit(
        &self,
        session: &SessionHandle,
        function: &str,
        args: &[&str],
    ) -> Result<Vec<u8>> {
        self.transact(session, function, args, true).await
    }

    async fn evaluate(
        &self,
        session: &SessionHandle,
        function: &str,
        args: &[&str],
    ) -> Result<Vec<u8>> {
        self.transact(session, function, args, false).await
    }

    async fn disconnect(&self, session: &SessionHandle) -> Result<()> {
        let url = format!(
            "{}{SESSIONS_PATH}/{}",
            self.inner.base_url, session.session_id
        );
        let response = self
            .inner
            .http
            .delete(&url)
            .send()
            .await
            .map_err(|e| FwError::Connectivity(e.to_string()))?;

        let status = response.status();
        if status.is_success() || status == reqwest::StatusCode::NOT_FOUND {
            debug!(session = %session.session_id, "gateway session closed");
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(FwError::Connectivity(error_message(&body, status)))
        }
    }
}

/// Pull `error` out of a JSON error body, falling back to the raw text
fn error_message(body: &str, status: reqwest::StatusCode) -> String {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
        .unwrap_or_else(|| body.to_string());

    if message.is_empty() {
        format!("gateway returned {status}")
    } else {
        message
    }
}

/// Builder for configuring a [`LedgerClient`]
pub struct LedgerClientBuilder {
    base_url: String,
    timeout: Duration,
    user_agent: String,
    trust_roots: Vec<String>,
}

impl LedgerClientBuilder {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: default_user_agent(),
            trust_roots: Vec::new(),
        }
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

    /// Trust these PEM roots for the gateway's TLS certificate
    #[must_use]
    pub fn trust_roots(mut self, roots: Vec<String>) -> Self {
        self.trust_roots = roots;
        self
    }

    /// Build the client
    pub fn build(self) -> Result<LedgerClient> {
        let http = build_http_client(self.timeout, &self.user_agent, &self.trust_roots)?;
        Ok(LedgerClient {
            inner: Arc::new(LedgerInner {
                http,
                base_url: self.base_url,
            }),
        })
    }
}
