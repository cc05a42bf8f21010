//! Certificate authority client.
//!
//! Registers enrollment ids on behalf of a registrar identity and enrolls
//! them into signed X.509 certificates over the CA's REST API.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use fwledger_core::{Enrollment, EnrollmentRequest, FwError, Identity, Result};
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::{build_http_client, default_user_agent, CaEndpoint, DEFAULT_TIMEOUT};
use crate::signer;

const REGISTER_PATH: &str = "/api/v1/register";
const ENROLL_PATH: &str = "/api/v1/enroll";

/// Issues credentials: register an enrollment id, then enroll it.
#[async_trait]
pub trait CertificateAuthority: Send + Sync {
    /// Register `request` with the CA, acting as `registrar`.
    ///
    /// Returns the one-time enrollment secret.
    async fn register(&self, request: &EnrollmentRequest, registrar: &Identity) -> Result<String>;

    /// Enroll `enrollment_id` with its secret, returning a signed
    /// certificate and the locally generated private key.
    async fn enroll(&self, enrollment_id: &str, secret: &str) -> Result<Enrollment>;
}

/// REST client for the certificate authority
#[derive(Clone)]
pub struct CaClient {
    inner: Arc<CaInner>,
}

struct CaInner {
    http: HttpClient,
    base_url: String,
    ca_name: Option<String>,
}

#[derive(Serialize)]
struct RegisterBody<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    role: &'a str,
    affiliation: &'a str,
    max_enrollments: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    caname: Option<&'a str>,
}

#[derive(Serialize)]
struct EnrollBody<'a> {
    certificate_request: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    caname: Option<&'a str>,
}

/// Envelope wrapping every CA response
#[derive(Deserialize)]
struct CaResponse<T> {
    #[serde(default)]
    success: bool,
    result: Option<T>,
    #[serde(default)]
    errors: Vec<CaMessage>,
}

#[derive(Deserialize)]
struct CaMessage {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
struct RegisterResult {
    secret: String,
}

#[derive(Deserialize)]
struct EnrollResult {
    #[serde(rename = "Cert")]
    cert: String,
}

impl CaClient {
    /// Create a client for a connection-profile endpoint
    pub fn new(endpoint: &CaEndpoint, timeout: Duration) -> Result<Self> {
        CaClientBuilder::new(endpoint.url.clone())
            .ca_name(endpoint.ca_name.clone())
            .trust_roots(endpoint.tls_ca_certs.clone())
            .timeout(timeout)
            .build()
    }

    /// Create a builder for custom configuration
    #[must_use]
    pub fn builder(base_url: impl Into<String>) -> CaClientBuilder {
        CaClientBuilder::new(base_url)
    }

    async fn post<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T> {
        debug!(path, "CA request");

        let response = request
            .send()
            .await
            .map_err(|e| FwError::Authority(format!("CA unavailable: {e}")))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FwError::Authority(e.to_string()))?;

        let envelope: CaResponse<T> = serde_json::from_str(&body).map_err(|_| {
            FwError::Authority(format!("unexpected CA response ({status}): {body}"))
        })?;

        if !status.is_success() || !envelope.success {
            let message = envelope
                .errors
                .first()
                .map(|e| format!("{} (code {})", e.message, e.code))
                .unwrap_or_else(|| format!("request failed with status {status}"));
            return Err(FwError::Authority(message));
        }

        envelope
            .result
            .ok_or_else(|| FwError::Authority("CA response carried no result".into()))
    }
}

#[async_trait]
impl CertificateAuthority for CaClient {
    async fn register(&self, request: &EnrollmentRequest, registrar: &Identity) -> Result<String> {
        let body = serde_json::to_vec(&RegisterBody {
            id: &request.enrollment_id,
            role: &request.role,
            affiliation: &request.affiliation,
            max_enrollments: 1,
            caname: self.inner.ca_name.as_deref(),
        })?;
        let token = signer::auth_token(registrar, "POST", REGISTER_PATH, &body)?;

        let http = self
            .inner
            .http
            .post(format!("{}{REGISTER_PATH}", self.inner.base_url))
            .header(reqwest::header::AUTHORIZATION, token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body);

        let result: RegisterResult = self.post(REGISTER_PATH, http).await?;
        debug!(enrollment_id = %request.enrollment_id, "registered with CA");
        Ok(result.secret)
    }

    async fn enroll(&self, enrollment_id: &str, secret: &str) -> Result<Enrollment> {
        let csr = signer::generate_csr(enrollment_id)?;
        let body = EnrollBody {
            certificate_request: &csr.csr_pem,
            caname: self.inner.ca_name.as_deref(),
        };

        let http = self
            .inner
            .http
            .post(format!("{}{ENROLL_PATH}", self.inner.base_url))
            .basic_auth(enrollment_id, Some(secret))
            .json(&body);

        let result: EnrollResult = self.post(ENROLL_PATH, http).await?;
        let cert = B64
            .decode(result.cert.as_bytes())
            .map_err(|e| FwError::Authority(format!("invalid certificate encoding: {e}")))?;
        let certificate = String::from_utf8(cert)
            .map_err(|e| FwError::Authority(format!("certificate is not PEM text: {e}")))?;

        debug!(enrollment_id, "enrolled with CA");
        Ok(Enrollment {
            certificate,
            private_key: csr.key_pem,
        })
    }
}

/// Builder for configuring a [`CaClient`]
pub struct CaClientBuilder {
    base_url: String,
    ca_name: Option<String>,
    timeout: Duration,
    user_agent: String,
    trust_roots: Vec<String>,
}

impl CaClientBuilder {
    /// Create a new builder for the CA at `base_url`
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ca_name: None,
            timeout: DEFAULT_TIMEOUT,
            user_agent: default_user_agent(),
            trust_roots: Vec::new(),
        }
    }

    /// Set the CA instance name sent with every request
    #[must_use]
    pub fn ca_name(mut self, name: Option<String>) -> Self {
        self.ca_name = name;
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

    /// Trust these PEM roots for the CA's TLS certificate
    #[must_use]
    pub fn trust_roots(mut self, roots: Vec<String>) -> Self {
        self.trust_roots = roots;
        self
    }

    /// Build the client
    pub fn build(self) -> Result<CaClient> {
        let http = build_http_client(self.timeout, &self.user_agent, &self.trust_roots)?;
        Ok(CaClient {
            inner: Arc::new(CaInner {
                http,
                base_url: self.base_url,
                ca_name: self.ca_name,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn registrar() -> Identity {
        Identity {
            label: "admin".into(),
            certificate: "-----BEGIN CERTIFICATE-----\nADMIN\n-----END CERTIFICATE-----\n".into(),
            private_key: signer::generate_csr("admin").unwrap().key_pem,
            msp_id: "Org1MSP".into(),
        }
    }

    fn client(server: &MockServer) -> CaClient {
        let endpoint = CaEndpoint {
            url: server.uri(),
            ca_name: Some("ca-org1".into()),
            tls_ca_certs: Vec::new(),
        };
        CaClient::new(&endpoint, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_register_returns_secret() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/register"))
            .and(header_exists("authorization"))
            .and(body_partial_json(serde_json::json!({
                "id": "node-1",
                "type": "client",
                "affiliation": "org1.department1",
                "caname": "ca-org1"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "success": true,
                "result": { "secret": "s3cr3t" },
                "errors": [],
                "messages": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = EnrollmentRequest::new("node-1", "client", "org1.department1");
        let secret = client(&server).register(&request, &registrar()).await.unwrap();
        assert_eq!(secret, "s3cr3t");
    }

    #[tokio::test]
    async fn test_register_duplicate_is_authority_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/register"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "success": false,
                "result": null,
                "errors": [{ "code": 74, "message": "Identity 'node-1' is already registered" }],
                "messages": []
            })))
            .mount(&server)
            .await;

        let request = EnrollmentRequest::new("node-1", "client", "org1.department1");
        let err = client(&server)
            .register(&request, &registrar())
            .await
            .unwrap_err();
        match err {
            FwError::Authority(message) => assert!(message.contains("already registered")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_enroll_decodes_certificate() {
        let server = MockServer::start().await;
        let pem = "-----BEGIN CERTIFICATE-----\nNODE\n-----END CERTIFICATE-----\n";
        Mock::given(method("POST"))
            .and(path("/api/v1/enroll"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "success": true,
                "result": { "Cert": B64.encode(pem), "ServerInfo": { "CAName": "ca-org1" } },
                "errors": [],
                "messages": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let enrollment = client(&server).enroll("node-1", "s3cr3t").await.unwrap();
        assert_eq!(enrollment.certificate, pem);
        assert!(enrollment.private_key.contains("BEGIN PRIVATE KEY"));
    }

    #[tokio::test]
    async fn test_enroll_wrong_secret() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/enroll"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "success": false,
                "result": null,
                "errors": [{ "code": 20, "message": "Authentication failure" }],
                "messages": []
            })))
            .mount(&server)
            .await;

        let err = client(&server).enroll("node-1", "wrong").await.unwrap_err();
        assert!(matches!(err, FwError::Authority(_)));
    }

    #[tokio::test]
    async fn test_unreachable_ca() {
        let ca = CaClient::builder("http://127.0.0.1:1")
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap();
        let err = ca.enroll("admin", "adminpw").await.unwrap_err();
        assert!(matches!(err, FwError::Authority(_)));
    }
}
