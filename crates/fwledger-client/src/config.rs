//! Client configuration: connection profile parsing and HTTP client setup.

use fwledger_core::{FwError, Result};
use reqwest::Client as HttpClient;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default User-Agent sent by every client in this crate
#[must_use]
pub fn default_user_agent() -> String {
    format!("fwledger/{}", env!("CARGO_PKG_VERSION"))
}

/// Network connection profile (the `connection.json` handed out by the
/// network operator).
///
/// Only the parts this system consumes are modelled: the client
/// organization and its MSP id, and the certificate authorities with their
/// TLS trust roots.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionProfile {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub client: Option<ClientSection>,

    #[serde(default)]
    pub organizations: HashMap<String, OrganizationSection>,

    #[serde(default)]
    pub certificate_authorities: HashMap<String, CaSection>,

    /// Directory the profile was loaded from, used to resolve relative
    /// certificate paths
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientSection {
    #[serde(default)]
    pub organization: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationSection {
    #[serde(default)]
    pub mspid: Option<String>,
    #[serde(default)]
    pub certificate_authorities: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaSection {
    pub url: String,
    #[serde(default)]
    pub ca_name: Option<String>,
    #[serde(default, rename = "tlsCACerts")]
    pub tls_ca_certs: Option<TlsCaCerts>,
}

/// TLS trust roots, inline or on disk
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TlsCaCerts {
    #[serde(default)]
    pub pem: Option<PemList>,
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Profiles carry either one PEM string or a list of them
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PemList {
    One(String),
    Many(Vec<String>),
}

impl PemList {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(pem) => vec![pem],
            Self::Many(pems) => pems,
        }
    }
}

/// Everything needed to reach one certificate authority
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaEndpoint {
    /// Base URL, e.g. `https://localhost:7054`
    pub url: String,
    /// CA instance name sent as `caname`
    pub ca_name: Option<String>,
    /// PEM trust roots for the CA's TLS certificate
    pub tls_ca_certs: Vec<String>,
}

impl ConnectionProfile {
    /// Load a connection profile from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            FwError::Config(format!(
                "failed to read connection profile {}: {e}",
                path.display()
            ))
        })?;
        let mut profile = Self::from_json(&content)?;
        profile.base_dir = path.parent().map(Path::to_path_buf);
        Ok(profile)
    }

    /// Parse a connection profile from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| FwError::Config(format!("invalid connection profile: {e}")))
    }

    /// MSP id of the client organization, if the profile names one.
    #[must_use]
    pub fn client_msp_id(&self) -> Option<&str> {
        let org = self.client.as_ref()?.organization.as_deref()?;
        self.organizations.get(org)?.mspid.as_deref()
    }

    /// Resolve a certificate authority by its profile key.
    ///
    /// Trust roots are taken from `tlsCACerts.pem` when present, otherwise
    /// read from `tlsCACerts.path` (relative to the profile's directory).
    pub fn certificate_authority(&self, name: &str) -> Result<CaEndpoint> {
        let section = self.certificate_authorities.get(name).ok_or_else(|| {
            FwError::Config(format!(
                "certificate authority {name} not found in connection profile"
            ))
        })?;

        let tls_ca_certs = match &section.tls_ca_certs {
            Some(TlsCaCerts { pem: Some(pem), .. }) => pem.clone().into_vec(),
            Some(TlsCaCerts {
                pem: None,
                path: Some(path),
            }) => {
                let resolved = match &self.base_dir {
                    Some(dir) if path.is_relative() => dir.join(path),
                    _ => path.clone(),
                };
                let pem = std::fs::read_to_string(&resolved).map_err(|e| {
                    FwError::Config(format!(
                        "failed to read CA TLS certificate {}: {e}",
                        resolved.display()
                    ))
                })?;
                vec![pem]
            }
            _ => Vec::new(),
        };

        Ok(CaEndpoint {
            url: section.url.trim_end_matches('/').to_string(),
            ca_name: section.ca_name.clone(),
            tls_ca_certs,
        })
    }
}

/// Build a reqwest client with the given timeout, User-Agent and extra PEM
/// trust roots.
pub fn build_http_client(
    timeout: Duration,
    user_agent: &str,
    trust_roots: &[String],
) -> Result<HttpClient> {
    let mut builder = HttpClient::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .gzip(true);

    for pem in trust_roots {
        let cert = reqwest::Certificate::from_pem(pem.as_bytes())
            .map_err(|e| FwError::Config(format!("invalid TLS trust root: {e}")))?;
        builder = builder.add_root_certificate(cert);
    }

    builder
        .build()
        .map_err(|e| FwError::Config(format!("failed to build HTTP client: {e}")))
}
