//! Server configuration for fwledger gateways.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Environment variable that overrides the admin enrollment secret.
pub const ADMIN_SECRET_ENV: &str = "FWLEDGER_ADMIN_SECRET";

/// Configuration for an fwledger REST gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP listen address (default: 0.0.0.0:3000).
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,

    /// Path prefix the API routes are mounted under (default: /api).
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Credential store directory.
    #[serde(default = "default_wallet_path")]
    pub wallet_path: PathBuf,

    /// Network connection profile (JSON).
    #[serde(default = "default_connection_profile")]
    pub connection_profile: PathBuf,

    /// Certificate authority key in the connection profile.
    #[serde(default = "default_ca_name")]
    pub ca_name: String,

    /// Membership service provider id; falls back to the profile's client
    /// organization.
    #[serde(default)]
    pub msp_id: Option<String>,

    /// Channel the firmware contract is deployed on.
    #[serde(default = "default_channel")]
    pub channel: String,

    /// Contract (chaincode) name.
    #[serde(default = "default_contract")]
    pub contract: String,

    /// Ledger gateway base URL.
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,

    /// PEM trust root for the ledger gateway's TLS certificate.
    #[serde(default)]
    pub gateway_tls_ca_cert: Option<PathBuf>,

    /// Timeout applied to every CA and gateway request (seconds).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Administrator identity.
    #[serde(default)]
    pub admin: AdminConfig,

    /// Registration defaults for device identities.
    #[serde(default)]
    pub node: NodeConfig,
}

/// Administrator identity bootstrap settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Credential store label (default: admin).
    #[serde(default = "default_admin")]
    pub label: String,

    /// Bootstrap enrollment id pre-registered in the CA (default: admin).
    #[serde(default = "default_admin")]
    pub enrollment_id: String,

    /// Bootstrap enrollment secret (default: adminpw).
    #[serde(default = "default_admin_secret")]
    pub secret: String,
}

/// How device identities are registered with the CA.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Identity type (default: client).
    #[serde(default = "default_node_role")]
    pub role: String,

    /// Affiliation (default: org1.department1).
    #[serde(default = "default_node_affiliation")]
    pub affiliation: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            api_prefix: default_api_prefix(),
            wallet_path: default_wallet_path(),
            connection_profile: default_connection_profile(),
            ca_name: default_ca_name(),
            msp_id: None,
            channel: default_channel(),
            contract: default_contract(),
            gateway_url: default_gateway_url(),
            gateway_tls_ca_cert: None,
            request_timeout_secs: default_request_timeout(),
            admin: AdminConfig::default(),
            node: NodeConfig::default(),
        }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            label: default_admin(),
            enrollment_id: default_admin(),
            secret: default_admin_secret(),
        }
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            role: default_node_role(),
            affiliation: default_node_affiliation(),
        }
    }
}

impl ServerConfig {
    /// Load config from a TOML file, falling back to defaults.
    ///
    /// The admin secret is taken from `FWLEDGER_ADMIN_SECRET` when set.
    pub fn load(path: &std::path::Path) -> crate::Result<Self> {
        let config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content).map_err(|e| crate::FwError::Config(e.to_string()))?
        } else {
            Self::default()
        };
        Ok(config.with_admin_secret(std::env::var(ADMIN_SECRET_ENV).ok()))
    }

    /// Replace the admin secret when an override is present and non-empty.
    #[must_use]
    pub fn with_admin_secret(mut self, secret: Option<String>) -> Self {
        if let Some(secret) = secret.filter(|s| !s.is_empty()) {
            self.admin.secret = secret;
        }
        self
    }

    /// Request timeout as a `Duration`.
    #[must_use]
    pub const fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }
}

// Default value functions for serde.
fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3000))
}

fn default_api_prefix() -> String {
    String::from("/api")
}

fn default_wallet_path() -> PathBuf {
    PathBuf::from("wallet")
}

fn default_connection_profile() -> PathBuf {
    PathBuf::from("connection.json")
}

fn default_ca_name() -> String {
    String::from("ca.org1.example.com")
}

fn default_channel() -> String {
    String::from("mychannel")
}

fn default_contract() -> String {
    String::from("firmware_chaincode")
}

fn default_gateway_url() -> String {
    String::from("http://localhost:8080")
}

const fn default_request_timeout() -> u64 {
    30
}

fn default_admin() -> String {
    String::from("admin")
}

fn default_admin_secret() -> String {
    String::from("adminpw")
}

fn default_node_role() -> String {
    String::from("client")
}

fn default_node_affiliation() -> String {
    String::from("org1.department1")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.listen.port(), 3000);
        assert_eq!(config.api_prefix, "/api");
        assert_eq!(config.channel, "mychannel");
        assert_eq!(config.contract, "firmware_chaincode");
        assert_eq!(config.admin.label, "admin");
        assert_eq!(config.admin.secret, "adminpw");
        assert_eq!(config.node.affiliation, "org1.department1");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ServerConfig = toml::from_str(
            r#"
            channel = "fwchannel"
            gateway_url = "https://gateway.example:8443"

            [admin]
            secret = "from-file"
            "#,
        )
        .unwrap();
        assert_eq!(config.channel, "fwchannel");
        assert_eq!(config.contract, "firmware_chaincode");
        assert_eq!(config.admin.label, "admin");
        assert_eq!(config.admin.secret, "from-file");
        assert_eq!(config.listen.port(), 3000);
    }

    #[test]
    fn test_admin_secret_override() {
        let config = ServerConfig::default().with_admin_secret(Some("vault-secret".into()));
        assert_eq!(config.admin.secret, "vault-secret");

        let config = ServerConfig::default().with_admin_secret(Some(String::new()));
        assert_eq!(config.admin.secret, "adminpw");
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config =
            ServerConfig::load(std::path::Path::new("/nonexistent/fwledger.toml")).unwrap();
        assert_eq!(config.wallet_path, PathBuf::from("wallet"));
    }

    #[test]
    fn test_config_serialization() {
        let config = ServerConfig::default();
        let text = toml::to_string(&config).unwrap();
        let parsed: ServerConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.listen, config.listen);
        assert_eq!(parsed.ca_name, config.ca_name);
    }
}
