//! Command implementations.

pub mod enroll;
pub mod serve;
pub mod update;
pub mod upload;

use anyhow::Context as _;
use fwledger_client::FwClient;
use fwledger_srv::ServerConfig;
use std::path::PathBuf;

use super::args::GatewayArgs;
use crate::output::OutputFormat;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Gateway config file
    pub config_path: PathBuf,

    /// Output format
    pub output_format: OutputFormat,

    /// Disable colors
    pub no_color: bool,
}

impl Context {
    /// Load the gateway config, falling back to defaults when the file is
    /// missing.
    pub fn server_config(&self) -> anyhow::Result<ServerConfig> {
        ServerConfig::load(&self.config_path)
            .with_context(|| format!("loading {}", self.config_path.display()))
    }

    /// Create an API client for the gateway.
    pub fn api_client(&self, gateway: &GatewayArgs) -> anyhow::Result<FwClient> {
        let mut builder = FwClient::builder().base_url(&gateway.api_url);
        if let Some(path) = &gateway.ca_cert {
            let pem = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            builder = builder.trust_root(pem);
        }
        Ok(builder.build()?)
    }

    pub const fn json(&self) -> bool {
        matches!(self.output_format, OutputFormat::Json)
    }
}
