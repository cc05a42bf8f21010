//! Command-line argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::output::OutputFormat;

/// Firmware publishing and verification on a permissioned ledger
///
/// Run the REST gateway, manage its identities, publish firmware, or run
/// the device-side update cycle.
#[derive(Parser, Debug)]
#[command(name = "fwledger")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Gateway config file (TOML)
    #[arg(
        short,
        long,
        env = "FWLEDGER_CONFIG",
        default_value = "fwledger.toml",
        global = true
    )]
    pub config: PathBuf,

    /// Output format
    #[arg(short, long, global = true, value_enum)]
    pub output: Option<OutputFormat>,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the REST gateway
    Serve(ServeArgs),

    /// Enroll the administrator identity with the CA
    EnrollAdmin,

    /// Register and enroll a device identity
    EnrollNode(EnrollNodeArgs),

    /// List identities in the credential store
    Identities,

    /// Publish a firmware image through a gateway
    Upload(UploadArgs),

    /// Run the device update cycle against a gateway
    Update(UpdateArgs),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Listen address (overrides the config file)
    #[arg(short, long)]
    pub listen: Option<std::net::SocketAddr>,
}

#[derive(Args, Debug)]
pub struct EnrollNodeArgs {
    /// Node id, used as enrollment id and wallet label
    pub node_id: String,
}

/// Where and how to reach the gateway API.
#[derive(Args, Debug)]
pub struct GatewayArgs {
    /// Gateway API base URL including the prefix
    #[arg(long, env = "FWLEDGER_API_URL", default_value = "http://127.0.0.1:3000/api")]
    pub api_url: String,

    /// PEM trust root for the gateway's TLS certificate
    #[arg(long, env = "FWLEDGER_CA_CERT")]
    pub ca_cert: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Device type the firmware targets
    #[arg(long)]
    pub device_type: String,

    /// Firmware version
    #[arg(long = "firmware-version")]
    pub firmware_version: String,

    /// Firmware image; its SHA-256 is what gets recorded
    pub image: PathBuf,

    /// URL devices download the image from
    #[arg(long)]
    pub download_url: String,

    #[command(flatten)]
    pub gateway: GatewayArgs,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// This device's node id
    #[arg(long, env = "FWLEDGER_NODE_ID")]
    pub node_id: String,

    /// This device's type
    #[arg(long, env = "FWLEDGER_DEVICE_TYPE")]
    pub device_type: String,

    /// Where the firmware image is installed
    #[arg(long, default_value = "firmware.bin")]
    pub firmware_path: PathBuf,

    #[command(flatten)]
    pub gateway: GatewayArgs,
}
