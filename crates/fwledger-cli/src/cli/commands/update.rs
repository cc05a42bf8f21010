//! `fwledger update` - Device-side update cycle.
//!
//! register -> current version -> check for update -> download -> hash
//! check -> verify -> install -> re-hash -> verify -> submit. Any mismatch
//! or failed verification stops before the ledger is told about the new
//! version.

use anyhow::Result;
use colored::Colorize;
use fwledger_client::hash::sha256_file;
use fwledger_client::FwClient;
use fwledger_core::{is_version_greater, FirmwareRecord, FwError};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::Context;
use crate::cli::args::UpdateArgs;
use crate::output::print_json;

/// What an update run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "camelCase")]
pub enum UpdateOutcome {
    UpToDate {
        version: String,
    },
    Updated {
        from: String,
        to: String,
        hash: String,
    },
}

pub async fn execute(ctx: Context, args: UpdateArgs) -> Result<()> {
    let client = ctx.api_client(&args.gateway)?;
    let outcome = run_update(
        &client,
        &args.node_id,
        &args.device_type,
        &args.firmware_path,
    )
    .await?;

    if ctx.json() {
        return print_json(&outcome);
    }
    match outcome {
        UpdateOutcome::UpToDate { version } => {
            println!("{} is up to date ({version})", args.node_id);
        }
        UpdateOutcome::Updated { from, to, .. } => {
            let to = if ctx.no_color {
                to.as_str().normal()
            } else {
                to.as_str().green().bold()
            };
            println!("{} updated {from} -> {to}", args.node_id);
        }
    }
    Ok(())
}

/// Run one update cycle for `node_id`, installing to `firmware_path`.
pub async fn run_update(
    client: &FwClient,
    node_id: &str,
    device_type: &str,
    firmware_path: &Path,
) -> std::result::Result<UpdateOutcome, FwError> {
    let nodes = client.nodes();

    match nodes.register(node_id, device_type).await {
        Ok(_) => info!(node_id = node_id, "node registered"),
        Err(e) if already_registered(&e) => debug!(node_id = node_id, "node already registered"),
        Err(e) => return Err(e),
    }

    let current = nodes.current_version(node_id).await?;
    info!(node_id = node_id, version = %current, "current firmware version");

    let Some(firmware) = nodes.check_for_update(node_id).await?.firmware().transpose()? else {
        return Ok(UpdateOutcome::UpToDate { version: current });
    };
    if !is_version_greater(&firmware.version, &current) {
        warn!(
            offered = %firmware.version,
            current = %current,
            "offered firmware is not newer, skipping"
        );
        return Ok(UpdateOutcome::UpToDate { version: current });
    }
    info!(version = %firmware.version, url = %firmware.download_url, "update available");

    let staging = staging_path(firmware_path);
    if let Err(e) = stage(client, node_id, &firmware, &staging).await {
        discard(&staging).await;
        return Err(e);
    }

    tokio::fs::rename(&staging, firmware_path).await?;
    info!(path = %firmware_path.display(), "firmware installed");

    check_and_verify(
        client,
        node_id,
        &firmware.version,
        &firmware.hash,
        firmware_path,
    )
    .await?;

    nodes.submit_update(node_id, &firmware.version).await?;
    info!(node_id = node_id, version = %firmware.version, "update submitted");

    Ok(UpdateOutcome::Updated {
        from: current,
        to: firmware.version,
        hash: firmware.hash,
    })
}

/// Download the image to `staging` and check it there.
async fn stage(
    client: &FwClient,
    node_id: &str,
    firmware: &FirmwareRecord,
    staging: &Path,
) -> std::result::Result<(), FwError> {
    let bytes = client.download_to(&firmware.download_url, staging).await?;
    debug!(bytes = bytes, path = %staging.display(), "firmware downloaded");
    check_and_verify(client, node_id, &firmware.version, &firmware.hash, staging).await
}

async fn discard(staging: &Path) {
    match tokio::fs::remove_file(staging).await {
        Ok(()) => debug!(path = %staging.display(), "staged image removed"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %staging.display(), error = %e, "failed to remove staged image"),
    }
}

/// Hash `path`, compare with the ledger's hash, then have the gateway
/// verify it.
async fn check_and_verify(
    client: &FwClient,
    node_id: &str,
    version: &str,
    expected: &str,
    path: &Path,
) -> std::result::Result<(), FwError> {
    let actual = sha256_file(path).await?;
    if !actual.eq_ignore_ascii_case(expected) {
        return Err(FwError::HashMismatch {
            expected: expected.to_string(),
            actual,
        });
    }
    if !client.firmware().verify(node_id, version, &actual).await? {
        return Err(FwError::Rejected(format!(
            "ledger did not verify firmware {version} for {node_id}"
        )));
    }
    Ok(())
}

fn already_registered(err: &FwError) -> bool {
    matches!(err, FwError::Api { message, .. } if message.contains("already registered"))
}

fn staging_path(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_else(|| "firmware".into());
    name.push(".download");
    target.with_file_name(name)
}
