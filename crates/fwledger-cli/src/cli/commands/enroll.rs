//! `fwledger enroll-admin`, `fwledger enroll-node` and `fwledger identities`.

use anyhow::Result;
use colored::Colorize;
use fwledger_core::Identity;
use fwledger_srv::wallet::{CredentialStore, FileSystemWallet};

use super::Context;
use crate::cli::args::EnrollNodeArgs;
use crate::output::print_json;

pub async fn admin(ctx: Context) -> Result<()> {
    let config = ctx.server_config()?;
    let identities = fwledger_srv::server::identity_manager(&config)?;
    let admin = identities.ensure_admin().await?;
    report(&ctx, &admin)
}

pub async fn node(ctx: Context, args: EnrollNodeArgs) -> Result<()> {
    let config = ctx.server_config()?;
    let identities = fwledger_srv::server::identity_manager(&config)?;
    let node = identities.ensure_node(&args.node_id).await?;
    report(&ctx, &node)
}

pub async fn list(ctx: Context) -> Result<()> {
    let config = ctx.server_config()?;
    let wallet = FileSystemWallet::new(&config.wallet_path);
    let labels = wallet.list().await?;

    if ctx.json() {
        return print_json(&labels);
    }
    if labels.is_empty() {
        println!("No identities in {}", wallet.path().display());
    }
    for label in labels {
        println!("{label}");
    }
    Ok(())
}

fn report(ctx: &Context, identity: &Identity) -> Result<()> {
    if ctx.json() {
        return print_json(&serde_json::json!({
            "label": identity.label,
            "mspId": identity.msp_id,
            "type": identity.identity_type(),
        }));
    }
    let label = if ctx.no_color {
        identity.label.as_str().normal()
    } else {
        identity.label.as_str().cyan().bold()
    };
    println!("{label} enrolled ({}, {})", identity.msp_id, identity.identity_type());
    Ok(())
}
