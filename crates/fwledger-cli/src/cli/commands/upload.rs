//! `fwledger upload` - Publish a firmware image through a gateway.

use anyhow::Result;
use fwledger_client::hash::sha256_file;

use super::Context;
use crate::cli::args::UploadArgs;
use crate::output::print_json;

pub async fn execute(ctx: Context, args: UploadArgs) -> Result<()> {
    let client = ctx.api_client(&args.gateway)?;
    let hash = sha256_file(&args.image).await?;

    let response = client
        .firmware()
        .upload(&args.device_type, &args.firmware_version, &hash, &args.download_url)
        .await?;

    if ctx.json() {
        return print_json(&serde_json::json!({
            "message": response.message,
            "deviceType": args.device_type,
            "firmwareVersion": args.firmware_version,
            "firmwareHash": hash,
        }));
    }
    println!(
        "{} ({} {}, sha256 {hash})",
        response.message, args.device_type, args.firmware_version
    );
    Ok(())
}
