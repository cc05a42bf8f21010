//! `fwledger serve` - Run the REST gateway.

use anyhow::Result;
use tracing::info;

use super::Context;
use crate::cli::args::ServeArgs;

pub async fn execute(ctx: Context, args: ServeArgs) -> Result<()> {
    let mut config = ctx.server_config()?;
    if let Some(listen) = args.listen {
        config.listen = listen;
    }

    info!(
        config = %ctx.config_path.display(),
        gateway = %config.gateway_url,
        "starting fwledger gateway"
    );
    fwledger_srv::server::run(&config).await?;
    Ok(())
}
