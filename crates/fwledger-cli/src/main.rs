//! fwledger - firmware gateway and device updater.

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    fwledger_cli::run().await
}
