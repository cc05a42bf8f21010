//! Streaming SHA-256 of firmware images via `ring::digest`.

use fwledger_core::Result;
use ring::digest::{Context, SHA256};
use std::path::Path;
use tokio::io::AsyncReadExt;

/// Buffer size for streaming file reads (64 KiB).
const BUF_SIZE: usize = 64 * 1024;

/// Compute SHA-256 of a file without loading it into memory.
///
/// Returns the lowercase hex digest, the format the ledger stores.
pub async fn sha256_file(path: &Path) -> Result<String> {
    let mut file = tokio::fs::File::open(path).await?;

    let mut context = Context::new(&SHA256);
    let mut buf = vec![0u8; BUF_SIZE];

    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        context.update(&buf[..n]);
    }

    Ok(hex::encode(context.finish().as_ref()))
}
