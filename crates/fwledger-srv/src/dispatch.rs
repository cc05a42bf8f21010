//! Transaction dispatch over an open session.

use fwledger_core::{FwError, Result};
use tracing::debug;

use crate::session::Session;

impl Session {
    /// Submit a transaction for endorsement and commit.
    ///
    /// Any failure is a [`FwError::Transaction`]; callers must assume
    /// nothing was committed.
    pub async fn submit(&self, function: &str, args: &[&str]) -> Result<Vec<u8>> {
        debug!(session = %self.id(), function = function, args = ?args, "submitting transaction");
        let payload = self
            .gateway
            .submit(&self.handle, function, args)
            .await
            .map_err(as_transaction_error)?;
        debug!(function = function, bytes = payload.len(), "transaction committed");
        Ok(payload)
    }

    /// Evaluate a read-only transaction. An empty payload means "no data".
    pub async fn evaluate(&self, function: &str, args: &[&str]) -> Result<Vec<u8>> {
        debug!(session = %self.id(), function = function, args = ?args, "evaluating transaction");
        let payload = self
            .gateway
            .evaluate(&self.handle, function, args)
            .await
            .map_err(as_transaction_error)?;
        debug!(function = function, bytes = payload.len(), "evaluation returned");
        Ok(payload)
    }
}

fn as_transaction_error(err: FwError) -> FwError {
    match err {
        FwError::Transaction(_) => err,
        other => FwError::Transaction(other.to_string()),
    }
}
