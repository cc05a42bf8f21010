//! Typed calls into the firmware chaincode.

use fwledger_core::{FirmwareRecord, FwError, NodeRecord, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::session::Session;

/// The firmware contract as seen through one session.
#[derive(Debug, Clone, Copy)]
pub struct FirmwareContract<'a> {
    session: &'a Session,
}

impl<'a> FirmwareContract<'a> {
    #[must_use]
    pub const fn new(session: &'a Session) -> Self {
        Self { session }
    }

    pub async fn register_node(&self, node_id: &str, device_type: &str) -> Result<()> {
        self.session
            .submit("RegisterNode", &[node_id, device_type])
            .await?;
        Ok(())
    }

    pub async fn upload_firmware(
        &self,
        device_type: &str,
        version: &str,
        hash: &str,
        download_url: &str,
    ) -> Result<()> {
        self.session
            .submit("UploadFirmware", &[device_type, version, hash, download_url])
            .await?;
        Ok(())
    }

    /// Newer firmware for the node's device type, or `None` when it is up
    /// to date.
    ///
    /// The payload is passed through as JSON so fields the contract adds
    /// reach the device unchanged.
    pub async fn check_for_update(&self, node_id: &str) -> Result<Option<Value>> {
        let payload = self.session.evaluate("CheckForUpdate", &[node_id]).await?;
        if is_empty(&payload) {
            return Ok(None);
        }
        match serde_json::from_slice(&payload)? {
            Value::Null => Ok(None),
            info => Ok(Some(info)),
        }
    }

    pub async fn get_edge_node_info(&self, node_id: &str) -> Result<NodeRecord> {
        let payload = self.session.evaluate("GetEdgeNodeInfo", &[node_id]).await?;
        if is_empty(&payload) {
            return Err(FwError::Transaction(format!(
                "Node info not found for nodeId {node_id}"
            )));
        }
        decode(&payload)
    }

    /// Ask the contract to check `hash` against the recorded firmware for
    /// this node's device type.
    ///
    /// Submitted rather than evaluated so the verification is endorsed.
    pub async fn verify_firmware(
        &self,
        node_id: &str,
        device_type: &str,
        version: &str,
        hash: &str,
    ) -> Result<bool> {
        let payload = self
            .session
            .submit("VerifyFirmware", &[node_id, device_type, version, hash])
            .await?;
        if is_empty(&payload) {
            return Err(FwError::Transaction(
                "Result from VerifyFirmware is empty".into(),
            ));
        }
        Ok(String::from_utf8_lossy(&payload).trim() == "true")
    }

    pub async fn update_node_firmware_version(&self, node_id: &str, version: &str) -> Result<()> {
        self.session
            .submit("UpdateNodeFirmwareVersion", &[node_id, version])
            .await?;
        Ok(())
    }

    pub async fn get_current_firmware_version(&self, node_id: &str) -> Result<String> {
        let payload = self
            .session
            .evaluate("GetCurrentFirmwareVersion", &[node_id])
            .await?;
        Ok(String::from_utf8_lossy(&payload).into_owned())
    }

    pub async fn get_firmware_info(
        &self,
        device_type: &str,
        version: &str,
    ) -> Result<FirmwareRecord> {
        let payload = self
            .session
            .evaluate("GetFirmwareInfo", &[device_type, version])
            .await?;
        if is_empty(&payload) {
            return Err(FwError::Transaction(format!(
                "Firmware {version} not found for device type {device_type}"
            )));
        }
        decode(&payload)
    }

    pub async fn get_firmware_by_hash(
        &self,
        device_type: &str,
        hash: &str,
    ) -> Result<FirmwareRecord> {
        let payload = self
            .session
            .evaluate("GetFirmwareByHash", &[device_type, hash])
            .await?;
        if is_empty(&payload) {
            return Err(FwError::Transaction(format!(
                "Firmware with hash {hash} not found for device type {device_type}"
            )));
        }
        decode(&payload)
    }
}

fn is_empty(payload: &[u8]) -> bool {
    payload.iter().all(u8::is_ascii_whitespace)
}

fn decode<T: DeserializeOwned>(payload: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(payload)?)
}
