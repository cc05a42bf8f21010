//! Firmware endpoints.

use crate::FwClient;
use fwledger_core::{
    FirmwareByHashRequest, FirmwareInfoRequest, FirmwareInfoResponse, FirmwareRecord,
    MessageResponse, Result, UploadFirmwareRequest, VerifyFirmwareRequest, VerifyFirmwareResponse,
};

/// Firmware endpoints
pub struct FirmwareApi<'a> {
    client: &'a FwClient,
}

impl<'a> FirmwareApi<'a> {
    pub(crate) const fn new(client: &'a FwClient) -> Self {
        Self { client }
    }

    /// Publish a firmware release for a device type
    pub async fn upload(
        &self,
        device_type: &str,
        version: &str,
        hash: &str,
        download_url: &str,
    ) -> Result<MessageResponse> {
        self.client
            .post(
                "/uploadFirmware",
                &UploadFirmwareRequest {
                    device_type: Some(device_type.to_string()),
                    firmware_version: Some(version.to_string()),
                    firmware_hash: Some(hash.to_string()),
                    download_url: Some(download_url.to_string()),
                },
            )
            .await
    }

    /// Check a locally computed hash against the ledger's record
    pub async fn verify(&self, node_id: &str, version: &str, hash: &str) -> Result<bool> {
        let resp: VerifyFirmwareResponse = self
            .client
            .post(
                "/verifyFirmware",
                &VerifyFirmwareRequest {
                    node_id: Some(node_id.to_string()),
                    firmware_version: Some(version.to_string()),
                    firmware_hash: Some(hash.to_string()),
                },
            )
            .await?;
        Ok(resp.verified)
    }

    /// Look up a release by device type and version
    pub async fn info(&self, device_type: &str, version: &str) -> Result<FirmwareRecord> {
        let resp: FirmwareInfoResponse = self
            .client
            .post(
                "/getFirmwareInfo",
                &FirmwareInfoRequest {
                    device_type: Some(device_type.to_string()),
                    firmware_version: Some(version.to_string()),
                },
            )
            .await?;
        Ok(resp.firmware_info)
    }

    /// Look up a release by its image hash
    pub async fn by_hash(&self, device_type: &str, hash: &str) -> Result<FirmwareRecord> {
        let resp: FirmwareInfoResponse = self
            .client
            .post(
                "/getFirmwareByHash",
                &FirmwareByHashRequest {
                    device_type: Some(device_type.to_string()),
                    firmware_hash: Some(hash.to_string()),
                },
            )
            .await?;
        Ok(resp.firmware_info)
    }
}
