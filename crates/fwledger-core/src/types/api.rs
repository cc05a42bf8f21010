//! Request and response bodies of the REST API.
//!
//! Request fields are optional so the server can report every missing field
//! with a 400 instead of failing deserialization.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{FirmwareRecord, NodeRecord};

/// Body of `POST /registerNode`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterNodeRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
}

/// Body of `POST /uploadFirmware`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UploadFirmwareRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firmware_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firmware_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
}

/// Body of the node-scoped queries: `checkForUpdate`, `getCurrentVersion`
/// and `getNodeInfo`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
}

/// Body of `POST /verifyFirmware`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VerifyFirmwareRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firmware_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firmware_hash: Option<String>,
}

/// Body of `POST /submitUpdate`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SubmitUpdateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firmware_version: Option<String>,
}

/// Body of `POST /getFirmwareInfo`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FirmwareInfoRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firmware_version: Option<String>,
}

/// Body of `POST /getFirmwareByHash`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FirmwareByHashRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firmware_hash: Option<String>,
}

/// Plain acknowledgement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Answer of `POST /checkForUpdate`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckForUpdateResponse {
    pub update_available: bool,

    /// Latest firmware for the node's device type, as returned by the
    /// contract
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firmware_info: Option<Value>,
}

impl CheckForUpdateResponse {
    /// Decode the firmware info into a typed record, if present
    pub fn firmware(&self) -> Option<serde_json::Result<FirmwareRecord>> {
        self.firmware_info
            .clone()
            .map(serde_json::from_value::<FirmwareRecord>)
    }
}

/// Answer of `POST /verifyFirmware`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyFirmwareResponse {
    pub verified: bool,
}

/// Answer of `POST /getCurrentVersion`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentVersionResponse {
    pub current_version: String,
}

/// Answer of `POST /getNodeInfo`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInfoResponse {
    pub node_info: NodeRecord,
}

/// Answer of `POST /getFirmwareInfo` and `POST /getFirmwareByHash`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirmwareInfoResponse {
    pub firmware_info: FirmwareRecord,
}

/// Error body returned with 4xx/5xx statuses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short summary of what failed
    pub error: String,

    /// Underlying error message (server errors only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Answer of `GET /health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
