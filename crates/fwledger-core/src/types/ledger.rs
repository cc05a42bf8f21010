use serde::{Deserialize, Serialize};

/// Edge node state as stored on the ledger by the firmware contract
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    /// Node identifier
    #[serde(alias = "NodeID")]
    pub node_id: String,

    /// Device type the node runs firmware for
    #[serde(alias = "DeviceType")]
    pub device_type: String,

    /// Firmware version currently installed on the node
    #[serde(default, alias = "CurrentVersion")]
    pub current_version: String,

    /// Lifecycle status, e.g. `Registered`
    #[serde(default, alias = "Status")]
    pub status: String,

    /// RFC 3339 timestamp of the last ledger update
    #[serde(default, alias = "LastUpdated")]
    pub last_updated: String,
}

/// Firmware release as stored on the ledger by the firmware contract
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirmwareRecord {
    /// Device type this firmware targets
    pub device_type: String,

    /// Firmware version string
    pub version: String,

    /// Lowercase hex SHA-256 of the firmware image
    pub hash: String,

    /// Where devices download the image from
    pub download_url: String,

    /// Identity that uploaded the release
    #[serde(default)]
    pub developer: String,

    /// RFC 3339 upload timestamp
    #[serde(default)]
    pub upload_time: String,
}
