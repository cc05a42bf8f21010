use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use fwledger_core::{
    FirmwareByHashRequest, FirmwareInfoRequest, FirmwareInfoResponse, MessageResponse,
    UploadFirmwareRequest, VerifyFirmwareRequest, VerifyFirmwareResponse,
};
use tracing::{debug, info};

use super::{body, present};
use crate::api::types::{ApiError, ApiState, OrFail};
use crate::contract::FirmwareContract;

/// Publish a firmware release for a device type.
pub(crate) async fn upload_firmware(
    State(state): State<ApiState>,
    payload: Result<Json<UploadFirmwareRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let request = body(payload)?;
    let (Some(device_type), Some(version), Some(hash), Some(download_url)) = (
        present(request.device_type),
        present(request.firmware_version),
        present(request.firmware_hash),
        present(request.download_url),
    ) else {
        return Err(ApiError::bad_request(
            "deviceType, firmwareVersion, firmwareHash and downloadUrl are required",
        ));
    };

    let (kind, release) = (device_type.as_str(), version.as_str());
    state
        .sessions
        .scoped(|session| async move {
            FirmwareContract::new(&session)
                .upload_firmware(kind, release, &hash, &download_url)
                .await
        })
        .await
        .or_fail("Failed to upload firmware")?;

    info!(device_type = %device_type, version = %version, "firmware uploaded");
    Ok(Json(MessageResponse::new("Firmware uploaded successfully")))
}

/// Look up the node's device type, then have the contract check the hash
/// against the recorded release.
pub(crate) async fn verify_firmware(
    State(state): State<ApiState>,
    payload: Result<Json<VerifyFirmwareRequest>, JsonRejection>,
) -> Result<Json<VerifyFirmwareResponse>, ApiError> {
    let request = body(payload)?;
    let (Some(node_id), Some(version), Some(hash)) = (
        present(request.node_id),
        present(request.firmware_version),
        present(request.firmware_hash),
    ) else {
        return Err(ApiError::bad_request(
            "nodeId, firmwareVersion and firmwareHash are required",
        ));
    };

    let verified = state
        .sessions
        .scoped(|session| async move {
            let contract = FirmwareContract::new(&session);
            let node = contract.get_edge_node_info(&node_id).await?;
            debug!(node_id = %node_id, device_type = %node.device_type, "verifying firmware");
            contract
                .verify_firmware(&node_id, &node.device_type, &version, &hash)
                .await
        })
        .await
        .or_fail("Failed to verify firmware")?;

    Ok(Json(VerifyFirmwareResponse { verified }))
}

pub(crate) async fn get_firmware_info(
    State(state): State<ApiState>,
    payload: Result<Json<FirmwareInfoRequest>, JsonRejection>,
) -> Result<Json<FirmwareInfoResponse>, ApiError> {
    let request = body(payload)?;
    let (Some(device_type), Some(version)) =
        (present(request.device_type), present(request.firmware_version))
    else {
        return Err(ApiError::bad_request("deviceType and firmwareVersion are required"));
    };

    let firmware_info = state
        .sessions
        .scoped(|session| async move {
            FirmwareContract::new(&session)
                .get_firmware_info(&device_type, &version)
                .await
        })
        .await
        .or_fail("Failed to get firmware info")?;

    Ok(Json(FirmwareInfoResponse { firmware_info }))
}

pub(crate) async fn get_firmware_by_hash(
    State(state): State<ApiState>,
    payload: Result<Json<FirmwareByHashRequest>, JsonRejection>,
) -> Result<Json<FirmwareInfoResponse>, ApiError> {
    let request = body(payload)?;
    let (Some(device_type), Some(hash)) =
        (present(request.device_type), present(request.firmware_hash))
    else {
        return Err(ApiError::bad_request("deviceType and firmwareHash are required"));
    };

    let firmware_info = state
        .sessions
        .scoped(|session| async move {
            FirmwareContract::new(&session)
                .get_firmware_by_hash(&device_type, &hash)
                .await
        })
        .await
        .or_fail("Failed to get firmware by hash")?;

    Ok(Json(FirmwareInfoResponse { firmware_info }))
}
