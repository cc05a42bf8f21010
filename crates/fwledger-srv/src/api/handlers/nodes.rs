use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use fwledger_core::{
    CheckForUpdateResponse, CurrentVersionResponse, MessageResponse, NodeInfoResponse,
    NodeRequest, RegisterNodeRequest, SubmitUpdateRequest,
};
use tracing::{debug, info};

use super::{body, present};
use crate::api::types::{ApiError, ApiState, OrFail};
use crate::contract::FirmwareContract;

/// Enroll the node's identity if needed, then record it on the ledger.
pub(crate) async fn register_node(
    State(state): State<ApiState>,
    payload: Result<Json<RegisterNodeRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    const FAILED: &str = "Failed to register node";

    let request = body(payload)?;
    let (Some(node_id), Some(device_type)) =
        (present(request.node_id), present(request.device_type))
    else {
        return Err(ApiError::bad_request("nodeId and deviceType are required"));
    };
    debug!(node_id = %node_id, device_type = %device_type, "registering node");

    state
        .sessions
        .identities()
        .ensure_node(&node_id)
        .await
        .or_fail(FAILED)?;

    let (id, kind) = (node_id.as_str(), device_type.as_str());
    state
        .sessions
        .scoped(|session| async move {
            FirmwareContract::new(&session).register_node(id, kind).await
        })
        .await
        .or_fail(FAILED)?;

    info!(node_id = %node_id, device_type = %device_type, "node registered");
    Ok(Json(MessageResponse::new("Node registered successfully")))
}

pub(crate) async fn check_for_update(
    State(state): State<ApiState>,
    payload: Result<Json<NodeRequest>, JsonRejection>,
) -> Result<Json<CheckForUpdateResponse>, ApiError> {
    let request = body(payload)?;
    let Some(node_id) = present(request.node_id) else {
        return Err(ApiError::bad_request("nodeId is required"));
    };

    let firmware_info = state
        .sessions
        .scoped(|session| async move {
            FirmwareContract::new(&session)
                .check_for_update(&node_id)
                .await
        })
        .await
        .or_fail("Failed to check for update")?;

    Ok(Json(CheckForUpdateResponse {
        update_available: firmware_info.is_some(),
        firmware_info,
    }))
}

/// Record the version a node now runs.
pub(crate) async fn submit_update(
    State(state): State<ApiState>,
    payload: Result<Json<SubmitUpdateRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let request = body(payload)?;
    let (Some(node_id), Some(version)) =
        (present(request.node_id), present(request.firmware_version))
    else {
        return Err(ApiError::bad_request("nodeId and firmwareVersion are required"));
    };

    let (id, new_version) = (node_id.as_str(), version.as_str());
    state
        .sessions
        .scoped(|session| async move {
            FirmwareContract::new(&session)
                .update_node_firmware_version(id, new_version)
                .await
        })
        .await
        .or_fail("Failed to submit firmware update")?;

    info!(node_id = %node_id, version = %version, "node firmware version updated");
    Ok(Json(MessageResponse::new(
        "Node firmware version updated successfully",
    )))
}

pub(crate) async fn get_current_version(
    State(state): State<ApiState>,
    payload: Result<Json<NodeRequest>, JsonRejection>,
) -> Result<Json<CurrentVersionResponse>, ApiError> {
    let request = body(payload)?;
    let Some(node_id) = present(request.node_id) else {
        return Err(ApiError::bad_request("nodeId is required"));
    };

    let current_version = state
        .sessions
        .scoped(|session| async move {
            FirmwareContract::new(&session)
                .get_current_firmware_version(&node_id)
                .await
        })
        .await
        .or_fail("Failed to get current version")?;

    Ok(Json(CurrentVersionResponse { current_version }))
}

pub(crate) async fn get_node_info(
    State(state): State<ApiState>,
    payload: Result<Json<NodeRequest>, JsonRejection>,
) -> Result<Json<NodeInfoResponse>, ApiError> {
    let request = body(payload)?;
    let Some(node_id) = present(request.node_id) else {
        return Err(ApiError::bad_request("nodeId is required"));
    };

    let node_info = state
        .sessions
        .scoped(|session| async move {
            FirmwareContract::new(&session)
                .get_edge_node_info(&node_id)
                .await
        })
        .await
        .or_fail("Failed to get node info")?;

    Ok(Json(NodeInfoResponse { node_info }))
}
