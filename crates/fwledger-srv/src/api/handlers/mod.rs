mod firmware;
mod nodes;

pub(crate) use firmware::{
    get_firmware_by_hash, get_firmware_info, upload_firmware, verify_firmware,
};
pub(crate) use nodes::{
    check_for_update, get_current_version, get_node_info, register_node, submit_update,
};

use axum::{extract::rejection::JsonRejection, Json};
use fwledger_core::HealthResponse;

use super::types::ApiError;

pub(crate) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

/// Unwrap a JSON body, turning extractor rejections into 400s.
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

/// A field counts as present only when it is a non-empty string.
fn present(field: Option<String>) -> Option<String> {
    field.filter(|value| !value.is_empty())
}
