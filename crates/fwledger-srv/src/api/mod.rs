//! HTTP routes of the gateway.
//!
//! Every workflow is a `POST` with a JSON body. Missing fields yield 400
//! `{error}`; failures of the CA or ledger yield 500 `{error, details}`.

mod handlers;
mod types;

pub use types::{ApiError, ApiState};

use axum::{
    routing::{get, post},
    Router,
};

use handlers::{
    check_for_update, get_current_version, get_firmware_by_hash, get_firmware_info,
    get_node_info, health, register_node, submit_update, upload_firmware, verify_firmware,
};

/// Routes relative to the API prefix.
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/registerNode", post(register_node))
        .route("/uploadFirmware", post(upload_firmware))
        .route("/checkForUpdate", post(check_for_update))
        .route("/verifyFirmware", post(verify_firmware))
        .route("/submitUpdate", post(submit_update))
        .route("/getCurrentVersion", post(get_current_version))
        .route("/getNodeInfo", post(get_node_info))
        .route("/getFirmwareInfo", post(get_firmware_info))
        .route("/getFirmwareByHash", post(get_firmware_by_hash))
        .route("/health", get(health))
        .with_state(state)
}

/// Routes mounted under `prefix` (`""` or `"/"` mounts at the root).
pub fn app(state: ApiState, prefix: &str) -> Router {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        router(state)
    } else {
        Router::new().nest(&format!("/{prefix}"), router(state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::{sessions, FakeLedger};
    use crate::session::SessionManager;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn state(ledger: &Arc<FakeLedger>) -> (ApiState, Arc<SessionManager>) {
        let manager = Arc::new(sessions(Arc::clone(ledger)));
        (ApiState::new(Arc::clone(&manager)), manager)
    }

    async fn post_raw(app: Router, path: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    async fn post_json(app: Router, path: &str, body: Value) -> (StatusCode, Value) {
        post_raw(app, path, &body.to_string()).await
    }

    #[tokio::test]
    async fn test_missing_fields_are_400() {
        let ledger = Arc::new(FakeLedger::default());
        let (state, _) = state(&ledger);
        let cases = [
            (
                "/api/registerNode",
                json!({}),
                "nodeId and deviceType are required",
            ),
            (
                "/api/registerNode",
                json!({"nodeId": "n1", "deviceType": ""}),
                "nodeId and deviceType are required",
            ),
            (
                "/api/uploadFirmware",
                json!({"deviceType": "sensor", "firmwareVersion": "1.0"}),
                "deviceType, firmwareVersion, firmwareHash and downloadUrl are required",
            ),
            (
                "/api/checkForUpdate",
                json!({"nodeId": null}),
                "nodeId is required",
            ),
            (
                "/api/verifyFirmware",
                json!({"nodeId": "n1", "firmwareVersion": "1.0"}),
                "nodeId, firmwareVersion and firmwareHash are required",
            ),
            (
                "/api/submitUpdate",
                json!({"nodeId": "n1"}),
                "nodeId and firmwareVersion are required",
            ),
            ("/api/getCurrentVersion", json!({}), "nodeId is required"),
            ("/api/getNodeInfo", json!({}), "nodeId is required"),
            (
                "/api/getFirmwareInfo",
                json!({"deviceType": "sensor"}),
                "deviceType and firmwareVersion are required",
            ),
            (
                "/api/getFirmwareByHash",
                json!({"firmwareHash": "abc"}),
                "deviceType and firmwareHash are required",
            ),
        ];

        for (path, body, message) in cases {
            let (status, json) = post_json(app(state.clone(), "/api"), path, body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{path}");
            assert_eq!(json, json!({ "error": message }), "{path}");
        }
        assert!(ledger.calls().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_json_is_400() {
        let ledger = Arc::new(FakeLedger::default());
        let (state, _) = state(&ledger);

        let (status, json) = post_raw(app(state, "/api"), "/api/registerNode", "{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn test_register_node() {
        let ledger = Arc::new(FakeLedger::default());
        let (state, manager) = state(&ledger);
        manager.identities().ensure_admin().await.unwrap();

        let (status, json) = post_json(
            app(state, "/api"),
            "/api/registerNode",
            json!({"nodeId": "n1", "deviceType": "sensor"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!({"message": "Node registered successfully"}));

        let calls = ledger.calls();
        assert_eq!(calls[0].0, "RegisterNode");
        assert_eq!(calls[0].1, vec!["n1", "sensor"]);
        assert!(manager.identities().store().get("n1").await.unwrap().is_some());
        assert_eq!(ledger.live_sessions(), 0);
    }

    #[tokio::test]
    async fn test_register_node_without_admin_is_500() {
        let ledger = Arc::new(FakeLedger::default());
        let (state, _) = state(&ledger);

        let (status, json) = post_json(
            app(state, "/api"),
            "/api/registerNode",
            json!({"nodeId": "n1", "deviceType": "sensor"}),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "Failed to register node");
        assert!(json["details"].as_str().unwrap().contains("admin"));
        assert!(ledger.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failures_are_500_and_close_sessions() {
        let ledger = Arc::new(FakeLedger::default());
        for function in [
            "RegisterNode",
            "UploadFirmware",
            "CheckForUpdate",
            "GetEdgeNodeInfo",
            "UpdateNodeFirmwareVersion",
            "GetCurrentFirmwareVersion",
            "GetFirmwareInfo",
            "GetFirmwareByHash",
        ] {
            ledger.fail(function, "endorsement failure");
        }
        let (state, manager) = state(&ledger);
        manager.identities().ensure_admin().await.unwrap();

        let cases = [
            (
                "/api/registerNode",
                json!({"nodeId": "n1", "deviceType": "sensor"}),
                "Failed to register node",
            ),
            (
                "/api/uploadFirmware",
                json!({
                    "deviceType": "sensor",
                    "firmwareVersion": "1.0",
                    "firmwareHash": "h",
                    "downloadUrl": "u"
                }),
                "Failed to upload firmware",
            ),
            (
                "/api/checkForUpdate",
                json!({"nodeId": "n1"}),
                "Failed to check for update",
            ),
            (
                "/api/verifyFirmware",
                json!({"nodeId": "n1", "firmwareVersion": "1.0", "firmwareHash": "h"}),
                "Failed to verify firmware",
            ),
            (
                "/api/submitUpdate",
                json!({"nodeId": "n1", "firmwareVersion": "1.0"}),
                "Failed to submit firmware update",
            ),
            (
                "/api/getCurrentVersion",
                json!({"nodeId": "n1"}),
                "Failed to get current version",
            ),
            (
                "/api/getNodeInfo",
                json!({"nodeId": "n1"}),
                "Failed to get node info",
            ),
            (
                "/api/getFirmwareInfo",
                json!({"deviceType": "sensor", "firmwareVersion": "1.0"}),
                "Failed to get firmware info",
            ),
            (
                "/api/getFirmwareByHash",
                json!({"deviceType": "sensor", "firmwareHash": "h"}),
                "Failed to get firmware by hash",
            ),
        ];

        for (path, body, summary) in cases {
            let (status, json) = post_json(app(state.clone(), "/api"), path, body).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{path}");
            assert_eq!(json["error"], summary, "{path}");
            assert_eq!(json["details"], "endorsement failure", "{path}");
            assert_eq!(ledger.live_sessions(), 0, "{path}");
        }
        assert_eq!(manager.open_sessions(), 0);
    }

    #[tokio::test]
    async fn test_verify_firmware_late_failure_closes_session() {
        let ledger = Arc::new(FakeLedger::default());
        ledger.respond(
            "GetEdgeNodeInfo",
            r#"{"nodeId":"n1","deviceType":"sensor","currentVersion":"1.0.0","status":"Active","lastUpdated":"t"}"#,
        );
        ledger.fail("VerifyFirmware", "Firmware version 9 does not exist");
        let (state, manager) = state(&ledger);

        let (status, json) = post_json(
            app(state, "/api"),
            "/api/verifyFirmware",
            json!({"nodeId": "n1", "firmwareVersion": "9", "firmwareHash": "h"}),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "Failed to verify firmware");
        assert_eq!(json["details"], "Firmware version 9 does not exist");

        let calls = ledger.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].0, "VerifyFirmware");
        assert_eq!(ledger.live_sessions(), 0);
        assert_eq!(manager.open_sessions(), 0);
    }

    #[tokio::test]
    async fn test_check_for_update() {
        let ledger = Arc::new(FakeLedger::default());
        let (state, _) = state(&ledger);

        let (status, json) = post_json(
            app(state.clone(), "/api"),
            "/api/checkForUpdate",
            json!({"nodeId": "n1"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!({"updateAvailable": false}));

        ledger.respond(
            "CheckForUpdate",
            r#"{"deviceType":"sensor","version":"1.1.0","hash":"abc","downloadUrl":"http://fw/1.1.0.bin"}"#,
        );
        let (status, json) =
            post_json(app(state, "/api"), "/api/checkForUpdate", json!({"nodeId": "n1"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["updateAvailable"], true);
        assert_eq!(json["firmwareInfo"]["version"], "1.1.0");
        assert_eq!(ledger.live_sessions(), 0);
    }

    #[tokio::test]
    async fn test_check_for_update_non_json_payload_is_500() {
        let ledger = Arc::new(FakeLedger::default());
        ledger.respond("CheckForUpdate", "garbage");
        let (state, _) = state(&ledger);

        let (status, json) =
            post_json(app(state, "/api"), "/api/checkForUpdate", json!({"nodeId": "n1"})).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "Failed to check for update");
    }

    #[tokio::test]
    async fn test_verify_firmware() {
        let ledger = Arc::new(FakeLedger::default());
        ledger.respond(
            "GetEdgeNodeInfo",
            r#"{"nodeId":"n1","deviceType":"sensor","currentVersion":"1.0.0","status":"Active","lastUpdated":"t"}"#,
        );
        ledger.respond("VerifyFirmware", "true");
        let (state, _) = state(&ledger);

        let (status, json) = post_json(
            app(state, "/api"),
            "/api/verifyFirmware",
            json!({"nodeId": "n1", "firmwareVersion": "1.1.0", "firmwareHash": "abc"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!({"verified": true}));

        let calls = ledger.calls();
        assert_eq!(calls[1].0, "VerifyFirmware");
        assert_eq!(calls[1].1, vec!["n1", "sensor", "1.1.0", "abc"]);
    }

    #[tokio::test]
    async fn test_verify_firmware_unknown_node() {
        let ledger = Arc::new(FakeLedger::default());
        let (state, _) = state(&ledger);

        let (status, json) = post_json(
            app(state, "/api"),
            "/api/verifyFirmware",
            json!({"nodeId": "ghost", "firmwareVersion": "1.1.0", "firmwareHash": "abc"}),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "Failed to verify firmware");
        assert_eq!(json["details"], "Node info not found for nodeId ghost");
        assert_eq!(ledger.live_sessions(), 0);
    }

    #[tokio::test]
    async fn test_submit_update_and_current_version() {
        let ledger = Arc::new(FakeLedger::default());
        ledger.respond("GetCurrentFirmwareVersion", "1.1.0");
        let (state, _) = state(&ledger);

        let (status, json) = post_json(
            app(state.clone(), "/api"),
            "/api/submitUpdate",
            json!({"nodeId": "n1", "firmwareVersion": "1.1.0"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json,
            json!({"message": "Node firmware version updated successfully"})
        );

        let (status, json) = post_json(
            app(state, "/api"),
            "/api/getCurrentVersion",
            json!({"nodeId": "n1"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!({"currentVersion": "1.1.0"}));
    }

    #[tokio::test]
    async fn test_upload_firmware() {
        let ledger = Arc::new(FakeLedger::default());
        let (state, _) = state(&ledger);

        let (status, json) = post_json(
            app(state, "/api"),
            "/api/uploadFirmware",
            json!({
                "deviceType": "sensor",
                "firmwareVersion": "1.1.0",
                "firmwareHash": "abc",
                "downloadUrl": "http://fw/1.1.0.bin"
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!({"message": "Firmware uploaded successfully"}));
        assert_eq!(
            ledger.calls()[0].1,
            vec!["sensor", "1.1.0", "abc", "http://fw/1.1.0.bin"]
        );
    }

    #[tokio::test]
    async fn test_health_and_prefix() {
        let ledger = Arc::new(FakeLedger::default());
        let (state, _) = state(&ledger);

        let request = Request::builder()
            .uri("/v2/health")
            .body(Body::empty())
            .unwrap();
        let response = app(state.clone(), "/v2/").oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], "ok");

        let request = Request::builder()
            .uri("/api/health")
            .body(Body::empty())
            .unwrap();
        let response = app(state, "/v2").oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
