//! Node lifecycle endpoints.

use crate::FwClient;
use fwledger_core::{
    CheckForUpdateResponse, CurrentVersionResponse, MessageResponse, NodeInfoResponse,
    NodeRecord, NodeRequest, RegisterNodeRequest, Result, SubmitUpdateRequest,
};

/// Node lifecycle endpoints
pub struct NodeApi<'a> {
    client: &'a FwClient,
}

impl<'a> NodeApi<'a> {
    pub(crate) const fn new(client: &'a FwClient) -> Self {
        Self { client }
    }

    /// Enroll the node with the CA (if needed) and record it on the ledger
    pub async fn register(&self, node_id: &str, device_type: &str) -> Result<MessageResponse> {
        self.client
            .post(
                "/registerNode",
                &RegisterNodeRequest {
                    node_id: Some(node_id.to_string()),
                    device_type: Some(device_type.to_string()),
                },
            )
            .await
    }

    /// Firmware version the ledger has on record for the node
    pub async fn current_version(&self, node_id: &str) -> Result<String> {
        let resp: CurrentVersionResponse = self
            .client
            .post("/getCurrentVersion", &node_request(node_id))
            .await?;
        Ok(resp.current_version)
    }

    /// Ask whether newer firmware exists for the node's device type
    pub async fn check_for_update(&self, node_id: &str) -> Result<CheckForUpdateResponse> {
        self.client
            .post("/checkForUpdate", &node_request(node_id))
            .await
    }

    /// Record that the node now runs `firmware_version`
    pub async fn submit_update(
        &self,
        node_id: &str,
        firmware_version: &str,
    ) -> Result<MessageResponse> {
        self.client
            .post(
                "/submitUpdate",
                &SubmitUpdateRequest {
                    node_id: Some(node_id.to_string()),
                    firmware_version: Some(firmware_version.to_string()),
                },
            )
            .await
    }

    /// Full ledger record of the node
    pub async fn info(&self, node_id: &str) -> Result<NodeRecord> {
        let resp: NodeInfoResponse = self
            .client
            .post("/getNodeInfo", &node_request(node_id))
            .await?;
        Ok(resp.node_info)
    }
}

fn node_request(node_id: &str) -> NodeRequest {
    NodeRequest {
        node_id: Some(node_id.to_string()),
    }
}
