//! Identity manager: makes sure the administrator and device identities
//! exist in the credential store, enrolling them with the CA on first use.

use fwledger_client::CertificateAuthority;
use fwledger_core::{EnrollmentRequest, FwError, Identity, Result};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::ServerConfig;
use crate::wallet::CredentialStore;

/// Enrollment parameters for the administrator and device identities.
#[derive(Debug, Clone)]
pub struct IdentitySettings {
    pub msp_id: String,
    pub admin_label: String,
    pub admin_enrollment_id: String,
    pub admin_secret: String,
    pub node_role: String,
    pub node_affiliation: String,
}

impl IdentitySettings {
    /// Take enrollment parameters from the server config.
    #[must_use]
    pub fn from_config(config: &ServerConfig, msp_id: impl Into<String>) -> Self {
        Self {
            msp_id: msp_id.into(),
            admin_label: config.admin.label.clone(),
            admin_enrollment_id: config.admin.enrollment_id.clone(),
            admin_secret: config.admin.secret.clone(),
            node_role: config.node.role.clone(),
            node_affiliation: config.node.affiliation.clone(),
        }
    }
}

impl Default for IdentitySettings {
    fn default() -> Self {
        Self::from_config(&ServerConfig::default(), "Org1MSP")
    }
}

/// Creates identities on demand and hands out stored ones.
pub struct IdentityManager {
    store: Arc<dyn CredentialStore>,
    ca: Arc<dyn CertificateAuthority>,
    settings: IdentitySettings,
    enroll_lock: Mutex<()>,
}

impl IdentityManager {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        ca: Arc<dyn CertificateAuthority>,
        settings: IdentitySettings,
    ) -> Self {
        Self {
            store,
            ca,
            settings,
            enroll_lock: Mutex::new(()),
        }
    }

    /// Label the administrator identity is stored under.
    #[must_use]
    pub fn admin_label(&self) -> &str {
        &self.settings.admin_label
    }

    /// Underlying credential store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// Return the administrator identity, enrolling it first if needed.
    ///
    /// The bootstrap administrator is pre-registered in the CA, so only an
    /// enroll call is made. A stored admin is returned without contacting
    /// the CA.
    pub async fn ensure_admin(&self) -> Result<Identity> {
        let label = self.settings.admin_label.as_str();
        if let Some(admin) = self.store.get(label).await? {
            return Ok(admin);
        }

        let _guard = self.enroll_lock.lock().await;
        if let Some(admin) = self.store.get(label).await? {
            return Ok(admin);
        }

        let enrollment = self
            .ca
            .enroll(&self.settings.admin_enrollment_id, &self.settings.admin_secret)
            .await?;
        let admin = Identity::from_enrollment(label, enrollment, &self.settings.msp_id);
        self.store.put(label, &admin).await?;

        info!(label = label, msp_id = %admin.msp_id, "enrolled admin identity");
        Ok(admin)
    }

    /// Return the identity for `node_id`, registering and enrolling it with
    /// the administrator as registrar if it is not stored yet.
    ///
    /// Fails with [`FwError::Prerequisite`] when no administrator identity
    /// has been stored.
    pub async fn ensure_node(&self, node_id: &str) -> Result<Identity> {
        if let Some(identity) = self.store.get(node_id).await? {
            debug!(node_id = node_id, "identity already in wallet");
            return Ok(identity);
        }

        let _guard = self.enroll_lock.lock().await;
        if let Some(identity) = self.store.get(node_id).await? {
            return Ok(identity);
        }

        let admin = self
            .store
            .get(&self.settings.admin_label)
            .await?
            .ok_or_else(|| {
                FwError::Prerequisite(format!(
                    "admin identity \"{}\" is not enrolled",
                    self.settings.admin_label
                ))
            })?;

        let request = EnrollmentRequest::new(
            node_id,
            &self.settings.node_role,
            &self.settings.node_affiliation,
        );
        let secret = self.ca.register(&request, &admin).await?;
        let enrollment = self.ca.enroll(node_id, &secret).await?;

        let identity = Identity::from_enrollment(node_id, enrollment, &self.settings.msp_id);
        self.store.put(node_id, &identity).await?;

        info!(node_id = node_id, "registered and enrolled node identity");
        Ok(identity)
    }
}
