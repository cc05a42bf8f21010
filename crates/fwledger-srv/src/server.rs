//! HTTP server runner: wires the CA, credential store and ledger gateway
//! together and serves the API until shutdown.

use fwledger_client::{
    CaClient, CertificateAuthority, ConnectionProfile, ContractTarget, LedgerClient, LedgerGateway,
};
use fwledger_core::FwError;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::api::{self, ApiState};
use crate::config::ServerConfig;
use crate::identity::{IdentityManager, IdentitySettings};
use crate::session::SessionManager;
use crate::wallet::{CredentialStore, FileSystemWallet};

/// MSP id used when neither the config nor the profile names one.
const DEFAULT_MSP_ID: &str = "Org1MSP";

/// Build the identity manager from the config and connection profile.
pub fn identity_manager(config: &ServerConfig) -> crate::Result<Arc<IdentityManager>> {
    let profile = ConnectionProfile::load(&config.connection_profile)?;
    let endpoint = profile.certificate_authority(&config.ca_name)?;

    let ca = CaClient::new(&endpoint, config.request_timeout())?;

    let msp_id = config
        .msp_id
        .clone()
        .or_else(|| profile.client_msp_id().map(str::to_string))
        .unwrap_or_else(|| DEFAULT_MSP_ID.to_string());

    let store: Arc<dyn CredentialStore> = Arc::new(FileSystemWallet::new(&config.wallet_path));
    let ca: Arc<dyn CertificateAuthority> = Arc::new(ca);

    info!(
        ca = %endpoint.url,
        wallet = %config.wallet_path.display(),
        msp_id = %msp_id,
        "identity manager ready"
    );
    Ok(Arc::new(IdentityManager::new(
        store,
        ca,
        IdentitySettings::from_config(config, msp_id),
    )))
}

/// Build the ledger gateway client.
pub fn ledger_gateway(config: &ServerConfig) -> crate::Result<Arc<dyn LedgerGateway>> {
    let mut builder =
        LedgerClient::builder(&config.gateway_url).timeout(config.request_timeout());
    if let Some(path) = &config.gateway_tls_ca_cert {
        let pem = std::fs::read_to_string(path).map_err(|e| {
            FwError::Config(format!(
                "failed to read gateway TLS certificate {}: {e}",
                path.display()
            ))
        })?;
        builder = builder.trust_roots(vec![pem]);
    }
    Ok(Arc::new(builder.build()?))
}

/// Start the HTTP server and run until Ctrl-C.
///
/// The administrator is enrolled up front so the first `registerNode` finds
/// a registrar; a failure here is logged and retried lazily by later
/// requests.
pub async fn run(config: &ServerConfig) -> crate::Result<()> {
    let identities = identity_manager(config)?;
    let gateway = ledger_gateway(config)?;
    let target = ContractTarget::new(&config.channel, &config.contract);

    if let Err(e) = identities.ensure_admin().await {
        warn!(error = %e, "admin enrollment failed at startup");
    }

    let sessions = Arc::new(SessionManager::new(identities, gateway, target));
    let app =
        api::app(ApiState::new(sessions), &config.api_prefix).layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(config.listen)
        .await
        .map_err(|e| FwError::Config(format!("bind {}: {e}", config.listen)))?;

    info!(
        addr = %config.listen,
        prefix = %config.api_prefix,
        channel = %config.channel,
        contract = %config.contract,
        "fwledger gateway listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("fwledger gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_profile(dir: &std::path::Path) -> PathBuf {
        let path = dir.join("connection.json");
        std::fs::write(
            &path,
            r#"{
                "name": "test-network-org1",
                "client": {"organization": "Org1"},
                "organizations": {"Org1": {"mspid": "Org1MSP", "certificateAuthorities": ["ca.org1.example.com"]}},
                "certificateAuthorities": {
                    "ca.org1.example.com": {"url": "http://localhost:7054", "caName": "ca-org1"}
                }
            }"#,
        )
        .unwrap();
        path
    }

    #[tokio::test]
    async fn test_identity_manager_from_profile() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            connection_profile: write_profile(dir.path()),
            wallet_path: dir.path().join("wallet"),
            ..ServerConfig::default()
        };

        let identities = identity_manager(&config).unwrap();
        assert_eq!(identities.admin_label(), "admin");
        assert!(identities.store().list().await.unwrap().is_empty());
    }

    #[test]
    fn test_unknown_ca_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            connection_profile: write_profile(dir.path()),
            ca_name: "ca.org9.example.com".into(),
            ..ServerConfig::default()
        };

        let err = identity_manager(&config).err().unwrap();
        assert!(matches!(err, FwError::Config(_)));
    }

    #[test]
    fn test_missing_profile_is_config_error() {
        let config = ServerConfig {
            connection_profile: PathBuf::from("/nonexistent/connection.json"),
            ..ServerConfig::default()
        };
        assert!(matches!(identity_manager(&config).err().unwrap(), FwError::Config(_)));
    }

    #[test]
    fn test_ledger_gateway_missing_trust_root() {
        let config = ServerConfig {
            gateway_tls_ca_cert: Some(PathBuf::from("/nonexistent/gateway-ca.pem")),
            ..ServerConfig::default()
        };
        assert!(matches!(ledger_gateway(&config).err().unwrap(), FwError::Config(_)));
    }
}
