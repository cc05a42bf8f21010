//! Network session manager: per-request ledger sessions under the
//! administrator identity.
//!
//! Every route opens its own session and releases it before responding.
//! [`SessionManager::scoped`] owns that lifecycle: the session is closed
//! after the work completes or fails, and a drop guard schedules the close
//! on the runtime when the request future is cancelled or panics.

use fwledger_client::{ContractTarget, LedgerGateway, SessionHandle};
use fwledger_core::Result;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::identity::IdentityManager;

/// A live connection to the firmware contract.
#[derive(Clone)]
pub struct Session {
    pub(crate) handle: SessionHandle,
    pub(crate) gateway: Arc<dyn LedgerGateway>,
}

impl Session {
    /// Gateway-assigned session id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.handle.session_id
    }

    #[must_use]
    pub const fn handle(&self) -> &SessionHandle {
        &self.handle
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

/// Opens and closes ledger sessions.
pub struct SessionManager {
    identities: Arc<IdentityManager>,
    gateway: Arc<dyn LedgerGateway>,
    target: ContractTarget,
    open: Arc<AtomicUsize>,
}

impl SessionManager {
    pub fn new(
        identities: Arc<IdentityManager>,
        gateway: Arc<dyn LedgerGateway>,
        target: ContractTarget,
    ) -> Self {
        Self {
            identities,
            gateway,
            target,
            open: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Identity manager backing the sessions.
    #[must_use]
    pub const fn identities(&self) -> &Arc<IdentityManager> {
        &self.identities
    }

    /// Sessions opened and not yet released.
    #[must_use]
    pub fn open_sessions(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    /// Connect to the configured channel and contract as the administrator.
    ///
    /// Enrolls the administrator first if it is not stored yet.
    pub async fn open_admin_session(&self) -> Result<Session> {
        let admin = self.identities.ensure_admin().await?;
        let handle = self.gateway.connect(&admin, &self.target).await?;
        self.open.fetch_add(1, Ordering::SeqCst);

        debug!(
            session = %handle.session_id,
            channel = %self.target.channel,
            contract = %self.target.contract,
            "opened ledger session"
        );
        Ok(Session {
            handle,
            gateway: Arc::clone(&self.gateway),
        })
    }

    /// Release a session. Failures are logged, never returned.
    pub async fn close(&self, session: Session) {
        release(&session, &self.open).await;
    }

    /// Run `work` inside a fresh administrator session and close it
    /// afterwards, whatever the outcome.
    pub async fn scoped<T, F, Fut>(&self, work: F) -> Result<T>
    where
        F: FnOnce(Session) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let session = self.open_admin_session().await?;
        let guard = SessionGuard {
            session: Some(session.clone()),
            open: Arc::clone(&self.open),
        };
        let outcome = work(session).await;
        guard.close().await;
        outcome
    }
}

async fn release(session: &Session, open: &AtomicUsize) {
    match session.gateway.disconnect(&session.handle).await {
        Ok(()) => debug!(session = %session.id(), "closed ledger session"),
        Err(e) => warn!(session = %session.id(), error = %e, "failed to close ledger session"),
    }
    open.fetch_sub(1, Ordering::SeqCst);
}

/// Closes its session on drop unless closed explicitly first.
struct SessionGuard {
    session: Option<Session>,
    open: Arc<AtomicUsize>,
}

impl SessionGuard {
    async fn close(mut self) {
        if let Some(session) = self.session.take() {
            release(&session, &self.open).await;
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        let open = Arc::clone(&self.open);
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move { release(&session, &open).await });
            }
            Err(_) => {
                open.fetch_sub(1, Ordering::SeqCst);
                warn!(session = %session.id(), "no runtime to close abandoned ledger session");
            }
        }
    }
}
