//! fwledger-srv: REST gateway for firmware management on a permissioned
//! ledger.
//!
//! Vendors publish firmware releases, devices register themselves, discover
//! newer firmware, verify image hashes against the ledger and report the
//! version they run. Every operation is a contract transaction submitted or
//! evaluated through a short-lived session under the administrator
//! identity.
//!
//! # Architecture
//!
//! - [`wallet`] - credential store (`<label>.id` JSON files)
//! - [`identity`] - enrolls the administrator and device identities with the CA
//! - [`session`] - per-request ledger sessions with guaranteed release
//! - [`contract`] - typed calls into the firmware chaincode
//! - [`api`] - axum routes, validation and error mapping
//! - [`server`] - wiring and the HTTP listener

pub mod api;
pub mod config;
pub mod contract;
mod dispatch;
pub mod identity;
pub mod server;
pub mod session;
pub mod wallet;

// Re-exports for convenience.
pub use config::ServerConfig;
pub use fwledger_core::{FwError, Result};
