//! HTTP clients for fwledger.
//!
//! - [`CaClient`] registers and enrolls identities with the certificate
//!   authority ([`CertificateAuthority`])
//! - [`LedgerClient`] opens sessions on the ledger gateway and submits or
//!   evaluates contract transactions ([`LedgerGateway`])
//! - [`FwClient`] is the device-side client of the fwledger REST API

#![doc(html_root_url = "https://docs.rs/fwledger-client/0.3.0")]

pub mod api;
mod ca;
mod client;
mod config;
pub mod hash;
mod ledger;
pub mod signer;

pub use ca::{CaClient, CaClientBuilder, CertificateAuthority};
pub use client::{FwClient, FwClientBuilder};
pub use config::*;
pub use fwledger_core::{FwError, Result};
pub use ledger::{ContractTarget, LedgerClient, LedgerClientBuilder, LedgerGateway, SessionHandle};
