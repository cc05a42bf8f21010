//! # fwledger-cli
//!
//! Command-line interface for the fwledger firmware gateway.
//!
//! - **serve**: run the REST gateway
//! - **enroll-admin / enroll-node / identities**: manage the credential store
//! - **upload**: publish a firmware image from a vendor machine
//! - **update**: run the device-side update cycle against a gateway

pub mod cli;
pub mod output;

pub use cli::run;
