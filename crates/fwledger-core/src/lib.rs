//! Core types and errors for fwledger.
//!
//! This crate provides the foundational types shared by the gateway server,
//! the HTTP clients and the CLI:
//!
//! - **Types**: identities and enrollments, ledger-resident node and firmware
//!   records, and the request/response bodies of the REST API
//! - **Errors**: the [`FwError`] taxonomy and its [`Result`] alias
//! - **Versions**: [`is_version_greater`] for dot-separated version strings
//!
//! # Example
//!
//! ```rust
//! use fwledger_core::is_version_greater;
//!
//! assert!(is_version_greater("1.2.0", "1.1.9"));
//! assert!(!is_version_greater("1.2", "1.2.0"));
//! ```

#![doc(html_root_url = "https://docs.rs/fwledger-core/0.3.0")]

mod error;
pub mod types;
mod version;

pub use error::{FwError, Result};
pub use types::*;
pub use version::is_version_greater;
