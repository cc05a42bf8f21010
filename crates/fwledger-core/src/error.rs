use thiserror::Error;

/// Result type alias for fwledger operations
pub type Result<T> = std::result::Result<T, FwError>;

/// Errors that can occur while enrolling identities or talking to the ledger
#[derive(Error, Debug)]
pub enum FwError {
    /// A required request field is missing or empty
    #[error("{0}")]
    Validation(String),

    /// An identity that must exist first (the administrator) is absent
    #[error("prerequisite missing: {0}")]
    Prerequisite(String),

    /// The certificate authority rejected a register/enroll request
    #[error("certificate authority error: {0}")]
    Authority(String),

    /// The ledger gateway could not be reached or the channel/contract
    /// could not be resolved
    #[error("failed to connect to gateway: {0}")]
    Connectivity(String),

    /// A submitted or evaluated transaction failed
    #[error("{0}")]
    Transaction(String),

    /// Credential persistence failed
    #[error("credential store error: {0}")]
    Storage(String),

    /// Configuration or connection profile is invalid
    #[error("configuration error: {0}")]
    Config(String),

    /// HTTP request failed before a response was received
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Remote API returned an error response
    #[error("API error ({code}): {message}")]
    Api {
        /// HTTP status code
        code: u16,
        /// Error message from the API
        message: String,
    },

    /// Downloaded firmware does not match the hash recorded on the ledger
    #[error("hash mismatch: expected {expected}, got {actual}")]
    HashMismatch {
        /// Hash recorded on the ledger
        expected: String,
        /// Hash computed locally
        actual: String,
    },

    /// The ledger did not accept a firmware image for a node
    #[error("firmware rejected: {0}")]
    Rejected(String),

    /// Cryptographic operation (key handling, signing, CSR) failed
    #[error("crypto error: {0}")]
    Crypto(String),

    /// JSON parsing/serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl FwError {
    /// Returns the HTTP status code if this is an API error
    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { code, .. } => Some(*code),
            _ => None,
        }
    }
}
