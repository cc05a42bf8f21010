use serde::{Deserialize, Serialize};
use std::fmt;

/// Credential type of every identity issued by the certificate authority
pub const X509_IDENTITY_TYPE: &str = "X.509";

/// An enrolled X.509 identity as held by the credential store
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    /// Unique label within the credential store
    pub label: String,

    /// Signed certificate (PEM)
    pub certificate: String,

    /// Private key matching the certificate (PKCS#8 PEM)
    pub private_key: String,

    /// Organizational membership service provider id
    pub msp_id: String,
}

impl Identity {
    /// Build an identity from a fresh enrollment
    #[must_use]
    pub fn from_enrollment(
        label: impl Into<String>,
        enrollment: Enrollment,
        msp_id: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            certificate: enrollment.certificate,
            private_key: enrollment.private_key,
            msp_id: msp_id.into(),
        }
    }

    /// Credential type, always `X.509`
    #[must_use]
    pub const fn identity_type(&self) -> &'static str {
        X509_IDENTITY_TYPE
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("label", &self.label)
            .field("msp_id", &self.msp_id)
            .field("type", &X509_IDENTITY_TYPE)
            .field("private_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

/// A registration request sent to the certificate authority
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentRequest {
    /// Enrollment id to register (the node id for device identities)
    pub enrollment_id: String,

    /// Identity type/role, e.g. `client`
    pub role: String,

    /// Affiliation within the organization, e.g. `org1.department1`
    pub affiliation: String,
}

impl EnrollmentRequest {
    /// Create a new registration request
    #[must_use]
    pub fn new(
        enrollment_id: impl Into<String>,
        role: impl Into<String>,
        affiliation: impl Into<String>,
    ) -> Self {
        Self {
            enrollment_id: enrollment_id.into(),
            role: role.into(),
            affiliation: affiliation.into(),
        }
    }
}

/// Certificate and key returned by a successful enrollment
#[derive(Clone)]
pub struct Enrollment {
    /// Signed certificate (PEM)
    pub certificate: String,

    /// Locally generated private key (PKCS#8 PEM)
    pub private_key: String,
}

impl fmt::Debug for Enrollment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Enrollment")
            .field("certificate", &self.certificate)
            .finish_non_exhaustive()
    }
}
