//! Identity-bound request signing and key generation.
//!
//! Requests to the certificate authority and the ledger gateway are
//! authorized with a token derived from the caller's X.509 identity:
//!
//! ```text
//! token   = base64(certPEM) "." base64(signature)
//! payload = METHOD "." base64(uri) "." base64(body) "." base64(certPEM)
//! ```
//!
//! The signature is ECDSA P-256 over SHA-256 of the payload, DER encoded,
//! with `s` normalized to the lower half of the curve order (verifiers reject
//! high-S signatures).

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use fwledger_core::{FwError, Identity, Result};
use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey};
use p256::pkcs8::DecodePrivateKey;
use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair};

/// A freshly generated key pair and the CSR to enroll it with.
pub struct CertificateRequest {
    /// PKCS#10 certificate signing request (PEM)
    pub csr_pem: String,
    /// PKCS#8 private key (PEM)
    pub key_pem: String,
}

/// Generate a P-256 key pair and a CSR whose subject CN is `common_name`.
pub fn generate_csr(common_name: &str) -> Result<CertificateRequest> {
    let key_pair = KeyPair::generate().map_err(|e| FwError::Crypto(e.to_string()))?;

    let mut params =
        CertificateParams::new(Vec::<String>::new()).map_err(|e| FwError::Crypto(e.to_string()))?;
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, common_name);
    params.distinguished_name = dn;

    let csr = params
        .serialize_request(&key_pair)
        .map_err(|e| FwError::Crypto(format!("failed to build CSR: {e}")))?;
    let csr_pem = csr.pem().map_err(|e| FwError::Crypto(e.to_string()))?;

    Ok(CertificateRequest {
        csr_pem,
        key_pem: key_pair.serialize_pem(),
    })
}

/// Build the authorization token for a request made as `identity`.
pub fn auth_token(identity: &Identity, method: &str, uri: &str, body: &[u8]) -> Result<String> {
    let cert = B64.encode(identity.certificate.as_bytes());
    let payload = format!(
        "{method}.{}.{}.{cert}",
        B64.encode(uri.as_bytes()),
        B64.encode(body)
    );
    let signature = sign(&identity.private_key, payload.as_bytes())?;
    Ok(format!("{cert}.{}", B64.encode(signature)))
}

/// Sign `message` with a PKCS#8 PEM P-256 key, returning a low-S DER signature.
pub fn sign(private_key_pem: &str, message: &[u8]) -> Result<Vec<u8>> {
    let key = SigningKey::from_pkcs8_pem(private_key_pem)
        .map_err(|e| FwError::Crypto(format!("unsupported private key: {e}")))?;

    let signature: Signature = key
        .try_sign(message)
        .map_err(|e| FwError::Crypto(format!("signing failed: {e}")))?;
    let signature = signature.normalize_s().unwrap_or(signature);

    Ok(signature.to_der().as_bytes().to_vec())
}
