use thiserror::Error;

/// Represents errors that can occur in the CaKit library.
///
/// Every variant is a local validation or signing failure detected before any
/// serial number is consumed. Detail strings name the offending field or
/// check and never contain private key material.
#[derive(Debug, Error, Clone)]
pub enum CaKitError {
    /// The input is not parsable PEM or DER.
    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),

    /// The CSR is malformed, carries a bad self-signature, or requests
    /// unusable extensions.
    #[error("invalid certificate request: {0}")]
    InvalidCertificateRequest(String),

    /// The certificate offered for cross-signing is not self-issued.
    #[error("certificate is not self-issued: {0}")]
    NotSelfIssued(String),

    /// The input certificate's public key algorithm does not match the
    /// signing issuer's.
    #[error("certificate algorithm mismatch: {0}")]
    AlgorithmMismatch(String),

    /// The request conflicts with the signing issuer's policy.
    #[error("policy violation: {0}")]
    PolicyViolation(String),

    /// The issuer reference did not resolve to a known issuer.
    #[error("issuer not found: {0}")]
    IssuerNotFound(String),

    /// The issuer exists but cannot sign (no usable private key).
    #[error("issuer not usable: {0}")]
    IssuerNotUsable(String),

    /// A request parameter is out of range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The signing backend failed.
    #[error("signing failure: {0}")]
    SigningFailure(String),
}

impl From<der::Error> for CaKitError {
    /// Converts a `der::Error` into a `CaKitError`.
    fn from(err: der::Error) -> Self {
        CaKitError::InvalidEncoding(err.to_string())
    }
}

impl From<pem::PemError> for CaKitError {
    fn from(err: pem::PemError) -> Self {
        CaKitError::InvalidEncoding(err.to_string())
    }
}
