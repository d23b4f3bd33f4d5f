pub mod extensions;
pub mod params;

use const_oid::ObjectIdentifier;
use der::{Decode, Encode, EncodePem};
use x509_cert::certificate::CertificateInner;
use x509_cert::spki::AlgorithmIdentifierOwned;

use crate::error::CaKitError;

pub type Result<T> = std::result::Result<T, CaKitError>;

const CERTIFICATE_PEM_TAG: &str = "CERTIFICATE";

/// Represents the supported signature algorithms for certificates.
///
/// This enum provides a mapping to the corresponding OIDs for each algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    /// SHA-256 with RSA encryption.
    Sha256WithRSA,
    /// SHA-384 with RSA encryption.
    Sha384WithRSA,
    /// SHA-512 with RSA encryption.
    Sha512WithRSA,
    /// SHA-256 with ECDSA.
    Sha256WithECDSA,
    /// SHA-384 with ECDSA.
    Sha384WithECDSA,
    /// SHA-512 with ECDSA.
    Sha512WithECDSA,
    /// Ed25519 (fixed internal hash).
    Ed25519,
}

impl SignatureAlgorithm {
    /// Whether this is an ECDSA algorithm.
    pub fn is_ecdsa(self) -> bool {
        matches!(
            self,
            SignatureAlgorithm::Sha256WithECDSA
                | SignatureAlgorithm::Sha384WithECDSA
                | SignatureAlgorithm::Sha512WithECDSA
        )
    }

    /// Computes the algorithm's SHA-2 digest over `data`.
    ///
    /// Returns `None` for Ed25519, which hashes internally.
    pub(crate) fn digest(self, data: &[u8]) -> Option<Vec<u8>> {
        use sha2::Digest;
        match self {
            SignatureAlgorithm::Sha256WithRSA | SignatureAlgorithm::Sha256WithECDSA => {
                Some(sha2::Sha256::digest(data).to_vec())
            }
            SignatureAlgorithm::Sha384WithRSA | SignatureAlgorithm::Sha384WithECDSA => {
                Some(sha2::Sha384::digest(data).to_vec())
            }
            SignatureAlgorithm::Sha512WithRSA | SignatureAlgorithm::Sha512WithECDSA => {
                Some(sha2::Sha512::digest(data).to_vec())
            }
            SignatureAlgorithm::Ed25519 => None,
        }
    }

    /// Maps a signature algorithm OID back to a `SignatureAlgorithm`.
    pub fn try_from_oid(oid: ObjectIdentifier) -> Result<Self> {
        match oid {
            const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION => {
                Ok(SignatureAlgorithm::Sha256WithRSA)
            }
            const_oid::db::rfc5912::SHA_384_WITH_RSA_ENCRYPTION => {
                Ok(SignatureAlgorithm::Sha384WithRSA)
            }
            const_oid::db::rfc5912::SHA_512_WITH_RSA_ENCRYPTION => {
                Ok(SignatureAlgorithm::Sha512WithRSA)
            }
            const_oid::db::rfc5912::ECDSA_WITH_SHA_256 => Ok(SignatureAlgorithm::Sha256WithECDSA),
            const_oid::db::rfc5912::ECDSA_WITH_SHA_384 => Ok(SignatureAlgorithm::Sha384WithECDSA),
            const_oid::db::rfc5912::ECDSA_WITH_SHA_512 => Ok(SignatureAlgorithm::Sha512WithECDSA),
            const_oid::db::rfc8410::ID_ED_25519 => Ok(SignatureAlgorithm::Ed25519),
            other => Err(CaKitError::InvalidCertificateRequest(format!(
                "unsupported signature algorithm {other}"
            ))),
        }
    }
}

impl From<SignatureAlgorithm> for AlgorithmIdentifierOwned {
    /// Converts a `SignatureAlgorithm` into an `AlgorithmIdentifierOwned`.
    ///
    /// RSA algorithms carry the explicit NULL parameter RFC 5280 requires;
    /// ECDSA and Ed25519 omit parameters.
    fn from(value: SignatureAlgorithm) -> Self {
        let rsa_null = Some(der::asn1::Any::from(der::asn1::AnyRef::NULL));
        match value {
            SignatureAlgorithm::Sha256WithRSA => AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION,
                parameters: rsa_null,
            },
            SignatureAlgorithm::Sha384WithRSA => AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc5912::SHA_384_WITH_RSA_ENCRYPTION,
                parameters: rsa_null,
            },
            SignatureAlgorithm::Sha512WithRSA => AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc5912::SHA_512_WITH_RSA_ENCRYPTION,
                parameters: rsa_null,
            },
            SignatureAlgorithm::Sha256WithECDSA => AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc5912::ECDSA_WITH_SHA_256,
                parameters: None,
            },
            SignatureAlgorithm::Sha384WithECDSA => AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc5912::ECDSA_WITH_SHA_384,
                parameters: None,
            },
            SignatureAlgorithm::Sha512WithECDSA => AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc5912::ECDSA_WITH_SHA_512,
                parameters: None,
            },
            SignatureAlgorithm::Ed25519 => AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc8410::ID_ED_25519,
                parameters: None,
            },
        }
    }
}

/// Represents an X.509 certificate.
///
/// This struct provides methods to encode the certificate into DER or PEM
/// formats and to load one back from either.
#[derive(Debug, Clone)]
pub struct Certificate {
    /// The inner representation of the certificate.
    pub inner: CertificateInner,
}

impl Certificate {
    /// Decodes a certificate from DER bytes.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let inner = CertificateInner::from_der(der)?;
        Ok(Certificate { inner })
    }

    /// Decodes a certificate from a PEM block.
    pub fn from_pem(pem_str: &str) -> Result<Self> {
        let block = pem::parse(pem_str)?;
        if block.tag() != CERTIFICATE_PEM_TAG {
            return Err(CaKitError::InvalidEncoding(format!(
                "expected a {CERTIFICATE_PEM_TAG} block, got {}",
                block.tag()
            )));
        }
        Self::from_der(block.contents())
    }

    /// Encodes the certificate into DER format.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.inner
            .to_der()
            .map_err(|e| CaKitError::InvalidEncoding(e.to_string()))
    }

    /// Encodes the certificate into PEM format.
    pub fn to_pem(&self) -> Result<String> {
        self.inner
            .to_pem(pkcs8::LineEnding::LF)
            .map_err(|e| CaKitError::InvalidEncoding(e.to_string()))
    }

    /// The certificate's subject distinguished name.
    pub fn subject(&self) -> &x509_cert::name::Name {
        &self.inner.tbs_certificate.subject
    }

    /// The certificate's issuer distinguished name.
    pub fn issuer(&self) -> &x509_cert::name::Name {
        &self.inner.tbs_certificate.issuer
    }

    /// The certificate's serial number bytes.
    pub fn serial_number(&self) -> Vec<u8> {
        self.inner
            .tbs_certificate
            .serial_number
            .as_bytes()
            .to_vec()
    }
}

/// The product of a signing operation.
///
/// Carries the issued certificate, the issuing chain (the signing issuer's
/// certificate followed by its own chain), and the serial number allocated
/// for the certificate.
#[derive(Debug, Clone)]
pub struct SignedCertificateOutput {
    pub certificate: Certificate,
    pub issuing_chain: Vec<Certificate>,
    pub serial_number: Vec<u8>,
}
