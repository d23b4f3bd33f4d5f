//! Issuer snapshots and the repository collaborator interface.
//!
//! Storage of issuers and serial allocation live outside this crate; the
//! signing operations consume them through [`IssuerRepository`]. Snapshots
//! are immutable for the duration of a signing call and safe to share across
//! concurrent calls.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use sha1::Sha1;

use crate::cert::Certificate;
use crate::cert::extensions::{AuthorityKeyIdentifier, BasicConstraints, ToAndFromX509Extension};
use crate::error::CaKitError;
use crate::key::KeyPair;

/// URLs configured for an issuer, copied onto the certificates it signs.
#[derive(Debug, Clone, Default)]
pub struct IssuerUrls {
    pub crl_distribution_points: Vec<String>,
    pub ocsp_servers: Vec<String>,
    pub issuing_certificates: Vec<String>,
}

impl IssuerUrls {
    pub fn is_empty(&self) -> bool {
        self.crl_distribution_points.is_empty()
            && self.ocsp_servers.is_empty()
            && self.issuing_certificates.is_empty()
    }
}

/// A read-only snapshot of an issuer: its CA certificate, optional signing
/// key, chain, configured URLs, and default signature-hash policy.
///
/// `default_signature_bits` is applied when a request passes 0 for its
/// signature-bits parameter (0 here means "derive from the key type").
pub struct IssuerSnapshot {
    pub id: String,
    pub cert: Certificate,
    pub chain: Vec<Certificate>,
    pub signing_key: Option<KeyPair>,
    pub urls: IssuerUrls,
    pub default_signature_bits: u32,
}

impl IssuerSnapshot {
    /// The issuer's subject distinguished name, used verbatim as the issuer
    /// field of everything it signs.
    pub fn subject_name(&self) -> x509_cert::name::Name {
        self.cert.inner.tbs_certificate.subject.clone()
    }

    /// Returns the signing key or `IssuerNotUsable`.
    pub fn require_signing_key(&self) -> Result<&KeyPair, CaKitError> {
        self.signing_key.as_ref().ok_or_else(|| {
            CaKitError::IssuerNotUsable(format!("issuer {:?} has no private key", self.id))
        })
    }

    /// SHA-1 digest of the issuer certificate's public key bits, the key
    /// identifier scheme used for AKI/SKI extensions.
    pub fn key_identifier(&self) -> Vec<u8> {
        let spki = &self.cert.inner.tbs_certificate.subject_public_key_info;
        <Sha1 as sha1::Digest>::digest(spki.subject_public_key.raw_bytes()).to_vec()
    }

    /// Builds the Authority Key Identifier extension pointing at this issuer.
    pub fn authority_key_identifier(&self) -> AuthorityKeyIdentifier {
        AuthorityKeyIdentifier {
            key_identifier: self.key_identifier(),
            authority_cert_issuer: Some(self.cert.inner.tbs_certificate.issuer.clone()),
            authority_cert_serial_number: Some(self.cert.serial_number()),
        }
    }

    /// The issuer certificate's own Basic Constraints, if present.
    pub(crate) fn basic_constraints(&self) -> Result<Option<BasicConstraints>, CaKitError> {
        let Some(extensions) = &self.cert.inner.tbs_certificate.extensions else {
            return Ok(None);
        };
        for extension in extensions {
            if extension.extn_id == BasicConstraints::OID {
                return BasicConstraints::from_x509_extension_value(
                    extension.extn_value.as_bytes(),
                )
                .map(Some);
            }
        }
        Ok(None)
    }

    /// When the issuer's own certificate expires.
    pub fn not_after(&self) -> time::OffsetDateTime {
        crate::cert::params::from_x509_time(&self.cert.inner.tbs_certificate.validity.not_after)
    }
}

/// Collaborator interface for issuer resolution and serial allocation.
///
/// `next_serial` must be atomic: concurrent calls for the same issuer must
/// never hand out the same serial. The signing operations call it exactly
/// once per request, and only after all validation and policy merging has
/// succeeded, so a rejected request never consumes a serial.
pub trait IssuerRepository: Send + Sync {
    /// Resolves an issuer reference to a snapshot.
    fn resolve(&self, issuer_ref: &str) -> Result<Arc<IssuerSnapshot>, CaKitError>;

    /// Allocates the next serial number for the given issuer.
    fn next_serial(&self, issuer_id: &str) -> Result<Vec<u8>, CaKitError>;
}

/// An in-memory issuer repository.
///
/// Serials come from a mutex-guarded per-issuer monotonic counter; suitable
/// for tests and embedded use. Production deployments typically implement
/// [`IssuerRepository`] over their own storage instead.
#[derive(Default)]
pub struct MemoryIssuerRepository {
    issuers: RwLock<HashMap<String, Arc<IssuerSnapshot>>>,
    serials: Mutex<HashMap<String, u64>>,
}

impl MemoryIssuerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an issuer under its id.
    pub fn insert(&self, issuer: IssuerSnapshot) {
        self.issuers
            .write()
            .expect("issuer map lock poisoned")
            .insert(issuer.id.clone(), Arc::new(issuer));
    }
}

impl IssuerRepository for MemoryIssuerRepository {
    fn resolve(&self, issuer_ref: &str) -> Result<Arc<IssuerSnapshot>, CaKitError> {
        self.issuers
            .read()
            .expect("issuer map lock poisoned")
            .get(issuer_ref)
            .cloned()
            .ok_or_else(|| CaKitError::IssuerNotFound(issuer_ref.to_string()))
    }

    fn next_serial(&self, issuer_id: &str) -> Result<Vec<u8>, CaKitError> {
        let mut serials = self.serials.lock().expect("serial counter lock poisoned");
        let counter = serials.entry(issuer_id.to_string()).or_insert(0);
        *counter += 1;
        Ok(encode_serial(*counter))
    }
}

/// Minimal big-endian encoding with a leading zero byte when the high bit is
/// set, keeping the ASN.1 INTEGER positive.
fn encode_serial(value: u64) -> Vec<u8> {
    let mut bytes: Vec<u8> = value.to_be_bytes().to_vec();
    while bytes.len() > 1 && bytes[0] == 0 {
        bytes.remove(0);
    }
    if bytes[0] & 0x80 != 0 {
        bytes.insert(0, 0);
    }
    bytes
}
