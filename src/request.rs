//! Parsing and self-proof validation of incoming signing requests.
//!
//! Two request shapes reach the signing operations: a PKCS#10 CSR (for
//! intermediate issuance) and a self-issued certificate (for cross-signing).
//! Both must prove possession of their embedded public key before any policy
//! work happens.

use std::collections::HashSet;

use der::{Decode, Encode};
use x509_cert::certificate::CertificateInner;
use x509_cert::name::Name;
use x509_cert::request::CertReq;
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::cert::SignatureAlgorithm;
use crate::cert::params::ExtensionParam;
use crate::error::CaKitError;
use crate::key::PublicKey;

const CSR_PEM_TAG: &str = "CERTIFICATE REQUEST";
const CERTIFICATE_PEM_TAG: &str = "CERTIFICATE";

/// A validated certificate signing request.
///
/// The SPKI is kept verbatim so the issued certificate carries exactly the
/// key material the requester encoded; `public_key` is the parsed form used
/// for verification and algorithm checks.
pub struct ParsedCsr {
    pub subject: Name,
    pub spki: SubjectPublicKeyInfoOwned,
    pub public_key: PublicKey,
    pub requested_extensions: Vec<ExtensionParam>,
}

/// Parses a PEM CSR and verifies its self-proof.
///
/// The CSR's signature must verify against its own embedded public key;
/// corrupted or forged requests are rejected before any policy evaluation.
pub fn parse_csr(csr_pem: &str) -> Result<ParsedCsr, CaKitError> {
    let block = pem::parse(csr_pem)?;
    if block.tag() != CSR_PEM_TAG {
        return Err(CaKitError::InvalidEncoding(format!(
            "expected a {CSR_PEM_TAG} block, got {}",
            block.tag()
        )));
    }
    let csr = CertReq::from_der(block.contents())?;

    let algorithm = SignatureAlgorithm::try_from_oid(csr.algorithm.oid)?;
    let public_key = PublicKey::from_x509spki(&csr.info.public_key)?;

    let message = csr.info.to_der()?;
    let signature = csr.signature.as_bytes().ok_or_else(|| {
        CaKitError::InvalidCertificateRequest("CSR signature is not octet-aligned".to_string())
    })?;
    public_key
        .verify(algorithm, &message, signature)
        .map_err(|e| {
            CaKitError::InvalidCertificateRequest(format!("CSR self-signature check failed: {e}"))
        })?;

    let requested_extensions = extension_request(&csr)?;

    Ok(ParsedCsr {
        subject: csr.info.subject.clone(),
        spki: csr.info.public_key.clone(),
        public_key,
        requested_extensions,
    })
}

/// Collects the extensions requested through the PKCS#9 extensionRequest
/// attribute, rejecting duplicates.
fn extension_request(csr: &CertReq) -> Result<Vec<ExtensionParam>, CaKitError> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    for attribute in csr.info.attributes.iter() {
        if attribute.oid != const_oid::db::rfc5912::ID_EXTENSION_REQ {
            continue;
        }
        for value in attribute.values.iter() {
            let extensions = value.decode_as::<x509_cert::ext::Extensions>().map_err(|e| {
                CaKitError::InvalidCertificateRequest(format!(
                    "malformed extension request attribute: {e}"
                ))
            })?;
            for extension in extensions {
                if !seen.insert(extension.extn_id) {
                    return Err(CaKitError::InvalidCertificateRequest(format!(
                        "duplicate extension {} in CSR",
                        extension.extn_id
                    )));
                }
                out.push(ExtensionParam {
                    oid: extension.extn_id,
                    critical: extension.critical,
                    value: extension.extn_value.as_bytes().to_vec(),
                });
            }
        }
    }
    Ok(out)
}

/// A validated self-issued certificate offered for cross-signing.
pub struct ParsedSelfIssued {
    pub certificate: CertificateInner,
    pub public_key: PublicKey,
}

/// Parses a PEM certificate and verifies that it is self-issued.
///
/// Self-issued means the issuer and subject distinguished names are
/// byte-identical and the embedded signature verifies against the embedded
/// public key.
pub fn parse_self_issued(cert_pem: &str) -> Result<ParsedSelfIssued, CaKitError> {
    let block = pem::parse(cert_pem)?;
    if block.tag() != CERTIFICATE_PEM_TAG {
        return Err(CaKitError::InvalidEncoding(format!(
            "expected a {CERTIFICATE_PEM_TAG} block, got {}",
            block.tag()
        )));
    }
    let certificate = CertificateInner::from_der(block.contents())?;
    let tbs = &certificate.tbs_certificate;

    if tbs.subject.to_der()? != tbs.issuer.to_der()? {
        return Err(CaKitError::NotSelfIssued(format!(
            "issuer ({}) does not match subject ({})",
            tbs.issuer, tbs.subject
        )));
    }

    let algorithm =
        SignatureAlgorithm::try_from_oid(certificate.signature_algorithm.oid).map_err(|_| {
            CaKitError::NotSelfIssued(format!(
                "cannot verify self-signature: unsupported algorithm {}",
                certificate.signature_algorithm.oid
            ))
        })?;
    let public_key = PublicKey::from_x509spki(&tbs.subject_public_key_info)?;

    let message = tbs.to_der()?;
    let signature = certificate.signature.as_bytes().ok_or_else(|| {
        CaKitError::NotSelfIssued("certificate signature is not octet-aligned".to_string())
    })?;
    public_key
        .verify(algorithm, &message, signature)
        .map_err(|e| CaKitError::NotSelfIssued(format!("self-signature check failed: {e}")))?;

    Ok(ParsedSelfIssued {
        certificate,
        public_key,
    })
}
