//! Policy merging: turns an issuer, a parsed CSR, and caller policy into a
//! fully-resolved template for a subordinate CA certificate.

use const_oid::ObjectIdentifier;
use sha1::Sha1;
use time::{Duration, OffsetDateTime};

use crate::cert::SignatureAlgorithm;
use crate::cert::extensions::{
    AuthorityInfoAccess, AuthorityKeyIdentifier, BasicConstraints, CrlDistributionPoints, KeyUsage,
    KeyUsages, NameConstraints, SubjectAltName, SubjectKeyIdentifier, ToAndFromX509Extension,
};
use crate::cert::params::{ExtensionParam, PolicyInput, to_x509_time};
use crate::error::CaKitError;
use crate::issuer::IssuerSnapshot;
use crate::request::ParsedCsr;
use crate::template::CertTemplate;

/// Clock skew allowance applied to notBefore.
const BACKDATE: Duration = Duration::seconds(30);

/// Default lifetime when the caller supplies neither `ttl` nor `not_after`.
const DEFAULT_TTL: Duration = Duration::days(365);

/// Extensions this module always computes or replaces itself, never copied
/// from a CSR. The authority pointers (AKI, CRL distribution points, AIA)
/// must come from the signing issuer, and copying them would also duplicate
/// the issuer-configured URL extensions appended below.
const MANAGED_OIDS: [ObjectIdentifier; 6] = [
    BasicConstraints::OID,
    KeyUsage::OID,
    SubjectKeyIdentifier::OID,
    AuthorityKeyIdentifier::OID,
    CrlDistributionPoints::OID,
    AuthorityInfoAccess::OID,
];

/// Where the subject and discretionary extensions of the new certificate
/// come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TemplateSource {
    /// The CSR is authoritative: subject verbatim, requested extensions
    /// copied, requested key usages unioned into the CA baseline.
    Request,
    /// The caller's policy is authoritative; CSR content beyond the public
    /// key is ignored.
    Policy,
}

impl TemplateSource {
    fn select(policy: &PolicyInput) -> Self {
        if policy.use_csr_values {
            TemplateSource::Request
        } else {
            TemplateSource::Policy
        }
    }
}

/// Builds the template for signing the CSR as a subordinate CA.
///
/// When `policy.use_csr_values` is set, the subject and requested extensions
/// come from the CSR; otherwise `policy.subject` and `policy.alt_names` are
/// authoritative and CSR extensions are ignored. Either way the result is a
/// CA certificate: Basic Constraints with `is_ca`, key usage containing at
/// least certSign and cRLSign, and identifiers computed here.
///
/// The serial number is left empty; the caller fills it in after allocation.
pub fn build_intermediate_template(
    issuer: &IssuerSnapshot,
    csr: &ParsedCsr,
    policy: &PolicyInput,
    algorithm: SignatureAlgorithm,
) -> Result<CertTemplate, CaKitError> {
    check_path_length(issuer, policy)?;
    let validity = resolve_validity(issuer, policy)?;

    let mut extensions = Vec::new();
    let mut key_usage = KeyUsages::KeyCertSign | KeyUsages::CRLSign;

    let subject = match TemplateSource::select(policy) {
        TemplateSource::Request => {
            for requested in &csr.requested_extensions {
                if requested.oid == KeyUsage::OID {
                    let ku: KeyUsage = requested.to_extension().map_err(|e| {
                        CaKitError::InvalidCertificateRequest(format!(
                            "malformed key usage extension in CSR: {e}"
                        ))
                    })?;
                    key_usage |= ku.0;
                    continue;
                }
                if MANAGED_OIDS.contains(&requested.oid) {
                    continue;
                }
                if requested.oid == NameConstraints::OID && policy_has_name_constraints(policy) {
                    continue;
                }
                extensions.push(requested.clone());
            }
            csr.subject.clone()
        }
        TemplateSource::Policy => {
            if policy.subject.common_name.is_empty() {
                return Err(CaKitError::InvalidParameter(
                    "common_name is required unless CSR values are used".to_string(),
                ));
            }
            if !policy.alt_names.is_empty() {
                let san = SubjectAltName {
                    names: policy.alt_names.clone(),
                };
                extensions.push(
                    ExtensionParam::from_extension(san, false).map_err(|e| {
                        CaKitError::PolicyViolation(format!("invalid alt_names: {e}"))
                    })?,
                );
            }
            policy.subject.as_x509_name()?
        }
    };

    let mut front = vec![
        ExtensionParam::from_extension(
            BasicConstraints {
                is_ca: true,
                max_path_length: policy.max_path_length,
            },
            true,
        )?,
        ExtensionParam::from_extension(KeyUsage(key_usage), true)?,
        ExtensionParam::from_extension(
            SubjectKeyIdentifier(subject_key_identifier(csr)),
            false,
        )?,
        ExtensionParam::from_extension(issuer.authority_key_identifier(), false)?,
    ];
    front.append(&mut extensions);
    let mut extensions = front;

    if policy_has_name_constraints(policy) {
        extensions.push(ExtensionParam::from_extension(
            NameConstraints {
                permitted_dns_domains: policy.permitted_dns_domains.clone(),
                excluded_dns_domains: policy.excluded_dns_domains.clone(),
            },
            true,
        )?);
    }

    extensions.extend(issuer_url_extensions(issuer)?);

    Ok(CertTemplate {
        serial_number: Vec::new(),
        signature_algorithm: algorithm,
        issuer: issuer.subject_name(),
        validity,
        subject,
        subject_public_key_info: csr.spki.clone(),
        extensions,
    })
}

/// The CRL distribution point and AIA extensions the issuer is configured to
/// stamp onto everything it signs.
pub(crate) fn issuer_url_extensions(
    issuer: &IssuerSnapshot,
) -> Result<Vec<ExtensionParam>, CaKitError> {
    let mut out = Vec::new();
    if !issuer.urls.crl_distribution_points.is_empty() {
        out.push(ExtensionParam::from_extension(
            CrlDistributionPoints {
                uris: issuer.urls.crl_distribution_points.clone(),
            },
            false,
        )?);
    }
    if !issuer.urls.ocsp_servers.is_empty() || !issuer.urls.issuing_certificates.is_empty() {
        out.push(ExtensionParam::from_extension(
            AuthorityInfoAccess {
                ocsp_servers: issuer.urls.ocsp_servers.clone(),
                issuing_certificates: issuer.urls.issuing_certificates.clone(),
            },
            false,
        )?);
    }
    Ok(out)
}

fn policy_has_name_constraints(policy: &PolicyInput) -> bool {
    !policy.permitted_dns_domains.is_empty() || !policy.excluded_dns_domains.is_empty()
}

fn subject_key_identifier(csr: &ParsedCsr) -> Vec<u8> {
    <Sha1 as sha1::Digest>::digest(csr.spki.subject_public_key.raw_bytes()).to_vec()
}

/// Rejects requests the issuer's own path length constraint forbids.
///
/// An issuer constrained to zero may not sign subordinate CAs at all. One
/// constrained to `n` requires the new certificate to carry an explicit
/// constraint strictly below `n`.
fn check_path_length(issuer: &IssuerSnapshot, policy: &PolicyInput) -> Result<(), CaKitError> {
    let Some(bc) = issuer.basic_constraints()? else {
        return Ok(());
    };
    let Some(issuer_max) = bc.max_path_length else {
        return Ok(());
    };
    if issuer_max == 0 {
        return Err(CaKitError::PolicyViolation(
            "issuer has a path length constraint of 0 and cannot sign subordinate CAs".to_string(),
        ));
    }
    match policy.max_path_length {
        Some(requested) if requested < issuer_max => Ok(()),
        Some(requested) => Err(CaKitError::PolicyViolation(format!(
            "requested path length {requested} is not below the issuer's constraint {issuer_max}"
        ))),
        None => Err(CaKitError::PolicyViolation(format!(
            "issuer has a path length constraint of {issuer_max}; \
             the new certificate must carry a smaller explicit constraint"
        ))),
    }
}

/// Resolves the validity window: a fixed backdate on notBefore, and notAfter
/// from the explicit expiry, the TTL, or a one-year default, in that order.
fn resolve_validity(
    issuer: &IssuerSnapshot,
    policy: &PolicyInput,
) -> Result<x509_cert::time::Validity, CaKitError> {
    let now = OffsetDateTime::now_utc();
    let not_before = now - BACKDATE;

    let not_after = match (policy.not_after, policy.ttl) {
        (Some(explicit), _) => explicit,
        (None, Some(ttl)) => now + ttl,
        (None, None) => now + DEFAULT_TTL,
    };

    if not_after <= not_before {
        return Err(CaKitError::InvalidParameter(format!(
            "requested expiry {not_after} is in the past"
        )));
    }
    if not_after > issuer.not_after() {
        return Err(CaKitError::PolicyViolation(format!(
            "requested expiry {not_after} is beyond the issuer's own expiry {}",
            issuer.not_after()
        )));
    }

    Ok(x509_cert::time::Validity {
        not_before: to_x509_time(not_before)?,
        not_after: to_x509_time(not_after)?,
    })
}
