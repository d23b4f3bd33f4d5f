//! Cross-signing a self-issued CA certificate under another issuer.
//!
//! Cross-signing takes a root (or other self-issued) certificate and reissues
//! its contents under a different issuer, producing a second trust path for
//! the same subject and key. Everything in the input certificate is preserved
//! verbatim except the issuer name, the authority key identifier, and the
//! issuer-configured URL extensions.

use crate::cert::SignedCertificateOutput;
use crate::cert::extensions::{
    AuthorityInfoAccess, AuthorityKeyIdentifier, CrlDistributionPoints, ToAndFromX509Extension,
};
use crate::cert::params::ExtensionParam;
use crate::error::CaKitError;
use crate::issuer::IssuerRepository;
use crate::merge::issuer_url_extensions;
use crate::request::parse_self_issued;
use crate::sign::{select_signature_algorithm, sign_template};
use crate::template::CertTemplate;

/// Reissues a self-issued PEM certificate under the referenced issuer.
///
/// The input must be self-issued: its subject and issuer names byte-equal
/// and its signature valid under its own key. Subject, public key, validity,
/// serial-independent extensions, and every other field are carried over
/// unchanged; only the issuer name, authority key identifier, and the
/// issuer's configured URL extensions are replaced.
///
/// With `require_matching_algorithms` set, the certificate's key family must
/// match the signing issuer's key family, for deployments whose verifiers
/// cannot follow a cross-algorithm chain.
pub fn cross_sign(
    repo: &dyn IssuerRepository,
    issuer_ref: &str,
    cert_pem: &str,
    require_matching_algorithms: bool,
) -> Result<SignedCertificateOutput, CaKitError> {
    let issuer = repo.resolve(issuer_ref)?;
    let key = issuer.require_signing_key()?;

    let parsed = parse_self_issued(cert_pem)?;
    let tbs = &parsed.certificate.tbs_certificate;

    if require_matching_algorithms && parsed.public_key.algorithm() != key.algorithm() {
        return Err(CaKitError::AlgorithmMismatch(format!(
            "certificate key algorithm {} does not match issuer key algorithm {}",
            parsed.public_key.algorithm(),
            key.algorithm()
        )));
    }

    let algorithm = select_signature_algorithm(key, issuer.default_signature_bits)?;

    let replaced = [
        AuthorityKeyIdentifier::OID,
        CrlDistributionPoints::OID,
        AuthorityInfoAccess::OID,
    ];
    let mut extensions = Vec::new();
    for extension in tbs.extensions.as_deref().unwrap_or(&[]) {
        if replaced.contains(&extension.extn_id) {
            continue;
        }
        extensions.push(ExtensionParam {
            oid: extension.extn_id,
            critical: extension.critical,
            value: extension.extn_value.as_bytes().to_vec(),
        });
    }
    extensions.push(ExtensionParam::from_extension(
        issuer.authority_key_identifier(),
        false,
    )?);
    extensions.extend(issuer_url_extensions(&issuer)?);

    let mut template = CertTemplate {
        serial_number: Vec::new(),
        signature_algorithm: algorithm,
        issuer: issuer.subject_name(),
        validity: tbs.validity.clone(),
        subject: tbs.subject.clone(),
        subject_public_key_info: tbs.subject_public_key_info.clone(),
        extensions,
    };
    template.serial_number = repo.next_serial(&issuer.id)?;

    let certificate = sign_template(key, &template)?;

    let mut issuing_chain = vec![issuer.cert.clone()];
    issuing_chain.extend(issuer.chain.iter().cloned());

    Ok(SignedCertificateOutput {
        serial_number: template.serial_number,
        certificate,
        issuing_chain,
    })
}
