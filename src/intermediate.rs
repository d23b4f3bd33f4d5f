//! Signing a CSR as a subordinate (intermediate) CA certificate.

use crate::cert::SignedCertificateOutput;
use crate::cert::params::PolicyInput;
use crate::error::CaKitError;
use crate::issuer::IssuerRepository;
use crate::merge::build_intermediate_template;
use crate::request::parse_csr;
use crate::sign::{select_signature_algorithm, sign_template};

/// Signs a PEM CSR as a subordinate CA under the referenced issuer.
///
/// The request is parsed and its self-signature verified, the policy is
/// merged into a CA template, and only then is a serial number allocated and
/// the certificate signed. Rejected requests never consume a serial.
///
/// The produced certificate is returned to the caller along with the issuing
/// chain; it is not registered with the repository as a new issuer.
pub fn sign_intermediate(
    repo: &dyn IssuerRepository,
    issuer_ref: &str,
    csr_pem: &str,
    policy: &PolicyInput,
) -> Result<SignedCertificateOutput, CaKitError> {
    let issuer = repo.resolve(issuer_ref)?;
    let key = issuer.require_signing_key()?;

    let csr = parse_csr(csr_pem)?;

    let bits = if policy.signature_bits != 0 {
        policy.signature_bits
    } else {
        issuer.default_signature_bits
    };
    let algorithm = select_signature_algorithm(key, bits)?;

    let mut template = build_intermediate_template(&issuer, &csr, policy, algorithm)?;
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
