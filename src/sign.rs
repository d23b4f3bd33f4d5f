//! Signature algorithm selection and the template signer.

use der::Encode;
use der::asn1::BitString;
use x509_cert::certificate::CertificateInner;

use crate::cert::{Certificate, SignatureAlgorithm};
use crate::error::CaKitError;
use crate::key::{KeyAlgorithm, KeyPair};
use crate::template::CertTemplate;

/// Maps an issuer key and a requested hash size to a signature algorithm.
///
/// `requested_bits` of 0 derives the hash from the key: SHA-256 for RSA and
/// P-256, SHA-384 for P-384, SHA-512 for P-521. Explicit values of 256, 384
/// or 512 select that hash within the key's family. Ed25519 has a fixed
/// algorithm and only accepts 0. Anything else is `InvalidParameter`.
pub fn select_signature_algorithm(
    key: &KeyPair,
    requested_bits: u32,
) -> Result<SignatureAlgorithm, CaKitError> {
    if key.algorithm() == KeyAlgorithm::Ed25519 {
        return match requested_bits {
            0 => Ok(SignatureAlgorithm::Ed25519),
            _ => Err(CaKitError::InvalidParameter(
                "ed25519 issuers use a fixed signature algorithm; signature_bits must be 0"
                    .to_string(),
            )),
        };
    }

    let bits = match requested_bits {
        0 => match key {
            KeyPair::Rsa { .. } | KeyPair::EcdsaP256 { .. } => 256,
            KeyPair::EcdsaP384 { .. } => 384,
            KeyPair::EcdsaP521 { .. } => 512,
            KeyPair::Ed25519 { .. } => unreachable!(),
        },
        256 | 384 | 512 => requested_bits,
        other => {
            return Err(CaKitError::InvalidParameter(format!(
                "signature_bits must be 0, 256, 384, or 512, got {other}"
            )));
        }
    };

    Ok(match (key.algorithm(), bits) {
        (KeyAlgorithm::Rsa, 256) => SignatureAlgorithm::Sha256WithRSA,
        (KeyAlgorithm::Rsa, 384) => SignatureAlgorithm::Sha384WithRSA,
        (KeyAlgorithm::Rsa, 512) => SignatureAlgorithm::Sha512WithRSA,
        (KeyAlgorithm::Ecdsa, 256) => SignatureAlgorithm::Sha256WithECDSA,
        (KeyAlgorithm::Ecdsa, 384) => SignatureAlgorithm::Sha384WithECDSA,
        (KeyAlgorithm::Ecdsa, 512) => SignatureAlgorithm::Sha512WithECDSA,
        _ => unreachable!(),
    })
}

/// Encodes the template's TBSCertificate, signs it with the issuer key, and
/// assembles the final certificate.
pub fn sign_template(key: &KeyPair, template: &CertTemplate) -> Result<Certificate, CaKitError> {
    let tbs = template.to_tbs_certificate()?;
    let tbs_der = tbs
        .to_der()
        .map_err(|e| CaKitError::SigningFailure(format!("TBSCertificate encoding failed: {e}")))?;

    let signature_bytes = key.sign_data(&tbs_der, template.signature_algorithm)?;
    let signature = BitString::from_bytes(&signature_bytes)
        .map_err(|e| CaKitError::SigningFailure(format!("signature encoding failed: {e}")))?;

    Ok(Certificate {
        inner: CertificateInner {
            tbs_certificate: tbs,
            signature_algorithm: template.signature_algorithm.into(),
            signature,
        },
    })
}
