//! The fully-resolved certificate template handed to the signer.

use der::asn1::OctetString;
use x509_cert::certificate::{Rfc5280, TbsCertificateInner, Version};
use x509_cert::ext::Extension;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::SubjectPublicKeyInfoOwned;
use x509_cert::time::Validity;

use crate::cert::SignatureAlgorithm;
use crate::cert::params::ExtensionParam;
use crate::error::CaKitError;

/// Everything the signer needs, resolved ahead of time.
///
/// By the time a template exists, all policy and validation decisions have
/// been made; signing it is a pure encode-and-sign step. The subject, SPKI
/// and validity are kept as raw X.509 structures so that values copied from
/// an input certificate or CSR survive byte-for-byte.
pub struct CertTemplate {
    pub serial_number: Vec<u8>,
    pub signature_algorithm: SignatureAlgorithm,
    pub issuer: Name,
    pub validity: Validity,
    pub subject: Name,
    pub subject_public_key_info: SubjectPublicKeyInfoOwned,
    pub extensions: Vec<ExtensionParam>,
}

impl CertTemplate {
    pub(crate) fn to_tbs_certificate(&self) -> Result<TbsCertificateInner<Rfc5280>, CaKitError> {
        let serial_number = SerialNumber::new(&self.serial_number).map_err(|e| {
            CaKitError::InvalidParameter(format!("invalid serial number: {e}"))
        })?;

        let mut extensions = Vec::with_capacity(self.extensions.len());
        for param in &self.extensions {
            extensions.push(Extension {
                extn_id: param.oid,
                critical: param.critical,
                extn_value: OctetString::new(param.value.clone())?,
            });
        }

        Ok(TbsCertificateInner {
            version: Version::V3,
            serial_number,
            signature: self.signature_algorithm.into(),
            issuer: self.issuer.clone(),
            validity: self.validity.clone(),
            subject: self.subject.clone(),
            subject_public_key_info: self.subject_public_key_info.clone(),
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions: if extensions.is_empty() {
                None
            } else {
                Some(extensions)
            },
        })
    }
}
