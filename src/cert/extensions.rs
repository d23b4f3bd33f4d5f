use const_oid::AssociatedOid;
use der::{
    Decode, Encode,
    asn1::{Ia5String, OctetString},
    oid::ObjectIdentifier,
};
use x509_cert::ext::pkix::constraints::name::GeneralSubtree;
use x509_cert::ext::pkix::crl::dp::DistributionPoint;
use x509_cert::ext::pkix::name::{DistributionPointName, GeneralName};

pub use der::flagset::FlagSet;
use x509_cert::ext::pkix::KeyUsage as X509KeyUsage;
pub use x509_cert::ext::pkix::KeyUsages;

use crate::error::CaKitError;

/// Trait for converting to and from X.509 extensions.
///
/// This trait provides methods to encode and decode X.509 extension values.
pub trait ToAndFromX509Extension {
    /// The Object Identifier (OID) for the extension.
    const OID: ObjectIdentifier;

    /// Encodes the extension into a DER-encoded byte vector.
    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CaKitError>;

    /// Decodes the extension from a DER-encoded byte slice.
    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, CaKitError>
    where
        Self: Sized;
}

/// Represents the Subject Alternative Name (SAN) extension.
///
/// This extension specifies additional DNS identities for the subject of the
/// certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectAltName {
    pub names: Vec<String>,
}

impl ToAndFromX509Extension for SubjectAltName {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::SubjectAltName::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CaKitError> {
        let san = x509_cert::ext::pkix::SubjectAltName(
            self.names
                .iter()
                .map(|name| {
                    Ia5String::try_from(name.clone())
                        .map(GeneralName::DnsName)
                        .map_err(|e| {
                            CaKitError::InvalidParameter(format!(
                                "{name:?} is not a valid DNS name: {e}"
                            ))
                        })
                })
                .collect::<Result<Vec<_>, _>>()?,
        );

        Ok(san.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, CaKitError> {
        let san = x509_cert::ext::pkix::SubjectAltName::from_der(extension)?;
        let names = san
            .0
            .iter()
            .map(|name| match name {
                GeneralName::DnsName(dns) => Ok(dns.to_string()),
                _ => Err(CaKitError::InvalidParameter(
                    "unsupported general name type".to_string(),
                )),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { names })
    }
}

/// Represents the Basic Constraints extension.
///
/// This extension indicates whether the certificate is a CA certificate and
/// how deep a chain it may sign.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BasicConstraints {
    pub is_ca: bool,
    pub max_path_length: Option<u32>,
}

impl ToAndFromX509Extension for BasicConstraints {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::BasicConstraints::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CaKitError> {
        let path_len_constraint = self
            .max_path_length
            .map(|v| {
                u8::try_from(v).map_err(|_| {
                    CaKitError::InvalidParameter(format!(
                        "path length constraint {v} exceeds the encodable maximum of {}",
                        u8::MAX
                    ))
                })
            })
            .transpose()?;
        let bc = x509_cert::ext::pkix::BasicConstraints {
            ca: self.is_ca,
            path_len_constraint,
        };

        Ok(bc.to_der()?)
    }

    fn from_x509_extension_value(der_bytes: &[u8]) -> Result<Self, CaKitError> {
        let bc = x509_cert::ext::pkix::BasicConstraints::from_der(der_bytes)?;
        Ok(Self {
            is_ca: bc.ca,
            max_path_length: bc.path_len_constraint.map(|v| v as u32),
        })
    }
}

/// Represents the Key Usage extension.
///
/// This extension defines the purpose of the key contained in the certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyUsage(pub FlagSet<KeyUsages>);

impl ToAndFromX509Extension for KeyUsage {
    const OID: ObjectIdentifier = <X509KeyUsage as AssociatedOid>::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CaKitError> {
        let ku = X509KeyUsage::from(self.0);
        Ok(ku.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, CaKitError> {
        let ku = X509KeyUsage::from_der(extension)?;
        Ok(Self(ku.0))
    }
}

/// Represents the Extended Key Usage extension.
///
/// This extension indicates purposes for which the public key may be used.
#[derive(Debug, Clone, Default)]
pub struct ExtendedKeyUsage {
    pub usage: Vec<ExtendedKeyUsageOption>,
}

impl ToAndFromX509Extension for ExtendedKeyUsage {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::ExtendedKeyUsage::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CaKitError> {
        let oids: Vec<ObjectIdentifier> = self.usage.iter().map(|v| (*v).into()).collect();
        let eku = x509_cert::ext::pkix::ExtendedKeyUsage(oids);
        Ok(eku.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, CaKitError> {
        let eku = x509_cert::ext::pkix::ExtendedKeyUsage::from_der(extension)?;
        let usage = eku
            .0
            .iter()
            .map(|v| match *v {
                const_oid::db::rfc5912::ID_KP_OCSP_SIGNING => {
                    Ok(ExtendedKeyUsageOption::OcspSigning)
                }
                const_oid::db::rfc5912::ID_KP_SERVER_AUTH => Ok(ExtendedKeyUsageOption::ServerAuth),
                const_oid::db::rfc5912::ID_KP_CLIENT_AUTH => Ok(ExtendedKeyUsageOption::ClientAuth),
                const_oid::db::rfc5912::ID_KP_CODE_SIGNING => {
                    Ok(ExtendedKeyUsageOption::CodeSigning)
                }
                const_oid::db::rfc5912::ID_KP_EMAIL_PROTECTION => {
                    Ok(ExtendedKeyUsageOption::EmailProtection)
                }
                const_oid::db::rfc5912::ID_KP_TIME_STAMPING => {
                    Ok(ExtendedKeyUsageOption::TimeStamping)
                }
                _ => Err(CaKitError::InvalidParameter(
                    "unsupported extended key usage option".to_string(),
                )),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { usage })
    }
}

/// Represents an option for the Extended Key Usage extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExtendedKeyUsageOption {
    ServerAuth,
    ClientAuth,
    CodeSigning,
    EmailProtection,
    TimeStamping,
    OcspSigning,
}

impl From<ExtendedKeyUsageOption> for ObjectIdentifier {
    fn from(value: ExtendedKeyUsageOption) -> Self {
        match value {
            ExtendedKeyUsageOption::OcspSigning => const_oid::db::rfc5912::ID_KP_OCSP_SIGNING,
            ExtendedKeyUsageOption::ServerAuth => const_oid::db::rfc5912::ID_KP_SERVER_AUTH,
            ExtendedKeyUsageOption::ClientAuth => const_oid::db::rfc5912::ID_KP_CLIENT_AUTH,
            ExtendedKeyUsageOption::CodeSigning => const_oid::db::rfc5912::ID_KP_CODE_SIGNING,
            ExtendedKeyUsageOption::EmailProtection => {
                const_oid::db::rfc5912::ID_KP_EMAIL_PROTECTION
            }
            ExtendedKeyUsageOption::TimeStamping => const_oid::db::rfc5912::ID_KP_TIME_STAMPING,
        }
    }
}

/// Represents the Authority Key Identifier (AKI) extension.
///
/// This extension identifies the public key corresponding to the private key
/// used to sign the certificate. The issuer name and serial refer to the
/// authority's own certificate.
#[derive(Debug, Clone)]
pub struct AuthorityKeyIdentifier {
    pub key_identifier: Vec<u8>,
    pub authority_cert_issuer: Option<x509_cert::name::Name>,
    pub authority_cert_serial_number: Option<Vec<u8>>,
}

impl ToAndFromX509Extension for AuthorityKeyIdentifier {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::AuthorityKeyIdentifier::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CaKitError> {
        let authority_cert_issuer = self
            .authority_cert_issuer
            .as_ref()
            .map(|name| vec![GeneralName::DirectoryName(name.clone())]);

        let authority_cert_serial_number = self
            .authority_cert_serial_number
            .as_ref()
            .map(|serial| x509_cert::serial_number::SerialNumber::new(serial.as_slice()))
            .transpose()?;

        let aki = x509_cert::ext::pkix::AuthorityKeyIdentifier {
            key_identifier: Some(OctetString::new(self.key_identifier.as_slice())?),
            authority_cert_issuer,
            authority_cert_serial_number,
        };

        Ok(aki.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, CaKitError> {
        let aki = x509_cert::ext::pkix::AuthorityKeyIdentifier::from_der(extension)?;

        let authority_cert_issuer = aki.authority_cert_issuer.as_ref().and_then(|names| {
            names.iter().find_map(|name| match name {
                GeneralName::DirectoryName(dn) => Some(dn.clone()),
                _ => None,
            })
        });

        Ok(Self {
            key_identifier: aki
                .key_identifier
                .map(|id| id.as_bytes().to_vec())
                .unwrap_or_default(),
            authority_cert_issuer,
            authority_cert_serial_number: aki
                .authority_cert_serial_number
                .map(|sn| sn.as_bytes().to_vec()),
        })
    }
}

/// Represents the Subject Key Identifier (SKI) extension.
///
/// Carries the digest identifying the certificate's own public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectKeyIdentifier(pub Vec<u8>);

impl ToAndFromX509Extension for SubjectKeyIdentifier {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::SubjectKeyIdentifier::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CaKitError> {
        let ski = x509_cert::ext::pkix::SubjectKeyIdentifier(OctetString::new(self.0.as_slice())?);
        Ok(ski.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, CaKitError> {
        let ski = x509_cert::ext::pkix::SubjectKeyIdentifier::from_der(extension)?;
        Ok(Self(ski.0.as_bytes().to_vec()))
    }
}

/// Represents the CRL Distribution Points extension as a list of URIs.
///
/// Each URI is encoded as its own distribution point with a single full name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrlDistributionPoints {
    pub uris: Vec<String>,
}

impl ToAndFromX509Extension for CrlDistributionPoints {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::CrlDistributionPoints::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CaKitError> {
        let points = self
            .uris
            .iter()
            .map(|uri| {
                let name = Ia5String::try_from(uri.clone())
                    .map(GeneralName::UniformResourceIdentifier)
                    .map_err(|e| {
                        CaKitError::InvalidParameter(format!("{uri:?} is not a valid URI: {e}"))
                    })?;
                Ok(DistributionPoint {
                    distribution_point: Some(DistributionPointName::FullName(vec![name])),
                    reasons: None,
                    crl_issuer: None,
                })
            })
            .collect::<Result<Vec<_>, CaKitError>>()?;

        Ok(x509_cert::ext::pkix::CrlDistributionPoints(points).to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, CaKitError> {
        let points = x509_cert::ext::pkix::CrlDistributionPoints::from_der(extension)?;
        let uris = points
            .0
            .iter()
            .filter_map(|point| match &point.distribution_point {
                Some(DistributionPointName::FullName(names)) => Some(names.iter()),
                _ => None,
            })
            .flatten()
            .filter_map(|name| match name {
                GeneralName::UniformResourceIdentifier(uri) => Some(uri.to_string()),
                _ => None,
            })
            .collect();
        Ok(Self { uris })
    }
}

/// Represents the Authority Information Access extension.
///
/// Carries OCSP responder URLs and issuing-certificate (caIssuers) URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorityInfoAccess {
    pub ocsp_servers: Vec<String>,
    pub issuing_certificates: Vec<String>,
}

impl ToAndFromX509Extension for AuthorityInfoAccess {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::AuthorityInfoAccessSyntax::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CaKitError> {
        let uri = |value: &String| {
            Ia5String::try_from(value.clone())
                .map(GeneralName::UniformResourceIdentifier)
                .map_err(|e| {
                    CaKitError::InvalidParameter(format!("{value:?} is not a valid URI: {e}"))
                })
        };

        let mut descriptions = Vec::new();
        for server in &self.ocsp_servers {
            descriptions.push(x509_cert::ext::pkix::AccessDescription {
                access_method: const_oid::db::rfc5912::ID_AD_OCSP,
                access_location: uri(server)?,
            });
        }
        for issuing in &self.issuing_certificates {
            descriptions.push(x509_cert::ext::pkix::AccessDescription {
                access_method: const_oid::db::rfc5912::ID_AD_CA_ISSUERS,
                access_location: uri(issuing)?,
            });
        }

        Ok(x509_cert::ext::pkix::AuthorityInfoAccessSyntax(descriptions).to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, CaKitError> {
        let aia = x509_cert::ext::pkix::AuthorityInfoAccessSyntax::from_der(extension)?;
        let mut out = Self::default();
        for description in aia.0 {
            let GeneralName::UniformResourceIdentifier(uri) = description.access_location else {
                continue;
            };
            match description.access_method {
                const_oid::db::rfc5912::ID_AD_OCSP => out.ocsp_servers.push(uri.to_string()),
                const_oid::db::rfc5912::ID_AD_CA_ISSUERS => {
                    out.issuing_certificates.push(uri.to_string())
                }
                _ => {}
            }
        }
        Ok(out)
    }
}

/// Represents the Name Constraints extension, restricted to DNS subtrees.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameConstraints {
    pub permitted_dns_domains: Vec<String>,
    pub excluded_dns_domains: Vec<String>,
}

impl ToAndFromX509Extension for NameConstraints {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::NameConstraints::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CaKitError> {
        let subtrees = |domains: &[String]| {
            if domains.is_empty() {
                return Ok(None);
            }
            domains
                .iter()
                .map(|domain| {
                    Ia5String::try_from(domain.clone())
                        .map(|name| GeneralSubtree {
                            base: GeneralName::DnsName(name),
                            minimum: 0,
                            maximum: None,
                        })
                        .map_err(|e| {
                            CaKitError::InvalidParameter(format!(
                                "{domain:?} is not a valid DNS domain: {e}"
                            ))
                        })
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Some)
        };

        let nc = x509_cert::ext::pkix::NameConstraints {
            permitted_subtrees: subtrees(&self.permitted_dns_domains)?,
            excluded_subtrees: subtrees(&self.excluded_dns_domains)?,
        };
        Ok(nc.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, CaKitError> {
        let nc = x509_cert::ext::pkix::NameConstraints::from_der(extension)?;
        let dns_names = |subtrees: Option<Vec<GeneralSubtree>>| {
            subtrees
                .unwrap_or_default()
                .into_iter()
                .filter_map(|subtree| match subtree.base {
                    GeneralName::DnsName(name) => Some(name.to_string()),
                    _ => None,
                })
                .collect()
        };
        Ok(Self {
            permitted_dns_domains: dns_names(nc.permitted_subtrees),
            excluded_dns_domains: dns_names(nc.excluded_subtrees),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::params::DistinguishedName;

    #[test]
    fn basic_constraints_round_trip() {
        let original = BasicConstraints {
            is_ca: true,
            max_path_length: Some(3),
        };
        let encoded = original.to_x509_extension_value().unwrap();
        let decoded = BasicConstraints::from_x509_extension_value(&encoded).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn authority_key_identifier_round_trip() {
        let issuer = DistinguishedName::builder()
            .common_name("Test CA".to_string())
            .organization("Test Org".to_string())
            .build()
            .as_x509_name()
            .unwrap();
        let original = AuthorityKeyIdentifier {
            key_identifier: vec![1, 2, 3, 4, 5],
            authority_cert_issuer: Some(issuer.clone()),
            authority_cert_serial_number: Some(vec![6, 7, 8, 9, 10]),
        };
        let encoded = original.to_x509_extension_value().unwrap();
        let decoded = AuthorityKeyIdentifier::from_x509_extension_value(&encoded).unwrap();
        assert_eq!(original.key_identifier, decoded.key_identifier);
        assert_eq!(Some(issuer), decoded.authority_cert_issuer);
        assert_eq!(
            original.authority_cert_serial_number,
            decoded.authority_cert_serial_number
        );
    }

    #[test]
    fn oversized_path_length_is_rejected() {
        let bc = BasicConstraints {
            is_ca: true,
            max_path_length: Some(256),
        };
        let err = bc.to_x509_extension_value().unwrap_err();
        assert!(matches!(err, CaKitError::InvalidParameter(_)));
    }

    #[test]
    fn key_usage_round_trip() {
        let original = KeyUsage(KeyUsages::KeyCertSign | KeyUsages::CRLSign);
        let encoded = original.to_x509_extension_value().unwrap();
        let decoded = KeyUsage::from_x509_extension_value(&encoded).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn extended_key_usage_round_trip() {
        let original = ExtendedKeyUsage {
            usage: vec![
                ExtendedKeyUsageOption::ServerAuth,
                ExtendedKeyUsageOption::ClientAuth,
            ],
        };
        let encoded = original.to_x509_extension_value().unwrap();
        let decoded = ExtendedKeyUsage::from_x509_extension_value(&encoded).unwrap();
        assert_eq!(original.usage, decoded.usage);
    }

    #[test]
    fn subject_alt_name_round_trip() {
        let original = SubjectAltName {
            names: vec!["example.com".to_string(), "www.example.com".to_string()],
        };
        let encoded = original.to_x509_extension_value().unwrap();
        let decoded = SubjectAltName::from_x509_extension_value(&encoded).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn crl_distribution_points_round_trip() {
        let original = CrlDistributionPoints {
            uris: vec![
                "http://crl.example.com/root.crl".to_string(),
                "http://backup.example.com/root.crl".to_string(),
            ],
        };
        let encoded = original.to_x509_extension_value().unwrap();
        let decoded = CrlDistributionPoints::from_x509_extension_value(&encoded).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn authority_info_access_round_trip() {
        let original = AuthorityInfoAccess {
            ocsp_servers: vec!["http://ocsp.example.com".to_string()],
            issuing_certificates: vec!["http://ca.example.com/ca.der".to_string()],
        };
        let encoded = original.to_x509_extension_value().unwrap();
        let decoded = AuthorityInfoAccess::from_x509_extension_value(&encoded).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn name_constraints_round_trip() {
        let original = NameConstraints {
            permitted_dns_domains: vec!["example.com".to_string()],
            excluded_dns_domains: vec!["evil.example.com".to_string()],
        };
        let encoded = original.to_x509_extension_value().unwrap();
        let decoded = NameConstraints::from_x509_extension_value(&encoded).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn subject_key_identifier_round_trip() {
        let original = SubjectKeyIdentifier(vec![0xde, 0xad, 0xbe, 0xef]);
        let encoded = original.to_x509_extension_value().unwrap();
        let decoded = SubjectKeyIdentifier::from_x509_extension_value(&encoded).unwrap();
        assert_eq!(original, decoded);
    }
}
