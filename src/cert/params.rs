use bon::Builder;
use const_oid::ObjectIdentifier;
use time::Duration;
use time::OffsetDateTime;
use x509_cert::name::RdnSequence;

use super::extensions::ToAndFromX509Extension;
use crate::error::CaKitError;

/// Distinguished name parameters for building an X.509 certificate.
///
/// This struct represents the subject or issuer name in a certificate.
#[derive(Clone, Debug, Builder, Default)]
pub struct DistinguishedName {
    pub common_name: String,
    pub country: Option<String>,
    pub state: Option<String>,
    pub locality: Option<String>,
    pub organization: Option<String>,
    pub organization_unit: Option<String>,
}

impl DistinguishedName {
    /// Converts the distinguished name to an X.509-compatible format.
    ///
    /// Only attributes that are actually set appear in the result.
    pub fn as_x509_name(&self) -> Result<x509_cert::name::Name, CaKitError> {
        use core::str::FromStr;
        let mut parts = vec![format!("CN={}", self.common_name)];
        if let Some(organization_unit) = &self.organization_unit {
            parts.push(format!("OU={organization_unit}"));
        }
        if let Some(organization) = &self.organization {
            parts.push(format!("O={organization}"));
        }
        if let Some(locality) = &self.locality {
            parts.push(format!("L={locality}"));
        }
        if let Some(state) = &self.state {
            parts.push(format!("ST={state}"));
        }
        if let Some(country) = &self.country {
            parts.push(format!("C={country}"));
        }
        let rfc4514_name = parts.join(",");
        RdnSequence::from_str(&rfc4514_name).map_err(|e| {
            CaKitError::InvalidParameter(format!(
                "{rfc4514_name:?} is not a valid distinguished name: {e}"
            ))
        })
    }

}

/// Certificate validity period.
///
/// This struct represents the `notBefore` and `notAfter` fields in a
/// certificate.
#[derive(Clone, Debug)]
pub struct Validity {
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
}

impl Validity {
    /// Creates a validity period starting now for the given number of days.
    pub fn for_days(days: i64) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            not_before: now,
            not_after: now + Duration::days(days),
        }
    }

    /// Converts to x509 validity, choosing the time encoding per RFC 5280
    /// (UTCTime through 2049, GeneralizedTime afterwards).
    pub fn to_x509(&self) -> Result<x509_cert::time::Validity, CaKitError> {
        Ok(x509_cert::time::Validity {
            not_before: to_x509_time(self.not_before)?,
            not_after: to_x509_time(self.not_after)?,
        })
    }
}

pub(crate) fn to_x509_time(value: OffsetDateTime) -> Result<x509_cert::time::Time, CaKitError> {
    let bad_time =
        |e: der::Error| CaKitError::InvalidParameter(format!("{value} is not encodable: {e}"));
    if value.year() < 2050 {
        der::asn1::UtcTime::from_system_time(value.into())
            .map(x509_cert::time::Time::UtcTime)
            .map_err(bad_time)
    } else {
        let since_epoch = std::time::Duration::try_from(value - OffsetDateTime::UNIX_EPOCH)
            .map_err(|e| CaKitError::InvalidParameter(format!("{value} predates the epoch: {e}")))?;
        der::asn1::GeneralizedTime::from_unix_duration(since_epoch)
            .map(x509_cert::time::Time::GeneralTime)
            .map_err(bad_time)
    }
}

pub(crate) fn from_x509_time(value: &x509_cert::time::Time) -> OffsetDateTime {
    match value {
        x509_cert::time::Time::UtcTime(ut) => OffsetDateTime::from(ut.to_system_time()),
        x509_cert::time::Time::GeneralTime(gt) => OffsetDateTime::from(gt.to_system_time()),
    }
}

/// Represents an X.509 extension.
///
/// This struct contains the OID, criticality, and value of an extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionParam {
    pub oid: ObjectIdentifier,
    pub critical: bool,
    /// DER-encoded extension value
    pub value: Vec<u8>,
}

impl ExtensionParam {
    /// Creates an `ExtensionParam` from a specific extension.
    pub fn from_extension<E: ToAndFromX509Extension>(
        extension: E,
        critical: bool,
    ) -> Result<Self, CaKitError> {
        let value = extension.to_x509_extension_value()?;
        Ok(Self {
            oid: E::OID,
            critical,
            value,
        })
    }

    /// Decodes an `ExtensionParam` into a specific extension.
    pub fn to_extension<E: ToAndFromX509Extension>(&self) -> Result<E, CaKitError> {
        E::from_x509_extension_value(&self.value)
    }
}

/// Caller-supplied policy parameters for signing an intermediate CA
/// certificate.
///
/// # Fields
/// * `subject` - Subject attributes applied when the CSR's own values are
///   not authoritative.
/// * `alt_names` - DNS subject alternative names, same condition.
/// * `ttl` - Requested lifetime; `not_after` wins when both are given.
/// * `not_after` - Explicit expiry.
/// * `max_path_length` - Path length for the Basic Constraints extension;
///   absent means unconstrained.
/// * `permitted_dns_domains` / `excluded_dns_domains` - Name constraints
///   placed on the issued CA certificate.
/// * `use_csr_values` - When true, subject, SANs, extensions, and requested
///   key usages come from the CSR instead of this struct.
/// * `signature_bits` - 0 to derive the signature hash from the issuer key,
///   or one of 256/384/512.
#[derive(Clone, Debug, Builder)]
pub struct PolicyInput {
    #[builder(default)]
    pub subject: DistinguishedName,
    #[builder(default)]
    pub alt_names: Vec<String>,
    pub ttl: Option<Duration>,
    pub not_after: Option<OffsetDateTime>,
    pub max_path_length: Option<u32>,
    #[builder(default)]
    pub permitted_dns_domains: Vec<String>,
    #[builder(default)]
    pub excluded_dns_domains: Vec<String>,
    #[builder(default)]
    pub use_csr_values: bool,
    #[builder(default)]
    pub signature_bits: u32,
}
