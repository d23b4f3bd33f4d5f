use der::EncodePem;
use der::asn1::{Any, BitString, SetOfVec};
use sha1::Sha1;

use cakit::cert::Certificate;
use cakit::cert::extensions::{BasicConstraints, KeyUsage, KeyUsages, SubjectKeyIdentifier};
use cakit::cert::params::{DistinguishedName, ExtensionParam, Validity};
use cakit::issuer::{IssuerSnapshot, IssuerUrls, MemoryIssuerRepository};
use cakit::key::KeyPair;
use cakit::sign::{select_signature_algorithm, sign_template};
use cakit::template::CertTemplate;

pub fn test_urls() -> IssuerUrls {
    IssuerUrls {
        crl_distribution_points: vec!["http://crl.example.com/root.crl".to_string()],
        ocsp_servers: vec!["http://ocsp.example.com".to_string()],
        issuing_certificates: vec!["http://aia.example.com/root.pem".to_string()],
    }
}

/// Builds a self-signed root and wraps it as a repository snapshot.
pub fn make_root(key: KeyPair, path_len: Option<u32>, urls: IssuerUrls) -> IssuerSnapshot {
    let subject = DistinguishedName::builder()
        .common_name("Test Root CA".to_string())
        .organization("CaKit Tests".to_string())
        .build()
        .as_x509_name()
        .unwrap();

    let spki = key.as_spki().unwrap();
    let ski = <Sha1 as sha1::Digest>::digest(spki.subject_public_key.raw_bytes()).to_vec();

    let template = CertTemplate {
        serial_number: vec![1],
        signature_algorithm: select_signature_algorithm(&key, 0).unwrap(),
        issuer: subject.clone(),
        validity: Validity::for_days(3650).to_x509().unwrap(),
        subject,
        subject_public_key_info: spki,
        extensions: vec![
            ExtensionParam::from_extension(
                BasicConstraints {
                    is_ca: true,
                    max_path_length: path_len,
                },
                true,
            )
            .unwrap(),
            ExtensionParam::from_extension(
                KeyUsage(KeyUsages::KeyCertSign | KeyUsages::CRLSign),
                true,
            )
            .unwrap(),
            ExtensionParam::from_extension(SubjectKeyIdentifier(ski), false).unwrap(),
        ],
    };

    let cert = sign_template(&key, &template).unwrap();

    IssuerSnapshot {
        id: "root".to_string(),
        cert,
        chain: Vec::new(),
        signing_key: Some(key),
        urls,
        default_signature_bits: 0,
    }
}

pub fn make_repo(root: IssuerSnapshot) -> MemoryIssuerRepository {
    let repo = MemoryIssuerRepository::new();
    repo.insert(root);
    repo
}

/// Hand-assembles a PKCS#10 CSR with an optional extensionRequest attribute.
pub fn build_csr(key: &KeyPair, common_name: &str, extensions: Vec<ExtensionParam>) -> String {
    let subject = DistinguishedName::builder()
        .common_name(common_name.to_string())
        .build()
        .as_x509_name()
        .unwrap();

    let mut attributes = SetOfVec::new();
    if !extensions.is_empty() {
        let mut x509_extensions = Vec::new();
        for param in extensions {
            x509_extensions.push(x509_cert::ext::Extension {
                extn_id: param.oid,
                critical: param.critical,
                extn_value: der::asn1::OctetString::new(param.value).unwrap(),
            });
        }
        let value = Any::encode_from(&x509_extensions).unwrap();
        attributes
            .insert(x509_cert::attr::Attribute {
                oid: const_oid::db::rfc5912::ID_EXTENSION_REQ,
                values: SetOfVec::try_from(vec![value]).unwrap(),
            })
            .unwrap();
    }

    let info = x509_cert::request::CertReqInfo {
        version: x509_cert::request::Version::V1,
        subject,
        public_key: key.as_spki().unwrap(),
        attributes,
    };

    let algorithm = select_signature_algorithm(key, 0).unwrap();
    let message = der::Encode::to_der(&info).unwrap();
    let signature = key.sign_data(&message, algorithm).unwrap();

    let csr = x509_cert::request::CertReq {
        info,
        algorithm: algorithm.into(),
        signature: BitString::from_bytes(&signature).unwrap(),
    };
    csr.to_pem(pkcs8::LineEnding::LF).unwrap()
}

/// A CSR whose signature covers the wrong bytes.
pub fn build_forged_csr(key: &KeyPair, common_name: &str) -> String {
    let subject = DistinguishedName::builder()
        .common_name(common_name.to_string())
        .build()
        .as_x509_name()
        .unwrap();

    let info = x509_cert::request::CertReqInfo {
        version: x509_cert::request::Version::V1,
        subject,
        public_key: key.as_spki().unwrap(),
        attributes: SetOfVec::new(),
    };

    let algorithm = select_signature_algorithm(key, 0).unwrap();
    let signature = key.sign_data(b"some other message entirely", algorithm).unwrap();

    let csr = x509_cert::request::CertReq {
        info,
        algorithm: algorithm.into(),
        signature: BitString::from_bytes(&signature).unwrap(),
    };
    csr.to_pem(pkcs8::LineEnding::LF).unwrap()
}

/// A self-signed CA certificate in PEM, for cross-signing inputs.
pub fn self_signed_pem(key: &KeyPair, common_name: &str, extra: Vec<ExtensionParam>) -> String {
    let subject = DistinguishedName::builder()
        .common_name(common_name.to_string())
        .build()
        .as_x509_name()
        .unwrap();

    let mut extensions = vec![
        ExtensionParam::from_extension(
            BasicConstraints {
                is_ca: true,
                max_path_length: None,
            },
            true,
        )
        .unwrap(),
        ExtensionParam::from_extension(
            KeyUsage(KeyUsages::KeyCertSign | KeyUsages::CRLSign),
            true,
        )
        .unwrap(),
    ];
    extensions.extend(extra);

    let template = CertTemplate {
        serial_number: vec![0x0a, 0x0b],
        signature_algorithm: select_signature_algorithm(key, 0).unwrap(),
        issuer: subject.clone(),
        validity: Validity::for_days(1825).to_x509().unwrap(),
        subject,
        subject_public_key_info: key.as_spki().unwrap(),
        extensions,
    };

    sign_template(key, &template).unwrap().to_pem().unwrap()
}

/// Returns (critical, value) of the given extension, if present.
pub fn find_extension(
    cert: &Certificate,
    oid: const_oid::ObjectIdentifier,
) -> Option<(bool, Vec<u8>)> {
    cert.inner
        .tbs_certificate
        .extensions
        .as_ref()?
        .iter()
        .find(|ext| ext.extn_id == oid)
        .map(|ext| (ext.critical, ext.extn_value.as_bytes().to_vec()))
}
