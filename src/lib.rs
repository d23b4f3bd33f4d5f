//! # CaKit - A Pure Rust CA Signing Library
//!
//! CaKit implements the certificate-authority side of a PKI: signing CSRs as
//! subordinate (intermediate) CA certificates and cross-signing self-issued
//! CA certificates under another issuer. It is built entirely with rustcrypto
//! libraries, with no dependencies on ring or openssl.
//!
//! ## Supported Key Types
//!
//! - **RSA**: 2048, 3072, and 4096-bit keys
//! - **ECDSA**: P-256, P-384, and P-521 curves
//! - **Ed25519**: Edwards curve digital signature algorithm
//!
//! ## Operations
//!
//! - [`sign_intermediate`]: validate a PKCS#10 CSR, merge caller policy with
//!   the request, and sign it as a CA certificate under a stored issuer.
//! - [`cross_sign`]: reissue a self-issued certificate under a different
//!   issuer, preserving its subject, key, validity, and extensions so the
//!   same CA gains a second trust path.
//!
//! Issuer storage and serial allocation are supplied by the caller through
//! the [`issuer::IssuerRepository`] trait; [`issuer::MemoryIssuerRepository`]
//! is provided for tests and embedded use.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cakit::{
//!     cert::params::{DistinguishedName, PolicyInput},
//!     issuer::{IssuerSnapshot, IssuerUrls, MemoryIssuerRepository},
//!     sign_intermediate,
//! };
//!
//! # fn main() -> Result<(), cakit::error::CaKitError> {
//! # let (root_cert, root_key) = unimplemented!();
//! let repo = MemoryIssuerRepository::new();
//! repo.insert(IssuerSnapshot {
//!     id: "root".to_string(),
//!     cert: root_cert,
//!     chain: Vec::new(),
//!     signing_key: Some(root_key),
//!     urls: IssuerUrls::default(),
//!     default_signature_bits: 0,
//! });
//!
//! let policy = PolicyInput::builder()
//!     .subject(
//!         DistinguishedName::builder()
//!             .common_name("Example Intermediate CA".to_string())
//!             .build(),
//!     )
//!     .max_path_length(0)
//!     .build();
//!
//! let csr_pem = "-----BEGIN CERTIFICATE REQUEST-----...";
//! let output = sign_intermediate(&repo, "root", csr_pem, &policy)?;
//! println!("{}", output.certificate.to_pem()?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`key`]: Key generation and cryptographic operations
//! - [`cert`]: Certificate types, parameters, and X.509 extensions
//! - [`issuer`]: Issuer snapshots and the repository interface
//! - [`request`]: CSR and self-issued certificate parsing and validation
//! - [`template`] / [`sign`]: Resolved templates and the signing step
//! - [`merge`]: Policy and extension merging for intermediate issuance
//! - [`error`]: Error types and handling

pub mod cert;
pub mod cross;
pub mod error;
pub mod intermediate;
pub mod issuer;
pub mod key;
pub mod merge;
pub mod request;
pub mod sign;
pub mod template;

pub use cross::cross_sign;
pub use intermediate::sign_intermediate;
