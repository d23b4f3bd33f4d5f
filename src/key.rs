use ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use ed25519_dalek::SigningKey as Ed25519SigningKey;
use ed25519_dalek::VerifyingKey as Ed25519VerifyingKey;
use p256::ecdsa::{SigningKey as P256SigningKey, VerifyingKey as P256VerifyingKey};
use p384::ecdsa::{SigningKey as P384SigningKey, VerifyingKey as P384VerifyingKey};
use p521::ecdsa::{SigningKey as P521SigningKey, VerifyingKey as P521VerifyingKey};
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::pkcs1v15::{
    Signature as RsaSignature, SigningKey as RsaSigningKey, VerifyingKey as RsaVerifyingKey,
};
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::{Sha256, Sha384, Sha512};
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::cert::SignatureAlgorithm;
use crate::error::CaKitError;

/// Public key algorithm family, used for cross-signing compatibility checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAlgorithm {
    Rsa,
    Ecdsa,
    Ed25519,
}

impl std::fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyAlgorithm::Rsa => write!(f, "RSA"),
            KeyAlgorithm::Ecdsa => write!(f, "ECDSA"),
            KeyAlgorithm::Ed25519 => write!(f, "Ed25519"),
        }
    }
}

/// Supported key types for signing operations.
pub enum KeyPair {
    Rsa {
        private: Box<RsaPrivateKey>,
        public: RsaPublicKey,
    },
    EcdsaP256 {
        signing_key: P256SigningKey,
        verifying_key: P256VerifyingKey,
    },
    EcdsaP384 {
        signing_key: P384SigningKey,
        verifying_key: P384VerifyingKey,
    },
    EcdsaP521 {
        signing_key: P521SigningKey,
        verifying_key: P521VerifyingKey,
    },
    Ed25519 {
        signing_key: Ed25519SigningKey,
    },
}

impl KeyPair {
    /// Generate an RSA key pair with the specified number of bits.
    pub fn generate_rsa(bits: usize) -> Result<Self, CaKitError> {
        let mut rng = rand_core::OsRng;
        let private = RsaPrivateKey::new(&mut rng, bits)
            .map_err(|e| CaKitError::SigningFailure(format!("RSA key generation failed: {e}")))?;
        let public = RsaPublicKey::from(&private);
        Ok(KeyPair::Rsa {
            private: Box::new(private),
            public,
        })
    }

    /// Generate an ECDSA P-256 key pair.
    pub fn generate_ecdsa_p256() -> Self {
        let mut rng = rand_core::OsRng;
        let signing_key = P256SigningKey::random(&mut rng);
        let verifying_key = signing_key.verifying_key().to_owned();
        KeyPair::EcdsaP256 {
            signing_key,
            verifying_key,
        }
    }

    /// Generate an ECDSA P-384 key pair.
    pub fn generate_ecdsa_p384() -> Self {
        let mut rng = rand_core::OsRng;
        let signing_key = P384SigningKey::random(&mut rng);
        let verifying_key = signing_key.verifying_key().to_owned();
        KeyPair::EcdsaP384 {
            signing_key,
            verifying_key,
        }
    }

    /// Generate an ECDSA P-521 key pair.
    pub fn generate_ecdsa_p521() -> Self {
        let mut rng = rand_core::OsRng;
        let signing_key = P521SigningKey::random(&mut rng);
        let verifying_key = P521VerifyingKey::from(&signing_key);
        KeyPair::EcdsaP521 {
            signing_key,
            verifying_key,
        }
    }

    /// Generate an Ed25519 key pair.
    pub fn generate_ed25519() -> Self {
        let mut rng = rand_core::OsRng;
        let signing_key = Ed25519SigningKey::generate(&mut rng);
        KeyPair::Ed25519 { signing_key }
    }

    /// Returns the key's algorithm family.
    pub fn algorithm(&self) -> KeyAlgorithm {
        match self {
            KeyPair::Rsa { .. } => KeyAlgorithm::Rsa,
            KeyPair::EcdsaP256 { .. } | KeyPair::EcdsaP384 { .. } | KeyPair::EcdsaP521 { .. } => {
                KeyAlgorithm::Ecdsa
            }
            KeyPair::Ed25519 { .. } => KeyAlgorithm::Ed25519,
        }
    }

    /// Returns the public half of this key pair.
    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_key_pair(self)
    }

    /// Encodes the public half as a SubjectPublicKeyInfo structure.
    pub fn as_spki(&self) -> Result<SubjectPublicKeyInfoOwned, CaKitError> {
        self.public_key().to_spki()
    }

    /// Signs `data` using the given signature algorithm.
    ///
    /// RSA produces a PKCS#1 v1.5 signature, ECDSA a DER-encoded signature
    /// over the selected SHA-2 digest, and Ed25519 its fixed-form signature.
    pub fn sign_data(
        &self,
        data: &[u8],
        algorithm: SignatureAlgorithm,
    ) -> Result<Vec<u8>, CaKitError> {
        match (self, algorithm) {
            (KeyPair::Rsa { private, .. }, SignatureAlgorithm::Sha256WithRSA) => {
                let signing_key: RsaSigningKey<Sha256> = RsaSigningKey::new((**private).clone());
                Ok(signing_key.sign(data).to_vec())
            }
            (KeyPair::Rsa { private, .. }, SignatureAlgorithm::Sha384WithRSA) => {
                let signing_key: RsaSigningKey<Sha384> = RsaSigningKey::new((**private).clone());
                Ok(signing_key.sign(data).to_vec())
            }
            (KeyPair::Rsa { private, .. }, SignatureAlgorithm::Sha512WithRSA) => {
                let signing_key: RsaSigningKey<Sha512> = RsaSigningKey::new((**private).clone());
                Ok(signing_key.sign(data).to_vec())
            }
            (KeyPair::EcdsaP256 { signing_key, .. }, alg) if alg.is_ecdsa() => {
                let digest = alg.digest(data).ok_or_else(|| {
                    CaKitError::SigningFailure("no digest for signature algorithm".to_string())
                })?;
                let signature: p256::ecdsa::Signature = signing_key
                    .sign_prehash(&digest)
                    .map_err(|e| CaKitError::SigningFailure(e.to_string()))?;
                Ok(signature.to_der().to_vec())
            }
            (KeyPair::EcdsaP384 { signing_key, .. }, alg) if alg.is_ecdsa() => {
                let digest = alg.digest(data).ok_or_else(|| {
                    CaKitError::SigningFailure("no digest for signature algorithm".to_string())
                })?;
                let signature: p384::ecdsa::Signature = signing_key
                    .sign_prehash(&digest)
                    .map_err(|e| CaKitError::SigningFailure(e.to_string()))?;
                Ok(signature.to_der().to_vec())
            }
            (KeyPair::EcdsaP521 { signing_key, .. }, alg) if alg.is_ecdsa() => {
                let digest = alg.digest(data).ok_or_else(|| {
                    CaKitError::SigningFailure("no digest for signature algorithm".to_string())
                })?;
                let signature: p521::ecdsa::Signature = signing_key
                    .sign_prehash(&digest)
                    .map_err(|e| CaKitError::SigningFailure(e.to_string()))?;
                Ok(signature.to_der().to_vec())
            }
            (KeyPair::Ed25519 { signing_key }, SignatureAlgorithm::Ed25519) => {
                Ok(signing_key.sign(data).to_vec())
            }
            (key, alg) => Err(CaKitError::SigningFailure(format!(
                "signature algorithm {alg:?} is not usable with a {} key",
                key.algorithm()
            ))),
        }
    }
}

/// The public half of a key pair, as embedded in CSRs and certificates.
#[derive(Clone)]
pub enum PublicKey {
    Rsa(RsaPublicKey),
    EcdsaP256(P256VerifyingKey),
    EcdsaP384(P384VerifyingKey),
    EcdsaP521(P521VerifyingKey),
    Ed25519(Ed25519VerifyingKey),
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PublicKey").field(&self.algorithm()).finish()
    }
}

impl PublicKey {
    /// Extracts the public key from a key pair.
    pub fn from_key_pair(key_pair: &KeyPair) -> Self {
        match key_pair {
            KeyPair::Rsa { public, .. } => PublicKey::Rsa(public.clone()),
            KeyPair::EcdsaP256 { verifying_key, .. } => PublicKey::EcdsaP256(*verifying_key),
            KeyPair::EcdsaP384 { verifying_key, .. } => PublicKey::EcdsaP384(*verifying_key),
            KeyPair::EcdsaP521 { verifying_key, .. } => PublicKey::EcdsaP521(verifying_key.clone()),
            KeyPair::Ed25519 { signing_key } => PublicKey::Ed25519(signing_key.verifying_key()),
        }
    }

    /// Parses a public key out of a SubjectPublicKeyInfo structure.
    pub fn from_x509spki(spki: &SubjectPublicKeyInfoOwned) -> Result<Self, CaKitError> {
        let raw = spki.subject_public_key.raw_bytes();
        match spki.algorithm.oid {
            const_oid::db::rfc5912::RSA_ENCRYPTION => {
                let public = RsaPublicKey::from_pkcs1_der(raw).map_err(|e| {
                    CaKitError::InvalidCertificateRequest(format!("invalid RSA public key: {e}"))
                })?;
                Ok(PublicKey::Rsa(public))
            }
            const_oid::db::rfc5912::ID_EC_PUBLIC_KEY => {
                let curve = spki
                    .algorithm
                    .parameters
                    .as_ref()
                    .ok_or_else(|| {
                        CaKitError::InvalidCertificateRequest(
                            "EC public key is missing its curve parameter".to_string(),
                        )
                    })?
                    .decode_as::<const_oid::ObjectIdentifier>()
                    .map_err(|e| {
                        CaKitError::InvalidCertificateRequest(format!(
                            "invalid EC curve parameter: {e}"
                        ))
                    })?;
                match curve {
                    const_oid::db::rfc5912::SECP_256_R_1 => P256VerifyingKey::from_sec1_bytes(raw)
                        .map(PublicKey::EcdsaP256)
                        .map_err(|e| {
                            CaKitError::InvalidCertificateRequest(format!(
                                "invalid P-256 public key: {e}"
                            ))
                        }),
                    const_oid::db::rfc5912::SECP_384_R_1 => P384VerifyingKey::from_sec1_bytes(raw)
                        .map(PublicKey::EcdsaP384)
                        .map_err(|e| {
                            CaKitError::InvalidCertificateRequest(format!(
                                "invalid P-384 public key: {e}"
                            ))
                        }),
                    const_oid::db::rfc5912::SECP_521_R_1 => P521VerifyingKey::from_sec1_bytes(raw)
                        .map(PublicKey::EcdsaP521)
                        .map_err(|e| {
                            CaKitError::InvalidCertificateRequest(format!(
                                "invalid P-521 public key: {e}"
                            ))
                        }),
                    other => Err(CaKitError::InvalidCertificateRequest(format!(
                        "unsupported EC curve {other}"
                    ))),
                }
            }
            const_oid::db::rfc8410::ID_ED_25519 => {
                let bytes: &[u8; 32] = raw.try_into().map_err(|_| {
                    CaKitError::InvalidCertificateRequest(
                        "Ed25519 public key must be 32 bytes".to_string(),
                    )
                })?;
                Ed25519VerifyingKey::from_bytes(bytes)
                    .map(PublicKey::Ed25519)
                    .map_err(|e| {
                        CaKitError::InvalidCertificateRequest(format!(
                            "invalid Ed25519 public key: {e}"
                        ))
                    })
            }
            other => Err(CaKitError::InvalidCertificateRequest(format!(
                "unsupported public key algorithm {other}"
            ))),
        }
    }

    /// Returns the key's algorithm family.
    pub fn algorithm(&self) -> KeyAlgorithm {
        match self {
            PublicKey::Rsa(_) => KeyAlgorithm::Rsa,
            PublicKey::EcdsaP256(_) | PublicKey::EcdsaP384(_) | PublicKey::EcdsaP521(_) => {
                KeyAlgorithm::Ecdsa
            }
            PublicKey::Ed25519(_) => KeyAlgorithm::Ed25519,
        }
    }

    /// Encodes the key as a SubjectPublicKeyInfo structure.
    pub fn to_spki(&self) -> Result<SubjectPublicKeyInfoOwned, CaKitError> {
        let encode_err =
            |e: x509_cert::spki::Error| CaKitError::InvalidEncoding(format!("SPKI encoding: {e}"));
        match self {
            PublicKey::Rsa(public) => {
                SubjectPublicKeyInfoOwned::from_key(public.clone()).map_err(encode_err)
            }
            PublicKey::EcdsaP256(verifying_key) => {
                SubjectPublicKeyInfoOwned::from_key(*verifying_key).map_err(encode_err)
            }
            PublicKey::EcdsaP384(verifying_key) => {
                SubjectPublicKeyInfoOwned::from_key(*verifying_key).map_err(encode_err)
            }
            PublicKey::EcdsaP521(verifying_key) => {
                // p521's verifying key wrapper has no direct SPKI encoder.
                let point = verifying_key.to_encoded_point(false);
                let public = p521::PublicKey::from_sec1_bytes(point.as_bytes())
                    .map_err(|e| CaKitError::InvalidEncoding(format!("SPKI encoding: {e}")))?;
                SubjectPublicKeyInfoOwned::from_key(public).map_err(encode_err)
            }
            PublicKey::Ed25519(verifying_key) => {
                let pk_bytes = verifying_key.to_bytes();
                Ok(SubjectPublicKeyInfoOwned {
                    algorithm: x509_cert::spki::AlgorithmIdentifierOwned {
                        oid: const_oid::db::rfc8410::ID_ED_25519,
                        parameters: None,
                    },
                    subject_public_key: der::asn1::BitString::from_bytes(&pk_bytes)
                        .map_err(|e| CaKitError::InvalidEncoding(e.to_string()))?,
                })
            }
        }
    }

    /// Verifies `signature` over `message` under the given signature
    /// algorithm.
    ///
    /// Used for CSR self-proofs and self-issued certificate checks; callers
    /// map failures onto their own error variant.
    pub fn verify(
        &self,
        algorithm: SignatureAlgorithm,
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), CaKitError> {
        let bad_sig = |e: rsa::signature::Error| {
            CaKitError::InvalidCertificateRequest(format!("signature did not verify: {e}"))
        };
        match (self, algorithm) {
            (PublicKey::Rsa(public), SignatureAlgorithm::Sha256WithRSA) => {
                let verifying_key: RsaVerifyingKey<Sha256> = RsaVerifyingKey::new(public.clone());
                let signature = RsaSignature::try_from(signature).map_err(bad_sig)?;
                verifying_key.verify(message, &signature).map_err(bad_sig)
            }
            (PublicKey::Rsa(public), SignatureAlgorithm::Sha384WithRSA) => {
                let verifying_key: RsaVerifyingKey<Sha384> = RsaVerifyingKey::new(public.clone());
                let signature = RsaSignature::try_from(signature).map_err(bad_sig)?;
                verifying_key.verify(message, &signature).map_err(bad_sig)
            }
            (PublicKey::Rsa(public), SignatureAlgorithm::Sha512WithRSA) => {
                let verifying_key: RsaVerifyingKey<Sha512> = RsaVerifyingKey::new(public.clone());
                let signature = RsaSignature::try_from(signature).map_err(bad_sig)?;
                verifying_key.verify(message, &signature).map_err(bad_sig)
            }
            (PublicKey::EcdsaP256(verifying_key), alg) if alg.is_ecdsa() => {
                let signature = p256::ecdsa::Signature::from_der(signature).map_err(bad_sig)?;
                let digest = alg.digest(message).ok_or_else(|| {
                    CaKitError::InvalidCertificateRequest("no digest for algorithm".to_string())
                })?;
                verifying_key
                    .verify_prehash(&digest, &signature)
                    .map_err(bad_sig)
            }
            (PublicKey::EcdsaP384(verifying_key), alg) if alg.is_ecdsa() => {
                let signature = p384::ecdsa::Signature::from_der(signature).map_err(bad_sig)?;
                let digest = alg.digest(message).ok_or_else(|| {
                    CaKitError::InvalidCertificateRequest("no digest for algorithm".to_string())
                })?;
                verifying_key
                    .verify_prehash(&digest, &signature)
                    .map_err(bad_sig)
            }
            (PublicKey::EcdsaP521(verifying_key), alg) if alg.is_ecdsa() => {
                let signature = p521::ecdsa::Signature::from_der(signature).map_err(bad_sig)?;
                let digest = alg.digest(message).ok_or_else(|| {
                    CaKitError::InvalidCertificateRequest("no digest for algorithm".to_string())
                })?;
                verifying_key
                    .verify_prehash(&digest, &signature)
                    .map_err(bad_sig)
            }
            (PublicKey::Ed25519(verifying_key), SignatureAlgorithm::Ed25519) => {
                let signature = ed25519_dalek::Signature::from_slice(signature).map_err(bad_sig)?;
                verifying_key
                    .verify_strict(message, &signature)
                    .map_err(bad_sig)
            }
            (key, alg) => Err(CaKitError::InvalidCertificateRequest(format!(
                "signature algorithm {alg:?} does not match a {} key",
                key.algorithm()
            ))),
        }
    }
}
