//! # Key Store Abstraction
//!
//! Abstracts the taxpayer's signing key and certificate behind a trait so
//! that callers can plug in an HSM, a smart card or a remote signer without
//! touching the control-code or envelope code.
//!
//! - [`RsaKeyStore`]: in-process RSA key loaded from PEM, with the matching
//!   X.509 certificate.
//!
//! ## Invariants
//!
//! - [`KeyStore`] is `Send + Sync` for use across async tasks.
//! - `sign` computes RSA-SHA256 PKCS#1 v1.5 over the exact bytes given.
//!   Callers pass canonical bytes; the store never re-encodes its input.
//! - An [`RsaKeyStore`] only exists with a parseable X.509 certificate whose
//!   subject key is its own public key.

use std::path::Path;

use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs1v15::{Signature, SigningKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::signature::{SignatureEncoding, Signer};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use x509_cert::der::{Decode, DecodePem, Encode};
use x509_cert::Certificate;

use crate::error::{KeyStoreError, SigningError};

/// Signing capability for registration requests.
///
/// Implementations must be `Send + Sync` so one store can serve concurrent
/// submissions.
pub trait KeyStore: Send + Sync {
    /// RSA-SHA256 PKCS#1 v1.5 signature over `data`.
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, SigningError>;

    /// DER encoding of the X.509 certificate matching the signing key.
    fn certificate_der(&self) -> &[u8];

    /// Human-readable name for this store (for diagnostics/logging).
    fn name(&self) -> &str;
}

// ─── RsaKeyStore ─────────────────────────────────────────────────────────

/// In-memory RSA key store.
///
/// Holds the private key and the DER certificate issued for it. The key is
/// never exposed; `Debug` prints only the modulus size and certificate
/// length.
pub struct RsaKeyStore {
    signing_key: SigningKey<Sha256>,
    public_key: RsaPublicKey,
    certificate_der: Vec<u8>,
}

impl RsaKeyStore {
    /// Build a store from a parsed private key and a DER certificate.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError::InvalidCertificate`] if `certificate_der` is
    /// not an X.509 certificate or certifies a different public key.
    pub fn new(private_key: RsaPrivateKey, certificate_der: Vec<u8>) -> Result<Self, KeyStoreError> {
        let certificate = Certificate::from_der(&certificate_der)
            .map_err(|e| KeyStoreError::InvalidCertificate(e.to_string()))?;
        let public_key = private_key.to_public_key();
        check_certified_key(&certificate, &public_key)?;
        Ok(Self {
            signing_key: SigningKey::<Sha256>::new(private_key),
            public_key,
            certificate_der,
        })
    }

    /// Load from PEM text.
    ///
    /// The key may be PKCS#8 (`BEGIN PRIVATE KEY`) or PKCS#1
    /// (`BEGIN RSA PRIVATE KEY`). The certificate must be a
    /// `BEGIN CERTIFICATE` block.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError::InvalidKey`] if the key fails to decode, and
    /// [`KeyStoreError::InvalidCertificate`] if the certificate fails to
    /// decode or does not certify the key.
    pub fn from_pem(key_pem: &str, certificate_pem: &str) -> Result<Self, KeyStoreError> {
        let private_key = RsaPrivateKey::from_pkcs8_pem(key_pem).or_else(|pkcs8_err| {
            RsaPrivateKey::from_pkcs1_pem(key_pem).map_err(|pkcs1_err| {
                KeyStoreError::InvalidKey(format!("PKCS#8: {pkcs8_err}; PKCS#1: {pkcs1_err}"))
            })
        })?;
        let certificate_der = Certificate::from_pem(certificate_pem)
            .and_then(|certificate| certificate.to_der())
            .map_err(|e| KeyStoreError::InvalidCertificate(e.to_string()))?;

        let store = Self::new(private_key, certificate_der)?;
        tracing::info!(
            key_bits = store.public_key.size() * 8,
            certificate_bytes = store.certificate_der.len(),
            "loaded RSA key store"
        );
        Ok(store)
    }

    /// Load from PEM files on disk.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError::Io`] if a file cannot be read, otherwise the
    /// same errors as [`RsaKeyStore::from_pem`].
    pub fn from_pem_files(
        key_path: impl AsRef<Path>,
        certificate_path: impl AsRef<Path>,
    ) -> Result<Self, KeyStoreError> {
        let key_pem = read_to_string(key_path.as_ref())?;
        let certificate_pem = read_to_string(certificate_path.as_ref())?;
        Self::from_pem(&key_pem, &certificate_pem)
    }

    /// Public half of the signing key.
    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }
}

impl KeyStore for RsaKeyStore {
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, SigningError> {
        let signature: Signature = self
            .signing_key
            .try_sign(data)
            .map_err(|e| SigningError::Backend(e.to_string()))?;
        Ok(signature.to_vec())
    }

    fn certificate_der(&self) -> &[u8] {
        &self.certificate_der
    }

    fn name(&self) -> &str {
        "RsaKeyStore"
    }
}

impl std::fmt::Debug for RsaKeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RsaKeyStore")
            .field("key_bits", &(self.public_key.size() * 8))
            .field("certificate_bytes", &self.certificate_der.len())
            .finish_non_exhaustive()
    }
}

fn read_to_string(path: &Path) -> Result<String, KeyStoreError> {
    std::fs::read_to_string(path).map_err(|source| KeyStoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// The certificate's subject key must be the signing key.
fn check_certified_key(
    certificate: &Certificate,
    public_key: &RsaPublicKey,
) -> Result<(), KeyStoreError> {
    let spki_der = certificate
        .tbs_certificate
        .subject_public_key_info
        .to_der()
        .map_err(|e| KeyStoreError::InvalidCertificate(e.to_string()))?;
    let certified = RsaPublicKey::from_public_key_der(&spki_der).map_err(|e| {
        KeyStoreError::InvalidCertificate(format!("certificate key is not RSA: {e}"))
    })?;
    if &certified != public_key {
        return Err(KeyStoreError::InvalidCertificate(
            "certificate does not certify the signing key".into(),
        ));
    }
    Ok(())
}

// ─── Tests ───────────────────────────────────────────────────────────────
