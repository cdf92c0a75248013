//! # Cryptographic Error Types
//!
//! Structured errors for key loading and signing in `eet-crypto`.

use std::path::PathBuf;

use thiserror::Error;

/// A signing operation failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SigningError {
    /// The key store could not produce a signature.
    #[error("signing backend failed: {0}")]
    Backend(String),

    /// A PKP value could not be decoded back into signature bytes.
    #[error("PKP value is not valid base64: {0}")]
    PkpEncoding(String),
}

/// Key material could not be loaded.
#[derive(Error, Debug)]
pub enum KeyStoreError {
    /// Reading a key or certificate file failed.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The private key PEM is neither PKCS#8 nor PKCS#1 RSA.
    #[error("invalid RSA private key: {0}")]
    InvalidKey(String),

    /// The certificate does not decode as X.509 or certifies another key.
    #[error("invalid certificate: {0}")]
    InvalidCertificate(String),
}
