//! # eet-crypto: Signing and Control Codes
//!
//! Provides the cryptographic building blocks of a registration request:
//!
//! - **[`KeyStore`]**: the signing capability. Exposes RSA-SHA256
//!   PKCS#1 v1.5 signing and the DER certificate that goes into the
//!   WS-Security header. [`RsaKeyStore`] loads both from PEM.
//! - **Control codes**: [`Pkp`] (taxpayer signature code) is the signature
//!   over the pipe-joined sale plaintext; [`Bkp`] (taxpayer security code)
//!   is the SHA-1 of the PKP signature bytes, grouped in uppercase hex.
//!
//! ## Crate Policy
//!
//! - Depends only on `eet-core` internally.
//! - Tests sign with a real 2048-bit RSA key from `testdata/`; control-code
//!   vectors are checked byte for byte.
//! - Signer failures always propagate. No code path substitutes an empty
//!   or zeroed control code.

pub mod control_codes;
pub mod error;
pub mod key_store;

pub use control_codes::{pkp_plaintext, Bkp, ControlCodes, Pkp};
pub use error::{KeyStoreError, SigningError};
pub use key_store::{KeyStore, RsaKeyStore};
