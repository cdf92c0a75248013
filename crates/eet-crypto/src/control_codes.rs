//! # Control Codes (PKP / BKP)
//!
//! The two codes printed on every fiscal receipt and sent in the
//! `KontrolniKody` element.
//!
//! ## Algorithm
//!
//! 1. Plaintext: `dic_popl|id_provoz|id_pokl|porad_cis|dat_trzby|celk_trzba`,
//!    each field in its canonical wire form.
//! 2. **PKP** = base64 (standard alphabet, padded) of the RSA-SHA256
//!    PKCS#1 v1.5 signature over the UTF-8 plaintext.
//! 3. **BKP** = SHA-1 of the decoded PKP signature bytes, rendered as 40
//!    uppercase hex digits in five groups of eight joined by `-`.
//!
//! BKP is a function of PKP only. [`Bkp::derive`] is its only constructor,
//! so a BKP cannot disagree with the PKP it travels with.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use sha1::{Digest, Sha1};

use eet_core::FiscalData;

use crate::error::SigningError;
use crate::key_store::KeyStore;

/// Taxpayer signature code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Pkp {
    value: String,
}

impl Pkp {
    /// Value of the `cipher` attribute.
    pub const CIPHER: &'static str = "RSA2048";
    /// Value of the `digest` attribute.
    pub const DIGEST: &'static str = "SHA256";
    /// Value of the `encoding` attribute.
    pub const ENCODING: &'static str = "base64";

    /// Sign `plaintext` with `key_store` and encode the signature.
    ///
    /// # Errors
    ///
    /// Propagates the key store's [`SigningError`].
    pub fn sign(plaintext: &str, key_store: &dyn KeyStore) -> Result<Self, SigningError> {
        let signature = key_store.sign(plaintext.as_bytes())?;
        Ok(Self::from_signature(&signature))
    }

    /// Wrap raw signature bytes.
    pub fn from_signature(signature: &[u8]) -> Self {
        Self {
            value: STANDARD.encode(signature),
        }
    }

    /// Base64-encoded signature.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Decode the signature bytes.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError::PkpEncoding`] if the value is not base64.
    pub fn signature_bytes(&self) -> Result<Vec<u8>, SigningError> {
        STANDARD
            .decode(&self.value)
            .map_err(|e| SigningError::PkpEncoding(e.to_string()))
    }
}

impl std::fmt::Display for Pkp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}

/// Taxpayer security code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Bkp {
    value: String,
}

impl Bkp {
    /// Value of the `digest` attribute.
    pub const DIGEST: &'static str = "SHA1";
    /// Value of the `encoding` attribute.
    pub const ENCODING: &'static str = "base16";

    /// Derive the BKP from a PKP.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError::PkpEncoding`] if the PKP value cannot be
    /// decoded.
    pub fn derive(pkp: &Pkp) -> Result<Self, SigningError> {
        let digest = Sha1::digest(pkp.signature_bytes()?);
        let hex = hex::encode_upper(digest);
        let groups: Vec<&str> = (0..5).map(|i| &hex[i * 8..(i + 1) * 8]).collect();
        Ok(Self {
            value: groups.join("-"),
        })
    }

    /// Grouped uppercase hex (`XXXXXXXX-XXXXXXXX-XXXXXXXX-XXXXXXXX-XXXXXXXX`).
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl std::fmt::Display for Bkp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}

/// The PKP and the BKP derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlCodes {
    pkp: Pkp,
    bkp: Bkp,
}

impl ControlCodes {
    /// Compute both codes for a validated sale.
    ///
    /// # Errors
    ///
    /// Propagates any [`SigningError`] from the key store. No code is
    /// returned on failure.
    pub fn compute(data: &FiscalData, key_store: &dyn KeyStore) -> Result<Self, SigningError> {
        let pkp = Pkp::sign(&pkp_plaintext(data), key_store)?;
        let bkp = Bkp::derive(&pkp)?;
        tracing::debug!(key_store = key_store.name(), bkp = %bkp, "computed control codes");
        Ok(Self { pkp, bkp })
    }

    /// Taxpayer signature code.
    pub fn pkp(&self) -> &Pkp {
        &self.pkp
    }

    /// Taxpayer security code.
    pub fn bkp(&self) -> &Bkp {
        &self.bkp
    }
}

/// The pipe-joined plaintext that the PKP signs.
pub fn pkp_plaintext(data: &FiscalData) -> String {
    format!(
        "{}|{}|{}|{}|{}|{}",
        data.tax_id(),
        data.establishment_id(),
        data.till_id(),
        data.sequence_number(),
        data.sale_time(),
        data.total_amount(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key_store::RsaKeyStore;
    use chrono::{FixedOffset, TimeZone};
    use eet_core::{ItemizedAmounts, RawReceipt, Regime};

    const KEY_PEM: &str = include_str!("../testdata/signing_key.pem");
    const CERT_PEM: &str = include_str!("../testdata/certificate.pem");

    const EXPECTED_PKP: &str = "2H4Fp/+2uuET6WrDRDlc5NuSU6lKoiFLNqxwt9qXGlpigtgj2ooelpJuLjueZi3YvL6nAnyUMc8jMYPxDQl101atkbfaEsp0V78gzY0fZVnHQMAx78BepSUIJMw5yeDtNl0yQpz/tsqki3Ot3LTCsmY7E3MkGg/35PnYbjuldznlMgGCMPafSqInibtbj+kVAC8oCQOS1wJEZQWH8O8CFj234VonuEFA11N9D93wbQGSEkUETNY1hZT31r4bmX8Zn+mLmUn2QWQ2e5uU0q0T7W5J/axvzNIN0sHQCzwhiA/Gn17fpxd5M8ZUOHbT6W7aZIT/HRMCrQzgv751aO7Cjw==";
    const EXPECTED_BKP: &str = "2E8ED60D-8A218200-B229A372-35A9F8E8-469613C6";

    struct FailingKeyStore;

    impl KeyStore for FailingKeyStore {
        fn sign(&self, _data: &[u8]) -> Result<Vec<u8>, SigningError> {
            Err(SigningError::Backend("token removed".to_string()))
        }

        fn certificate_der(&self) -> &[u8] {
            &[]
        }

        fn name(&self) -> &str {
            "FailingKeyStore"
        }
    }

    fn sample_data() -> FiscalData {
        let raw = RawReceipt {
            message_uuid: None,
            first_submission: true,
            tax_id: "CZ00000019".to_string(),
            delegating_tax_id: None,
            establishment_id: 273,
            till_id: "/5546/RO24".to_string(),
            sequence_number: "0/6460/ZQ42".to_string(),
            sale_time: FixedOffset::east_opt(7200)
                .unwrap()
                .with_ymd_and_hms(2016, 8, 5, 0, 30, 12)
                .unwrap(),
            total_amount: 34113.0,
            amounts: ItemizedAmounts::default(),
            regime: Regime::Regular,
        };
        FiscalData::from_receipt(&raw).unwrap()
    }

    #[test]
    fn plaintext_uses_canonical_fields() {
        assert_eq!(
            pkp_plaintext(&sample_data()),
            "CZ00000019|273|/5546/RO24|0/6460/ZQ42|2016-08-05T00:30:12+02:00|34113.00"
        );
    }

    #[test]
    fn known_vector() {
        let store = RsaKeyStore::from_pem(KEY_PEM, CERT_PEM).unwrap();
        let codes = ControlCodes::compute(&sample_data(), &store).unwrap();
        assert_eq!(codes.pkp().value(), EXPECTED_PKP);
        assert_eq!(codes.bkp().value(), EXPECTED_BKP);
    }

    #[test]
    fn bkp_from_known_pkp() {
        let pkp = Pkp {
            value: EXPECTED_PKP.to_string(),
        };
        assert_eq!(Bkp::derive(&pkp).unwrap().value(), EXPECTED_BKP);
    }

    #[test]
    fn bkp_rejects_non_base64_pkp() {
        let pkp = Pkp {
            value: "not base64!".to_string(),
        };
        assert!(matches!(Bkp::derive(&pkp), Err(SigningError::PkpEncoding(_))));
    }

    #[test]
    fn signer_failure_propagates() {
        let err = ControlCodes::compute(&sample_data(), &FailingKeyStore).unwrap_err();
        assert_eq!(err, SigningError::Backend("token removed".to_string()));
    }

    #[test]
    fn metadata_tags() {
        assert_eq!(Pkp::CIPHER, "RSA2048");
        assert_eq!(Pkp::DIGEST, "SHA256");
        assert_eq!(Pkp::ENCODING, "base64");
        assert_eq!(Bkp::DIGEST, "SHA1");
        assert_eq!(Bkp::ENCODING, "base16");
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// BKP is a deterministic function of the PKP bytes and always
            /// has the grouped shape.
            #[test]
            fn bkp_shape_and_determinism(sig in proptest::collection::vec(any::<u8>(), 1..512)) {
                let pkp = Pkp::from_signature(&sig);
                let a = Bkp::derive(&pkp).unwrap();
                let b = Bkp::derive(&pkp).unwrap();
                prop_assert_eq!(&a, &b);

                let groups: Vec<&str> = a.value().split('-').collect();
                prop_assert_eq!(groups.len(), 5);
                for group in groups {
                    prop_assert_eq!(group.len(), 8);
                    prop_assert!(group.chars().all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
                }
            }
        }
    }
}
