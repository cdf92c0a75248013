//! # Validated Wire Fields
//!
//! Domain-primitive newtypes for the attributes of a registered sale.
//! Each type can only be obtained through its validating constructor, so a
//! value that reaches the signing path is already in its wire form.
//!
//! ## Validation
//!
//! Every contract is checked against the whole input: a value with extra
//! leading or trailing characters is rejected, never partially matched.
//!
//! | Type | Wire attributes | Contract |
//! |------|-----------------|----------|
//! | [`ShortIdentifier`] | `id_pokl` | 1-20 chars from `[0-9a-zA-Z.,:;/#-_ ]` |
//! | [`MediumIdentifier`] | `porad_cis` | 1-25 chars, same charset |
//! | [`TaxId`] | `dic_popl`, `dic_poverujiciho` | `CZ` + 8-10 digits |
//! | [`EstablishmentId`] | `id_provoz` | 1..=999999 |
//! | [`MessageUuid`] | `uuid_zpravy` | RFC 4122, version 1-5 |
//! | [`Amount`] | `celk_trzba`, itemized amounts | two decimals, see below |

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::FieldError;

/// Punctuation allowed in till and receipt identifiers, besides ASCII
/// letters and digits.
const IDENTIFIER_PUNCTUATION: &[char] = &['.', ',', ':', ';', '/', '#', '-', '_', ' '];

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || IDENTIFIER_PUNCTUATION.contains(&c)
}

fn is_identifier(s: &str, max_len: usize) -> bool {
    // All accepted characters are ASCII, so byte length equals char count
    // whenever the charset check passes.
    (1..=max_len).contains(&s.len()) && s.chars().all(is_identifier_char)
}

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Identifier of at most 20 characters (till / cash register ID).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ShortIdentifier(String);

impl ShortIdentifier {
    /// Maximum length in characters.
    pub const MAX_LEN: usize = 20;

    /// Validate a short identifier.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::InvalidShortIdentifier`] if the value is empty,
    /// longer than 20 characters, or contains a character outside the
    /// allowed set.
    pub fn new(value: impl Into<String>) -> Result<Self, FieldError> {
        let s = value.into();
        if !is_identifier(&s, Self::MAX_LEN) {
            return Err(FieldError::InvalidShortIdentifier(s));
        }
        Ok(Self(s))
    }

    /// Access the identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ShortIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of at most 25 characters (receipt sequence number).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct MediumIdentifier(String);

impl MediumIdentifier {
    /// Maximum length in characters.
    pub const MAX_LEN: usize = 25;

    /// Validate a medium identifier.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::InvalidMediumIdentifier`] if the value is empty,
    /// longer than 25 characters, or contains a character outside the
    /// allowed set.
    pub fn new(value: impl Into<String>) -> Result<Self, FieldError> {
        let s = value.into();
        if !is_identifier(&s, Self::MAX_LEN) {
            return Err(FieldError::InvalidMediumIdentifier(s));
        }
        Ok(Self(s))
    }

    /// Access the identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MediumIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Czech taxpayer identification number (DIČ).
///
/// # Validation
///
/// - Must start with the uppercase country prefix `CZ`
/// - Followed by 8 to 10 ASCII digits and nothing else
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TaxId(String);

impl TaxId {
    /// Validate a tax identifier.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::InvalidTaxId`] if the value does not match
    /// `CZ` followed by 8-10 digits.
    pub fn new(value: impl Into<String>) -> Result<Self, FieldError> {
        let s = value.into();
        let valid = match s.strip_prefix("CZ") {
            Some(digits) => {
                (8..=10).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
            }
            None => false,
        };
        if !valid {
            return Err(FieldError::InvalidTaxId(s));
        }
        Ok(Self(s))
    }

    /// Access the tax identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaxId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Establishment (business premises) number assigned by the tax portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct EstablishmentId(u32);

impl EstablishmentId {
    /// Validate an establishment number.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::EstablishmentIdOutOfRange`] unless
    /// `0 < value < 1_000_000`.
    pub fn new(value: i64) -> Result<Self, FieldError> {
        if value <= 0 || value >= 1_000_000 {
            return Err(FieldError::EstablishmentIdOutOfRange(value));
        }
        u32::try_from(value)
            .map(Self)
            .map_err(|_| FieldError::EstablishmentIdOutOfRange(value))
    }

    /// Return the numeric value.
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for EstablishmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Message identifier (`uuid_zpravy`), unique per submission attempt.
///
/// The textual form is kept exactly as supplied; hex digits are accepted in
/// either case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct MessageUuid(String);

impl MessageUuid {
    /// Validate a textual UUID.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::InvalidUuid`] unless the value is a hyphenated
    /// 36-character UUID with version nibble 1-5 and variant nibble
    /// `8`, `9`, `a` or `b`.
    pub fn new(value: impl Into<String>) -> Result<Self, FieldError> {
        let s = value.into();
        if !Self::is_valid(&s) {
            return Err(FieldError::InvalidUuid(s));
        }
        Ok(Self(s))
    }

    /// Generate a fresh random (version 4) message identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    fn is_valid(s: &str) -> bool {
        let bytes = s.as_bytes();
        if bytes.len() != 36 {
            return false;
        }
        bytes.iter().enumerate().all(|(i, b)| match i {
            8 | 13 | 18 | 23 => *b == b'-',
            14 => (b'1'..=b'5').contains(b),
            19 => matches!(b, b'8' | b'9' | b'a' | b'b' | b'A' | b'B'),
            _ => b.is_ascii_hexdigit(),
        })
    }

    /// Access the UUID string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MessageUuid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Amounts
// ---------------------------------------------------------------------------

/// Monetary amount in its canonical two-decimal wire form.
///
/// Accepted shapes:
///
/// - `0.dd`
/// - `[-]N.dd` where `N` has 1-8 digits and no leading zero
/// - `-0.dd` where `dd` is not `00`
///
/// The canonical string uses `.` as the decimal separator and no thousands
/// separator, independent of locale. It is what gets signed and serialized;
/// the original float is not retained.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Amount(String);

impl Amount {
    /// Format a float to two decimals and validate the result.
    ///
    /// Negative zero (e.g. `-0.001` after rounding) is normalized to `0.00`.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::InvalidAmount`] for non-finite values and for
    /// magnitudes that need more than 8 integer digits.
    pub fn from_f64(value: f64) -> Result<Self, FieldError> {
        if !value.is_finite() {
            return Err(FieldError::InvalidAmount(value.to_string()));
        }
        let mut formatted = format!("{value:.2}");
        if formatted == "-0.00" {
            formatted = "0.00".to_string();
        }
        Self::parse(formatted)
    }

    /// Validate an amount that is already in string form.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::InvalidAmount`] if the string is not exactly in
    /// canonical two-decimal form.
    pub fn parse(value: impl Into<String>) -> Result<Self, FieldError> {
        let s = value.into();
        if !Self::is_canonical(&s) {
            return Err(FieldError::InvalidAmount(s));
        }
        Ok(Self(s))
    }

    fn is_canonical(s: &str) -> bool {
        let (negative, unsigned) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let Some((int_part, frac)) = unsigned.split_once('.') else {
            return false;
        };
        if frac.len() != 2 || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
        if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
        if int_part == "0" {
            return !negative || frac != "00";
        }
        !int_part.starts_with('0') && int_part.len() <= 8
    }

    /// Access the canonical string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Amount {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Regime
// ---------------------------------------------------------------------------

/// Sales-reporting regime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Regime {
    /// Sale is reported online at the time it happens.
    #[default]
    Regular,
    /// Simplified regime: the sale may be reported within a grace period.
    Simplified,
}

impl Regime {
    /// Value of the `rezim` attribute.
    pub fn wire_value(&self) -> &'static str {
        match self {
            Self::Regular => "0",
            Self::Simplified => "1",
        }
    }
}

impl std::fmt::Display for Regime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Regular => write!(f, "Regular"),
            Self::Simplified => write!(f, "Simplified"),
        }
    }
}
