//! # Validation Errors
//!
//! Structured errors for wire-format validation, built with `thiserror`.
//!
//! Field constructors return a [`FieldError`] describing what was wrong with
//! the value. The record constructors wrap it into a [`ValidationError`]
//! that also names the wire attribute the value was destined for.

use thiserror::Error;

/// A raw value that violates a wire-format contract.
///
/// Each variant carries the rejected input and the expected shape so that
/// callers can diagnose bad receipt data without guesswork.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// Short identifier outside the 1-20 character charset contract.
    #[error("invalid short identifier: \"{0}\" (expected 1-20 characters from [0-9a-zA-Z.,:;/#-_ ])")]
    InvalidShortIdentifier(String),

    /// Medium identifier outside the 1-25 character charset contract.
    #[error("invalid medium identifier: \"{0}\" (expected 1-25 characters from [0-9a-zA-Z.,:;/#-_ ])")]
    InvalidMediumIdentifier(String),

    /// Tax identifier is not `CZ` followed by 8-10 digits.
    #[error("invalid tax ID: \"{0}\" (expected CZ followed by 8-10 digits)")]
    InvalidTaxId(String),

    /// Establishment number outside the open interval (0, 1000000).
    #[error("establishment ID {0} out of range (expected 1..=999999)")]
    EstablishmentIdOutOfRange(i64),

    /// Message identifier is not an RFC 4122 version 1-5 UUID.
    #[error("invalid message UUID: \"{0}\" (expected RFC 4122 version 1-5 UUID)")]
    InvalidUuid(String),

    /// Amount cannot be represented in the two-decimal wire format.
    #[error("invalid amount: \"{0}\" (expected two decimals within -99999999.99..=99999999.99)")]
    InvalidAmount(String),

    /// Timestamp string does not have the RFC 3339 seconds-with-offset shape.
    #[error("invalid timestamp: \"{value}\" ({reason})")]
    InvalidTimestamp {
        /// The string that failed to parse.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// A receipt field failed validation.
///
/// `field` is the wire attribute name (`dic_popl`, `celk_trzba`, ...).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {field}: {reason}")]
pub struct ValidationError {
    /// Wire attribute name of the rejected field.
    pub field: &'static str,
    /// What was wrong with the value.
    #[source]
    pub reason: FieldError,
}

impl ValidationError {
    /// Attach a field name to a field-level error.
    pub fn new(field: &'static str, reason: FieldError) -> Self {
        Self { field, reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_names_field_and_value() {
        let err = ValidationError::new("dic_popl", FieldError::InvalidTaxId("CZ1".to_string()));
        let msg = format!("{err}");
        assert!(msg.contains("dic_popl"));
        assert!(msg.contains("CZ1"));
    }

    #[test]
    fn validation_error_exposes_source() {
        let err = ValidationError::new("id_provoz", FieldError::EstablishmentIdOutOfRange(0));
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(
            source.as_deref(),
            Some("establishment ID 0 out of range (expected 1..=999999)")
        );
    }

    #[test]
    fn timestamp_error_display() {
        let err = FieldError::InvalidTimestamp {
            value: "yesterday".to_string(),
            reason: "parse failed".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("yesterday"));
        assert!(msg.contains("parse failed"));
    }
}
