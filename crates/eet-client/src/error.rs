//! EET client error types.
//!
//! [`EetError`] is what every fallible client operation returns. A fault
//! reported by the service is not an error: it arrives as
//! [`crate::response::Outcome::Rejected`] inside an `Ok` response.

use eet_core::ValidationError;
use eet_crypto::SigningError;

use crate::config::ConfigError;

/// Errors from assembling, signing, sending or parsing a registration.
#[derive(Debug, thiserror::Error)]
pub enum EetError {
    /// A receipt field violates its wire contract. Raised before any
    /// network activity.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The key store failed to sign.
    #[error("signing failed: {0}")]
    Signing(#[from] SigningError),

    /// The request could not be delivered or the reply could not be read.
    #[error("transport failed: {0}")]
    Transport(#[from] TransportError),

    /// The reply was delivered but is not a valid registration response.
    #[error(transparent)]
    MalformedResponse(#[from] MalformedResponseError),

    /// The request envelope could not be serialized.
    #[error("envelope serialization failed: {0}")]
    Envelope(String),

    /// Client configuration is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors from delivering a request to the service.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// HTTP transport error (connection, TLS, timeout).
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        /// Target endpoint.
        endpoint: String,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-2xx status and a body that is not a
    /// registration response.
    #[error("{endpoint} returned {status}: {body}")]
    Status {
        /// Target endpoint.
        endpoint: String,
        /// HTTP status code.
        status: u16,
        /// Response body, lossily decoded.
        body: String,
    },

    /// A custom transport could not reach the service.
    #[error("{endpoint} unavailable: {reason}")]
    Unavailable {
        /// Target endpoint.
        endpoint: String,
        /// Why the request failed.
        reason: String,
    },
}

/// The reply could not be interpreted as a registration response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed response: {reason}")]
pub struct MalformedResponseError {
    /// What was wrong with the reply.
    pub reason: String,
}

impl MalformedResponseError {
    /// Create from a description of the problem.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eet_core::FieldError;

    #[test]
    fn validation_converts_and_names_field() {
        let err: EetError =
            ValidationError::new("id_pokl", FieldError::InvalidShortIdentifier("@".into())).into();
        assert!(matches!(err, EetError::Validation(_)));
        assert!(err.to_string().contains("id_pokl"));
    }

    #[test]
    fn status_error_display() {
        let err = TransportError::Status {
            endpoint: "https://pg.eet.cz/".into(),
            status: 503,
            body: "Service Unavailable".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("503"));
        assert!(msg.contains("Service Unavailable"));
    }

    #[test]
    fn malformed_is_transparent() {
        let err: EetError = MalformedResponseError::new("missing Odpoved").into();
        assert_eq!(err.to_string(), "malformed response: missing Odpoved");
    }
}
