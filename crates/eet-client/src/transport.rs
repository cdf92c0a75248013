//! Request delivery.
//!
//! [`Transport`] is the seam between the dispatcher and the network. The
//! dispatcher hands it serialized request bytes and gets back the status
//! and body; it never retries. [`HttpTransport`] is the reqwest-based
//! implementation with a per-request timeout.

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::error::TransportError;

/// Raw reply from the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// `true` for a 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Delivers a serialized request and returns the raw reply.
///
/// Implementations must be `Send + Sync` so one transport can serve
/// concurrent submissions.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `body` to `endpoint`.
    async fn send(
        &self,
        endpoint: &Url,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<TransportResponse, TransportError>;
}

// -- HttpTransport ------------------------------------------------------------

/// HTTP(S) transport backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;
        Ok(Self { http })
    }

    /// Wrap an existing client.
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        endpoint: &Url,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<TransportResponse, TransportError> {
        let resp = self
            .http
            .post(endpoint.clone())
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await
            .map_err(|e| TransportError::Http {
                endpoint: endpoint.to_string(),
                source: e,
            })?;

        let status = resp.status().as_u16();
        let body = resp.bytes().await.map_err(|e| TransportError::Http {
            endpoint: endpoint.to_string(),
            source: e,
        })?;

        tracing::debug!(endpoint = %endpoint, status, bytes = body.len(), "received response");
        Ok(TransportResponse {
            status,
            body: body.to_vec(),
        })
    }
}
