//! # Dispatcher
//!
//! Drives one registration end to end: assemble the record, build the
//! signed envelope, deliver it through the [`Transport`], parse the reply.
//!
//! ## Error Surface
//!
//! | Stage | Failure | Result |
//! |-------|---------|--------|
//! | Assembly | invalid field | `EetError::Validation`, nothing sent |
//! | Assembly / envelope | key store failure | `EetError::Signing`, nothing sent |
//! | Delivery | connection, TLS, timeout | `EetError::Transport` |
//! | Parsing | unreadable reply, non-2xx status | `EetError::Transport` (`Status`) |
//! | Parsing | unreadable reply, 2xx status | `EetError::MalformedResponse` |
//! | Parsing | `Chyba` from the service | `Ok(Response)` with a [`Fault`] |
//!
//! [`Fault`]: crate::response::Fault
//!
//! The dispatcher holds no per-request state. Key store and transport are
//! shared behind `Arc`, so one dispatcher can serve concurrent submissions.

use std::sync::Arc;
use std::time::Duration;

use eet_core::RawReceipt;
use eet_crypto::KeyStore;
use url::Url;

use crate::config::EetConfig;
use crate::envelope::{EnvelopeBuilder, SignedEnvelope};
use crate::error::{EetError, TransportError};
use crate::record::{AssemblyOptions, FiscalRecord};
use crate::response::{Outcome, Response};
use crate::transport::{HttpTransport, Transport};

/// Content type of the request body.
pub const CONTENT_TYPE: &str = "application/xml";

/// An assembled and signed request that has not been sent yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    record: FiscalRecord,
    envelope: SignedEnvelope,
}

impl PreparedRequest {
    /// The validated record with its control codes.
    pub fn record(&self) -> &FiscalRecord {
        &self.record
    }

    /// The signed envelope.
    pub fn envelope(&self) -> &SignedEnvelope {
        &self.envelope
    }
}

/// Submits receipts to one endpoint with one key store.
#[derive(Clone)]
pub struct Dispatcher {
    endpoint: Url,
    key_store: Arc<dyn KeyStore>,
    transport: Arc<dyn Transport>,
    builder: EnvelopeBuilder,
    verification_mode: bool,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("endpoint", &self.endpoint.as_str())
            .field("key_store", &self.key_store.name())
            .field("verification_mode", &self.verification_mode)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Create a dispatcher from configuration, using [`HttpTransport`] with
    /// the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns `EetError::Transport` if the HTTP client cannot be built.
    pub fn new(config: &EetConfig, key_store: Arc<dyn KeyStore>) -> Result<Self, EetError> {
        let transport = HttpTransport::new(Duration::from_secs(config.timeout_secs))?;
        Ok(Self::with_transport(
            config.endpoint.clone(),
            key_store,
            Arc::new(transport),
        )
        .with_verification_mode(config.verification_mode))
    }

    /// Create a dispatcher from `EET_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns `EetError::Config` if the variables do not form a valid
    /// configuration, otherwise the same errors as [`Dispatcher::new`].
    pub fn from_env(key_store: Arc<dyn KeyStore>) -> Result<Self, EetError> {
        Self::from_lookup(|var| std::env::var(var).ok(), key_store)
    }

    /// Create a dispatcher from configuration read through `lookup`.
    ///
    /// See [`EetConfig::from_lookup`] for the variables consulted.
    pub fn from_lookup<F>(lookup: F, key_store: Arc<dyn KeyStore>) -> Result<Self, EetError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = EetConfig::from_lookup(lookup)?;
        tracing::debug!(
            environment = ?config.environment,
            endpoint = %config.endpoint,
            "loaded EET configuration"
        );
        Self::new(&config, key_store)
    }

    /// Create a dispatcher with a caller-supplied transport.
    pub fn with_transport(
        endpoint: Url,
        key_store: Arc<dyn KeyStore>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            endpoint,
            key_store,
            transport,
            builder: EnvelopeBuilder::default(),
            verification_mode: false,
        }
    }

    /// Send every request in verification mode (`overeni="true"`).
    pub fn with_verification_mode(mut self, verification_mode: bool) -> Self {
        self.verification_mode = verification_mode;
        self
    }

    /// Use a specific envelope builder.
    pub fn with_builder(mut self, builder: EnvelopeBuilder) -> Self {
        self.builder = builder;
        self
    }

    /// Target endpoint.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Assemble and sign a receipt without sending it.
    ///
    /// The returned record carries the PKP and BKP, which must be printed
    /// on the receipt even when the service cannot be reached.
    ///
    /// # Errors
    ///
    /// [`EetError::Validation`], [`EetError::Signing`] or
    /// [`EetError::Envelope`].
    pub fn prepare(&self, raw: &RawReceipt) -> Result<PreparedRequest, EetError> {
        let options = AssemblyOptions {
            verification_mode: self.verification_mode,
            sent_at: None,
        };
        let record = FiscalRecord::assemble(raw, self.key_store.as_ref(), &options)?;
        let envelope = self.builder.build(&record, self.key_store.as_ref())?;
        Ok(PreparedRequest { record, envelope })
    }

    /// Register a sale.
    ///
    /// Returns `Ok` for both a confirmation and a fault reported by the
    /// service; see the module docs for the error cases.
    pub async fn submit(&self, raw: &RawReceipt) -> Result<Response, EetError> {
        let prepared = self.prepare(raw)?;
        self.dispatch(&prepared).await
    }

    /// Send a prepared request and parse the reply.
    ///
    /// # Errors
    ///
    /// [`EetError::Transport`] or [`EetError::MalformedResponse`].
    pub async fn dispatch(&self, prepared: &PreparedRequest) -> Result<Response, EetError> {
        let message_uuid = prepared.record.header().message_uuid().as_str();
        let reply = self
            .transport
            .send(&self.endpoint, prepared.envelope.to_bytes(), CONTENT_TYPE)
            .await?;

        let response = match Response::parse(&reply.body) {
            Ok(response) => response,
            Err(err) if !reply.is_success() => {
                tracing::warn!(
                    message_uuid,
                    endpoint = %self.endpoint,
                    status = reply.status,
                    error = %err,
                    "unreadable reply with error status"
                );
                return Err(TransportError::Status {
                    endpoint: self.endpoint.to_string(),
                    status: reply.status,
                    body: String::from_utf8_lossy(&reply.body).into_owned(),
                }
                .into());
            }
            Err(err) => return Err(err.into()),
        };

        self.log_outcome(prepared, &response);
        Ok(response)
    }

    fn log_outcome(&self, prepared: &PreparedRequest, response: &Response) {
        let message_uuid = prepared.record.header().message_uuid().as_str();

        if let Some(echoed) = response.message_uuid() {
            if echoed != message_uuid {
                tracing::warn!(message_uuid, echoed, "reply echoes a different message UUID");
            }
        }

        for warning in response.warnings() {
            tracing::warn!(
                message_uuid,
                code = warning.code,
                text = %warning.message,
                "service warning"
            );
        }

        match response.outcome() {
            Outcome::Confirmed(confirmation) => {
                let local_bkp = prepared.record.codes().bkp().value();
                if let Some(echoed) = confirmation.echoed_bkp.as_deref() {
                    if echoed != local_bkp {
                        tracing::warn!(
                            message_uuid,
                            local_bkp,
                            echoed_bkp = echoed,
                            "echoed BKP does not match the computed BKP"
                        );
                    }
                }
                tracing::info!(
                    message_uuid,
                    fik = %confirmation.fiscal_id,
                    test = confirmation.test_mode,
                    "sale registered"
                );
            }
            Outcome::Rejected(fault) => {
                tracing::warn!(
                    message_uuid,
                    code = fault.code,
                    text = %fault.message,
                    "service rejected the request"
                );
            }
        }
    }
}
