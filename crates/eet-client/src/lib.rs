//! # eet-client: Fiscal Receipt Registration Client
//!
//! Registers sales with the Czech electronic registration of sales (EET)
//! service:
//!
//! - **[`record`]** validates a [`RawReceipt`] and computes PKP/BKP.
//! - **[`envelope`]** builds the WS-Security signed SOAP request.
//! - **[`transport`]** delivers it; [`HttpTransport`] is the default.
//! - **[`response`]** parses the reply into a confirmation or a fault.
//! - **[`dispatcher`]** ties the steps together behind [`Dispatcher::submit`].
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use eet_client::{Dispatcher, EetConfig};
//! use eet_crypto::RsaKeyStore;
//!
//! # async fn run(receipt: eet_core::RawReceipt) -> Result<(), Box<dyn std::error::Error>> {
//! let config = EetConfig::from_env()?;
//! let key_store = RsaKeyStore::from_pem_files("key.pem", "cert.pem")?;
//! let dispatcher = Dispatcher::new(&config, Arc::new(key_store))?;
//!
//! let response = dispatcher.submit(&receipt).await?;
//! let confirmation = response.into_result()?;
//! println!("FIK: {}", confirmation.fiscal_id);
//! # Ok(())
//! # }
//! ```
//!
//! The crate never installs a tracing subscriber. Events carry the message
//! UUID as a structured field.

pub mod config;
pub mod dispatcher;
pub mod envelope;
pub mod error;
pub mod namespace;
pub mod record;
pub mod response;
pub mod transport;
pub mod xml;

pub use config::{EetConfig, Environment};
pub use dispatcher::{Dispatcher, PreparedRequest};
pub use envelope::{EnvelopeBuilder, EnvelopeIds, SignedEnvelope};
pub use error::{EetError, MalformedResponseError, TransportError};
pub use namespace::NamespaceTable;
pub use record::{AssemblyOptions, FiscalRecord};
pub use response::{Confirmation, Fault, Outcome, Response, Warning};
pub use transport::{HttpTransport, Transport, TransportResponse};

pub use eet_core::RawReceipt;
