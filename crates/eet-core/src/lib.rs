#![deny(missing_docs)]

//! # eet-core: Foundational Types for the EET Client
//!
//! This crate defines the wire-format primitives that every other crate in
//! the workspace depends on. It has no internal crate dependencies, only
//! `serde`, `thiserror`, `chrono` and `uuid` from the external ecosystem.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for wire fields.** Every receipt attribute is a
//!    distinct type with a validating constructor. You cannot pass a
//!    [`MediumIdentifier`] where a [`ShortIdentifier`] is expected, and an
//!    invalid value never reaches the signing path.
//!
//! 2. **Canonical strings are the only signed form.** [`Amount`] and
//!    [`FiscalTimestamp`] store their formatted representation at
//!    construction. Control codes and XML digests are computed from those
//!    strings, never from the caller's floats or datetimes.
//!
//! 3. **Read-only records.** [`FiscalHeader`] and [`FiscalData`] are built by
//!    a single validating constructor and expose only getters. A
//!    partially-validated record cannot be observed.
//!
//! 4. **[`ValidationError`] names the failing field** by its wire attribute
//!    name so callers can report exactly which receipt input was rejected.

pub mod error;
pub mod fields;
pub mod receipt;
pub mod record;
pub mod temporal;

pub use error::{FieldError, ValidationError};
pub use fields::{
    Amount, EstablishmentId, MediumIdentifier, MessageUuid, Regime, ShortIdentifier, TaxId,
};
pub use receipt::{ItemizedAmounts, RawReceipt};
pub use record::{AmountField, FiscalData, FiscalHeader};
pub use temporal::FiscalTimestamp;
