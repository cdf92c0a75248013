//! # Fiscal Record Assembly
//!
//! Turns a [`RawReceipt`] into a [`FiscalRecord`]: validated header,
//! validated sale data and the control codes computed over that data.
//! Nothing is sent from here; a record can be assembled offline to print
//! PKP and BKP on a receipt when the service is unreachable.

use eet_core::{FiscalData, FiscalHeader, FiscalTimestamp, RawReceipt};
use eet_crypto::{ControlCodes, KeyStore};

use crate::error::EetError;

/// Settings that apply to one assembly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblyOptions {
    /// Mark the request as a verification (`overeni="true"`).
    pub verification_mode: bool,
    /// Send time to stamp on the header. `None` means now.
    pub sent_at: Option<FiscalTimestamp>,
}

/// A complete, validated registration record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiscalRecord {
    header: FiscalHeader,
    data: FiscalData,
    codes: ControlCodes,
}

impl FiscalRecord {
    /// Validate `raw` and compute its control codes.
    ///
    /// Fields are validated in wire order (`uuid_zpravy` first) and the
    /// first failure is returned. The key store is only invoked once every
    /// field is valid.
    ///
    /// # Errors
    ///
    /// - [`EetError::Validation`] naming the first invalid field.
    /// - [`EetError::Signing`] if the key store fails.
    pub fn assemble(
        raw: &RawReceipt,
        key_store: &dyn KeyStore,
        options: &AssemblyOptions,
    ) -> Result<Self, EetError> {
        let sent_at = options.sent_at.unwrap_or_else(FiscalTimestamp::now);
        let header = FiscalHeader::from_receipt(raw, sent_at, options.verification_mode)?;
        let data = FiscalData::from_receipt(raw)?;
        let codes = ControlCodes::compute(&data, key_store)?;

        tracing::debug!(
            message_uuid = %header.message_uuid(),
            sequence_number = %data.sequence_number(),
            "assembled fiscal record"
        );
        Ok(Self {
            header,
            data,
            codes,
        })
    }

    /// Message header.
    pub fn header(&self) -> &FiscalHeader {
        &self.header
    }

    /// Sale data.
    pub fn data(&self) -> &FiscalData {
        &self.data
    }

    /// PKP and BKP.
    pub fn codes(&self) -> &ControlCodes {
        &self.codes
    }
}
