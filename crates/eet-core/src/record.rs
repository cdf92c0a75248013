//! # Validated Fiscal Records
//!
//! [`FiscalHeader`] and [`FiscalData`] are the read-only, fully validated
//! halves of a registration request. Each has exactly one constructor that
//! takes a [`RawReceipt`] and validates every field in wire order,
//! stopping at the first failure.
//!
//! ## Validation Order
//!
//! Header: `uuid_zpravy`.
//!
//! Data: `dic_popl`, `dic_poverujiciho` (only when non-empty), `id_provoz`,
//! `id_pokl`, `porad_cis`, `dat_trzby`, `celk_trzba`, then the itemized
//! amounts in [`AmountField::ALL`] order.

use crate::error::ValidationError;
use crate::fields::{
    Amount, EstablishmentId, MediumIdentifier, MessageUuid, Regime, ShortIdentifier, TaxId,
};
use crate::receipt::RawReceipt;
use crate::temporal::FiscalTimestamp;

// ---------------------------------------------------------------------------
// Itemized amount fields
// ---------------------------------------------------------------------------

/// One of the thirteen optional itemized amount attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AmountField {
    /// `zakl_nepodl_dph`
    VatExempt,
    /// `zakl_dan1`
    StandardBase,
    /// `dan1`
    StandardVat,
    /// `zakl_dan2`
    Reduced1Base,
    /// `dan2`
    Reduced1Vat,
    /// `zakl_dan3`
    Reduced2Base,
    /// `dan3`
    Reduced2Vat,
    /// `cest_sluz`
    TravelServices,
    /// `pouzit_zboz1`
    UsedGoodsStandard,
    /// `pouzit_zboz2`
    UsedGoodsReduced1,
    /// `pouzit_zboz3`
    UsedGoodsReduced2,
    /// `urceno_cerp_zuct`
    ForLaterDrawing,
    /// `cerp_zuct`
    Drawn,
}

impl AmountField {
    /// Every field, in wire order.
    pub const ALL: [AmountField; 13] = [
        Self::VatExempt,
        Self::StandardBase,
        Self::StandardVat,
        Self::Reduced1Base,
        Self::Reduced1Vat,
        Self::Reduced2Base,
        Self::Reduced2Vat,
        Self::TravelServices,
        Self::UsedGoodsStandard,
        Self::UsedGoodsReduced1,
        Self::UsedGoodsReduced2,
        Self::ForLaterDrawing,
        Self::Drawn,
    ];

    /// The XML attribute name on the `Data` element.
    pub fn attribute_name(&self) -> &'static str {
        match self {
            Self::VatExempt => "zakl_nepodl_dph",
            Self::StandardBase => "zakl_dan1",
            Self::StandardVat => "dan1",
            Self::Reduced1Base => "zakl_dan2",
            Self::Reduced1Vat => "dan2",
            Self::Reduced2Base => "zakl_dan3",
            Self::Reduced2Vat => "dan3",
            Self::TravelServices => "cest_sluz",
            Self::UsedGoodsStandard => "pouzit_zboz1",
            Self::UsedGoodsReduced1 => "pouzit_zboz2",
            Self::UsedGoodsReduced2 => "pouzit_zboz3",
            Self::ForLaterDrawing => "urceno_cerp_zuct",
            Self::Drawn => "cerp_zuct",
        }
    }
}

impl std::fmt::Display for AmountField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.attribute_name())
    }
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

/// Message header (`Hlavicka`): identifies one submission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiscalHeader {
    message_uuid: MessageUuid,
    sent_at: FiscalTimestamp,
    first_submission: bool,
    verification_mode: bool,
}

impl FiscalHeader {
    /// Build the header for a submission sent at `sent_at`.
    ///
    /// The caller's message UUID is validated when present; otherwise a
    /// fresh v4 UUID is generated.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for `uuid_zpravy` if the supplied UUID
    /// is malformed.
    pub fn from_receipt(
        raw: &RawReceipt,
        sent_at: FiscalTimestamp,
        verification_mode: bool,
    ) -> Result<Self, ValidationError> {
        let message_uuid = match &raw.message_uuid {
            Some(s) => MessageUuid::new(s.as_str())
                .map_err(|e| ValidationError::new("uuid_zpravy", e))?,
            None => MessageUuid::generate(),
        };
        Ok(Self {
            message_uuid,
            sent_at,
            first_submission: raw.first_submission,
            verification_mode,
        })
    }

    /// Message UUID (`uuid_zpravy`).
    pub fn message_uuid(&self) -> &MessageUuid {
        &self.message_uuid
    }

    /// Send time (`dat_odesl`).
    pub fn sent_at(&self) -> &FiscalTimestamp {
        &self.sent_at
    }

    /// First-submission flag (`prvni_zaslani`).
    pub fn first_submission(&self) -> bool {
        self.first_submission
    }

    /// Verification-mode flag (`overeni`). A verification request is checked
    /// by the service but not registered.
    pub fn verification_mode(&self) -> bool {
        self.verification_mode
    }
}

// ---------------------------------------------------------------------------
// Data
// ---------------------------------------------------------------------------

/// Sale data (`Data`): the registered receipt itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiscalData {
    tax_id: TaxId,
    delegating_tax_id: Option<TaxId>,
    establishment_id: EstablishmentId,
    till_id: ShortIdentifier,
    sequence_number: MediumIdentifier,
    sale_time: FiscalTimestamp,
    total_amount: Amount,
    amounts: Vec<(AmountField, Amount)>,
    regime: Regime,
}

impl FiscalData {
    /// Validate all sale fields of a raw receipt.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] naming the first field, in wire order,
    /// that violates its contract.
    pub fn from_receipt(raw: &RawReceipt) -> Result<Self, ValidationError> {
        let tax_id =
            TaxId::new(raw.tax_id.as_str()).map_err(|e| ValidationError::new("dic_popl", e))?;

        let delegating_tax_id = match raw.delegating_tax_id.as_deref() {
            Some(s) if !s.is_empty() => {
                Some(TaxId::new(s).map_err(|e| ValidationError::new("dic_poverujiciho", e))?)
            }
            _ => None,
        };

        let establishment_id = EstablishmentId::new(raw.establishment_id)
            .map_err(|e| ValidationError::new("id_provoz", e))?;
        let till_id = ShortIdentifier::new(raw.till_id.as_str())
            .map_err(|e| ValidationError::new("id_pokl", e))?;
        let sequence_number = MediumIdentifier::new(raw.sequence_number.as_str())
            .map_err(|e| ValidationError::new("porad_cis", e))?;
        let sale_time = FiscalTimestamp::from_datetime(raw.sale_time)
            .map_err(|e| ValidationError::new("dat_trzby", e))?;
        let total_amount = Amount::from_f64(raw.total_amount)
            .map_err(|e| ValidationError::new("celk_trzba", e))?;

        let mut amounts = Vec::new();
        for (field, value) in raw.amounts.entries() {
            if let Some(v) = value {
                let amount = Amount::from_f64(v)
                    .map_err(|e| ValidationError::new(field.attribute_name(), e))?;
                amounts.push((field, amount));
            }
        }

        Ok(Self {
            tax_id,
            delegating_tax_id,
            establishment_id,
            till_id,
            sequence_number,
            sale_time,
            total_amount,
            amounts,
            regime: raw.regime,
        })
    }

    /// Taxpayer's tax ID (`dic_popl`).
    pub fn tax_id(&self) -> &TaxId {
        &self.tax_id
    }

    /// Delegating taxpayer's tax ID (`dic_poverujiciho`), if any.
    pub fn delegating_tax_id(&self) -> Option<&TaxId> {
        self.delegating_tax_id.as_ref()
    }

    /// Establishment number (`id_provoz`).
    pub fn establishment_id(&self) -> EstablishmentId {
        self.establishment_id
    }

    /// Till identifier (`id_pokl`).
    pub fn till_id(&self) -> &ShortIdentifier {
        &self.till_id
    }

    /// Receipt sequence number (`porad_cis`).
    pub fn sequence_number(&self) -> &MediumIdentifier {
        &self.sequence_number
    }

    /// Time of sale (`dat_trzby`).
    pub fn sale_time(&self) -> &FiscalTimestamp {
        &self.sale_time
    }

    /// Total amount (`celk_trzba`).
    pub fn total_amount(&self) -> &Amount {
        &self.total_amount
    }

    /// Present itemized amounts, in wire order. Absent amounts are not listed.
    pub fn amounts(&self) -> &[(AmountField, Amount)] {
        &self.amounts
    }

    /// Reporting regime (`rezim`).
    pub fn regime(&self) -> Regime {
        self.regime
    }
}
