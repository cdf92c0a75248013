//! # Raw Receipt Input
//!
//! [`RawReceipt`] is what a point-of-sale application hands to the client:
//! plain strings, floats and a datetime. Nothing here is validated. The
//! record constructors in [`crate::record`] turn it into wire-ready values
//! or report the first field that does not fit.

use chrono::{DateTime, FixedOffset};

use crate::fields::Regime;
use crate::record::AmountField;

/// A sale as recorded by the point of sale, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawReceipt {
    /// Caller-chosen message UUID. A fresh v4 UUID is generated when `None`.
    pub message_uuid: Option<String>,
    /// `true` on the first attempt to register this sale, `false` on resends.
    pub first_submission: bool,
    /// Taxpayer's tax ID (`dic_popl`).
    pub tax_id: String,
    /// Tax ID of the delegating taxpayer (`dic_poverujiciho`). `None` and
    /// `Some("")` both mean absent.
    pub delegating_tax_id: Option<String>,
    /// Establishment number (`id_provoz`).
    pub establishment_id: i64,
    /// Till identifier (`id_pokl`).
    pub till_id: String,
    /// Receipt sequence number (`porad_cis`).
    pub sequence_number: String,
    /// Time of sale (`dat_trzby`).
    pub sale_time: DateTime<FixedOffset>,
    /// Total amount (`celk_trzba`).
    pub total_amount: f64,
    /// Optional itemized amounts.
    pub amounts: ItemizedAmounts,
    /// Reporting regime (`rezim`).
    pub regime: Regime,
}

/// Itemized amounts of a sale. Every field is optional and an absent value
/// is omitted from the request rather than sent as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ItemizedAmounts {
    /// Amount exempt from VAT (`zakl_nepodl_dph`).
    pub vat_exempt: Option<f64>,
    /// Tax base at the standard rate (`zakl_dan1`).
    pub standard_base: Option<f64>,
    /// VAT at the standard rate (`dan1`).
    pub standard_vat: Option<f64>,
    /// Tax base at the first reduced rate (`zakl_dan2`).
    pub reduced1_base: Option<f64>,
    /// VAT at the first reduced rate (`dan2`).
    pub reduced1_vat: Option<f64>,
    /// Tax base at the second reduced rate (`zakl_dan3`).
    pub reduced2_base: Option<f64>,
    /// VAT at the second reduced rate (`dan3`).
    pub reduced2_vat: Option<f64>,
    /// Travel service amount under the special scheme (`cest_sluz`).
    pub travel_services: Option<f64>,
    /// Used goods at the standard rate (`pouzit_zboz1`).
    pub used_goods_standard: Option<f64>,
    /// Used goods at the first reduced rate (`pouzit_zboz2`).
    pub used_goods_reduced1: Option<f64>,
    /// Used goods at the second reduced rate (`pouzit_zboz3`).
    pub used_goods_reduced2: Option<f64>,
    /// Amount intended for later drawing or settlement (`urceno_cerp_zuct`).
    pub for_later_drawing: Option<f64>,
    /// Amount drawn or settled (`cerp_zuct`).
    pub drawn: Option<f64>,
}

impl ItemizedAmounts {
    /// All thirteen slots in wire order, paired with their field.
    pub fn entries(&self) -> [(AmountField, Option<f64>); 13] {
        [
            (AmountField::VatExempt, self.vat_exempt),
            (AmountField::StandardBase, self.standard_base),
            (AmountField::StandardVat, self.standard_vat),
            (AmountField::Reduced1Base, self.reduced1_base),
            (AmountField::Reduced1Vat, self.reduced1_vat),
            (AmountField::Reduced2Base, self.reduced2_base),
            (AmountField::Reduced2Vat, self.reduced2_vat),
            (AmountField::TravelServices, self.travel_services),
            (AmountField::UsedGoodsStandard, self.used_goods_standard),
            (AmountField::UsedGoodsReduced1, self.used_goods_reduced1),
            (AmountField::UsedGoodsReduced2, self.used_goods_reduced2),
            (AmountField::ForLaterDrawing, self.for_later_drawing),
            (AmountField::Drawn, self.drawn),
        ]
    }
}
