//! # Discounts, Charges and Tenders
//!
//! Cart-level adjustments. Each is identified by an id and may be applied
//! at most once per cart.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Discount   Amount(5.00)       → subtract 5.00                          │
//! │             Percentage(10%)    → 10% of the running subtotal            │
//! │                                                                         │
//! │  Charge     Amount(2.00)       → add 2.00 (+ its own VAT)              │
//! │             Percentage(12.5%)  → 12.5% of the undiscounted subtotal    │
//! │                                  (+ its own VAT)                       │
//! │                                                                         │
//! │  Tender     Cash 50.00, Card 20.00 ... (payment splits)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::money::Money;
use crate::pricing::{money_from_json, rate_from_json};
use crate::types::{AdjustmentKind, Rate, TenderMethod};

// =============================================================================
// Adjustment Value
// =============================================================================

/// The value of a discount or charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AdjustmentValue {
    Amount(Money),
    Percentage(Rate),
}

impl AdjustmentValue {
    pub fn kind(&self) -> AdjustmentKind {
        match self {
            AdjustmentValue::Amount(_) => AdjustmentKind::Amount,
            AdjustmentValue::Percentage(_) => AdjustmentKind::Percentage,
        }
    }

    /// The amount this value stands for against `base`.
    pub fn amount_against(&self, base: Money) -> Money {
        match self {
            AdjustmentValue::Amount(amount) => *amount,
            AdjustmentValue::Percentage(rate) => base.percent_of(*rate),
        }
    }
}

// =============================================================================
// Discount
// =============================================================================

/// A coupon or manual discount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Discount {
    pub id: String,
    /// Coupon code as typed, if any.
    pub code: Option<String>,
    pub name: String,
    pub value: AdjustmentValue,
}

impl Discount {
    pub fn percentage(id: impl Into<String>, name: impl Into<String>, rate: Rate) -> Self {
        Discount {
            id: id.into(),
            code: None,
            name: name.into(),
            value: AdjustmentValue::Percentage(rate),
        }
    }

    pub fn amount(id: impl Into<String>, name: impl Into<String>, amount: Money) -> Self {
        Discount {
            id: id.into(),
            code: None,
            name: name.into(),
            value: AdjustmentValue::Amount(amount),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

// =============================================================================
// Charge
// =============================================================================

/// A custom fee (service charge, delivery, packaging).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Charge {
    pub id: String,
    pub name: String,
    pub value: AdjustmentValue,
    /// The charge's own tax reference. When absent the pricing policy's
    /// `charge_vat_fallback` decides.
    pub vat_rate: Option<Rate>,
}

impl Charge {
    pub fn percentage(id: impl Into<String>, name: impl Into<String>, rate: Rate) -> Self {
        Charge {
            id: id.into(),
            name: name.into(),
            value: AdjustmentValue::Percentage(rate),
            vat_rate: None,
        }
    }

    pub fn amount(id: impl Into<String>, name: impl Into<String>, amount: Money) -> Self {
        Charge {
            id: id.into(),
            name: name.into(),
            value: AdjustmentValue::Amount(amount),
            vat_rate: None,
        }
    }

    pub fn with_vat(mut self, rate: Rate) -> Self {
        self.vat_rate = Some(rate);
        self
    }
}

// =============================================================================
// Tender
// =============================================================================

/// One part of a (possibly split) payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Tender {
    pub id: String,
    pub method: TenderMethod,
    pub amount: Money,
    /// Card approval code, voucher number, etc.
    pub reference: Option<String>,
}

impl Tender {
    pub fn new(method: TenderMethod, amount: Money) -> Self {
        Tender {
            id: Uuid::new_v4().to_string(),
            method,
            amount,
            reference: None,
        }
    }

    pub fn cash(amount: Money) -> Self {
        Tender::new(TenderMethod::Cash, amount)
    }

    pub fn card(amount: Money, reference: impl Into<String>) -> Self {
        let mut tender = Tender::new(TenderMethod::Card, amount);
        tender.reference = Some(reference.into());
        tender
    }
}

// =============================================================================
// Incoming adjustment
// =============================================================================

/// A discount or charge row as returned by the listing endpoints.
///
/// `value` is a number or numeric string: major units for `amount`, a
/// percentage for `percentage`. Unusable values read as zero and are then
/// rejected by validation when applied.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentInput {
    pub id: String,
    #[serde(default)]
    pub code: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AdjustmentKind,
    pub value: serde_json::Value,
    /// Charges only: the charge's own VAT percentage.
    #[serde(default)]
    pub vat: Option<serde_json::Value>,
}

impl AdjustmentInput {
    fn adjustment_value(&self) -> AdjustmentValue {
        match self.kind {
            AdjustmentKind::Amount => AdjustmentValue::Amount(money_from_json(&self.value)),
            AdjustmentKind::Percentage => AdjustmentValue::Percentage(rate_from_json(&self.value)),
        }
    }

    pub fn into_discount(self) -> Discount {
        Discount {
            value: self.adjustment_value(),
            id: self.id,
            code: self.code,
            name: self.name,
        }
    }

    pub fn into_charge(self) -> Charge {
        Charge {
            value: self.adjustment_value(),
            vat_rate: self.vat.as_ref().map(rate_from_json),
            id: self.id,
            name: self.name,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_against_base() {
        let base = Money::from_cents(20_000);
        assert_eq!(
            AdjustmentValue::Percentage(Rate::from_percent(10)).amount_against(base),
            Money::from_cents(2_000)
        );
        assert_eq!(
            AdjustmentValue::Amount(Money::from_cents(500)).amount_against(base),
            Money::from_cents(500)
        );
    }

    #[test]
    fn test_discount_from_listing_row() {
        let input: AdjustmentInput = serde_json::from_str(
            r#"{"id":"d1","code":"HAPPY10","name":"Happy hour","type":"percentage","value":"10"}"#,
        )
        .unwrap();
        let discount = input.into_discount();

        assert_eq!(discount.code.as_deref(), Some("HAPPY10"));
        assert_eq!(discount.value, AdjustmentValue::Percentage(Rate::from_percent(10)));
    }

    #[test]
    fn test_charge_from_listing_row_with_vat() {
        let input: AdjustmentInput = serde_json::from_str(
            r#"{"id":"c1","name":"Delivery","type":"amount","value":4.5,"vat":5}"#,
        )
        .unwrap();
        let charge = input.into_charge();

        assert_eq!(charge.value, AdjustmentValue::Amount(Money::from_cents(450)));
        assert_eq!(charge.vat_rate, Some(Rate::from_percent(5)));
    }

    #[test]
    fn test_value_serializes_adjacently_tagged() {
        let json = serde_json::to_value(AdjustmentValue::Amount(Money::from_cents(500))).unwrap();
        assert_eq!(json["kind"], "amount");
        assert_eq!(json["value"], 500);
    }
}
