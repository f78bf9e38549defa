//! # Pricing Policy
//!
//! Business settings the calculator and service consume. Built from the
//! session configuration; core never reads configuration itself.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::types::{Rate, VatMode};
use crate::{MAX_CART_LINES, MAX_ITEM_QUANTITY};

/// VAT on a charge that carries no rate of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ChargeVatFallback {
    /// Tax the charge at the company VAT rate.
    #[default]
    CompanyRate,
    /// The charge is not taxed.
    Exempt,
}

impl fmt::Display for ChargeVatFallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChargeVatFallback::CompanyRate => write!(f, "company_rate"),
            ChargeVatFallback::Exempt => write!(f, "exempt"),
        }
    }
}

impl std::str::FromStr for ChargeVatFallback {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "company_rate" | "company" => Ok(ChargeVatFallback::CompanyRate),
            "exempt" | "none" => Ok(ChargeVatFallback::Exempt),
            other => Err(format!(
                "Unknown charge VAT fallback: '{}'. Valid options: company_rate, exempt",
                other
            )),
        }
    }
}

/// How a cart is priced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PricingPolicy {
    pub vat_mode: VatMode,

    /// Company VAT rate, used for charges without their own rate.
    pub company_vat_rate: Rate,

    pub charge_vat_fallback: ChargeVatFallback,

    /// Fold a re-added identical product into its existing line instead of
    /// appending a new one.
    pub merge_identical_lines: bool,

    pub max_lines: usize,

    pub max_quantity: i64,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        PricingPolicy {
            vat_mode: VatMode::Exclusive,
            company_vat_rate: Rate::zero(),
            charge_vat_fallback: ChargeVatFallback::CompanyRate,
            merge_identical_lines: false,
            max_lines: MAX_CART_LINES,
            max_quantity: MAX_ITEM_QUANTITY,
        }
    }
}

impl PricingPolicy {
    /// VAT rate applied to a charge.
    pub fn charge_vat_rate(&self, own: Option<Rate>) -> Rate {
        match (own, self.charge_vat_fallback) {
            (Some(rate), _) => rate,
            (None, ChargeVatFallback::CompanyRate) => self.company_vat_rate,
            (None, ChargeVatFallback::Exempt) => Rate::zero(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_charge_vat_rate_fallback() {
        let mut policy = PricingPolicy {
            company_vat_rate: Rate::from_percent(16),
            ..Default::default()
        };
        assert_eq!(policy.charge_vat_rate(Some(Rate::from_percent(5))), Rate::from_percent(5));
        assert_eq!(policy.charge_vat_rate(None), Rate::from_percent(16));

        policy.charge_vat_fallback = ChargeVatFallback::Exempt;
        assert_eq!(policy.charge_vat_rate(None), Rate::zero());
    }

    #[test]
    fn test_fallback_parse() {
        assert_eq!("none".parse::<ChargeVatFallback>().unwrap(), ChargeVatFallback::Exempt);
        assert!("sometimes".parse::<ChargeVatFallback>().is_err());
    }
}
