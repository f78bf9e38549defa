//! # Cart Totals
//!
//! Derived figures shown on the cart footer, the payment screen and the
//! printed bill. Only [`recalculate`](crate::calculator::recalculate)
//! writes these.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Subtotal              total_selling_price          200.00             │
//! │  Discount (10%)      − total_discount                20.00             │
//! │  Service charge      + total_charges                 10.00             │
//! │  Charge VAT          + total_charge_vat               1.60             │
//! │  VAT (exclusive)     + total_vat_amount              30.00             │
//! │  ─────────────────────────────────────────────────────────             │
//! │  Total                 total_amount                 221.60             │
//! │  Wallet              − wallet_amount                 21.60             │
//! │  To pay                total_paid_amount            200.00             │
//! │  Tendered              tendered_amount              250.00             │
//! │  Change                change_due                    50.00             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::Rate;

/// A discount as it was resolved against the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentLine {
    pub id: String,
    pub name: String,
    pub amount: Money,
}

/// A charge as it was resolved against the cart, with its own VAT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ChargeLine {
    pub id: String,
    pub name: String,
    pub amount: Money,
    pub vat_amount: Money,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    /// Σ line totals over active lines, before discounts.
    pub total_selling_price: Money,
    /// Σ line VAT over active lines.
    pub total_vat_amount: Money,
    pub total_discount: Money,
    pub total_charges: Money,
    pub total_charge_vat: Money,
    /// Grand total.
    pub total_amount: Money,
    /// Part of the grand total covered by the customer's wallet.
    pub wallet_amount: Money,
    /// Grand total less wallet: what tenders have to cover.
    pub total_paid_amount: Money,
    pub tendered_amount: Money,
    pub change_due: Money,
    pub balance_due: Money,
    /// Effective discount as a share of the subtotal.
    pub discount_percentage: Rate,
    /// Number of active lines.
    pub item_count: usize,
    /// Σ quantity over active lines.
    pub total_quantity: i64,
    pub discount_lines: Vec<AdjustmentLine>,
    pub charge_lines: Vec<ChargeLine>,
}

impl CartTotals {
    /// True once tenders cover everything the wallet does not.
    pub fn is_settled(&self) -> bool {
        self.balance_due.is_zero()
    }
}
