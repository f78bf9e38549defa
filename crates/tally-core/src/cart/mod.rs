//! # Cart Aggregate
//!
//! The in-memory order: lines, cart-level adjustments, payment splits and
//! the totals derived from them.
//!
//! ## Ownership
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Cart                                                                  │
//! │  ├── items      Vec<LineItem>     ordered, index = position on screen  │
//! │  ├── discounts  Vec<Discount>     application order matters            │
//! │  ├── charges    Vec<Charge>                                            │
//! │  ├── tenders    Vec<Tender>                                            │
//! │  ├── wallet_balance               customer wallet available            │
//! │  └── totals     CartTotals        derived, never edited directly       │
//! │                                                                         │
//! │  Readers get &Cart. Only CartService (and the calculator) mutate.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod adjustment;
mod item;
mod totals;

pub use adjustment::{AdjustmentInput, AdjustmentValue, Charge, Discount, Tender};
pub use item::{
    InvalidTransition, LineItem, LineItemPatch, LineStatus, Modifier, NewLineItem, NewModifier,
    StatusChange,
};
pub use totals::{AdjustmentLine, CartTotals, ChargeLine};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub(crate) items: Vec<LineItem>,
    #[serde(default)]
    pub(crate) discounts: Vec<Discount>,
    #[serde(default)]
    pub(crate) charges: Vec<Charge>,
    #[serde(default)]
    pub(crate) tenders: Vec<Tender>,
    #[serde(default)]
    pub(crate) wallet_balance: Money,
    #[serde(default)]
    pub(crate) totals: CartTotals,
    #[ts(as = "String")]
    pub(crate) created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub(crate) updated_at: DateTime<Utc>,
}

impl Default for Cart {
    fn default() -> Self {
        Cart::new()
    }
}

impl Cart {
    pub fn new() -> Self {
        let now = Utc::now();
        Cart {
            items: Vec::new(),
            discounts: Vec::new(),
            charges: Vec::new(),
            tenders: Vec::new(),
            wallet_balance: Money::zero(),
            totals: CartTotals::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn item(&self, index: usize) -> Option<&LineItem> {
        self.items.get(index)
    }

    pub fn discounts(&self) -> &[Discount] {
        &self.discounts
    }

    pub fn charges(&self) -> &[Charge] {
        &self.charges
    }

    pub fn tenders(&self) -> &[Tender] {
        &self.tenders
    }

    pub fn wallet_balance(&self) -> Money {
        self.wallet_balance
    }

    pub fn totals(&self) -> &CartTotals {
        &self.totals
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// No lines at all (voided lines count as lines).
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_discount(&self, id: &str) -> bool {
        self.discounts.iter().any(|d| d.id == id)
    }

    pub fn has_charge(&self, id: &str) -> bool {
        self.charges.iter().any(|c| c.id == id)
    }

    /// Indices of active lines not yet printed on a kitchen ticket.
    pub fn pending_kitchen_indices(&self) -> Vec<usize> {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.is_active() && !item.sent_to_kot)
            .map(|(index, _)| index)
            .collect()
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
