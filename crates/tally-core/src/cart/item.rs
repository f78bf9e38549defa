//! # Line Items
//!
//! One purchasable unit in the cart: a catalog item, a variant, or a keypad
//! open item.
//!
//! ## Void / Comp State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │                 void(ref)                   comp(ref)                   │
//! │   ┌────────┐ ◄──────────── ┌────────┐ ────────────► ┌────────┐         │
//! │   │ Voided │               │ Active │               │ Comped │         │
//! │   └────────┘ ────────────► └────────┘ ◄──────────── └────────┘         │
//! │                 restore()                 restore()                     │
//! │                                                                         │
//! │  Entering Voided/Comped:                                               │
//! │    amount_before_void_comp = total;  total = vat = discounted = 0      │
//! │  Restore:                                                              │
//! │    total = amount_before_void_comp;  reference/reason cleared          │
//! │                                                                         │
//! │  Voided ⇄ Comped switches directly: new reference/reason replace the   │
//! │  old ones, the first snapshot is kept for restore.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;
use uuid::Uuid;

use crate::keypad::OPEN_ITEM_SKU;
use crate::money::Money;
use crate::pricing::{lenient_money, lenient_rate};
use crate::types::Rate;

// =============================================================================
// Modifier
// =============================================================================

/// Optional add-on ("extra cheese") with a per-unit price delta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Modifier {
    pub id: String,
    pub name: String,
    pub price_delta: Money,
}

impl Modifier {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price_delta: Money) -> Self {
        Modifier {
            id: id.into(),
            name: name.into(),
            price_delta,
        }
    }
}

// =============================================================================
// Line Status
// =============================================================================

/// Void/comp state of a line.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LineStatus {
    #[default]
    Active,
    /// Cancelled; stays on the order with a zero contribution.
    Voided {
        reference: String,
        reason: Option<String>,
    },
    /// Complimentary; stays on the order with a zero contribution.
    Comped {
        reference: String,
        reason: Option<String>,
    },
}

impl LineStatus {
    pub fn label(&self) -> &'static str {
        match self {
            LineStatus::Active => "active",
            LineStatus::Voided { .. } => "voided",
            LineStatus::Comped { .. } => "comped",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, LineStatus::Active)
    }
}

impl fmt::Display for LineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Requested status change, as sent by the void/comp dialogs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum StatusChange {
    Void {
        reference: String,
        reason: Option<String>,
    },
    Comp {
        reference: String,
        reason: Option<String>,
    },
    Restore,
}

impl StatusChange {
    pub fn target_label(&self) -> &'static str {
        match self {
            StatusChange::Void { .. } => "voided",
            StatusChange::Comp { .. } => "comped",
            StatusChange::Restore => "active",
        }
    }
}

/// A status change that is not allowed from the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTransition {
    pub from: &'static str,
    pub to: &'static str,
}

// =============================================================================
// Line Item
// =============================================================================

/// A line in the cart.
///
/// `total`, `vat_amount` and `discounted_total` are derived; they are only
/// written by the calculator and the void/comp transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Line id (UUID v4), stable across edits.
    pub id: String,

    pub sku: String,

    pub variant_id: Option<String>,

    pub name: String,

    /// Unit selling price, frozen when the line was added.
    pub unit_price: Money,

    pub vat_rate: Rate,

    pub quantity: i64,

    #[serde(default)]
    pub modifiers: Vec<Modifier>,

    #[serde(default)]
    pub status: LineStatus,

    /// Snapshot of `total` taken when the line was voided or comped.
    #[serde(default)]
    pub amount_before_void_comp: Option<Money>,

    /// (unit price + modifiers) × quantity; zero while voided/comped.
    #[serde(default)]
    pub total: Money,

    /// VAT on `total`, at this line's own rate.
    #[serde(default)]
    pub vat_amount: Money,

    /// `total` minus this line's share of cart-level discounts.
    #[serde(default)]
    pub discounted_total: Money,

    #[serde(default)]
    pub note: Option<String>,

    /// Already printed on a kitchen order ticket.
    #[serde(default)]
    pub sent_to_kot: bool,

    #[serde(default)]
    pub is_open_item: bool,

    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl LineItem {
    /// Creates an active catalog line.
    pub fn new(
        sku: impl Into<String>,
        name: impl Into<String>,
        unit_price: Money,
        vat_rate: Rate,
        quantity: i64,
    ) -> Self {
        LineItem {
            id: Uuid::new_v4().to_string(),
            sku: sku.into(),
            variant_id: None,
            name: name.into(),
            unit_price,
            vat_rate,
            quantity,
            modifiers: Vec::new(),
            status: LineStatus::Active,
            amount_before_void_comp: None,
            total: Money::zero(),
            vat_amount: Money::zero(),
            discounted_total: Money::zero(),
            note: None,
            sent_to_kot: false,
            is_open_item: false,
            added_at: Utc::now(),
        }
    }

    /// Creates an ad hoc line typed on the keypad.
    pub fn open_item(name: impl Into<String>, unit_price: Money, vat_rate: Rate) -> Self {
        let mut item = LineItem::new(OPEN_ITEM_SKU, name, unit_price, vat_rate, 1);
        item.is_open_item = true;
        item
    }

    pub fn with_variant(mut self, variant_id: impl Into<String>) -> Self {
        self.variant_id = Some(variant_id.into());
        self
    }

    pub fn with_modifiers(mut self, modifiers: Vec<Modifier>) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Unit price plus every modifier's delta.
    pub fn unit_price_with_modifiers(&self) -> Money {
        self.unit_price + self.modifiers.iter().map(|m| m.price_delta).sum::<Money>()
    }

    /// What the line is worth when active, regardless of its status.
    pub fn gross_amount(&self) -> Money {
        self.unit_price_with_modifiers().multiply_quantity(self.quantity)
    }

    /// [`Self::gross_amount`], or `None` if any step overflows.
    pub fn checked_gross_amount(&self) -> Option<Money> {
        self.modifiers
            .iter()
            .try_fold(self.unit_price, |acc, m| acc.checked_add(m.price_delta))?
            .checked_mul(self.quantity)
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Lines that can be merged into one another on add.
    pub fn same_product_as(&self, other: &LineItem) -> bool {
        !self.is_open_item
            && !other.is_open_item
            && self.sku == other.sku
            && self.variant_id == other.variant_id
            && self.unit_price == other.unit_price
            && self.vat_rate == other.vat_rate
            && self.modifiers == other.modifiers
    }

    /// Applies a void/comp/restore transition.
    ///
    /// A voided line can be comped and the other way round; the new status
    /// replaces the old reference and reason.
    pub fn apply_status(&mut self, change: StatusChange) -> Result<(), InvalidTransition> {
        let from = self.status.label();
        let to = change.target_label();
        let active = self.is_active();
        match change {
            StatusChange::Void { reference, reason }
                if !matches!(self.status, LineStatus::Voided { .. }) =>
            {
                self.enter_zeroed(LineStatus::Voided { reference, reason });
                Ok(())
            }
            StatusChange::Comp { reference, reason }
                if !matches!(self.status, LineStatus::Comped { .. }) =>
            {
                self.enter_zeroed(LineStatus::Comped { reference, reason });
                Ok(())
            }
            StatusChange::Restore if !active => {
                let snapshot = self.amount_before_void_comp.take();
                self.total = snapshot.unwrap_or_else(|| self.gross_amount());
                self.status = LineStatus::Active;
                Ok(())
            }
            _ => Err(InvalidTransition { from, to }),
        }
    }

    fn enter_zeroed(&mut self, status: LineStatus) {
        // `total` can be stale if the line was edited in the same patch;
        // gross_amount() is what the calculator would have written.
        // Switching between voided and comped keeps the first snapshot.
        if self.is_active() || self.amount_before_void_comp.is_none() {
            self.amount_before_void_comp = Some(self.gross_amount());
        }
        self.total = Money::zero();
        self.vat_amount = Money::zero();
        self.discounted_total = Money::zero();
        self.status = status;
    }
}

// =============================================================================
// Line Item Patch
// =============================================================================

/// Field changes for `CartService::update_item`.
///
/// `None` leaves a field as it is. `note: Some(None)` clears the note.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemPatch {
    pub quantity: Option<i64>,
    pub unit_price: Option<Money>,
    pub modifiers: Option<Vec<Modifier>>,
    pub note: Option<Option<String>>,
    pub sent_to_kot: Option<bool>,
    pub status: Option<StatusChange>,
}

impl LineItemPatch {
    pub fn quantity(qty: i64) -> Self {
        LineItemPatch {
            quantity: Some(qty),
            ..Default::default()
        }
    }

    pub fn status(change: StatusChange) -> Self {
        LineItemPatch {
            status: Some(change),
            ..Default::default()
        }
    }

    /// True when the patch edits anything that feeds the line's amount.
    pub fn touches_amount(&self) -> bool {
        self.quantity.is_some() || self.unit_price.is_some() || self.modifiers.is_some()
    }
}

// =============================================================================
// Incoming line
// =============================================================================

/// A line as posted by the catalog picker.
///
/// Prices and VAT arrive as JSON numbers or strings; anything unusable is
/// read as zero.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLineItem {
    pub sku: String,
    #[serde(default)]
    pub variant_id: Option<String>,
    pub name: String,
    #[serde(deserialize_with = "lenient_money")]
    pub price: Money,
    #[serde(default, deserialize_with = "lenient_rate")]
    pub vat: Rate,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    #[serde(default)]
    pub modifiers: Vec<NewModifier>,
    #[serde(default)]
    pub note: Option<String>,
}

/// A modifier as posted by the picker; `price` is in major units.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewModifier {
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "lenient_money")]
    pub price: Money,
}

impl From<NewModifier> for Modifier {
    fn from(input: NewModifier) -> Self {
        Modifier::new(input.id, input.name, input.price)
    }
}

fn default_quantity() -> i64 {
    1
}

impl From<NewLineItem> for LineItem {
    fn from(input: NewLineItem) -> Self {
        let mut item = LineItem::new(input.sku, input.name, input.price, input.vat, input.quantity)
            .with_modifiers(input.modifiers.into_iter().map(Modifier::from).collect());
        item.variant_id = input.variant_id;
        item.note = input.note;
        item
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn burger() -> LineItem {
        LineItem::new("BURGER", "Burger", Money::from_cents(1000), Rate::from_percent(15), 2)
            .with_modifiers(vec![Modifier::new("CHEESE", "Cheese", Money::from_cents(150))])
    }

    #[test]
    fn test_gross_amount_includes_modifiers() {
        let item = burger();
        assert_eq!(item.unit_price_with_modifiers().cents(), 1150);
        assert_eq!(item.gross_amount().cents(), 2300);
    }

    #[test]
    fn test_void_snapshots_and_zeroes() {
        let mut item = burger();
        item.total = item.gross_amount();
        item.vat_amount = Money::from_cents(345);
        item.discounted_total = item.total;

        item.apply_status(StatusChange::Void {
            reference: "V-1".into(),
            reason: Some("wrong order".into()),
        })
        .unwrap();

        assert_eq!(item.status.label(), "voided");
        assert_eq!(item.amount_before_void_comp, Some(Money::from_cents(2300)));
        assert_eq!(item.total, Money::zero());
        assert_eq!(item.vat_amount, Money::zero());
        assert_eq!(item.discounted_total, Money::zero());
    }

    #[test]
    fn test_restore_puts_total_back() {
        let mut item = burger();
        item.total = item.gross_amount();
        item.apply_status(StatusChange::Comp {
            reference: "C-1".into(),
            reason: None,
        })
        .unwrap();
        item.apply_status(StatusChange::Restore).unwrap();

        assert!(item.is_active());
        assert_eq!(item.total.cents(), 2300);
        assert_eq!(item.amount_before_void_comp, None);
    }

    #[test]
    fn test_void_switches_to_comp() {
        let mut item = burger();
        item.total = item.gross_amount();
        item.apply_status(StatusChange::Void {
            reference: "V-1".into(),
            reason: Some("wrong order".into()),
        })
        .unwrap();

        item.apply_status(StatusChange::Comp {
            reference: "C-1".into(),
            reason: None,
        })
        .unwrap();

        assert_eq!(
            item.status,
            LineStatus::Comped {
                reference: "C-1".into(),
                reason: None,
            }
        );
        assert_eq!(item.amount_before_void_comp, Some(Money::from_cents(2300)));
        assert_eq!(item.total, Money::zero());

        item.apply_status(StatusChange::Void {
            reference: "V-2".into(),
            reason: None,
        })
        .unwrap();
        item.apply_status(StatusChange::Restore).unwrap();
        assert_eq!(item.total.cents(), 2300);
    }

    #[test]
    fn test_repeat_void_is_rejected() {
        let mut item = burger();
        item.apply_status(StatusChange::Void {
            reference: "V-1".into(),
            reason: None,
        })
        .unwrap();

        let err = item
            .apply_status(StatusChange::Void {
                reference: "V-2".into(),
                reason: None,
            })
            .unwrap_err();
        assert_eq!(err, InvalidTransition { from: "voided", to: "voided" });
    }

    #[test]
    fn test_checked_gross_amount_overflow() {
        let item = LineItem::new("BIG", "Big", Money::from_cents(5_000_000_000_000_000_000), Rate::zero(), 2);
        assert_eq!(item.checked_gross_amount(), None);
        assert_eq!(burger().checked_gross_amount(), Some(Money::from_cents(2300)));
    }

    #[test]
    fn test_restore_active_is_rejected() {
        let mut item = burger();
        assert!(item.apply_status(StatusChange::Restore).is_err());
    }

    #[test]
    fn test_same_product_ignores_open_items() {
        let a = burger();
        let b = burger();
        assert!(a.same_product_as(&b));

        let open = LineItem::open_item("Misc", Money::from_cents(100), Rate::zero());
        assert!(!open.same_product_as(&open.clone()));
    }

    #[test]
    fn test_new_line_item_is_lenient() {
        let input: NewLineItem = serde_json::from_str(
            r#"{"sku":"TEA","name":"Tea","price":"2.5","vat":"abc",
                "modifiers":[{"id":"M","name":"Milk","price":0.5}]}"#,
        )
        .unwrap();
        let item = LineItem::from(input);

        assert_eq!(item.unit_price.cents(), 250);
        assert_eq!(item.modifiers[0].price_delta.cents(), 50);
        assert_eq!(item.vat_rate, Rate::zero());
        assert_eq!(item.quantity, 1);
    }

    #[test]
    fn test_stored_line_round_trips() {
        let mut item = burger();
        item.total = item.gross_amount();
        let json = serde_json::to_string(&item).unwrap();
        let back: LineItem = serde_json::from_str(&json).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn test_status_serializes_tagged() {
        let status = LineStatus::Voided {
            reference: "V-9".into(),
            reason: None,
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["state"], "voided");
        assert_eq!(json["reference"], "V-9");
    }
}
