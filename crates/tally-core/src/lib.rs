//! # tally-core: Pure Cart Calculation for Tally POS
//!
//! This crate is the **heart** of Tally POS. It turns line items,
//! discounts, charges and payment splits into consistent totals, with no
//! I/O of any kind.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Front end (mobile UI)                        │   │
//! │  │    Menu ──► Cart ──► Discounts/Charges ──► Payment ──► Bill    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 tally-session (orchestration)                   │   │
//! │  │    config, tracing, walk-in / per-table cart handles            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  pricing  │  │   cart    │  │calculator │  │  service  │  │   │
//! │  │   │  Money    │  │ LineItem  │  │ recompute │  │  mutate   │  │   │
//! │  │   │  VAT      │  │ Discount  │  │  totals   │  │  notify   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    tally-db (snapshot storage)                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Integer money (cents) with half-up rounding
//! - [`types`] - Rates, VAT mode, tender methods
//! - [`pricing`] - Lenient price parsing and VAT helpers
//! - [`keypad`] - Cents-first keypad entry for open items
//! - [`cart`] - Cart aggregate, lines, discounts, charges, tenders
//! - [`calculator`] - The recalculation pipeline
//! - [`service`] - Validated mutations with observers
//! - [`events`] - Typed change events
//! - [`policy`] - Pricing settings consumed by the calculator
//! - [`validation`] - Input rules
//! - [`error`] - Domain errors
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::{CartService, Discount, LineItem, Money, PricingPolicy, Rate};
//!
//! let mut cart = CartService::new(PricingPolicy::default());
//! cart.add_item(LineItem::new("PLATTER", "Mixed platter", Money::from_cents(20_000), Rate::zero(), 1))
//!     .unwrap();
//! cart.apply_discount(Discount::percentage("TEN", "10% off", Rate::from_percent(10)))
//!     .unwrap();
//!
//! assert_eq!(cart.cart().totals().total_discount.cents(), 2_000);
//! assert_eq!(cart.cart().totals().total_amount.cents(), 18_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod calculator;
pub mod cart;
pub mod error;
pub mod events;
pub mod keypad;
pub mod money;
pub mod policy;
pub mod pricing;
pub mod service;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{
    AdjustmentInput, AdjustmentValue, Cart, CartTotals, Charge, Discount, LineItem, LineItemPatch,
    LineStatus, Modifier, NewLineItem, NewModifier, StatusChange, Tender,
};
pub use error::{CartError, CartResult, ValidationError};
pub use events::{CartEvent, SubscriptionId};
pub use money::Money;
pub use policy::{ChargeVatFallback, PricingPolicy};
pub use service::CartService;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default cap on lines in one cart.
///
/// A banquet table can run long; this only stops runaway carts.
pub const MAX_CART_LINES: usize = 200;

/// Default cap on a single line's quantity.
///
/// Catches "1000" typed for "10" without blocking bulk retail.
pub const MAX_ITEM_QUANTITY: i64 = 9_999;
