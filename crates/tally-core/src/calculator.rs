//! # Recalculation
//!
//! Derives every line figure and every cart total from the cart's inputs.
//! Runs after each accepted mutation.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Lines        total = (unit + Σ modifiers) × qty   (0 if void/comp) │
//! │                  vat   = vat_amount(total, line rate, mode)            │
//! │                         │                                              │
//! │                         ▼  subtotal = Σ total                          │
//! │  2. Discounts    in application order, each against the running        │
//! │                  subtotal and clamped to it                            │
//! │                         │                                              │
//! │                         ▼                                              │
//! │  3. Charges      % of the undiscounted subtotal, + their own VAT       │
//! │                         │                                              │
//! │                         ▼                                              │
//! │  4. Grand total  subtotal − discount + charges + charge VAT            │
//! │                  (+ line VAT when prices are VAT-exclusive)            │
//! │                         │                                              │
//! │                         ▼                                              │
//! │  5. Settlement   wallet, amount to pay, tendered, change, balance      │
//! │                         │                                              │
//! │                         ▼                                              │
//! │  6. Spread       discount shared across lines → discounted_total       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The result depends only on the cart's inputs and the policy, so running
//! it twice changes nothing.

use crate::cart::{AdjustmentLine, Cart, CartTotals, ChargeLine, LineItem};
use crate::money::{div_round_half_up, Money};
use crate::policy::PricingPolicy;
use crate::pricing::vat_amount;
use crate::types::{Rate, VatMode};

/// Recomputes `cart` in place. Totals are replaced in one assignment.
pub fn recalculate(cart: &mut Cart, policy: &PricingPolicy) {
    let mut totals = CartTotals::default();

    // 1. Lines
    for item in cart.items.iter_mut() {
        price_line(item, policy.vat_mode);
        if item.is_active() {
            totals.total_selling_price += item.total;
            totals.total_vat_amount += item.vat_amount;
            totals.item_count += 1;
            totals.total_quantity += item.quantity;
        }
    }
    let subtotal = totals.total_selling_price;

    // 2. Discounts
    let mut running = subtotal;
    for discount in &cart.discounts {
        let amount = discount
            .value
            .amount_against(running)
            .min(running)
            .non_negative();
        running -= amount;
        totals.discount_lines.push(AdjustmentLine {
            id: discount.id.clone(),
            name: discount.name.clone(),
            amount,
        });
    }
    totals.total_discount = subtotal - running;

    // 3. Charges
    for charge in &cart.charges {
        let amount = charge.value.amount_against(subtotal);
        let rate = policy.charge_vat_rate(charge.vat_rate);
        let vat = vat_amount(amount, rate, VatMode::Exclusive);
        totals.total_charges += amount;
        totals.total_charge_vat += vat;
        totals.charge_lines.push(ChargeLine {
            id: charge.id.clone(),
            name: charge.name.clone(),
            amount,
            vat_amount: vat,
        });
    }

    // 4. Grand total
    totals.total_amount = running + totals.total_charges + totals.total_charge_vat;
    if policy.vat_mode == VatMode::Exclusive {
        totals.total_amount += totals.total_vat_amount;
    }

    // 5. Settlement
    totals.wallet_amount = cart.wallet_balance.min(totals.total_amount).non_negative();
    totals.total_paid_amount = totals.total_amount - totals.wallet_amount;
    totals.tendered_amount = cart.tenders.iter().map(|t| t.amount).sum();
    let cash: Money = cart
        .tenders
        .iter()
        .filter(|t| t.method.gives_change())
        .map(|t| t.amount)
        .sum();
    let overpaid = (totals.tendered_amount - totals.total_paid_amount).non_negative();
    totals.change_due = overpaid.min(cash);
    totals.balance_due = (totals.total_paid_amount - totals.tendered_amount).non_negative();
    totals.discount_percentage = discount_percentage(totals.total_discount, subtotal);

    // 6. Spread
    spread_discount(&mut cart.items, totals.total_discount, subtotal);

    cart.totals = totals;
}

/// Writes `total`, `vat_amount` and the void/comp snapshot for one line.
fn price_line(item: &mut LineItem, mode: VatMode) {
    if item.is_active() {
        item.total = item.gross_amount();
        item.vat_amount = vat_amount(item.total, item.vat_rate, mode);
    } else {
        if item.amount_before_void_comp.is_none() {
            item.amount_before_void_comp = Some(item.gross_amount());
        }
        item.total = Money::zero();
        item.vat_amount = Money::zero();
    }
    item.discounted_total = item.total;
}

/// `discount / subtotal` as a rate, 0 for an empty subtotal.
fn discount_percentage(discount: Money, subtotal: Money) -> Rate {
    if !subtotal.is_positive() {
        return Rate::zero();
    }
    let bps = div_round_half_up(
        discount.cents() as i128 * Rate::ONE_HUNDRED_PERCENT_BPS as i128,
        subtotal.cents() as i128,
    );
    Rate::from_bps(u32::try_from(bps).unwrap_or(Rate::ONE_HUNDRED_PERCENT_BPS))
}

/// Shares `discount` across active lines in proportion to their totals.
///
/// Each line gets the floor of its exact share; the leftover cents go one
/// each to the lines with the largest fractional parts (ties: larger line,
/// then earlier line). Shares always sum to `discount` exactly and never
/// exceed a line's total.
fn spread_discount(items: &mut [LineItem], discount: Money, subtotal: Money) {
    if discount.is_zero() || !subtotal.is_positive() {
        return;
    }
    let d = discount.cents() as i128;
    let s = subtotal.cents() as i128;

    // (index, share, fractional numerator, line total)
    let mut shares: Vec<(usize, i128, i128, i64)> = items
        .iter()
        .enumerate()
        .filter(|(_, item)| item.is_active() && item.total.is_positive())
        .map(|(index, item)| {
            let exact = d * item.total.cents() as i128;
            (index, exact / s, exact % s, item.total.cents())
        })
        .collect();

    let allocated: i128 = shares.iter().map(|(_, share, _, _)| share).sum();
    let mut leftover = d - allocated;

    shares.sort_by(|a, b| b.2.cmp(&a.2).then(b.3.cmp(&a.3)).then(a.0.cmp(&b.0)));
    for entry in shares.iter_mut() {
        if leftover <= 0 {
            break;
        }
        entry.1 += 1;
        leftover -= 1;
    }

    for (index, share, _, _) in shares {
        let item = &mut items[index];
        item.discounted_total = item.total - Money::from_cents(share as i64);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
