//! # Price Helpers
//!
//! Pure functions turning raw price input into [`Money`] and computing VAT.
//!
//! ## Input Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Catalog JSON    "12.50" or 12.5  ──┐                                  │
//! │  Keypad          "1","5","0"      ──┼──► selling_price() ──► Money     │
//! │  Discount API    "10" (percent)   ──┘    parse_rate()    ──► Rate      │
//! │                                                                         │
//! │  Garbage ("abc", "-3", NaN, null) ──► 0, never an error                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The checkout screen must always have a displayable total, so nothing in
//! this module returns a `Result`.
//!
//! ## Rounding
//! Every conversion rounds half-up (away from zero) at 2 decimals. Invoice
//! printing uses the same rule, so receipts and totals reconcile to the cent.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer};
use std::str::FromStr;

use crate::money::Money;
use crate::types::{Rate, VatMode};

/// Parses a decimal price string into money.
///
/// ```rust
/// use tally_core::pricing::selling_price;
///
/// assert_eq!(selling_price("12.5").cents(), 1250);
/// assert_eq!(selling_price(" 150 ").cents(), 15000);
/// assert_eq!(selling_price("1.005").cents(), 101);
/// assert_eq!(selling_price("abc").cents(), 0);
/// assert_eq!(selling_price("-4").cents(), 0);
/// ```
pub fn selling_price(raw: &str) -> Money {
    parse_scaled(raw, 2)
        .map(Money::from_cents)
        .unwrap_or_default()
}

/// Float variant of [`selling_price`] for numeric JSON fields.
///
/// Non-finite and negative values are 0.
pub fn selling_price_from_f64(raw: f64) -> Money {
    if !raw.is_finite() || raw < 0.0 {
        return Money::zero();
    }
    Decimal::from_f64_retain(raw)
        .and_then(|d| scale_to_units(d, 2))
        .map(Money::from_cents)
        .unwrap_or_default()
}

/// Parses a percentage string ("15", "7.5") into a [`Rate`].
///
/// ```rust
/// use tally_core::pricing::parse_rate;
///
/// assert_eq!(parse_rate("15").bps(), 1500);
/// assert_eq!(parse_rate("7.5").bps(), 750);
/// assert_eq!(parse_rate("").bps(), 0);
/// ```
pub fn parse_rate(raw: &str) -> Rate {
    parse_scaled(raw, 2)
        .and_then(|bps| u32::try_from(bps).ok())
        .map(Rate::from_bps)
        .unwrap_or_default()
}

/// VAT contained in (inclusive) or due on top of (exclusive) `amount`.
///
/// ```text
/// Exclusive:  amount × r / 100
/// Inclusive:  amount × r / (100 + r)
/// ```
///
/// ```rust
/// use tally_core::money::Money;
/// use tally_core::pricing::vat_amount;
/// use tally_core::types::{Rate, VatMode};
///
/// let price = Money::from_cents(10_000);
/// let vat = vat_amount(price, Rate::from_percent(15), VatMode::Exclusive);
/// assert_eq!(vat.cents(), 1_500);
///
/// let gross = Money::from_cents(11_500);
/// let vat = vat_amount(gross, Rate::from_percent(15), VatMode::Inclusive);
/// assert_eq!(vat.cents(), 1_500);
/// ```
pub fn vat_amount(amount: Money, rate: Rate, mode: VatMode) -> Money {
    if rate.is_zero() {
        return Money::zero();
    }
    match mode {
        VatMode::Exclusive => amount.percent_of(rate),
        VatMode::Inclusive => amount.mul_div(
            rate.bps() as i64,
            (Rate::ONE_HUNDRED_PERCENT_BPS + rate.bps()) as i64,
        ),
    }
}

/// String-input convenience over [`vat_amount`].
pub fn vat_amount_str(raw_amount: &str, raw_percent: &str, mode: VatMode) -> Money {
    vat_amount(selling_price(raw_amount), parse_rate(raw_percent), mode)
}

/// Converts a JSON value (number or numeric string) into money.
/// Anything else is zero.
pub fn money_from_json(value: &serde_json::Value) -> Money {
    match value {
        // Number's Display keeps the literal digits, so 12.5 never becomes
        // 12.4999999 on the way through.
        serde_json::Value::Number(n) => selling_price(&n.to_string()),
        serde_json::Value::String(s) => selling_price(s),
        _ => Money::zero(),
    }
}

/// Converts a JSON value (number or numeric string) into a rate.
pub fn rate_from_json(value: &serde_json::Value) -> Rate {
    match value {
        serde_json::Value::Number(n) => parse_rate(&n.to_string()),
        serde_json::Value::String(s) => parse_rate(s),
        _ => Rate::zero(),
    }
}

/// `deserialize_with` helper for price fields coming from the front end.
///
/// ```rust
/// use serde::Deserialize;
/// use tally_core::money::Money;
///
/// #[derive(Deserialize)]
/// struct Row {
///     #[serde(deserialize_with = "tally_core::pricing::lenient_money")]
///     price: Money,
/// }
///
/// let row: Row = serde_json::from_str(r#"{"price": "9.99"}"#).unwrap();
/// assert_eq!(row.price.cents(), 999);
/// let row: Row = serde_json::from_str(r#"{"price": null}"#).unwrap();
/// assert_eq!(row.price.cents(), 0);
/// ```
pub fn lenient_money<'de, D>(deserializer: D) -> Result<Money, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(money_from_json(&value))
}

/// `deserialize_with` helper for percentage fields.
pub fn lenient_rate<'de, D>(deserializer: D) -> Result<Rate, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(rate_from_json(&value))
}

/// Parses `raw` and returns it multiplied by `10^dp`, rounded half-up.
/// `None` for empty, non-numeric, negative or out-of-range input.
fn parse_scaled(raw: &str, dp: u32) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let value = Decimal::from_str(trimmed).ok()?;
    scale_to_units(value, dp)
}

fn scale_to_units(value: Decimal, dp: u32) -> Option<i64> {
    if value.is_sign_negative() && !value.is_zero() {
        return None;
    }
    let rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    rounded
        .checked_mul(Decimal::from(10_i64.pow(dp)))?
        .to_i64()
}

// =============================================================================
// Unit Tests
// =============================================================================
