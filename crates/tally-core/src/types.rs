//! # Domain Types
//!
//! Small value types shared by the cart, calculator and pricing helpers.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Value Types                                     │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Rate       │   │     VatMode     │   │ AdjustmentKind  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  bps (u32)      │   │  Inclusive      │   │  Amount         │       │
//! │  │  1500 = 15%     │   │  Exclusive      │   │  Percentage     │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐                                                   │
//! │  │  TenderMethod   │   Cash, Card, Wallet, Credit, Other(label)        │
//! │  └─────────────────┘                                                   │
//! │  ┌─────────────────┐                                                   │
//! │  │   SessionKey    │   WalkIn, Table(id)  (which cart a handle owns)   │
//! │  └─────────────────┘                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

// =============================================================================
// Rate
// =============================================================================

/// A percentage represented in basis points (bps).
///
/// Used for VAT rates and for percentage discounts/charges.
/// 1 basis point = 0.01%, so 1500 bps = 15%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Rate(u32);

impl Rate {
    /// 100% expressed in basis points.
    pub const ONE_HUNDRED_PERCENT_BPS: u32 = 10_000;

    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Rate(bps)
    }

    /// Creates a rate from a whole-number percentage (15 → 15%).
    #[inline]
    pub const fn from_percent(pct: u32) -> Self {
        Rate(pct * 100)
    }

    /// Creates a rate from a float percentage, for values that come
    /// straight from JSON numbers. Non-finite or negative input is 0.
    pub fn from_percentage(pct: f64) -> Self {
        if !pct.is_finite() || pct <= 0.0 {
            return Rate::zero();
        }
        Rate((pct * 100.0).round() as u32)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Rate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for Rate {
    fn default() -> Self {
        Rate::zero()
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}

// =============================================================================
// VAT Mode
// =============================================================================

/// Whether catalog prices already contain VAT.
///
/// This is a business setting (one per company), consumed by the
/// calculator; it is never decided per line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum VatMode {
    /// Price + VAT shown separately. 100.00 at 15% → 115.00 to pay.
    #[default]
    Exclusive,
    /// Price includes VAT. 115.00 at 15% contains 15.00 VAT.
    Inclusive,
}

impl fmt::Display for VatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VatMode::Exclusive => write!(f, "exclusive"),
            VatMode::Inclusive => write!(f, "inclusive"),
        }
    }
}

impl std::str::FromStr for VatMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exclusive" | "excl" => Ok(VatMode::Exclusive),
            "inclusive" | "incl" => Ok(VatMode::Inclusive),
            other => Err(format!(
                "Unknown VAT mode: '{}'. Valid options: exclusive, inclusive",
                other
            )),
        }
    }
}

// =============================================================================
// Adjustment Kind
// =============================================================================

/// How a discount or charge value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentKind {
    /// `value` is a fixed amount in cents.
    Amount,
    /// `value` is a rate in basis points.
    Percentage,
}

impl fmt::Display for AdjustmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdjustmentKind::Amount => write!(f, "amount"),
            AdjustmentKind::Percentage => write!(f, "percentage"),
        }
    }
}

// =============================================================================
// Tender Method
// =============================================================================

/// How part of a bill was settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TenderMethod {
    Cash,
    Card,
    /// Customer wallet balance paid in explicitly as a split.
    Wallet,
    /// On account (settled later).
    Credit,
    /// Any other method; the label is printed on the receipt.
    Other(String),
}

impl TenderMethod {
    /// Only cash can produce change.
    pub fn gives_change(&self) -> bool {
        matches!(self, TenderMethod::Cash)
    }
}

// =============================================================================
// Session Key
// =============================================================================

/// Which cart a session belongs to.
///
/// ```text
/// WalkIn          → "walk-in"      (counter / takeaway, one per terminal)
/// Table("T12")    → "table:T12"    (one per dine-in table)
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", content = "tableId", rename_all = "snake_case")]
pub enum SessionKey {
    WalkIn,
    Table(String),
}

impl SessionKey {
    const WALK_IN: &'static str = "walk-in";
    const TABLE_PREFIX: &'static str = "table:";

    pub fn table(id: impl Into<String>) -> Self {
        SessionKey::Table(id.into())
    }

    /// Storage kind label.
    pub fn kind(&self) -> &'static str {
        match self {
            SessionKey::WalkIn => "walk_in",
            SessionKey::Table(_) => "table",
        }
    }

    pub fn table_id(&self) -> Option<&str> {
        match self {
            SessionKey::WalkIn => None,
            SessionKey::Table(id) => Some(id),
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionKey::WalkIn => f.write_str(Self::WALK_IN),
            SessionKey::Table(id) => write!(f, "{}{}", Self::TABLE_PREFIX, id),
        }
    }
}

impl std::str::FromStr for SessionKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == Self::WALK_IN {
            return Ok(SessionKey::WalkIn);
        }
        match s.strip_prefix(Self::TABLE_PREFIX) {
            Some(id) if !id.is_empty() => Ok(SessionKey::Table(id.to_string())),
            _ => Err(format!("Unknown session key: '{}'", s)),
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
    fn test_rate_from_bps() {
        let rate = Rate::from_bps(825);
        assert_eq!(rate.bps(), 825);
        assert!((rate.percentage() - 8.25).abs() < 0.001);
    }

    #[test]
    fn test_rate_from_percentage() {
        assert_eq!(Rate::from_percentage(8.25).bps(), 825);
        assert_eq!(Rate::from_percentage(f64::NAN), Rate::zero());
        assert_eq!(Rate::from_percentage(-3.0), Rate::zero());
        assert_eq!(Rate::from_percent(15).bps(), 1500);
    }

    #[test]
    fn test_rate_display() {
        assert_eq!(Rate::from_bps(1500).to_string(), "15.00%");
        assert_eq!(Rate::from_bps(825).to_string(), "8.25%");
    }

    #[test]
    fn test_vat_mode_default_and_parse() {
        assert_eq!(VatMode::default(), VatMode::Exclusive);
        assert_eq!("Inclusive".parse::<VatMode>().unwrap(), VatMode::Inclusive);
        assert!("gross".parse::<VatMode>().is_err());
    }

    #[test]
    fn test_only_cash_gives_change() {
        assert!(TenderMethod::Cash.gives_change());
        assert!(!TenderMethod::Card.gives_change());
        assert!(!TenderMethod::Other("voucher".into()).gives_change());
    }

    #[test]
    fn test_session_key_round_trip() {
        assert_eq!(SessionKey::WalkIn.to_string(), "walk-in");
        assert_eq!(SessionKey::table("T12").to_string(), "table:T12");
        assert_eq!("table:T12".parse::<SessionKey>().unwrap(), SessionKey::table("T12"));
        assert_eq!("walk-in".parse::<SessionKey>().unwrap(), SessionKey::WalkIn);
        assert!("table:".parse::<SessionKey>().is_err());
        assert_eq!(SessionKey::table("T1").table_id(), Some("T1"));
    }
}
