//! # Validation Module
//!
//! Input checks run by [`CartService`](crate::service::CartService) before a
//! mutation touches the cart.
//!
//! ## Where Validation Happens
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Front end                                                    │
//! │  └── Keypad caps, disabled buttons                                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Deserialization (lenient)                                    │
//! │  └── Garbage prices become 0 instead of failing the payload            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: THIS MODULE                                                  │
//! │  ├── Quantity > 0, rate ≤ 100%, adjustment value > 0                   │
//! │  └── Non-empty ids, names, bounded notes                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Limits that come from configuration (line cap, quantity cap) are checked
//! by the service against its [`PricingPolicy`](crate::policy::PricingPolicy).

use crate::cart::AdjustmentValue;
use crate::error::ValidationError;
use crate::money::Money;
use crate::types::Rate;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

pub const MAX_SKU_LEN: usize = 64;
pub const MAX_NAME_LEN: usize = 200;
pub const MAX_NOTE_LEN: usize = 500;

/// Ceiling on any single keyed amount: a price, modifier, tender, fixed
/// adjustment or wallet balance (100,000,000.00).
///
/// With the line and quantity caps this keeps every cart total inside i64.
pub const MAX_AMOUNT_CENTS: i64 = 10_000_000_000;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU.
///
/// Open items carry a fixed SKU, so only emptiness and length are checked;
/// catalog SKUs come from the back office as-is.
///
/// ```rust
/// use tally_core::validation::validate_sku;
///
/// assert!(validate_sku("COKE-330").is_ok());
/// assert!(validate_sku("  ").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.len() > MAX_SKU_LEN {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: MAX_SKU_LEN,
        });
    }

    Ok(())
}

/// Validates a line, discount or charge name.
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a free-form kitchen note. Empty notes are fine.
pub fn validate_note(note: Option<&str>) -> ValidationResult<()> {
    match note {
        Some(text) if text.chars().count() > MAX_NOTE_LEN => Err(ValidationError::TooLong {
            field: "note".to_string(),
            max: MAX_NOTE_LEN,
        }),
        _ => Ok(()),
    }
}

/// Validates a discount/charge id.
pub fn validate_adjustment_id(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Cart: Change Quantity                                                  │
/// │                                                                         │
/// │  Waiter taps "−" on a qty 1 line                                       │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(0) ← THIS FUNCTION                                  │
/// │       │                                                                 │
/// │       ├── qty <= 0? → Error (the UI offers "remove" instead)           │
/// │       │                                                                 │
/// │       └── OK → service checks the configured cap, then recomputes      │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

/// Validates a unit price or modifier delta. Zero is allowed (free items).
///
/// ```rust
/// use tally_core::money::Money;
/// use tally_core::validation::{validate_unit_price, MAX_AMOUNT_CENTS};
///
/// assert!(validate_unit_price("price", Money::from_cents(MAX_AMOUNT_CENTS)).is_ok());
/// assert!(validate_unit_price("price", Money::from_cents(MAX_AMOUNT_CENTS + 1)).is_err());
/// ```
pub fn validate_unit_price(field: &str, price: Money) -> ValidationResult<()> {
    validate_bounded_amount(field, price)
}

/// Validates a VAT rate (0% to 100%).
pub fn validate_vat_rate(rate: Rate) -> ValidationResult<()> {
    if rate.bps() > Rate::ONE_HUNDRED_PERCENT_BPS {
        return Err(ValidationError::OutOfRange {
            field: "vat_rate".to_string(),
            min: 0,
            max: Rate::ONE_HUNDRED_PERCENT_BPS as i64,
        });
    }
    Ok(())
}

/// Validates a discount or charge value.
///
/// ## Rules
/// - Amounts must be positive
/// - Percentages must be above 0% and at most 100%
///
/// ```rust
/// use tally_core::cart::AdjustmentValue;
/// use tally_core::money::Money;
/// use tally_core::types::Rate;
/// use tally_core::validation::validate_adjustment_value;
///
/// assert!(validate_adjustment_value(&AdjustmentValue::Percentage(Rate::from_percent(10))).is_ok());
/// assert!(validate_adjustment_value(&AdjustmentValue::Percentage(Rate::from_percent(101))).is_err());
/// assert!(validate_adjustment_value(&AdjustmentValue::Amount(Money::zero())).is_err());
/// ```
pub fn validate_adjustment_value(value: &AdjustmentValue) -> ValidationResult<()> {
    match value {
        AdjustmentValue::Amount(amount) if !amount.is_positive() => {
            Err(ValidationError::MustBePositive {
                field: "amount".to_string(),
            })
        }
        AdjustmentValue::Amount(amount) => validate_bounded_amount("amount", *amount),
        AdjustmentValue::Percentage(rate)
            if rate.is_zero() || rate.bps() > Rate::ONE_HUNDRED_PERCENT_BPS =>
        {
            Err(ValidationError::OutOfRange {
                field: "percentage".to_string(),
                min: 1,
                max: Rate::ONE_HUNDRED_PERCENT_BPS as i64,
            })
        }
        _ => Ok(()),
    }
}

/// Validates a tendered amount.
pub fn validate_tender_amount(amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "tender amount".to_string(),
        });
    }
    validate_bounded_amount("tender amount", amount)
}

/// Validates a wallet balance. Zero clears the wallet.
pub fn validate_wallet_balance(balance: Money) -> ValidationResult<()> {
    validate_bounded_amount("wallet balance", balance)
}

fn validate_bounded_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() || amount.cents() > MAX_AMOUNT_CENTS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_AMOUNT_CENTS,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("COKE-330").is_ok());
        assert!(validate_sku("Chai Karak").is_ok());
        assert!(validate_sku("").is_err());
        assert!(validate_sku(&"A".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("name", "Chicken Karahi").is_ok());
        assert_eq!(
            validate_name("name", " ").unwrap_err(),
            ValidationError::Required {
                field: "name".to_string()
            }
        );
    }

    #[test]
    fn test_validate_note() {
        assert!(validate_note(None).is_ok());
        assert!(validate_note(Some("no onions")).is_ok());
        assert!(validate_note(Some(&"x".repeat(501))).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-2).is_err());
    }

    #[test]
    fn test_validate_vat_rate() {
        assert!(validate_vat_rate(Rate::zero()).is_ok());
        assert!(validate_vat_rate(Rate::from_percent(100)).is_ok());
        assert!(validate_vat_rate(Rate::from_bps(10_001)).is_err());
    }

    #[test]
    fn test_validate_adjustment_value() {
        assert!(validate_adjustment_value(&AdjustmentValue::Amount(Money::from_cents(1))).is_ok());
        assert!(validate_adjustment_value(&AdjustmentValue::Amount(Money::from_cents(-5))).is_err());
        assert!(validate_adjustment_value(&AdjustmentValue::Percentage(Rate::zero())).is_err());
        assert!(
            validate_adjustment_value(&AdjustmentValue::Percentage(Rate::from_percent(100))).is_ok()
        );
    }

    #[test]
    fn test_validate_money_fields() {
        assert!(validate_unit_price("price", Money::zero()).is_ok());
        assert!(validate_unit_price("price", Money::from_cents(-1)).is_err());
        assert!(validate_tender_amount(Money::zero()).is_err());
        assert!(validate_wallet_balance(Money::zero()).is_ok());
        assert!(validate_wallet_balance(Money::from_cents(-1)).is_err());
    }

    #[test]
    fn test_amount_ceiling() {
        let over = Money::from_cents(MAX_AMOUNT_CENTS + 1);
        assert!(validate_unit_price("price", over).is_err());
        assert!(validate_tender_amount(over).is_err());
        assert!(validate_wallet_balance(over).is_err());
        assert!(validate_adjustment_value(&AdjustmentValue::Amount(over)).is_err());
        assert!(validate_adjustment_value(&AdjustmentValue::Amount(Money::from_cents(MAX_AMOUNT_CENTS))).is_ok());
    }
}
