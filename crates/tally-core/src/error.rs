//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── CartError        - Rejected cart mutations                        │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  tally-db errors (separate crate)                                      │
//! │  └── DbError          - Snapshot persistence failures                  │
//! │                                                                         │
//! │  tally-session (orchestration)                                         │
//! │  ├── SessionError     - Everything above + config                      │
//! │  └── Notice           - What the toast shows (serialized)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every `CartError` rejects exactly one mutation and leaves the cart as it
//! was. None of them end the cart session.

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Cart Error
// =============================================================================

/// A cart mutation was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// Raw amount could not be used.
    ///
    /// The price helpers coerce bad input to zero instead of returning this;
    /// it is only produced where a zero would silently corrupt a record
    /// (e.g. a percentage discount of 0%).
    #[error("Invalid amount for {field}: '{raw}'")]
    InvalidAmount { field: String, raw: String },

    /// Discount or charge id is already applied.
    ///
    /// ## User Workflow
    /// ```text
    /// Tap "HAPPY10" ──► applied
    /// Tap "HAPPY10" ──► DuplicateApplication ──► toast, cart unchanged
    /// ```
    #[error("{kind} '{id}' is already applied")]
    DuplicateApplication { kind: String, id: String },

    /// Applying the discount would take the bill to zero or below.
    #[error("Discount '{id}' would bring the total to {resulting_total}")]
    NegativeResultingTotal { id: String, resulting_total: Money },

    /// No line at the given index.
    #[error("No cart line at position {index}")]
    LineNotFound { index: usize },

    /// No applied discount/charge/tender with the given id.
    #[error("{kind} '{id}' is not applied")]
    AdjustmentNotFound { kind: String, id: String },

    /// Void/comp transition not allowed from the line's current state.
    #[error("Cannot change line {index} from {from} to {to}")]
    InvalidTransition {
        index: usize,
        from: String,
        to: String,
    },

    /// Price, quantity or modifiers edited on a voided/comped line.
    #[error("Line {index} is {state}; restore it before editing")]
    LineLocked { index: usize, state: String },

    /// Line already went to the kitchen and can only be voided.
    #[error("Line {index} was already sent to the kitchen; void it instead")]
    SentToKitchen { index: usize },

    #[error("Cart cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CartError {
    pub fn duplicate(kind: impl Into<String>, id: impl Into<String>) -> Self {
        CartError::DuplicateApplication {
            kind: kind.into(),
            id: id.into(),
        }
    }

    pub fn not_applied(kind: impl Into<String>, id: impl Into<String>) -> Self {
        CartError::AdjustmentNotFound {
            kind: kind.into(),
            id: id.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

pub type CartResult<T> = Result<T, CartError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CartError::duplicate("Discount", "HAPPY10");
        assert_eq!(err.to_string(), "Discount 'HAPPY10' is already applied");

        let err = CartError::NegativeResultingTotal {
            id: "BIG".to_string(),
            resulting_total: Money::from_cents(-500),
        };
        assert_eq!(err.to_string(), "Discount 'BIG' would bring the total to -5.00");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "sku".to_string(),
        };
        assert_eq!(err.to_string(), "sku is required");
    }

    #[test]
    fn test_validation_converts_to_cart_error() {
        let err: CartError = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        }
        .into();
        assert!(matches!(err, CartError::Validation(_)));
    }
}
