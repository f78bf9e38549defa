//! # Session Errors and Notices
//!
//! `SessionError` is what session calls return. `Notice` is what the user
//! sees: a short toast with a machine-readable code.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Tally POS                              │
//! │                                                                         │
//! │  Mobile UI                   Rust                                       │
//! │  ─────────                   ────                                       │
//! │                                                                         │
//! │  tap "Apply HAPPY10"                                                    │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  CartHandle::apply(..) ── CartError::DuplicateApplication ──┐          │
//! │                                                              ▼          │
//! │                          SessionError::Cart ──► Notice ───────────────► │
//! │                                                                         │
//! │  { "code": "DUPLICATE", "message": "Discount 'HAPPY10' is already..." } │
//! │                                                                         │
//! │  The cart is unchanged; the toast is the only consequence.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;

use tally_core::CartError;
use tally_db::DbError;

/// Result type alias for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Debug, Error)]
pub enum SessionError {
    // =========================================================================
    // Cart Errors
    // =========================================================================
    /// A cart mutation was rejected. The cart is unchanged.
    #[error(transparent)]
    Cart(#[from] CartError),

    // =========================================================================
    // Storage Errors
    // =========================================================================
    #[error("Storage error: {0}")]
    Storage(#[from] DbError),

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    /// No platform data directory and no explicit database path.
    #[error("Could not determine a data directory for the cart database")]
    NoDataDirectory,
}

impl From<std::io::Error> for SessionError {
    fn from(err: std::io::Error) -> Self {
        SessionError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SessionError {
    fn from(err: toml::de::Error) -> Self {
        SessionError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for SessionError {
    fn from(err: toml::ser::Error) -> Self {
        SessionError::ConfigSaveFailed(err.to_string())
    }
}

impl SessionError {
    /// True for rejections caused by what the user asked for, as opposed to
    /// storage or setup problems.
    pub fn is_user_error(&self) -> bool {
        matches!(self, SessionError::Cart(_))
    }

    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SessionError::InvalidConfig(_)
                | SessionError::ConfigLoadFailed(_)
                | SessionError::ConfigSaveFailed(_)
                | SessionError::NoDataDirectory
        )
    }

    /// The toast for this error.
    pub fn notice(&self) -> Notice {
        Notice::from(self)
    }
}

// =============================================================================
// Notice
// =============================================================================

/// A user-facing message derived from an error.
///
/// ## Serialization
/// ```json
/// {
///   "code": "LINE_LOCKED",
///   "message": "Line 2 is voided; restore it before editing"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub code: NoticeCode,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NoticeCode {
    /// Bad input (quantity, price, id, percentage).
    ValidationError,

    /// Amount text could not be used.
    InvalidAmount,

    /// Discount or charge already applied.
    Duplicate,

    /// Discount would take the bill to zero or below.
    NegativeTotal,

    /// Line or adjustment does not exist.
    NotFound,

    /// Void/comp/restore not allowed from the current state.
    InvalidTransition,

    /// Edit attempted on a voided or comped line.
    LineLocked,

    /// Line already on a kitchen ticket.
    SentToKitchen,

    /// Cart or quantity cap reached.
    LimitReached,

    /// Snapshot could not be read or written.
    StorageError,

    ConfigError,
}

impl Notice {
    pub fn new(code: NoticeCode, message: impl Into<String>) -> Self {
        Notice {
            code,
            message: message.into(),
        }
    }
}

impl From<&CartError> for Notice {
    fn from(err: &CartError) -> Self {
        let code = match err {
            CartError::InvalidAmount { .. } => NoticeCode::InvalidAmount,
            CartError::DuplicateApplication { .. } => NoticeCode::Duplicate,
            CartError::NegativeResultingTotal { .. } => NoticeCode::NegativeTotal,
            CartError::LineNotFound { .. } | CartError::AdjustmentNotFound { .. } => {
                NoticeCode::NotFound
            }
            CartError::InvalidTransition { .. } => NoticeCode::InvalidTransition,
            CartError::LineLocked { .. } => NoticeCode::LineLocked,
            CartError::SentToKitchen { .. } => NoticeCode::SentToKitchen,
            CartError::CartTooLarge { .. } | CartError::QuantityTooLarge { .. } => {
                NoticeCode::LimitReached
            }
            CartError::Validation(_) => NoticeCode::ValidationError,
        };
        Notice::new(code, err.to_string())
    }
}

impl From<CartError> for Notice {
    fn from(err: CartError) -> Self {
        Notice::from(&err)
    }
}

impl From<&SessionError> for Notice {
    fn from(err: &SessionError) -> Self {
        match err {
            SessionError::Cart(e) => Notice::from(e),
            SessionError::Storage(DbError::NotFound { entity, id }) => {
                Notice::new(NoticeCode::NotFound, format!("{} not found: {}", entity, id))
            }
            SessionError::Storage(e) => {
                // Details stay in the log
                tracing::error!(error = %e, "Cart storage failed");
                Notice::new(NoticeCode::StorageError, "Could not save or load the cart")
            }
            other => Notice::new(NoticeCode::ConfigError, other.to_string()),
        }
    }
}

impl From<SessionError> for Notice {
    fn from(err: SessionError) -> Self {
        Notice::from(&err)
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
