//! # tally-session: Cart Sessions for Tally POS
//!
//! The layer the mobile bridge talks to. It loads the store settings,
//! keeps one cart per session (walk-in counter or dine-in table) and
//! writes a snapshot after every change.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Tally POS Session Layer                           │
//! │                                                                         │
//! │  Mobile bridge (UI handlers)                                           │
//! │       │  registry.table("T4").await?.apply(|cart| ...).await            │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 tally-session (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌───────────────┐   ┌───────────────┐    │   │
//! │  │   │ SessionConfig │   │SessionRegistry│   │  CartHandle   │    │   │
//! │  │   │ toml + env    │──►│ walk-in, T1.. │──►│ Mutex<Cart..> │    │   │
//! │  │   └───────────────┘   └───────────────┘   └───────┬───────┘    │   │
//! │  └───────────────────────────────────────────────────┼─────────────┘   │
//! │                      ┌───────────────────────────────┤                 │
//! │                      ▼                               ▼                 │
//! │              tally-core (math)               tally-db (snapshots)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Startup
//!
//! ```rust,ignore
//! tally_session::init_tracing();
//! let config = SessionConfig::load_or_default(None);
//! let registry = SessionRegistry::from_config(&config).await?;
//!
//! let table = registry.table("T4").await?;
//! table.apply(|cart| cart.add_new_item(input)).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod registry;
pub mod session;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{CurrencySettings, PricingSettings, SessionConfig, StorageSettings};
pub use error::{Notice, NoticeCode, SessionError, SessionResult};
pub use registry::SessionRegistry;
pub use session::CartHandle;

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "info,tally=debug,sqlx=warn";

/// Installs the global tracing subscriber.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=tally_session=trace` - Trace this crate only
/// - Default: [`DEFAULT_LOG_FILTER`]
///
/// Safe to call more than once; later calls leave the first subscriber in
/// place.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_twice() {
        init_tracing();
        init_tracing();
    }
}
