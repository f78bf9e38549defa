//! # Session Configuration
//!
//! Store settings that decide how carts are priced, how money is shown and
//! where open carts are kept.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TALLY_VAT_MODE=inclusive                                           │
//! │     TALLY_COMPANY_VAT=16                                               │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/tally-pos/tally.toml (Linux)                             │
//! │     ~/Library/Application Support/com.tally.pos/tally.toml (macOS)     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     exclusive VAT, 0% company VAT, append lines, persist to data dir   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # tally.toml
//! [pricing]
//! vat_mode = "exclusive"          # exclusive | inclusive
//! company_vat_percent = 16.0
//! charge_vat_fallback = "company_rate"  # company_rate | exempt
//! merge_identical_lines = false
//! max_lines = 200
//! max_quantity = 9999
//!
//! [currency]
//! code = "PKR"
//! symbol = "Rs"
//! symbol_after = false
//! thousands_separator = ","
//!
//! [storage]
//! persist = true
//! database_path = "/var/lib/tally/tally.db"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use tally_core::{ChargeVatFallback, Money, PricingPolicy, Rate, VatMode};
use tally_core::{MAX_CART_LINES, MAX_ITEM_QUANTITY};

use crate::error::{SessionError, SessionResult};

// =============================================================================
// Pricing Settings
// =============================================================================

/// How carts are priced. Becomes a [`PricingPolicy`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingSettings {
    #[serde(default)]
    pub vat_mode: VatMode,

    /// Company VAT as a percentage (16.0 = 16%).
    #[serde(default)]
    pub company_vat_percent: f64,

    #[serde(default)]
    pub charge_vat_fallback: ChargeVatFallback,

    #[serde(default)]
    pub merge_identical_lines: bool,

    #[serde(default = "default_max_lines")]
    pub max_lines: usize,

    #[serde(default = "default_max_quantity")]
    pub max_quantity: i64,
}

fn default_max_lines() -> usize {
    MAX_CART_LINES
}

fn default_max_quantity() -> i64 {
    MAX_ITEM_QUANTITY
}

impl Default for PricingSettings {
    fn default() -> Self {
        PricingSettings {
            vat_mode: VatMode::default(),
            company_vat_percent: 0.0,
            charge_vat_fallback: ChargeVatFallback::default(),
            merge_identical_lines: false,
            max_lines: default_max_lines(),
            max_quantity: default_max_quantity(),
        }
    }
}

impl PricingSettings {
    pub fn company_vat_rate(&self) -> Rate {
        Rate::from_percentage(self.company_vat_percent)
    }

    pub fn to_policy(&self) -> PricingPolicy {
        PricingPolicy {
            vat_mode: self.vat_mode,
            company_vat_rate: self.company_vat_rate(),
            charge_vat_fallback: self.charge_vat_fallback,
            merge_identical_lines: self.merge_identical_lines,
            max_lines: self.max_lines,
            max_quantity: self.max_quantity,
        }
    }
}

// =============================================================================
// Currency Settings
// =============================================================================

/// How amounts are rendered on screen and on the bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencySettings {
    /// ISO 4217 code.
    #[serde(default = "default_currency_code")]
    pub code: String,

    #[serde(default = "default_currency_symbol")]
    pub symbol: String,

    /// Render `1,250.00 Rs` instead of `Rs 1,250.00`.
    #[serde(default)]
    pub symbol_after: bool,

    /// Empty for no grouping.
    #[serde(default = "default_thousands_separator")]
    pub thousands_separator: String,
}

fn default_currency_code() -> String {
    "PKR".to_string()
}

fn default_currency_symbol() -> String {
    "Rs".to_string()
}

fn default_thousands_separator() -> String {
    ",".to_string()
}

impl Default for CurrencySettings {
    fn default() -> Self {
        CurrencySettings {
            code: default_currency_code(),
            symbol: default_currency_symbol(),
            symbol_after: false,
            thousands_separator: default_thousands_separator(),
        }
    }
}

impl CurrencySettings {
    /// Formats an amount for display.
    ///
    /// ```rust
    /// use tally_core::Money;
    /// use tally_session::config::CurrencySettings;
    ///
    /// let currency = CurrencySettings::default();
    /// assert_eq!(currency.format(Money::from_cents(125_050)), "Rs 1,250.50");
    /// assert_eq!(currency.format(Money::from_cents(-99)), "-Rs 0.99");
    /// ```
    pub fn format(&self, amount: Money) -> String {
        let digits = amount.major().abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push_str(&self.thousands_separator);
            }
            grouped.push(ch);
        }
        let number = format!("{}.{:02}", grouped, amount.minor());
        let sign = if amount.is_negative() { "-" } else { "" };

        if self.symbol.is_empty() {
            format!("{}{}", sign, number)
        } else if self.symbol_after {
            format!("{}{} {}", sign, number, self.symbol)
        } else {
            format!("{}{} {}", sign, self.symbol, number)
        }
    }
}

// =============================================================================
// Storage Settings
// =============================================================================

/// Where open carts are kept between restarts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Save a snapshot after every cart change.
    #[serde(default = "default_true")]
    pub persist: bool,

    /// Explicit database file. Defaults to the platform data directory.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

impl Default for StorageSettings {
    fn default() -> Self {
        StorageSettings {
            persist: true,
            database_path: None,
        }
    }
}

impl StorageSettings {
    /// The configured path, else `<data dir>/tally.db`.
    pub fn resolved_database_path(&self) -> SessionResult<PathBuf> {
        if let Some(path) = &self.database_path {
            return Ok(path.clone());
        }
        directories::ProjectDirs::from("com", "tally", "pos")
            .map(|dirs| dirs.data_dir().join("tally.db"))
            .ok_or(SessionError::NoDataDirectory)
    }
}

// =============================================================================
// Main Session Configuration
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub pricing: PricingSettings,

    #[serde(default)]
    pub currency: CurrencySettings,

    #[serde(default)]
    pub storage: StorageSettings,
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (tally.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SessionResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading session config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load session config: {}. Using defaults.", e);
            Self::default()
        })
    }

    pub fn save(&self, config_path: Option<PathBuf>) -> SessionResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| SessionError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Session config saved");
        Ok(())
    }

    pub fn validate(&self) -> SessionResult<()> {
        let vat = self.pricing.company_vat_percent;
        if !vat.is_finite() || !(0.0..=100.0).contains(&vat) {
            return Err(SessionError::InvalidConfig(format!(
                "company_vat_percent must be between 0 and 100, got {}",
                vat
            )));
        }

        if self.pricing.max_lines == 0 {
            return Err(SessionError::InvalidConfig(
                "max_lines must be greater than 0".into(),
            ));
        }

        if self.pricing.max_quantity <= 0 {
            return Err(SessionError::InvalidConfig(
                "max_quantity must be greater than 0".into(),
            ));
        }

        if self.currency.code.len() != 3 {
            return Err(SessionError::InvalidConfig(format!(
                "currency code must be 3 letters, got '{}'",
                self.currency.code
            )));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `TALLY_*` overrides read through `lookup`.
    ///
    /// Unparseable values are logged and ignored.
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(mode) = lookup("TALLY_VAT_MODE") {
            match mode.parse::<VatMode>() {
                Ok(parsed) => {
                    debug!(mode = %parsed, "Overriding VAT mode from environment");
                    self.pricing.vat_mode = parsed;
                }
                Err(e) => warn!(mode = %mode, "{}", e),
            }
        }

        if let Some(vat) = lookup("TALLY_COMPANY_VAT") {
            match vat.trim().trim_end_matches('%').parse::<f64>() {
                Ok(pct) => {
                    debug!(percent = pct, "Overriding company VAT from environment");
                    self.pricing.company_vat_percent = pct;
                }
                Err(_) => warn!(value = %vat, "Ignoring unparseable TALLY_COMPANY_VAT"),
            }
        }

        if let Some(fallback) = lookup("TALLY_CHARGE_VAT_FALLBACK") {
            match fallback.parse::<ChargeVatFallback>() {
                Ok(parsed) => self.pricing.charge_vat_fallback = parsed,
                Err(e) => warn!(value = %fallback, "{}", e),
            }
        }

        if let Some(merge) = lookup("TALLY_MERGE_LINES") {
            match merge.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.pricing.merge_identical_lines = true,
                "0" | "false" | "no" | "off" => self.pricing.merge_identical_lines = false,
                _ => warn!(value = %merge, "Ignoring unparseable TALLY_MERGE_LINES"),
            }
        }

        if let Some(path) = lookup("TALLY_DATABASE_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.storage.database_path = Some(PathBuf::from(path));
        }

        if let Some(symbol) = lookup("TALLY_CURRENCY_SYMBOL") {
            self.currency.symbol = symbol;
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "tally", "pos")
            .map(|dirs| dirs.config_dir().join("tally.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn pricing_policy(&self) -> PricingPolicy {
        self.pricing.to_policy()
    }

    pub fn format_currency(&self, amount: Money) -> String {
        self.currency.format(amount)
    }
}
