//! # Store Configuration
//!
//! Settings loaded once at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`STOREFRONT_*`)
//! 2. Defaults (this file)
//!
//! ## Thread Safety
//! Read-only after initialization; shared as `Arc<StoreConfig>`.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use storefront_core::validation::validate_tip;
use storefront_core::{DeliveryPolicy, Money, FLAT_DELIVERY_FEE, FREE_DELIVERY_THRESHOLD};

/// Configuration loading errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable was set but could not be parsed.
    #[error("Invalid value for {var}: '{value}'")]
    InvalidValue { var: String, value: String },
}

/// Storefront configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreConfig {
    /// Address the HTTP server binds to.
    pub bind_addr: String,

    /// SQLite database file.
    pub database_path: PathBuf,

    /// Store name (shown in logs and quotes).
    pub store_name: String,

    /// Currency code (ISO 4217), sent to the payment gateway.
    pub currency_code: String,

    /// Currency symbol (for display).
    pub currency_symbol: String,

    /// Decimal places shown when formatting (0 or 2).
    pub currency_decimals: u8,

    /// Subtotal at or above which delivery is free.
    pub free_delivery_threshold: Money,

    /// Delivery fee below the threshold.
    pub delivery_fee: Money,

    /// Tip presets offered at checkout. A preset tip must be one of these.
    pub tip_presets: Vec<Money>,

    /// Surcharge per badge patch; request-supplied badge prices are ignored.
    pub badge_price: Money,

    /// Seconds a cart session may sit unused before it is evicted from memory.
    pub session_idle_secs: u64,

    /// Payment gateway endpoint that accepts charge requests.
    pub payment_url: String,

    /// Payment gateway request timeout, in seconds.
    pub payment_timeout_secs: u64,
}

impl Default for StoreConfig {
    /// Development defaults: BDT, free delivery from ৳2000, ৳100 fee.
    fn default() -> Self {
        StoreConfig {
            bind_addr: "0.0.0.0:8080".to_string(),
            database_path: default_database_path(),
            store_name: "Storefront Dev Store".to_string(),
            currency_code: "BDT".to_string(),
            currency_symbol: "৳".to_string(),
            currency_decimals: 2,
            free_delivery_threshold: Money::from_major(FREE_DELIVERY_THRESHOLD),
            delivery_fee: Money::from_major(FLAT_DELIVERY_FEE),
            tip_presets: vec![Money::from_major(50), Money::from_major(100), Money::from_major(200)],
            badge_price: Money::from_major(150),
            session_idle_secs: 30 * 60,
            payment_url: "http://localhost:9000/api/payments/charge".to_string(),
            payment_timeout_secs: 30,
        }
    }
}

impl StoreConfig {
    /// Loads configuration from the process environment over defaults.
    ///
    /// ## Environment Variables
    /// - `STOREFRONT_BIND_ADDR`, `STOREFRONT_DB_PATH`, `STOREFRONT_STORE_NAME`
    /// - `STOREFRONT_CURRENCY`, `STOREFRONT_CURRENCY_SYMBOL`
    /// - `STOREFRONT_FREE_DELIVERY_THRESHOLD`, `STOREFRONT_DELIVERY_FEE` (major units)
    /// - `STOREFRONT_TIP_PRESETS` (comma list, major units, each at most `MAX_TIP`)
    /// - `STOREFRONT_BADGE_PRICE` (major units)
    /// - `STOREFRONT_SESSION_IDLE_SECS`
    /// - `STOREFRONT_PAYMENT_URL`, `STOREFRONT_PAYMENT_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = StoreConfig::default();

        if let Some(addr) = lookup("STOREFRONT_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Some(path) = lookup("STOREFRONT_DB_PATH") {
            config.database_path = PathBuf::from(path);
        }
        if let Some(name) = lookup("STOREFRONT_STORE_NAME") {
            config.store_name = name;
        }
        if let Some(code) = lookup("STOREFRONT_CURRENCY") {
            config.currency_code = code.trim().to_uppercase();
        }
        if let Some(symbol) = lookup("STOREFRONT_CURRENCY_SYMBOL") {
            config.currency_symbol = symbol;
        }

        if let Some(value) = lookup("STOREFRONT_FREE_DELIVERY_THRESHOLD") {
            config.free_delivery_threshold = parse_amount("STOREFRONT_FREE_DELIVERY_THRESHOLD", &value)?;
        }
        if let Some(value) = lookup("STOREFRONT_DELIVERY_FEE") {
            config.delivery_fee = parse_amount("STOREFRONT_DELIVERY_FEE", &value)?;
        }
        if let Some(value) = lookup("STOREFRONT_TIP_PRESETS") {
            config.tip_presets = value
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(|part| {
                    parse_amount("STOREFRONT_TIP_PRESETS", part)
                        .and_then(|amount| match validate_tip(amount) {
                            Ok(()) => Ok(amount),
                            Err(_) => Err(invalid("STOREFRONT_TIP_PRESETS", part)),
                        })
                })
                .collect::<Result<_, _>>()?;
        }
        if let Some(value) = lookup("STOREFRONT_BADGE_PRICE") {
            config.badge_price = parse_amount("STOREFRONT_BADGE_PRICE", &value)?;
        }
        if let Some(value) = lookup("STOREFRONT_SESSION_IDLE_SECS") {
            config.session_idle_secs = parse_secs("STOREFRONT_SESSION_IDLE_SECS", &value)?;
        }

        if let Some(url) = lookup("STOREFRONT_PAYMENT_URL") {
            config.payment_url = url;
        }
        if let Some(value) = lookup("STOREFRONT_PAYMENT_TIMEOUT_SECS") {
            config.payment_timeout_secs = parse_secs("STOREFRONT_PAYMENT_TIMEOUT_SECS", &value)?;
        }

        Ok(config)
    }

    /// Delivery policy built from the configured threshold and fee.
    pub fn delivery_policy(&self) -> DeliveryPolicy {
        DeliveryPolicy {
            free_threshold: self.free_delivery_threshold,
            flat_fee: self.delivery_fee,
        }
    }

    /// Payment gateway timeout.
    pub fn payment_timeout(&self) -> Duration {
        Duration::from_secs(self.payment_timeout_secs)
    }

    /// How long an unused cart session stays in memory.
    pub fn session_idle(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }

    /// Whether `amount` is one of the offered tip presets.
    pub fn offers_tip(&self, amount: Money) -> bool {
        self.tip_presets.contains(&amount)
    }

    /// Formats an amount as a currency string.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let config = StoreConfig::default();
    /// assert_eq!(config.format_currency(Money::from_minor(123_450)), "৳1234.50");
    /// ```
    pub fn format_currency(&self, amount: Money) -> String {
        let sign = if amount.is_negative() { "-" } else { "" };
        let major = amount.major().abs();

        if self.currency_decimals == 0 {
            return format!("{}{}{}", sign, self.currency_symbol, major);
        }

        format!(
            "{}{}{}.{:02}",
            sign,
            self.currency_symbol,
            major,
            amount.minor_part().abs()
        )
    }
}

fn invalid(var: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        var: var.to_string(),
        value: value.to_string(),
    }
}

fn parse_secs(var: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|secs| *secs > 0)
        .ok_or_else(|| invalid(var, value))
}

fn parse_amount(var: &str, value: &str) -> Result<Money, ConfigError> {
    Money::parse_major(value)
        .filter(|amount| !amount.is_negative())
        .ok_or_else(|| invalid(var, value))
}

/// Platform data directory, falling back to the working directory.
///
/// - **Linux**: `~/.local/share/storefront/storefront.db`
/// - **macOS**: `~/Library/Application Support/com.storefront.storefront/storefront.db`
fn default_database_path() -> PathBuf {
    ProjectDirs::from("com", "storefront", "storefront")
        .map(|dirs| dirs.data_dir().join("storefront.db"))
        .unwrap_or_else(|| PathBuf::from("storefront.db"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = StoreConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.currency_code, "BDT");
        assert_eq!(config.delivery_policy(), DeliveryPolicy::default());
        assert_eq!(config.tip_presets.len(), 3);
        assert_eq!(config.payment_timeout(), Duration::from_secs(30));
        assert_eq!(config.badge_price, Money::from_major(150));
        assert_eq!(config.session_idle(), Duration::from_secs(1800));
        assert!(config.offers_tip(Money::from_major(100)));
        assert!(!config.offers_tip(Money::from_major(99)));
    }

    #[test]
    fn test_overrides() {
        let config = StoreConfig::from_lookup(lookup(&[
            ("STOREFRONT_CURRENCY", "usd"),
            ("STOREFRONT_CURRENCY_SYMBOL", "$"),
            ("STOREFRONT_FREE_DELIVERY_THRESHOLD", "75"),
            ("STOREFRONT_DELIVERY_FEE", "4.99"),
            ("STOREFRONT_TIP_PRESETS", "1, 2.5 ,5"),
            ("STOREFRONT_PAYMENT_TIMEOUT_SECS", "10"),
            ("STOREFRONT_BADGE_PRICE", "200"),
            ("STOREFRONT_SESSION_IDLE_SECS", "60"),
        ]))
        .unwrap();

        assert_eq!(config.currency_code, "USD");
        assert_eq!(config.free_delivery_threshold, Money::from_major(75));
        assert_eq!(config.delivery_fee, Money::from_minor(499));
        assert_eq!(
            config.tip_presets,
            vec![Money::from_major(1), Money::from_minor(250), Money::from_major(5)]
        );
        assert_eq!(config.payment_timeout_secs, 10);
        assert_eq!(config.badge_price, Money::from_major(200));
        assert_eq!(config.session_idle_secs, 60);
    }

    #[test]
    fn test_invalid_numbers_are_rejected() {
        let err = StoreConfig::from_lookup(lookup(&[("STOREFRONT_DELIVERY_FEE", "cheap")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                var: "STOREFRONT_DELIVERY_FEE".to_string(),
                value: "cheap".to_string(),
            }
        );

        assert!(StoreConfig::from_lookup(lookup(&[("STOREFRONT_TIP_PRESETS", "50,abc")])).is_err());
        assert!(StoreConfig::from_lookup(lookup(&[("STOREFRONT_PAYMENT_TIMEOUT_SECS", "0")])).is_err());
        assert!(StoreConfig::from_lookup(lookup(&[("STOREFRONT_TIP_PRESETS", "50,9999999")])).is_err());
        assert!(StoreConfig::from_lookup(lookup(&[("STOREFRONT_SESSION_IDLE_SECS", "soon")])).is_err());
    }

    #[test]
    fn test_format_currency() {
        let config = StoreConfig::default();
        assert_eq!(config.format_currency(Money::from_minor(123_450)), "৳1234.50");
        assert_eq!(config.format_currency(Money::from_minor(1)), "৳0.01");
        assert_eq!(config.format_currency(Money::zero()), "৳0.00");
        assert_eq!(config.format_currency(Money::from_minor(-1234)), "-৳12.34");
    }

    #[test]
    fn test_format_currency_without_decimals() {
        let config = StoreConfig {
            currency_decimals: 0,
            ..StoreConfig::default()
        };
        assert_eq!(config.format_currency(Money::from_major(960)), "৳960");
    }
}
