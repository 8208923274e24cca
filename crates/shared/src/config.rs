//! Application configuration management.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Banking rules configuration.
    #[serde(default)]
    pub bank: BankConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Banking rules configuration: fees, delays, limits and the holiday
/// calendar used for settlement-date calculations.
#[derive(Debug, Clone, Deserialize)]
pub struct BankConfig {
    /// Flat fee for domestic external (ACH) transfers.
    #[serde(default = "default_ach_fee")]
    pub ach_fee: Decimal,
    /// Flat fee for international (SWIFT) transfers.
    #[serde(default = "default_swift_fee")]
    pub swift_fee: Decimal,
    /// Hours to wait before an auto-confirm transaction becomes eligible.
    #[serde(default = "default_confirmation_delay_hours")]
    pub confirmation_delay_hours: i64,
    /// Business days to completion for auto-confirm transactions.
    #[serde(default = "default_auto_confirm_completion_days")]
    pub auto_confirm_completion_days: u32,
    /// Business days to completion for manually confirmed transactions.
    #[serde(default = "default_manual_completion_days")]
    pub manual_completion_days: u32,
    /// Length of the random suffix in transaction references.
    #[serde(default = "default_reference_length")]
    pub reference_length: usize,
    /// Length of generated account numbers.
    #[serde(default = "default_account_number_length")]
    pub account_number_length: usize,
    /// Maximum single-transfer amount.
    #[serde(default = "default_daily_transfer_limit")]
    pub daily_transfer_limit: Decimal,
    /// Per-transaction cap for international transfers.
    #[serde(default = "default_international_transfer_limit")]
    pub international_transfer_limit: Decimal,
    /// Bank holidays excluded from settlement-date calculations.
    #[serde(default)]
    pub holidays: Vec<NaiveDate>,
    /// Interval between background sweep iterations, in seconds.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    /// Maximum transactions advanced per sweep iteration.
    #[serde(default = "default_sweep_batch_limit")]
    pub sweep_batch_limit: usize,
}

fn default_ach_fee() -> Decimal {
    Decimal::new(1500, 2) // 15.00
}

fn default_swift_fee() -> Decimal {
    Decimal::new(4500, 2) // 45.00
}

fn default_confirmation_delay_hours() -> i64 {
    1
}

fn default_auto_confirm_completion_days() -> u32 {
    1
}

fn default_manual_completion_days() -> u32 {
    3
}

fn default_reference_length() -> usize {
    12
}

fn default_account_number_length() -> usize {
    10
}

fn default_daily_transfer_limit() -> Decimal {
    Decimal::new(50_000, 0)
}

fn default_international_transfer_limit() -> Decimal {
    Decimal::new(10_000, 0)
}

fn default_sweep_interval_secs() -> u64 {
    60
}

fn default_sweep_batch_limit() -> usize {
    100
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            ach_fee: default_ach_fee(),
            swift_fee: default_swift_fee(),
            confirmation_delay_hours: default_confirmation_delay_hours(),
            auto_confirm_completion_days: default_auto_confirm_completion_days(),
            manual_completion_days: default_manual_completion_days(),
            reference_length: default_reference_length(),
            account_number_length: default_account_number_length(),
            daily_transfer_limit: default_daily_transfer_limit(),
            international_transfer_limit: default_international_transfer_limit(),
            holidays: Vec::new(),
            sweep_interval_secs: default_sweep_interval_secs(),
            sweep_batch_limit: default_sweep_batch_limit(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("MERIDIAN").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_bank_config_defaults() {
        let config = BankConfig::default();
        assert_eq!(config.ach_fee, dec!(15.00));
        assert_eq!(config.swift_fee, dec!(45.00));
        assert_eq!(config.confirmation_delay_hours, 1);
        assert_eq!(config.auto_confirm_completion_days, 1);
        assert_eq!(config.manual_completion_days, 3);
        assert_eq!(config.reference_length, 12);
        assert_eq!(config.account_number_length, 10);
        assert!(config.holidays.is_empty());
    }

    #[test]
    fn test_bank_config_deserializes_with_defaults() {
        let config: BankConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.ach_fee, dec!(15.00));
        assert_eq!(config.sweep_batch_limit, 100);
    }
}
