//! Run configuration.
//!
//! Loadable from TOML; every field has a default, so an empty document is a
//! valid config. `cutoff` is written as an RFC 3339 string.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Configuration for one integration run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct IntegrateConfig {
    /// Primary quote extract (mandatory source).
    pub stock_path: String,
    /// Secondary price extract (optional source).
    pub yahoo_path: String,
    /// Search-interest extract (optional source).
    pub trends_path: String,
    /// Macro-economic extract (optional source).
    pub fred_path: String,
    /// Output blob prefix; per-symbol tables land at `{prefix}/{SYMBOL}.csv`.
    pub output_prefix: String,
    /// Inclusive lower bound on normalized timestamps; earlier rows are
    /// discarded from every extract.
    pub cutoff: DateTime<Utc>,
}

impl Default for IntegrateConfig {
    fn default() -> Self {
        Self {
            stock_path: "cleaned_data/cleaned_stock.csv".into(),
            yahoo_path: "cleaned_data/cleaned_yahoo.csv".into(),
            trends_path: "cleaned_data/cleaned_trends.csv".into(),
            fred_path: "cleaned_data/cleaned_fred.csv".into(),
            output_prefix: "integrated_data".into(),
            cutoff: default_cutoff(),
        }
    }
}

impl IntegrateConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn symbol_output_path(&self, symbol: &str) -> String {
        format!("{}/{symbol}.csv", self.output_prefix)
    }

    pub fn combined_output_path(&self) -> String {
        format!("{}/integrated_all.csv", self.output_prefix)
    }

    pub fn manifest_path(&self) -> String {
        format!("{}/manifest.json", self.output_prefix)
    }
}

/// Default cutoff instant.
pub fn default_cutoff() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 8, 3, 5, 0, 0).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_is_all_defaults() {
        let config = IntegrateConfig::from_toml("").unwrap();
        assert_eq!(config, IntegrateConfig::default());
        assert_eq!(config.stock_path, "cleaned_data/cleaned_stock.csv");
        assert_eq!(config.cutoff, default_cutoff());
    }

    #[test]
    fn cutoff_parses_from_rfc3339_string() {
        let config =
            IntegrateConfig::from_toml(r#"cutoff = "2025-09-01T00:00:00Z""#).unwrap();
        assert_eq!(
            config.cutoff,
            Utc.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).unwrap()
        );
        // Untouched fields keep their defaults.
        assert_eq!(config.output_prefix, "integrated_data");
    }

    #[test]
    fn unknown_keys_are_rejected_clearly() {
        // toml reports the unknown key; the message goes to the operator.
        let err = IntegrateConfig::from_toml("no_such_key = 1").unwrap_err();
        assert!(err.to_string().contains("no_such_key"));
    }

    #[test]
    fn output_paths_are_keyed_by_symbol() {
        let config = IntegrateConfig::default();
        assert_eq!(config.symbol_output_path("AAPL"), "integrated_data/AAPL.csv");
        assert_eq!(
            config.combined_output_path(),
            "integrated_data/integrated_all.csv"
        );
    }
}
