//! Load [`BillingConfig`] from a TOML file or from `RBILL_`-prefixed
//! environment variables.
//!
//! # File format
//!
//! ```toml
//! [billing]
//! vat_rate = "0.08"
//! money_dp = 2
//!
//! [billing.water]
//! included_units = "5"
//! base_price = "16000"
//! excess_price = "27000"
//!
//! [[electricity_tiers]]
//! order = 1
//! lower_bound = "0"
//! upper_bound = "50"
//! unit_price = "1984"
//!
//! [[electricity_tiers]]
//! order = 2
//! lower_bound = "50"
//! unit_price = "2050"
//! ```
//!
//! # Environment variables
//!
//! | Variable                      | Default |
//! |-------------------------------|---------|
//! | `RBILL_VAT_RATE`              | 0.08    |
//! | `RBILL_WATER_INCLUDED_UNITS`  | 5       |
//! | `RBILL_WATER_BASE_PRICE`      | 16000   |
//! | `RBILL_WATER_EXCESS_PRICE`    | 27000   |
//! | `RBILL_MONEY_DP`              | 2       |
//! | `RBILL_PRICE_DP`              | 6       |

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

use crate::billing::config::BillingConfig;
use crate::error::BillingError;
use crate::tariff::tiers::{PriceTier, TierSchedule};
use crate::BillingResult;

const ENV_PREFIX: &str = "RBILL_";

/// Contents of a billing configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BillingFile {
    #[serde(default)]
    pub billing: BillingConfig,
    #[serde(default)]
    pub electricity_tiers: Vec<PriceTier>,
}

impl BillingFile {
    /// The file's tier rows as a validated schedule.
    pub fn electricity_schedule(&self) -> BillingResult<TierSchedule> {
        TierSchedule::new(self.electricity_tiers.clone())
    }
}

/// Read and validate a TOML billing file.
pub fn load_config(path: impl AsRef<Path>) -> BillingResult<BillingFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .map_err(|e| BillingError::Config(format!("cannot read '{}': {e}", path.display())))?;
    let file = parse_config(&contents)?;
    debug!(path = %path.display(), tiers = file.electricity_tiers.len(), "billing config loaded");
    Ok(file)
}

/// Parse and validate TOML billing configuration text.
pub fn parse_config(contents: &str) -> BillingResult<BillingFile> {
    let file: BillingFile =
        toml::from_str(contents).map_err(|e| BillingError::Config(e.to_string()))?;
    file.billing.validate()?;
    file.electricity_schedule()?;
    Ok(file)
}

/// Defaults overridden by whatever `RBILL_*` variables are set.
pub fn load_config_from_env() -> BillingResult<BillingConfig> {
    apply_overrides(BillingConfig::default(), |key| std::env::var(key).ok())
}

/// Apply `RBILL_*` overrides fetched through `lookup` on top of `config`.
pub fn apply_overrides(
    mut config: BillingConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> BillingResult<BillingConfig> {
    let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

    if let Some(v) = var("VAT_RATE") {
        config.vat_rate = parse_decimal("VAT_RATE", &v)?;
    }
    if let Some(v) = var("WATER_INCLUDED_UNITS") {
        config.water.included_units = parse_decimal("WATER_INCLUDED_UNITS", &v)?;
    }
    if let Some(v) = var("WATER_BASE_PRICE") {
        config.water.base_price = parse_decimal("WATER_BASE_PRICE", &v)?;
    }
    if let Some(v) = var("WATER_EXCESS_PRICE") {
        config.water.excess_price = parse_decimal("WATER_EXCESS_PRICE", &v)?;
    }
    if let Some(v) = var("MONEY_DP") {
        config.money_dp = parse_dp("MONEY_DP", &v)?;
    }
    if let Some(v) = var("PRICE_DP") {
        config.price_dp = parse_dp("PRICE_DP", &v)?;
    }

    config.validate()?;
    Ok(config)
}

fn parse_decimal(name: &str, value: &str) -> BillingResult<Decimal> {
    Decimal::from_str(value.trim()).map_err(|e| {
        BillingError::Config(format!("{ENV_PREFIX}{name}='{value}' is not a decimal: {e}"))
    })
}

/// `none` disables rounding.
fn parse_dp(name: &str, value: &str) -> BillingResult<Option<u32>> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    value.parse::<u32>().map(Some).map_err(|e| {
        BillingError::Config(format!("{ENV_PREFIX}{name}='{value}' is not a digit count: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    #[test]
    fn test_parse_full_file() {
        let file = parse_config(
            r#"
            [billing]
            vat_rate = "0.1"

            [billing.water]
            base_price = "15000"

            [[electricity_tiers]]
            order = 1
            lower_bound = "0"
            upper_bound = "50"
            unit_price = "1984"

            [[electricity_tiers]]
            order = 2
            lower_bound = "50"
            unit_price = "2050"
            "#,
        )
        .unwrap();
        assert_eq!(file.billing.vat_rate, dec!(0.1));
        assert_eq!(file.billing.water.base_price, dec!(15000));
        assert_eq!(file.billing.water.excess_price, dec!(27000));
        assert_eq!(file.electricity_schedule().unwrap().len(), 2);
    }

    #[test]
    fn test_empty_file_is_defaults() {
        let file = parse_config("").unwrap();
        assert_eq!(file.billing, BillingConfig::default());
        assert!(file.electricity_tiers.is_empty());
    }

    #[test]
    fn test_file_with_broken_tiers_is_rejected() {
        let res = parse_config(
            r#"
            [[electricity_tiers]]
            order = 1
            lower_bound = "10"
            unit_price = "1"
            "#,
        );
        assert!(res.is_err());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("RBILL_VAT_RATE", "0.1"),
            ("RBILL_WATER_EXCESS_PRICE", "30000"),
            ("RBILL_MONEY_DP", "none"),
        ]
        .into_iter()
        .collect();
        let cfg = apply_overrides(BillingConfig::default(), |k| {
            vars.get(k).map(|v| v.to_string())
        })
        .unwrap();
        assert_eq!(cfg.vat_rate, dec!(0.1));
        assert_eq!(cfg.water.excess_price, dec!(30000));
        assert_eq!(cfg.money_dp, None);
        assert_eq!(cfg.price_dp, Some(6));
    }

    #[test]
    fn test_env_bad_value() {
        let res = apply_overrides(BillingConfig::default(), |k| {
            (k == "RBILL_VAT_RATE").then(|| "eight percent".to_string())
        });
        assert!(matches!(res, Err(BillingError::Config(_))));
    }

    #[test]
    fn test_env_out_of_range_vat() {
        let res = apply_overrides(BillingConfig::default(), |k| {
            (k == "RBILL_VAT_RATE").then(|| "8".to_string())
        });
        assert!(matches!(res, Err(BillingError::InvalidInput { .. })));
    }
}
