use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::BillingError;
use crate::tariff::water::WaterTariffConfig;
use crate::types::Rate;
use crate::BillingResult;

/// Process-wide billing parameters, passed explicitly into every computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingConfig {
    /// VAT applied to the electricity component only
    #[serde(default = "default_vat_rate")]
    pub vat_rate: Rate,
    #[serde(default)]
    pub water: WaterTariffConfig,
    /// Decimal places for money fields; `None` keeps full precision
    #[serde(default = "default_money_dp")]
    pub money_dp: Option<u32>,
    /// Decimal places for the blended unit price
    #[serde(default = "default_price_dp")]
    pub price_dp: Option<u32>,
}

fn default_vat_rate() -> Rate {
    dec!(0.08)
}

fn default_money_dp() -> Option<u32> {
    Some(2)
}

fn default_price_dp() -> Option<u32> {
    Some(6)
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            vat_rate: default_vat_rate(),
            water: WaterTariffConfig::default(),
            money_dp: default_money_dp(),
            price_dp: default_price_dp(),
        }
    }
}

impl BillingConfig {
    pub fn with_vat_rate(mut self, vat_rate: Rate) -> Self {
        self.vat_rate = vat_rate;
        self
    }

    pub fn validate(&self) -> BillingResult<()> {
        if self.vat_rate < Decimal::ZERO || self.vat_rate > Decimal::ONE {
            return Err(BillingError::InvalidInput {
                field: "vat_rate".into(),
                reason: format!("VAT rate must be between 0 and 1, got {}", self.vat_rate),
            });
        }
        for (field, dp) in [("money_dp", self.money_dp), ("price_dp", self.price_dp)] {
            if matches!(dp, Some(dp) if dp > 28) {
                return Err(BillingError::InvalidInput {
                    field: field.into(),
                    reason: "At most 28 decimal places are supported".into(),
                });
            }
        }
        self.water.validate()
    }
}
