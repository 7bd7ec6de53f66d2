use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::BillingError;
use crate::tariff::tiers::{PriceTier, TierSchedule};
use crate::types::*;
use crate::BillingResult;

/// Fixed two-step water schedule: the first `included_units` at `base_price`,
/// everything above at `excess_price`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterTariffConfig {
    #[serde(default = "default_included_units")]
    pub included_units: Units,
    #[serde(default = "default_base_price")]
    pub base_price: Money,
    #[serde(default = "default_excess_price")]
    pub excess_price: Money,
}

fn default_included_units() -> Units {
    dec!(5)
}

fn default_base_price() -> Money {
    dec!(16000)
}

fn default_excess_price() -> Money {
    dec!(27000)
}

impl Default for WaterTariffConfig {
    fn default() -> Self {
        Self {
            included_units: default_included_units(),
            base_price: default_base_price(),
            excess_price: default_excess_price(),
        }
    }
}

impl WaterTariffConfig {
    pub fn validate(&self) -> BillingResult<()> {
        if self.included_units < Decimal::ZERO {
            return Err(BillingError::InvalidInput {
                field: "water.included_units".into(),
                reason: "Included units cannot be negative".into(),
            });
        }
        self.schedule().map(|_| ())
    }

    /// The literal two-tier table. With zero included units the whole usage
    /// falls into the excess tier.
    pub fn schedule(&self) -> BillingResult<TierSchedule> {
        if self.included_units.is_zero() {
            return TierSchedule::new(vec![PriceTier::new(
                1,
                Decimal::ZERO,
                None,
                self.excess_price,
            )]);
        }
        TierSchedule::new(vec![
            PriceTier::new(1, Decimal::ZERO, Some(self.included_units), self.base_price),
            PriceTier::new(2, self.included_units, None, self.excess_price),
        ])
    }
}

/// Water charge split into its two steps, with receipt lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterCharge {
    pub usage: Units,
    pub base_units: Units,
    pub base_amount: Money,
    pub excess_units: Units,
    pub excess_amount: Money,
    pub total: Money,
    pub lines: Vec<String>,
}

/// Cost of `usage` units of water under `tariff`.
pub fn water_cost(usage: Units, tariff: &WaterTariffConfig) -> BillingResult<Money> {
    tariff.schedule()?.evaluate(usage)
}

/// Water cost with the per-step breakdown printed on receipts. Both steps are
/// always listed, the excess step with zero units when unused.
pub fn water_charge(usage: Units, tariff: &WaterTariffConfig) -> BillingResult<WaterCharge> {
    let evaluation = tariff.schedule()?.evaluate_detailed(usage)?;

    let mut base_units = Decimal::ZERO;
    let mut base_amount = Decimal::ZERO;
    let mut excess_units = Decimal::ZERO;
    let mut excess_amount = Decimal::ZERO;
    for charge in &evaluation.charges {
        if charge.upper_bound.is_some() {
            base_units += charge.units;
            base_amount += charge.amount;
        } else {
            excess_units += charge.units;
            excess_amount += charge.amount;
        }
    }

    let lines = vec![
        format!(
            "First {} units: {} x {} = {}",
            tariff.included_units.normalize(),
            base_units.normalize(),
            tariff.base_price.normalize(),
            base_amount.normalize()
        ),
        format!(
            "Additional units: {} x {} = {}",
            excess_units.normalize(),
            tariff.excess_price.normalize(),
            excess_amount.normalize()
        ),
    ];

    Ok(WaterCharge {
        usage: evaluation.total_usage.max(Decimal::ZERO),
        base_units,
        base_amount,
        excess_units,
        excess_amount,
        total: evaluation.total_cost,
        lines,
    })
}
