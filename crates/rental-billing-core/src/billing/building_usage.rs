use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::tariff::tiers::{PriceTier, TierCharge, TierSchedule};
use crate::types::*;
use crate::BillingResult;

/// Readings of the shared building meter for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyBuildingUsage {
    /// First day of the month; the record's key
    pub month: NaiveDate,
    pub meter_old: Units,
    pub meter_new: Units,
    /// Cached blended pre-tax price, refreshed when the record is written
    #[serde(default)]
    pub average_unit_price: Money,
}

impl MonthlyBuildingUsage {
    pub fn new(month: NaiveDate, meter_old: Units, meter_new: Units) -> Self {
        Self {
            month: month_start(month),
            meter_old,
            meter_new,
            average_unit_price: Decimal::ZERO,
        }
    }

    /// Building consumption for the month, never negative.
    pub fn total_usage(&self) -> Units {
        meter_delta(self.meter_old, self.meter_new)
    }

    /// Recompute the cached average price against `schedule`.
    pub fn refresh_average_price(&mut self, schedule: &TierSchedule) -> BillingResult<()> {
        let cost = schedule.evaluate(self.total_usage())?;
        self.average_unit_price = average_unit_price(cost, self.total_usage())?;
        Ok(())
    }
}

/// Total tiered cost spread over total usage; zero when nothing was used.
pub fn average_unit_price(pretax_cost: Money, total_usage: Units) -> BillingResult<Money> {
    if total_usage > Decimal::ZERO {
        checked(pretax_cost.checked_div(total_usage), "average unit price")
    } else {
        Ok(Decimal::ZERO)
    }
}

/// Input for a building-month summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingUsageInput {
    pub month: NaiveDate,
    pub meter_old: Units,
    pub meter_new: Units,
    pub tiers: Vec<PriceTier>,
    #[serde(default)]
    pub price_dp: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingUsageSummary {
    pub month: NaiveDate,
    pub total_usage: Units,
    pub pretax_cost: Money,
    pub average_unit_price: Money,
    pub unpriced_usage: Units,
    pub charges: Vec<TierCharge>,
}

/// Price a month of building consumption and derive its blended unit price.
pub fn calculate_building_usage(
    input: &BuildingUsageInput,
) -> BillingResult<ComputationOutput<BuildingUsageSummary>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let schedule = TierSchedule::new(input.tiers.clone())?;
    let record = MonthlyBuildingUsage::new(input.month, input.meter_old, input.meter_new);

    if input.meter_new < input.meter_old {
        warnings.push(format!(
            "Building meter went backwards ({} -> {}); usage treated as zero",
            input.meter_old, input.meter_new
        ));
    }
    if schedule.is_empty() {
        warnings.push("Electricity tier table is empty; cost is zero".into());
    }

    let evaluation = schedule.evaluate_detailed(record.total_usage())?;
    if evaluation.unpriced_usage > Decimal::ZERO {
        warnings.push(format!(
            "{} units exceed the last tier bound and are not priced",
            evaluation.unpriced_usage
        ));
    }

    let output = BuildingUsageSummary {
        month: record.month,
        total_usage: record.total_usage(),
        pretax_cost: evaluation.total_cost,
        average_unit_price: round_to(
            average_unit_price(evaluation.total_cost, record.total_usage())?,
            input.price_dp,
        ),
        unpriced_usage: evaluation.unpriced_usage,
        charges: evaluation.charges,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Building-wide tiered cost and blended unit price",
        &serde_json::json!({
            "month": record.month.to_string(),
            "meter_old": input.meter_old.to_string(),
            "meter_new": input.meter_new.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}
