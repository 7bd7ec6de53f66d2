use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use rental_billing_core::tariff::tiers::{self, TierCostInput};
use rental_billing_core::tariff::water;
use rental_billing_core::types::meter_delta;

use crate::commands::Settings;
use crate::input;

/// Arguments for tier-table pricing
#[derive(Args)]
pub struct TierCostArgs {
    /// Path to JSON input file with `usage` and `tiers`
    #[arg(long)]
    pub input: Option<String>,

    /// Usage to price against the configured electricity tiers
    #[arg(long)]
    pub usage: Option<Decimal>,
}

/// Arguments for the water tariff
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct WaterCostArgs {
    /// Water consumed in the month (m³)
    #[arg(long, conflicts_with_all = ["water_old", "water_new"])]
    pub usage: Option<Decimal>,

    /// Previous water meter reading
    #[arg(long, requires = "water_new")]
    pub water_old: Option<Decimal>,

    /// Current water meter reading
    #[arg(long, requires = "water_old")]
    pub water_new: Option<Decimal>,
}

pub fn run_tier_cost(
    args: TierCostArgs,
    settings: &Settings,
) -> Result<Value, Box<dyn std::error::Error>> {
    let tier_input: TierCostInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(usage) = args.usage {
        if settings.electricity_tiers.is_empty() {
            return Err("--usage prices against the tiers in --config, which has none".into());
        }
        TierCostInput {
            usage,
            tiers: settings.electricity_tiers.clone(),
        }
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file.json>, --usage or stdin required for tier pricing".into());
    };
    let result = tiers::calculate_tier_cost(&tier_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_water_cost(
    args: WaterCostArgs,
    settings: &Settings,
) -> Result<Value, Box<dyn std::error::Error>> {
    let usage = match (args.usage, args.water_old, args.water_new) {
        (Some(usage), _, _) => usage,
        (None, Some(old), Some(new)) => meter_delta(old, new),
        _ => return Err("--usage or --water-old/--water-new required".into()),
    };
    if usage < Decimal::ZERO {
        return Err("water usage cannot be negative".into());
    }
    let charge = water::water_charge(usage, &settings.billing.water)?;
    Ok(serde_json::to_value(charge)?)
}
