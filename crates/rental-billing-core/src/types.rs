use chrono::{Datelike, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::BillingError;
use crate::BillingResult;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.08 = 8%). Never as percentages.
pub type Rate = Decimal;

/// Metered quantities (kWh for electricity, m³ for water) and meter readings.
pub type Units = Decimal;

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

/// Difference between two cumulative meter readings, clamped at zero.
///
/// A reading that went backwards yields zero usage rather than a negative
/// quantity.
pub fn meter_delta(old: Units, new: Units) -> Units {
    if new > old {
        new.saturating_sub(old)
    } else {
        Decimal::ZERO
    }
}

/// Unwrap a `checked_*` result, naming the computation that overflowed.
pub fn checked(value: Option<Decimal>, context: &str) -> BillingResult<Decimal> {
    value.ok_or_else(|| BillingError::Overflow {
        context: context.to_string(),
    })
}

/// Round to `dp` decimal places (midpoint away from zero), or pass through
/// unchanged when no precision is configured.
pub fn round_to(value: Decimal, dp: Option<u32>) -> Decimal {
    match dp {
        Some(dp) => value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero),
        None => value,
    }
}

/// First day of the month containing `date`. Billing months are keyed this way.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Parse a billing month given either as `YYYY-MM` or `YYYY-MM-DD`.
pub fn parse_month(s: &str) -> BillingResult<NaiveDate> {
    let trimmed = s.trim();
    let full = if trimmed.len() == 7 {
        format!("{trimmed}-01")
    } else {
        trimmed.to_string()
    };
    NaiveDate::parse_from_str(&full, "%Y-%m-%d")
        .map(month_start)
        .map_err(|e| BillingError::DateError(format!("cannot parse month '{s}': {e}")))
}
