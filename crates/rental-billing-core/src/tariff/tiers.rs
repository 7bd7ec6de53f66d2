use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Instant;

use crate::error::BillingError;
use crate::types::*;
use crate::BillingResult;

/// One rung of a stepped tariff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTier {
    /// Evaluation sequence; tiers are priced in ascending order
    pub order: u32,
    /// Inclusive lower bound in units
    pub lower_bound: Units,
    /// Exclusive upper bound in units, `None` for an open-ended top tier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper_bound: Option<Units>,
    /// Pre-tax price per unit
    pub unit_price: Money,
}

impl PriceTier {
    pub fn new(order: u32, lower_bound: Units, upper_bound: Option<Units>, unit_price: Money) -> Self {
        Self {
            order,
            lower_bound,
            upper_bound,
            unit_price,
        }
    }

    /// Units this tier can absorb, `None` when unbounded.
    pub fn capacity(&self) -> Option<Units> {
        self.upper_bound.map(|upper| upper - self.lower_bound)
    }
}

/// A validated tariff: tiers sorted by `order` that partition `[0, top)`
/// contiguously, where `top` is either infinity or the last finite bound.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<PriceTier>", into = "Vec<PriceTier>")]
pub struct TierSchedule {
    tiers: Vec<PriceTier>,
}

impl TierSchedule {
    /// Sort `tiers` by `order` and check that they form a contiguous partition
    /// starting at zero. Only the last tier may be open-ended.
    pub fn new(mut tiers: Vec<PriceTier>) -> BillingResult<Self> {
        tiers.sort_by_key(|t| t.order);

        let mut seen = HashSet::with_capacity(tiers.len());
        for tier in &tiers {
            if !seen.insert(tier.order) {
                return Err(invalid(format!("duplicate tier order {}", tier.order)));
            }
        }

        let last = tiers.len().saturating_sub(1);
        for (i, tier) in tiers.iter().enumerate() {
            if tier.unit_price < Decimal::ZERO {
                return Err(invalid(format!(
                    "tier {} has negative unit price {}",
                    tier.order, tier.unit_price
                )));
            }
            if i == 0 && !tier.lower_bound.is_zero() {
                return Err(invalid(format!(
                    "first tier must start at 0, got {}",
                    tier.lower_bound
                )));
            }
            match tier.upper_bound {
                Some(upper) if upper <= tier.lower_bound => {
                    return Err(invalid(format!(
                        "tier {} upper bound {} must exceed lower bound {}",
                        tier.order, upper, tier.lower_bound
                    )));
                }
                None if i != last => {
                    return Err(invalid(format!(
                        "tier {} is unbounded but is not the last tier",
                        tier.order
                    )));
                }
                _ => {}
            }
            if i > 0 {
                let prev = &tiers[i - 1];
                if prev.upper_bound != Some(tier.lower_bound) {
                    return Err(invalid(format!(
                        "tier {} starts at {} but tier {} ends at {}",
                        tier.order,
                        tier.lower_bound,
                        prev.order,
                        prev.upper_bound.map(|u| u.to_string()).unwrap_or_default()
                    )));
                }
            }
        }

        Ok(Self { tiers })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn tiers(&self) -> &[PriceTier] {
        &self.tiers
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// Highest usage the schedule prices, `None` when the top tier is open-ended.
    pub fn coverage_limit(&self) -> Option<Units> {
        match self.tiers.last() {
            Some(tier) => tier.upper_bound,
            None => Some(Decimal::ZERO),
        }
    }

    /// Total pre-tax cost of `total_usage` units.
    pub fn evaluate(&self, total_usage: Units) -> BillingResult<Money> {
        Ok(self.evaluate_detailed(total_usage)?.total_cost)
    }

    /// Fill each tier in order, spilling the remainder into the next one.
    ///
    /// Usage above the last finite bound of a schedule without an open-ended
    /// tier is not priced; it is reported in `unpriced_usage`. Fails with
    /// `Overflow` when a charge exceeds the decimal range.
    pub fn evaluate_detailed(&self, total_usage: Units) -> BillingResult<TierEvaluation> {
        let mut evaluation = TierEvaluation {
            total_usage,
            charges: Vec::new(),
            priced_usage: Decimal::ZERO,
            unpriced_usage: Decimal::ZERO,
            total_cost: Decimal::ZERO,
        };
        if total_usage <= Decimal::ZERO {
            return Ok(evaluation);
        }

        let mut remaining = total_usage;
        for tier in &self.tiers {
            if remaining <= Decimal::ZERO {
                break;
            }
            let consumed = match tier.capacity() {
                Some(capacity) => remaining.min(capacity),
                None => remaining,
            };
            let amount = checked(consumed.checked_mul(tier.unit_price), "tier charge")?;
            evaluation.charges.push(TierCharge {
                order: tier.order,
                lower_bound: tier.lower_bound,
                upper_bound: tier.upper_bound,
                units: consumed,
                unit_price: tier.unit_price,
                amount,
            });
            evaluation.total_cost =
                checked(evaluation.total_cost.checked_add(amount), "tiered total cost")?;
            evaluation.priced_usage += consumed;
            remaining -= consumed;
        }
        evaluation.unpriced_usage = remaining.max(Decimal::ZERO);
        Ok(evaluation)
    }
}

impl TryFrom<Vec<PriceTier>> for TierSchedule {
    type Error = BillingError;

    fn try_from(tiers: Vec<PriceTier>) -> Result<Self, Self::Error> {
        TierSchedule::new(tiers)
    }
}

impl From<TierSchedule> for Vec<PriceTier> {
    fn from(schedule: TierSchedule) -> Self {
        schedule.tiers
    }
}

fn invalid(reason: String) -> BillingError {
    BillingError::InvalidTierTable { reason }
}

/// Charge accrued inside a single tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierCharge {
    pub order: u32,
    pub lower_bound: Units,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upper_bound: Option<Units>,
    /// Units billed in this tier
    pub units: Units,
    pub unit_price: Money,
    /// `units * unit_price`
    pub amount: Money,
}

/// Result of pricing a usage quantity against a schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierEvaluation {
    pub total_usage: Units,
    pub charges: Vec<TierCharge>,
    pub priced_usage: Units,
    /// Usage beyond the schedule's last finite bound; carries no cost
    pub unpriced_usage: Units,
    pub total_cost: Money,
}

/// Pre-tax cost of `total_usage` under `tiers`. Zero or negative usage costs nothing.
pub fn evaluate(total_usage: Units, tiers: &TierSchedule) -> BillingResult<Money> {
    tiers.evaluate(total_usage)
}

/// Input for a standalone tier-cost calculation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierCostInput {
    /// Quantity to price
    pub usage: Units,
    /// Tiers in any order; they are validated and sorted before use
    pub tiers: Vec<PriceTier>,
}

/// Price a usage quantity against an ad-hoc tier table.
pub fn calculate_tier_cost(
    input: &TierCostInput,
) -> BillingResult<ComputationOutput<TierEvaluation>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.usage < Decimal::ZERO {
        return Err(BillingError::InvalidInput {
            field: "usage".into(),
            reason: "Usage cannot be negative".into(),
        });
    }

    let schedule = TierSchedule::new(input.tiers.clone())?;
    if schedule.is_empty() {
        warnings.push("Tier table is empty; usage is priced at zero".into());
    }

    let evaluation = schedule.evaluate_detailed(input.usage)?;
    if evaluation.unpriced_usage > Decimal::ZERO {
        warnings.push(format!(
            "{} units exceed the last tier bound and are not priced",
            evaluation.unpriced_usage
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Stepped tariff (fill each tier before spilling into the next)",
        &serde_json::json!({
            "usage": input.usage.to_string(),
            "tier_count": schedule.len(),
            "open_ended": schedule.coverage_limit().is_none(),
        }),
        warnings,
        elapsed,
        evaluation,
    ))
}
