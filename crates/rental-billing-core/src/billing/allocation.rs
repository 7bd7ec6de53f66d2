use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use crate::billing::building_usage::{average_unit_price, MonthlyBuildingUsage};
use crate::billing::config::BillingConfig;
use crate::billing::reference::{InMemoryReferenceData, ReferenceData};
use crate::lease::Contract;
use crate::tariff::tiers::PriceTier;
use crate::tariff::water::water_cost;
use crate::types::*;
use crate::BillingResult;

/// Tenant sub-meter readings for one bill.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeterReadings {
    pub electricity_old: Units,
    pub electricity_new: Units,
    pub water_old: Units,
    pub water_new: Units,
}

impl MeterReadings {
    pub fn electricity_usage(&self) -> Units {
        meter_delta(self.electricity_old, self.electricity_new)
    }

    pub fn water_usage(&self) -> Units {
        meter_delta(self.water_old, self.water_new)
    }
}

/// Whether the reference data behind a bill was complete. Anything other
/// than `Complete` means some cost component came out as zero or short.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceStatus {
    Complete,
    MissingMonthlyUsage,
    ZeroBuildingUsage,
    EmptyTierTable,
    UncoveredUsage,
}

/// Every figure needed to persist and print a bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillBreakdown {
    pub billing_month: NaiveDate,
    pub electricity_usage: Units,
    pub water_usage: Units,
    pub building_total_usage: Units,
    pub building_pretax_cost: Money,
    pub average_unit_price: Money,
    pub electricity_pretax: Money,
    pub electricity_vat: Money,
    pub electricity_total: Money,
    pub water_cost: Money,
    pub rent_price: Money,
    pub internet_fee: Money,
    pub total: Money,
    pub reference_status: ReferenceStatus,
}

/// A tenant's share of the building electricity cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectricityShare {
    pub average_unit_price: Money,
    pub pretax: Money,
    pub vat: Money,
    pub total: Money,
}

/// Spread `building_pretax_cost` over `building_usage` and charge the tenant
/// for `tenant_usage` at that blended price, plus VAT.
///
/// Each figure is rounded from its unrounded source, so `pretax + vat` can
/// differ from `total` by one unit in the last place.
pub fn allocate_electricity(
    tenant_usage: Units,
    building_usage: Units,
    building_pretax_cost: Money,
    vat_rate: Rate,
    config: &BillingConfig,
) -> BillingResult<ElectricityShare> {
    let price = average_unit_price(building_pretax_cost, building_usage)?;
    let pretax = checked(
        tenant_usage.max(Decimal::ZERO).checked_mul(price),
        "electricity pretax",
    )?;
    let vat = checked(pretax.checked_mul(vat_rate), "electricity VAT")?;
    let total = checked(pretax.checked_add(vat), "electricity total")?;
    Ok(ElectricityShare {
        average_unit_price: round_to(price, config.price_dp),
        pretax: round_to(pretax, config.money_dp),
        vat: round_to(vat, config.money_dp),
        total: round_to(total, config.money_dp),
    })
}

/// Compute a tenant's monthly bill.
///
/// The building record for `billing_month` and the electricity tier table are
/// read from `reference`; neither is modified. Missing or degenerate reference
/// data never fails the computation: the affected component is zero and the
/// output carries a warning plus a non-`Complete` [`ReferenceStatus`].
pub fn compute_bill<R: ReferenceData + ?Sized>(
    contract: &Contract,
    readings: &MeterReadings,
    billing_month: NaiveDate,
    config: &BillingConfig,
    reference: &R,
) -> BillingResult<ComputationOutput<BillBreakdown>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    config.validate()?;
    let billing_month = month_start(billing_month);

    if readings.electricity_new < readings.electricity_old {
        warnings.push(format!(
            "Electricity reading went backwards ({} -> {}); usage treated as zero",
            readings.electricity_old, readings.electricity_new
        ));
    }
    if readings.water_new < readings.water_old {
        warnings.push(format!(
            "Water reading went backwards ({} -> {}); usage treated as zero",
            readings.water_old, readings.water_new
        ));
    }

    let electricity_usage = readings.electricity_usage();
    let water_usage = readings.water_usage();
    let water = round_to(water_cost(water_usage, &config.water)?, config.money_dp);

    let record = reference.building_usage(billing_month);
    let building_total_usage = record
        .as_ref()
        .map(MonthlyBuildingUsage::total_usage)
        .unwrap_or(Decimal::ZERO);
    let tiers = reference.electricity_tiers();
    let evaluation = tiers.evaluate_detailed(building_total_usage)?;

    let reference_status = if record.is_none() {
        warnings.push(format!(
            "No building usage recorded for {billing_month}; electricity is billed at zero"
        ));
        ReferenceStatus::MissingMonthlyUsage
    } else if building_total_usage.is_zero() {
        warnings.push(format!(
            "Building usage for {billing_month} is zero; electricity is billed at zero"
        ));
        ReferenceStatus::ZeroBuildingUsage
    } else if tiers.is_empty() {
        warnings.push("Electricity tier table is empty; electricity is billed at zero".into());
        ReferenceStatus::EmptyTierTable
    } else if evaluation.unpriced_usage > Decimal::ZERO {
        warnings.push(format!(
            "{} building units exceed the last tier bound and are not priced",
            evaluation.unpriced_usage
        ));
        ReferenceStatus::UncoveredUsage
    } else {
        ReferenceStatus::Complete
    };
    if building_total_usage > Decimal::ZERO && electricity_usage > building_total_usage {
        warnings.push(format!(
            "Tenant electricity usage {electricity_usage} exceeds building usage {building_total_usage}"
        ));
    }
    if reference_status != ReferenceStatus::Complete {
        warn!(
            contract_id = contract.id,
            month = %billing_month,
            status = ?reference_status,
            "incomplete reference data for bill"
        );
    }

    let share = allocate_electricity(
        electricity_usage,
        building_total_usage,
        evaluation.total_cost,
        config.vat_rate,
        config,
    )?;

    let rent_price = contract.rent_price();
    let internet_fee = contract.internet_fee();
    let total = [internet_fee, share.total, water]
        .into_iter()
        .try_fold(rent_price, |sum, part| checked(sum.checked_add(part), "bill total"))?;
    let total = round_to(total, config.money_dp);

    debug!(
        contract_id = contract.id,
        month = %billing_month,
        electricity_usage = %electricity_usage,
        average_unit_price = %share.average_unit_price,
        total = %total,
        "bill computed"
    );

    let output = BillBreakdown {
        billing_month,
        electricity_usage,
        water_usage,
        building_total_usage,
        building_pretax_cost: evaluation.total_cost,
        average_unit_price: share.average_unit_price,
        electricity_pretax: share.pretax,
        electricity_vat: share.vat,
        electricity_total: share.total,
        water_cost: water,
        rent_price,
        internet_fee,
        total,
        reference_status,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Shared-meter allocation: blended tiered price x tenant usage + VAT, plus rent, internet and stepped water",
        &serde_json::json!({
            "contract_id": contract.id,
            "billing_month": billing_month.to_string(),
            "vat_rate": config.vat_rate.to_string(),
            "tier_count": tiers.len(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Self-contained bill request: the contract, readings and all reference data
/// travel together, as used by the CLI and the bindings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillRequest {
    pub contract: Contract,
    pub readings: MeterReadings,
    pub billing_month: NaiveDate,
    #[serde(default)]
    pub electricity_tiers: Vec<PriceTier>,
    #[serde(default)]
    pub building_usage: Vec<MonthlyBuildingUsage>,
    #[serde(default)]
    pub config: Option<BillingConfig>,
}

/// Build an in-memory reference store from `request` and compute the bill.
pub fn compute_bill_request(
    request: &BillRequest,
) -> BillingResult<ComputationOutput<BillBreakdown>> {
    let reference = InMemoryReferenceData::from_records(
        request.electricity_tiers.clone(),
        request.building_usage.clone(),
    )?;
    let config = request.config.clone().unwrap_or_default();
    compute_bill(
        &request.contract,
        &request.readings,
        request.billing_month,
        &config,
        &reference,
    )
}
