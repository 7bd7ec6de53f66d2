use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;

use rental_billing_core::billing::allocation::{self, BillRequest};
use rental_billing_core::billing::building_usage::{self, BuildingUsageInput};
use rental_billing_core::ledger::bill::Bill;
use rental_billing_core::ledger::{receipt, summary};
use rental_billing_core::tariff::{tiers, water};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Tariffs
// ---------------------------------------------------------------------------

#[napi]
pub fn evaluate_tiers(input_json: String) -> NapiResult<String> {
    let input: tiers::TierCostInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = tiers::calculate_tier_cost(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct WaterCostRequest {
    usage: Decimal,
    #[serde(default)]
    tariff: water::WaterTariffConfig,
}

#[napi]
pub fn water_cost(input_json: String) -> NapiResult<String> {
    let input: WaterCostRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = water::water_charge(input.usage, &input.tariff).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Billing
// ---------------------------------------------------------------------------

#[napi]
pub fn building_usage(input_json: String) -> NapiResult<String> {
    let input: BuildingUsageInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = building_usage::calculate_building_usage(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn compute_bill(input_json: String) -> NapiResult<String> {
    let input: BillRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = allocation::compute_bill_request(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct ReceiptRequest {
    #[serde(default = "first_bill")]
    bill_id: u64,
    #[serde(default)]
    paid: bool,
    #[serde(flatten)]
    bill: BillRequest,
}

fn first_bill() -> u64 {
    1
}

#[napi]
pub fn bill_receipt(input_json: String) -> NapiResult<String> {
    let input: ReceiptRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let request = input.bill;
    let breakdown = allocation::compute_bill_request(&request)
        .map_err(to_napi_error)?
        .result;
    let bill = Bill {
        id: input.bill_id,
        contract_id: request.contract.id,
        month: breakdown.billing_month,
        readings: request.readings.clone(),
        breakdown,
        paid: input.paid,
    };
    let config = request.config.clone().unwrap_or_default();
    let output =
        receipt::build_receipt(&bill, &request.contract, &config).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

#[napi]
pub fn dashboard_summary(input_json: String) -> NapiResult<String> {
    let input: summary::DashboardInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = summary::calculate_dashboard(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
