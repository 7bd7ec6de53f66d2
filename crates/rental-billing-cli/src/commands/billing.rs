use clap::Args;
use serde_json::Value;

use rental_billing_core::billing::allocation::{self, BillRequest};
use rental_billing_core::billing::building_usage::{self, BuildingUsageInput};
use rental_billing_core::ledger::bill::Bill;
use rental_billing_core::ledger::receipt;

use crate::commands::Settings;
use crate::input;

/// Arguments for the building-wide monthly summary
#[derive(Args)]
pub struct BuildingUsageArgs {
    /// Path to JSON input file with month, meter readings and tiers
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for bill computation
#[derive(Args)]
pub struct ComputeBillArgs {
    /// Path to JSON bill request (contract, readings, month, reference data)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for receipt rendering
#[derive(Args)]
pub struct ReceiptArgs {
    /// Path to JSON bill request (contract, readings, month, reference data)
    #[arg(long)]
    pub input: Option<String>,

    /// Bill number printed on the receipt
    #[arg(long, default_value_t = 1)]
    pub bill_id: u64,

    /// Mark the receipt as paid
    #[arg(long)]
    pub paid: bool,

    /// Print the plain-text receipt instead of structured output
    #[arg(long)]
    pub text: bool,
}

/// Fill what the request leaves out from `--config`: tiers when the request
/// carries none, and billing parameters when it has no `config` block.
fn read_request(
    path: Option<&str>,
    settings: &Settings,
    what: &str,
) -> Result<BillRequest, Box<dyn std::error::Error>> {
    let mut request: BillRequest = if let Some(path) = path {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err(format!("--input <file.json> or stdin required for {what}").into());
    };
    if request.electricity_tiers.is_empty() {
        request.electricity_tiers = settings.electricity_tiers.clone();
    }
    if request.config.is_none() {
        request.config = Some(settings.billing.clone());
    }
    Ok(request)
}

pub fn run_building_usage(
    args: BuildingUsageArgs,
    settings: &Settings,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut usage_input: BuildingUsageInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file.json> or stdin required for building usage".into());
    };
    if usage_input.tiers.is_empty() {
        usage_input.tiers = settings.electricity_tiers.clone();
    }
    if usage_input.price_dp.is_none() {
        usage_input.price_dp = settings.billing.price_dp;
    }
    let result = building_usage::calculate_building_usage(&usage_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_compute_bill(
    args: ComputeBillArgs,
    settings: &Settings,
) -> Result<Value, Box<dyn std::error::Error>> {
    let request = read_request(args.input.as_deref(), settings, "bill computation")?;
    let result = allocation::compute_bill_request(&request)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_receipt(
    args: ReceiptArgs,
    settings: &Settings,
) -> Result<Value, Box<dyn std::error::Error>> {
    let request = read_request(args.input.as_deref(), settings, "receipt")?;
    let computed = allocation::compute_bill_request(&request)?;
    let breakdown = computed.result;
    let bill = Bill {
        id: args.bill_id,
        contract_id: request.contract.id,
        month: breakdown.billing_month,
        readings: request.readings.clone(),
        breakdown,
        paid: args.paid,
    };
    let config = request.config.clone().unwrap_or_default();
    let printable = receipt::build_receipt(&bill, &request.contract, &config)?;
    if args.text {
        return Ok(Value::String(printable.to_string()));
    }
    Ok(serde_json::json!({
        "result": printable,
        "warnings": computed.warnings,
        "methodology": computed.methodology,
    }))
}
