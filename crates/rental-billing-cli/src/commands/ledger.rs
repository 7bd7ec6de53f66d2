use chrono::{Local, NaiveDate};
use clap::Args;
use serde_json::Value;

use rental_billing_core::ledger::summary::{self, DashboardInput};

use crate::input;

/// Arguments for the landlord dashboard
#[derive(Args)]
pub struct DashboardArgs {
    /// Path to JSON input file with `bills` (month, total, paid) and optional `rooms` and `contracts`
    #[arg(long)]
    pub input: Option<String>,

    /// Reference date (YYYY-MM-DD); defaults to the input's `today`, then the local date
    #[arg(long)]
    pub today: Option<NaiveDate>,
}

/// Arguments for lease end-date calculation
#[derive(Args)]
pub struct ContractEndArgs {
    /// Lease start date (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: NaiveDate,

    /// Lease length in months
    #[arg(long)]
    pub duration_months: u32,

    /// Extension to apply after the initial term, in months
    #[arg(long)]
    pub extend_months: Option<u32>,
}

pub fn run_dashboard(args: DashboardArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut data: Value = if let Some(ref path) = args.input {
        input::file::read_json_value(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        return Err("--input <file.json> or stdin required for the dashboard".into());
    };

    if let Value::Object(ref mut map) = data {
        if let Some(today) = args.today {
            map.insert("today".into(), Value::String(today.to_string()));
        } else if !map.contains_key("today") {
            let today = Local::now().date_naive();
            map.insert("today".into(), Value::String(today.to_string()));
        }
    }

    let dashboard_input: DashboardInput = serde_json::from_value(data)?;
    let result = summary::calculate_dashboard(&dashboard_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_contract_end(args: ContractEndArgs) -> Result<Value, Box<dyn std::error::Error>> {
    use rental_billing_core::lease::{Contract, Room};
    use rust_decimal::Decimal;

    let placeholder_room = Room {
        id: 0,
        name: String::new(),
        rent_price: Decimal::ZERO,
        internet_fee: Decimal::ZERO,
    };
    let mut contract = Contract::new(0, 0, placeholder_room, args.start_date, args.duration_months)?;
    let initial_end = contract.end_date();
    if let Some(months) = args.extend_months {
        contract.extend(months)?;
    }

    Ok(serde_json::json!({
        "start_date": contract.start_date.to_string(),
        "duration_months": contract.duration_months,
        "initial_end_date": initial_end.to_string(),
        "end_date": contract.end_date().to_string(),
        "is_extended": contract.is_extended,
    }))
}
