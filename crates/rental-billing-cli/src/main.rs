mod commands;
mod input;
mod observability;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::billing::{BuildingUsageArgs, ComputeBillArgs, ReceiptArgs};
use commands::ledger::{ContractEndArgs, DashboardArgs};
use commands::tariff::{TierCostArgs, WaterCostArgs};

/// Shared-utility billing for rental buildings
#[derive(Parser)]
#[command(
    name = "rbill",
    version,
    about = "Shared-utility billing for rental buildings",
    long_about = "Allocates a building's tiered electricity cost across tenants by \
                  sub-metered usage, adds VAT, stepped water charges, rent and internet, \
                  and summarises bills for the landlord dashboard."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// TOML billing configuration (VAT, water tariff, electricity tiers)
    #[arg(long, global = true)]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Price a usage quantity against a tier table
    TierCost(TierCostArgs),
    /// Stepped water charge with receipt lines
    WaterCost(WaterCostArgs),
    /// Building-wide monthly cost and blended unit price
    BuildingUsage(BuildingUsageArgs),
    /// Compute a tenant's monthly bill
    ComputeBill(ComputeBillArgs),
    /// Printable receipt for a tenant's monthly bill
    Receipt(ReceiptArgs),
    /// Landlord dashboard totals over a set of bills
    Dashboard(DashboardArgs),
    /// Lease end date, optionally after an extension
    ContractEnd(ContractEndArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();
    observability::init_tracing();

    let settings = match commands::Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::TierCost(args) => commands::tariff::run_tier_cost(args, &settings),
        Commands::WaterCost(args) => commands::tariff::run_water_cost(args, &settings),
        Commands::BuildingUsage(args) => commands::billing::run_building_usage(args, &settings),
        Commands::ComputeBill(args) => commands::billing::run_compute_bill(args, &settings),
        Commands::Receipt(args) => commands::billing::run_receipt(args, &settings),
        Commands::Dashboard(args) => commands::ledger::run_dashboard(args),
        Commands::ContractEnd(args) => commands::ledger::run_contract_end(args),
        Commands::Version => {
            println!("rbill {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
