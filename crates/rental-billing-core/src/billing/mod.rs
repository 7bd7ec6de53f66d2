pub mod allocation;
pub mod building_usage;
pub mod config;
#[cfg(feature = "config-loader")]
pub mod config_loader;
pub mod reference;

pub use allocation::{compute_bill, BillBreakdown, MeterReadings, ReferenceStatus};
pub use building_usage::MonthlyBuildingUsage;
pub use config::BillingConfig;
pub use reference::{InMemoryReferenceData, ReferenceData};
