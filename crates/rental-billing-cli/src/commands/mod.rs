pub mod billing;
pub mod ledger;
pub mod tariff;

use rental_billing_core::billing::config::BillingConfig;
use rental_billing_core::billing::config_loader::{self, BillingFile};
use rental_billing_core::tariff::tiers::PriceTier;
use tracing::debug;

/// Billing parameters shared by every command: `--config` file first, then
/// any `RBILL_*` environment overrides.
pub struct Settings {
    pub billing: BillingConfig,
    pub electricity_tiers: Vec<PriceTier>,
}

impl Settings {
    pub fn load(path: Option<&str>) -> Result<Self, Box<dyn std::error::Error>> {
        let file = match path {
            Some(path) => config_loader::load_config(path)?,
            None => BillingFile::default(),
        };
        let billing = config_loader::apply_overrides(file.billing, |key| std::env::var(key).ok())?;
        debug!(
            vat_rate = %billing.vat_rate,
            tiers = file.electricity_tiers.len(),
            "billing settings loaded"
        );
        Ok(Self {
            billing,
            electricity_tiers: file.electricity_tiers,
        })
    }
}
