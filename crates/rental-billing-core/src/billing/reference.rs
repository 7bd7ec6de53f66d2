//! Reference data read by the allocation engine.
//!
//! [`ReferenceData`] is the seam between the engine and whatever store holds
//! the electricity tier table and the monthly building meter records.
//! [`InMemoryReferenceData`] backs tests, the CLI and the bindings, and is the
//! place where the administrative operations keep the tier table valid.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::billing::building_usage::MonthlyBuildingUsage;
use crate::error::BillingError;
use crate::tariff::tiers::{PriceTier, TierSchedule};
use crate::types::{month_start, Units};
use crate::BillingResult;

/// Read-only view of the tariff and building meter records.
///
/// Implementations must return the freshest committed state; the engine reads
/// the two independently and does not require them to be mutually consistent.
pub trait ReferenceData: Send + Sync {
    /// Building meter record for the month starting on `month`, if any.
    fn building_usage(&self, month: NaiveDate) -> Option<MonthlyBuildingUsage>;

    /// Current electricity tier table.
    fn electricity_tiers(&self) -> TierSchedule;
}

/// In-memory reference store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReferenceData {
    tiers: TierSchedule,
    monthly: BTreeMap<NaiveDate, MonthlyBuildingUsage>,
}

impl InMemoryReferenceData {
    pub fn new(tiers: TierSchedule) -> Self {
        Self {
            tiers,
            monthly: BTreeMap::new(),
        }
    }

    /// Build a store from raw tier rows and meter records. Later records for
    /// the same month replace earlier ones.
    pub fn from_records(
        tiers: Vec<PriceTier>,
        usage: Vec<MonthlyBuildingUsage>,
    ) -> BillingResult<Self> {
        let mut store = Self::new(TierSchedule::new(tiers)?);
        for record in usage {
            store.record_building_usage(record.month, record.meter_old, record.meter_new)?;
        }
        Ok(store)
    }

    // ------------------------------------------------------------------
    // Tier table administration
    // ------------------------------------------------------------------

    /// Swap the whole tier table; cached monthly averages are refreshed.
    /// Nothing changes if the table is invalid or a month cannot be priced.
    pub fn replace_electricity_tiers(&mut self, tiers: Vec<PriceTier>) -> BillingResult<()> {
        let schedule = TierSchedule::new(tiers).inspect_err(|e| {
            warn!(error = %e, "rejected electricity tier table");
        })?;
        let mut monthly = self.monthly.clone();
        for record in monthly.values_mut() {
            record.refresh_average_price(&schedule).inspect_err(|e| {
                warn!(month = %record.month, error = %e, "rejected electricity tier table");
            })?;
        }
        info!(tiers = schedule.len(), "electricity tier table replaced");
        debug!(months = monthly.len(), "cached average prices refreshed");
        self.tiers = schedule;
        self.monthly = monthly;
        Ok(())
    }

    pub fn add_tier(&mut self, tier: PriceTier) -> BillingResult<()> {
        if self.tiers.tiers().iter().any(|t| t.order == tier.order) {
            return Err(BillingError::InvalidTierTable {
                reason: format!("tier order {} already exists", tier.order),
            });
        }
        let mut candidate = self.tiers.tiers().to_vec();
        candidate.push(tier);
        self.replace_electricity_tiers(candidate)
    }

    /// Replace the tier currently stored under `order`.
    pub fn update_tier(&mut self, order: u32, tier: PriceTier) -> BillingResult<()> {
        let mut candidate = self.tiers.tiers().to_vec();
        let slot = candidate
            .iter_mut()
            .find(|t| t.order == order)
            .ok_or_else(|| tier_not_found(order))?;
        *slot = tier;
        self.replace_electricity_tiers(candidate)
    }

    pub fn remove_tier(&mut self, order: u32) -> BillingResult<PriceTier> {
        let mut candidate = self.tiers.tiers().to_vec();
        let idx = candidate
            .iter()
            .position(|t| t.order == order)
            .ok_or_else(|| tier_not_found(order))?;
        let removed = candidate.remove(idx);
        self.replace_electricity_tiers(candidate)?;
        Ok(removed)
    }

    // ------------------------------------------------------------------
    // Monthly building usage
    // ------------------------------------------------------------------

    /// Insert or overwrite the record for the month containing `month`.
    pub fn record_building_usage(
        &mut self,
        month: NaiveDate,
        meter_old: Units,
        meter_new: Units,
    ) -> BillingResult<&MonthlyBuildingUsage> {
        let mut record = MonthlyBuildingUsage::new(month, meter_old, meter_new);
        record.refresh_average_price(&self.tiers)?;
        if meter_new < meter_old {
            warn!(month = %record.month, %meter_old, %meter_new, "building meter went backwards");
        }
        info!(
            month = %record.month,
            usage = %record.total_usage(),
            average_unit_price = %record.average_unit_price,
            "building usage recorded"
        );
        let key = record.month;
        self.monthly.insert(key, record);
        Ok(&self.monthly[&key])
    }

    pub fn remove_building_usage(&mut self, month: NaiveDate) -> Option<MonthlyBuildingUsage> {
        let removed = self.monthly.remove(&month_start(month));
        if removed.is_some() {
            info!(month = %month_start(month), "building usage removed");
        }
        removed
    }

    /// All monthly records, oldest first.
    pub fn monthly_records(&self) -> impl Iterator<Item = &MonthlyBuildingUsage> {
        self.monthly.values()
    }
}

impl ReferenceData for InMemoryReferenceData {
    fn building_usage(&self, month: NaiveDate) -> Option<MonthlyBuildingUsage> {
        self.monthly.get(&month_start(month)).cloned()
    }

    fn electricity_tiers(&self) -> TierSchedule {
        self.tiers.clone()
    }
}

fn tier_not_found(order: u32) -> BillingError {
    BillingError::NotFound {
        entity: "price tier".into(),
        id: order.to_string(),
    }
}
