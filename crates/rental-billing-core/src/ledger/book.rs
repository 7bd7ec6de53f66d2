//! In-memory bill ledger: creation, wholesale recomputation on edit, payment,
//! deletion, and the contract guard that stops billed contracts from changing.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::billing::allocation::{compute_bill, MeterReadings};
use crate::billing::config::BillingConfig;
use crate::billing::reference::ReferenceData;
use crate::error::BillingError;
use crate::lease::Contract;
use crate::ledger::bill::Bill;
use crate::types::{month_start, with_metadata, ComputationOutput};
use crate::BillingResult;

#[derive(Debug, Clone, Default)]
pub struct BillBook {
    config: BillingConfig,
    bills: BTreeMap<u64, Bill>,
    next_id: u64,
}

impl BillBook {
    pub fn new(config: BillingConfig) -> Self {
        Self {
            config,
            bills: BTreeMap::new(),
            next_id: 1,
        }
    }

    pub fn config(&self) -> &BillingConfig {
        &self.config
    }

    /// Compute and store a new bill. A second bill for the same contract and
    /// month is accepted but flagged in the warnings.
    pub fn create_bill<R: ReferenceData + ?Sized>(
        &mut self,
        contract: &Contract,
        readings: MeterReadings,
        month: NaiveDate,
        reference: &R,
    ) -> BillingResult<ComputationOutput<Bill>> {
        let computed = compute_bill(contract, &readings, month, &self.config, reference)?;
        let mut warnings = computed.warnings;
        let month = month_start(month);

        if self.duplicate_of(contract.id, month, None).is_some() {
            warn!(contract_id = contract.id, %month, "duplicate bill for month");
            warnings.push(format!(
                "Contract {} already has a bill for {month}",
                contract.id
            ));
        }

        let id = self.allocate_id();
        let bill = Bill {
            id,
            contract_id: contract.id,
            month,
            readings,
            breakdown: computed.result,
            paid: false,
        };
        info!(bill_id = id, contract_id = contract.id, %month, total = %bill.total(), "bill created");
        self.bills.insert(id, bill.clone());

        Ok(with_metadata(
            &computed.methodology,
            &computed.assumptions,
            warnings,
            computed.metadata.computation_time_us,
            bill,
        ))
    }

    /// Replace a bill's month and readings and recompute it from scratch.
    /// The paid flag is kept.
    pub fn edit_bill<R: ReferenceData + ?Sized>(
        &mut self,
        bill_id: u64,
        contract: &Contract,
        readings: MeterReadings,
        month: NaiveDate,
        reference: &R,
    ) -> BillingResult<ComputationOutput<Bill>> {
        let existing = self.bills.get(&bill_id).ok_or_else(|| bill_not_found(bill_id))?;
        if existing.contract_id != contract.id {
            return Err(BillingError::InvalidInput {
                field: "contract".into(),
                reason: format!(
                    "bill {bill_id} belongs to contract {}, not {}",
                    existing.contract_id, contract.id
                ),
            });
        }
        let paid = existing.paid;

        let computed = compute_bill(contract, &readings, month, &self.config, reference)?;
        let mut warnings = computed.warnings;
        let month = month_start(month);
        if self.duplicate_of(contract.id, month, Some(bill_id)).is_some() {
            warnings.push(format!(
                "Contract {} already has a bill for {month}",
                contract.id
            ));
        }

        let bill = Bill {
            id: bill_id,
            contract_id: contract.id,
            month,
            readings,
            breakdown: computed.result,
            paid,
        };
        info!(bill_id, %month, total = %bill.total(), "bill recomputed");
        self.bills.insert(bill_id, bill.clone());

        Ok(with_metadata(
            &computed.methodology,
            &computed.assumptions,
            warnings,
            computed.metadata.computation_time_us,
            bill,
        ))
    }

    pub fn delete_bill(&mut self, bill_id: u64) -> BillingResult<Bill> {
        let bill = self.bills.remove(&bill_id).ok_or_else(|| bill_not_found(bill_id))?;
        info!(bill_id, contract_id = bill.contract_id, "bill deleted");
        Ok(bill)
    }

    pub fn pay_bill(&mut self, bill_id: u64) -> BillingResult<&Bill> {
        let bill = self.bills.get_mut(&bill_id).ok_or_else(|| bill_not_found(bill_id))?;
        bill.paid = true;
        info!(bill_id, "bill paid");
        Ok(bill)
    }

    pub fn get(&self, bill_id: u64) -> Option<&Bill> {
        self.bills.get(&bill_id)
    }

    pub fn bills(&self) -> impl Iterator<Item = &Bill> {
        self.bills.values()
    }

    /// Bills of a contract, newest month first.
    pub fn bills_for_contract(&self, contract_id: u64) -> Vec<&Bill> {
        let mut bills: Vec<&Bill> = self
            .bills
            .values()
            .filter(|b| b.contract_id == contract_id)
            .collect();
        bills.sort_by(|a, b| b.month.cmp(&a.month).then(b.id.cmp(&a.id)));
        bills
    }

    pub fn last_bill(&self, contract_id: u64) -> Option<&Bill> {
        self.bills_for_contract(contract_id).into_iter().next()
    }

    /// Opening readings for the next bill: the previous bill's closing
    /// readings, or zeros for a contract's first bill.
    pub fn suggest_opening_readings(&self, contract_id: u64) -> MeterReadings {
        match self.last_bill(contract_id) {
            Some(last) => MeterReadings {
                electricity_old: last.readings.electricity_new,
                electricity_new: last.readings.electricity_new,
                water_old: last.readings.water_new,
                water_new: last.readings.water_new,
            },
            None => MeterReadings::default(),
        }
    }

    /// Contracts that already have bills may not be rescheduled or deleted.
    pub fn ensure_contract_editable(&self, contract_id: u64) -> BillingResult<()> {
        if self.bills.values().any(|b| b.contract_id == contract_id) {
            return Err(BillingError::ContractLocked { contract_id });
        }
        Ok(())
    }

    pub fn reschedule_contract(
        &self,
        contract: &mut Contract,
        start_date: NaiveDate,
        duration_months: u32,
    ) -> BillingResult<()> {
        self.ensure_contract_editable(contract.id)?;
        contract.reschedule(start_date, duration_months)
    }

    /// Remove `contract_id` from `contracts` unless it has been billed.
    pub fn delete_contract(
        &self,
        contracts: &mut Vec<Contract>,
        contract_id: u64,
    ) -> BillingResult<Contract> {
        self.ensure_contract_editable(contract_id)?;
        let idx = contracts
            .iter()
            .position(|c| c.id == contract_id)
            .ok_or_else(|| BillingError::NotFound {
                entity: "contract".into(),
                id: contract_id.to_string(),
            })?;
        info!(contract_id, "contract deleted");
        Ok(contracts.remove(idx))
    }

    fn duplicate_of(&self, contract_id: u64, month: NaiveDate, except: Option<u64>) -> Option<&Bill> {
        self.bills
            .values()
            .find(|b| b.contract_id == contract_id && b.month == month && Some(b.id) != except)
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        id
    }
}

fn bill_not_found(bill_id: u64) -> BillingError {
    BillingError::NotFound {
        entity: "bill".into(),
        id: bill_id.to_string(),
    }
}
