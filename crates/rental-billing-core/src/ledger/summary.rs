use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::lease::{Contract, Room};
use crate::ledger::bill::{due_date, Bill};
use crate::types::*;
use crate::BillingResult;

/// The parts of a bill the landlord dashboard looks at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillStatus {
    pub month: NaiveDate,
    pub total: Money,
    #[serde(default)]
    pub paid: bool,
}

impl From<&Bill> for BillStatus {
    fn from(bill: &Bill) -> Self {
        Self {
            month: bill.month,
            total: bill.total(),
            paid: bill.paid,
        }
    }
}

/// Who, if anyone, is renting a room on the dashboard date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomOccupancy {
    pub room_id: u64,
    pub room_name: String,
    /// Tenant of the active contract, else of the room's latest contract
    pub tenant_id: Option<u64>,
    pub contract_id: Option<u64>,
    pub end_date: Option<NaiveDate>,
    pub occupied: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_rooms: usize,
    pub occupied_rooms: usize,
    pub bill_count: usize,
    pub total_due: Money,
    pub total_paid: Money,
    pub total_unpaid: Money,
    pub overdue_bills: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rooms: Vec<RoomOccupancy>,
}

/// Money totals cover bills from the current month onwards; the overdue
/// count covers every unpaid bill past its due date, whatever its month.
/// Room counts are left at zero; see [`room_occupancy`].
pub fn dashboard_summary<I>(bills: I, today: NaiveDate) -> BillingResult<DashboardSummary>
where
    I: IntoIterator<Item = BillStatus>,
{
    let current_month = month_start(today);
    let mut summary = DashboardSummary::default();
    for bill in bills {
        if !bill.paid && today > due_date(bill.month) {
            summary.overdue_bills += 1;
        }
        if bill.month < current_month {
            continue;
        }
        summary.bill_count += 1;
        summary.total_due = checked(summary.total_due.checked_add(bill.total), "total due")?;
        if bill.paid {
            summary.total_paid =
                checked(summary.total_paid.checked_add(bill.total), "total paid")?;
        }
    }
    summary.total_unpaid = checked(
        summary.total_due.checked_sub(summary.total_paid),
        "total unpaid",
    )?;
    Ok(summary)
}

/// Occupancy of each room on `today`. A room is occupied when one of its
/// contracts is still running; otherwise the latest contract's tenant is
/// shown against the empty room.
pub fn room_occupancy(rooms: &[Room], contracts: &[Contract], today: NaiveDate) -> Vec<RoomOccupancy> {
    rooms
        .iter()
        .map(|room| {
            let for_room = || contracts.iter().filter(|c| c.room.id == room.id);
            let active = for_room()
                .filter(|c| c.is_active(today))
                .max_by_key(|c| (c.end_date(), c.id));
            let shown = active.or_else(|| for_room().max_by_key(|c| c.id));
            RoomOccupancy {
                room_id: room.id,
                room_name: room.name.clone(),
                tenant_id: shown.map(|c| c.tenant_id),
                contract_id: shown.map(|c| c.id),
                end_date: shown.map(Contract::end_date),
                occupied: active.is_some(),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardInput {
    pub bills: Vec<BillStatus>,
    pub today: NaiveDate,
    #[serde(default)]
    pub rooms: Vec<Room>,
    /// Contracts of any age; each is matched to its room by `room.id`
    #[serde(default)]
    pub contracts: Vec<Contract>,
}

pub fn calculate_dashboard(
    input: &DashboardInput,
) -> BillingResult<ComputationOutput<DashboardSummary>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let skipped = input
        .bills
        .iter()
        .filter(|b| b.month < month_start(input.today))
        .count();
    if skipped > 0 {
        warnings.push(format!(
            "{skipped} bills from earlier months are excluded from the totals"
        ));
    }
    if input.bills.iter().any(|b| b.total < Decimal::ZERO) {
        warnings.push("Some bills have a negative total".into());
    }

    let orphaned = input
        .contracts
        .iter()
        .filter(|c| !input.rooms.iter().any(|r| r.id == c.room.id))
        .count();
    if orphaned > 0 {
        warnings.push(format!(
            "{orphaned} contracts refer to rooms not in the room list"
        ));
    }

    let mut output = dashboard_summary(input.bills.iter().cloned(), input.today)?;
    output.rooms = room_occupancy(&input.rooms, &input.contracts, input.today);
    output.total_rooms = output.rooms.len();
    output.occupied_rooms = output.rooms.iter().filter(|r| r.occupied).count();

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Landlord dashboard over bills from the current month onwards",
        &serde_json::json!({
            "today": input.today.to_string(),
            "bills": input.bills.len(),
            "rooms": input.rooms.len(),
            "contracts": input.contracts.len(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn status(y: i32, m: u32, total: Money, paid: bool) -> BillStatus {
        BillStatus {
            month: NaiveDate::from_ymd_opt(y, m, 1).unwrap(),
            total,
            paid,
        }
    }

    #[test]
    fn test_totals_for_current_month() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 20).unwrap();
        let summary = dashboard_summary(
            vec![
                status(2024, 5, dec!(100), true),
                status(2024, 5, dec!(250), false),
                status(2024, 4, dec!(999), false),
            ],
            today,
        )
        .unwrap();
        assert_eq!(summary.bill_count, 2);
        assert_eq!(summary.total_due, dec!(350));
        assert_eq!(summary.total_paid, dec!(100));
        assert_eq!(summary.total_unpaid, dec!(250));
        // April's unpaid bill fell due on May 5
        assert_eq!(summary.overdue_bills, 1);
    }

    #[test]
    fn test_paid_old_bill_is_not_overdue() {
        let today = NaiveDate::from_ymd_opt(2024, 9, 1).unwrap();
        let summary = dashboard_summary(vec![status(2024, 4, dec!(50), true)], today).unwrap();
        assert_eq!(summary.overdue_bills, 0);
        assert_eq!(summary.bill_count, 0);
    }

    #[test]
    fn test_future_dated_unpaid_bill_not_overdue() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        let summary = dashboard_summary(vec![status(2024, 6, dec!(10), false)], today).unwrap();
        assert_eq!(summary.overdue_bills, 0);
        assert_eq!(summary.total_unpaid, dec!(10));
    }

    #[test]
    fn test_calculate_dashboard_warns_on_skipped() {
        let input = DashboardInput {
            bills: vec![status(2024, 4, dec!(5), false), status(2024, 5, dec!(7), false)],
            today: NaiveDate::from_ymd_opt(2024, 5, 3).unwrap(),
            rooms: vec![],
            contracts: vec![],
        };
        let out = calculate_dashboard(&input).unwrap();
        assert_eq!(out.result.total_due, dec!(7));
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_totals_beyond_decimal_range_are_an_error() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 3).unwrap();
        let bills = vec![status(2024, 5, Decimal::MAX, false), status(2024, 5, dec!(1), false)];
        assert!(dashboard_summary(bills, today).is_err());
    }

    #[test]
    fn test_room_occupancy_prefers_running_contract() {
        let room = |id: u64| Room {
            id,
            name: format!("R{id}"),
            rent_price: dec!(1000),
            internet_fee: dec!(0),
        };
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let expired = Contract::new(1, 10, room(1), start, 1).unwrap();
        let running = Contract::new(2, 11, room(1), start, 12).unwrap();
        let old = Contract::new(3, 12, room(2), start, 1).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 5, 3).unwrap();

        let rooms = room_occupancy(&[room(1), room(2), room(3)], &[expired, running, old], today);
        assert_eq!(rooms[0].tenant_id, Some(11));
        assert!(rooms[0].occupied);
        assert_eq!(rooms[1].tenant_id, Some(12));
        assert!(!rooms[1].occupied);
        assert_eq!(rooms[2].tenant_id, None);
        assert!(!rooms[2].occupied);
    }
}
