#![cfg(feature = "ledger")]

use chrono::NaiveDate;
use rental_billing_core::billing::allocation::MeterReadings;
use rental_billing_core::billing::config::BillingConfig;
use rental_billing_core::billing::reference::InMemoryReferenceData;
use rental_billing_core::error::BillingError;
use rental_billing_core::lease::{Contract, Room};
use rental_billing_core::ledger::summary::{calculate_dashboard, BillStatus, DashboardInput};
use rental_billing_core::ledger::{build_receipt, dashboard_summary, BillBook};
use rental_billing_core::tariff::tiers::PriceTier;
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn contract() -> Contract {
    Contract::new(
        1,
        1,
        Room {
            id: 1,
            name: "101".into(),
            rent_price: dec!(2000000),
            internet_fee: dec!(100000),
        },
        date(2024, 1, 1),
        12,
    )
    .unwrap()
}

fn reference() -> InMemoryReferenceData {
    let mut reference = InMemoryReferenceData::from_records(
        vec![
            PriceTier::new(1, dec!(0), Some(dec!(100)), dec!(2000)),
            PriceTier::new(2, dec!(100), None, dec!(3000)),
        ],
        vec![],
    )
    .unwrap();
    reference.record_building_usage(date(2024, 5, 1), dec!(0), dec!(200)).unwrap();
    reference.record_building_usage(date(2024, 6, 1), dec!(200), dec!(300)).unwrap();
    reference
}

fn readings(e_old: u32, e_new: u32, w_old: u32, w_new: u32) -> MeterReadings {
    MeterReadings {
        electricity_old: e_old.into(),
        electricity_new: e_new.into(),
        water_old: w_old.into(),
        water_new: w_new.into(),
    }
}

#[test]
fn test_bill_lifecycle() {
    let reference = reference();
    let contract = contract();
    let mut book = BillBook::new(BillingConfig::default());

    let created = book
        .create_bill(&contract, readings(0, 20, 0, 4), date(2024, 5, 1), &reference)
        .unwrap();
    let id = created.result.id;
    // 20 units at 2500 blended, 8% VAT, 4 m³ water
    assert_eq!(created.result.breakdown.electricity_total, dec!(54000));
    assert_eq!(created.result.total(), dec!(2000000) + dec!(100000) + dec!(54000) + dec!(64000));
    assert!(!created.result.paid);

    book.pay_bill(id).unwrap();
    assert!(book.get(id).unwrap().paid);

    // Editing recomputes every figure and keeps the paid flag
    let edited = book
        .edit_bill(id, &contract, readings(0, 10, 0, 6), date(2024, 6, 1), &reference)
        .unwrap();
    assert_eq!(edited.result.month, date(2024, 6, 1));
    assert_eq!(edited.result.breakdown.building_total_usage, dec!(100));
    assert_eq!(edited.result.breakdown.electricity_pretax, dec!(20000));
    assert_eq!(edited.result.breakdown.water_cost, dec!(107000));
    assert!(edited.result.paid);

    let removed = book.delete_bill(id).unwrap();
    assert_eq!(removed.id, id);
    assert!(book.get(id).is_none());
}

#[test]
fn test_billed_contract_is_locked() {
    let reference = reference();
    let mut contract = contract();
    let mut book = BillBook::new(BillingConfig::default());

    book.reschedule_contract(&mut contract, date(2024, 2, 1), 6).unwrap();
    assert_eq!(contract.end_date(), date(2024, 7, 30));

    book.create_bill(&contract, readings(0, 1, 0, 1), date(2024, 5, 1), &reference)
        .unwrap();
    let err = book.reschedule_contract(&mut contract, date(2024, 3, 1), 6);
    assert!(matches!(err, Err(BillingError::ContractLocked { contract_id: 1 })));
    assert!(book.ensure_contract_editable(99).is_ok());
}

#[test]
fn test_billed_contract_cannot_be_deleted() {
    let reference = reference();
    let billed = contract();
    let mut unbilled = contract();
    unbilled.id = 2;
    let mut contracts = vec![billed.clone(), unbilled];
    let mut book = BillBook::new(BillingConfig::default());
    book.create_bill(&billed, readings(0, 1, 0, 1), date(2024, 5, 1), &reference)
        .unwrap();

    let err = book.delete_contract(&mut contracts, 1);
    assert!(matches!(err, Err(BillingError::ContractLocked { contract_id: 1 })));
    assert_eq!(contracts.len(), 2);

    assert_eq!(book.delete_contract(&mut contracts, 2).unwrap().id, 2);
    assert_eq!(contracts.len(), 1);
    assert!(matches!(
        book.delete_contract(&mut contracts, 2),
        Err(BillingError::NotFound { .. })
    ));
}

#[test]
fn test_bills_newest_first_and_opening_readings() {
    let reference = reference();
    let contract = contract();
    let mut book = BillBook::new(BillingConfig::default());
    book.create_bill(&contract, readings(0, 20, 0, 4), date(2024, 6, 1), &reference)
        .unwrap();
    book.create_bill(&contract, readings(0, 10, 0, 2), date(2024, 5, 1), &reference)
        .unwrap();

    let months: Vec<NaiveDate> = book.bills_for_contract(1).iter().map(|b| b.month).collect();
    assert_eq!(months, vec![date(2024, 6, 1), date(2024, 5, 1)]);

    let next = book.suggest_opening_readings(1);
    assert_eq!(next.electricity_old, dec!(20));
    assert_eq!(next.water_old, dec!(4));
}

#[test]
fn test_dashboard_over_book() {
    let reference = reference();
    let contract = contract();
    let mut book = BillBook::new(BillingConfig::default());
    let paid = book
        .create_bill(&contract, readings(0, 20, 0, 4), date(2024, 6, 1), &reference)
        .unwrap()
        .result
        .id;
    book.create_bill(&contract, readings(20, 30, 4, 5), date(2024, 6, 1), &reference)
        .unwrap();
    book.pay_bill(paid).unwrap();

    let today = date(2024, 6, 10);
    let summary = dashboard_summary(book.bills().map(BillStatus::from), today).unwrap();
    assert_eq!(summary.bill_count, 2);
    assert_eq!(summary.total_due, summary.total_paid + summary.total_unpaid);
    assert_eq!(summary.total_paid, book.get(paid).unwrap().total());
    assert_eq!(summary.overdue_bills, 0);

    let later = dashboard_summary(book.bills().map(BillStatus::from), date(2024, 7, 6)).unwrap();
    assert_eq!(later.bill_count, 0);
    assert_eq!(later.overdue_bills, 1);
}

#[test]
fn test_receipt_from_book_bill() {
    let reference = reference();
    let contract = contract();
    let mut book = BillBook::new(BillingConfig::default());
    let bill = book
        .create_bill(&contract, readings(0, 20, 0, 7), date(2024, 5, 1), &reference)
        .unwrap()
        .result;
    let receipt = build_receipt(&bill, &contract, book.config()).unwrap();
    assert_eq!(receipt.total, bill.total());
    assert_eq!(receipt.line_sum(), bill.total());
    assert_eq!(receipt.room_name, "101");
}

#[test]
fn test_dashboard_counts_rooms_with_running_contracts() {
    let reference = reference();
    let rented = contract();
    let vacant_room = Room {
        id: 2,
        name: "102".into(),
        rent_price: dec!(1800000),
        internet_fee: dec!(0),
    };
    let lapsed = Contract::new(2, 5, vacant_room.clone(), date(2023, 1, 1), 3).unwrap();

    let mut book = BillBook::new(BillingConfig::default());
    book.create_bill(&rented, readings(0, 20, 0, 4), date(2024, 6, 1), &reference)
        .unwrap();

    let input = DashboardInput {
        bills: book.bills().map(BillStatus::from).collect(),
        today: date(2024, 6, 10),
        rooms: vec![rented.room.clone(), vacant_room],
        contracts: vec![rented.clone(), lapsed],
    };
    let out = calculate_dashboard(&input).unwrap();
    assert_eq!(out.result.total_rooms, 2);
    assert_eq!(out.result.occupied_rooms, 1);
    assert_eq!(out.result.bill_count, 1);
    assert_eq!(out.result.rooms[0].tenant_id, Some(rented.tenant_id));
    assert_eq!(out.result.rooms[1].tenant_id, Some(5));
    assert!(!out.result.rooms[1].occupied);
    assert!(out.warnings.is_empty());
}

#[test]
fn test_dashboard_room_counts_from_json() {
    let json = r#"{
        "bills": [],
        "today": "2024-06-10",
        "rooms": [{"id": 1, "name": "101", "rent_price": "2000000"}],
        "contracts": [{"id": 7, "tenant_id": 3,
                       "room": {"id": 1, "name": "101", "rent_price": "2000000"},
                       "start_date": "2024-06-01", "duration_months": 1}]
    }"#;
    let input: DashboardInput = serde_json::from_str(json).unwrap();
    let out = calculate_dashboard(&input).unwrap();
    assert_eq!(out.result.total_rooms, 1);
    assert_eq!(out.result.occupied_rooms, 1);
}
