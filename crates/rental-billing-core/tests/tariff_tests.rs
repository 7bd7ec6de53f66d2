use rental_billing_core::tariff::tiers::{calculate_tier_cost, PriceTier, TierCostInput, TierSchedule};
use rental_billing_core::tariff::water::{water_charge, water_cost, WaterTariffConfig};
use rental_billing_core::tariff::evaluate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn national_tiers() -> Vec<PriceTier> {
    vec![
        PriceTier::new(1, dec!(0), Some(dec!(50)), dec!(1984)),
        PriceTier::new(2, dec!(50), Some(dec!(100)), dec!(2050)),
        PriceTier::new(3, dec!(100), Some(dec!(200)), dec!(2380)),
        PriceTier::new(4, dec!(200), Some(dec!(300)), dec!(2998)),
        PriceTier::new(5, dec!(300), Some(dec!(400)), dec!(3350)),
        PriceTier::new(6, dec!(400), None, dec!(3460)),
    ]
}

// ===========================================================================
// Tiered cost evaluator
// ===========================================================================

#[test]
fn test_known_answer_120_units() {
    let schedule = TierSchedule::new(national_tiers()).unwrap();
    // 50 @ 1984 + 50 @ 2050 + 20 @ 2380
    assert_eq!(evaluate(dec!(120), &schedule).unwrap(), dec!(249300));
}

#[test]
fn test_zero_usage_costs_nothing_for_any_table() {
    let tables = vec![
        TierSchedule::empty(),
        TierSchedule::new(national_tiers()).unwrap(),
        TierSchedule::new(vec![PriceTier::new(1, dec!(0), Some(dec!(1)), dec!(99))]).unwrap(),
    ];
    for table in &tables {
        assert_eq!(evaluate(Decimal::ZERO, table).unwrap(), Decimal::ZERO);
    }
}

#[test]
fn test_cost_is_monotonic_in_usage() {
    let schedule = TierSchedule::new(national_tiers()).unwrap();
    let mut previous = Decimal::ZERO;
    let mut usage = Decimal::ZERO;
    while usage <= dec!(600) {
        let cost = schedule.evaluate(usage).unwrap();
        assert!(cost >= previous, "cost fell at usage {usage}: {cost} < {previous}");
        previous = cost;
        usage += dec!(7.5);
    }
}

#[test]
fn test_each_full_tier_contributes_its_capacity() {
    let schedule = TierSchedule::new(national_tiers()).unwrap();
    let eval = schedule.evaluate_detailed(dec!(400)).unwrap();
    let units: Vec<Decimal> = eval.charges.iter().map(|c| c.units).collect();
    assert_eq!(units, vec![dec!(50), dec!(50), dec!(100), dec!(100), dec!(100)]);
    assert_eq!(
        eval.total_cost,
        dec!(99200) + dec!(102500) + dec!(238000) + dec!(299800) + dec!(335000)
    );
}

#[test]
fn test_bounded_table_leaves_excess_unpriced() {
    let mut tiers = national_tiers();
    tiers.pop();
    let schedule = TierSchedule::new(tiers).unwrap();
    let capped = schedule.evaluate(dec!(400)).unwrap();
    assert_eq!(schedule.evaluate(dec!(450)).unwrap(), capped);
    assert_eq!(schedule.evaluate_detailed(dec!(450)).unwrap().unpriced_usage, dec!(50));
}

#[test]
fn test_tier_cost_envelope() {
    let out = calculate_tier_cost(&TierCostInput {
        usage: dec!(120),
        tiers: national_tiers(),
    })
    .unwrap();
    assert_eq!(out.result.total_cost, dec!(249300));
    assert_eq!(out.result.charges.len(), 3);
    assert!(out.warnings.is_empty());
    assert_eq!(out.metadata.precision, "rust_decimal_128bit");
}

// ===========================================================================
// Water tariff
// ===========================================================================

#[test]
fn test_water_known_answers() {
    let tariff = WaterTariffConfig::default();
    assert_eq!(water_cost(dec!(0), &tariff).unwrap(), dec!(0));
    assert_eq!(water_cost(dec!(5), &tariff).unwrap(), dec!(80000));
    assert_eq!(water_cost(dec!(7), &tariff).unwrap(), dec!(80000) + dec!(2) * dec!(27000));
}

#[test]
fn test_water_charge_totals_match_cost() {
    let tariff = WaterTariffConfig::default();
    for usage in [dec!(0), dec!(3.2), dec!(5), dec!(9)] {
        let charge = water_charge(usage, &tariff).unwrap();
        assert_eq!(charge.total, water_cost(usage, &tariff).unwrap());
        assert_eq!(charge.base_amount + charge.excess_amount, charge.total);
        assert_eq!(charge.lines.len(), 2);
    }
}
