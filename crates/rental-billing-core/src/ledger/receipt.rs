use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::billing::config::BillingConfig;
use crate::lease::Contract;
use crate::ledger::bill::Bill;
use crate::tariff::water::water_charge;
use crate::types::Money;
use crate::BillingResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptLine {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub amount: Money,
}

/// Printable bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub bill_id: u64,
    pub contract_id: u64,
    pub room_name: String,
    pub month: NaiveDate,
    pub due_date: NaiveDate,
    pub lines: Vec<ReceiptLine>,
    pub total: Money,
    pub paid: bool,
}

pub fn build_receipt(
    bill: &Bill,
    contract: &Contract,
    config: &BillingConfig,
) -> BillingResult<Receipt> {
    let b = &bill.breakdown;
    let water = water_charge(b.water_usage, &config.water)?;
    let vat_pct = (config.vat_rate * dec!(100)).normalize();

    let lines = vec![
        ReceiptLine {
            label: "Rent".into(),
            detail: None,
            amount: b.rent_price,
        },
        ReceiptLine {
            label: "Internet".into(),
            detail: None,
            amount: b.internet_fee,
        },
        ReceiptLine {
            label: "Electricity".into(),
            detail: Some(format!(
                "{} - {} = {} units x {}",
                bill.readings.electricity_new.normalize(),
                bill.readings.electricity_old.normalize(),
                b.electricity_usage.normalize(),
                b.average_unit_price.normalize()
            )),
            amount: b.electricity_pretax,
        },
        ReceiptLine {
            label: "Electricity VAT".into(),
            detail: Some(format!("{vat_pct}%")),
            amount: b.electricity_vat,
        },
        ReceiptLine {
            label: "Water".into(),
            detail: Some(water.lines.join("; ")),
            amount: b.water_cost,
        },
    ];

    Ok(Receipt {
        bill_id: bill.id,
        contract_id: contract.id,
        room_name: contract.room.name.clone(),
        month: bill.month,
        due_date: bill.due_date(),
        lines,
        total: b.total,
        paid: bill.paid,
    })
}

impl fmt::Display for Receipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Room {} - {}",
            self.room_name,
            self.month.format("%m/%Y")
        )?;
        for line in &self.lines {
            match &line.detail {
                Some(detail) => writeln!(f, "  {:<16} {:>14}  ({detail})", line.label, line.amount)?,
                None => writeln!(f, "  {:<16} {:>14}", line.label, line.amount)?,
            }
        }
        writeln!(f, "  {:<16} {:>14}", "TOTAL", self.total)?;
        let status = if self.paid { "paid" } else { "unpaid" };
        write!(f, "  Due {} ({status})", self.due_date)
    }
}

impl Receipt {
    /// Sum of line amounts; equals `total` up to rounding of the VAT split.
    pub fn line_sum(&self) -> Money {
        self.lines.iter().map(|l| l.amount).sum::<Decimal>()
    }
}
