use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::billing::allocation::{BillBreakdown, MeterReadings};
use crate::types::{Money, Units};

/// Day of the bill month from which the payment window is counted.
const DUE_ANCHOR_DAY: u32 = 28;
/// Days after the anchor before a bill is overdue; lands around the 5th of
/// the following month.
const DUE_GRACE_DAYS: i64 = 8;

/// A stored monthly bill. The breakdown is replaced wholesale when the bill
/// is edited, never patched field by field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    pub id: u64,
    pub contract_id: u64,
    pub month: NaiveDate,
    pub readings: MeterReadings,
    pub breakdown: BillBreakdown,
    #[serde(default)]
    pub paid: bool,
}

impl Bill {
    pub fn electricity_usage(&self) -> Units {
        self.breakdown.electricity_usage
    }

    pub fn water_usage(&self) -> Units {
        self.breakdown.water_usage
    }

    pub fn total(&self) -> Money {
        self.breakdown.total
    }

    pub fn due_date(&self) -> NaiveDate {
        due_date(self.month)
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.paid && today > self.due_date()
    }
}

/// Payment deadline for a bill covering `month`. Saturates at the last
/// representable date.
pub fn due_date(month: NaiveDate) -> NaiveDate {
    let anchor = month.with_day(DUE_ANCHOR_DAY).unwrap_or(month);
    anchor
        .checked_add_signed(Duration::days(DUE_GRACE_DAYS))
        .unwrap_or(NaiveDate::MAX)
}
