use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::BillingError;
use crate::types::Money;
use crate::BillingResult;

/// Lease length arithmetic counts every month as 30 days.
pub const DAYS_PER_LEASE_MONTH: i64 = 30;

/// A rentable room and its fixed monthly charges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: u64,
    pub name: String,
    /// Monthly rent
    pub rent_price: Money,
    /// Flat monthly internet fee
    #[serde(default)]
    pub internet_fee: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: u64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub room_id: u64,
}

/// A lease binding a tenant to a room for a number of months.
///
/// Deserialising validates the term and fills in a missing end date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ContractRecord")]
pub struct Contract {
    pub id: u64,
    pub tenant_id: u64,
    pub room: Room,
    pub start_date: NaiveDate,
    pub duration_months: u32,
    /// Stored end date; derived from start and duration when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    pub is_extended: bool,
}

/// Wire form of [`Contract`] before validation.
#[derive(Deserialize)]
struct ContractRecord {
    id: u64,
    tenant_id: u64,
    room: Room,
    start_date: NaiveDate,
    duration_months: u32,
    #[serde(default)]
    end_date: Option<NaiveDate>,
    #[serde(default)]
    is_extended: bool,
}

impl TryFrom<ContractRecord> for Contract {
    type Error = BillingError;

    fn try_from(record: ContractRecord) -> Result<Self, Self::Error> {
        let derived = lease_end(record.start_date, record.duration_months)?;
        let end_date = match record.end_date {
            Some(end) if end < record.start_date => {
                return Err(BillingError::InvalidInput {
                    field: "end_date".into(),
                    reason: format!("{end} is before the start date {}", record.start_date),
                });
            }
            Some(end) => end,
            None => derived,
        };
        Ok(Self {
            id: record.id,
            tenant_id: record.tenant_id,
            room: record.room,
            start_date: record.start_date,
            duration_months: record.duration_months,
            end_date: Some(end_date),
            is_extended: record.is_extended,
        })
    }
}

impl Contract {
    pub fn new(
        id: u64,
        tenant_id: u64,
        room: Room,
        start_date: NaiveDate,
        duration_months: u32,
    ) -> BillingResult<Self> {
        let end_date = lease_end(start_date, duration_months)?;
        Ok(Self {
            id,
            tenant_id,
            room,
            start_date,
            duration_months,
            end_date: Some(end_date),
            is_extended: false,
        })
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
            .or_else(|| lease_end(self.start_date, self.duration_months).ok())
            .unwrap_or(self.start_date)
    }

    /// Add `additional_months` to the lease, pushing the end date out by
    /// 30 days per month.
    pub fn extend(&mut self, additional_months: u32) -> BillingResult<NaiveDate> {
        if additional_months == 0 {
            return Err(BillingError::InvalidInput {
                field: "additional_months".into(),
                reason: "Extension must be at least one month".into(),
            });
        }
        let duration_months = self
            .duration_months
            .checked_add(additional_months)
            .ok_or_else(|| BillingError::InvalidInput {
                field: "additional_months".into(),
                reason: format!(
                    "{} + {additional_months} months exceeds the longest lease",
                    self.duration_months
                ),
            })?;
        let new_end = lease_end(self.end_date(), additional_months)?;
        self.duration_months = duration_months;
        self.end_date = Some(new_end);
        self.is_extended = true;
        Ok(new_end)
    }

    /// Replace start date and duration, recomputing the end date.
    pub fn reschedule(&mut self, start_date: NaiveDate, duration_months: u32) -> BillingResult<()> {
        let end_date = lease_end(start_date, duration_months)?;
        self.start_date = start_date;
        self.duration_months = duration_months;
        self.end_date = Some(end_date);
        Ok(())
    }

    pub fn is_active(&self, on: NaiveDate) -> bool {
        self.end_date() >= on
    }

    pub fn rent_price(&self) -> Money {
        self.room.rent_price
    }

    pub fn internet_fee(&self) -> Money {
        self.room.internet_fee
    }
}

fn lease_end(start: NaiveDate, months: u32) -> BillingResult<NaiveDate> {
    if months == 0 {
        return Err(BillingError::InvalidInput {
            field: "duration_months".into(),
            reason: "Lease duration must be at least one month".into(),
        });
    }
    Duration::try_days(DAYS_PER_LEASE_MONTH * i64::from(months))
        .and_then(|span| start.checked_add_signed(span))
        .ok_or_else(|| BillingError::DateError(format!("{months} months after {start} is out of range")))
}
