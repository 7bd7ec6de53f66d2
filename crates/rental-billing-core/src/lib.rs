pub mod error;
pub mod types;

#[cfg(feature = "tariff")]
pub mod tariff;

#[cfg(feature = "billing")]
pub mod lease;

#[cfg(feature = "billing")]
pub mod billing;

#[cfg(feature = "ledger")]
pub mod ledger;

pub use error::BillingError;
pub use types::*;

/// Standard result type for all rental-billing operations
pub type BillingResult<T> = Result<T, BillingError>;
