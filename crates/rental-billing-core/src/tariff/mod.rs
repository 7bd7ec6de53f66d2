pub mod tiers;
pub mod water;

pub use tiers::{evaluate, PriceTier, TierSchedule};
pub use water::{water_cost, WaterTariffConfig};
