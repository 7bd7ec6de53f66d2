pub mod bill;
pub mod book;
pub mod receipt;
pub mod summary;

pub use bill::Bill;
pub use book::BillBook;
pub use receipt::{build_receipt, Receipt};
pub use summary::{dashboard_summary, room_occupancy, DashboardSummary, RoomOccupancy};
