// Entity Models
//
// Each entity carries a stable integer identity assigned by SQLite:
// - Vehicle: size tier, immutable once registered
// - ParkingSlot: size tier, occupancy and distance to every entry point
// - ParkingTransaction: one stay of one vehicle in one slot, open until unparked

pub mod size;
pub mod vehicle;
pub mod slot;
pub mod transaction;

pub use size::SizeTier;
pub use vehicle::Vehicle;
pub use slot::{EntryPoint, ParkingSlot};
pub use transaction::ParkingTransaction;
