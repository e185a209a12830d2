// Parking System - Core Library
// Slot allocation and exit billing, exposed for the CLI, API server and tests

pub mod entities;
pub mod error;
pub mod config;
pub mod allocation;    // Nearest eligible slot
pub mod billing;       // Tiered rates + returnee credit
pub mod db;            // SQLite persistence + audit trail
pub mod service;       // Atomic park / unpark

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use entities::{EntryPoint, ParkingSlot, ParkingTransaction, SizeTier, Vehicle};
pub use error::ParkingError;
pub use config::{ParkingConfig, ServerConfig};
pub use allocation::allocate;
pub use billing::{BillingEngine, ChargeBreakdown, RateSchedule};
pub use db::{
    Event, SlotSpec,
    open_database, setup_database, load_slots_csv, insert_slots,
    get_all_slots, get_available_slots, get_vehicle_transactions,
    get_events_for_entity,
};
pub use service::{ParkingService, ParkRequest, ParkOutcome, UnparkRequest, UnparkOutcome};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
