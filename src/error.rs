// ⚠️ Parking Errors
//
// Every failure is terminal for the current request except the retryable
// ones (lost optimistic check, busy database), which the service retries.

use crate::entities::{EntryPoint, SizeTier};
use chrono::{DateTime, Utc};

#[derive(thiserror::Error, Debug)]
pub enum ParkingError {
    #[error("no available parking slot for a {size} vehicle")]
    NoSlotAvailable { size: SizeTier },

    #[error("vehicle {0} not found")]
    VehicleNotFound(i64),

    #[error("parking slot {0} not found")]
    SlotNotFound(i64),

    #[error("parking slot {0} is not occupied")]
    SlotNotOccupied(i64),

    #[error("vehicle {vehicle_id} is not parked in slot {slot_id}")]
    VehicleMismatch { slot_id: i64, vehicle_id: i64 },

    #[error("vehicle {0} is already parked")]
    VehicleAlreadyParked(i64),

    #[error("entry point {entry_point} is out of range (0..{entry_points})")]
    InvalidEntryPoint {
        entry_point: EntryPoint,
        entry_points: usize,
    },

    #[error("slot layout has {found} distances, expected one per entry point ({expected})")]
    InvalidSlotLayout { expected: usize, found: usize },

    #[error("exit time {exit} is before entry time {entry}")]
    InvalidTimeRange {
        entry: DateTime<Utc>,
        exit: DateTime<Utc>,
    },

    #[error("transaction {0} has no entry time")]
    MissingEntryTime(i64),

    #[error("no hourly rate configured for {0} slots")]
    RateNotConfigured(SizeTier),

    #[error("concurrent update lost: {0}")]
    Conflict(String),

    #[error(transparent)]
    Database(#[from] rusqlite::Error),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl ParkingError {
    /// Lost optimistic checks and busy/locked databases can succeed on retry
    pub fn is_retryable(&self) -> bool {
        match self {
            ParkingError::Conflict(_) => true,
            ParkingError::Database(rusqlite::Error::SqliteFailure(err, _)) => matches!(
                err.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }

    /// Lookup failures on caller-supplied ids
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ParkingError::VehicleNotFound(_) | ParkingError::SlotNotFound(_)
        )
    }
}
