// 🅿️ Parking Slot Entity
//
// Invariant: vehicle_id is Some(..) iff available == false

use super::SizeTier;
use serde::{Deserialize, Serialize};

/// Index of an entry gate (0..entry_points)
pub type EntryPoint = usize;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParkingSlot {
    pub id: i64,
    pub size: SizeTier,
    pub available: bool,

    /// Occupying vehicle, None while available
    pub vehicle_id: Option<i64>,

    /// Distance to each entry point, indexed by EntryPoint
    pub distances: Vec<u32>,
}

impl ParkingSlot {
    /// New, empty slot
    pub fn new(id: i64, size: SizeTier, distances: Vec<u32>) -> Self {
        ParkingSlot {
            id,
            size,
            available: true,
            vehicle_id: None,
            distances,
        }
    }

    pub fn distance_from(&self, entry_point: EntryPoint) -> Option<u32> {
        self.distances.get(entry_point).copied()
    }

    pub fn can_host(&self, vehicle_size: SizeTier) -> bool {
        self.size.fits(vehicle_size)
    }

    /// Check the occupancy invariant
    pub fn is_consistent(&self) -> bool {
        self.available == self.vehicle_id.is_none()
    }

    pub fn occupy(&mut self, vehicle_id: i64) {
        self.available = false;
        self.vehicle_id = Some(vehicle_id);
    }

    pub fn release(&mut self) {
        self.available = true;
        self.vehicle_id = None;
    }
}
