// 🚦 Parking Service - Park and unpark as atomic units
//
// park   = read available slots → allocate → insert open transaction → occupy slot
// unpark = read open transaction → compute charge → close transaction → release slot
//
// Each sequence runs inside one IMMEDIATE SQLite transaction, so the write
// lock is held from the first read to the commit. The slot and transaction
// updates are additionally conditional on the state that was read; if one
// changes no row the whole unit rolls back with `Conflict` and is retried
// up to `max_attempts` times.

use crate::allocation::allocate;
use crate::billing::{BillingEngine, ChargeBreakdown};
use crate::config::ParkingConfig;
use crate::db::{self, Event};
use crate::entities::{EntryPoint, ParkingSlot, ParkingTransaction, SizeTier, Vehicle};
use crate::error::ParkingError;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, TransactionBehavior};
use serde::{Deserialize, Serialize};

const ACTOR: &str = "parking_service";

// ============================================================================
// REQUESTS & OUTCOMES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParkRequest {
    pub vehicle_id: i64,
    pub entry_point: EntryPoint,

    /// Defaults to now
    #[serde(default)]
    pub entry_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParkOutcome {
    pub transaction_id: i64,
    pub slot: ParkingSlot,
    pub entry_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnparkRequest {
    pub slot_id: i64,

    /// When given, must match the slot's occupant
    #[serde(default)]
    pub vehicle_id: Option<i64>,

    /// Defaults to now
    #[serde(default)]
    pub exit_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnparkOutcome {
    pub transaction_id: i64,

    /// The freed slot
    pub slot: ParkingSlot,
    pub vehicle_id: i64,
    pub exit_time: DateTime<Utc>,
    pub charge: ChargeBreakdown,
}

// ============================================================================
// SERVICE
// ============================================================================

#[derive(Debug, Clone)]
pub struct ParkingService {
    entry_points: usize,
    max_attempts: u32,
    billing: BillingEngine,
}

impl ParkingService {
    pub fn new(config: &ParkingConfig) -> Self {
        ParkingService {
            entry_points: config.entry_points,
            max_attempts: config.max_attempts.max(1),
            billing: BillingEngine::new(config.rates.clone()),
        }
    }

    pub fn billing(&self) -> &BillingEngine {
        &self.billing
    }

    pub fn entry_points(&self) -> usize {
        self.entry_points
    }

    pub fn register_vehicle(&self, conn: &Connection, size: SizeTier) -> Result<Vehicle, ParkingError> {
        let vehicle = db::insert_vehicle(conn, size)?;

        let event = Event::new(
            "vehicle_registered",
            "vehicle",
            &vehicle.id.to_string(),
            serde_json::json!({ "size": vehicle.size }),
            ACTOR,
        );
        db::insert_event(conn, &event)?;

        log::info!("Registered {} vehicle {}", vehicle.size, vehicle.id);
        Ok(vehicle)
    }

    pub fn add_slot(
        &self,
        conn: &Connection,
        size: SizeTier,
        distances: &[u32],
    ) -> Result<ParkingSlot, ParkingError> {
        if distances.len() != self.entry_points {
            return Err(ParkingError::InvalidSlotLayout {
                expected: self.entry_points,
                found: distances.len(),
            });
        }

        let slot = db::insert_slot(conn, size, distances)?;

        let event = Event::new(
            "slot_added",
            "parking_slot",
            &slot.id.to_string(),
            serde_json::json!({ "size": slot.size, "distances": slot.distances }),
            ACTOR,
        );
        db::insert_event(conn, &event)?;

        Ok(slot)
    }

    pub fn slots(&self, conn: &Connection) -> Result<Vec<ParkingSlot>, ParkingError> {
        Ok(db::get_all_slots(conn)?)
    }

    /// A vehicle's transactions, most recent first
    pub fn history(
        &self,
        conn: &Connection,
        vehicle_id: i64,
    ) -> Result<Vec<ParkingTransaction>, ParkingError> {
        db::get_vehicle(conn, vehicle_id)?.ok_or(ParkingError::VehicleNotFound(vehicle_id))?;
        Ok(db::get_vehicle_transactions(conn, vehicle_id, None)?)
    }

    /// Allocate the nearest eligible slot and open a transaction for it
    pub fn park(&self, conn: &mut Connection, request: &ParkRequest) -> Result<ParkOutcome, ParkingError> {
        if request.entry_point >= self.entry_points {
            return Err(ParkingError::InvalidEntryPoint {
                entry_point: request.entry_point,
                entry_points: self.entry_points,
            });
        }

        let entry_time = request.entry_time.unwrap_or_else(Utc::now);

        self.with_retry("park", conn, |tx| self.park_once(tx, request, entry_time))
    }

    /// Bill the slot's open transaction, close it and free the slot
    pub fn unpark(
        &self,
        conn: &mut Connection,
        request: &UnparkRequest,
    ) -> Result<UnparkOutcome, ParkingError> {
        let exit_time = request.exit_time.unwrap_or_else(Utc::now);

        self.with_retry("unpark", conn, |tx| self.unpark_once(tx, request, exit_time))
    }

    fn park_once(
        &self,
        conn: &Connection,
        request: &ParkRequest,
        entry_time: DateTime<Utc>,
    ) -> Result<ParkOutcome, ParkingError> {
        let vehicle = db::get_vehicle(conn, request.vehicle_id)?
            .ok_or(ParkingError::VehicleNotFound(request.vehicle_id))?;

        if db::has_open_transaction(conn, vehicle.id)? {
            return Err(ParkingError::VehicleAlreadyParked(vehicle.id));
        }

        let candidates = db::get_available_slots(conn)?;
        let mut slot = allocate(request.entry_point, vehicle.size, &candidates)?.clone();

        let open = ParkingTransaction::open(
            vehicle.id,
            slot.id,
            vehicle.size,
            request.entry_point,
            entry_time,
        );
        let transaction_id = db::insert_transaction(conn, &open)?;

        if !db::occupy_slot(conn, slot.id, vehicle.id)? {
            return Err(ParkingError::Conflict(format!("slot {} was taken", slot.id)));
        }
        slot.occupy(vehicle.id);

        let event = Event::new(
            "vehicle_parked",
            "transaction",
            &transaction_id.to_string(),
            serde_json::json!({
                "vehicle_id": vehicle.id,
                "slot_id": slot.id,
                "entry_point": request.entry_point,
                "entry_time": entry_time.to_rfc3339(),
            }),
            ACTOR,
        );
        db::insert_event(conn, &event)?;

        log::info!(
            "Parked vehicle {} in slot {} from entry {} (transaction {})",
            vehicle.id,
            slot.id,
            request.entry_point,
            transaction_id
        );

        Ok(ParkOutcome {
            transaction_id,
            slot,
            entry_time,
        })
    }

    fn unpark_once(
        &self,
        conn: &Connection,
        request: &UnparkRequest,
        exit_time: DateTime<Utc>,
    ) -> Result<UnparkOutcome, ParkingError> {
        let mut slot = db::get_slot(conn, request.slot_id)?
            .ok_or(ParkingError::SlotNotFound(request.slot_id))?;

        let occupant = match (slot.available, slot.vehicle_id) {
            (false, Some(vehicle_id)) => vehicle_id,
            _ => return Err(ParkingError::SlotNotOccupied(slot.id)),
        };

        if let Some(vehicle_id) = request.vehicle_id {
            if vehicle_id != occupant {
                return Err(ParkingError::VehicleMismatch {
                    slot_id: slot.id,
                    vehicle_id,
                });
            }
        }

        let current = db::get_latest_slot_transaction(conn, slot.id)?
            .filter(|t| t.is_open() && t.vehicle_id == occupant)
            .ok_or(ParkingError::SlotNotOccupied(slot.id))?;

        db::get_vehicle(conn, occupant)?.ok_or(ParkingError::VehicleNotFound(occupant))?;

        // The stay right before this one, if any
        let history = db::get_vehicle_transactions(conn, occupant, Some(2))?;
        let previous = history.iter().find(|t| t.id < current.id);

        let charge = self
            .billing
            .compute_charge(slot.size, exit_time, &current, previous)?;

        let mut closed = current.clone();
        closed.close(exit_time, &charge)?;

        if !db::close_transaction(conn, &closed)? {
            return Err(ParkingError::Conflict(format!(
                "transaction {} was already closed",
                closed.id
            )));
        }
        if !db::release_slot(conn, slot.id)? {
            return Err(ParkingError::Conflict(format!("slot {} was already released", slot.id)));
        }
        slot.release();

        let event = Event::new(
            "vehicle_unparked",
            "transaction",
            &closed.id.to_string(),
            serde_json::json!({
                "vehicle_id": occupant,
                "slot_id": slot.id,
                "exit_time": exit_time.to_rfc3339(),
                "amount": charge.amount,
                "previous_payment": charge.previous_payment,
            }),
            ACTOR,
        );
        db::insert_event(conn, &event)?;

        log::info!(
            "Unparked vehicle {} from slot {}: charged {:.2}{}",
            occupant,
            slot.id,
            charge.amount,
            if charge.returnee { " (returnee)" } else { "" }
        );

        Ok(UnparkOutcome {
            transaction_id: closed.id,
            slot,
            vehicle_id: occupant,
            exit_time,
            charge,
        })
    }

    /// Run `op` in an IMMEDIATE transaction, retrying retryable failures
    fn with_retry<T, F>(&self, name: &str, conn: &mut Connection, mut op: F) -> Result<T, ParkingError>
    where
        F: FnMut(&Connection) -> Result<T, ParkingError>,
    {
        let mut attempt = 1;

        loop {
            match run_immediate(conn, &mut op) {
                Err(err) if err.is_retryable() && attempt < self.max_attempts => {
                    log::warn!(
                        "{} attempt {}/{} failed, retrying: {}",
                        name,
                        attempt,
                        self.max_attempts,
                        err
                    );
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

/// Commit on success; dropping the transaction on error rolls it back
fn run_immediate<T, F>(conn: &mut Connection, op: &mut F) -> Result<T, ParkingError>
where
    F: FnMut(&Connection) -> Result<T, ParkingError>,
{
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let value = op(&*tx)?;
    tx.commit()?;
    Ok(value)
}
