// 🗄️ Storage - SQLite + WAL
//
// The persistence collaborator for the engines: vehicles, slots, transactions
// and an append-only event log. All functions take a `&Connection`, so they
// run equally inside a `rusqlite::Transaction` (which derefs to one).
//
// Occupancy changes are conditional updates (`WHERE available = ?`), and
// closing a transaction is conditional on `paid = 0`. Callers learn from
// the returned bool whether they won the race.

use crate::entities::{ParkingSlot, ParkingTransaction, SizeTier, Vehicle};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// How long a writer waits on a locked database before SQLITE_BUSY
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SLOT_COLUMNS: &str = "id, size, available, vehicle_id, distances";

const TRANSACTION_COLUMNS: &str = "id, vehicle_id, slot_id, vehicle_size, entry_point,
    entry_time, exit_time, paid, flat_rate, hour_rate, day_rate,
    excess_hour_amount, excess_day_amount, previous_payment, amount";

// ============================================================================
// EVENTS (audit trail)
// ============================================================================

/// Event for audit trail: every park and unpark is recorded
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Event {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub entity_type: String,
    pub entity_id: String,
    pub data: serde_json::Value,
    pub actor: String,
}

impl Event {
    pub fn new(
        event_type: &str,
        entity_type: &str,
        entity_id: &str,
        data: serde_json::Value,
        actor: &str,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type: event_type.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            data,
            actor: actor.to_string(),
        }
    }
}

// ============================================================================
// SCHEMA
// ============================================================================

/// Open (or create) the database file with a busy timeout
pub fn open_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database: {:?}", path))?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    setup_database(&conn)?;
    Ok(conn)
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery (in-memory databases report "memory")
    let mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    log::debug!("journal_mode = {}", mode);

    conn.pragma_update(None, "foreign_keys", true)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS vehicles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            size INTEGER NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    // available = 1 exactly when vehicle_id IS NULL
    conn.execute(
        "CREATE TABLE IF NOT EXISTS parking_slots (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            size INTEGER NOT NULL,
            available INTEGER NOT NULL DEFAULT 1,
            vehicle_id INTEGER REFERENCES vehicles(id),
            distances TEXT NOT NULL,
            CHECK ((available = 1) = (vehicle_id IS NULL))
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            vehicle_id INTEGER NOT NULL REFERENCES vehicles(id),
            slot_id INTEGER NOT NULL REFERENCES parking_slots(id),
            vehicle_size INTEGER NOT NULL,
            entry_point INTEGER NOT NULL,
            entry_time TEXT,
            exit_time TEXT,
            paid INTEGER NOT NULL DEFAULT 0,
            flat_rate REAL,
            hour_rate REAL,
            day_rate REAL,
            excess_hour_amount REAL,
            excess_day_amount REAL,
            previous_payment REAL,
            amount REAL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            timestamp TEXT NOT NULL,
            event_type TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            data TEXT NOT NULL,
            actor TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_slots_available ON parking_slots(available)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_transactions_vehicle ON transactions(vehicle_id, id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_transactions_slot ON transactions(slot_id, id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_entity ON events(entity_type, entity_id)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// ROW MAPPING
// ============================================================================

fn size_column(row: &Row, idx: usize) -> rusqlite::Result<SizeTier> {
    let code: i64 = row.get(idx)?;
    SizeTier::from_code(code).ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, code))
}

fn time_column(row: &Row, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let text: Option<String> = row.get(idx)?;
    text.map(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

fn slot_from_row(row: &Row) -> rusqlite::Result<ParkingSlot> {
    let distances_json: String = row.get(4)?;
    let distances: Vec<u32> = serde_json::from_str(&distances_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;

    Ok(ParkingSlot {
        id: row.get(0)?,
        size: size_column(row, 1)?,
        available: row.get(2)?,
        vehicle_id: row.get(3)?,
        distances,
    })
}

fn transaction_from_row(row: &Row) -> rusqlite::Result<ParkingTransaction> {
    let entry_point: i64 = row.get(4)?;

    Ok(ParkingTransaction {
        id: row.get(0)?,
        vehicle_id: row.get(1)?,
        slot_id: row.get(2)?,
        vehicle_size: size_column(row, 3)?,
        entry_point: usize::try_from(entry_point)
            .map_err(|_| rusqlite::Error::IntegralValueOutOfRange(4, entry_point))?,
        entry_time: time_column(row, 5)?,
        exit_time: time_column(row, 6)?,
        paid: row.get(7)?,
        flat_rate: row.get(8)?,
        hour_rate: row.get(9)?,
        day_rate: row.get(10)?,
        excess_hour_amount: row.get(11)?,
        excess_day_amount: row.get(12)?,
        previous_payment: row.get(13)?,
        amount: row.get(14)?,
    })
}

fn vehicle_from_row(row: &Row) -> rusqlite::Result<Vehicle> {
    Ok(Vehicle {
        id: row.get(0)?,
        size: size_column(row, 1)?,
        created_at: time_column(row, 2)?.unwrap_or_else(Utc::now),
    })
}

// ============================================================================
// VEHICLES
// ============================================================================

pub fn insert_vehicle(conn: &Connection, size: SizeTier) -> Result<Vehicle> {
    let created_at = Utc::now();

    conn.execute(
        "INSERT INTO vehicles (size, created_at) VALUES (?1, ?2)",
        params![size.code(), created_at.to_rfc3339()],
    )?;

    Ok(Vehicle {
        id: conn.last_insert_rowid(),
        size,
        created_at,
    })
}

pub fn get_vehicle(conn: &Connection, id: i64) -> Result<Option<Vehicle>> {
    let vehicle = conn
        .query_row(
            "SELECT id, size, created_at FROM vehicles WHERE id = ?1",
            [id],
            vehicle_from_row,
        )
        .optional()?;

    Ok(vehicle)
}

// ============================================================================
// PARKING SLOTS
// ============================================================================

pub fn insert_slot(conn: &Connection, size: SizeTier, distances: &[u32]) -> Result<ParkingSlot> {
    let distances_json = serde_json::to_string(distances)?;

    conn.execute(
        "INSERT INTO parking_slots (size, available, vehicle_id, distances) VALUES (?1, 1, NULL, ?2)",
        params![size.code(), distances_json],
    )?;

    Ok(ParkingSlot::new(conn.last_insert_rowid(), size, distances.to_vec()))
}

pub fn get_slot(conn: &Connection, id: i64) -> Result<Option<ParkingSlot>> {
    let slot = conn
        .query_row(
            &format!("SELECT {} FROM parking_slots WHERE id = ?1", SLOT_COLUMNS),
            [id],
            slot_from_row,
        )
        .optional()?;

    Ok(slot)
}

pub fn get_all_slots(conn: &Connection) -> Result<Vec<ParkingSlot>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM parking_slots ORDER BY id",
        SLOT_COLUMNS
    ))?;

    let slots = stmt
        .query_map([], slot_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(slots)
}

/// Available slots in id order (the allocation scan order)
pub fn get_available_slots(conn: &Connection) -> Result<Vec<ParkingSlot>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM parking_slots WHERE available = 1 ORDER BY id",
        SLOT_COLUMNS
    ))?;

    let slots = stmt
        .query_map([], slot_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(slots)
}

/// Mark a slot occupied if it is still available. Returns false if another
/// writer got there first.
pub fn occupy_slot(conn: &Connection, slot_id: i64, vehicle_id: i64) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE parking_slots SET available = 0, vehicle_id = ?2
         WHERE id = ?1 AND available = 1",
        params![slot_id, vehicle_id],
    )?;

    Ok(changed == 1)
}

/// Mark a slot available if it is still occupied
pub fn release_slot(conn: &Connection, slot_id: i64) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE parking_slots SET available = 1, vehicle_id = NULL
         WHERE id = ?1 AND available = 0",
        [slot_id],
    )?;

    Ok(changed == 1)
}

pub fn count_available_slots(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM parking_slots WHERE available = 1",
        [],
        |row| row.get(0),
    )?;

    Ok(count)
}

// ============================================================================
// TRANSACTIONS
// ============================================================================

/// Insert an open transaction, returns its id
pub fn insert_transaction(conn: &Connection, tx: &ParkingTransaction) -> Result<i64> {
    conn.execute(
        "INSERT INTO transactions (
            vehicle_id, slot_id, vehicle_size, entry_point, entry_time, paid
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            tx.vehicle_id,
            tx.slot_id,
            tx.vehicle_size.code(),
            tx.entry_point as i64,
            tx.entry_time.map(|dt| dt.to_rfc3339()),
            tx.paid,
        ],
    )?;

    Ok(conn.last_insert_rowid())
}

/// Persist a closed transaction with its breakdown. Returns false if the
/// row was already paid.
pub fn close_transaction(conn: &Connection, tx: &ParkingTransaction) -> Result<bool> {
    if tx.is_open() {
        bail!("Transaction {} has not been closed", tx.id);
    }

    let changed = conn.execute(
        "UPDATE transactions
         SET exit_time = ?2, paid = 1,
             flat_rate = ?3, hour_rate = ?4, day_rate = ?5,
             excess_hour_amount = ?6, excess_day_amount = ?7,
             previous_payment = ?8, amount = ?9
         WHERE id = ?1 AND paid = 0",
        params![
            tx.id,
            tx.exit_time.map(|dt| dt.to_rfc3339()),
            tx.flat_rate,
            tx.hour_rate,
            tx.day_rate,
            tx.excess_hour_amount,
            tx.excess_day_amount,
            tx.previous_payment,
            tx.amount,
        ],
    )?;

    Ok(changed == 1)
}

/// A vehicle's transactions, most recent first. Row ids follow creation order.
pub fn get_vehicle_transactions(
    conn: &Connection,
    vehicle_id: i64,
    limit: Option<usize>,
) -> Result<Vec<ParkingTransaction>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM transactions WHERE vehicle_id = ?1 ORDER BY id DESC LIMIT ?2",
        TRANSACTION_COLUMNS
    ))?;

    // SQLite treats a negative LIMIT as unbounded
    let limit = limit.map(|l| l as i64).unwrap_or(-1);

    let transactions = stmt
        .query_map(params![vehicle_id, limit], transaction_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(transactions)
}

pub fn get_latest_slot_transaction(
    conn: &Connection,
    slot_id: i64,
) -> Result<Option<ParkingTransaction>> {
    let tx = conn
        .query_row(
            &format!(
                "SELECT {} FROM transactions WHERE slot_id = ?1 ORDER BY id DESC LIMIT 1",
                TRANSACTION_COLUMNS
            ),
            [slot_id],
            transaction_from_row,
        )
        .optional()?;

    Ok(tx)
}

pub fn has_open_transaction(conn: &Connection, vehicle_id: i64) -> Result<bool> {
    let open: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM transactions WHERE vehicle_id = ?1 AND paid = 0)",
        [vehicle_id],
        |row| row.get(0),
    )?;

    Ok(open)
}

// ============================================================================
// SLOT IMPORT (CSV)
// ============================================================================

/// Slot definition read from a layout file
#[derive(Debug, Clone, PartialEq)]
pub struct SlotSpec {
    pub size: SizeTier,
    pub distances: Vec<u32>,
}

/// Read a slot layout CSV: a `size` column, then one distance per entry point
///
/// ```text
/// size,entry_a,entry_b,entry_c,entry_d
/// small,1,4,6,9
/// large,3,2,2,7
/// ```
pub fn load_slots_csv(csv_path: &Path, entry_points: usize) -> Result<Vec<SlotSpec>> {
    let mut rdr = csv::Reader::from_path(csv_path).context("Failed to open slot CSV file")?;

    let mut specs = Vec::new();

    for (line, result) in rdr.records().enumerate() {
        let record = result.context("Failed to read slot record")?;
        // Header is line 1
        let line = line + 2;

        let size: SizeTier = record
            .get(0)
            .context("Missing size column")?
            .parse()
            .with_context(|| format!("Invalid size on line {}", line))?;

        let distances = record
            .iter()
            .skip(1)
            .map(|field| field.trim().parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Invalid distance on line {}", line))?;

        if distances.len() != entry_points {
            bail!(
                "Line {} has {} distances, expected one per entry point ({})",
                line,
                distances.len(),
                entry_points
            );
        }

        specs.push(SlotSpec { size, distances });
    }

    Ok(specs)
}

/// Insert every slot of a layout, returns how many were added.
/// All or nothing: a failing row rolls back the whole layout.
pub fn insert_slots(conn: &Connection, specs: &[SlotSpec]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;

    for spec in specs {
        let slot = insert_slot(&tx, spec.size, &spec.distances)?;

        let event = Event::new(
            "slot_added",
            "parking_slot",
            &slot.id.to_string(),
            serde_json::json!({
                "size": slot.size,
                "distances": slot.distances,
            }),
            "slot_importer",
        );
        insert_event(&tx, &event)?;
    }

    tx.commit()?;
    log::info!("Inserted {} parking slots", specs.len());
    Ok(specs.len())
}

// ============================================================================
// EVENT LOG
// ============================================================================

/// Insert event into audit trail
pub fn insert_event(conn: &Connection, event: &Event) -> Result<()> {
    let data_json = serde_json::to_string(&event.data)?;

    conn.execute(
        "INSERT INTO events (
            event_id, timestamp, event_type, entity_type, entity_id, data, actor
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            event.event_id,
            event.timestamp.to_rfc3339(),
            event.event_type,
            event.entity_type,
            event.entity_id,
            data_json,
            event.actor,
        ],
    )?;

    Ok(())
}

/// Get events for a specific entity, oldest first
pub fn get_events_for_entity(
    conn: &Connection,
    entity_type: &str,
    entity_id: &str,
) -> Result<Vec<Event>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, timestamp, event_type, entity_type, entity_id, data, actor
         FROM events
         WHERE entity_type = ?1 AND entity_id = ?2
         ORDER BY id",
    )?;

    let events = stmt
        .query_map(params![entity_type, entity_id], |row| {
            let data_json: String = row.get(5)?;

            Ok(Event {
                event_id: row.get(0)?,
                timestamp: time_column(row, 1)?.unwrap_or_else(Utc::now),
                event_type: row.get(2)?,
                entity_type: row.get(3)?,
                entity_id: row.get(4)?,
                data: serde_json::from_str(&data_json).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e))
                })?,
                actor: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs;

    fn test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    #[test]
    fn test_setup_is_idempotent() {
        let conn = test_db();
        setup_database(&conn).unwrap();
        assert_eq!(count_available_slots(&conn).unwrap(), 0);
    }

    #[test]
    fn test_slot_roundtrip_and_availability() {
        let conn = test_db();
        let vehicle = insert_vehicle(&conn, SizeTier::Small).unwrap();
        let a = insert_slot(&conn, SizeTier::Small, &[1, 2, 3, 4]).unwrap();
        let b = insert_slot(&conn, SizeTier::Large, &[4, 3, 2, 1]).unwrap();

        assert_eq!(get_slot(&conn, a.id).unwrap(), Some(a.clone()));
        assert_eq!(get_available_slots(&conn).unwrap().len(), 2);

        assert!(occupy_slot(&conn, a.id, vehicle.id).unwrap());
        // Second occupy loses the optimistic check
        assert!(!occupy_slot(&conn, a.id, vehicle.id).unwrap());

        let available = get_available_slots(&conn).unwrap();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].id, b.id);

        let occupied = get_slot(&conn, a.id).unwrap().unwrap();
        assert!(!occupied.available);
        assert_eq!(occupied.vehicle_id, Some(vehicle.id));

        assert!(release_slot(&conn, a.id).unwrap());
        assert!(!release_slot(&conn, a.id).unwrap());
        assert_eq!(count_available_slots(&conn).unwrap(), 2);
    }

    #[test]
    fn test_missing_rows() {
        let conn = test_db();
        assert_eq!(get_slot(&conn, 42).unwrap(), None);
        assert_eq!(get_vehicle(&conn, 42).unwrap(), None);
        assert_eq!(get_latest_slot_transaction(&conn, 42).unwrap(), None);
    }

    #[test]
    fn test_transactions_most_recent_first() {
        let conn = test_db();
        let vehicle = insert_vehicle(&conn, SizeTier::Medium).unwrap();
        let slot = insert_slot(&conn, SizeTier::Medium, &[1, 1, 1, 1]).unwrap();
        let entry = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();

        let mut ids = Vec::new();
        for hour in 0..3 {
            let tx = ParkingTransaction::open(
                vehicle.id,
                slot.id,
                vehicle.size,
                hour as usize,
                entry + chrono::Duration::hours(hour),
            );
            ids.push(insert_transaction(&conn, &tx).unwrap());
        }

        let latest_two = get_vehicle_transactions(&conn, vehicle.id, Some(2)).unwrap();
        assert_eq!(latest_two.len(), 2);
        assert_eq!(latest_two[0].id, ids[2]);
        assert_eq!(latest_two[1].id, ids[1]);
        assert_eq!(latest_two[0].entry_point, 2);
        assert_eq!(latest_two[0].entry_time, Some(entry + chrono::Duration::hours(2)));

        let all = get_vehicle_transactions(&conn, vehicle.id, None).unwrap();
        assert_eq!(all.len(), 3);
        assert!(has_open_transaction(&conn, vehicle.id).unwrap());

        let latest = get_latest_slot_transaction(&conn, slot.id).unwrap().unwrap();
        assert_eq!(latest.id, ids[2]);
        assert!(latest.is_open());
    }

    #[test]
    fn test_close_transaction_once() {
        let conn = test_db();
        let vehicle = insert_vehicle(&conn, SizeTier::Small).unwrap();
        let slot = insert_slot(&conn, SizeTier::Small, &[1, 1, 1, 1]).unwrap();
        let entry = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();

        let mut tx = ParkingTransaction::open(vehicle.id, slot.id, vehicle.size, 0, entry);
        tx.id = insert_transaction(&conn, &tx).unwrap();

        // Open transactions cannot be persisted as closed
        assert!(close_transaction(&conn, &tx).is_err());

        tx.exit_time = Some(entry + chrono::Duration::hours(1));
        tx.paid = true;
        tx.flat_rate = Some(40.0);
        tx.amount = Some(40.0);

        assert!(close_transaction(&conn, &tx).unwrap());
        assert!(!close_transaction(&conn, &tx).unwrap());

        let stored = get_latest_slot_transaction(&conn, slot.id).unwrap().unwrap();
        assert!(stored.paid);
        assert_eq!(stored.amount, Some(40.0));
        assert_eq!(stored.exit_time, tx.exit_time);
        assert!(!has_open_transaction(&conn, vehicle.id).unwrap());
    }

    #[test]
    fn test_load_slots_csv() {
        let path = std::env::temp_dir().join(format!("slots-{}.csv", uuid::Uuid::new_v4()));
        fs::write(
            &path,
            "size,entry_a,entry_b,entry_c,entry_d\nsmall,1,4,6,9\n2,3,2,2,7\n",
        )
        .unwrap();

        let specs = load_slots_csv(&path, 4).unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].size, SizeTier::Small);
        assert_eq!(specs[1].size, SizeTier::Large);
        assert_eq!(specs[1].distances, vec![3, 2, 2, 7]);

        // Wrong number of entry points
        assert!(load_slots_csv(&path, 3).is_err());

        let conn = test_db();
        assert_eq!(insert_slots(&conn, &specs).unwrap(), 2);
        assert_eq!(get_all_slots(&conn).unwrap().len(), 2);

        let events = get_events_for_entity(&conn, "parking_slot", "1").unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "slot_added");

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_insert_slots_is_all_or_nothing() {
        let conn = test_db();
        conn.execute_batch(
            "CREATE TRIGGER single_slot BEFORE INSERT ON parking_slots
             WHEN (SELECT COUNT(*) FROM parking_slots) >= 1
             BEGIN SELECT RAISE(ABORT, 'layout full'); END;",
        )
        .unwrap();

        let specs = vec![
            SlotSpec { size: SizeTier::Small, distances: vec![1, 2, 3, 4] },
            SlotSpec { size: SizeTier::Large, distances: vec![4, 3, 2, 1] },
        ];

        assert!(insert_slots(&conn, &specs).is_err());
        assert!(get_all_slots(&conn).unwrap().is_empty());
        assert!(get_events_for_entity(&conn, "parking_slot", "1").unwrap().is_empty());
    }

    #[test]
    fn test_event_log() {
        let conn = test_db();

        let event = Event::new(
            "test_event",
            "transaction",
            "test_id_123",
            serde_json::json!({"test": "data"}),
            "test_actor",
        );

        insert_event(&conn, &event).unwrap();

        let events = get_events_for_entity(&conn, "transaction", "test_id_123").unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "test_event");
        assert_eq!(events[0].actor, "test_actor");
        assert_eq!(events[0].data, serde_json::json!({"test": "data"}));
    }
}
