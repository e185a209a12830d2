// 🧾 Parking Transaction Entity
//
// Lifecycle: open (exit_time = None, paid = false) → closed (exit_time set, paid = true).
// Closing happens exactly once; a closed transaction is never mutated again.

use super::{EntryPoint, SizeTier};
use crate::billing::ChargeBreakdown;
use crate::error::ParkingError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParkingTransaction {
    // ========================================================================
    // IDENTITY & REFERENCES
    // ========================================================================
    pub id: i64,
    pub vehicle_id: i64,
    pub slot_id: i64,

    /// Vehicle size captured at park time
    pub vehicle_size: SizeTier,
    pub entry_point: EntryPoint,

    // ========================================================================
    // TIME
    // ========================================================================
    pub entry_time: Option<DateTime<Utc>>,
    pub exit_time: Option<DateTime<Utc>>,
    pub paid: bool,

    // ========================================================================
    // BILLING (persisted for audit, None while open)
    // ========================================================================
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flat_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hour_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excess_hour_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excess_day_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_payment: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
}

impl ParkingTransaction {
    /// New open transaction (id is assigned on insert)
    pub fn open(
        vehicle_id: i64,
        slot_id: i64,
        vehicle_size: SizeTier,
        entry_point: EntryPoint,
        entry_time: DateTime<Utc>,
    ) -> Self {
        ParkingTransaction {
            id: 0,
            vehicle_id,
            slot_id,
            vehicle_size,
            entry_point,
            entry_time: Some(entry_time),
            exit_time: None,
            paid: false,
            flat_rate: None,
            hour_rate: None,
            day_rate: None,
            excess_hour_amount: None,
            excess_day_amount: None,
            previous_payment: None,
            amount: None,
        }
    }

    pub fn is_open(&self) -> bool {
        !self.paid && self.exit_time.is_none()
    }

    /// Close with the computed charge. Fails if already closed.
    pub fn close(&mut self, exit_time: DateTime<Utc>, charge: &ChargeBreakdown) -> Result<(), ParkingError> {
        if !self.is_open() {
            return Err(ParkingError::Conflict(format!(
                "transaction {} is already closed",
                self.id
            )));
        }

        self.exit_time = Some(exit_time);
        self.paid = true;
        self.flat_rate = Some(charge.flat_rate);
        self.hour_rate = Some(charge.hour_rate);
        self.day_rate = Some(charge.day_rate);
        self.excess_hour_amount = Some(charge.excess_hour_amount);
        self.excess_day_amount = Some(charge.excess_day_amount);
        self.previous_payment = Some(charge.previous_payment);
        self.amount = Some(charge.amount);

        Ok(())
    }
}
