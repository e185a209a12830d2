// 💰 Billing Engine - Tiered rates with returnee grace
//
// Charge = flat_rate + excess_hours × hourly(slot tier) + excess_days × daily_rate − credit
// floored at zero.
//
// Duration is measured from the effective entry time. A "returnee" (previous
// exit within the grace window of the current entry) is billed from the
// previous entry time, and what it already paid is credited.

use crate::entities::{ParkingTransaction, SizeTier};
use crate::error::ParkingError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;
const HOURS_PER_DAY: f64 = 24.0;

/// Upper bound for `returnee_window_minutes` (one year)
pub const MAX_RETURNEE_WINDOW_MINUTES: i64 = 365 * 24 * 60;

// ============================================================================
// RATE SCHEDULE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateSchedule {
    /// Charged on every stay, covers the first `flat_hours`
    pub flat_rate: f64,

    pub flat_hours: f64,

    /// Charged per full day once a stay reaches 24 hours
    pub daily_rate: f64,

    /// Max gap between previous exit and current entry for a returnee
    pub returnee_window_minutes: i64,

    /// Hourly rate keyed by slot size tier name
    pub hourly: BTreeMap<String, f64>,
}

impl Default for RateSchedule {
    fn default() -> Self {
        let hourly = [
            (SizeTier::Small, 20.0),
            (SizeTier::Medium, 60.0),
            (SizeTier::Large, 100.0),
        ]
        .into_iter()
        .map(|(tier, rate)| (tier.as_str().to_string(), rate))
        .collect();

        RateSchedule {
            flat_rate: 40.0,
            flat_hours: 3.0,
            daily_rate: 5000.0,
            returnee_window_minutes: 60,
            hourly,
        }
    }
}

impl RateSchedule {
    pub fn hourly_rate(&self, tier: SizeTier) -> Result<f64, ParkingError> {
        self.hourly
            .get(tier.as_str())
            .copied()
            .ok_or(ParkingError::RateNotConfigured(tier))
    }

    /// Grace window, clamped to 0..=MAX_RETURNEE_WINDOW_MINUTES
    pub fn returnee_window(&self) -> Duration {
        Duration::minutes(
            self.returnee_window_minutes
                .clamp(0, MAX_RETURNEE_WINDOW_MINUTES),
        )
    }
}

// ============================================================================
// CHARGE BREAKDOWN
// ============================================================================

/// Every component of a charge, persisted with the closed transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeBreakdown {
    pub flat_rate: f64,
    pub hour_rate: f64,
    pub day_rate: f64,
    pub excess_hours: i64,
    pub excess_days: i64,
    pub excess_hour_amount: f64,
    pub excess_day_amount: f64,

    /// Credit from the previous transaction (0 unless returnee)
    pub previous_payment: f64,

    /// Final amount owed, never negative
    pub amount: f64,

    pub effective_entry_time: DateTime<Utc>,
    pub returnee: bool,
}

impl ChargeBreakdown {
    /// Charge before the returnee credit
    pub fn gross(&self) -> f64 {
        self.flat_rate + self.excess_hour_amount + self.excess_day_amount
    }
}

// ============================================================================
// BILLING ENGINE
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct BillingEngine {
    rates: RateSchedule,
}

impl BillingEngine {
    pub fn new(rates: RateSchedule) -> Self {
        BillingEngine { rates }
    }

    pub fn rates(&self) -> &RateSchedule {
        &self.rates
    }

    /// Effective entry time and credit for the current stay.
    /// The previous transaction only counts when both its times are known.
    pub fn effective_entry(
        &self,
        current_entry: DateTime<Utc>,
        previous: Option<&ParkingTransaction>,
    ) -> (DateTime<Utc>, Option<f64>) {
        let Some(prev) = previous else {
            return (current_entry, None);
        };

        match (prev.entry_time, prev.exit_time) {
            (Some(prev_entry), Some(prev_exit)) => {
                let gap = if current_entry >= prev_exit {
                    current_entry - prev_exit
                } else {
                    prev_exit - current_entry
                };
                if gap <= self.rates.returnee_window() {
                    log::debug!(
                        "Vehicle {} is a returnee (gap {} min), billing from {}",
                        prev.vehicle_id,
                        gap.num_minutes(),
                        prev_entry
                    );
                    (prev_entry, Some(prev.amount.unwrap_or(0.0)))
                } else {
                    (current_entry, None)
                }
            }
            _ => (current_entry, None),
        }
    }

    /// Compute what is owed when the vehicle of `current` leaves at `exit_time`
    pub fn compute_charge(
        &self,
        slot_size: SizeTier,
        exit_time: DateTime<Utc>,
        current: &ParkingTransaction,
        previous: Option<&ParkingTransaction>,
    ) -> Result<ChargeBreakdown, ParkingError> {
        let current_entry = current
            .entry_time
            .ok_or(ParkingError::MissingEntryTime(current.id))?;

        let (entry, credit) = self.effective_entry(current_entry, previous);

        // Compare the instants: sub-millisecond differences vanish in num_milliseconds()
        if exit_time < entry {
            return Err(ParkingError::InvalidTimeRange {
                entry,
                exit: exit_time,
            });
        }

        let hours = (exit_time - entry).num_milliseconds() as f64 / MILLIS_PER_HOUR;

        let hour_rate = self.rates.hourly_rate(slot_size)?;
        let excess_hours = self.excess_hours(hours);
        let excess_days = (hours / HOURS_PER_DAY).floor() as i64;

        let excess_hour_amount = excess_hours as f64 * hour_rate;
        let excess_day_amount = excess_days as f64 * self.rates.daily_rate;
        let previous_payment = credit.unwrap_or(0.0);

        let gross = self.rates.flat_rate + excess_hour_amount + excess_day_amount;
        let amount = (gross - previous_payment).max(0.0);

        log::debug!(
            "Charge for transaction {}: {:.2}h, {} excess hours, {} excess days, gross {:.2}, credit {:.2}, amount {:.2}",
            current.id,
            hours,
            excess_hours,
            excess_days,
            gross,
            previous_payment,
            amount
        );

        Ok(ChargeBreakdown {
            flat_rate: self.rates.flat_rate,
            hour_rate,
            day_rate: self.rates.daily_rate,
            excess_hours,
            excess_days,
            excess_hour_amount,
            excess_day_amount,
            previous_payment,
            amount,
            effective_entry_time: entry,
            returnee: credit.is_some(),
        })
    }

    /// Under a day: hours past the flat allowance.
    /// From a day on: hours past the last full day (exact multiples bill zero).
    fn excess_hours(&self, hours: f64) -> i64 {
        if hours < HOURS_PER_DAY {
            if hours <= self.rates.flat_hours {
                0
            } else {
                (hours - self.rates.flat_hours).round() as i64
            }
        } else {
            (hours % HOURS_PER_DAY).round() as i64
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
