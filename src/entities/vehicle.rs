// 🚗 Vehicle Entity

use super::SizeTier;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: i64,

    /// Drives slot eligibility and, through the slot, the hourly rate
    pub size: SizeTier,

    pub created_at: DateTime<Utc>,
}
