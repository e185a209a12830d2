// 📏 Size Tier - Ordinal classification of vehicles and slots
//
// A slot can host any vehicle of equal or smaller tier.
// Stored as an ordinal code (0, 1, 2) and exposed by name in config and JSON.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeTier {
    Small,
    Medium,
    Large,
}

impl SizeTier {
    /// Every tier, smallest first
    pub const ALL: [SizeTier; 3] = [SizeTier::Small, SizeTier::Medium, SizeTier::Large];

    /// Ordinal code as persisted in the database
    pub fn code(self) -> i64 {
        match self {
            SizeTier::Small => 0,
            SizeTier::Medium => 1,
            SizeTier::Large => 2,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        SizeTier::ALL.iter().copied().find(|tier| tier.code() == code)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SizeTier::Small => "small",
            SizeTier::Medium => "medium",
            SizeTier::Large => "large",
        }
    }

    /// Whether a slot of this tier can host a vehicle of `vehicle` tier
    pub fn fits(self, vehicle: SizeTier) -> bool {
        self >= vehicle
    }
}

impl fmt::Display for SizeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SizeTier {
    type Err = anyhow::Error;

    /// Accepts a tier name ("small", "Medium", "L") or its ordinal code ("0".."2")
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();

        if let Ok(code) = trimmed.parse::<i64>() {
            return SizeTier::from_code(code)
                .ok_or_else(|| anyhow!("Unknown size code: {}", code));
        }

        match trimmed.to_lowercase().as_str() {
            "small" | "s" => Ok(SizeTier::Small),
            "medium" | "m" => Ok(SizeTier::Medium),
            "large" | "l" => Ok(SizeTier::Large),
            other => Err(anyhow!("Unknown size tier: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_ordering() {
        assert!(SizeTier::Small < SizeTier::Medium);
        assert!(SizeTier::Medium < SizeTier::Large);
        assert!(SizeTier::Large.fits(SizeTier::Small));
        assert!(SizeTier::Medium.fits(SizeTier::Medium));
        assert!(!SizeTier::Small.fits(SizeTier::Large));
    }

    #[test]
    fn test_parse_names_and_codes() {
        assert_eq!("small".parse::<SizeTier>().unwrap(), SizeTier::Small);
        assert_eq!("Medium".parse::<SizeTier>().unwrap(), SizeTier::Medium);
        assert_eq!(" L ".parse::<SizeTier>().unwrap(), SizeTier::Large);
        assert_eq!("2".parse::<SizeTier>().unwrap(), SizeTier::Large);
        assert!("3".parse::<SizeTier>().is_err());
        assert!("huge".parse::<SizeTier>().is_err());
    }

    #[test]
    fn test_code_roundtrip_for_every_tier() {
        for tier in SizeTier::ALL {
            assert_eq!(SizeTier::from_code(tier.code()), Some(tier));
        }
        assert_eq!(SizeTier::from_code(-1), None);
    }
}
