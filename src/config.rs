// ⚙️ Configuration - Rates and limits as data
//
// Loaded from TOML. Every field has a default, so an absent file or a
// partial one still reproduces the standard rate card:
//
//   database_path = "parking.db"
//   entry_points = 4
//   max_attempts = 3
//
//   [rates]
//   flat_rate = 40
//   flat_hours = 3
//   daily_rate = 5000
//   returnee_window_minutes = 60
//
//   [rates.hourly]
//   small = 20
//   medium = 60
//   large = 100
//
//   [server]
//   address = "0.0.0.0:3000"

use crate::billing::{RateSchedule, MAX_RETURNEE_WINDOW_MINUTES};
use crate::entities::SizeTier;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Env var naming the config file
pub const CONFIG_ENV: &str = "PARKING_CONFIG";

/// Env var overriding `database_path`
pub const DATABASE_ENV: &str = "PARKING_DB";

/// Looked up in the working directory when PARKING_CONFIG is unset
pub const DEFAULT_CONFIG_FILE: &str = "parking.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParkingConfig {
    /// SQLite database file
    pub database_path: PathBuf,

    /// Number of entry gates; every slot carries one distance per gate
    pub entry_points: usize,

    /// Attempts for park/unpark when an optimistic check is lost
    pub max_attempts: u32,

    pub rates: RateSchedule,

    pub server: ServerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            address: "0.0.0.0:3000".to_string(),
        }
    }
}

impl Default for ParkingConfig {
    fn default() -> Self {
        ParkingConfig {
            database_path: PathBuf::from("parking.db"),
            entry_points: 4,
            max_attempts: 3,
            rates: RateSchedule::default(),
            server: ServerConfig::default(),
        }
    }
}

impl ParkingConfig {
    /// Resolve config from the environment:
    /// PARKING_CONFIG file → ./parking.toml → defaults, then PARKING_DB override
    pub fn load() -> Result<Self> {
        let mut config = match env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(PathBuf::from(path))?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(DEFAULT_CONFIG_FILE)?
            }
            None => {
                log::debug!("No config file found, using defaults");
                Self::default()
            }
        };

        if let Some(db) = env::var_os(DATABASE_ENV) {
            config.database_path = PathBuf::from(db);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load config from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config = Self::from_toml(&content)
            .with_context(|| format!("Invalid config file: {:?}", path.as_ref()))?;

        log::info!("Loaded config from {:?}", path.as_ref());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: ParkingConfig = toml::from_str(content).context("Failed to parse config TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.entry_points == 0 {
            bail!("entry_points must be at least 1");
        }
        if self.max_attempts == 0 {
            bail!("max_attempts must be at least 1");
        }

        let rates = &self.rates;
        if rates.flat_rate < 0.0 || rates.daily_rate < 0.0 || rates.flat_hours < 0.0 {
            bail!("rates must not be negative");
        }
        if !(0..=MAX_RETURNEE_WINDOW_MINUTES).contains(&rates.returnee_window_minutes) {
            bail!(
                "returnee_window_minutes must be between 0 and {}",
                MAX_RETURNEE_WINDOW_MINUTES
            );
        }

        for tier in SizeTier::ALL {
            match rates.hourly.get(tier.as_str()) {
                Some(rate) if *rate < 0.0 => bail!("hourly rate for {} is negative", tier),
                Some(_) => {}
                None => bail!("missing hourly rate for {} slots", tier),
            }
        }

        Ok(())
    }
}
