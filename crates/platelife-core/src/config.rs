//! Run configuration
//!
//! All tunable parameters in one place. Loaded from TOML at startup,
//! falls back to defaults if no config file exists.

use crate::error::{Error, Result};
use crate::types::{Dimensions, HEAD_CHANNELS, TIP_RACK_COLUMNS};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level run configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Plate format.
    pub plate: PlateConfig,
    /// Life-state derivation and run length.
    pub life: LifeConfig,
    /// Liquid transfer parameters.
    pub transfer: TransferConfig,
    /// Plate reader and plate transport parameters.
    pub reader: ReaderConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlateConfig {
    /// Plate rows. Bounded by the head channel count.
    pub rows: usize,
    /// Plate columns.
    pub columns: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifeConfig {
    /// Optical density above which a well counts as alive.
    pub threshold: f64,
    /// Upper bound on transfer cycles before the run stops.
    pub max_cycles: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Volume (uL) that marks a well as alive.
    pub alive_volume: f64,
    /// Maximum volume (uL) one tip can hold.
    pub tip_capacity: f64,
    /// Tip rack column the head picks from (0-based, 11 = A12:H12).
    pub tip_column: usize,
    /// Liquid height (mm) for reservoir aspirate and dispense.
    pub reservoir_liquid_height: f64,
    /// Liquid height (mm) when aspirating from wells.
    pub well_aspirate_height: f64,
    /// Liquid height (mm) when dispensing into wells. Device default if unset.
    pub well_dispense_height: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Absorbance wavelength in nm.
    pub wavelength_nm: f64,
    /// Gripper pickup distance from the plate top (mm).
    pub pickup_distance_from_top: f64,
    /// Grip directions when moving carrier -> reader.
    pub load: GripMove,
    /// Grip directions when moving reader -> carrier.
    pub unload: GripMove,
}

/// Side of the plate the gripper approaches from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GripDirection {
    Front,
    Back,
    Left,
    Right,
}

/// Gripper orientation at pickup and at drop-off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GripMove {
    pub get: GripDirection,
    pub put: GripDirection,
}

// ============================================================
// Defaults
// ============================================================

impl Default for PlateConfig {
    fn default() -> Self {
        Self { rows: HEAD_CHANNELS, columns: 12 }
    }
}

impl Default for LifeConfig {
    fn default() -> Self {
        Self { threshold: 0.3, max_cycles: 100 }
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            alive_volume: 100.0,
            tip_capacity: 1000.0,
            tip_column: 11,
            reservoir_liquid_height: 2.0,
            well_aspirate_height: 0.0,
            well_dispense_height: None,
        }
    }
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            wavelength_nm: 580.0,
            pickup_distance_from_top: 8.2,
            load: GripMove { get: GripDirection::Front, put: GripDirection::Left },
            unload: GripMove { get: GripDirection::Left, put: GripDirection::Front },
        }
    }
}

// ============================================================
// Loading
// ============================================================

impl RunConfig {
    /// Load config from a TOML file. A missing file yields defaults; a malformed one is an error.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let config: Self = toml::from_str(&content)?;
                tracing::info!("Loaded config from {}", path.display());
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write the current config as TOML (for generating a default config file).
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }

    pub fn dims(&self) -> Dimensions {
        Dimensions::new(self.plate.rows, self.plate.columns)
    }

    /// Reject values no physical run could honor.
    pub fn validate(&self) -> Result<()> {
        if self.plate.rows == 0 || self.plate.rows > HEAD_CHANNELS {
            return Err(Error::config(format!(
                "plate.rows must be in 1..={HEAD_CHANNELS}, got {}",
                self.plate.rows
            )));
        }
        if self.plate.columns == 0 {
            return Err(Error::config("plate.columns must be positive"));
        }
        if self.life.threshold.is_nan() || self.life.threshold < 0.0 {
            return Err(Error::config("life.threshold must be non-negative"));
        }
        if self.transfer.alive_volume.is_nan() || self.transfer.alive_volume <= 0.0 {
            return Err(Error::config("transfer.alive_volume must be positive"));
        }
        if self.transfer.tip_capacity < self.transfer.alive_volume {
            return Err(Error::config(format!(
                "transfer.tip_capacity ({}) is below alive_volume ({})",
                self.transfer.tip_capacity, self.transfer.alive_volume
            )));
        }
        if self.transfer.tip_column >= TIP_RACK_COLUMNS {
            return Err(Error::config(format!(
                "transfer.tip_column must be in 0..{TIP_RACK_COLUMNS}, got {}",
                self.transfer.tip_column
            )));
        }
        if self.reader.wavelength_nm.is_nan() || self.reader.wavelength_nm <= 0.0 {
            return Err(Error::config("reader.wavelength_nm must be positive"));
        }
        Ok(())
    }
}
