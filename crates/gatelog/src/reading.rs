//! Sensor reading types.
//!
//! A reading is one row of uploaded unit data, keyed by its timestamp.
//! The derived fields start unset and are filled in by the batch processor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A logical unit whose readings live in their own table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    /// Unit 1.
    Unit1,
    /// Unit 2.
    Unit2,
}

impl Unit {
    /// The storage table holding this unit's readings.
    #[must_use]
    pub fn table(self) -> &'static str {
        match self {
            Self::Unit1 => "unit1_readings",
            Self::Unit2 => "unit2_readings",
        }
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unit1 => write!(f, "unit1"),
            Self::Unit2 => write!(f, "unit2"),
        }
    }
}

/// One uploaded sensor reading.
///
/// `ts` is the natural key: uploads upsert on it, so re-uploading a
/// timestamp overwrites the earlier row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Measurement timestamp (conflict key for upserts).
    pub ts: DateTime<Utc>,

    /// High-pressure mass flow.
    pub hp_mass_flow: f64,
    /// Low-pressure mass flow.
    pub lp_mass_flow: f64,
    /// Gland/reheat steam mass flow.
    pub grs_mass_flow: f64,
    /// High-pressure line pressure.
    pub hp_pressure: f64,
    /// Low-pressure line pressure.
    pub lp_pressure: f64,

    /// Derived high-pressure enthalpy; unset until processed.
    pub hp_enthalpy: Option<f64>,
    /// Derived low-pressure enthalpy; unset until processed.
    pub lp_enthalpy: Option<f64>,
    /// Derived inlet energy; unset until processed.
    pub inlet_energy: Option<f64>,
}

impl SensorReading {
    /// A row counts as processed once its inlet energy has been written.
    #[must_use]
    pub fn is_processed(&self) -> bool {
        self.inlet_energy.is_some()
    }
}

/// The projection the batch processor fetches for each unprocessed row.
#[derive(Debug, Clone, PartialEq)]
pub struct UnprocessedReading {
    /// Storage row identifier, used for the write-back.
    pub id: i64,
    /// High-pressure mass flow.
    pub hp_mass_flow: f64,
    /// Low-pressure mass flow.
    pub lp_mass_flow: f64,
    /// High-pressure line pressure.
    pub hp_pressure: f64,
    /// Low-pressure line pressure.
    pub lp_pressure: f64,
}

/// The derived values the batch processor writes back per row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Derived {
    /// High-pressure enthalpy.
    pub hp_enthalpy: f64,
    /// Low-pressure enthalpy.
    pub lp_enthalpy: f64,
    /// Combined inlet energy.
    pub inlet_energy: f64,
}
