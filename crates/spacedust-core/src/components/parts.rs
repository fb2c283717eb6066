//! Part modules a vessel can carry.

use serde::{Deserialize, Serialize};
use spacedust_logic::harvest::{HarvestReport, HarvestSimulator};
use spacedust_logic::instrument::{Optics, ScanOutcome};
use spacedust_logic::scanner::{ScanReading, ScannerConfig};

/// One resource intake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarvesterModule {
    pub enabled: bool,
    pub simulator: HarvestSimulator,
    /// Result of the most recent tick, for display.
    #[serde(skip)]
    pub last_report: Option<HarvestReport>,
}

impl HarvesterModule {
    pub fn new(simulator: HarvestSimulator) -> Self {
        Self {
            enabled: true,
            simulator,
            last_report: None,
        }
    }
}

/// Every intake on a vessel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Harvesters(pub Vec<HarvesterModule>);

/// A local scanner part. Only runs while the vessel is loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannerModule {
    pub enabled: bool,
    pub config: ScannerConfig,
    #[serde(skip)]
    pub readings: Vec<ScanReading>,
}

impl ScannerModule {
    pub fn new(config: ScannerConfig) -> Self {
        Self {
            enabled: true,
            config,
            readings: Vec::new(),
        }
    }
}

/// A telescope with slotted instruments, surveying one target body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelescopeModule {
    pub enabled: bool,
    pub target: Option<String>,
    pub objective_diameter: f64,
    /// Radians.
    pub field_of_view: f64,
    /// Instrument names, looked up in the session catalog each tick.
    pub instruments: Vec<String>,
    /// Last survey tick, one entry per instrument found in the catalog.
    #[serde(skip)]
    pub outcomes: Vec<(String, ScanOutcome)>,
}

impl TelescopeModule {
    pub fn optics(&self) -> Optics {
        Optics {
            objective_diameter: self.objective_diameter,
            field_of_view: self.field_of_view,
        }
    }
}
