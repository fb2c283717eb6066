//! Local scanners: discovery from the vessel's own position.
//!
//! Each scanned resource has a discover mode and an identify mode:
//!
//! | Mode | Transition fires when |
//! |------|-----------------------|
//! | `None` | never |
//! | `Local` | the band's sample here exceeds `local_threshold` |
//! | `Soi` | always, for every band at the body |
//! | `Altitude` | the vessel is within range of the band's peak altitude |
//!
//! Scanner transitions award science.

use serde::{Deserialize, Serialize};

use crate::band::ResourceBand;
use crate::discovery::DiscoveryTracker;
use crate::inventory::{ResourceSink, ELECTRIC_CHARGE};
use crate::resource_map::ResourceMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DiscoverMode {
    None,
    #[default]
    Local,
    #[serde(rename = "SOI")]
    Soi,
    Altitude,
}

/// Scanning rules for one resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScannedResource {
    pub name: String,
    pub discover_mode: DiscoverMode,
    pub identify_mode: DiscoverMode,
    pub local_threshold: f64,
    pub discover_range: f64,
    pub identify_range: f64,
}

impl Default for ScannedResource {
    fn default() -> Self {
        Self {
            name: String::new(),
            discover_mode: DiscoverMode::Local,
            identify_mode: DiscoverMode::Local,
            local_threshold: 0.01,
            discover_range: 70_000.0,
            identify_range: 30_000.0,
        }
    }
}

/// Vessel position for a scan; altitude is absolute.
#[derive(Debug, Clone, Copy)]
pub struct ScanPosition<'a> {
    pub body: &'a str,
    pub altitude: f64,
    pub latitude: f64,
    pub longitude: f64,
}

impl ScannedResource {
    fn triggers(&self, mode: DiscoverMode, range: f64, band: &ResourceBand, pos: &ScanPosition<'_>) -> bool {
        match mode {
            DiscoverMode::None => false,
            DiscoverMode::Local => {
                band.sample(pos.altitude, pos.latitude, pos.longitude) > self.local_threshold
            }
            DiscoverMode::Soi => true,
            DiscoverMode::Altitude => band.check_distance_to_center(pos.altitude, range),
        }
    }
}

/// Concentration reading for one scanned resource.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanReading {
    pub resource: String,
    pub sample: f64,
}

/// Apply every resource's discover and identify rules at `pos`.
pub fn scan_local(
    resources: &[ScannedResource],
    map: &ResourceMap,
    tracker: &mut DiscoveryTracker,
    pos: &ScanPosition<'_>,
) -> Vec<ScanReading> {
    let mut readings = Vec::with_capacity(resources.len());
    for r in resources {
        for band in map.body_distributions(pos.body, &r.name) {
            if r.triggers(r.discover_mode, r.discover_range, band, pos) {
                tracker.discover(band, true);
            }
            if r.triggers(r.identify_mode, r.identify_range, band, pos) {
                tracker.identify(band, true);
            }
        }
        readings.push(ScanReading {
            resource: r.name.clone(),
            sample: map.sample(&r.name, pos.body, pos.altitude, pos.latitude, pos.longitude),
        });
    }
    readings
}

/// A scanner part: its power draw and the resources it looks for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScannerConfig {
    /// ElectricCharge per second while running.
    pub power_cost: f64,
    pub resources: Vec<ScannedResource>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            power_cost: 1.0,
            resources: Vec::new(),
        }
    }
}

impl ScannerConfig {
    /// Pay for `dt` seconds and scan. `None` when the charge was short.
    pub fn run<S: ResourceSink + ?Sized>(
        &self,
        map: &ResourceMap,
        tracker: &mut DiscoveryTracker,
        pos: &ScanPosition<'_>,
        dt: f64,
        store: &mut S,
    ) -> Option<Vec<ScanReading>> {
        let charge = self.power_cost * dt;
        if charge > 0.0 {
            if store.amount(ELECTRIC_CHARGE) < charge {
                return None;
            }
            store.request(ELECTRIC_CHARGE, charge);
        }
        Some(scan_local(&self.resources, map, tracker, pos))
    }
}
