//! Vessel components - identity, flight state and storage.

use serde::{Deserialize, Serialize};
use spacedust_logic::geometry::DVec3;
use spacedust_logic::inventory::ResourceInventory;

/// Display name of a vessel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vessel {
    pub name: String,
}

/// Where a vessel is and how it is moving.
///
/// `altitude` is measured from the body's centre, matching what the
/// resource fields sample. `position` is in the same frame as the session's
/// body positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightState {
    pub body: String,
    pub position: DVec3,
    pub altitude: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub surface_velocity: DVec3,
    pub orbital_velocity: DVec3,
    pub mach: f64,
    /// Facing of the intakes while the vessel is loaded.
    pub intake_forward: Option<DVec3>,
    /// Set by the host when part geometry blocks the intakes.
    pub occluded: bool,
}

impl FlightState {
    /// A vessel at rest at an absolute `altitude` over `body`.
    pub fn at(body: &str, altitude: f64, latitude: f64, longitude: f64) -> Self {
        Self {
            body: body.to_string(),
            position: DVec3::ZERO,
            altitude,
            latitude,
            longitude,
            surface_velocity: DVec3::ZERO,
            orbital_velocity: DVec3::ZERO,
            mach: 0.0,
            intake_forward: None,
            occluded: false,
        }
    }
}

/// Marker: the vessel is loaded and simulated every frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loaded;

/// Live tank contents of a loaded vessel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory(pub ResourceInventory);

/// Persisted snapshot of an unloaded vessel.
///
/// Background ticks write to `inventory` and measure elapsed time from
/// `last_update`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnRails {
    pub inventory: ResourceInventory,
    pub last_update: f64,
}
