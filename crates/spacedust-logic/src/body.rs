//! Celestial body catalog: radius, science value and a simple
//! exponential atmosphere.
//!
//! Bands resolve their body by name at initialization; everything a band
//! needs afterwards (radius, atmosphere) is copied into the band so that
//! sampling never touches the catalog.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::CatalogError;

/// Atmosphere of a body, modelled as an exponential pressure profile cut
/// off at `depth`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Atmosphere {
    /// Height of the atmosphere above the surface in metres.
    pub depth: f64,
    /// Pressure at the surface in atmospheres.
    pub surface_pressure_atm: f64,
    /// Pressure scale height in metres.
    pub scale_height: f64,
    /// Air density at the surface in kg/m³.
    pub density_asl: f64,
}

impl Atmosphere {
    /// Pressure in atmospheres at `altitude` metres above the surface.
    ///
    /// Zero at or above `depth`; below the surface the surface value holds.
    pub fn pressure_atm(&self, altitude: f64) -> f64 {
        if altitude >= self.depth {
            return 0.0;
        }
        let altitude = altitude.max(0.0);
        if self.scale_height <= 0.0 {
            return self.surface_pressure_atm;
        }
        self.surface_pressure_atm * (-altitude / self.scale_height).exp()
    }

    /// Air density in kg/m³ at `altitude`, proportional to pressure.
    pub fn density(&self, altitude: f64) -> f64 {
        if self.surface_pressure_atm <= 0.0 {
            return 0.0;
        }
        self.density_asl * self.pressure_atm(altitude) / self.surface_pressure_atm
    }
}

/// A celestial body resource fields can be defined around.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CelestialBody {
    pub name: String,
    /// Mean radius in metres.
    pub radius: f64,
    /// Multiplier applied to discovery and identification science rewards.
    #[serde(default = "default_science_value")]
    pub science_value: f64,
    #[serde(default)]
    pub atmosphere: Option<Atmosphere>,
}

fn default_science_value() -> f64 {
    1.0
}

impl CelestialBody {
    /// Pressure at `altitude` metres above the surface; airless bodies are 0.
    pub fn pressure_atm(&self, altitude: f64) -> f64 {
        self.atmosphere.map_or(0.0, |a| a.pressure_atm(altitude))
    }

    /// Air density at `altitude` metres above the surface.
    pub fn air_density(&self, altitude: f64) -> f64 {
        self.atmosphere.map_or(0.0, |a| a.density(altitude))
    }
}

/// The set of bodies known to the current session.
#[derive(Debug, Clone, Default)]
pub struct BodyCatalog {
    bodies: HashMap<String, CelestialBody>,
}

impl BodyCatalog {
    pub fn new(bodies: impl IntoIterator<Item = CelestialBody>) -> Self {
        Self {
            bodies: bodies.into_iter().map(|b| (b.name.clone(), b)).collect(),
        }
    }

    /// Parse a JSON array of bodies.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let bodies: Vec<CelestialBody> = serde_json::from_str(json)?;
        let mut catalog = Self::default();
        for body in bodies {
            if catalog.bodies.contains_key(&body.name) {
                return Err(CatalogError::Duplicate { name: body.name });
            }
            catalog.bodies.insert(body.name.clone(), body);
        }
        log::info!("Loaded {} celestial bodies", catalog.bodies.len());
        Ok(catalog)
    }

    pub fn get(&self, name: &str) -> Option<&CelestialBody> {
        self.bodies.get(name)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CelestialBody> {
        self.bodies.values()
    }
}
