//! Telescope instruments: remote survey of another body.
//!
//! An instrument resolves a target body when the body's angular size is at
//! least the diffraction limit of the objective (`1.22 λ / D`). The survey
//! rate grows with how many resolution elements the target spans, scaled by
//! the instrument's sensitivity and by how much atmosphere the observer is
//! looking through.

use std::collections::HashMap;

use serde::Deserialize;

use crate::body::CelestialBody;
use crate::curve::FloatCurve;
use crate::discovery::{DiscoveryTracker, SurveyKind};
use crate::error::CatalogError;
use crate::geometry::DVec3;
use crate::resource_map::ResourceMap;

/// Air density below which the observer counts as outside the atmosphere.
const MIN_AIR_DENSITY: f64 = 1e-5;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstrumentDefinition {
    name: String,
    #[serde(default)]
    title: Option<String>,
    resource_name: String,
    #[serde(default)]
    discovers: bool,
    #[serde(default)]
    identifies: bool,
    /// Nanometres.
    wavelength: f64,
    #[serde(default)]
    sensitivity: f64,
    #[serde(default)]
    atmosphere_effect: Option<FloatCurve>,
}

/// Default attenuation by atmosphere scale.
pub fn default_atmosphere_effect() -> FloatCurve {
    FloatCurve::linear(&[(0.0, 1.0), (70_000.0, 5.0), (500_000.0, 0.0)])
}

/// A remote survey instrument. Immutable after load.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "InstrumentDefinition")]
pub struct Instrument {
    pub name: String,
    pub title: String,
    pub resource_name: String,
    pub discovers: bool,
    pub identifies: bool,
    /// Metres.
    pub wavelength: f64,
    pub sensitivity: f64,
    pub atmosphere_effect: FloatCurve,
}

impl From<InstrumentDefinition> for Instrument {
    fn from(def: InstrumentDefinition) -> Self {
        Self {
            title: def.title.unwrap_or_else(|| def.name.clone()),
            name: def.name,
            resource_name: def.resource_name,
            discovers: def.discovers,
            identifies: def.identifies,
            wavelength: def.wavelength * 1e-9,
            sensitivity: def.sensitivity,
            atmosphere_effect: def
                .atmosphere_effect
                .unwrap_or_else(default_atmosphere_effect),
        }
    }
}

/// Diffraction-limited angular resolution in radians.
pub fn angular_resolution(wavelength: f64, objective_diameter: f64) -> f64 {
    1.22 * wavelength / objective_diameter
}

/// Angular diameter in radians of a sphere of `radius` seen from `distance`.
pub fn target_angular_size(radius: f64, distance: f64) -> f64 {
    2.0 * ((2.0 * radius) / (2.0 * distance)).atan()
}

/// Relative air mass along a line of sight at `zenith_angle` radians, for
/// an observer `altitude` metres above a body of `radius` with an
/// atmosphere `depth` metres thick. 1 straight up from the surface.
pub fn air_mass(radius: f64, depth: f64, altitude: f64, zenith_angle: f64) -> f64 {
    if depth <= 0.0 {
        return 0.0;
    }
    let r = radius / depth;
    let y = altitude / depth;
    let cos_z = zenith_angle.cos();
    let inner = (r + y).powi(2) * cos_z * cos_z + 2.0 * r * (1.0 - y) - y * y + 1.0;
    inner.max(0.0).sqrt() - (r + y) * cos_z
}

/// Whether `occluder` (a sphere) leaves the line from `observer` to `target`
/// clear.
pub fn body_line_of_sight(observer: DVec3, target: DVec3, occluder: DVec3, occluder_radius: f64) -> bool {
    let to_target = target - observer;
    let to_occluder = occluder - observer;
    let dot = to_target.dot(&to_occluder);
    let horizon = to_occluder.length_squared() - occluder_radius * occluder_radius;
    // Target lies past the occluder's horizon plane.
    if dot > horizon {
        let len2 = to_target.length_squared();
        if len2 > 0.0 && dot * dot / len2 > horizon {
            return false;
        }
    }
    true
}

/// The vessel doing the observing.
#[derive(Debug, Clone, Copy)]
pub struct Observer<'a> {
    pub position: DVec3,
    /// Body whose sphere of influence the vessel is in.
    pub main_body: &'a CelestialBody,
    pub main_body_position: DVec3,
    /// Metres above the main body's surface.
    pub altitude: f64,
}

/// The body being surveyed.
#[derive(Debug, Clone, Copy)]
pub struct ScanTarget<'a> {
    pub body: &'a CelestialBody,
    pub position: DVec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScanOutcome {
    /// Target smaller than the resolution limit.
    OutOfRange,
    /// The main body blocks the target.
    Occluded,
    /// Progress added at `rate` percent per second.
    Scanning { rate: f64 },
}

/// Optical parameters of the telescope holding the instrument.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Optics {
    /// Metres.
    pub objective_diameter: f64,
    /// Radians.
    pub field_of_view: f64,
}

impl Instrument {
    /// Survey rate in percent per second, or why there is none.
    pub fn survey_rate(
        &self,
        observer: &Observer<'_>,
        target: &ScanTarget<'_>,
        optics: Optics,
        base_rate: f64,
    ) -> ScanOutcome {
        let resolution = angular_resolution(self.wavelength, optics.objective_diameter);
        let distance = observer.position.distance(&target.position);
        let size = target_angular_size(target.body.radius, distance);
        if !(size >= resolution) {
            return ScanOutcome::OutOfRange;
        }

        if observer.main_body.name != target.body.name
            && !body_line_of_sight(
                observer.position,
                target.position,
                observer.main_body_position,
                observer.main_body.radius,
            )
        {
            return ScanOutcome::Occluded;
        }

        let pixels = size.clamp(0.0, optics.field_of_view) / resolution;

        let mut atmosphere_scale = 0.0;
        if let Some(atm) = observer.main_body.atmosphere {
            if atm.density(observer.altitude) > MIN_AIR_DENSITY {
                let zenith = (observer.position - observer.main_body_position)
                    .angle_between(&(target.position - observer.main_body_position));
                atmosphere_scale = air_mass(observer.main_body.radius, atm.depth, observer.altitude, zenith)
                    * atm.depth
                    * atm.density_asl;
            }
        }

        let rate = pixels * base_rate * self.sensitivity / 100.0 * self.atmosphere_effect.evaluate(atmosphere_scale);
        ScanOutcome::Scanning { rate }
    }

    /// Survey the target for `dt` seconds, feeding the tracker.
    #[allow(clippy::too_many_arguments)]
    pub fn scan(
        &self,
        observer: &Observer<'_>,
        target: &ScanTarget<'_>,
        optics: Optics,
        base_rate: f64,
        dt: f64,
        map: &ResourceMap,
        tracker: &mut DiscoveryTracker,
    ) -> ScanOutcome {
        let outcome = self.survey_rate(observer, target, optics, base_rate);
        if let ScanOutcome::Scanning { rate } = outcome {
            let amount = rate * dt;
            if self.discovers {
                tracker.add_progress_at_body(map, SurveyKind::Discovery, &self.resource_name, &target.body.name, amount);
            }
            if self.identifies {
                tracker.add_progress_at_body(
                    map,
                    SurveyKind::Identification,
                    &self.resource_name,
                    &target.body.name,
                    amount,
                );
            }
        }
        outcome
    }
}

/// Instruments by name.
#[derive(Debug, Clone, Default)]
pub struct InstrumentCatalog {
    instruments: HashMap<String, Instrument>,
}

impl InstrumentCatalog {
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let list: Vec<Instrument> = serde_json::from_str(json)?;
        let mut catalog = Self::default();
        for inst in list {
            if catalog.instruments.contains_key(&inst.name) {
                return Err(CatalogError::Duplicate { name: inst.name });
            }
            catalog.instruments.insert(inst.name.clone(), inst);
        }
        log::info!("Loaded {} instruments", catalog.instruments.len());
        Ok(catalog)
    }

    pub fn get(&self, name: &str) -> Option<&Instrument> {
        self.instruments.get(name)
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }
}
