//! Harvesting: turning field samples into stored resources.
//!
//! There is exactly one formula. The foreground path calls
//! [`HarvestSimulator::process`] every physics frame with the frame timestep;
//! the background path calls it once per coarse tick with the game time
//! accumulated since the previous tick. For static inputs `k` calls with `dt`
//! and one call with `k·dt` deposit the same amount, because the amount is
//! linear in `dt` and nothing else in the formula depends on it.
//!
//! ```text
//! flow   = (|v| × clamp(alignment, 0, 1) × velocity_scale + static_speed) × area
//! amount = sample × flow × efficiency × scale × dt / density
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::band::HarvestType;
use crate::curve::FloatCurve;
use crate::error::CatalogError;
use crate::geometry::{intake_alignment, DVec3};
use crate::inventory::{ResourceSink, ELECTRIC_CHARGE};
use crate::resource_map::ResourceMap;

/// Minimum concentration worth harvesting when a config gives none.
pub const DEFAULT_MIN_HARVEST_VALUE: f64 = 0.0001;

/// One resource an intake collects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarvestedResource {
    pub name: String,
    pub base_efficiency: f64,
    #[serde(default = "default_min_harvest_value")]
    pub min_harvest_value: f64,
}

fn default_min_harvest_value() -> f64 {
    DEFAULT_MIN_HARVEST_VALUE
}

/// Static description of a harvester part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HarvesterConfig {
    pub harvest_type: HarvestType,
    /// Intake cross-section in m².
    pub intake_area: f64,
    /// Speed used when the intake is not moving, in m/s.
    pub intake_speed_static: f64,
    /// Intake effectiveness by Mach number (atmosphere only).
    pub intake_velocity_scale: FloatCurve,
    /// ElectricCharge per second while running.
    pub power_cost: f64,
    /// ElectricCharge that must remain after paying for a tick.
    pub min_res_to_leave: f64,
    pub check_occlusion: bool,
    pub resources: Vec<HarvestedResource>,
}

impl Default for HarvesterConfig {
    fn default() -> Self {
        Self {
            harvest_type: HarvestType::Atmosphere,
            intake_area: 0.0,
            intake_speed_static: 0.0,
            intake_velocity_scale: FloatCurve::constant(1.0),
            power_cost: 1.0,
            min_res_to_leave: 0.1,
            check_occlusion: true,
            resources: Vec::new(),
        }
    }
}

/// Densities (t/unit) of the resources a vessel can store.
#[derive(Debug, Clone, Default)]
pub struct ResourceCatalog {
    densities: HashMap<String, f64>,
}

#[derive(Deserialize)]
struct ResourceEntry {
    name: String,
    density: f64,
}

impl ResourceCatalog {
    pub fn new(entries: impl IntoIterator<Item = (String, f64)>) -> Self {
        Self {
            densities: entries.into_iter().collect(),
        }
    }

    /// Parse a JSON array of `{ "name", "density" }`.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let entries: Vec<ResourceEntry> = serde_json::from_str(json)?;
        let mut catalog = Self::default();
        for e in entries {
            if catalog.densities.insert(e.name.clone(), e.density).is_some() {
                return Err(CatalogError::Duplicate { name: e.name });
            }
        }
        log::info!("Loaded {} resource definitions", catalog.densities.len());
        Ok(catalog)
    }

    pub fn density(&self, name: &str) -> Option<f64> {
        self.densities.get(name).copied()
    }
}

/// Where and how the vessel is moving this tick.
#[derive(Debug, Clone, Copy)]
pub struct HarvestConditions<'a> {
    pub body: &'a str,
    /// Absolute altitude (body radius included).
    pub altitude: f64,
    pub latitude: f64,
    pub longitude: f64,
    /// Local static pressure in atmospheres.
    pub pressure_atm: f64,
    pub surface_velocity: DVec3,
    pub orbital_velocity: DVec3,
    pub mach: f64,
    /// Unit vector the intake faces. `None` assumes perfect alignment, which
    /// is what the background path uses.
    pub intake_forward: Option<DVec3>,
    /// Whether external geometry blocks the intake.
    pub occluded: bool,
}

/// Intake regime actually in effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeRegime {
    Atmosphere,
    Exosphere,
}

/// Regime a harvester of `harvest_type` operates in at `pressure_atm`, if any.
pub fn intake_regime(harvest_type: HarvestType, pressure_atm: f64) -> Option<IntakeRegime> {
    let in_atmosphere = pressure_atm > 0.0;
    match (harvest_type, in_atmosphere) {
        (HarvestType::Atmosphere, true) | (HarvestType::Omni, true) => Some(IntakeRegime::Atmosphere),
        (HarvestType::Exosphere, false) | (HarvestType::Omni, false) => Some(IntakeRegime::Exosphere),
        _ => None,
    }
}

/// Volumetric intake flow in m³/s, or `None` in the wrong regime.
pub fn intake_flow(config: &HarvesterConfig, conditions: &HarvestConditions<'_>) -> Option<f64> {
    let regime = intake_regime(config.harvest_type, conditions.pressure_atm)?;
    let (velocity, velocity_scale) = match regime {
        IntakeRegime::Atmosphere => (
            conditions.surface_velocity,
            config.intake_velocity_scale.evaluate(conditions.mach),
        ),
        IntakeRegime::Exosphere => (conditions.orbital_velocity, 1.0),
    };
    let alignment = conditions
        .intake_forward
        .map_or(1.0, |forward| intake_alignment(&velocity, &forward));
    Some((velocity.length() * alignment * velocity_scale + config.intake_speed_static) * config.intake_area)
}

/// Units harvested over `dt` seconds.
#[inline]
pub fn harvest_amount(sample: f64, flow: f64, efficiency: f64, density: f64, dt: f64) -> f64 {
    if density <= 0.0 {
        return 0.0;
    }
    sample * flow * efficiency * dt / density
}

/// Why a harvester did or did not collect anything this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarvestStatus {
    Harvesting,
    NothingToHarvest,
    NoPower,
    NeedsAtmosphere,
    NeedsVacuum,
    Blocked,
}

/// Result of one harvested resource for one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct HarvestedAmount {
    pub resource: String,
    /// Units per second at this tick's conditions.
    pub rate: f64,
    /// Units that fit in storage; the remainder was discarded.
    pub deposited: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HarvestReport {
    pub status: HarvestStatus,
    pub flow: f64,
    pub power_used: f64,
    pub harvested: Vec<HarvestedAmount>,
}

impl HarvestReport {
    fn idle(status: HarvestStatus) -> Self {
        Self {
            status,
            flow: 0.0,
            power_used: 0.0,
            harvested: Vec::new(),
        }
    }

    pub fn deposited(&self, resource: &str) -> f64 {
        self.harvested
            .iter()
            .filter(|h| h.resource == resource)
            .map(|h| h.deposited)
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ResolvedResource {
    name: String,
    base_efficiency: f64,
    min_harvest_value: f64,
    density: f64,
}

/// A harvester bound to resource densities, ready to run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarvestSimulator {
    config: HarvesterConfig,
    resources: Vec<ResolvedResource>,
}

impl HarvestSimulator {
    /// Resolve densities once. Resources without a density are logged and
    /// left out of every later tick.
    pub fn new(config: HarvesterConfig, catalog: &ResourceCatalog) -> Self {
        let resources = config
            .resources
            .iter()
            .filter_map(|r| match catalog.density(&r.name) {
                Some(density) if density > 0.0 => Some(ResolvedResource {
                    name: r.name.clone(),
                    base_efficiency: r.base_efficiency,
                    min_harvest_value: r.min_harvest_value,
                    density,
                }),
                _ => {
                    log::error!("No usable density for resource {}; it will not be harvested", r.name);
                    None
                }
            })
            .collect();
        Self { config, resources }
    }

    pub fn config(&self) -> &HarvesterConfig {
        &self.config
    }

    /// Run one tick of `dt` seconds.
    ///
    /// `scale` multiplies efficiency (1 when nothing else limits the part).
    /// Power is paid from `store` before harvesting. Charge above
    /// `min_res_to_leave` that covers only part of `dt` runs the intake for
    /// that part; with none left nothing is collected. `rate` in the report
    /// is per second at full power.
    pub fn process<S: ResourceSink + ?Sized>(
        &self,
        map: &ResourceMap,
        conditions: &HarvestConditions<'_>,
        scale: f64,
        dt: f64,
        store: &mut S,
    ) -> HarvestReport {
        if !(dt > 0.0) {
            return HarvestReport::idle(HarvestStatus::NothingToHarvest);
        }

        // Charge short of the whole step buys the matching fraction of it.
        let (power_used, powered) = if self.config.power_cost > 0.0 {
            let charge = self.config.power_cost * dt;
            let available = store.amount(ELECTRIC_CHARGE) - self.config.min_res_to_leave;
            if !(available > 0.0) {
                return HarvestReport::idle(HarvestStatus::NoPower);
            }
            let fraction = (available / charge).min(1.0);
            let wanted = charge * fraction;
            let paid = store.request(ELECTRIC_CHARGE, wanted);
            if paid < wanted - 1e-4 {
                return HarvestReport::idle(HarvestStatus::NoPower);
            }
            (paid, fraction)
        } else {
            (0.0, 1.0)
        };

        let Some(flow) = intake_flow(&self.config, conditions) else {
            let status = if conditions.pressure_atm > 0.0 {
                HarvestStatus::NeedsVacuum
            } else {
                HarvestStatus::NeedsAtmosphere
            };
            return HarvestReport {
                power_used,
                ..HarvestReport::idle(status)
            };
        };

        if self.config.check_occlusion && conditions.occluded {
            return HarvestReport {
                power_used,
                ..HarvestReport::idle(HarvestStatus::Blocked)
            };
        }

        let mut harvested = Vec::new();
        for r in &self.resources {
            let sample = map.sample(
                &r.name,
                conditions.body,
                conditions.altitude,
                conditions.latitude,
                conditions.longitude,
            );
            if sample <= r.min_harvest_value {
                continue;
            }
            let efficiency = r.base_efficiency * scale;
            let amount = harvest_amount(sample, flow, efficiency, r.density, dt * powered);
            let deposited = store.deposit(&r.name, amount);
            harvested.push(HarvestedAmount {
                resource: r.name.clone(),
                rate: harvest_amount(sample, flow, efficiency, r.density, 1.0),
                deposited,
            });
        }

        HarvestReport {
            status: if harvested.is_empty() {
                HarvestStatus::NothingToHarvest
            } else {
                HarvestStatus::Harvesting
            },
            flow,
            power_used,
            harvested,
        }
    }
}
