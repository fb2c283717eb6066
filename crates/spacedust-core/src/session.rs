//! Session context - everything the systems read besides the world.
//!
//! Built once per game from the JSON documents and read-only afterwards.
//! The discovery tracker it bootstraps is handed back separately, since the
//! systems mutate it while reading the session.

use std::collections::HashMap;

use spacedust_logic::geometry::DVec3;
use spacedust_logic::harvest::ResourceCatalog;
use spacedust_logic::instrument::InstrumentCatalog;
use spacedust_logic::resource_map::LoadContext;
use spacedust_logic::{
    BodyCatalog, CatalogError, DiscoveryTracker, LoadReport, ResourceMap, Settings,
};

/// Source documents for a session.
#[derive(Debug, Clone, Copy)]
pub struct SessionData<'a> {
    pub settings: &'a str,
    pub bodies: &'a str,
    pub resources: &'a str,
    pub instruments: &'a str,
    pub densities: &'a str,
}

#[derive(Debug)]
pub struct Session {
    pub settings: Settings,
    pub bodies: BodyCatalog,
    pub map: ResourceMap,
    pub instruments: InstrumentCatalog,
    pub densities: ResourceCatalog,
    /// Body centres in the frame vessel positions use. Missing bodies sit at
    /// the origin.
    pub body_positions: HashMap<String, DVec3>,
    seed: u64,
}

impl Session {
    /// Parse every document and build the resource fields for `seed`.
    pub fn load(
        data: &SessionData<'_>,
        seed: u64,
    ) -> Result<(Self, DiscoveryTracker, LoadReport), CatalogError> {
        let settings = Settings::from_json(data.settings)?;
        let bodies = BodyCatalog::from_json(data.bodies)?;
        let instruments = InstrumentCatalog::from_json(data.instruments)?;
        let densities = ResourceCatalog::from_json(data.densities)?;

        let mut tracker = DiscoveryTracker::new(&settings);
        let ctx = LoadContext {
            bodies: &bodies,
            settings: &settings,
            game_seed: seed,
        };
        let (map, report) = ResourceMap::load_json(data.resources, &ctx, &mut tracker)?;

        Ok((
            Self {
                settings,
                bodies,
                map,
                instruments,
                densities,
                body_positions: HashMap::new(),
                seed,
            },
            tracker,
            report,
        ))
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn body_position(&self, body: &str) -> DVec3 {
        self.body_positions.get(body).copied().unwrap_or(DVec3::ZERO)
    }

    /// Static pressure at an absolute altitude over `body`; 0 without air.
    pub fn pressure_atm(&self, body: &str, altitude: f64) -> f64 {
        self.bodies
            .get(body)
            .map_or(0.0, |b| b.pressure_atm(altitude - b.radius))
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::components::FlightState;
    use spacedust_logic::harvest::{HarvestedResource, HarvesterConfig};
    use spacedust_logic::inventory::{ResourceInventory, ELECTRIC_CHARGE};
    use spacedust_logic::HarvestType;

    pub const DATA: SessionData<'static> = SessionData {
        settings: include_str!("../../../data/settings.json"),
        bodies: include_str!("../../../data/bodies.json"),
        resources: include_str!("../../../data/resources.json"),
        instruments: include_str!("../../../data/instruments.json"),
        densities: include_str!("../../../data/resource_densities.json"),
    };

    pub fn session(seed: u64) -> (Session, DiscoveryTracker) {
        let (session, tracker, _) = Session::load(&DATA, seed).unwrap();
        (session, tracker)
    }

    pub fn belt_harvester() -> HarvesterConfig {
        HarvesterConfig {
            harvest_type: HarvestType::Exosphere,
            intake_area: 4.0,
            intake_speed_static: 50.0,
            power_cost: 2.0,
            resources: vec![HarvestedResource {
                name: "LqdHe3".into(),
                base_efficiency: 0.5,
                min_harvest_value: 0.0,
            }],
            ..HarvesterConfig::default()
        }
    }

    /// Kerbin's inner belt, 400 km up.
    pub fn in_belt() -> FlightState {
        FlightState {
            orbital_velocity: DVec3::new(0.0, 2_100.0, 0.0),
            surface_velocity: DVec3::new(0.0, 1_900.0, 0.0),
            position: DVec3::new(1_000_000.0, 0.0, 0.0),
            ..FlightState::at("Kerbin", 1_000_000.0, 0.0, 30.0)
        }
    }

    pub fn tanks() -> ResourceInventory {
        ResourceInventory::new()
            .with_tank(ELECTRIC_CHARGE, 5_000.0, 5_000.0)
            .with_tank("LqdHe3", 0.0, 1.0e12)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_bundled_documents() {
        let (session, tracker, report) = Session::load(&fixtures::DATA, 7).unwrap();
        assert!(report.skipped.is_empty());
        assert_eq!(session.seed(), 7);
        assert_eq!(session.settings.background_interval, 5.0);
        assert_eq!(session.instruments.len(), 3);
        assert!(tracker.is_discovered("LqdHe3", "KerbinInnerBelt", "Kerbin"));
    }

    #[test]
    fn pressure_is_zero_without_air() {
        let (session, _) = fixtures::session(1);
        assert_eq!(session.pressure_atm("Mun", 200_000.0), 0.0);
        assert_eq!(session.pressure_atm("Kerbin", 700_000.0), 0.0);
        assert!((session.pressure_atm("Kerbin", 600_000.0) - 1.0).abs() < 1e-12);
        assert_eq!(session.pressure_atm("Nowhere", 0.0), 0.0);
    }

    #[test]
    fn bad_settings_document_is_an_error() {
        let data = SessionData {
            settings: "[]",
            ..fixtures::DATA
        };
        assert!(Session::load(&data, 1).is_err());
    }
}
