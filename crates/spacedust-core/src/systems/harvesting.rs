//! Harvesting system - runs every intake of every loaded vessel per frame

use hecs::World;
use spacedust_logic::harvest::HarvestConditions;

use crate::components::{FlightState, Harvesters, Inventory, Loaded};
use crate::session::Session;

/// Harvest conditions for a vessel.
///
/// Unloaded vessels have no intake facing or part geometry, so the
/// background path passes `loaded = false` and gets perfect alignment with
/// nothing in the way.
pub fn harvest_conditions<'a>(session: &Session, state: &'a FlightState, loaded: bool) -> HarvestConditions<'a> {
    HarvestConditions {
        body: &state.body,
        altitude: state.altitude,
        latitude: state.latitude,
        longitude: state.longitude,
        pressure_atm: session.pressure_atm(&state.body, state.altitude),
        surface_velocity: state.surface_velocity,
        orbital_velocity: state.orbital_velocity,
        mach: state.mach,
        intake_forward: if loaded { state.intake_forward } else { None },
        occluded: loaded && state.occluded,
    }
}

/// Run one frame of `dt` seconds for every loaded vessel's intakes
pub fn harvest_system(world: &mut World, session: &Session, dt: f64) {
    for (_, (state, inventory, harvesters, _)) in
        world.query_mut::<(&FlightState, &mut Inventory, &mut Harvesters, &Loaded)>()
    {
        let conditions = harvest_conditions(session, state, true);
        for module in harvesters.0.iter_mut().filter(|m| m.enabled) {
            let report = module
                .simulator
                .process(&session.map, &conditions, 1.0, dt, &mut inventory.0);
            module.last_report = Some(report);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Inventory;
    use crate::session::fixtures;
    use spacedust_logic::geometry::DVec3;
    use spacedust_logic::harvest::{HarvestSimulator, HarvestStatus};
    use spacedust_logic::inventory::ResourceSink;

    fn spawn(world: &mut World, session: &Session, state: FlightState) -> hecs::Entity {
        let sim = HarvestSimulator::new(fixtures::belt_harvester(), &session.densities);
        world.spawn((
            state,
            Inventory(fixtures::tanks()),
            Harvesters(vec![crate::components::HarvesterModule::new(sim)]),
            Loaded,
        ))
    }

    #[test]
    fn test_harvest_fills_tanks() {
        let (session, _) = fixtures::session(3);
        let mut world = World::new();
        let e = spawn(&mut world, &session, fixtures::in_belt());

        harvest_system(&mut world, &session, 1.0);

        let harvesters = world.get::<&Harvesters>(e).unwrap();
        let report = harvesters.0[0].last_report.as_ref().unwrap();
        assert_eq!(report.status, HarvestStatus::Harvesting);
        assert!(world.get::<&Inventory>(e).unwrap().0.amount("LqdHe3") > 0.0);
    }

    #[test]
    fn test_occluded_intake_is_blocked() {
        let (session, _) = fixtures::session(3);
        let mut world = World::new();
        let state = FlightState {
            occluded: true,
            ..fixtures::in_belt()
        };
        let e = spawn(&mut world, &session, state);

        harvest_system(&mut world, &session, 1.0);

        let harvesters = world.get::<&Harvesters>(e).unwrap();
        assert_eq!(harvesters.0[0].last_report.as_ref().unwrap().status, HarvestStatus::Blocked);
        assert_eq!(world.get::<&Inventory>(e).unwrap().0.amount("LqdHe3"), 0.0);
    }

    #[test]
    fn test_background_conditions_ignore_facing() {
        let (session, _) = fixtures::session(3);
        let state = FlightState {
            intake_forward: Some(DVec3::new(1.0, 0.0, 0.0)),
            occluded: true,
            ..fixtures::in_belt()
        };
        let live = harvest_conditions(&session, &state, true);
        let rails = harvest_conditions(&session, &state, false);
        assert!(live.intake_forward.is_some() && live.occluded);
        assert!(rails.intake_forward.is_none() && !rails.occluded);
        assert_eq!(rails.pressure_atm, 0.0);
    }
}
