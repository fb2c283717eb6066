//! Background system - coarse catch-up for vessels on rails
//!
//! Each unloaded vessel is stepped once per call with all the game time
//! since its previous step, never sub-stepped. Harvest amounts are linear in
//! the step, so this matches what per-frame updates would have produced
//! under the same conditions.

use hecs::World;
use spacedust_logic::DiscoveryTracker;

use crate::components::{FlightState, Harvesters, OnRails, TelescopeModule};
use crate::session::Session;
use crate::systems::{harvest_conditions, survey};

/// Step every vessel on rails up to `now`
pub fn background_system(world: &mut World, session: &Session, tracker: &mut DiscoveryTracker, now: f64) {
    for (_, (state, rails, harvesters, telescope)) in world.query_mut::<(
        &FlightState,
        &mut OnRails,
        Option<&mut Harvesters>,
        Option<&mut TelescopeModule>,
    )>() {
        step_on_rails(state, rails, harvesters, telescope, session, tracker, now);
    }
}

/// Catch one unloaded vessel up to `now` in a single step.
///
/// Also used when a vessel leaves rails between background ticks, so the
/// time since its last step is not lost.
pub fn step_on_rails(
    state: &FlightState,
    rails: &mut OnRails,
    harvesters: Option<&mut Harvesters>,
    telescope: Option<&mut TelescopeModule>,
    session: &Session,
    tracker: &mut DiscoveryTracker,
    now: f64,
) {
    let elapsed = now - rails.last_update;
    if !(elapsed > 0.0) {
        return;
    }

    if let Some(harvesters) = harvesters {
        let conditions = harvest_conditions(session, state, false);
        for module in harvesters.0.iter_mut().filter(|m| m.enabled) {
            let report = module
                .simulator
                .process(&session.map, &conditions, 1.0, elapsed, &mut rails.inventory);
            log::debug!("Background harvest on {}: {:?}", state.body, report.status);
            module.last_report = Some(report);
        }
    }
    if let Some(telescope) = telescope {
        survey(telescope, state, session, tracker, elapsed);
    }

    rails.last_update = now;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::HarvesterModule;
    use crate::session::fixtures;
    use spacedust_logic::harvest::HarvestSimulator;
    use spacedust_logic::inventory::ResourceSink;

    #[test]
    fn test_background_steps_once_per_call() {
        let (session, mut tracker) = fixtures::session(11);
        let mut world = World::new();
        let sim = HarvestSimulator::new(fixtures::belt_harvester(), &session.densities);
        let e = world.spawn((
            fixtures::in_belt(),
            OnRails {
                inventory: fixtures::tanks(),
                last_update: 4.0,
            },
            Harvesters(vec![HarvesterModule::new(sim)]),
        ));

        background_system(&mut world, &session, &mut tracker, 14.0);
        let after_first = world.get::<&OnRails>(e).unwrap().inventory.amount("LqdHe3");
        assert!(after_first > 0.0);
        assert_eq!(world.get::<&OnRails>(e).unwrap().last_update, 14.0);

        // Same timestamp: nothing elapsed.
        background_system(&mut world, &session, &mut tracker, 14.0);
        let rails = world.get::<&OnRails>(e).unwrap();
        assert_eq!(rails.inventory.amount("LqdHe3"), after_first);
        // 10 s at 2 EC/s.
        assert_eq!(rails.inventory.amount("ElectricCharge"), 4_980.0);
    }

    #[test]
    fn test_telescope_surveys_in_background() {
        let (mut session, mut tracker) = fixtures::session(11);
        session
            .body_positions
            .insert("Mun".into(), spacedust_logic::geometry::DVec3::new(12_000_000.0, 0.0, 0.0));
        let mut world = World::new();
        let mut state = fixtures::in_belt();
        state.position = spacedust_logic::geometry::DVec3::new(700_000.0, 0.0, 0.0);
        state.altitude = 700_000.0;
        world.spawn((
            state,
            OnRails {
                inventory: fixtures::tanks(),
                last_update: 0.0,
            },
            TelescopeModule {
                enabled: true,
                target: Some("Mun".into()),
                objective_diameter: 0.5,
                field_of_view: 0.05,
                instruments: vec!["SDUVSpectrometer".into()],
                outcomes: Vec::new(),
            },
        ));

        background_system(&mut world, &session, &mut tracker, 5.0);

        assert!(tracker.is_discovered("LqdHe3", "MunExosphere", "Mun"));
        assert!(!tracker.is_identified("LqdHe3", "MunExosphere", "Mun"));
    }

    #[test]
    fn test_telescope_reports_every_instrument() {
        let (mut session, mut tracker) = fixtures::session(11);
        session
            .body_positions
            .insert("Mun".into(), spacedust_logic::geometry::DVec3::new(12_000_000.0, 0.0, 0.0));
        let mut world = World::new();
        let mut state = fixtures::in_belt();
        state.position = spacedust_logic::geometry::DVec3::new(700_000.0, 0.0, 0.0);
        state.altitude = 700_000.0;
        let e = world.spawn((
            state,
            OnRails {
                inventory: fixtures::tanks(),
                last_update: 0.0,
            },
            TelescopeModule {
                enabled: true,
                target: Some("Mun".into()),
                objective_diameter: 0.5,
                field_of_view: 0.05,
                instruments: vec![
                    "SDUVSpectrometer".into(),
                    "NoSuchInstrument".into(),
                    "SDGammaSpectrometer".into(),
                ],
                outcomes: Vec::new(),
            },
        ));

        background_system(&mut world, &session, &mut tracker, 5.0);

        let telescope = world.get::<&TelescopeModule>(e).unwrap();
        let names: Vec<&str> = telescope.outcomes.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, ["SDUVSpectrometer", "SDGammaSpectrometer"]);
    }

    #[test]
    fn test_step_skips_when_nothing_elapsed() {
        let (session, mut tracker) = fixtures::session(11);
        let sim = HarvestSimulator::new(fixtures::belt_harvester(), &session.densities);
        let mut harvesters = Harvesters(vec![HarvesterModule::new(sim)]);
        let mut rails = OnRails {
            inventory: fixtures::tanks(),
            last_update: 8.0,
        };
        let before = rails.inventory.clone();

        step_on_rails(&fixtures::in_belt(), &mut rails, Some(&mut harvesters), None, &session, &mut tracker, 8.0);
        assert_eq!(rails.inventory, before);
        assert!(harvesters.0[0].last_report.is_none());

        step_on_rails(&fixtures::in_belt(), &mut rails, Some(&mut harvesters), None, &session, &mut tracker, 9.0);
        assert_eq!(rails.last_update, 9.0);
        assert_eq!(rails.inventory.amount("ElectricCharge"), 4_998.0);
    }
}
