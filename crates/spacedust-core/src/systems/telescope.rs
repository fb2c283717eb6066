//! Telescope system - remote surveys, loaded or not

use hecs::World;
use spacedust_logic::instrument::{Observer, ScanTarget};
use spacedust_logic::DiscoveryTracker;

use crate::components::{FlightState, Loaded, TelescopeModule};
use crate::session::Session;

/// Point one telescope at its target for `dt` seconds.
///
/// Instruments missing from the catalog are skipped; they are reported once
/// when the vessel is spawned.
pub fn survey(
    telescope: &mut TelescopeModule,
    state: &FlightState,
    session: &Session,
    tracker: &mut DiscoveryTracker,
    dt: f64,
) {
    telescope.outcomes.clear();
    if !telescope.enabled {
        return;
    }
    let Some(target_name) = telescope.target.as_deref() else {
        return;
    };
    let (Some(main_body), Some(target_body)) = (session.bodies.get(&state.body), session.bodies.get(target_name))
    else {
        return;
    };

    let observer = Observer {
        position: state.position,
        main_body,
        main_body_position: session.body_position(&state.body),
        altitude: state.altitude - main_body.radius,
    };
    let target = ScanTarget {
        body: target_body,
        position: session.body_position(target_name),
    };
    let optics = telescope.optics();
    for (name, instrument) in telescope
        .instruments
        .iter()
        .filter_map(|name| session.instruments.get(name).map(|i| (name, i)))
    {
        let outcome = instrument.scan(
            &observer,
            &target,
            optics,
            session.settings.base_telescope_discover_rate,
            dt,
            &session.map,
            tracker,
        );
        telescope.outcomes.push((name.clone(), outcome));
    }
}

/// Survey with every loaded vessel's telescope
pub fn telescope_system(world: &mut World, session: &Session, tracker: &mut DiscoveryTracker, dt: f64) {
    for (_, (state, telescope, _)) in world.query_mut::<(&FlightState, &mut TelescopeModule, &Loaded)>() {
        survey(telescope, state, session, tracker, dt);
    }
}
