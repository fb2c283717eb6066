//! Scanner system - local discovery for loaded vessels

use hecs::World;
use spacedust_logic::scanner::ScanPosition;
use spacedust_logic::DiscoveryTracker;

use crate::components::{FlightState, Inventory, Loaded, ScannerModule};
use crate::session::Session;

/// Pay for and run every enabled scanner for `dt` seconds
pub fn scanner_system(world: &mut World, session: &Session, tracker: &mut DiscoveryTracker, dt: f64) {
    for (_, (state, inventory, scanner, _)) in
        world.query_mut::<(&FlightState, &mut Inventory, &mut ScannerModule, &Loaded)>()
    {
        if !scanner.enabled {
            continue;
        }
        let pos = ScanPosition {
            body: &state.body,
            altitude: state.altitude,
            latitude: state.latitude,
            longitude: state.longitude,
        };
        match scanner.config.run(&session.map, tracker, &pos, dt, &mut inventory.0) {
            Some(readings) => scanner.readings = readings,
            None => scanner.readings.clear(),
        }
    }
}
