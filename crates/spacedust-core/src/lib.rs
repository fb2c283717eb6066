//! SpaceDust Core - Resource Field Session Engine
//!
//! An ECS-based session of vessels flying through procedurally placed
//! resource fields: harvesting them, scanning them locally and surveying
//! other bodies by telescope.
//!
//! # Architecture
//!
//! The simulation uses an Entity Component System (ECS) architecture via `hecs`:
//! - **Entities**: Vessels
//! - **Components**: Pure data attached to vessels (FlightState, Inventory, Harvesters, etc.)
//! - **Systems**: Logic that queries and updates components
//!
//! Loaded vessels are updated every frame. Vessels on rails are caught up
//! in one coarse step every background interval, writing to their persisted
//! inventory snapshot instead of live tanks.
//!
//! # Example
//!
//! ```rust,no_run
//! use spacedust_core::prelude::*;
//! # let data: SessionData<'static> = unimplemented!();
//!
//! let (mut engine, _report) = SimulationEngine::from_data(&data, 1234).unwrap();
//! engine.spawn_vessel(VesselSpec::new("Probe", FlightState::at("Kerbin", 700_000.0, 0.0, 0.0)));
//!
//! // Run simulation
//! loop {
//!     engine.update(1.0 / 50.0);
//! }
//! ```

pub mod components;
pub mod engine;
pub mod persistence;
pub mod session;
pub mod systems;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::engine::{SimulationEngine, VesselSpec};
    pub use crate::session::{Session, SessionData};
}
