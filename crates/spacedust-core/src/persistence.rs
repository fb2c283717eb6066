//! Save/Load functionality for persisting simulation state
//!
//! Uses bincode for efficient binary serialization. Resource fields are not
//! stored: they are rebuilt from the session documents and the saved seed.
//! Vessels are serialized component by component and reconstructed on load.

use hecs::{EntityBuilder, World};
use serde::{Deserialize, Serialize};
use spacedust_logic::discovery::DiscoverySnapshot;
use spacedust_logic::{CatalogError, DiscoveryTracker};
use std::io::{Read, Write};
use thiserror::Error;

use crate::components::*;

/// Version number for save file format (increment when format changes)
const SAVE_VERSION: u32 = 1;

/// Serializable snapshot of the simulation state
#[derive(Serialize, Deserialize)]
pub struct SaveData {
    /// Save format version
    pub version: u32,
    /// Seed the resource fields were generated from
    pub seed: u64,
    /// Game time in seconds
    pub sim_time: f64,
    pub time_scale: f64,
    /// Discovery records and science granted so far
    pub discovery: DiscoverySnapshot,
    /// All vessels with their components
    pub vessels: Vec<SerializableVessel>,
}

/// All possible components for a vessel, serialized as optionals
#[derive(Serialize, Deserialize, Default)]
pub struct SerializableVessel {
    pub vessel: Option<Vessel>,
    pub flight: Option<FlightState>,
    pub loaded: Option<Loaded>,
    pub inventory: Option<Inventory>,
    pub on_rails: Option<OnRails>,
    pub harvesters: Option<Harvesters>,
    pub scanner: Option<ScannerModule>,
    pub telescope: Option<TelescopeModule>,
}

fn component<T: hecs::Component + Clone>(entity: &hecs::EntityRef<'_>) -> Option<T> {
    entity.get::<&T>().map(|c| (*c).clone())
}

/// Extract all vessels from a world into serializable form
fn serialize_vessels(world: &World) -> Vec<SerializableVessel> {
    world
        .iter()
        .map(|entity| SerializableVessel {
            vessel: component(&entity),
            flight: component(&entity),
            loaded: component(&entity),
            inventory: component(&entity),
            on_rails: component(&entity),
            harvesters: component(&entity),
            scanner: component(&entity),
            telescope: component(&entity),
        })
        .collect()
}

/// Spawn a vessel with all its components
fn spawn_vessel(world: &mut World, sv: SerializableVessel) {
    let mut builder = EntityBuilder::new();
    if let Some(c) = sv.vessel {
        builder.add(c);
    }
    if let Some(c) = sv.flight {
        builder.add(c);
    }
    if let Some(c) = sv.loaded {
        builder.add(c);
    }
    if let Some(c) = sv.inventory {
        builder.add(c);
    }
    if let Some(c) = sv.on_rails {
        builder.add(c);
    }
    if let Some(c) = sv.harvesters {
        builder.add(c);
    }
    if let Some(c) = sv.scanner {
        builder.add(c);
    }
    if let Some(c) = sv.telescope {
        builder.add(c);
    }
    world.spawn(builder.build());
}

/// Save the complete simulation to a writer
pub fn save_simulation<W: Write>(
    writer: W,
    world: &World,
    sim_time: f64,
    time_scale: f64,
    seed: u64,
    tracker: &DiscoveryTracker,
) -> Result<(), SaveError> {
    let save_data = SaveData {
        version: SAVE_VERSION,
        seed,
        sim_time,
        time_scale,
        discovery: tracker.snapshot(),
        vessels: serialize_vessels(world),
    };

    bincode::serialize_into(writer, &save_data)?;
    log::info!("Saved {} vessels at t={:.1}s", save_data.vessels.len(), sim_time);
    Ok(())
}

/// Load a simulation from a reader
pub fn load_simulation<R: Read>(reader: R) -> Result<LoadedSimulation, SaveError> {
    let save_data: SaveData = bincode::deserialize_from(reader)?;

    if save_data.version != SAVE_VERSION {
        return Err(SaveError::VersionMismatch {
            expected: SAVE_VERSION,
            found: save_data.version,
        });
    }

    let mut world = World::new();
    let count = save_data.vessels.len();
    for sv in save_data.vessels {
        spawn_vessel(&mut world, sv);
    }
    log::info!("Loaded {} vessels at t={:.1}s", count, save_data.sim_time);

    Ok(LoadedSimulation {
        world,
        seed: save_data.seed,
        sim_time: save_data.sim_time,
        time_scale: save_data.time_scale,
        discovery: save_data.discovery,
    })
}

/// Result of loading a simulation
pub struct LoadedSimulation {
    pub world: World,
    pub seed: u64,
    pub sim_time: f64,
    pub time_scale: f64,
    pub discovery: DiscoverySnapshot,
}

/// Errors that can occur during save/load
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Bincode(#[from] Box<bincode::ErrorKind>),
    #[error("Save version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
    #[error("Session data error: {0}")]
    Session(#[from] CatalogError),
}
