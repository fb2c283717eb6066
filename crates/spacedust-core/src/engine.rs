//! Simulation engine - main entry point for running a session

use hecs::{Entity, EntityBuilder, World};
use spacedust_logic::harvest::{HarvestSimulator, HarvesterConfig};
use spacedust_logic::inventory::ResourceInventory;
use spacedust_logic::scanner::ScannerConfig;
use spacedust_logic::{CatalogError, DiscoveryEvent, DiscoveryTracker, LoadReport};

use crate::components::*;
use crate::session::{Session, SessionData};
use crate::systems::*;

/// Everything needed to put a new vessel into the world.
#[derive(Debug, Clone)]
pub struct VesselSpec {
    pub name: String,
    pub state: FlightState,
    pub inventory: ResourceInventory,
    pub harvesters: Vec<HarvesterConfig>,
    pub scanner: Option<ScannerConfig>,
    pub telescope: Option<TelescopeModule>,
}

impl VesselSpec {
    pub fn new(name: &str, state: FlightState) -> Self {
        Self {
            name: name.to_string(),
            state,
            inventory: ResourceInventory::new(),
            harvesters: Vec::new(),
            scanner: None,
            telescope: None,
        }
    }
}

/// Main simulation engine
pub struct SimulationEngine {
    /// ECS world containing all vessels
    pub world: World,
    /// Game time in seconds since the session started
    pub sim_time: f64,
    /// Catalogs and resource fields
    pub session: Session,
    /// Discovery state for every band
    pub tracker: DiscoveryTracker,

    last_background_update: f64,
    time_scale: f64,
}

impl SimulationEngine {
    /// Create an empty simulation around a loaded session
    pub fn new(session: Session, tracker: DiscoveryTracker) -> Self {
        Self {
            world: World::new(),
            sim_time: 0.0,
            session,
            tracker,
            last_background_update: 0.0,
            time_scale: 1.0,
        }
    }

    /// Load the session documents and start an empty simulation
    pub fn from_data(data: &SessionData<'_>, seed: u64) -> Result<(Self, LoadReport), CatalogError> {
        let (session, tracker, report) = Session::load(data, seed)?;
        Ok((Self::new(session, tracker), report))
    }

    /// Add a loaded vessel
    pub fn spawn_vessel(&mut self, spec: VesselSpec) -> Entity {
        let mut builder = EntityBuilder::new();
        builder.add(Vessel { name: spec.name.clone() });
        builder.add(spec.state);
        builder.add(Inventory(spec.inventory));
        builder.add(Loaded);

        if !spec.harvesters.is_empty() {
            let modules = spec
                .harvesters
                .into_iter()
                .map(|config| HarvesterModule::new(HarvestSimulator::new(config, &self.session.densities)))
                .collect();
            builder.add(Harvesters(modules));
        }
        if let Some(config) = spec.scanner {
            builder.add(ScannerModule::new(config));
        }
        if let Some(telescope) = spec.telescope {
            for name in &telescope.instruments {
                if self.session.instruments.get(name).is_none() {
                    log::error!("Vessel {} carries unknown instrument {}", spec.name, name);
                }
            }
            builder.add(telescope);
        }

        let entity = self.world.spawn(builder.build());
        log::info!("Spawned vessel {}", spec.name);
        entity
    }

    /// Update the simulation by delta_seconds of real time
    pub fn update(&mut self, delta_seconds: f64) {
        let dt = delta_seconds * self.time_scale;
        if !(dt > 0.0) {
            return;
        }
        self.sim_time += dt;

        // Loaded vessels: every frame
        harvest_system(&mut self.world, &self.session, dt);
        scanner_system(&mut self.world, &self.session, &mut self.tracker, dt);
        telescope_system(&mut self.world, &self.session, &mut self.tracker, dt);

        // Vessels on rails: every background interval
        let interval = self.session.settings.background_interval.max(0.0);
        if self.sim_time - self.last_background_update >= interval {
            background_system(&mut self.world, &self.session, &mut self.tracker, self.sim_time);
            self.last_background_update = self.sim_time;
        }
    }

    /// Unload a vessel. Its live inventory becomes the persisted snapshot and
    /// background time starts counting now. Returns false if the vessel is
    /// unknown or already on rails.
    pub fn go_on_rails(&mut self, vessel: Entity) -> bool {
        let Ok(inventory) = self.world.remove_one::<Inventory>(vessel) else {
            log::warn!("Cannot put {:?} on rails: not a loaded vessel", vessel);
            return false;
        };
        let _ = self.world.remove_one::<Loaded>(vessel);
        let rails = OnRails {
            inventory: inventory.0,
            last_update: self.sim_time,
        };
        self.world.insert_one(vessel, rails).is_ok()
    }

    /// Load a vessel, restoring its live inventory from the snapshot.
    /// Time since its last background step is settled first.
    /// Returns false if the vessel is unknown or already loaded.
    pub fn go_off_rails(&mut self, vessel: Entity) -> bool {
        if let Ok((state, rails, harvesters, telescope)) = self.world.query_one_mut::<(
            &FlightState,
            &mut OnRails,
            Option<&mut Harvesters>,
            Option<&mut TelescopeModule>,
        )>(vessel)
        {
            step_on_rails(state, rails, harvesters, telescope, &self.session, &mut self.tracker, self.sim_time);
        }
        let Ok(rails) = self.world.remove_one::<OnRails>(vessel) else {
            log::warn!("Cannot take {:?} off rails: not an unloaded vessel", vessel);
            return false;
        };
        self.world.insert(vessel, (Inventory(rails.inventory), Loaded)).is_ok()
    }

    pub fn is_loaded(&self, vessel: Entity) -> bool {
        self.world.get::<&Loaded>(vessel).is_ok()
    }

    /// Current contents of a vessel's tanks, loaded or not
    pub fn inventory(&self, vessel: Entity) -> Option<ResourceInventory> {
        if let Ok(inv) = self.world.get::<&Inventory>(vessel) {
            return Some(inv.0.clone());
        }
        self.world
            .get::<&OnRails>(vessel)
            .ok()
            .map(|rails| rails.inventory.clone())
    }

    /// Replace a vessel's flight state, e.g. after the host moved it
    pub fn set_flight_state(&mut self, vessel: Entity, state: FlightState) -> bool {
        match self.world.get::<&mut FlightState>(vessel) {
            Ok(mut current) => {
                *current = state;
                true
            }
            Err(_) => false,
        }
    }

    /// Take the discovery notifications raised since the last call
    pub fn drain_events(&mut self) -> Vec<DiscoveryEvent> {
        self.tracker.drain_events()
    }

    /// Set time scale (1.0 = real-time, 2.0 = 2x speed, etc.)
    pub fn set_time_scale(&mut self, scale: f64) {
        self.time_scale = scale.max(0.0);
    }

    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    pub fn vessel_count(&self) -> usize {
        self.world.query::<&Vessel>().iter().count()
    }

    pub fn loaded_count(&self) -> usize {
        self.world.query::<(&Vessel, &Loaded)>().iter().count()
    }

    /// Save simulation state to a writer
    pub fn save<W: std::io::Write>(&self, writer: W) -> Result<(), crate::persistence::SaveError> {
        crate::persistence::save_simulation(
            writer,
            &self.world,
            self.sim_time,
            self.time_scale,
            self.session.seed(),
            &self.tracker,
        )
    }

    /// Load a saved simulation, rebuilding the session from `data` with the
    /// saved seed so every band comes back where it was
    pub fn load<R: std::io::Read>(
        reader: R,
        data: &SessionData<'_>,
    ) -> Result<Self, crate::persistence::SaveError> {
        let loaded = crate::persistence::load_simulation(reader)?;
        let (session, mut tracker, _) = Session::load(data, loaded.seed)?;

        tracker.restore(loaded.discovery);
        // Bands flagged always-discovered since the save was written
        session.map.bootstrap(&session.settings, &mut tracker);

        Ok(Self {
            world: loaded.world,
            sim_time: loaded.sim_time,
            session,
            tracker,
            last_background_update: loaded.sim_time,
            time_scale: loaded.time_scale,
        })
    }
}
