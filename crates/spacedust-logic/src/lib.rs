//! Pure simulation logic for SpaceDust resource fields.
//!
//! This crate contains everything that is independent of the vessel engine
//! and of any runtime: distribution functions, bands, the per-body resource
//! map, the discovery state machine, and the shared harvesting and scanning
//! formulas. Functions take plain data and return results, so both the
//! per-frame foreground path and the coarse background path call exactly the
//! same code.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`band`] | One deposit: distribution, seeded abundance, air-density coupling |
//! | [`body`] | Celestial body catalog with a simple exponential atmosphere |
//! | [`curve`] | Keyed response curves (linear or Hermite) |
//! | [`discovery`] | Discover/identify progress state machine, science rewards |
//! | [`distribution`] | Uniform and spherical-shell density models |
//! | [`error`] | Load-time error types |
//! | [`geometry`] | `DVec3` and intake alignment |
//! | [`harvest`] | Intake flow, harvest amount, per-tick harvesting |
//! | [`instrument`] | Telescope instruments, air mass, body line of sight |
//! | [`inventory`] | Ordered resource tanks; the harvester's sink |
//! | [`resource_map`] | Body → resource distributions registry and loader |
//! | [`scanner`] | Local scanner discover/identify modes |
//! | [`seed`] | Deterministic per-band random streams |
//! | [`settings`] | Session-wide tunables |

pub mod band;
pub mod body;
pub mod curve;
pub mod discovery;
pub mod distribution;
pub mod error;
pub mod geometry;
pub mod harvest;
pub mod instrument;
pub mod inventory;
pub mod resource_map;
pub mod scanner;
pub mod seed;
pub mod settings;

pub use band::{BandDefinition, HarvestType, ResourceBand};
pub use body::{Atmosphere, BodyCatalog, CelestialBody};
pub use discovery::{DiscoveryEvent, DiscoveryKey, DiscoveryRecord, DiscoveryTracker, SurveyKind};
pub use distribution::{DistributionModel, FalloffType, SphericalShell};
pub use error::{CatalogError, DefinitionError};
pub use resource_map::{LoadReport, ResourceDefinition, ResourceDistribution, ResourceMap};
pub use settings::Settings;
