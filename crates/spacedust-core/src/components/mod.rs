//! Component definitions for the ECS simulation.
//!
//! Components are pure data structs attached to vessel entities.
//! They have no behavior - that lives in systems.

mod parts;
mod vessel;

pub use parts::*;
pub use vessel::*;
