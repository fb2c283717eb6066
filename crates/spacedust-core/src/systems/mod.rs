//! Systems - logic that operates on components

mod background;
mod harvesting;
mod scanning;
mod telescope;

pub use background::*;
pub use harvesting::*;
pub use scanning::*;
pub use telescope::*;
