//! Client half of the game: prediction, interpolation and local collision
//!
//! Everything here runs per rendered frame at [`crate::util::time::FRAME_RATE`].

pub mod cockpit;
pub mod collision;
pub mod interp;
pub mod model;
pub mod ordnance;

pub use cockpit::{Cockpit, JetStatus};
pub use model::{ControlInput, FlightModel};
