mod detection;
mod env;
mod frame;
mod room;
mod settings;
mod state;

pub use detection::*;
pub use env::*;
pub use frame::*;
pub use room::*;
pub use settings::*;
pub use state::*;

/// A position or velocity in room coordinates.
///
/// `x` runs left to right, `y` runs floor to ceiling and `z` runs from the viewer
/// into the room.
pub type Vector3 = nalgebra::Vector3<f64>;
