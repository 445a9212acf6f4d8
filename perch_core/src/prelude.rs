// perch_core/src/prelude.rs

// --- Core Abstractions (The main contracts of the library) ---
pub use crate::types::{GoalCommand, Setpoint, SetpointSink, TickInput, UNCONSTRAINED};

// --- Core Data Structures (The "nouns" of the library) ---
pub use crate::config::{ConfigError, LandingConfig};
pub use crate::grid::TerrainGrid;
pub use crate::machine::{LandingState, Transition};

// --- The Controller ---
pub use crate::controller::LandingController;
