// perch_core/src/lib.rs

// This file defines the public modules of your library.
pub mod config;
pub mod controller;
pub mod exploration;
pub mod geometry;
pub mod grid;
pub mod hysteresis;
pub mod machine;
pub mod prelude;
pub mod types;
