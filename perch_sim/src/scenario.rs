// perch_sim/src/scenario.rs

//! This module handles loading and validating scenario configuration from
//! disk. A scenario file is a TOML document with `[simulation]`,
//! `[terrain]`, `[vehicle]`, `[goal]` and `[controller]` sections; every
//! section and every field is optional and falls back to its default.

use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use figment::{
    providers::{Format, Toml},
    Figment,
};
use serde::Deserialize;
use walkdir::WalkDir;

use perch_core::prelude::LandingConfig;

/// The root of the data parsed from a scenario TOML file.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)] // Fail if the TOML has sections not in our struct
pub struct ScenarioConfig {
    #[serde(default)]
    pub simulation: Simulation,

    #[serde(default)]
    pub terrain: Terrain,

    #[serde(default)]
    pub vehicle: Vehicle,

    #[serde(default)]
    pub goal: Goal,

    #[serde(default)]
    pub controller: LandingConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Simulation {
    /// Control tick rate in Hz.
    pub tick_rate_hz: f32,
    /// Hard tick limit for the run.
    pub max_ticks: u64,
    /// Seed for the pseudo-random number generator, for determinism.
    pub seed: u64,
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            tick_rate_hz: 20.0,
            max_ticks: 3000,
            seed: 42,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Terrain {
    /// Side length of the classifier snapshot grid, in cells. Must cover
    /// the controller's smoothing window.
    pub grid_cells: usize,
    /// Physical side length of one cell.
    pub cell_size: f32,
    /// Peak height of the rolling-hill base field.
    pub hill_amplitude: f32,
    /// Wavelength of the rolling hills.
    pub hill_wavelength: f32,
    /// Stddev of the per-sample height measurement noise.
    pub noise_stddev: f32,
    /// Maximum terrain slope (rise over run) still classified landable.
    pub slope_limit: f32,
    /// Probability that a cell's landability verdict is flipped, per
    /// snapshot. This is what the hysteresis filter exists to absorb.
    pub misclassification_rate: f64,
}

impl Default for Terrain {
    fn default() -> Self {
        Self {
            grid_cells: 21,
            cell_size: 1.0,
            hill_amplitude: 1.5,
            hill_wavelength: 40.0,
            noise_stddev: 0.05,
            slope_limit: 0.35,
            misclassification_rate: 0.02,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Vehicle {
    /// Start position.
    pub start: [f32; 3],
    /// Speed limit when chasing a position setpoint.
    pub max_speed: f32,
    /// Yaw slew limit, rad/s.
    pub max_yaw_rate: f32,
}

impl Default for Vehicle {
    fn default() -> Self {
        Self {
            start: [0.0, 0.0, 12.0],
            max_speed: 3.0,
            max_yaw_rate: 1.5,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Goal {
    /// Target position.
    pub position: [f32; 3],
    /// Whether the goal is a landing waypoint.
    pub is_landing: bool,
    /// Velocity setpoint for the transit leg.
    pub velocity: [f32; 3],
}

impl Default for Goal {
    fn default() -> Self {
        Self {
            position: [30.0, 10.0, 12.0],
            is_landing: true,
            velocity: [2.0, 0.7, 0.0],
        }
    }
}

/// Loads and validates a scenario file.
pub fn load_scenario(path: &Path) -> Result<ScenarioConfig> {
    let config: ScenarioConfig = Figment::new()
        .merge(Toml::file(path))
        .extract()
        .with_context(|| format!("failed to load scenario file {}", path.display()))?;

    config
        .controller
        .validate()
        .context("invalid [controller] section")?;
    ensure!(
        config.terrain.grid_cells > 2 * config.controller.smoothing_land_cell,
        "terrain grid of {} cells cannot cover a smoothing window of half-width {}",
        config.terrain.grid_cells,
        config.controller.smoothing_land_cell
    );
    ensure!(
        config.simulation.tick_rate_hz > 0.0,
        "tick rate must be positive"
    );
    Ok(config)
}

/// Walks `dir` and returns every scenario TOML in it, sorted.
pub fn available_scenarios(dir: &Path) -> Vec<PathBuf> {
    let mut scenarios: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| {
            !e.file_type().is_dir() && e.path().extension().map_or(false, |ext| ext == "toml")
        })
        .map(|e| e.into_path())
        .collect();
    scenarios.sort();
    scenarios
}
