// perch_sim/src/cli.rs

use clap::Parser;
use std::path::PathBuf;

/// Perch: a headless landing-decision simulation harness.
///
/// This struct defines the command-line arguments that can be passed to any
/// binary application that uses the perch simulation library.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The path to the scenario TOML file to run.
    #[arg(short, long, default_value = "assets/scenarios/00_flat_pad.toml")]
    pub scenario: PathBuf,

    /// List the scenario files under the assets directory and exit.
    #[arg(long)]
    pub list: bool,

    /// Override the scenario's tick limit.
    #[arg(long)]
    pub max_ticks: Option<u64>,

    /// Override the scenario's PRNG seed.
    #[arg(long)]
    pub seed: Option<u64>,
}
