// perch_sim/src/main.rs

use std::path::Path;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use perch_sim::cli::Cli;
use perch_sim::runner;
use perch_sim::scenario;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    if cli.list {
        for path in scenario::available_scenarios(Path::new("assets/scenarios")) {
            println!("{}", path.display());
        }
        return Ok(());
    }

    let mut config = scenario::load_scenario(&cli.scenario)?;
    if let Some(max_ticks) = cli.max_ticks {
        config.simulation.max_ticks = max_ticks;
    }
    if let Some(seed) = cli.seed {
        config.simulation.seed = seed;
    }

    let summary = runner::run(&config)?;
    info!(
        outcome = ?summary.outcome,
        ticks = summary.ticks,
        state = %summary.final_state,
        position = ?summary.final_position,
        "run finished"
    );
    Ok(())
}
