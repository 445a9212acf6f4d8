// perch_sim/src/runner.rs

//! The fixed-rate tick loop: classifier snapshot in, controller tick,
//! vehicle update, repeat. Touchdown detection lives here — the controller
//! holds its landing descent forever and expects the host to notice the
//! ground.

use anyhow::Result;
use nalgebra::Vector3;
use tracing::{debug, info};

use perch_core::prelude::{
    GoalCommand, LandingController, LandingState, Setpoint, SetpointSink, TickInput,
};

use crate::scenario::ScenarioConfig;
use crate::terrain::TerrainWorld;
use crate::vehicle::Vehicle;

/// Height above the true ground below which a descending vehicle counts as
/// touched down.
const TOUCHDOWN_MARGIN: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The vehicle reached the ground while the controller held LAND.
    Touchdown,
    /// The tick limit ran out first.
    TickLimit,
}

#[derive(Debug)]
pub struct RunSummary {
    pub outcome: Outcome,
    pub ticks: u64,
    pub final_state: LandingState,
    pub final_position: Vector3<f32>,
}

/// Keeps the most recent setpoint for the vehicle to follow.
#[derive(Default)]
struct LatestSetpoint(Option<Setpoint>);

impl SetpointSink for LatestSetpoint {
    fn publish(&mut self, setpoint: &Setpoint) {
        self.0 = Some(*setpoint);
    }
}

pub fn run(config: &ScenarioConfig) -> Result<RunSummary> {
    let mut controller = LandingController::new(config.controller.clone())?;
    let mut terrain = TerrainWorld::new(&config.terrain, config.simulation.seed);
    let mut vehicle = Vehicle::new(&config.vehicle);
    let mut sink = LatestSetpoint::default();

    controller.command_goal(&GoalCommand {
        position: Vector3::from(config.goal.position),
        is_landing: config.goal.is_landing,
        velocity: Vector3::from(config.goal.velocity),
    });

    let dt = 1.0 / config.simulation.tick_rate_hz;
    info!(
        goal = ?config.goal.position,
        ticks = config.simulation.max_ticks,
        "starting run"
    );

    for tick in 0..config.simulation.max_ticks {
        let grid = terrain.snapshot(vehicle.position.xy());
        let input = TickInput {
            position: vehicle.position,
            yaw: vehicle.yaw,
            reset: false,
        };
        controller.tick(&input, &grid, &mut sink);

        if let Some(setpoint) = sink.0 {
            vehicle.apply(&setpoint, dt);
        }

        let ground = terrain.ground_height(vehicle.position.x, vehicle.position.y);
        if controller.state() == LandingState::Land
            && vehicle.position.z - ground < TOUCHDOWN_MARGIN
        {
            info!(tick, position = ?vehicle.position, "touchdown");
            return Ok(RunSummary {
                outcome: Outcome::Touchdown,
                ticks: tick + 1,
                final_state: controller.state(),
                final_position: vehicle.position,
            });
        }

        if tick % 100 == 0 {
            debug!(
                tick,
                state = %controller.state(),
                position = ?vehicle.position,
                exploring = controller.is_exploring(),
                "progress"
            );
        }
    }

    Ok(RunSummary {
        outcome: Outcome::TickLimit,
        ticks: config.simulation.max_ticks,
        final_state: controller.state(),
        final_position: vehicle.position,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::{ScenarioConfig, Terrain};

    /// Flat, noise-free world: the controller should commit and touch down
    /// well inside the tick budget.
    #[test]
    fn flat_world_ends_in_touchdown() {
        let mut config = ScenarioConfig::default();
        config.terrain = Terrain {
            hill_amplitude: 0.0,
            noise_stddev: 0.0,
            misclassification_rate: 0.0,
            ..Default::default()
        };
        let summary = run(&config).unwrap();
        assert_eq!(summary.outcome, Outcome::Touchdown);
        assert_eq!(summary.final_state, LandingState::Land);
    }

    /// A non-landing goal never leaves GOTO, never lands.
    #[test]
    fn transit_goal_never_commits() {
        let mut config = ScenarioConfig::default();
        config.goal.is_landing = false;
        config.simulation.max_ticks = 300;
        let summary = run(&config).unwrap();
        assert_eq!(summary.outcome, Outcome::TickLimit);
        assert_eq!(summary.final_state, LandingState::Goto);
    }
}
