// perch_core/src/types.rs

use nalgebra::Vector3;

/// A fully-unconstrained vector: every axis left to the trajectory executor.
pub const UNCONSTRAINED: Vector3<f32> = Vector3::new(f32::NAN, f32::NAN, f32::NAN);

/// The trajectory setpoint emitted once per tick.
///
/// Per-axis NaN means "unconstrained on this axis" — the downstream executor
/// is free to choose. The convention applies independently to position and
/// velocity, and to `yaw` / `yaw_rate`.
#[derive(Debug, Clone, Copy)]
pub struct Setpoint {
    pub position: Vector3<f32>,
    pub velocity: Vector3<f32>,
    pub yaw: f32,
    pub yaw_rate: f32,
}

impl Default for Setpoint {
    fn default() -> Self {
        Self {
            position: UNCONSTRAINED,
            velocity: UNCONSTRAINED,
            yaw: f32::NAN,
            yaw_rate: f32::NAN,
        }
    }
}

// --- The contract for the setpoint consumer ---
// The controller calls this exactly once per tick, whatever the transition
// outcome was. On a real vehicle this is the bridge to the trajectory
// executor; in tests and in the sim it records the setpoint.
pub trait SetpointSink {
    fn publish(&mut self, setpoint: &Setpoint);
}

/// Read-only per-tick inputs. The pose is externally owned and copied in
/// each tick; the reset flag is sampled once at the start of the tick.
#[derive(Debug, Clone, Copy)]
pub struct TickInput {
    /// Current vehicle position.
    pub position: Vector3<f32>,
    /// Current vehicle yaw, radians.
    pub yaw: f32,
    /// Force the state machine back to GOTO on the next tick. Recoverable
    /// control event, not a fault; accumulated hysteresis is kept.
    pub reset: bool,
}

/// A new goal from the external goal source. Issued when the goal changes,
/// not every tick — the controller owns the goal between commands so that
/// an exploration override survives until the source speaks again.
#[derive(Debug, Clone, Copy)]
pub struct GoalCommand {
    /// Target position. NaN in z means "unconstrained altitude".
    pub position: Vector3<f32>,
    /// Whether this goal is a landing waypoint.
    pub is_landing: bool,
    /// Velocity setpoint to fly the transit leg with, used verbatim in GOTO.
    pub velocity: Vector3<f32>,
}
