// perch_core/src/controller.rs

//! The landing decision controller.
//!
//! Once per control tick the controller re-evaluates its guards, may
//! transition state, runs the active state's behavior and publishes exactly
//! one trajectory setpoint. Single-threaded and non-blocking: the host owns
//! the schedule and guarantees one call at a time, the terrain grid is
//! borrowed for the duration of the tick only.

use nalgebra::Vector3;
use tracing::{debug, info};

use crate::config::{ConfigError, LandingConfig, EXPLORATION_LANDING_RADIUS};
use crate::exploration::SpiralSearch;
use crate::geometry;
use crate::grid::TerrainGrid;
use crate::hysteresis::LandabilityHysteresis;
use crate::machine::{choose_next_state, LandingState, Transition};
use crate::types::{GoalCommand, Setpoint, SetpointSink, TickInput, UNCONSTRAINED};

/// Percentile of terrain height under the footprint used as the ground
/// reference.
const GROUND_PERCENTILE: f32 = 80.0;

pub struct LandingController {
    config: LandingConfig,

    state: LandingState,
    /// State at the start of the previous tick; drives entry-only side
    /// effects like capturing the loiter hold pose.
    prev_state: LandingState,

    // Pose, copied in each tick.
    position: Vector3<f32>,
    yaw: f32,

    // Goal aggregate. Owned between `GoalCommand`s: the exploration step
    // overwrites it and that override must survive until the goal source
    // speaks again.
    goal: Vector3<f32>,
    is_landing_goal: bool,
    velocity_setpoint: Vector3<f32>,

    /// The setpoint published at the end of every tick. Behaviors mutate it;
    /// a reset tick re-publishes the previous one.
    setpoint: Setpoint,

    // Landing geometry.
    landing_radius: f32,
    ground_elevation: f32,

    // Decision window.
    window_start_seq: u64,
    decision_taken: bool,
    can_land: bool,

    hysteresis: LandabilityHysteresis,
    search: SpiralSearch,

    // Hold pose captured on LOITER entry.
    loiter_position: Vector3<f32>,
    loiter_yaw: f32,
}

impl LandingController {
    pub fn new(config: LandingConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let hysteresis = LandabilityHysteresis::new(
            config.smoothing_land_cell,
            config.beta,
            config.can_land_threshold,
        );
        Ok(Self {
            landing_radius: config.landing_radius,
            hysteresis,
            config,
            state: LandingState::Goto,
            prev_state: LandingState::Goto,
            position: Vector3::zeros(),
            yaw: 0.0,
            goal: Vector3::zeros(),
            is_landing_goal: false,
            velocity_setpoint: UNCONSTRAINED,
            setpoint: Setpoint::default(),
            ground_elevation: 0.0,
            window_start_seq: 0,
            decision_taken: false,
            can_land: true,
            search: SpiralSearch::default(),
            loiter_position: Vector3::zeros(),
            loiter_yaw: 0.0,
        })
    }

    /// Replaces the parameter set. Takes effect on the next tick; a changed
    /// smoothing window resizes and zeroes the hysteresis buffer lazily.
    pub fn set_config(&mut self, config: LandingConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Adopts a new goal from the external goal source.
    pub fn command_goal(&mut self, command: &GoalCommand) {
        self.goal = command.position;
        self.is_landing_goal = command.is_landing;
        self.velocity_setpoint = command.velocity;
    }

    pub fn state(&self) -> LandingState {
        self.state
    }

    pub fn goal(&self) -> Vector3<f32> {
        self.goal
    }

    pub fn ground_elevation(&self) -> f32 {
        self.ground_elevation
    }

    pub fn is_exploring(&self) -> bool {
        self.search.is_active()
    }

    /// The finalized go/no-go verdict for the current loiter, if taken.
    /// Only authoritative once the decision window has elapsed.
    pub fn decision(&self) -> Option<bool> {
        self.decision_taken.then_some(self.can_land)
    }

    /// Advances the controller by one tick and publishes the setpoint.
    ///
    /// The grid is read for this call only and never retained. The sink is
    /// invoked exactly once, whatever the transition outcome.
    pub fn tick(&mut self, input: &TickInput, grid: &TerrainGrid, sink: &mut dyn SetpointSink) {
        self.position = input.position;
        self.yaw = input.yaw;

        self.refresh_landing_state();

        let transition = if input.reset {
            debug!("reset asserted, state logic skipped this tick");
            Transition::Error
        } else {
            self.run_current_state(grid)
        };

        let next = choose_next_state(self.state, transition);
        self.prev_state = self.state;
        if next != self.state {
            info!(from = %self.state, to = %next, "landing state change");
        }
        self.state = next;

        sink.publish(&self.setpoint);
    }

    /// Per-tick bookkeeping ahead of the state logic: lazy buffer sizing,
    /// and the neutral reset while the active goal is not a landing
    /// waypoint. The core tolerates being driven continuously either way.
    fn refresh_landing_state(&mut self) {
        self.hysteresis.ensure_window(self.config.smoothing_land_cell);

        if !self.is_landing_goal {
            self.decision_taken = false;
            self.can_land = true;
            self.hysteresis.reset();
            self.search.reset();
            self.landing_radius = self.config.landing_radius;
        }
    }

    fn run_current_state(&mut self, grid: &TerrainGrid) -> Transition {
        match self.state {
            LandingState::Goto => self.run_goto(grid),
            LandingState::AltitudeChange => self.run_altitude_change(grid),
            LandingState::Loiter => self.run_loiter(grid),
            LandingState::Land => self.run_land(),
        }
    }

    /// Transit toward the goal at the externally supplied velocity.
    fn run_goto(&mut self, grid: &TerrainGrid) -> Transition {
        self.decision_taken = false;
        if self.search.is_active() {
            // An escape attempt is underway: require a tighter footprint and
            // face the direction of travel.
            self.landing_radius = EXPLORATION_LANDING_RADIUS;
            self.setpoint.yaw = geometry::next_yaw(&self.position, &self.goal);
        }
        self.setpoint.position = self.goal;
        self.setpoint.velocity = self.velocity_setpoint;

        self.ground_elevation = grid
            .height_percentile(self.config.smoothing_land_cell, GROUND_PERCENTILE);
        // No landing evidence accumulates while transiting; stale confidence
        // from a previous site must not leak into the next one.
        self.hysteresis.reset();

        debug!(
            horizontal = (self.goal.xy() - self.position.xy()).norm(),
            vertical = (self.position.z - self.ground_elevation).abs(),
            "transit toward goal"
        );

        if self.is_landing_goal && self.within_landing_radius() {
            if !self.in_vertical_range() {
                return Transition::Next1;
            }
            self.window_start_seq = grid.seq();
            return Transition::Next2;
        }
        Transition::Repeat
    }

    /// Climb or descend until the hover height over the ground estimate
    /// sits at the loiter height.
    fn run_altitude_change(&mut self, grid: &TerrainGrid) -> Transition {
        if self.prev_state != LandingState::AltitudeChange {
            // Heading is captured once on entry and held on repeats.
            self.setpoint.yaw = self.yaw;
        }
        // Altitude is commanded through velocity alone.
        self.goal.z = f32::NAN;

        // Altitude changes reveal new terrain; keep the reference fresh.
        self.ground_elevation = grid
            .height_percentile(self.config.smoothing_land_cell, GROUND_PERCENTILE);

        let hover_height = (self.position.z - self.ground_elevation).abs();
        let direction = if hover_height < self.config.loiter_height {
            1.0
        } else {
            -1.0
        };
        self.velocity_setpoint.z = direction * self.config.land_speed;

        self.setpoint.position = self.goal;
        self.setpoint.velocity = self.velocity_setpoint;

        if self.search.is_active() {
            self.landing_radius = EXPLORATION_LANDING_RADIUS;
        }

        debug!(hover_height, ground = self.ground_elevation, "altitude change");

        if self.is_landing_goal && self.within_landing_radius() && self.in_vertical_range() {
            self.window_start_seq = grid.seq();
            return Transition::Next1;
        }
        Transition::Repeat
    }

    /// Hold position while the hysteresis filter accumulates evidence, then
    /// take the go/no-go decision once the window has elapsed.
    fn run_loiter(&mut self, grid: &TerrainGrid) -> Transition {
        if self.prev_state != LandingState::Loiter {
            self.loiter_position = self.position;
            self.loiter_yaw = self.yaw;
        }

        self.hysteresis.observe(grid);

        if !self.decision_taken
            && grid.seq().abs_diff(self.window_start_seq) > self.config.decision_window
        {
            self.decision_taken = true;
            let verdict = self.hysteresis.assess(self.can_land);
            if verdict.inverted {
                info!("verdict flipped: every cell disqualified, approving descent");
            }
            self.can_land = verdict.can_land;
        }

        self.setpoint = Setpoint {
            position: self.loiter_position,
            velocity: UNCONSTRAINED,
            yaw: self.loiter_yaw,
            yaw_rate: f32::NAN,
        };

        if self.decision_taken && self.can_land {
            return Transition::Next1;
        }
        if self.decision_taken && !self.can_land {
            // Site rejected: anchor the escape search here (first rejection
            // only) and relocate one step along the pattern.
            self.search.activate(self.loiter_position);
            let unit_offset = self.config.spiral_width
                * self.search.growth_factor()
                * 2.0
                * self.config.smoothing_land_cell as f32
                * grid.cell_size();
            self.goal = self.search.next_goal(unit_offset);
            self.velocity_setpoint = UNCONSTRAINED;
            debug!(goal = ?self.goal, "site rejected, exploring");
            return Transition::Next2;
        }
        Transition::Repeat
    }

    /// Committed descent over the held loiter position. Terminal here;
    /// touchdown detection belongs to the host.
    fn run_land(&mut self) -> Transition {
        self.loiter_position.z = f32::NAN;
        let mut velocity = UNCONSTRAINED;
        velocity.z = -self.config.land_speed;
        self.setpoint = Setpoint {
            position: self.loiter_position,
            velocity,
            yaw: self.loiter_yaw,
            yaw_rate: f32::NAN,
        };
        Transition::Repeat
    }

    fn within_landing_radius(&self) -> bool {
        geometry::within_horizontal_radius(&self.position, &self.goal, self.landing_radius)
    }

    fn in_vertical_range(&self) -> bool {
        geometry::within_vertical_range(
            self.position.z,
            self.ground_elevation,
            self.config.loiter_height,
            self.config.vertical_range_error,
        )
    }
}
