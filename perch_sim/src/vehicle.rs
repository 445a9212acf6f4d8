// perch_sim/src/vehicle.rs

//! A kinematic stand-in for the trajectory executor. It honors the
//! controller's per-axis NaN convention: a finite position target is chased
//! (at the commanded velocity if one is given, the speed limit otherwise),
//! an axis with only a finite velocity integrates it, and an axis with
//! neither holds.

use nalgebra::Vector3;
use std::f32::consts::PI;

use perch_core::prelude::Setpoint;

use crate::scenario;

#[derive(Debug, Clone)]
pub struct Vehicle {
    pub position: Vector3<f32>,
    pub yaw: f32,
    max_speed: f32,
    max_yaw_rate: f32,
}

impl Vehicle {
    pub fn new(config: &scenario::Vehicle) -> Self {
        Self {
            position: Vector3::from(config.start),
            yaw: 0.0,
            max_speed: config.max_speed,
            max_yaw_rate: config.max_yaw_rate,
        }
    }

    /// Advances the vehicle by `dt` under the given setpoint.
    pub fn apply(&mut self, setpoint: &Setpoint, dt: f32) {
        for axis in 0..3 {
            let target = setpoint.position[axis];
            let velocity = setpoint.velocity[axis];

            if target.is_finite() {
                // Position target: chase it, with the commanded velocity as
                // the feedforward speed when one is given.
                let speed = if velocity.is_finite() && velocity != 0.0 {
                    velocity.abs().min(self.max_speed)
                } else {
                    self.max_speed
                };
                let delta = target - self.position[axis];
                let step = delta.abs().min(speed * dt);
                self.position[axis] += delta.signum() * step;
            } else if velocity.is_finite() {
                // Unconstrained position, pure velocity command.
                self.position[axis] += velocity * dt;
            }
            // Both NaN: unconstrained axis, hold.
        }

        if setpoint.yaw.is_finite() {
            let mut diff = setpoint.yaw - self.yaw;
            while diff > PI {
                diff -= 2.0 * PI;
            }
            while diff < -PI {
                diff += 2.0 * PI;
            }
            let step = diff.abs().min(self.max_yaw_rate * dt);
            self.yaw += diff.signum() * step;
        } else if setpoint.yaw_rate.is_finite() {
            self.yaw += setpoint.yaw_rate * dt;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn vehicle_at(position: Vector3<f32>) -> Vehicle {
        let mut v = Vehicle::new(&scenario::Vehicle::default());
        v.position = position;
        v
    }

    fn setpoint() -> Setpoint {
        Setpoint::default()
    }

    #[test]
    fn chases_position_at_the_commanded_speed() {
        let mut v = vehicle_at(Vector3::zeros());
        let mut sp = setpoint();
        sp.position = Vector3::new(100.0, 100.0, 100.0);
        sp.velocity = Vector3::new(2.0, f32::NAN, -1.0);
        v.apply(&sp, 0.5);
        assert_abs_diff_eq!(v.position.x, 1.0);
        // No commanded speed on y: the vehicle's own limit applies.
        assert_abs_diff_eq!(v.position.y, 1.5);
        // The velocity sign is feedforward only; the target decides.
        assert_abs_diff_eq!(v.position.z, 0.5);
    }

    #[test]
    fn velocity_drives_an_unconstrained_axis() {
        let mut v = vehicle_at(Vector3::new(0.0, 0.0, 10.0));
        let mut sp = setpoint();
        sp.position = Vector3::new(0.0, 0.0, f32::NAN);
        sp.velocity = Vector3::new(f32::NAN, f32::NAN, -0.7);
        v.apply(&sp, 0.5);
        assert_abs_diff_eq!(v.position.z, 9.65);
    }

    #[test]
    fn all_nan_holds_pose() {
        let mut v = vehicle_at(Vector3::new(4.0, -2.0, 9.0));
        v.yaw = 0.8;
        v.apply(&setpoint(), 0.1);
        assert_abs_diff_eq!(v.position.x, 4.0);
        assert_abs_diff_eq!(v.position.y, -2.0);
        assert_abs_diff_eq!(v.position.z, 9.0);
        assert_abs_diff_eq!(v.yaw, 0.8);
    }

    #[test]
    fn position_chase_stops_at_the_target() {
        let mut v = vehicle_at(Vector3::zeros());
        let mut sp = setpoint();
        sp.position = Vector3::new(0.1, 0.0, 0.0);
        for _ in 0..10 {
            v.apply(&sp, 0.5);
        }
        assert_abs_diff_eq!(v.position.x, 0.1);
    }

    #[test]
    fn yaw_slews_the_short_way_around() {
        let mut v = vehicle_at(Vector3::zeros());
        v.yaw = 3.0;
        let mut sp = setpoint();
        sp.yaw = -3.0; // 0.28 rad away through the wrap, not 6 rad back
        v.apply(&sp, 0.1);
        assert!(v.yaw > 3.0);
    }
}
