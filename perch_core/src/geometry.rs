// perch_core/src/geometry.rs

//! Pure geometric predicates against the landing target. Kept free of
//! controller state so the guards can be tested in isolation.

use nalgebra::Vector3;

/// True when the vehicle is horizontally within `radius` of the goal.
/// Only x/y participate; goal altitude may be NaN (unconstrained).
pub fn within_horizontal_radius(position: &Vector3<f32>, goal: &Vector3<f32>, radius: f32) -> bool {
    (goal.xy() - position.xy()).norm() < radius
}

/// True when the hover height above the ground-elevation estimate is within
/// `tolerance` of the target loiter height.
pub fn within_vertical_range(
    position_z: f32,
    ground_elevation: f32,
    loiter_height: f32,
    tolerance: f32,
) -> bool {
    ((position_z - ground_elevation).abs() - loiter_height).abs() < tolerance
}

/// Yaw that faces the direction of travel from `from` to `to`.
pub fn next_yaw(from: &Vector3<f32>, to: &Vector3<f32>) -> f32 {
    (to.y - from.y).atan2(to.x - from.x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn horizontal_radius_ignores_altitude() {
        let position = Vector3::new(0.0, 0.0, 50.0);
        let goal = Vector3::new(1.0, 1.0, f32::NAN);
        assert!(within_horizontal_radius(&position, &goal, 2.0));
        assert!(!within_horizontal_radius(&position, &goal, 1.0));
    }

    #[test]
    fn vertical_range_is_relative_to_ground_estimate() {
        // Ground at 2m, hovering at 6.3m, target height 4m, tolerance 0.5m.
        assert!(within_vertical_range(6.3, 2.0, 4.0, 0.5));
        // Hovering 2m too high.
        assert!(!within_vertical_range(8.0, 2.0, 4.0, 0.5));
        // Same band holds when the vehicle is below the ground reference
        // (height estimate from a ridge above the sensor origin).
        assert!(within_vertical_range(-1.8, 2.0, 4.0, 0.5));
    }

    #[test]
    fn travel_yaw_points_at_the_goal() {
        let from = Vector3::new(0.0, 0.0, 10.0);
        let to = Vector3::new(0.0, 5.0, 10.0);
        assert_abs_diff_eq!(next_yaw(&from, &to), FRAC_PI_2);
    }
}
