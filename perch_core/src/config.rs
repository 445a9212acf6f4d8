// perch_core/src/config.rs

use serde::Deserialize;
use thiserror::Error;

/// Landing radius enforced once an exploration attempt is underway: a
/// rejected site means the next one must be hit with a tighter footprint.
pub const EXPLORATION_LANDING_RADIUS: f32 = 0.5;

/// Tunable parameters of the landing controller.
///
/// Every field carries a default, so a host can deserialize a partial
/// `[controller]` section (or none at all).
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LandingConfig {
    /// Half-width of the smoothing window, in cells. The hysteresis filter
    /// and the ground-elevation footprint both span `2 * n + 1` cells.
    pub smoothing_land_cell: usize,
    /// Per-cell score threshold above which a cell counts as landable.
    pub can_land_threshold: f32,
    /// EMA smoothing factor in (0, 1). Higher means slower, steadier.
    pub beta: f32,
    /// Base width of the exploration spiral, in multiples of the footprint.
    pub spiral_width: f32,
    /// Target hover height above the ground-elevation estimate.
    pub loiter_height: f32,
    /// Fixed vertical speed magnitude for altitude changes and the final
    /// descent.
    pub land_speed: f32,
    /// Decision window length, in grid-sequence ticks.
    pub decision_window: u64,
    /// Horizontal arrival radius around the goal.
    pub landing_radius: f32,
    /// Tolerance band around the loiter height for the vertical guard.
    pub vertical_range_error: f32,
}

impl Default for LandingConfig {
    fn default() -> Self {
        Self {
            smoothing_land_cell: 6,
            can_land_threshold: 0.45,
            beta: 0.9,
            spiral_width: 2.0,
            loiter_height: 4.0,
            land_speed: 0.7,
            decision_window: 20,
            landing_radius: 2.0,
            vertical_range_error: 0.5,
        }
    }
}

impl LandingConfig {
    /// Rejects parameter combinations the controller cannot operate with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.beta > 0.0 && self.beta < 1.0) {
            return Err(ConfigError::SmoothingFactorOutOfRange(self.beta));
        }
        if self.smoothing_land_cell == 0 {
            return Err(ConfigError::EmptySmoothingWindow);
        }
        if self.decision_window == 0 {
            return Err(ConfigError::EmptyDecisionWindow);
        }
        if self.landing_radius <= 0.0 || self.vertical_range_error <= 0.0 {
            return Err(ConfigError::NonPositiveRadius);
        }
        if self.land_speed <= 0.0 {
            return Err(ConfigError::NonPositiveLandSpeed(self.land_speed));
        }
        Ok(())
    }

    /// Cell count of the smoothing window: `(2n + 1)^2`.
    pub fn window_cells(&self) -> usize {
        let side = 2 * self.smoothing_land_cell + 1;
        side * side
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("EMA smoothing factor must lie in (0, 1), got {0}")]
    SmoothingFactorOutOfRange(f32),
    #[error("smoothing window half-width must be at least one cell")]
    EmptySmoothingWindow,
    #[error("decision window must be at least one tick")]
    EmptyDecisionWindow,
    #[error("proximity radii must be positive")]
    NonPositiveRadius,
    #[error("landing speed must be positive, got {0}")]
    NonPositiveLandSpeed(f32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(LandingConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_degenerate_smoothing_factor() {
        let mut config = LandingConfig::default();
        config.beta = 1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SmoothingFactorOutOfRange(_))
        ));
    }

    #[test]
    fn rejects_zero_decision_window() {
        let mut config = LandingConfig::default();
        config.decision_window = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptyDecisionWindow)
        ));
    }

    #[test]
    fn window_cell_count() {
        let config = LandingConfig {
            smoothing_land_cell: 6,
            ..Default::default()
        };
        assert_eq!(config.window_cells(), 169);
    }
}
