// perch_core/src/exploration.rs

//! Deterministic escape search for rejected landing sites.
//!
//! When the loiter verdict is "don't land", the vehicle relocates along a
//! fixed closed ring of lateral offsets around the rejected site. Each full
//! lap the growth factor increments, so the ring widens outward and the
//! search eventually leaves any locally bad patch.

use nalgebra::{Vector2, Vector3};

/// The closed offset ring, walked in order. Unit offsets; the controller
/// scales them by the footprint size and the growth factor.
const PATTERN: [(f32, f32); 8] = [
    (1.0, 0.0),
    (1.0, 1.0),
    (0.0, 1.0),
    (-1.0, 1.0),
    (-1.0, 0.0),
    (-1.0, -1.0),
    (0.0, -1.0),
    (1.0, -1.0),
];

#[derive(Debug, Clone)]
pub struct SpiralSearch {
    /// Hold position of the first rejected site; all offsets are relative
    /// to it.
    anchor: Vector3<f32>,
    /// Position in the ring; `None` until the first step.
    index: Option<usize>,
    /// Lap counter, starting at 1. Scales the ring radius linearly.
    growth_factor: f32,
    active: bool,
}

impl Default for SpiralSearch {
    fn default() -> Self {
        Self {
            anchor: Vector3::zeros(),
            index: None,
            growth_factor: 1.0,
            active: false,
        }
    }
}

impl SpiralSearch {
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn growth_factor(&self) -> f32 {
        self.growth_factor
    }

    /// Marks the search active, anchored at the rejected hold position.
    /// A second activation while already active keeps the original anchor.
    pub fn activate(&mut self, anchor: Vector3<f32>) {
        if !self.active {
            self.anchor = anchor;
            self.active = true;
        }
    }

    /// Back to the inactive idle: anchor forgotten, ring rewound.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Advances one step along the ring and returns the next goal.
    ///
    /// `unit_offset` is the physical distance of one unit of the pattern
    /// (spiral width x growth factor x footprint size). Wrapping past the
    /// end of the ring rewinds the index and bumps the growth factor by one.
    /// The goal keeps the anchor's altitude.
    pub fn next_goal(&mut self, unit_offset: f32) -> Vector3<f32> {
        let next = match self.index {
            None => 0,
            Some(i) if i + 1 == PATTERN.len() => {
                self.growth_factor += 1.0;
                0
            }
            Some(i) => i + 1,
        };
        self.index = Some(next);

        let step = Vector2::new(PATTERN[next].0, PATTERN[next].1) * unit_offset;
        Vector3::new(self.anchor.x + step.x, self.anchor.y + step.y, self.anchor.z)
    }
}
