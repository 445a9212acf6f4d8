// perch_sim/src/terrain.rs

//! Synthetic terrain and the classifier stand-in.
//!
//! The underlying heightfield is a deterministic mix of two sinusoid bands;
//! the per-snapshot measurement noise and the landability misclassification
//! come from a seeded PRNG, so two worlds built with the same seed produce
//! identical snapshot streams.

use nalgebra::{DMatrix, Vector2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

use perch_core::prelude::TerrainGrid;

use crate::scenario::Terrain;

pub struct TerrainWorld {
    grid_cells: usize,
    cell_size: f32,
    hill_amplitude: f32,
    hill_wavelength: f32,
    slope_limit: f32,
    misclassification_rate: f64,
    noise: Normal<f32>,
    rng: ChaCha8Rng,
    /// Sequence counter handed to each snapshot; increments by one per call.
    seq: u64,
}

impl TerrainWorld {
    pub fn new(config: &Terrain, seed: u64) -> Self {
        Self {
            grid_cells: config.grid_cells,
            cell_size: config.cell_size,
            hill_amplitude: config.hill_amplitude,
            hill_wavelength: config.hill_wavelength,
            slope_limit: config.slope_limit,
            misclassification_rate: config.misclassification_rate,
            noise: Normal::new(0.0, config.noise_stddev.max(f32::EPSILON))
                .expect("noise stddev is finite"),
            rng: ChaCha8Rng::seed_from_u64(seed),
            seq: 0,
        }
    }

    /// True terrain height at a world position, noise-free. The runner uses
    /// this for touchdown detection; the classifier never sees it directly.
    pub fn ground_height(&self, x: f32, y: f32) -> f32 {
        let k = std::f32::consts::TAU / self.hill_wavelength;
        let rolling = (k * x).sin() * (k * y).cos();
        let ridges = 0.4 * (2.7 * k * (x + 0.5 * y)).sin();
        self.hill_amplitude * (rolling + ridges)
    }

    /// Magnitude of the terrain gradient at a world position, by central
    /// difference over half a cell.
    fn slope(&self, x: f32, y: f32) -> f32 {
        let h = 0.5 * self.cell_size;
        let dx = (self.ground_height(x + h, y) - self.ground_height(x - h, y)) / (2.0 * h);
        let dy = (self.ground_height(x, y + h) - self.ground_height(x, y - h)) / (2.0 * h);
        Vector2::new(dx, dy).norm()
    }

    /// Produces one classifier snapshot centered under `center`.
    ///
    /// Row index maps to world y, column index to world x. Heights carry
    /// measurement noise; landability is the slope test with an occasional
    /// misclassification flip.
    pub fn snapshot(&mut self, center: Vector2<f32>) -> TerrainGrid {
        let cells = self.grid_cells;
        let half = (cells / 2) as isize;

        let mut landable = DMatrix::from_element(cells, cells, false);
        let mut height = DMatrix::from_element(cells, cells, 0.0f32);
        for row in 0..cells {
            for col in 0..cells {
                let x = center.x + (col as isize - half) as f32 * self.cell_size;
                let y = center.y + (row as isize - half) as f32 * self.cell_size;

                height[(row, col)] = self.ground_height(x, y) + self.noise.sample(&mut self.rng);

                let mut verdict = self.slope(x, y) < self.slope_limit;
                if self.rng.gen_bool(self.misclassification_rate) {
                    verdict = !verdict;
                }
                landable[(row, col)] = verdict;
            }
        }

        self.seq += 1;
        TerrainGrid::new(landable, height, self.cell_size, self.seq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn world(seed: u64) -> TerrainWorld {
        TerrainWorld::new(&Terrain::default(), seed)
    }

    #[test]
    fn snapshots_are_deterministic_per_seed() {
        let mut a = world(7);
        let mut b = world(7);
        let center = Vector2::new(12.0, -3.0);
        let ga = a.snapshot(center);
        let gb = b.snapshot(center);
        for row in 0..ga.rows() {
            for col in 0..ga.cols() {
                assert_eq!(ga.is_landable(row, col), gb.is_landable(row, col));
                assert_abs_diff_eq!(ga.height_at(row, col), gb.height_at(row, col));
            }
        }
    }

    #[test]
    fn sequence_counter_increments_per_snapshot() {
        let mut w = world(1);
        let center = Vector2::zeros();
        assert_eq!(w.snapshot(center).seq(), 1);
        assert_eq!(w.snapshot(center).seq(), 2);
        assert_eq!(w.snapshot(center).seq(), 3);
    }

    #[test]
    fn snapshot_covers_the_default_smoothing_window() {
        let mut w = world(1);
        let grid = w.snapshot(Vector2::zeros());
        assert!(grid.covers_window(6));
    }

    #[test]
    fn flat_world_is_landable_everywhere_without_misclassification() {
        let config = Terrain {
            hill_amplitude: 0.0,
            misclassification_rate: 0.0,
            ..Default::default()
        };
        let mut w = TerrainWorld::new(&config, 3);
        let grid = w.snapshot(Vector2::new(5.0, 5.0));
        for row in 0..grid.rows() {
            for col in 0..grid.cols() {
                assert!(grid.is_landable(row, col));
            }
        }
    }
}
