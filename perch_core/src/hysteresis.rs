// perch_core/src/hysteresis.rs

//! Temporal filtering of the per-cell landability signal.
//!
//! A single classifier frame is noisy: one misclassified cell must not flip
//! the landing decision. Each cell in the smoothing window therefore carries
//! an exponential moving average of its "can land" signal, accumulated over
//! the whole loiter, and the verdict is taken over the smoothed scores.

use tracing::trace;

use crate::grid::TerrainGrid;

/// Outcome of assessing the smoothed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    /// Final landing approval.
    pub can_land: bool,
    /// True when the all-cells-disqualified fallback fired and flipped the
    /// approval to true.
    pub inverted: bool,
}

/// EMA filter over a square window of landability cells.
///
/// The score buffer always holds `(2 * half_width + 1)^2` entries once
/// [`ensure_window`](Self::ensure_window) has run; it is resized and zeroed
/// whenever the half-width changes or the buffer is empty, before any read.
#[derive(Debug, Clone)]
pub struct LandabilityHysteresis {
    scores: Vec<f32>,
    half_width: usize,
    beta: f32,
    threshold: f32,
}

impl LandabilityHysteresis {
    pub fn new(half_width: usize, beta: f32, threshold: f32) -> Self {
        Self {
            scores: Vec::new(),
            half_width,
            beta,
            threshold,
        }
    }

    pub fn half_width(&self) -> usize {
        self.half_width
    }

    pub fn scores(&self) -> &[f32] {
        &self.scores
    }

    /// Lazily (re)sizes the score buffer for the given window half-width.
    /// A size change discards accumulated scores — evidence gathered over
    /// one footprint does not transfer to another.
    pub fn ensure_window(&mut self, half_width: usize) {
        let side = 2 * half_width + 1;
        if self.half_width != half_width || self.scores.len() != side * side {
            self.half_width = half_width;
            self.scores = vec![0.0; side * side];
        }
    }

    /// Zeroes every score without touching the window geometry.
    pub fn reset(&mut self) {
        self.scores.fill(0.0);
    }

    /// Folds one classifier frame into the smoothed scores:
    /// `score <- beta * score + (1 - beta) * cell`.
    ///
    /// The window is centered on the grid's own center. The grid covering
    /// the window is a caller precondition; an undersized grid panics.
    pub fn observe(&mut self, grid: &TerrainGrid) {
        self.ensure_window(self.half_width);
        assert!(
            grid.covers_window(self.half_width),
            "terrain grid {}x{} too small for smoothing half-width {}",
            grid.rows(),
            grid.cols(),
            self.half_width
        );

        let (center_row, center_col) = grid.center();
        let side = 2 * self.half_width + 1;
        for row in (center_row - self.half_width)..=(center_row + self.half_width) {
            let row_start = side * (row + self.half_width - center_row);
            for col in (center_col - self.half_width)..=(center_col + self.half_width) {
                let index = row_start + (col + self.half_width - center_col);
                let cell = if grid.is_landable(row, col) { 1.0 } else { 0.0 };
                self.scores[index] = self.beta * self.scores[index] + (1.0 - self.beta) * cell;
            }
            trace!(row, scores = ?&self.scores[row_start..row_start + side], "landability scores");
        }
    }

    /// Takes the landing verdict over the smoothed scores.
    ///
    /// Approval is the AND of `prior` and "score above threshold" across all
    /// cells: any disqualifying cell disqualifies the site. The one exception
    /// is the fallback rule: when every single cell is disqualified, the
    /// decision inverts to approval. Intentional; pinned by a regression
    /// test below.
    pub fn assess(&self, prior: bool) -> Verdict {
        let mut can_land = prior;
        let mut disqualified = 0usize;
        for &score in &self.scores {
            let pass = score > self.threshold;
            if !pass {
                disqualified += 1;
            }
            can_land = can_land && pass;
        }

        if !self.scores.is_empty() && disqualified == self.scores.len() {
            return Verdict {
                can_land: true,
                inverted: true,
            };
        }
        Verdict {
            can_land,
            inverted: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::DMatrix;

    fn grid(side: usize, landable: bool) -> TerrainGrid {
        TerrainGrid::new(
            DMatrix::from_element(side, side, landable),
            DMatrix::from_element(side, side, 0.0),
            1.0,
            0,
        )
    }

    fn filter(half_width: usize) -> LandabilityHysteresis {
        let mut f = LandabilityHysteresis::new(half_width, 0.9, 0.45);
        f.ensure_window(half_width);
        f
    }

    #[test]
    fn single_update_matches_the_ema_formula() {
        let mut f = filter(1);
        f.observe(&grid(5, true));
        for &score in f.scores() {
            assert_abs_diff_eq!(score, 0.1, epsilon = 1e-6);
        }
    }

    #[test]
    fn constant_signal_converges_monotonically_toward_one() {
        let mut f = filter(1);
        let g = grid(5, true);
        let mut previous = 0.0;
        for _ in 0..60 {
            f.observe(&g);
            let score = f.scores()[0];
            assert!(score > previous);
            assert!(score < 1.0);
            previous = score;
        }
        assert!(previous > 0.99);
    }

    #[test]
    fn window_resize_discards_scores() {
        let mut f = filter(1);
        f.observe(&grid(5, true));
        f.ensure_window(2);
        assert_eq!(f.scores().len(), 25);
        assert!(f.scores().iter().all(|&s| s == 0.0));
    }

    #[test]
    fn all_cells_passing_approves() {
        let mut f = filter(1);
        let g = grid(5, true);
        for _ in 0..30 {
            f.observe(&g);
        }
        assert_eq!(
            f.assess(true),
            Verdict {
                can_land: true,
                inverted: false
            }
        );
    }

    #[test]
    fn one_disqualified_cell_rejects() {
        let mut f = filter(1);
        let mut landable = DMatrix::from_element(5, 5, true);
        landable[(2, 2)] = false;
        let g = TerrainGrid::new(landable, DMatrix::from_element(5, 5, 0.0), 1.0, 0);
        for _ in 0..30 {
            f.observe(&g);
        }
        assert_eq!(
            f.assess(true),
            Verdict {
                can_land: false,
                inverted: false
            }
        );
    }

    #[test]
    fn every_cell_disqualified_inverts_to_approval() {
        // Fallback rule: a full house of disqualified cells flips the
        // verdict to "land".
        let mut f = filter(1);
        let g = grid(5, false);
        for _ in 0..30 {
            f.observe(&g);
        }
        assert_eq!(
            f.assess(true),
            Verdict {
                can_land: true,
                inverted: true
            }
        );
        // The inversion also overrides a prior rejection.
        assert_eq!(
            f.assess(false),
            Verdict {
                can_land: true,
                inverted: true
            }
        );
    }

    #[test]
    fn prior_rejection_sticks_without_the_fallback() {
        let mut f = filter(1);
        let g = grid(5, true);
        for _ in 0..30 {
            f.observe(&g);
        }
        // All cells pass now, but the site was already rejected this visit.
        assert_eq!(
            f.assess(false),
            Verdict {
                can_land: false,
                inverted: false
            }
        );
    }

    #[test]
    #[should_panic(expected = "too small for smoothing")]
    fn undersized_grid_panics() {
        let mut f = filter(6);
        f.observe(&grid(5, true));
    }
}
