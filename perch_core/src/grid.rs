// perch_core/src/grid.rs

use nalgebra::DMatrix;

/// A snapshot of the terrain classifier's output, centered under the
/// candidate landing site. Externally supplied and read-only for the
/// duration of a tick; the controller never retains one past the call.
#[derive(Debug, Clone)]
pub struct TerrainGrid {
    /// Per-cell "can land here" verdict from the classifier.
    landable: DMatrix<bool>,
    /// Per-cell terrain height estimate, same layout as `landable`.
    height: DMatrix<f32>,
    /// Physical side length of one cell.
    cell_size: f32,
    /// Sequence counter of this snapshot. Drives the decision window.
    seq: u64,
}

impl TerrainGrid {
    pub fn new(landable: DMatrix<bool>, height: DMatrix<f32>, cell_size: f32, seq: u64) -> Self {
        assert_eq!(
            landable.shape(),
            height.shape(),
            "landability and height fields must share a layout"
        );
        Self {
            landable,
            height,
            cell_size,
            seq,
        }
    }

    pub fn rows(&self) -> usize {
        self.landable.nrows()
    }

    pub fn cols(&self) -> usize {
        self.landable.ncols()
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Center cell index as (row, col).
    pub fn center(&self) -> (usize, usize) {
        (self.landable.nrows() / 2, self.landable.ncols() / 2)
    }

    pub fn is_landable(&self, row: usize, col: usize) -> bool {
        self.landable[(row, col)]
    }

    pub fn height_at(&self, row: usize, col: usize) -> f32 {
        self.height[(row, col)]
    }

    /// True if a square window of side `2 * half_width + 1` around the grid
    /// center stays inside the grid. The controller requires this as a caller
    /// precondition; see [`crate::hysteresis::LandabilityHysteresis::observe`].
    pub fn covers_window(&self, half_width: usize) -> bool {
        let (cr, cc) = self.center();
        cr >= half_width
            && cc >= half_width
            && cr + half_width < self.rows()
            && cc + half_width < self.cols()
    }

    /// Ground-elevation estimate: the `percentile`-th percentile of terrain
    /// height under the landing footprint (the smoothing window around the
    /// grid center). A high percentile is robust against pits and dropouts
    /// in the height field.
    pub fn height_percentile(&self, half_width: usize, percentile: f32) -> f32 {
        assert!(
            self.covers_window(half_width),
            "terrain grid {}x{} too small for footprint half-width {}",
            self.rows(),
            self.cols(),
            half_width
        );

        let (cr, cc) = self.center();
        let mut heights = Vec::with_capacity((2 * half_width + 1) * (2 * half_width + 1));
        for row in (cr - half_width)..=(cr + half_width) {
            for col in (cc - half_width)..=(cc + half_width) {
                heights.push(self.height[(row, col)]);
            }
        }
        heights.sort_by(f32::total_cmp);

        let rank = (heights.len() as f32 * percentile / 100.0) as usize;
        heights[rank.min(heights.len() - 1)]
    }
}
