//! Planar target observations used for calibration.

use serde::{Deserialize, Serialize};

use crate::{MeasureError, MeasureResult, Pt2};

/// One image of a planar target: board coordinates (meters, `Z = 0`) paired
/// with the pixel positions where they were observed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanarView {
    pub board_points: Vec<Pt2>,
    pub pixel_points: Vec<Pt2>,
}

impl PlanarView {
    /// Pair board points with pixel observations.
    ///
    /// At least four correspondences are needed to fix a plane homography.
    pub fn new(board_points: Vec<Pt2>, pixel_points: Vec<Pt2>) -> MeasureResult<Self> {
        if board_points.len() != pixel_points.len() {
            return Err(MeasureError::InvalidArgument(format!(
                "board / pixel point counts must match: {} vs {}",
                board_points.len(),
                pixel_points.len()
            )));
        }
        if board_points.len() < 4 {
            return Err(MeasureError::InvalidArgument(format!(
                "a planar view needs at least 4 points, got {}",
                board_points.len()
            )));
        }
        Ok(Self {
            board_points,
            pixel_points,
        })
    }

    pub fn len(&self) -> usize {
        self.board_points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.board_points.is_empty()
    }
}

/// Inner-corner geometry of a checkerboard calibration target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CheckerboardPattern {
    /// Inner corners per row.
    pub columns: usize,
    /// Inner corners per column.
    pub rows: usize,
    /// Real edge length of one square (meters).
    pub square_size: f64,
}

impl Default for CheckerboardPattern {
    fn default() -> Self {
        Self {
            columns: 9,
            rows: 6,
            square_size: 0.025,
        }
    }
}

impl CheckerboardPattern {
    pub fn corner_count(&self) -> usize {
        self.columns * self.rows
    }

    /// Ideal board coordinates of every inner corner, row-major, scaled by the square size.
    pub fn board_points(&self) -> Vec<Pt2> {
        let mut points = Vec::with_capacity(self.corner_count());
        for j in 0..self.rows {
            for i in 0..self.columns {
                points.push(Pt2::new(
                    i as f64 * self.square_size,
                    j as f64 * self.square_size,
                ));
            }
        }
        points
    }
}
