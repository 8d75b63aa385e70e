//! Linear Brown-Conrady estimation from homography residuals.
//!
//! For each correspondence the ideal pixel `H * board` and the observed pixel
//! are mapped through `K^-1`. Their difference in normalized coordinates is
//! modelled as a linear function of `(k1, k2, k3, p1, p2)` evaluated at the
//! ideal point and solved in the least-squares sense.
//!
//! Valid for small to moderate distortion only. Results are an initial guess
//! that the iterative planar calibration refines.

use boule_vision_core::{DistortionCoefficients, Mat3, Pt2, Real, Vec2};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::math::transform_point;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DistortionFitError {
    #[error("need at least {0} points for distortion estimation, got {1}")]
    NotEnoughPoints(usize, usize),
    #[error("board / pixel point counts differ: {0} vs {1}")]
    CountMismatch(usize, usize),
    #[error("svd failed during distortion estimation")]
    SvdFailed,
    #[error("intrinsics matrix is not invertible")]
    IntrinsicsNotInvertible,
    #[error("degenerate configuration: all points near the principal point")]
    DegenerateConfiguration,
}

/// Which coefficients the linear fit estimates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistortionFitOptions {
    /// Keep `p1 = p2 = 0`.
    pub fix_tangential: bool,
    /// Keep `k3 = 0`. The r^6 term overfits with typical board coverage.
    pub fix_k3: bool,
}

impl Default for DistortionFitOptions {
    fn default() -> Self {
        Self {
            fix_tangential: false,
            fix_k3: true,
        }
    }
}

impl DistortionFitOptions {
    fn param_count(&self) -> usize {
        2 + usize::from(!self.fix_k3) + 2 * usize::from(!self.fix_tangential)
    }
}

/// One view's input to the distortion fit.
///
/// `homography` maps board points to ideal (undistorted) pixels; the
/// `pixel_points` are the raw, distorted observations.
#[derive(Debug, Clone, Copy)]
pub struct DistortionView<'a> {
    pub homography: Mat3,
    pub board_points: &'a [Pt2],
    pub pixel_points: &'a [Pt2],
}

impl<'a> DistortionView<'a> {
    pub fn new(
        homography: Mat3,
        board_points: &'a [Pt2],
        pixel_points: &'a [Pt2],
    ) -> Result<Self, DistortionFitError> {
        if board_points.len() != pixel_points.len() {
            return Err(DistortionFitError::CountMismatch(
                board_points.len(),
                pixel_points.len(),
            ));
        }
        Ok(Self {
            homography,
            board_points,
            pixel_points,
        })
    }
}

fn normalized(k_inv: &Mat3, pixel: &Pt2) -> Vec2 {
    transform_point(k_inv, pixel).coords
}

/// Estimate distortion coefficients given intrinsics `K`.
pub fn estimate_distortion(
    kmtx: &Mat3,
    views: &[DistortionView<'_>],
    opts: DistortionFitOptions,
) -> Result<DistortionCoefficients, DistortionFitError> {
    let total_points: usize = views.iter().map(|v| v.board_points.len()).sum();
    let n_params = opts.param_count();
    let min_points = n_params.div_ceil(2) + 2;
    if total_points < min_points {
        return Err(DistortionFitError::NotEnoughPoints(min_points, total_points));
    }

    let k_inv = kmtx
        .try_inverse()
        .ok_or(DistortionFitError::IntrinsicsNotInvertible)?;

    let mut a = DMatrix::<Real>::zeros(2 * total_points, n_params);
    let mut b = DVector::<Real>::zeros(2 * total_points);
    let mut max_r2: Real = 0.0;

    let mut row = 0;
    for view in views {
        for (board_pt, pixel_obs) in view.board_points.iter().zip(view.pixel_points) {
            let n_ideal = normalized(&k_inv, &transform_point(&view.homography, board_pt));
            let n_obs = normalized(&k_inv, pixel_obs);
            let residual = n_obs - n_ideal;

            let (x, y) = (n_ideal.x, n_ideal.y);
            let r2 = x * x + y * y;
            let r4 = r2 * r2;
            max_r2 = max_r2.max(r2);

            let mut col = 0;
            a[(row, col)] = x * r2;
            a[(row + 1, col)] = y * r2;
            col += 1;

            a[(row, col)] = x * r4;
            a[(row + 1, col)] = y * r4;
            col += 1;

            if !opts.fix_k3 {
                let r6 = r4 * r2;
                a[(row, col)] = x * r6;
                a[(row + 1, col)] = y * r6;
                col += 1;
            }

            if !opts.fix_tangential {
                let xy = x * y;
                a[(row, col)] = 2.0 * xy;
                a[(row + 1, col)] = r2 + 2.0 * y * y;
                col += 1;

                a[(row, col)] = r2 + 2.0 * x * x;
                a[(row + 1, col)] = 2.0 * xy;
            }

            b[row] = residual.x;
            b[row + 1] = residual.y;
            row += 2;
        }
    }

    if max_r2 < 1e-6 {
        return Err(DistortionFitError::DegenerateConfiguration);
    }

    let x = a
        .svd(true, true)
        .solve(&b, 1e-10)
        .map_err(|_| DistortionFitError::SvdFailed)?;

    let mut params = x.iter().copied();
    let mut next = || params.next().unwrap_or(0.0);
    let k1 = next();
    let k2 = next();
    let k3 = if opts.fix_k3 { 0.0 } else { next() };
    let (p1, p2) = if opts.fix_tangential {
        (0.0, 0.0)
    } else {
        (next(), next())
    };

    Ok(DistortionCoefficients { k1, k2, p1, p2, k3 })
}
