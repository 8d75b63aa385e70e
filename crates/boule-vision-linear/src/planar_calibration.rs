//! Intrinsics and distortion from planar target views.
//!
//! Alternates between a closed-form `K` estimate from homographies and a
//! linear distortion fit:
//!
//! 1. `K` from homographies of the raw (distorted) pixels.
//! 2. Per iteration: homographies of the current undistorted pixels,
//!    distortion fitted against the raw pixels, pixels undistorted again
//!    and `K` re-estimated.
//!
//! Homographies are computed on pixels conditioned by the image size so that
//! focal lengths of any magnitude give a well-scaled linear system.

use boule_vision_core::{
    CameraIntrinsics, Mat3, MeasureError, PinholeCamera, PlanarView, Pt2, Pt3, Real,
    UNDISTORT_ITERS, pixel_distance,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::distortion_fit::{
    DistortionFitError, DistortionFitOptions, DistortionView, estimate_distortion,
};
use crate::homography::{HomographyError, dlt_homography};
use crate::planar_pose::estimate_planar_pose;
use crate::zhang_intrinsics::{IntrinsicsInitError, estimate_focal_lengths, estimate_intrinsics};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanarCalibrationError {
    #[error("no usable calibration views")]
    NoViews,
    #[error("invalid image size {0}x{1}")]
    InvalidImageSize(u32, u32),
    #[error("homography for view {view}: {source}")]
    Homography {
        view: usize,
        #[source]
        source: HomographyError,
    },
    #[error(transparent)]
    Intrinsics(#[from] IntrinsicsInitError),
    #[error(transparent)]
    Distortion(#[from] DistortionFitError),
    #[error("cannot recover board pose for view {0}")]
    Pose(usize),
}

impl From<PlanarCalibrationError> for MeasureError {
    fn from(err: PlanarCalibrationError) -> Self {
        MeasureError::Calibration(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanarCalibrationOptions {
    /// Alternations of distortion fit and `K` re-estimation. Zero yields an
    /// ideal-lens calibration.
    pub iterations: usize,
    pub fix_k3: bool,
    pub fix_tangential: bool,
    /// Fixed-point iterations for undistorting pixels between alternations.
    pub undistort_iters: u32,
}

impl Default for PlanarCalibrationOptions {
    fn default() -> Self {
        Self {
            iterations: 2,
            fix_k3: true,
            fix_tangential: false,
            undistort_iters: UNDISTORT_ITERS,
        }
    }
}

/// Calibration outcome with reprojection statistics in pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanarCalibration {
    pub camera: PinholeCamera,
    /// Root-mean-square reprojection error over all corners.
    pub rms_error: Real,
    pub per_view_rms: Vec<Real>,
    pub views_used: usize,
}

/// Pixel conditioning `p' = s * (p - c)` with `c` the image centre.
#[derive(Debug, Clone, Copy)]
struct Conditioning {
    scale: Real,
    cx: Real,
    cy: Real,
}

impl Conditioning {
    fn for_image(width: u32, height: u32) -> Self {
        Self {
            scale: 2.0 / (Real::from(width) + Real::from(height)),
            cx: 0.5 * Real::from(width),
            cy: 0.5 * Real::from(height),
        }
    }

    fn apply(&self, p: &Pt2) -> Pt2 {
        Pt2::new(self.scale * (p.x - self.cx), self.scale * (p.y - self.cy))
    }

    fn denormalize(&self, k: &CameraIntrinsics) -> CameraIntrinsics {
        CameraIntrinsics {
            fx: k.fx / self.scale,
            fy: k.fy / self.scale,
            cx: k.cx / self.scale + self.cx,
            cy: k.cy / self.scale + self.cy,
        }
    }
}

fn homographies(
    views: &[PlanarView],
    pixels: &[Vec<Pt2>],
) -> Result<Vec<Mat3>, PlanarCalibrationError> {
    views
        .iter()
        .zip(pixels)
        .enumerate()
        .map(|(view, (v, px))| {
            dlt_homography(&v.board_points, px)
                .map_err(|source| PlanarCalibrationError::Homography { view, source })
        })
        .collect()
}

fn estimate_k(
    views: &[PlanarView],
    pixels: &[Vec<Pt2>],
    cond: &Conditioning,
) -> Result<CameraIntrinsics, PlanarCalibrationError> {
    let conditioned: Vec<Vec<Pt2>> = pixels
        .iter()
        .map(|px| px.iter().map(|p| cond.apply(p)).collect())
        .collect();
    let hs = homographies(views, &conditioned)?;

    let k = if hs.len() >= 3 {
        estimate_intrinsics(&hs)?
    } else {
        // Principal point pinned at the image centre.
        estimate_focal_lengths(&hs, Pt2::origin())?
    };
    Ok(cond.denormalize(&k))
}

fn undistort_all(
    views: &[PlanarView],
    camera: &PinholeCamera,
    iters: u32,
) -> Vec<Vec<Pt2>> {
    let intr = &camera.intrinsics;
    views
        .iter()
        .map(|v| {
            v.pixel_points
                .iter()
                .map(|p| {
                    let n = intr.pixel_to_normalized(&p.coords);
                    let u = camera.distortion.undistort_with_iters(&n, iters);
                    Pt2::from(intr.normalized_to_pixel(&u))
                })
                .collect()
        })
        .collect()
}

/// Calibrate a camera from planar views of a known target.
///
/// Uses the zero-skew closed form with three or more views. With one or two
/// views the principal point is fixed at the image centre and only focal
/// lengths are estimated.
pub fn calibrate_planar(
    views: &[PlanarView],
    image_size: (u32, u32),
    opts: &PlanarCalibrationOptions,
) -> Result<PlanarCalibration, PlanarCalibrationError> {
    let (width, height) = image_size;
    if width == 0 || height == 0 {
        return Err(PlanarCalibrationError::InvalidImageSize(width, height));
    }
    if views.is_empty() {
        return Err(PlanarCalibrationError::NoViews);
    }

    let cond = Conditioning::for_image(width, height);
    let raw: Vec<Vec<Pt2>> = views.iter().map(|v| v.pixel_points.clone()).collect();
    let fit_opts = DistortionFitOptions {
        fix_k3: opts.fix_k3,
        fix_tangential: opts.fix_tangential,
    };

    let mut camera = PinholeCamera::ideal(estimate_k(views, &raw, &cond)?);
    log::debug!("initial intrinsics: {:?}", camera.intrinsics);

    let mut current = raw;
    for iter in 0..opts.iterations {
        let hs = homographies(views, &current)?;
        let dist_views = views
            .iter()
            .zip(&hs)
            .map(|(v, h)| DistortionView::new(*h, &v.board_points, &v.pixel_points))
            .collect::<Result<Vec<_>, _>>()?;
        let distortion =
            estimate_distortion(&camera.intrinsics.k_matrix(), &dist_views, fit_opts)?;

        let undistorter = PinholeCamera::new(camera.intrinsics, distortion);
        current = undistort_all(views, &undistorter, opts.undistort_iters);
        let intrinsics = estimate_k(views, &current, &cond)?;
        camera = PinholeCamera::new(intrinsics, distortion);
        log::debug!(
            "iteration {}: intrinsics {:?}, distortion {:?}",
            iter + 1,
            camera.intrinsics,
            camera.distortion
        );
    }

    let per_view_rms = reprojection_errors(&camera, views, opts.undistort_iters)?;
    let total_sq: Real = per_view_rms
        .iter()
        .zip(views)
        .map(|(rms, v)| rms * rms * v.len() as Real)
        .sum();
    let total_points: usize = views.iter().map(PlanarView::len).sum();
    let rms_error = (total_sq / total_points.max(1) as Real).sqrt();

    Ok(PlanarCalibration {
        camera,
        rms_error,
        per_view_rms,
        views_used: views.len(),
    })
}

/// Per-view RMS reprojection error of `camera` against the observations.
///
/// Each board pose is recovered from the homography of the undistorted
/// pixels, then the board is reprojected with distortion.
pub fn reprojection_errors(
    camera: &PinholeCamera,
    views: &[PlanarView],
    undistort_iters: u32,
) -> Result<Vec<Real>, PlanarCalibrationError> {
    let undistorted = undistort_all(views, camera, undistort_iters);
    let hs = homographies(views, &undistorted)?;
    let kmtx = camera.intrinsics.k_matrix();

    views
        .iter()
        .zip(&hs)
        .enumerate()
        .map(|(idx, (view, h))| {
            let pose = estimate_planar_pose(&kmtx, h).ok_or(PlanarCalibrationError::Pose(idx))?;
            let mut sq = 0.0;
            for (bp, obs) in view.board_points.iter().zip(&view.pixel_points) {
                let pc = pose.transform_point(&Pt3::new(bp.x, bp.y, 0.0));
                let proj = camera
                    .project_distorted(&pc)
                    .ok_or(PlanarCalibrationError::Pose(idx))?;
                sq += pixel_distance(&proj, obs).powi(2);
            }
            Ok((sq / view.len().max(1) as Real).sqrt())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_view() -> PlanarView {
        let board = vec![
            Pt2::new(0.0, 0.0),
            Pt2::new(1.0, 0.0),
            Pt2::new(1.0, 1.0),
            Pt2::new(0.0, 1.0),
        ];
        let pixels = board.iter().map(|p| Pt2::new(100.0 + 50.0 * p.x, 80.0 + 50.0 * p.y)).collect();
        PlanarView::new(board, pixels).unwrap()
    }

    #[test]
    fn empty_input_is_rejected() {
        let opts = PlanarCalibrationOptions::default();
        assert_eq!(
            calibrate_planar(&[], (640, 480), &opts),
            Err(PlanarCalibrationError::NoViews)
        );
        assert_eq!(
            calibrate_planar(&[square_view()], (0, 480), &opts),
            Err(PlanarCalibrationError::InvalidImageSize(0, 480))
        );
    }

    #[test]
    fn fronto_parallel_single_view_is_degenerate() {
        let err = calibrate_planar(&[square_view()], (640, 480), &PlanarCalibrationOptions::default())
            .unwrap_err();
        assert!(matches!(err, PlanarCalibrationError::Intrinsics(_)), "{err}");
        let measure: MeasureError = err.into();
        assert!(matches!(measure, MeasureError::Calibration(_)));
    }

    #[test]
    fn conditioning_handles_largest_image_sizes() {
        let cond = Conditioning::for_image(u32::MAX, u32::MAX);
        assert!(cond.scale.is_finite() && cond.scale > 0.0);
        assert_eq!(cond.cx, 0.5 * Real::from(u32::MAX));

        // Returns an outcome instead of overflowing.
        let _ = calibrate_planar(
            &[square_view()],
            (u32::MAX, 720),
            &PlanarCalibrationOptions::default(),
        );
    }

    #[test]
    fn options_fill_missing_fields_with_defaults() {
        let opts: PlanarCalibrationOptions =
            serde_json::from_str(r#"{ "iterations": 5, "fix_k3": false }"#).unwrap();
        assert_eq!(opts.iterations, 5);
        assert!(!opts.fix_k3);
        assert!(!opts.fix_tangential);
        assert_eq!(opts.undistort_iters, UNDISTORT_ITERS);
    }

    #[test]
    fn conditioning_roundtrips_intrinsics() {
        let cond = Conditioning::for_image(1920, 1080);
        let k = CameraIntrinsics::default();
        let conditioned = CameraIntrinsics {
            fx: k.fx * cond.scale,
            fy: k.fy * cond.scale,
            cx: (k.cx - cond.cx) * cond.scale,
            cy: (k.cy - cond.cy) * cond.scale,
        };
        let back = cond.denormalize(&conditioned);
        assert!((back.fx - k.fx).abs() < 1e-9);
        assert!((back.cy - k.cy).abs() < 1e-9);
    }
}
