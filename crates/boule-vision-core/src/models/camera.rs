use serde::{Deserialize, Serialize};

use super::{CameraIntrinsics, DistortionCoefficients};
use crate::{Pt2, Pt3, Real, Vec2};

/// Rectangular region of valid pixels in an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roi {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Pinhole camera with Brown-Conrady lens distortion.
///
/// `pixel = K(distort(X / Z, Y / Z))`
///
/// [`PinholeCamera::pixel_to_point3d`] and [`PinholeCamera::project`] use the
/// ideal pinhole part only; they expect pixels that are already undistorted
/// (or a lens whose distortion is negligible).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PinholeCamera {
    pub intrinsics: CameraIntrinsics,
    pub distortion: DistortionCoefficients,
}

impl PinholeCamera {
    pub fn new(intrinsics: CameraIntrinsics, distortion: DistortionCoefficients) -> Self {
        Self {
            intrinsics,
            distortion,
        }
    }

    /// Camera without lens distortion.
    pub fn ideal(intrinsics: CameraIntrinsics) -> Self {
        Self::new(intrinsics, DistortionCoefficients::default())
    }

    /// Inverse pinhole projection of a pixel at a known depth along the optical axis.
    ///
    /// `X = (x - cx) * depth / fx`, `Y = (y - cy) * depth / fy`, `Z = depth`.
    pub fn pixel_to_point3d(&self, pixel: &Pt2, depth: Real) -> Pt3 {
        let k = &self.intrinsics;
        Pt3::new(
            (pixel.x - k.cx) * depth / k.fx,
            (pixel.y - k.cy) * depth / k.fy,
            depth,
        )
    }

    /// Ideal pinhole projection of a camera-frame point into pixels.
    ///
    /// Returns `None` for points on or behind the camera plane.
    pub fn project(&self, p_c: &Pt3) -> Option<Pt2> {
        if p_c.z <= 0.0 {
            return None;
        }
        let n = Vec2::new(p_c.x / p_c.z, p_c.y / p_c.z);
        Some(self.intrinsics.normalized_to_pixel(&n).into())
    }

    /// Full projection including lens distortion.
    pub fn project_distorted(&self, p_c: &Pt3) -> Option<Pt2> {
        if p_c.z <= 0.0 {
            return None;
        }
        let n = Vec2::new(p_c.x / p_c.z, p_c.y / p_c.z);
        let n_d = self.distortion.distort(&n);
        Some(self.intrinsics.normalized_to_pixel(&n_d).into())
    }

    /// Map a measured (distorted) pixel to its ideal pinhole position.
    pub fn undistort_pixel(&self, pixel: &Pt2) -> Pt2 {
        let n_d = self.intrinsics.pixel_to_normalized(&pixel.coords);
        let n_u = self.distortion.undistort(&n_d);
        self.intrinsics.normalized_to_pixel(&n_u).into()
    }

    /// Map an ideal pinhole pixel to where the lens actually images it.
    pub fn distort_pixel(&self, pixel: &Pt2) -> Pt2 {
        let n_u = self.intrinsics.pixel_to_normalized(&pixel.coords);
        let n_d = self.distortion.distort(&n_u);
        self.intrinsics.normalized_to_pixel(&n_d).into()
    }

    /// New intrinsics that keep every source pixel after undistortion, plus
    /// the rectangle of the undistorted image where all pixels are valid.
    ///
    /// Mirrors the `alpha = 1` behaviour of the usual "optimal new camera
    /// matrix" computation. Returns `None` for images smaller than 2×2 or when
    /// the undistorted border collapses.
    pub fn optimal_new_intrinsics(&self, width: u32, height: u32) -> Option<(CameraIntrinsics, Roi)> {
        const STEPS: usize = 9;
        const EDGE_EPS: Real = 1e-6;

        if width < 2 || height < 2 {
            return None;
        }
        let w = (width - 1) as Real;
        let h = (height - 1) as Real;

        let (mut min_x, mut min_y) = (Real::INFINITY, Real::INFINITY);
        let (mut max_x, mut max_y) = (Real::NEG_INFINITY, Real::NEG_INFINITY);
        let (mut left, mut top) = (Real::NEG_INFINITY, Real::NEG_INFINITY);
        let (mut right, mut bottom) = (Real::INFINITY, Real::INFINITY);

        for j in 0..STEPS {
            for i in 0..STEPS {
                let px = Vec2::new(
                    w * i as Real / (STEPS - 1) as Real,
                    h * j as Real / (STEPS - 1) as Real,
                );
                let n = self
                    .distortion
                    .undistort(&self.intrinsics.pixel_to_normalized(&px));
                min_x = min_x.min(n.x);
                min_y = min_y.min(n.y);
                max_x = max_x.max(n.x);
                max_y = max_y.max(n.y);
                if i == 0 {
                    left = left.max(n.x);
                }
                if i == STEPS - 1 {
                    right = right.min(n.x);
                }
                if j == 0 {
                    top = top.max(n.y);
                }
                if j == STEPS - 1 {
                    bottom = bottom.min(n.y);
                }
            }
        }

        let span_x = max_x - min_x;
        let span_y = max_y - min_y;
        if !(span_x > 0.0 && span_y > 0.0) {
            return None;
        }

        let fx = w / span_x;
        let fy = h / span_y;
        let new_k = CameraIntrinsics {
            fx,
            fy,
            cx: -fx * min_x,
            cy: -fy * min_y,
        };

        let tl = new_k.normalized_to_pixel(&Vec2::new(left, top));
        let br = new_k.normalized_to_pixel(&Vec2::new(right, bottom));
        let x0 = (tl.x - EDGE_EPS).ceil().clamp(0.0, w);
        let y0 = (tl.y - EDGE_EPS).ceil().clamp(0.0, h);
        let x1 = (br.x + EDGE_EPS).floor().clamp(0.0, w);
        let y1 = (br.y + EDGE_EPS).floor().clamp(0.0, h);
        if x1 < x0 || y1 < y0 {
            return None;
        }

        let roi = Roi {
            x: x0 as u32,
            y: y0 as u32,
            width: (x1 - x0) as u32 + 1,
            height: (y1 - y0) as u32 + 1,
        };
        Some((new_k, roi))
    }
}
