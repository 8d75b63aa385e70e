use serde::{Deserialize, Serialize};

use crate::{Mat3, MeasureError, MeasureResult, Real, Vec2};

/// Pinhole camera intrinsics (zero skew).
///
/// The corresponding calibration matrix `K` has the form:
///
/// ```text
/// [ fx   0  cx ]
/// [  0  fy  cy ]
/// [  0   0   1 ]
/// ```
///
/// Values are immutable once built; recalibration produces a new instance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    /// Focal length in pixels along X.
    pub fx: Real,
    /// Focal length in pixels along Y.
    pub fy: Real,
    /// Principal point X coordinate in pixels.
    pub cx: Real,
    /// Principal point Y coordinate in pixels.
    pub cy: Real,
}

impl Default for CameraIntrinsics {
    /// Approximate 1080p phone camera used when no calibration is available.
    fn default() -> Self {
        Self {
            fx: 1000.0,
            fy: 1000.0,
            cx: 960.0,
            cy: 540.0,
        }
    }
}

impl CameraIntrinsics {
    /// Build intrinsics, rejecting zero or non-finite focal lengths.
    pub fn new(fx: Real, fy: Real, cx: Real, cy: Real) -> MeasureResult<Self> {
        let k = Self { fx, fy, cx, cy };
        if !k.is_valid() {
            return Err(MeasureError::InvalidArgument(format!(
                "intrinsics need finite, non-zero focal lengths (fx={fx}, fy={fy}, cx={cx}, cy={cy})"
            )));
        }
        Ok(k)
    }

    /// Returns `true` when all values are finite and focal lengths are non-zero.
    pub fn is_valid(&self) -> bool {
        self.fx.is_finite()
            && self.fy.is_finite()
            && self.cx.is_finite()
            && self.cy.is_finite()
            && self.fx.abs() > 1e-12
            && self.fy.abs() > 1e-12
    }

    /// Build the 3×3 calibration matrix `K`.
    pub fn k_matrix(&self) -> Mat3 {
        Mat3::new(
            self.fx, 0.0, self.cx, 0.0, self.fy, self.cy, 0.0, 0.0, 1.0,
        )
    }

    /// Attempt to construct intrinsics from a 3×3 calibration matrix `K`.
    ///
    /// The matrix is normalised so that `K[2, 2] == 1` and must have the
    /// zero-skew upper-triangular form. Returns `None` otherwise.
    pub fn try_from_k_matrix(k: &Mat3) -> Option<Self> {
        let eps = 1e-9;
        let k33 = k[(2, 2)];
        if k33.abs() < eps {
            return None;
        }
        let k_norm = *k / k33;

        if k_norm[(0, 1)].abs() > eps
            || k_norm[(1, 0)].abs() > eps
            || k_norm[(2, 0)].abs() > eps
            || k_norm[(2, 1)].abs() > eps
        {
            return None;
        }

        let intr = Self {
            fx: k_norm[(0, 0)],
            fy: k_norm[(1, 1)],
            cx: k_norm[(0, 2)],
            cy: k_norm[(1, 2)],
        };
        intr.is_valid().then_some(intr)
    }

    /// Convert pixel coordinates into normalized (z = 1) coordinates.
    #[inline]
    pub fn pixel_to_normalized(&self, pixel: &Vec2) -> Vec2 {
        Vec2::new((pixel.x - self.cx) / self.fx, (pixel.y - self.cy) / self.fy)
    }

    /// Convert normalized (z = 1) coordinates into pixel coordinates.
    #[inline]
    pub fn normalized_to_pixel(&self, normalized: &Vec2) -> Vec2 {
        Vec2::new(
            self.fx * normalized.x + self.cx,
            self.fy * normalized.y + self.cy,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn k_matrix_roundtrip() {
        let k = CameraIntrinsics::new(800.0, 810.0, 640.0, 360.0).unwrap();
        let back = CameraIntrinsics::try_from_k_matrix(&(k.k_matrix() * 3.0)).unwrap();
        assert_eq!(back, k);
    }

    #[test]
    fn skewed_matrix_is_rejected() {
        let mut m = CameraIntrinsics::default().k_matrix();
        m[(0, 1)] = 0.5;
        assert!(CameraIntrinsics::try_from_k_matrix(&m).is_none());
    }

    #[test]
    fn zero_focal_length_is_invalid_argument() {
        let err = CameraIntrinsics::new(0.0, 800.0, 0.0, 0.0).unwrap_err();
        assert!(matches!(err, MeasureError::InvalidArgument(_)));
    }

    #[test]
    fn normalized_pixel_roundtrip() {
        let k = CameraIntrinsics::default();
        let px = Vec2::new(123.5, 987.25);
        let back = k.normalized_to_pixel(&k.pixel_to_normalized(&px));
        assert!((back - px).norm() < 1e-12);
    }
}
