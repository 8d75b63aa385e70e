use serde::{Deserialize, Serialize};

use crate::{Real, Vec2};

/// Brown-Conrady radial-tangential distortion with five coefficients.
///
/// Coefficients are stored and exchanged in the conventional
/// `(k1, k2, p1, p2, k3)` order. All-zero coefficients describe an ideal lens.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DistortionCoefficients {
    pub k1: Real,
    pub k2: Real,
    pub p1: Real,
    pub p2: Real,
    pub k3: Real,
}

/// Fixed-point iterations used to invert the distortion model.
pub const UNDISTORT_ITERS: u32 = 8;

impl DistortionCoefficients {
    /// Build coefficients from a `(k1, k2, p1, p2, k3)` array.
    pub fn from_array(c: [Real; 5]) -> Self {
        Self {
            k1: c[0],
            k2: c[1],
            p1: c[2],
            p2: c[3],
            k3: c[4],
        }
    }

    /// Coefficients as a `(k1, k2, p1, p2, k3)` array.
    pub fn to_array(&self) -> [Real; 5] {
        [self.k1, self.k2, self.p1, self.p2, self.k3]
    }

    pub fn is_zero(&self) -> bool {
        self.to_array().iter().all(|c| *c == 0.0)
    }

    /// Apply distortion to undistorted normalized coordinates.
    pub fn distort(&self, n: &Vec2) -> Vec2 {
        let (x, y) = (n.x, n.y);
        let r2 = x * x + y * y;
        let r4 = r2 * r2;
        let r6 = r4 * r2;

        let radial = 1.0 + self.k1 * r2 + self.k2 * r4 + self.k3 * r6;

        let xy = x * y;
        let x_tan = 2.0 * self.p1 * xy + self.p2 * (r2 + 2.0 * x * x);
        let y_tan = self.p1 * (r2 + 2.0 * y * y) + 2.0 * self.p2 * xy;

        Vec2::new(x * radial + x_tan, y * radial + y_tan)
    }

    /// Invert [`Self::distort`] by fixed-point iteration.
    pub fn undistort(&self, n_dist: &Vec2) -> Vec2 {
        self.undistort_with_iters(n_dist, UNDISTORT_ITERS)
    }

    pub fn undistort_with_iters(&self, n_dist: &Vec2, iters: u32) -> Vec2 {
        if self.is_zero() {
            return *n_dist;
        }
        let mut n = *n_dist;
        for _ in 0..iters.max(1) {
            let err = self.distort(&n) - n_dist;
            n -= err;
        }
        n
    }
}
