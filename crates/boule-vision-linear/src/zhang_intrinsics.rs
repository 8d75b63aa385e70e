//! Closed-form intrinsics from plane homographies.
//!
//! The zero-skew variant of Zhang's method: every homography `H = K [r1 r2 t]`
//! contributes two linear constraints on the conic `B = K^-T K^-1`. With the
//! skew fixed at zero, `B` has five unknowns and three views determine it.
//! For one or two views the principal point must be supplied and only the
//! focal lengths are solved.

use boule_vision_core::{CameraIntrinsics, Mat3, Pt2, Real};
use nalgebra::{DMatrix, DVector, SVector};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum IntrinsicsInitError {
    #[error("need at least {required} homographies, got {got}")]
    NotEnoughHomographies { required: usize, got: usize },
    #[error("svd failed during intrinsics estimation")]
    SvdFailed,
    #[error("degenerate view configuration for intrinsics estimation")]
    Degenerate,
}

/// Constraint vector on `b = [B11, B22, B13, B23, B33]` for columns `i`, `j`.
fn v_ij(hmtx: &Mat3, i: usize, j: usize) -> SVector<Real, 5> {
    let hi = hmtx.column(i);
    let hj = hmtx.column(j);

    SVector::<Real, 5>::from_row_slice(&[
        hi[0] * hj[0],
        hi[1] * hj[1],
        hi[2] * hj[0] + hi[0] * hj[2],
        hi[2] * hj[1] + hi[1] * hj[2],
        hi[2] * hj[2],
    ])
}

/// Estimate zero-skew intrinsics from at least three homographies.
pub fn estimate_intrinsics(hmtxs: &[Mat3]) -> Result<CameraIntrinsics, IntrinsicsInitError> {
    if hmtxs.len() < 3 {
        return Err(IntrinsicsInitError::NotEnoughHomographies {
            required: 3,
            got: hmtxs.len(),
        });
    }

    let m = hmtxs.len();
    let rows = (2 * m).max(5);
    let mut vmtx = DMatrix::<Real>::zeros(rows, 5);

    for (k, hmtx) in hmtxs.iter().enumerate() {
        let v11 = v_ij(hmtx, 0, 0);
        let v22 = v_ij(hmtx, 1, 1);
        let v12 = v_ij(hmtx, 0, 1);

        vmtx.row_mut(2 * k).copy_from(&v12.transpose());
        vmtx.row_mut(2 * k + 1).copy_from(&(v11 - v22).transpose());
    }

    let svd = vmtx.svd(false, true);
    let v_t = svd.v_t.ok_or(IntrinsicsInitError::SvdFailed)?;
    let (min_idx, _) = svd.singular_values.argmin();
    let mut b = v_t.row(min_idx).transpose();

    // B is only known up to sign; B11 = 1 / fx^2 must be positive.
    if b[0] < 0.0 {
        b = -b;
    }
    let (b11, b22, b13, b23, b33) = (b[0], b[1], b[2], b[3], b[4]);
    if b11 <= Real::EPSILON || b22 <= Real::EPSILON {
        return Err(IntrinsicsInitError::Degenerate);
    }

    let v0 = -b23 / b22;
    let lambda = b33 - (b13 * b13 - v0 * b11 * b23) / b11;
    if lambda <= 0.0 {
        return Err(IntrinsicsInitError::Degenerate);
    }

    let fx = (lambda / b11).sqrt();
    let fy = (lambda / b22).sqrt();
    let u0 = -b13 * fx * fx / lambda;

    let intr = CameraIntrinsics {
        fx,
        fy,
        cx: u0,
        cy: v0,
    };
    if intr.is_valid() {
        Ok(intr)
    } else {
        Err(IntrinsicsInitError::Degenerate)
    }
}

/// Estimate focal lengths from one or more homographies given the principal
/// point.
///
/// With the principal point moved to the origin, `B = diag(1/fx^2, 1/fy^2, 1)`
/// and each view gives two linear equations in `1/fx^2` and `1/fy^2`.
pub fn estimate_focal_lengths(
    hmtxs: &[Mat3],
    principal_point: Pt2,
) -> Result<CameraIntrinsics, IntrinsicsInitError> {
    if hmtxs.is_empty() {
        return Err(IntrinsicsInitError::NotEnoughHomographies {
            required: 1,
            got: 0,
        });
    }

    let shift = Mat3::new(
        1.0,
        0.0,
        -principal_point.x,
        0.0,
        1.0,
        -principal_point.y,
        0.0,
        0.0,
        1.0,
    );

    let m = hmtxs.len();
    let mut a = DMatrix::<Real>::zeros(2 * m, 2);
    let mut rhs = DVector::<Real>::zeros(2 * m);

    for (k, hmtx) in hmtxs.iter().enumerate() {
        let h = shift * hmtx;
        let h1 = h.column(0);
        let h2 = h.column(1);

        a[(2 * k, 0)] = h1[0] * h2[0];
        a[(2 * k, 1)] = h1[1] * h2[1];
        rhs[2 * k] = -h1[2] * h2[2];

        a[(2 * k + 1, 0)] = h1[0] * h1[0] - h2[0] * h2[0];
        a[(2 * k + 1, 1)] = h1[1] * h1[1] - h2[1] * h2[1];
        rhs[2 * k + 1] = -(h1[2] * h1[2] - h2[2] * h2[2]);
    }

    let x = a
        .svd(true, true)
        .solve(&rhs, 1e-12)
        .map_err(|_| IntrinsicsInitError::SvdFailed)?;
    let (b11, b22) = (x[0], x[1]);
    if !(b11 > 0.0 && b22 > 0.0) {
        return Err(IntrinsicsInitError::Degenerate);
    }

    let intr = CameraIntrinsics {
        fx: 1.0 / b11.sqrt(),
        fy: 1.0 / b22.sqrt(),
        cx: principal_point.x,
        cy: principal_point.y,
    };
    if intr.is_valid() {
        Ok(intr)
    } else {
        Err(IntrinsicsInitError::Degenerate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Rotation3, Vector3};

    fn kmtx() -> Mat3 {
        CameraIntrinsics {
            fx: 900.0,
            fy: 880.0,
            cx: 640.0,
            cy: 360.0,
        }
        .k_matrix()
    }

    fn synthetic_homography(kmtx: &Mat3, rot: Rotation3<Real>, t: Vector3<Real>) -> Mat3 {
        let r = rot.matrix();
        let mut hmtx = Mat3::zeros();
        hmtx.set_column(0, &(kmtx * r.column(0)));
        hmtx.set_column(1, &(kmtx * r.column(1)));
        hmtx.set_column(2, &(kmtx * t));
        hmtx
    }

    fn homographies() -> Vec<Mat3> {
        let k = kmtx();
        vec![
            synthetic_homography(
                &k,
                Rotation3::from_euler_angles(0.1, 0.0, 0.05),
                Vector3::new(0.1, -0.05, 1.0),
            ),
            synthetic_homography(
                &k,
                Rotation3::from_euler_angles(-0.05, 0.15, -0.1),
                Vector3::new(-0.05, 0.1, 1.2),
            ),
            synthetic_homography(
                &k,
                Rotation3::from_euler_angles(0.2, -0.1, 0.0),
                Vector3::new(0.0, 0.0, 0.9),
            ),
            synthetic_homography(
                &k,
                Rotation3::from_euler_angles(-0.15, -0.2, 0.3),
                Vector3::new(0.05, 0.02, 1.1),
            ),
        ]
    }

    #[test]
    fn intrinsics_from_homographies_recovers_kmtx() {
        // Arbitrary per-view scale and sign must not matter.
        let hs: Vec<Mat3> = homographies()
            .into_iter()
            .enumerate()
            .map(|(i, h)| if i % 2 == 0 { h * 3.0 } else { h * -0.5 })
            .collect();

        let intr = estimate_intrinsics(&hs).unwrap();
        assert!((intr.fx - 900.0).abs() < 1e-3, "fx = {}", intr.fx);
        assert!((intr.fy - 880.0).abs() < 1e-3, "fy = {}", intr.fy);
        assert!((intr.cx - 640.0).abs() < 1e-3, "cx = {}", intr.cx);
        assert!((intr.cy - 360.0).abs() < 1e-3, "cy = {}", intr.cy);
    }

    #[test]
    fn focal_lengths_from_single_view_with_known_principal_point() {
        let hs = homographies();
        let intr = estimate_focal_lengths(&hs[3..], Pt2::new(640.0, 360.0)).unwrap();
        assert!((intr.fx - 900.0).abs() < 1e-3, "fx = {}", intr.fx);
        assert!((intr.fy - 880.0).abs() < 1e-3, "fy = {}", intr.fy);
    }

    #[test]
    fn too_few_homographies() {
        let hs = homographies();
        assert_eq!(
            estimate_intrinsics(&hs[..2]),
            Err(IntrinsicsInitError::NotEnoughHomographies {
                required: 3,
                got: 2
            })
        );
        assert!(estimate_focal_lengths(&[], Pt2::origin()).is_err());
    }
}
