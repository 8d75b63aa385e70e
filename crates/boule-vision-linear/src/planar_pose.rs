use boule_vision_core::{Iso3, Mat3, Real};
use nalgebra::{Matrix3, Rotation3, Translation3, UnitQuaternion, Vector3};

/// Pose of a planar board (`Z = 0`) in the camera frame from intrinsics `K`
/// and the board-to-pixel homography `H`.
///
/// The homography's arbitrary scale sign is resolved so the board lies in
/// front of the camera. Returns `None` when `K` is singular or `H` is
/// degenerate.
pub fn estimate_planar_pose(kmtx: &Mat3, hmtx: &Mat3) -> Option<Iso3> {
    let k_inv = kmtx.try_inverse()?;

    let k_inv_h1 = k_inv * hmtx.column(0);
    let k_inv_h2 = k_inv * hmtx.column(1);
    let k_inv_h3 = k_inv * hmtx.column(2);

    let mean_norm = 0.5 * (k_inv_h1.norm() + k_inv_h2.norm());
    if mean_norm <= Real::EPSILON {
        return None;
    }
    let mut lambda = 1.0 / mean_norm;
    if k_inv_h3.z < 0.0 {
        lambda = -lambda;
    }

    let r1 = lambda * k_inv_h1;
    let r2 = lambda * k_inv_h2;
    let r3 = r1.cross(&r2);
    let r_mat = Matrix3::from_columns(&[r1, r2, r3]);

    // Nearest rotation in the Frobenius sense.
    let svd = r_mat.svd(true, true);
    let mut u = svd.u?;
    let v_t = svd.v_t?;
    if (u * v_t).determinant() < 0.0 {
        u.column_mut(2).neg_mut();
    }
    let r_orth = u * v_t;

    let t: Vector3<Real> = lambda * k_inv_h3;
    let rot = UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(r_orth));
    Some(Iso3::from_parts(Translation3::from(t), rot))
}
