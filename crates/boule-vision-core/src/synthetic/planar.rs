//! Synthetic checkerboard views.

use anyhow::Result;
use nalgebra::{Translation3, UnitQuaternion, Vector3};

use super::noise::UniformPixelNoise;
use crate::{CheckerboardPattern, Iso3, PinholeCamera, PlanarView, Pt2, Pt3, Real};

/// Board poses that tilt around X and Y and step back along Z.
///
/// The board origin is shifted so its centre stays near the optical axis.
pub fn board_poses(pattern: &CheckerboardPattern, n_views: usize, base_z: Real) -> Vec<Iso3> {
    let half_w = 0.5 * (pattern.columns.saturating_sub(1)) as Real * pattern.square_size;
    let half_h = 0.5 * (pattern.rows.saturating_sub(1)) as Real * pattern.square_size;

    (0..n_views)
        .map(|idx| {
            let phase = idx as Real;
            let roll = 0.25 * (phase * 1.3).sin();
            let pitch = 0.3 * (phase * 0.9 + 0.5).cos();
            let yaw = 0.1 * (phase * 0.7).sin();
            let rotation = UnitQuaternion::from_euler_angles(roll, pitch, yaw);
            let centre = rotation * Vector3::new(half_w, half_h, 0.0);
            let z = base_z + 0.08 * phase;
            let translation = Vector3::new(-centre.x + 0.02 * phase, -centre.y, z - centre.z);
            Iso3::from_parts(Translation3::from(translation), rotation)
        })
        .collect()
}

/// Project the board through `camera` (with distortion) at the given pose.
///
/// Fails if any corner lands behind the camera.
pub fn project_view(
    camera: &PinholeCamera,
    cam_from_board: &Iso3,
    board_points: &[Pt2],
) -> Result<PlanarView> {
    let mut pixels = Vec::with_capacity(board_points.len());
    for (idx, bp) in board_points.iter().enumerate() {
        let pc = cam_from_board.transform_point(&Pt3::new(bp.x, bp.y, 0.0));
        let Some(uv) = camera.project_distorted(&pc) else {
            anyhow::bail!("corner {idx} not projectable (z={:.6})", pc.z);
        };
        pixels.push(uv);
    }
    Ok(PlanarView::new(board_points.to_vec(), pixels)?)
}

/// Project the board at every pose and add deterministic pixel noise.
pub fn project_views(
    camera: &PinholeCamera,
    pattern: &CheckerboardPattern,
    poses: &[Iso3],
    noise: UniformPixelNoise,
) -> Result<Vec<PlanarView>> {
    let board = pattern.board_points();
    poses
        .iter()
        .enumerate()
        .map(|(view_idx, pose)| {
            let mut view = project_view(camera, pose, &board)?;
            for (point_idx, px) in view.pixel_points.iter_mut().enumerate() {
                *px += noise.sample(view_idx, point_idx);
            }
            Ok(view)
        })
        .collect()
}
