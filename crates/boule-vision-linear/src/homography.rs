//! Homography estimation (plane-induced projective transform).
//!
//! Implements the normalized Direct Linear Transform. The homography `H` maps
//! **board points** on a plane to **image points** in pixels: `x' ~ H x`.

use boule_vision_core::{Mat3, Pt2};
use nalgebra::DMatrix;
use thiserror::Error;

use crate::math::normalize_points_2d;

/// Errors that can occur during homography estimation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HomographyError {
    #[error("need at least 4 point correspondences, got {0}")]
    NotEnoughPoints(usize),
    #[error("board / image point counts differ: {0} vs {1}")]
    CountMismatch(usize, usize),
    #[error("degenerate point configuration for normalization")]
    Degenerate,
    #[error("svd failed during homography estimation")]
    SvdFailed,
}

/// Estimate `H` such that `x' ~ H x` using the normalized DLT.
///
/// Uses Hartley normalization on both point sets and solves `A h = 0` via
/// SVD. The result is scaled so that `H[2,2] == 1` when possible.
pub fn dlt_homography(board: &[Pt2], image: &[Pt2]) -> Result<Mat3, HomographyError> {
    let n = board.len();
    if image.len() != n {
        return Err(HomographyError::CountMismatch(n, image.len()));
    }
    if n < 4 {
        return Err(HomographyError::NotEnoughPoints(n));
    }

    let (board_n, t_b) = normalize_points_2d(board).ok_or(HomographyError::Degenerate)?;
    let (image_n, t_i) = normalize_points_2d(image).ok_or(HomographyError::Degenerate)?;

    // Pad to at least 9 rows so the SVD exposes the full null space.
    let rows = (2 * n).max(9);
    let mut a = DMatrix::<f64>::zeros(rows, 9);

    for (i, (pb, pi)) in board_n.iter().zip(image_n.iter()).enumerate() {
        let (x, y) = (pb.x, pb.y);
        let (u, v) = (pi.x, pi.y);
        let r0 = 2 * i;
        let r1 = r0 + 1;

        a[(r0, 0)] = -x;
        a[(r0, 1)] = -y;
        a[(r0, 2)] = -1.0;
        a[(r0, 6)] = u * x;
        a[(r0, 7)] = u * y;
        a[(r0, 8)] = u;

        a[(r1, 3)] = -x;
        a[(r1, 4)] = -y;
        a[(r1, 5)] = -1.0;
        a[(r1, 6)] = v * x;
        a[(r1, 7)] = v * y;
        a[(r1, 8)] = v;
    }

    let svd = a.svd(false, true);
    let v_t = svd.v_t.ok_or(HomographyError::SvdFailed)?;
    let (min_idx, _) = svd.singular_values.argmin();
    let h_vec = v_t.row(min_idx);

    let mut h = Mat3::zeros();
    for r in 0..3 {
        for c in 0..3 {
            h[(r, c)] = h_vec[3 * r + c];
        }
    }

    let t_i_inv = t_i.try_inverse().ok_or(HomographyError::Degenerate)?;
    h = t_i_inv * h * t_b;

    let scale = h[(2, 2)];
    if scale.abs() > f64::EPSILON {
        h /= scale;
    }
    Ok(h)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::transform_point;

    #[test]
    fn scaled_square_homography() {
        let w = vec![
            Pt2::new(0.0, 0.0),
            Pt2::new(1.0, 0.0),
            Pt2::new(1.0, 1.0),
            Pt2::new(0.0, 1.0),
        ];
        let img = vec![
            Pt2::new(0.0, 0.0),
            Pt2::new(2.0, 0.0),
            Pt2::new(2.0, 2.0),
            Pt2::new(0.0, 2.0),
        ];

        let h = dlt_homography(&w, &img).unwrap();
        assert!((h[(0, 0)] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn projective_map_is_recovered() {
        let h_gt = Mat3::new(800.0, 20.0, 640.0, -15.0, 780.0, 360.0, 0.1, -0.05, 1.0);
        let board: Vec<Pt2> = (0..5)
            .flat_map(|j| (0..4).map(move |i| Pt2::new(i as f64 * 0.1, j as f64 * 0.1)))
            .collect();
        let image: Vec<Pt2> = board.iter().map(|p| transform_point(&h_gt, p)).collect();

        let h = dlt_homography(&board, &image).unwrap();
        for (b, i) in board.iter().zip(&image) {
            assert!((transform_point(&h, b) - i).norm() < 1e-6);
        }
    }

    #[test]
    fn too_few_points_is_an_error() {
        let pts = vec![Pt2::new(0.0, 0.0); 3];
        assert_eq!(
            dlt_homography(&pts, &pts),
            Err(HomographyError::NotEnoughPoints(3))
        );
    }
}
