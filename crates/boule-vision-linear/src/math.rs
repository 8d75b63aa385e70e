//! Shared numerical helpers.

use boule_vision_core::{Mat3, Pt2};

/// Hartley normalization of 2D points.
///
/// Returns the normalized points (zero mean, mean distance `sqrt(2)` from the
/// origin) and the similarity `T` such that `p_norm = T * p`. Returns `None`
/// for empty input or when all points coincide.
pub fn normalize_points_2d(points: &[Pt2]) -> Option<(Vec<Pt2>, Mat3)> {
    if points.is_empty() {
        return None;
    }

    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    let cx = sx / n;
    let cy = sy / n;

    let mean_dist = points
        .iter()
        .map(|p| ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt())
        .sum::<f64>()
        / n;

    if mean_dist <= f64::EPSILON {
        return None;
    }

    let scale = 2.0_f64.sqrt() / mean_dist;
    let t = Mat3::new(
        scale,
        0.0,
        -scale * cx,
        0.0,
        scale,
        -scale * cy,
        0.0,
        0.0,
        1.0,
    );

    let norm = points
        .iter()
        .map(|p| Pt2::new(scale * (p.x - cx), scale * (p.y - cy)))
        .collect();
    Some((norm, t))
}

/// Apply a 3×3 projective transform to a 2D point.
#[inline]
pub fn transform_point(h: &Mat3, p: &Pt2) -> Pt2 {
    boule_vision_core::from_homogeneous(&(h * boule_vision_core::to_homogeneous(p)))
}
