//! Real-world distances between image points.

use std::sync::Arc;

use boule_vision_core::{MeasureResult, Pt2, Pt3, Real, ensure_positive, pixel_distance};

use crate::camera_model::CameraModel;

/// Distance computations backed by a shared [`CameraModel`].
#[derive(Debug, Clone)]
pub struct DistanceEstimator {
    camera: Arc<CameraModel>,
}

impl Default for DistanceEstimator {
    fn default() -> Self {
        Self::new(Arc::new(CameraModel::new()))
    }
}

impl DistanceEstimator {
    pub fn new(camera: Arc<CameraModel>) -> Self {
        Self { camera }
    }

    pub fn camera(&self) -> &Arc<CameraModel> {
        &self.camera
    }

    /// Planar distance using an object of known size as the scale reference.
    ///
    /// `reference_size` is the object's real size in meters and `pixel_size`
    /// its apparent size in pixels; the ratio converts the pixel distance
    /// between `p1` and `p2` into meters.
    pub fn distance_2d(
        p1: &Pt2,
        p2: &Pt2,
        reference_size: Real,
        pixel_size: Real,
    ) -> MeasureResult<Real> {
        ensure_positive("pixel_size", pixel_size)?;
        ensure_positive("reference_size", reference_size)?;
        let scale = reference_size / pixel_size;
        Ok(pixel_distance(p1, p2) * scale)
    }

    /// Euclidean distance between two pixels back-projected at known depths.
    pub fn distance_3d(
        &self,
        p1: &Pt2,
        p2: &Pt2,
        depth1: Real,
        depth2: Real,
    ) -> MeasureResult<Real> {
        ensure_positive("depth1", depth1)?;
        ensure_positive("depth2", depth2)?;
        let camera = self.camera.camera()?;
        let a = camera.pixel_to_point3d(p1, depth1);
        let b = camera.pixel_to_point3d(p2, depth2);
        Ok((b - a).norm())
    }

    /// Depth of a rectified stereo match, or `None` at zero disparity.
    pub fn depth_from_disparity(disparity: Real, baseline: Real, focal_length: Real) -> Option<Real> {
        let disparity = disparity.abs();
        (disparity > 0.0).then(|| baseline * focal_length / disparity)
    }

    /// Triangulate a rectified stereo match into the left camera frame.
    ///
    /// The principal point comes from the stored intrinsics. A zero disparity
    /// has no finite depth and yields the origin.
    pub fn triangulate_stereo(
        &self,
        left: &Pt2,
        right: &Pt2,
        baseline: Real,
        focal_length: Real,
    ) -> MeasureResult<Pt3> {
        ensure_positive("baseline", baseline)?;
        ensure_positive("focal_length", focal_length)?;
        let intrinsics = self.camera.intrinsics()?;

        let Some(z) = Self::depth_from_disparity(left.x - right.x, baseline, focal_length) else {
            log::warn!("zero stereo disparity at ({}, {}); returning origin", left.x, left.y);
            return Ok(Pt3::origin());
        };
        let x = (left.x - intrinsics.cx) * z / focal_length;
        let y = (left.y - intrinsics.cy) * z / focal_length;
        Ok(Pt3::new(x, y, z))
    }

    /// Distance to an object of known real size from its apparent size.
    pub fn depth_from_size(&self, real_size: Real, pixel_size: Real) -> MeasureResult<Real> {
        ensure_positive("real_size", real_size)?;
        ensure_positive("pixel_size", pixel_size)?;
        let intrinsics = self.camera.intrinsics()?;
        Ok(real_size * intrinsics.fx / pixel_size)
    }
}
