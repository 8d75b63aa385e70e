use serde::{Deserialize, Serialize};

use super::{CameraIntrinsics, DistortionCoefficients, PinholeCamera};
use crate::{Mat3, MeasureError, MeasureResult};

/// Flat numeric calibration artifact for persistence and reload.
///
/// `camera_matrix` is the row-major 3×3 `K`; `distortion` is
/// `(k1, k2, p1, p2, k3)`. Conversion to and from [`PinholeCamera`] is exact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationRecord {
    pub camera_matrix: [f64; 9],
    pub distortion: [f64; 5],
}

impl From<&PinholeCamera> for CalibrationRecord {
    fn from(camera: &PinholeCamera) -> Self {
        let k = camera.intrinsics.k_matrix();
        let mut camera_matrix = [0.0; 9];
        for r in 0..3 {
            for c in 0..3 {
                camera_matrix[3 * r + c] = k[(r, c)];
            }
        }
        Self {
            camera_matrix,
            distortion: camera.distortion.to_array(),
        }
    }
}

impl TryFrom<&CalibrationRecord> for PinholeCamera {
    type Error = MeasureError;

    fn try_from(record: &CalibrationRecord) -> MeasureResult<Self> {
        let k = Mat3::from_row_slice(&record.camera_matrix);
        let intrinsics = CameraIntrinsics::try_from_k_matrix(&k).ok_or_else(|| {
            MeasureError::InvalidArgument(format!(
                "camera matrix is not a zero-skew pinhole matrix: {:?}",
                record.camera_matrix
            ))
        })?;
        Ok(PinholeCamera::new(
            intrinsics,
            DistortionCoefficients::from_array(record.distortion),
        ))
    }
}
