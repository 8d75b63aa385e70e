//! Pinhole camera building blocks.
//!
//! - [`CameraIntrinsics`]: focal lengths and principal point (`K`).
//! - [`DistortionCoefficients`]: Brown-Conrady `(k1, k2, p1, p2, k3)`.
//! - [`PinholeCamera`]: the pair, with projection and back-projection.
//! - [`CalibrationRecord`]: flat numeric form for persistence.

mod camera;
mod distortion;
mod intrinsics;
mod record;

pub use camera::*;
pub use distortion::*;
pub use intrinsics::*;
pub use record::*;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Pt2, Real};

    #[test]
    fn pixel_to_point_then_reproject_recovers_pixel() {
        let intrinsics = [
            CameraIntrinsics::new(1000.0, 1000.0, 960.0, 540.0).unwrap(),
            CameraIntrinsics::new(812.5, 790.25, 641.0, 355.5).unwrap(),
            CameraIntrinsics::new(1450.0, 1460.0, 2016.0, 1512.0).unwrap(),
        ];
        let pixels = [
            Pt2::new(0.0, 0.0),
            Pt2::new(960.0, 540.0),
            Pt2::new(1919.0, 1079.0),
            Pt2::new(123.456, 987.654),
        ];
        let depths: [Real; 4] = [0.1, 1.0, 7.5, 250.0];

        for k in intrinsics {
            let cam = PinholeCamera::ideal(k);
            for px in &pixels {
                for &depth in &depths {
                    let p = cam.pixel_to_point3d(px, depth);
                    let back = cam.project(&p).unwrap();
                    let err = (back - px).norm();
                    assert!(err < 1e-9, "k={k:?} px={px:?} depth={depth} err={err}");
                }
            }
        }
    }
}
