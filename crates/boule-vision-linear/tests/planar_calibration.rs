use anyhow::Result;
use boule_vision_core::synthetic::{noise::UniformPixelNoise, planar};
use boule_vision_core::{
    CameraIntrinsics, CheckerboardPattern, DistortionCoefficients, Iso3, PinholeCamera,
};
use boule_vision_linear::{PlanarCalibrationOptions, calibrate_planar};
use nalgebra::{Translation3, UnitQuaternion, Vector3};

fn pattern() -> CheckerboardPattern {
    CheckerboardPattern {
        columns: 9,
        rows: 6,
        square_size: 0.03,
    }
}

fn ground_truth(distortion: DistortionCoefficients) -> PinholeCamera {
    PinholeCamera::new(
        CameraIntrinsics {
            fx: 800.0,
            fy: 790.0,
            cx: 640.0,
            cy: 360.0,
        },
        distortion,
    )
}

#[test]
fn ideal_lens_is_recovered_exactly() -> Result<()> {
    let gt = ground_truth(DistortionCoefficients::default());
    let poses = planar::board_poses(&pattern(), 6, 0.6);
    let views = planar::project_views(&gt, &pattern(), &poses, UniformPixelNoise::default())?;

    let calib = calibrate_planar(&views, (1280, 720), &PlanarCalibrationOptions::default())?;
    let k = calib.camera.intrinsics;
    assert!((k.fx - 800.0).abs() < 0.5, "fx = {}", k.fx);
    assert!((k.fy - 790.0).abs() < 0.5, "fy = {}", k.fy);
    assert!((k.cx - 640.0).abs() < 0.5, "cx = {}", k.cx);
    assert!((k.cy - 360.0).abs() < 0.5, "cy = {}", k.cy);
    assert!(calib.camera.distortion.k1.abs() < 1e-3);
    assert!(calib.rms_error < 1e-3, "rms = {}", calib.rms_error);
    assert_eq!(calib.views_used, 6);
    assert_eq!(calib.per_view_rms.len(), 6);
    Ok(())
}

#[test]
fn barrel_distortion_is_estimated() -> Result<()> {
    let gt = ground_truth(DistortionCoefficients {
        k1: -0.08,
        ..Default::default()
    });
    let poses = planar::board_poses(&pattern(), 8, 0.4);
    let noise = UniformPixelNoise {
        seed: 7,
        max_abs_px: 0.1,
    };
    let views = planar::project_views(&gt, &pattern(), &poses, noise)?;

    let opts = PlanarCalibrationOptions {
        iterations: 4,
        fix_tangential: true,
        ..Default::default()
    };
    let calib = calibrate_planar(&views, (1280, 720), &opts)?;
    let k = calib.camera.intrinsics;
    assert!((k.fx - 800.0).abs() / 800.0 < 0.03, "fx = {}", k.fx);
    assert!((k.fy - 790.0).abs() / 790.0 < 0.03, "fy = {}", k.fy);
    assert!(calib.camera.distortion.k1 < 0.0, "k1 = {}", calib.camera.distortion.k1);
    assert!(calib.rms_error < 1.0, "rms = {}", calib.rms_error);
    Ok(())
}

#[test]
fn single_view_pins_principal_point_at_image_centre() -> Result<()> {
    let gt = ground_truth(DistortionCoefficients::default());
    // Tilted about both axes; a single-axis tilt leaves one focal length free.
    let rotation = UnitQuaternion::from_euler_angles(0.3, 0.25, 0.05);
    let centre = rotation * Vector3::new(0.12, 0.075, 0.0);
    let pose = Iso3::from_parts(
        Translation3::new(-centre.x, -centre.y, 0.6 - centre.z),
        rotation,
    );
    let views = vec![planar::project_view(&gt, &pose, &pattern().board_points())?];

    let opts = PlanarCalibrationOptions {
        iterations: 0,
        ..Default::default()
    };
    let calib = calibrate_planar(&views, (1280, 720), &opts)?;
    let k = calib.camera.intrinsics;
    assert_eq!((k.cx, k.cy), (640.0, 360.0));
    assert!((k.fx - 800.0).abs() < 1.0, "fx = {}", k.fx);
    assert!((k.fy - 790.0).abs() < 1.0, "fy = {}", k.fy);
    assert!(calib.camera.distortion.is_zero());
    Ok(())
}
