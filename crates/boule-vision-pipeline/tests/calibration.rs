use std::sync::Arc;

use anyhow::Result;
use boule_vision_core::synthetic::{noise::UniformPixelNoise, planar};
use boule_vision_core::{
    CalibrationRecord, CameraIntrinsics, CheckerboardPattern, DistortionCoefficients,
    MeasureError, PinholeCamera, PlanarView, Pt2,
};
use boule_vision_linear::PlanarCalibrationOptions;
use boule_vision_pipeline::{CameraModel, CornerDetector, DistanceEstimator};
use image::{GrayImage, Luma};

/// Stands in for a real corner finder: each test image encodes the index of
/// its precomputed view in pixel (0, 0); 255 means "no board visible".
struct LookupDetector {
    views: Vec<PlanarView>,
}

impl CornerDetector for LookupDetector {
    fn detect(&self, image: &GrayImage, _pattern: &CheckerboardPattern) -> Option<Vec<Pt2>> {
        let idx = image.get_pixel(0, 0)[0] as usize;
        self.views.get(idx).map(|v| v.pixel_points.clone())
    }
}

fn pattern() -> CheckerboardPattern {
    CheckerboardPattern {
        columns: 9,
        rows: 6,
        square_size: 0.03,
    }
}

fn ground_truth() -> PinholeCamera {
    PinholeCamera::new(
        CameraIntrinsics::new(820.0, 815.0, 640.0, 360.0).unwrap(),
        DistortionCoefficients::default(),
    )
}

fn images(count: u8) -> Vec<GrayImage> {
    (0..count)
        .map(|i| GrayImage::from_pixel(1280, 720, Luma([i])))
        .collect()
}

#[test]
fn calibrate_skips_images_without_corners() -> Result<()> {
    let poses = planar::board_poses(&pattern(), 5, 0.6);
    let views = planar::project_views(&ground_truth(), &pattern(), &poses, UniformPixelNoise::default())?;
    let detector = LookupDetector { views };

    let mut imgs = images(5);
    imgs.push(GrayImage::from_pixel(1280, 720, Luma([255])));
    imgs.push(GrayImage::from_pixel(640, 480, Luma([0])));

    let model = CameraModel::uncalibrated();
    let calib = model.calibrate(&imgs, &pattern(), &detector, &PlanarCalibrationOptions::default())?;
    assert_eq!(calib.views_used, 5);

    let k = model.intrinsics()?;
    assert!((k.fx - 820.0).abs() < 0.5, "fx = {}", k.fx);
    assert!((k.fy - 815.0).abs() < 0.5, "fy = {}", k.fy);
    assert!((k.cx - 640.0).abs() < 0.5, "cx = {}", k.cx);
    assert!((k.cy - 360.0).abs() < 0.5, "cy = {}", k.cy);
    Ok(())
}

#[test]
fn failed_calibration_keeps_uncalibrated_state() {
    let model = CameraModel::uncalibrated();
    let detector = LookupDetector { views: Vec::new() };
    let err = model
        .calibrate(&images(3), &pattern(), &detector, &PlanarCalibrationOptions::default())
        .unwrap_err();
    assert!(matches!(err, MeasureError::Calibration(_)), "{err}");
    assert_eq!(model.camera(), Err(MeasureError::NotCalibrated));
}

#[test]
fn calibrated_record_round_trips_through_json() -> Result<()> {
    let poses = planar::board_poses(&pattern(), 4, 0.7);
    let views = planar::project_views(&ground_truth(), &pattern(), &poses, UniformPixelNoise::default())?;
    let model = Arc::new(CameraModel::new());
    model.calibrate_views(&views, (1280, 720), &PlanarCalibrationOptions::default())?;

    let json = serde_json::to_string(&model.record()?)?;
    let restored = CameraModel::uncalibrated();
    restored.load(&serde_json::from_str::<CalibrationRecord>(&json)?)?;
    assert_eq!(restored.camera()?, model.camera()?);

    // The estimator sees the calibrated principal point.
    let estimator = DistanceEstimator::new(model.clone());
    let cx = model.intrinsics()?.cx;
    let p = estimator.triangulate_stereo(&Pt2::new(cx, 100.0), &Pt2::new(cx - 20.0, 100.0), 0.1, 800.0)?;
    assert!(p.x.abs() < 1e-9);
    assert!((p.z - 4.0).abs() < 1e-9);
    Ok(())
}
