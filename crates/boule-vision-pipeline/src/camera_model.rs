//! Shared camera state and calibration entry points.
//!
//! [`CameraModel`] owns a [`PinholeCamera`] value that readers copy out and
//! calibration replaces wholesale. Calibration itself is a pure function
//! ([`calibrate_views`], [`calibrate_from_images`]) returning a new camera.

use std::sync::{Mutex, PoisonError, RwLock};

use boule_vision_core::{
    CalibrationRecord, CameraIntrinsics, CheckerboardPattern, MeasureError, MeasureResult,
    PinholeCamera, PlanarView, Pt2, Pt3, Real, Vec2, ensure_positive,
};
use boule_vision_linear::{PlanarCalibration, PlanarCalibrationOptions, calibrate_planar};
use image::{GrayImage, ImageBuffer, Pixel};

/// External checkerboard corner finder.
///
/// Implementations return the inner corners in row-major order matching
/// [`CheckerboardPattern::board_points`], or `None` when the full pattern is
/// not visible.
pub trait CornerDetector {
    fn detect(&self, image: &GrayImage, pattern: &CheckerboardPattern) -> Option<Vec<Pt2>>;
}

impl<F> CornerDetector for F
where
    F: Fn(&GrayImage, &CheckerboardPattern) -> Option<Vec<Pt2>>,
{
    fn detect(&self, image: &GrayImage, pattern: &CheckerboardPattern) -> Option<Vec<Pt2>> {
        self(image, pattern)
    }
}

/// Calibrate from pre-detected planar views.
pub fn calibrate_views(
    views: &[PlanarView],
    image_size: (u32, u32),
    opts: &PlanarCalibrationOptions,
) -> MeasureResult<PlanarCalibration> {
    if views.is_empty() {
        return Err(MeasureError::Calibration(
            "no usable calibration views".to_string(),
        ));
    }
    let calib = calibrate_planar(views, image_size, opts)?;
    log::info!(
        "calibrated from {} views, rms reprojection error {:.4} px",
        calib.views_used,
        calib.rms_error
    );
    Ok(calib)
}

/// Detect corners in every image and calibrate from the usable ones.
///
/// Images whose corners are not found, or whose size differs from the first
/// image, are skipped.
pub fn calibrate_from_images(
    images: &[GrayImage],
    pattern: &CheckerboardPattern,
    detector: &dyn CornerDetector,
    opts: &PlanarCalibrationOptions,
) -> MeasureResult<PlanarCalibration> {
    ensure_positive("square_size", pattern.square_size)?;
    if pattern.corner_count() < 4 {
        return Err(MeasureError::Calibration(format!(
            "a {}x{} pattern has fewer than 4 corners",
            pattern.columns, pattern.rows
        )));
    }
    let Some(first) = images.first() else {
        return Err(MeasureError::Calibration(
            "no calibration images supplied".to_string(),
        ));
    };
    let image_size = first.dimensions();
    let board = pattern.board_points();

    let mut views = Vec::with_capacity(images.len());
    for (idx, image) in images.iter().enumerate() {
        if image.dimensions() != image_size {
            log::warn!(
                "skipping image {idx}: size {:?} differs from {:?}",
                image.dimensions(),
                image_size
            );
            continue;
        }
        match detector.detect(image, pattern) {
            Some(corners) if corners.len() == board.len() => {
                views.push(PlanarView::new(board.clone(), corners)?);
            }
            Some(corners) => log::warn!(
                "skipping image {idx}: found {} corners, expected {}",
                corners.len(),
                board.len()
            ),
            None => log::warn!("skipping image {idx}: checkerboard not found"),
        }
    }

    log::debug!("{} of {} images usable for calibration", views.len(), images.len());
    calibrate_views(&views, image_size, opts)
}

/// Camera parameters shared between measurement calls.
///
/// Reads take a snapshot of the current camera. Calibration runs outside the
/// read lock and replaces the camera in one write, so readers never observe a
/// partially updated matrix; concurrent calibrations are serialized.
#[derive(Debug)]
pub struct CameraModel {
    camera: RwLock<Option<PinholeCamera>>,
    calibration: Mutex<()>,
}

impl Default for CameraModel {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraModel {
    /// Model holding the default uncalibrated intrinsics.
    pub fn new() -> Self {
        Self::with_camera(PinholeCamera::ideal(CameraIntrinsics::default()))
    }

    /// Model without any intrinsics; projections fail with `NotCalibrated`.
    pub fn uncalibrated() -> Self {
        Self {
            camera: RwLock::new(None),
            calibration: Mutex::new(()),
        }
    }

    pub fn with_camera(camera: PinholeCamera) -> Self {
        Self {
            camera: RwLock::new(Some(camera)),
            calibration: Mutex::new(()),
        }
    }

    /// Snapshot of the current camera.
    pub fn camera(&self) -> MeasureResult<PinholeCamera> {
        // The guarded value is a plain `Copy` snapshot, never left half-written.
        let guard = self.camera.read().unwrap_or_else(PoisonError::into_inner);
        (*guard).ok_or(MeasureError::NotCalibrated)
    }

    pub fn intrinsics(&self) -> MeasureResult<CameraIntrinsics> {
        Ok(self.camera()?.intrinsics)
    }

    pub fn is_calibrated(&self) -> bool {
        self.camera().is_ok()
    }

    /// Replace the camera.
    pub fn set_camera(&self, camera: PinholeCamera) {
        *self.camera.write().unwrap_or_else(PoisonError::into_inner) = Some(camera);
    }

    /// Replace the camera from a persisted record.
    pub fn load(&self, record: &CalibrationRecord) -> MeasureResult<()> {
        let camera = PinholeCamera::try_from(record)?;
        self.set_camera(camera);
        Ok(())
    }

    /// Current camera as a persistable record.
    pub fn record(&self) -> MeasureResult<CalibrationRecord> {
        Ok(CalibrationRecord::from(&self.camera()?))
    }

    /// Calibrate from checkerboard images and install the result.
    pub fn calibrate(
        &self,
        images: &[GrayImage],
        pattern: &CheckerboardPattern,
        detector: &dyn CornerDetector,
        opts: &PlanarCalibrationOptions,
    ) -> MeasureResult<PlanarCalibration> {
        let _serial = self
            .calibration
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let calib = calibrate_from_images(images, pattern, detector, opts)?;
        self.set_camera(calib.camera);
        Ok(calib)
    }

    /// Calibrate from pre-detected views and install the result.
    pub fn calibrate_views(
        &self,
        views: &[PlanarView],
        image_size: (u32, u32),
        opts: &PlanarCalibrationOptions,
    ) -> MeasureResult<PlanarCalibration> {
        let _serial = self
            .calibration
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let calib = calibrate_views(views, image_size, opts)?;
        self.set_camera(calib.camera);
        Ok(calib)
    }

    /// Back-project a pixel to the camera frame at the given depth.
    pub fn pixel_to_point3d(&self, pixel: &Pt2, depth: Real) -> MeasureResult<Pt3> {
        Ok(self.camera()?.pixel_to_point3d(pixel, depth))
    }

    /// Remove lens distortion and crop to the region of valid pixels.
    ///
    /// The output is rendered with the optimal new intrinsics (every source
    /// pixel retained) and cropped to the valid region, sampling bilinearly.
    /// Output pixels whose source falls outside the input are black.
    pub fn undistort<P>(&self, image: &ImageBuffer<P, Vec<u8>>) -> MeasureResult<ImageBuffer<P, Vec<u8>>>
    where
        P: Pixel<Subpixel = u8>,
    {
        let camera = self.camera()?;
        let (width, height) = image.dimensions();
        let (new_k, roi) = camera.optimal_new_intrinsics(width, height).ok_or_else(|| {
            MeasureError::InvalidArgument(format!(
                "cannot undistort a {width}x{height} image with this camera"
            ))
        })?;

        let mut out = ImageBuffer::<P, Vec<u8>>::new(roi.width, roi.height);
        for (x, y, px) in out.enumerate_pixels_mut() {
            let target = Vec2::new(Real::from(roi.x + x), Real::from(roi.y + y));
            let n = new_k.pixel_to_normalized(&target);
            let src = camera
                .intrinsics
                .normalized_to_pixel(&camera.distortion.distort(&n));
            sample_bilinear(image, src, px.channels_mut());
        }
        Ok(out)
    }
}

/// Bilinear sample of `image` at `pos`; leaves `out` untouched outside the image.
fn sample_bilinear<P>(image: &ImageBuffer<P, Vec<u8>>, pos: Vec2, out: &mut [u8])
where
    P: Pixel<Subpixel = u8>,
{
    let (width, height) = image.dimensions();
    let max_x = Real::from(width - 1);
    let max_y = Real::from(height - 1);
    if !(pos.x >= -0.5 && pos.y >= -0.5 && pos.x <= max_x + 0.5 && pos.y <= max_y + 0.5) {
        return;
    }
    let sx = pos.x.clamp(0.0, max_x);
    let sy = pos.y.clamp(0.0, max_y);

    let x0 = sx.floor() as u32;
    let y0 = sy.floor() as u32;
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);
    let ax = sx - Real::from(x0);
    let ay = sy - Real::from(y0);

    let p00 = image.get_pixel(x0, y0).channels();
    let p10 = image.get_pixel(x1, y0).channels();
    let p01 = image.get_pixel(x0, y1).channels();
    let p11 = image.get_pixel(x1, y1).channels();

    for (c, dst) in out.iter_mut().enumerate() {
        let top = Real::from(p00[c]) * (1.0 - ax) + Real::from(p10[c]) * ax;
        let bottom = Real::from(p01[c]) * (1.0 - ax) + Real::from(p11[c]) * ax;
        let v = top * (1.0 - ay) + bottom * ay;
        *dst = v.round().clamp(0.0, 255.0) as u8;
    }
}
