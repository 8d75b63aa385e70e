//! Pétanque measurement library.
//!
//! Turns pixel observations of boules and the cochonnet into real-world
//! distances, and replayed throws into kinematics, a technique label and
//! coaching feedback.
//!
//! # Quick Start
//!
//! ```
//! # fn main() -> anyhow::Result<()> {
//! use boule_vision::prelude::*;
//!
//! let config = MeasureConfig::default();
//! let engine = RankingEngine::new(config.scale);
//!
//! let target = DetectedObject::new(Pt2::new(400.0, 300.0), 15.0, 0.9, Some(PieceClass::Cochonnet))?;
//! let boules = [
//!     DetectedObject::new(Pt2::new(460.0, 300.0), 38.0, 0.8, Some(PieceClass::Boule))?,
//!     DetectedObject::new(Pt2::new(400.0, 330.0), 37.0, 0.7, Some(PieceClass::Boule))?,
//! ];
//!
//! let ranking = engine.rank(&boules, Some(&target), true)?;
//! assert_eq!(ranking[0].candidate, 1);
//! assert!((ranking[0].distance - 0.03).abs() < 1e-12);
//! # Ok(())
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`core`] - math aliases, the pinhole camera, detections and errors
//! - [`linear`] - closed-form planar calibration
//! - [`pipeline`] - camera state, distances, ranking and throw analysis

/// Math aliases, camera model, detections and the error taxonomy.
///
/// Re-exports everything from `boule_vision_core`.
pub mod core {
    pub use boule_vision_core::*;
}

/// Closed-form planar calibration.
///
/// Re-exports everything from `boule_vision_linear`.
pub mod linear {
    pub use boule_vision_linear::*;
}

/// Measurement engine.
///
/// Re-exports everything from `boule_vision_pipeline`.
pub mod pipeline {
    pub use boule_vision_pipeline::*;
}

pub use boule_vision_core::{
    CalibrationRecord, CameraIntrinsics, CheckerboardPattern, DetectedObject,
    DistortionCoefficients, MeasureError, MeasureResult, PieceClass, PinholeCamera, PlanarView,
    Pt2, Pt3, Real, Roi,
};
pub use boule_vision_linear::{PlanarCalibration, PlanarCalibrationOptions};
pub use boule_vision_pipeline::{
    CameraModel, CornerDetector, DistanceEstimator, DistanceResult, DistanceUnit, FeedbackKind,
    FeedbackMessage, KinematicsAnalyzer, MeasureConfig, Metric, PairDistance, RankingEngine, Spin,
    SpinEstimate, Technique, TechniqueClassifier, ThrowAnalysis, ThrowAnalyzer, ThrowComparison,
    Trajectory, TrajectoryPoint, TrajectoryTracker,
};

/// Convenient import of the most common types.
///
/// ```
/// use boule_vision::prelude::*;
/// ```
pub mod prelude {
    // Camera and calibration
    pub use crate::{
        CalibrationRecord, CameraIntrinsics, CameraModel, CheckerboardPattern, CornerDetector,
        DistortionCoefficients, PinholeCamera, PlanarCalibration, PlanarCalibrationOptions,
    };

    // Measurement
    pub use crate::{
        DetectedObject, DistanceEstimator, DistanceResult, MeasureConfig, PieceClass,
        RankingEngine,
    };

    // Throw analysis
    pub use crate::{Technique, ThrowAnalysis, ThrowAnalyzer, Trajectory, TrajectoryTracker};

    // Math and errors
    pub use crate::{MeasureError, MeasureResult, Pt2, Pt3, Real};
}
