//! Measurement engine for boule-vision.
//!
//! Turns detections into distances and per-frame positions into throw
//! analyses:
//!
//! ```text
//! detections ─▶ RankingEngine ─▶ Vec<DistanceResult>
//! positions  ─▶ TrajectoryTracker ─▶ KinematicsAnalyzer ─▶ TechniqueClassifier
//!                                                       └▶ FeedbackGenerator
//! ```
//!
//! [`CameraModel`] is the only shared mutable state; everything else is a
//! pure function of its inputs and a [`MeasureConfig`].
//!
//! # Example
//!
//! ```
//! use boule_vision_core::Pt2;
//! use boule_vision_pipeline::{MeasureConfig, ThrowAnalyzer};
//!
//! let analyzer = ThrowAnalyzer::new(&MeasureConfig::default());
//! let positions = [Some(Pt2::new(0.0, 0.0)), None, Some(Pt2::new(5.0, 5.0)), Some(Pt2::new(10.0, 10.0))];
//! let analysis = analyzer.analyze_frames(&positions, Some(30.0)).unwrap();
//! assert_eq!(analysis.point_count, 3);
//! assert_eq!(analysis.accuracy, 100.0);
//! ```

mod analysis;
mod camera_model;
mod config;
mod distance;
mod feedback;
mod kinematics;
mod ranking;
mod technique;
mod trajectory;

pub use analysis::*;
pub use camera_model::*;
pub use config::*;
pub use distance::*;
pub use feedback::*;
pub use kinematics::*;
pub use ranking::*;
pub use technique::*;
pub use trajectory::*;
