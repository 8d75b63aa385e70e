//! Core geometry primitives for `boule-vision`.
//!
//! This crate provides the building blocks shared by the rest of the
//! workspace:
//!
//! - linear algebra type aliases (`Real`, `Pt2`, `Pt3`, `Mat3`, ...),
//! - the pinhole camera model with Brown-Conrady distortion,
//! - detection records produced by the external object detector,
//! - planar calibration observations and checkerboard geometry,
//! - the [`MeasureError`] taxonomy.
//!
//! Camera pipeline:
//! `pixel = K(distort(X / Z, Y / Z))`
//!
//! # Example
//!
//! ```
//! use boule_vision_core::{CameraIntrinsics, PinholeCamera, Pt2};
//!
//! let camera = PinholeCamera::ideal(CameraIntrinsics::default());
//! let p = camera.pixel_to_point3d(&Pt2::new(1060.0, 540.0), 2.0);
//! assert!((p.x - 0.2).abs() < 1e-12);
//! ```

mod detection;
mod error;
mod math;
mod models;
/// Deterministic synthetic data generation helpers.
///
/// Used by workspace tests; not intended for production measurement code.
pub mod synthetic;
mod view;

pub use detection::*;
pub use error::*;
pub use math::*;
pub use models::*;
pub use view::*;
