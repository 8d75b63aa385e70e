//! Closed-form planar calibration.
//!
//! Everything here is linear or iterates linear steps: no nonlinear
//! optimizer is involved.
//!
//! - [`homography`]: normalized DLT homography from board to pixels.
//! - [`zhang_intrinsics`]: zero-skew `K` from homographies.
//! - [`distortion_fit`]: Brown-Conrady coefficients from homography residuals.
//! - [`planar_pose`]: board pose from `K` and `H`.
//! - [`planar_calibration`]: the alternating scheme tying them together.

pub mod distortion_fit;
pub mod homography;
pub mod math;
pub mod planar_calibration;
pub mod planar_pose;
pub mod zhang_intrinsics;

pub use distortion_fit::*;
pub use homography::*;
pub use planar_calibration::*;
pub use planar_pose::*;
pub use zhang_intrinsics::*;
