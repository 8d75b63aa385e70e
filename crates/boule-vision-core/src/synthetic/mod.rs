//! Deterministic synthetic data for tests and benchmarks.
//!
//! Builds planar checkerboard observations from a known camera so that
//! calibration and measurement code can be checked against ground truth.

pub mod noise;
pub mod planar;
