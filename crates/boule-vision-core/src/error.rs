use thiserror::Error;

/// Failure taxonomy shared by every measurement operation.
///
/// Degenerate-but-valid inputs (short trajectories, zero disparity, a missing
/// target) never produce an error; they return documented sentinel values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MeasureError {
    /// A scale, size, rate or geometric argument is out of its valid range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Projection requested before any intrinsics exist.
    #[error("camera is not calibrated")]
    NotCalibrated,
    /// Calibration could not produce a camera model.
    #[error("calibration failed: {0}")]
    Calibration(String),
}

impl MeasureError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

/// Convenience alias for results carrying a [`MeasureError`].
pub type MeasureResult<T> = Result<T, MeasureError>;

/// Return `InvalidArgument` unless `value` is finite and strictly positive.
pub fn ensure_positive(name: &str, value: f64) -> MeasureResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(MeasureError::invalid(format!(
            "{name} must be a positive finite number, got {value}"
        )))
    }
}
