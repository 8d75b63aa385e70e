//! Circular detections produced by the external object detector.

use serde::{Deserialize, Serialize};

use crate::{MeasureError, MeasureResult, Pt2, Real};

/// Game piece class reported by the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PieceClass {
    /// A thrown metal ball.
    Boule,
    /// The small target ball.
    Cochonnet,
}

/// One circular detection: center and radius in pixels, detector confidence.
///
/// Invariants: `radius > 0`, `confidence ∈ [0, 1]`. They are checked by
/// [`DetectedObject::new`] and on deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DetectedObjectRepr")]
pub struct DetectedObject {
    pub center: Pt2,
    pub radius: Real,
    pub confidence: Real,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<PieceClass>,
}

#[derive(Deserialize)]
struct DetectedObjectRepr {
    center: Pt2,
    radius: Real,
    confidence: Real,
    #[serde(default)]
    class: Option<PieceClass>,
}

impl TryFrom<DetectedObjectRepr> for DetectedObject {
    type Error = MeasureError;

    fn try_from(r: DetectedObjectRepr) -> MeasureResult<Self> {
        Self::new(r.center, r.radius, r.confidence, r.class)
    }
}

impl DetectedObject {
    pub fn new(
        center: Pt2,
        radius: Real,
        confidence: Real,
        class: Option<PieceClass>,
    ) -> MeasureResult<Self> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(MeasureError::InvalidArgument(format!(
                "detection radius must be > 0, got {radius}"
            )));
        }
        if !(0.0..=1.0).contains(&confidence) {
            return Err(MeasureError::InvalidArgument(format!(
                "detection confidence must lie in [0, 1], got {confidence}"
            )));
        }
        if !(center.x.is_finite() && center.y.is_finite()) {
            return Err(MeasureError::InvalidArgument(format!(
                "detection center must be finite, got ({}, {})",
                center.x, center.y
            )));
        }
        Ok(Self {
            center,
            radius,
            confidence,
            class,
        })
    }

    /// Apparent diameter in pixels.
    #[inline]
    pub fn diameter_px(&self) -> Real {
        2.0 * self.radius
    }

    /// `true` for boules and for detections the detector did not classify.
    pub fn may_be_boule(&self) -> bool {
        !matches!(self.class, Some(PieceClass::Cochonnet))
    }
}
