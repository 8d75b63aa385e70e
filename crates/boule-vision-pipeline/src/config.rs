//! Tunable constants of the measurement engine.
//!
//! Every scale factor and threshold the algorithms use lives here so a real
//! calibration or a coach's preferences can replace them without touching
//! code. All sections default to the values the engine ships with.

use std::path::Path;

use anyhow::{Context, Result};
use boule_vision_core::{MeasureResult, Real, ensure_positive};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleConfig {
    /// Uncalibrated pixel-to-meter conversion for trajectory speeds.
    pub pixels_per_meter: Real,
    /// Scale applied to raw pixel distances when no reference size is used.
    pub fallback_meters_per_pixel: Real,
    /// Real diameter of the cochonnet (meters).
    pub cochonnet_diameter_m: Real,
    /// Real diameter of a boule (meters).
    pub boule_diameter_m: Real,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            pixels_per_meter: 100.0,
            fallback_meters_per_pixel: 0.001,
            cochonnet_diameter_m: 0.03,
            boule_diameter_m: 0.0755,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Frame rate assumed when the source does not report one.
    pub default_fps: Real,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self { default_fps: 30.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpinConfig {
    /// Frames required before any spin is reported.
    pub min_frames: usize,
}

impl Default for SpinConfig {
    fn default() -> Self {
        Self { min_frames: 5 }
    }
}

/// A `(velocity, angle)` region bound used by the technique rules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TechniqueBounds {
    /// m/s
    pub velocity: Real,
    /// degrees
    pub angle: Real,
}

/// Technique rules, evaluated pointing, shooting, rolling.
///
/// Pointing and rolling are upper bounds on both metrics; shooting is a lower
/// bound on both.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TechniqueConfig {
    pub pointing: TechniqueBounds,
    pub shooting: TechniqueBounds,
    pub rolling: TechniqueBounds,
}

impl Default for TechniqueConfig {
    fn default() -> Self {
        Self {
            pointing: TechniqueBounds {
                velocity: 3.0,
                angle: 30.0,
            },
            shooting: TechniqueBounds {
                velocity: 6.0,
                angle: 25.0,
            },
            rolling: TechniqueBounds {
                velocity: 5.0,
                angle: 20.0,
            },
        }
    }
}

/// A good band: values below `low` or above `high` trigger a correction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub low: Real,
    pub high: Real,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    /// degrees
    pub angle: Band,
    /// m/s
    pub velocity: Band,
    /// Score band; the space between `low` and `high` produces no message.
    pub accuracy: Band,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            angle: Band {
                low: 15.0,
                high: 40.0,
            },
            velocity: Band {
                low: 2.0,
                high: 8.0,
            },
            accuracy: Band {
                low: 60.0,
                high: 85.0,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasureConfig {
    pub scale: ScaleConfig,
    pub tracking: TrackingConfig,
    pub spin: SpinConfig,
    pub technique: TechniqueConfig,
    pub feedback: FeedbackConfig,
}

impl MeasureConfig {
    /// Load a (possibly partial) configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(config)
    }

    /// Reject non-positive scales and frame rates.
    pub fn validate(&self) -> MeasureResult<()> {
        ensure_positive("scale.pixels_per_meter", self.scale.pixels_per_meter)?;
        ensure_positive(
            "scale.fallback_meters_per_pixel",
            self.scale.fallback_meters_per_pixel,
        )?;
        ensure_positive("scale.cochonnet_diameter_m", self.scale.cochonnet_diameter_m)?;
        ensure_positive("scale.boule_diameter_m", self.scale.boule_diameter_m)?;
        ensure_positive("tracking.default_fps", self.tracking.default_fps)?;
        Ok(())
    }
}
