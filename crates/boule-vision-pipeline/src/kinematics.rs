//! Launch angle, speed, straightness and spin of a tracked throw.

use boule_vision_core::{Real, pixel_distance};
use serde::{Deserialize, Serialize};

use crate::config::{ScaleConfig, SpinConfig};
use crate::trajectory::Trajectory;

/// Score returned when a trajectory is too short or degenerate to judge.
pub const NEUTRAL_ACCURACY: Real = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Spin {
    #[default]
    None,
    Backspin,
    Topspin,
    Sidespin,
}

/// Spin label plus whether it was actually measured from motion.
///
/// Spin is not measured yet: with enough frames the estimate is a fixed
/// `Backspin` placeholder and `measured` is `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpinEstimate {
    pub spin: Spin,
    pub measured: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct KinematicsAnalyzer {
    scale: ScaleConfig,
    spin: SpinConfig,
}

impl KinematicsAnalyzer {
    pub fn new(scale: ScaleConfig, spin: SpinConfig) -> Self {
        Self { scale, spin }
    }

    /// Direction of travel in degrees, from the first and third points.
    ///
    /// Returns `|atan2(dy, dx)|`, so the result lies in `[0, 180]`. This
    /// two-gap sample is noise sensitive; it is not a line fit. Zero with
    /// fewer than three points.
    pub fn angle(&self, trajectory: &Trajectory) -> Real {
        let [p1, _, p3, ..] = trajectory.points() else {
            return 0.0;
        };
        let d = p3.position - p1.position;
        d.y.atan2(d.x).abs().to_degrees()
    }

    /// Mean per-step speed in m/s.
    ///
    /// Pixel speeds are converted with the configured pixels-per-meter
    /// scale. Steps with no elapsed time are ignored.
    pub fn velocity(&self, trajectory: &Trajectory) -> Real {
        let (sum, steps) = trajectory
            .points()
            .windows(2)
            .filter_map(|w| {
                let dt = w[1].timestamp - w[0].timestamp;
                (dt > 0.0).then(|| pixel_distance(&w[0].position, &w[1].position) / dt)
            })
            .fold((0.0, 0_usize), |(sum, n), speed| (sum + speed, n + 1));

        if steps == 0 {
            return 0.0;
        }
        sum / steps as Real / self.scale.pixels_per_meter
    }

    /// Straightness score in `[0, 100]`.
    ///
    /// The ideal path is the segment from the first to the last point; the
    /// score is 100 minus the mean perpendicular deviation (pixels) of the
    /// intermediate points. Empty trajectories score 0; fewer than three
    /// points or a closed path score [`NEUTRAL_ACCURACY`].
    pub fn accuracy(&self, trajectory: &Trajectory) -> Real {
        let points = trajectory.points();
        let (Some(first), Some(last)) = (points.first(), points.last()) else {
            return 0.0;
        };
        if points.len() < 3 {
            return NEUTRAL_ACCURACY;
        }

        let line = last.position - first.position;
        let len2 = line.norm_squared();
        if len2 == 0.0 {
            return NEUTRAL_ACCURACY;
        }

        let inner = &points[1..points.len() - 1];
        let total: Real = inner
            .iter()
            .map(|p| {
                let v = p.position - first.position;
                let projection = line * (v.dot(&line) / len2);
                (v - projection).norm()
            })
            .sum();
        let mean_deviation = total / inner.len() as Real;

        (100.0 - mean_deviation).clamp(0.0, 100.0)
    }

    /// Spin placeholder; see [`SpinEstimate`].
    pub fn spin(&self, frame_count: usize) -> SpinEstimate {
        if frame_count < self.spin.min_frames {
            SpinEstimate::default()
        } else {
            SpinEstimate {
                spin: Spin::Backspin,
                measured: false,
            }
        }
    }
}
