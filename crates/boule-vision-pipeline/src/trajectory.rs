//! Time-ordered piece positions over a throw.

use boule_vision_core::{DetectedObject, MeasureError, MeasureResult, Pt2, Real, ensure_positive};
use serde::{Deserialize, Serialize};

use crate::config::TrackingConfig;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub frame: usize,
    /// Seconds since the first frame of the source.
    pub timestamp: Real,
    pub position: Pt2,
}

/// Positions in strictly increasing time order.
///
/// Frames without a detection are absent rather than null-filled, so a
/// trajectory may be sparse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TrajectoryPoint>", into = "Vec<TrajectoryPoint>")]
pub struct Trajectory {
    points: Vec<TrajectoryPoint>,
}

impl TryFrom<Vec<TrajectoryPoint>> for Trajectory {
    type Error = MeasureError;

    fn try_from(points: Vec<TrajectoryPoint>) -> MeasureResult<Self> {
        let mut trajectory = Self::with_capacity(points.len());
        for p in points {
            trajectory.push(p)?;
        }
        Ok(trajectory)
    }
}

impl From<Trajectory> for Vec<TrajectoryPoint> {
    fn from(trajectory: Trajectory) -> Self {
        trajectory.points
    }
}

impl Trajectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    /// Append a point; its frame and timestamp must be later than the last one.
    pub fn push(&mut self, point: TrajectoryPoint) -> MeasureResult<()> {
        if !point.timestamp.is_finite() {
            return Err(MeasureError::InvalidArgument(format!(
                "trajectory timestamp must be finite, got {}",
                point.timestamp
            )));
        }
        if let Some(last) = self.points.last() {
            if point.frame <= last.frame {
                return Err(MeasureError::InvalidArgument(format!(
                    "trajectory frames must strictly increase: {} after {}",
                    point.frame, last.frame
                )));
            }
            if point.timestamp <= last.timestamp {
                return Err(MeasureError::InvalidArgument(format!(
                    "trajectory timestamps must strictly increase: {} after {}",
                    point.timestamp, last.timestamp
                )));
            }
        }
        self.points.push(point);
        Ok(())
    }

    pub fn points(&self) -> &[TrajectoryPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Time between the first and last point; zero with fewer than two points.
    pub fn duration(&self) -> Real {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => last.timestamp - first.timestamp,
            _ => 0.0,
        }
    }
}

/// Builds trajectories from per-frame observations.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrajectoryTracker {
    config: TrackingConfig,
}

impl TrajectoryTracker {
    pub fn new(config: TrackingConfig) -> Self {
        Self { config }
    }

    fn resolve_fps(&self, fps: Option<Real>) -> MeasureResult<Real> {
        let fps = fps.unwrap_or(self.config.default_fps);
        ensure_positive("fps", fps)?;
        Ok(fps)
    }

    /// One point per frame with a position, timestamped `frame / fps`.
    ///
    /// `fps` falls back to the configured default when the source did not
    /// report one.
    pub fn track(&self, positions: &[Option<Pt2>], fps: Option<Real>) -> MeasureResult<Trajectory> {
        let fps = self.resolve_fps(fps)?;
        let mut trajectory = Trajectory::with_capacity(positions.len());
        for (frame, position) in positions.iter().enumerate() {
            if let Some(position) = position {
                trajectory.push(TrajectoryPoint {
                    frame,
                    timestamp: frame as Real / fps,
                    position: *position,
                })?;
            }
        }
        Ok(trajectory)
    }

    /// Track the most confident boule (or unclassified) detection per frame.
    pub fn track_detections(
        &self,
        frames: &[Vec<DetectedObject>],
        fps: Option<Real>,
    ) -> MeasureResult<Trajectory> {
        let positions: Vec<Option<Pt2>> = frames
            .iter()
            .map(|detections| {
                detections
                    .iter()
                    .filter(|d| d.may_be_boule())
                    .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
                    .map(|d| d.center)
            })
            .collect();
        self.track(&positions, fps)
    }
}
