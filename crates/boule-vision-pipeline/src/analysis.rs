//! Single-throw analysis: tracking, kinematics, technique and feedback.

use boule_vision_core::{MeasureResult, Pt2, Real};
use serde::{Deserialize, Serialize};

use crate::config::MeasureConfig;
use crate::feedback::{FeedbackGenerator, FeedbackMessage};
use crate::kinematics::{KinematicsAnalyzer, SpinEstimate};
use crate::technique::{Technique, TechniqueClassifier};
use crate::trajectory::{Trajectory, TrajectoryTracker};

/// Measurements and coaching output for one throw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThrowAnalysis {
    /// degrees
    pub angle: Real,
    /// m/s
    pub velocity: Real,
    pub spin: SpinEstimate,
    /// `[0, 100]`
    pub accuracy: Real,
    pub technique: Technique,
    pub feedback: Vec<FeedbackMessage>,
    pub point_count: usize,
    /// seconds
    pub duration_s: Real,
}

/// Change from one throw to a later one; positive values are increases.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThrowComparison {
    pub angle_change: Real,
    pub velocity_change: Real,
    /// Positive when the later throw was straighter.
    pub accuracy_change: Real,
    /// The technique changed between the two throws.
    pub technique_changed: bool,
}

impl ThrowAnalysis {
    /// Compare this throw with a `later` one.
    pub fn compare(&self, later: &ThrowAnalysis) -> ThrowComparison {
        ThrowComparison {
            angle_change: later.angle - self.angle,
            velocity_change: later.velocity - self.velocity,
            accuracy_change: later.accuracy - self.accuracy,
            technique_changed: later.technique != self.technique,
        }
    }
}

/// Stateless per-throw pipeline; independent throws can be analyzed in
/// parallel with a shared analyzer.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThrowAnalyzer {
    tracker: TrajectoryTracker,
    kinematics: KinematicsAnalyzer,
    classifier: TechniqueClassifier,
    feedback: FeedbackGenerator,
}

impl ThrowAnalyzer {
    pub fn new(config: &MeasureConfig) -> Self {
        Self {
            tracker: TrajectoryTracker::new(config.tracking),
            kinematics: KinematicsAnalyzer::new(config.scale, config.spin),
            classifier: TechniqueClassifier::new(config.technique),
            feedback: FeedbackGenerator::new(config.feedback),
        }
    }

    pub fn tracker(&self) -> &TrajectoryTracker {
        &self.tracker
    }

    /// Analyze a tracked throw. `frame_count` is the number of source frames,
    /// including those without a detection.
    pub fn analyze(&self, trajectory: &Trajectory, frame_count: usize) -> ThrowAnalysis {
        let angle = self.kinematics.angle(trajectory);
        let velocity = self.kinematics.velocity(trajectory);
        let accuracy = self.kinematics.accuracy(trajectory);
        let technique = self
            .classifier
            .classify_trajectory(trajectory, &self.kinematics);

        ThrowAnalysis {
            angle,
            velocity,
            spin: self.kinematics.spin(frame_count),
            accuracy,
            technique,
            feedback: self.feedback.generate(angle, velocity, accuracy),
            point_count: trajectory.len(),
            duration_s: trajectory.duration(),
        }
    }

    /// Track per-frame positions, then analyze.
    pub fn analyze_frames(
        &self,
        positions: &[Option<Pt2>],
        fps: Option<Real>,
    ) -> MeasureResult<ThrowAnalysis> {
        let trajectory = self.tracker.track(positions, fps)?;
        log::debug!(
            "tracked {} of {} frames",
            trajectory.len(),
            positions.len()
        );
        Ok(self.analyze(&trajectory, positions.len()))
    }
}
