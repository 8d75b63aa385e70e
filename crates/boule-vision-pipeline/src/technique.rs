//! Throw technique labels from speed and launch angle.

use std::fmt;

use boule_vision_core::Real;
use serde::{Deserialize, Serialize};

use crate::config::TechniqueConfig;
use crate::kinematics::KinematicsAnalyzer;
use crate::trajectory::Trajectory;

/// Throwing style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Technique {
    Pointing,
    Shooting,
    Rolling,
    Mixed,
    /// No trajectory data.
    #[default]
    Unknown,
}

impl fmt::Display for Technique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Technique::Pointing => "pointing",
            Technique::Shooting => "shooting",
            Technique::Rolling => "rolling",
            Technique::Mixed => "mixed",
            Technique::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Rule-based technique labels from speed and launch angle.
#[derive(Debug, Clone, Copy, Default)]
pub struct TechniqueClassifier {
    config: TechniqueConfig,
}

impl TechniqueClassifier {
    pub fn new(config: TechniqueConfig) -> Self {
        Self { config }
    }

    /// Label a throw from velocity (m/s) and angle (degrees).
    ///
    /// Rules are tried in order and the first match wins: pointing, then
    /// shooting, then rolling. Slow flat throws match both pointing and
    /// rolling and are labelled pointing. Anything unmatched is mixed.
    pub fn classify(&self, velocity: Real, angle: Real) -> Technique {
        let TechniqueConfig {
            pointing,
            shooting,
            rolling,
        } = self.config;

        if velocity < pointing.velocity && angle < pointing.angle {
            Technique::Pointing
        } else if velocity > shooting.velocity && angle > shooting.angle {
            Technique::Shooting
        } else if velocity < rolling.velocity && angle < rolling.angle {
            Technique::Rolling
        } else {
            Technique::Mixed
        }
    }

    /// Label a tracked throw; `Unknown` when the trajectory is empty.
    pub fn classify_trajectory(
        &self,
        trajectory: &Trajectory,
        kinematics: &KinematicsAnalyzer,
    ) -> Technique {
        if trajectory.is_empty() {
            return Technique::Unknown;
        }
        self.classify(kinematics.velocity(trajectory), kinematics.angle(trajectory))
    }
}
