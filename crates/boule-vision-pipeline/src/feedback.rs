//! Coaching messages from throw metrics.

use boule_vision_core::Real;
use serde::{Deserialize, Serialize};

use crate::config::FeedbackConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackKind {
    Warning,
    Info,
    Success,
}

/// Metric a message is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Angle,
    Velocity,
    Accuracy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackMessage {
    pub kind: FeedbackKind,
    pub metric: Metric,
    pub text: String,
}

impl FeedbackMessage {
    fn new(kind: FeedbackKind, metric: Metric, text: &str) -> Self {
        Self {
            kind,
            metric,
            text: text.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FeedbackGenerator {
    config: FeedbackConfig,
}

impl FeedbackGenerator {
    pub fn new(config: FeedbackConfig) -> Self {
        Self { config }
    }

    /// Messages in angle, velocity, accuracy order.
    ///
    /// Angle and velocity always produce one message each. Accuracy inside
    /// its band produces none.
    pub fn generate(&self, angle: Real, velocity: Real, accuracy: Real) -> Vec<FeedbackMessage> {
        use FeedbackKind::*;

        let cfg = &self.config;
        let mut messages = Vec::with_capacity(3);

        messages.push(if angle < cfg.angle.low {
            FeedbackMessage::new(
                Warning,
                Metric::Angle,
                "Throw angle is too low. Try raising your arm slightly.",
            )
        } else if angle > cfg.angle.high {
            FeedbackMessage::new(
                Warning,
                Metric::Angle,
                "Throw angle is too high. Lower your arm for better control.",
            )
        } else {
            FeedbackMessage::new(Success, Metric::Angle, "Good throw angle!")
        });

        messages.push(if velocity < cfg.velocity.low {
            FeedbackMessage::new(
                Info,
                Metric::Velocity,
                "Increase your speed slightly for a longer throw.",
            )
        } else if velocity > cfg.velocity.high {
            FeedbackMessage::new(
                Warning,
                Metric::Velocity,
                "Throw a little softer for better precision.",
            )
        } else {
            FeedbackMessage::new(Success, Metric::Velocity, "Good throw speed!")
        });

        if accuracy < cfg.accuracy.low {
            messages.push(FeedbackMessage::new(
                Info,
                Metric::Accuracy,
                "Focus on keeping a straight path.",
            ));
        } else if accuracy > cfg.accuracy.high {
            messages.push(FeedbackMessage::new(
                Success,
                Metric::Accuracy,
                "Excellent precision!",
            ));
        }

        messages
    }
}
