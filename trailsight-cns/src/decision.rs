//! Threshold steering decisions with a minimum dwell

use std::time::Duration;
use tokio::time::Instant;
use trailsight_core::{DecisionConfig, SteeringCommand, SteeringDecision};

/// A decision together with the earliest instant the next one may be dispatched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub decision: SteeringDecision,
    /// Fused steering angle; `None` while searching
    pub angle: Option<f64>,
    pub dwell: Duration,
    pub not_before: Instant,
}

impl Decision {
    pub fn command(&self) -> SteeringCommand {
        self.decision.command()
    }

    pub fn status(&self) -> &'static str {
        self.decision.status()
    }

    /// Whether the dwell has elapsed at `now`.
    pub fn elapsed_at(&self, now: Instant) -> bool {
        now >= self.not_before
    }
}

/// Maps a steering angle onto left, right or forward using strict thresholds.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CommandDecider {
    config: DecisionConfig,
}

impl CommandDecider {
    pub fn new(config: DecisionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DecisionConfig {
        &self.config
    }

    pub fn classify(&self, angle: f64) -> SteeringDecision {
        if angle < self.config.left_threshold {
            SteeringDecision::Left
        } else if angle > self.config.right_threshold {
            SteeringDecision::Right
        } else {
            SteeringDecision::Forward
        }
    }

    pub fn decide(&self, angle: f64) -> (SteeringDecision, Duration) {
        let decision = self.classify(angle);
        (decision, self.config.dwell_for(decision))
    }

    /// Decision used when no path is visible.
    pub fn searching(&self) -> (SteeringDecision, Duration) {
        (
            SteeringDecision::Searching,
            self.config.dwell_for(SteeringDecision::Searching),
        )
    }

    /// Decide for an optional angle and stamp the dwell deadline from `now`.
    pub fn decide_at(&self, angle: Option<f64>, now: Instant) -> Decision {
        let (decision, dwell) = match angle {
            Some(angle) => self.decide(angle),
            None => self.searching(),
        };
        Decision {
            decision,
            angle,
            dwell,
            not_before: now + dwell,
        }
    }
}
