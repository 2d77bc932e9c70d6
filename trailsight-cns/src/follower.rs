//! Path-following control loop

use crate::decision::{CommandDecider, Decision};
use crate::error::CnsError;
use crate::fusion::AngleFusion;
use crate::transport::ActuatorSink;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};
use trailsight_core::{
    BoundingBox, DecisionConfig, PipelineProfile, SteeringDecision, TrailsightConfig,
};
use trailsight_eye::{
    CaptureBackend, Frame, FrameSource, MarkerSighting, PathGeometry, PathObservation,
    PathPipeline, VisionError,
};

/// What an overlay needs to draw one processed frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    pub frame_index: u64,
    pub bounding_box: Option<BoundingBox>,
    pub corners: Option<[(f64, f64); 4]>,
    pub orientation: Option<f64>,
    pub offset: Option<f64>,
    /// Fused steering angle
    pub angle: Option<f64>,
    pub decision: SteeringDecision,
    pub status: String,
    pub marker: Option<MarkerSighting>,
    /// Whether a command went to the actuator for this frame
    pub dispatched: bool,
}

impl FrameReport {
    pub fn label(&self) -> &'static str {
        self.decision.label()
    }
}

/// Why the loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Cancelled,
    /// Frame reads kept failing after every reopen
    CameraLost,
    MarkerReached(String),
}

/// State carried from one iteration to the next.
#[derive(Debug, Clone, Default)]
pub struct PipelineState {
    pub frames_processed: u64,
    pub commands_sent: u64,
    pub last_decision: Option<Decision>,
}

/// Runs perception, fusion and decision once per frame and drives the actuator.
pub struct PathFollower {
    profile: PipelineProfile,
    pipeline: PathPipeline,
    fusion: AngleFusion,
    decider: CommandDecider,
    state: PipelineState,
    is_running: Arc<RwLock<bool>>,
}

impl PathFollower {
    pub fn new(profile: PipelineProfile, decision: DecisionConfig) -> Self {
        Self {
            pipeline: PathPipeline::new(&profile),
            fusion: AngleFusion::from_profile(&profile),
            decider: CommandDecider::new(decision),
            profile,
            state: PipelineState::default(),
            is_running: Arc::new(RwLock::new(true)),
        }
    }

    pub fn from_config(config: &TrailsightConfig) -> Self {
        Self::new(config.pipeline.clone(), config.decision.clone())
    }

    pub fn profile(&self) -> &PipelineProfile {
        &self.profile
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Shared flag; set it to `false` to stop after the current iteration.
    pub fn running_handle(&self) -> Arc<RwLock<bool>> {
        self.is_running.clone()
    }

    pub fn stop(&self) {
        *self.is_running.write() = false;
    }

    pub fn is_running(&self) -> bool {
        *self.is_running.read()
    }

    /// Fuse and classify the dominant path region, or search when there is none.
    pub fn decide(&self, path: Option<&PathGeometry>, now: Instant) -> Decision {
        let angle = path.map(|p| self.fusion.fuse(p.oriented_box.angle, p.offset));
        self.decider.decide_at(angle, now)
    }

    /// Perception and decision for one frame, without side effects.
    pub fn evaluate(&self, frame: &Frame, now: Instant) -> (PathObservation, Decision) {
        let observation = self.pipeline.observe(frame);
        let decision = self.decide(observation.path.as_ref(), now);
        (observation, decision)
    }

    /// Report for a single frame outside the loop. Nothing is dispatched.
    pub fn inspect(&self, frame: &Frame) -> FrameReport {
        let (observation, decision) = self.evaluate(frame, Instant::now());
        self.report(&observation, &decision)
    }

    fn report(&self, observation: &PathObservation, decision: &Decision) -> FrameReport {
        let path = observation.path.as_ref();
        FrameReport {
            frame_index: self.state.frames_processed,
            bounding_box: path.map(|p| p.bounding_box),
            corners: path.map(|p| p.oriented_box.corners()),
            orientation: path.map(|p| p.oriented_box.angle),
            offset: path.map(|p| p.offset),
            angle: decision.angle,
            decision: decision.decision,
            status: decision.status().to_string(),
            marker: observation.marker.clone(),
            dispatched: false,
        }
    }

    /// One iteration: read, decide, dispatch, hold for the dwell.
    pub async fn step<B: CaptureBackend>(
        &mut self,
        source: &mut FrameSource<B>,
        sink: &mut ActuatorSink,
    ) -> Result<FrameReport, CnsError> {
        let frame = source.read().await?;
        let (observation, decision) = self.evaluate(&frame, Instant::now());
        self.state.frames_processed += 1;
        let mut report = self.report(&observation, &decision);

        if let Some(marker) = &observation.marker {
            info!("Reached marker '{}'", marker.name);
            self.state.last_decision = Some(decision);
            return Ok(report);
        }

        debug!(
            "Frame {}: {} (angle {:?})",
            report.frame_index, decision.decision, decision.angle
        );

        if self.profile.dispatch {
            match sink.send(decision.command()).await {
                Ok(()) => {
                    self.state.commands_sent += 1;
                    report.dispatched = true;
                }
                Err(e) => warn!("Failed to send '{}': {}", decision.command(), e),
            }
        }

        self.state.last_decision = Some(decision);
        sleep_until(decision.not_before).await;

        Ok(report)
    }

    /// Loop until cancelled, the camera is lost, or a marker ends the run.
    /// `on_frame` sees every report before the cancellation check.
    pub async fn run<B, F>(
        &mut self,
        source: &mut FrameSource<B>,
        sink: &mut ActuatorSink,
        mut on_frame: F,
    ) -> Result<RunOutcome, CnsError>
    where
        B: CaptureBackend,
        F: FnMut(&FrameReport),
    {
        info!(
            "Following path with profile '{}' (dispatch {})",
            self.profile.name,
            if self.profile.dispatch { "on" } else { "off" }
        );

        loop {
            let report = match self.step(source, sink).await {
                Ok(report) => report,
                Err(CnsError::Vision(VisionError::FrameReadFailure { attempts })) => {
                    warn!("Camera lost after {} failed reads, stopping", attempts);
                    return Ok(RunOutcome::CameraLost);
                }
                Err(e) => return Err(e),
            };

            on_frame(&report);

            if let Some(marker) = &report.marker {
                if self.profile.stop_at_marker {
                    return Ok(RunOutcome::MarkerReached(marker.name.clone()));
                }
            }

            if !self.is_running() {
                info!(
                    "Stopped after {} frames, {} commands sent",
                    self.state.frames_processed, self.state.commands_sent
                );
                return Ok(RunOutcome::Cancelled);
            }
        }
    }
}
