//! trailsight-cns: steering control for the path follower
//!
//! Provides:
//! - Fusion of box orientation and pixel offset into one steering angle
//! - Threshold decisions carrying their minimum dwell
//! - Pluggable actuator transport (serial, dry run)
//! - The per-frame control loop

pub mod decision;
pub mod error;
pub mod follower;
pub mod fusion;
pub mod transport;

pub use decision::{CommandDecider, Decision};
pub use error::CnsError;
pub use follower::{FrameReport, PathFollower, PipelineState, RunOutcome};
pub use fusion::AngleFusion;
pub use transport::{ActuatorSink, NullTransport, RecordingTransport, Transport, TransportType};
#[cfg(feature = "serial")]
pub use transport::SerialTransport;
