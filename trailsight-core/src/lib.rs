//! trailsight-core: shared vocabulary for the path follower
//!
//! Holds the plain data types that flow between perception (`trailsight-eye`)
//! and actuation (`trailsight-cns`), the configuration model, and the base
//! error type.

pub mod types;
pub mod error;
pub mod config;

pub use error::{Error, Result};
pub use types::{
    BoundingBox, ColorRange, OrientedBox, SteeringCommand, SteeringDecision,
};
pub use config::{
    CameraConfig, DecisionConfig, MarkerConfig, PipelineProfile, SerialConfig,
    TrailsightConfig,
};
