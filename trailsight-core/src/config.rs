// Configuration model for the path follower

use crate::error::{Error, Result};
use crate::types::{ColorRange, SteeringDecision};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Camera acquisition settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Video device index (0, 1, 2, etc.)
    pub index: u32,
    /// Resolution forced on every successful open (width, height)
    pub resolution: (u32, u32),
    /// Attempts made before the camera is declared unavailable
    pub max_retries: u32,
    /// Pause after each failed attempt
    pub retry_delay_ms: u64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: 0,
            resolution: (1280, 720),
            max_retries: 5,
            retry_delay_ms: 1000,
        }
    }
}

impl CameraConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Serial link to the drive controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    pub port: String,
    pub baud_rate: u32,
    pub timeout_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyACM0".to_string(),
            baud_rate: 9600,
            timeout_ms: 1000,
        }
    }
}

impl SerialConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// A colored table marker watched for in table-service mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerConfig {
    pub name: String,
    pub range: ColorRange,
    /// Bounding-box area (px²) the marker must exceed to count as reached
    pub min_area: i64,
}

impl MarkerConfig {
    pub fn new(name: impl Into<String>, range: ColorRange) -> Self {
        Self {
            name: name.into(),
            range,
            min_area: 200_000,
        }
    }
}

/// Per-use-site pipeline parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineProfile {
    pub name: String,
    /// Color of the guide path
    pub path_range: ColorRange,
    /// Erosion passes applied after opening
    pub erosion_iterations: u32,
    /// Dilation passes applied after erosion
    pub dilation_iterations: u32,
    /// Focal distance (px) for the offset correction
    pub focal_distance: f64,
    /// Sigma of the 5x5 Gaussian pre-blur
    pub blur_sigma: f64,
    /// Send decisions to the actuator
    pub dispatch: bool,
    pub markers: Vec<MarkerConfig>,
    /// End the run once a marker has been reached
    pub stop_at_marker: bool,
}

impl Default for PipelineProfile {
    fn default() -> Self {
        Self::lane_following()
    }
}

impl PipelineProfile {
    /// Follow the blue line and drive the actuator.
    pub fn lane_following() -> Self {
        Self {
            name: "lane".to_string(),
            path_range: ColorRange::BLUE_INK,
            erosion_iterations: 1,
            dilation_iterations: 5,
            focal_distance: 580.0,
            blur_sigma: 4.0,
            dispatch: true,
            markers: Vec::new(),
            stop_at_marker: false,
        }
    }

    /// Follow the line while watching for table markers. Decisions are only logged.
    pub fn table_service() -> Self {
        Self {
            name: "table".to_string(),
            path_range: ColorRange::BLUE_INK,
            erosion_iterations: 3,
            dilation_iterations: 5,
            focal_distance: 800.0,
            blur_sigma: 4.0,
            dispatch: false,
            markers: vec![
                MarkerConfig::new("red", ColorRange::RED_MARKER),
                MarkerConfig::new("yellow", ColorRange::YELLOW_MARKER),
                MarkerConfig::new("green", ColorRange::GREEN_MARKER),
            ],
            stop_at_marker: true,
        }
    }

    /// Look up a preset by name.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "lane" | "lane_following" => Some(Self::lane_following()),
            "table" | "table_service" => Some(Self::table_service()),
            _ => None,
        }
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        self.path_range.validate()?;
        if self.erosion_iterations == 0 || self.erosion_iterations > 3 {
            return Err("Erosion iterations must be between 1 and 3".to_string());
        }
        if self.dilation_iterations == 0 || self.dilation_iterations > 10 {
            return Err("Dilation iterations must be between 1 and 10".to_string());
        }
        if !self.focal_distance.is_finite() || self.focal_distance <= 0.0 {
            return Err("Focal distance must be a positive number".to_string());
        }
        if !self.blur_sigma.is_finite() || self.blur_sigma <= 0.0 {
            return Err("Blur sigma must be a positive number".to_string());
        }
        for marker in &self.markers {
            marker
                .range
                .validate()
                .map_err(|e| format!("Marker '{}': {}", marker.name, e))?;
        }
        Ok(())
    }
}

/// Steering thresholds and hold times
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionConfig {
    /// Angles strictly below this steer left
    pub left_threshold: f64,
    /// Angles strictly above this steer right
    pub right_threshold: f64,
    pub turn_dwell_ms: u64,
    pub forward_dwell_ms: u64,
    pub search_dwell_ms: u64,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            left_threshold: -10.0,
            right_threshold: 10.0,
            turn_dwell_ms: 50,
            forward_dwell_ms: 175,
            search_dwell_ms: 50,
        }
    }
}

impl DecisionConfig {
    pub fn dwell_for(&self, decision: SteeringDecision) -> Duration {
        let ms = match decision {
            SteeringDecision::Left | SteeringDecision::Right => self.turn_dwell_ms,
            SteeringDecision::Forward => self.forward_dwell_ms,
            SteeringDecision::Searching => self.search_dwell_ms,
        };
        Duration::from_millis(ms)
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if !(self.left_threshold <= self.right_threshold) {
            return Err("left_threshold must not exceed right_threshold".to_string());
        }
        Ok(())
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrailsightConfig {
    pub camera: CameraConfig,
    pub serial: SerialConfig,
    pub pipeline: PipelineProfile,
    pub decision: DecisionConfig,
}

impl TrailsightConfig {
    /// Load configuration from a JSON, TOML or YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_str(&content)
    }

    /// Load configuration from string
    pub fn from_str(content: &str) -> Result<Self> {
        if let Ok(config) = serde_json::from_str::<TrailsightConfig>(content) {
            return Ok(config);
        }

        if let Ok(config) = toml::from_str::<TrailsightConfig>(content) {
            return Ok(config);
        }

        if let Ok(config) = serde_yaml::from_str::<TrailsightConfig>(content) {
            return Ok(config);
        }

        Err(Error::Parse("Unknown configuration format".to_string()))
    }

    /// Overlay `CAMERA_INDEX`, `SERIAL_PORT` and `TRAILSIGHT_PROFILE` from the environment
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    /// Overlay variables from an arbitrary lookup
    pub fn apply_vars<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(index) = lookup("CAMERA_INDEX") {
            self.camera.index = index.trim().parse::<u32>().map_err(|_| {
                Error::Configuration(format!("CAMERA_INDEX is not a device index: '{}'", index))
            })?;
        }

        if let Some(port) = lookup("SERIAL_PORT") {
            if !port.is_empty() {
                self.serial.port = port;
            }
        }

        if let Some(profile) = lookup("TRAILSIGHT_PROFILE") {
            self.pipeline = PipelineProfile::preset(profile.trim()).ok_or_else(|| {
                Error::Configuration(format!("Unknown pipeline profile '{}'", profile))
            })?;
        }

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.camera.resolution.0 == 0 || self.camera.resolution.1 == 0 {
            return Err(Error::Validation("Camera resolution must be non-zero".to_string()));
        }
        if self.camera.resolution.0 > 7680 || self.camera.resolution.1 > 4320 {
            return Err(Error::Validation("Camera resolution too large (max 8K)".to_string()));
        }
        if self.camera.max_retries == 0 {
            return Err(Error::Validation("camera.max_retries must be > 0".to_string()));
        }
        if self.serial.baud_rate == 0 {
            return Err(Error::Validation("serial.baud_rate must be > 0".to_string()));
        }
        if self.serial.port.is_empty() {
            return Err(Error::Validation("serial.port must not be empty".to_string()));
        }
        self.pipeline.validate().map_err(Error::Validation)?;
        self.decision.validate().map_err(Error::Validation)?;
        Ok(())
    }
}
