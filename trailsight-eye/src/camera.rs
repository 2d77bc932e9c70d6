//! Camera acquisition with bounded retry

use crate::error::VisionError;
use crate::frame::Frame;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};
use trailsight_core::CameraConfig;

#[cfg(feature = "opencv")]
use opencv::{
    core::Mat,
    prelude::*,
    videoio::{VideoCapture, CAP_ANY, CAP_PROP_FRAME_HEIGHT, CAP_PROP_FRAME_WIDTH},
};

/// An opened camera handle. Dropping it releases the device.
pub trait CaptureDevice: Send {
    fn read_frame(&mut self) -> Result<Frame, VisionError>;
}

/// Opens camera devices by index.
pub trait CaptureBackend: Send {
    type Device: CaptureDevice;

    /// Open `index` and request `resolution` from the driver.
    fn open(&mut self, index: u32, resolution: (u32, u32)) -> Result<Self::Device, VisionError>;
}

/// Frame source that owns one camera handle and recovers from transient failures.
pub struct FrameSource<B: CaptureBackend> {
    backend: B,
    config: CameraConfig,
    device: Option<B::Device>,
    retry_count: u32,
    frames_read: u64,
}

impl<B: CaptureBackend> FrameSource<B> {
    /// Open the configured camera, pausing `retry_delay` after every failed attempt.
    pub async fn open(mut backend: B, config: CameraConfig) -> Result<Self, VisionError> {
        let attempts = config.max_retries.max(1);
        for attempt in 1..=attempts {
            match backend.open(config.index, config.resolution) {
                Ok(device) => {
                    info!(
                        "Camera {} opened at {}x{}",
                        config.index, config.resolution.0, config.resolution.1
                    );
                    return Ok(Self {
                        backend,
                        config,
                        device: Some(device),
                        retry_count: 0,
                        frames_read: 0,
                    });
                }
                Err(e) => {
                    warn!(
                        "Failed to open camera {} ({}/{}): {}",
                        config.index, attempt, attempts, e
                    );
                    sleep(config.retry_delay()).await;
                }
            }
        }

        error!("Camera {} unavailable after {} attempts", config.index, attempts);
        Err(VisionError::CameraUnavailable {
            device: config.index,
            attempts,
        })
    }

    /// Read the next frame. A failed read releases the handle, waits and
    /// reopens; `FrameReadFailure` once the retry budget is spent.
    pub async fn read(&mut self) -> Result<Frame, VisionError> {
        self.retry_count = 0;
        let budget = self.config.max_retries.max(1);

        loop {
            let result = match self.device.as_mut() {
                Some(device) => device.read_frame(),
                None => Err(VisionError::Camera(format!(
                    "Camera {} is not open",
                    self.config.index
                ))),
            };

            match result {
                Ok(frame) => {
                    self.retry_count = 0;
                    self.frames_read += 1;
                    debug!("Read frame {} ({}x{})", self.frames_read, frame.width(), frame.height());
                    return Ok(frame);
                }
                Err(e) => {
                    self.retry_count += 1;
                    warn!(
                        "Camera {} read failed ({}/{}): {}",
                        self.config.index, self.retry_count, budget, e
                    );
                    self.release();

                    if self.retry_count >= budget {
                        error!(
                            "Giving up on camera {} after {} failed reads",
                            self.config.index, self.retry_count
                        );
                        return Err(VisionError::FrameReadFailure {
                            attempts: self.retry_count,
                        });
                    }

                    sleep(self.config.retry_delay()).await;
                    match self.backend.open(self.config.index, self.config.resolution) {
                        Ok(device) => {
                            info!("Camera {} reopened", self.config.index);
                            self.device = Some(device);
                        }
                        Err(e) => warn!("Failed to reopen camera {}: {}", self.config.index, e),
                    }
                }
            }
        }
    }

    /// Drop the current handle, if any.
    pub fn release(&mut self) {
        if self.device.take().is_some() {
            debug!("Released camera {}", self.config.index);
        }
    }

    pub fn is_open(&self) -> bool {
        self.device.is_some()
    }

    /// Consecutive failures in the current read.
    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    pub fn device_index(&self) -> u32 {
        self.config.index
    }
}

/// Webcam access through OpenCV's videoio.
#[cfg(feature = "opencv")]
#[derive(Debug, Default)]
pub struct OpenCvBackend;

#[cfg(feature = "opencv")]
pub struct OpenCvDevice {
    capture: VideoCapture,
}

#[cfg(feature = "opencv")]
impl CaptureBackend for OpenCvBackend {
    type Device = OpenCvDevice;

    fn open(&mut self, index: u32, resolution: (u32, u32)) -> Result<OpenCvDevice, VisionError> {
        let mut capture = VideoCapture::new(index as i32, CAP_ANY)
            .map_err(|e| VisionError::Camera(format!("Failed to open camera {}: {}", index, e)))?;

        if !capture
            .is_opened()
            .map_err(|e| VisionError::Camera(format!("Camera {} not opened: {}", index, e)))?
        {
            return Err(VisionError::Camera(format!("Camera {} failed to open", index)));
        }

        capture
            .set(CAP_PROP_FRAME_WIDTH, resolution.0 as f64)
            .map_err(|e| VisionError::Camera(format!("Failed to set width: {}", e)))?;
        capture
            .set(CAP_PROP_FRAME_HEIGHT, resolution.1 as f64)
            .map_err(|e| VisionError::Camera(format!("Failed to set height: {}", e)))?;

        Ok(OpenCvDevice { capture })
    }
}

#[cfg(feature = "opencv")]
impl CaptureDevice for OpenCvDevice {
    fn read_frame(&mut self) -> Result<Frame, VisionError> {
        let mut mat = Mat::default();
        let grabbed = self.capture.read(&mut mat)?;
        if !grabbed || mat.empty() {
            return Err(VisionError::Camera("Camera returned no frame".to_string()));
        }
        crate::utils::mat_to_frame(&mat)
    }
}
