//! Live capture and actuation

use tracing::{info, warn};
use trailsight_cns::{ActuatorSink, FrameReport, NullTransport, PathFollower, RunOutcome, Transport};
#[cfg(feature = "serial")]
use trailsight_cns::SerialTransport;
use trailsight_core::TrailsightConfig;
use trailsight_eye::{FrameSource, OpenCvBackend};

pub async fn follow(config: TrailsightConfig, dry_run: bool, json: bool) -> anyhow::Result<()> {
    let mut source = FrameSource::open(OpenCvBackend, config.camera.clone()).await?;

    let mut sink = ActuatorSink::new(build_transport(&config, dry_run));
    sink.connect().await?;

    let mut follower = PathFollower::from_config(&config);
    let running = follower.running_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, stopping after the current frame");
            *running.write() = false;
        }
    });

    let outcome = follower
        .run(&mut source, &mut sink, |report| print_report(report, json))
        .await?;
    sink.disconnect().await?;

    match outcome {
        RunOutcome::Cancelled => info!("Stopped by user"),
        RunOutcome::CameraLost => warn!("Camera stopped delivering frames, exiting"),
        RunOutcome::MarkerReached(name) => info!("Arrived at the '{}' marker", name),
    }
    Ok(())
}

fn build_transport(config: &TrailsightConfig, dry_run: bool) -> Box<dyn Transport> {
    if dry_run || !config.pipeline.dispatch {
        info!("Commands will be logged, not sent");
        return Box::new(NullTransport::new());
    }

    #[cfg(feature = "serial")]
    let transport: Box<dyn Transport> =
        Box::new(SerialTransport::new(config.serial.clone()));
    #[cfg(not(feature = "serial"))]
    let transport: Box<dyn Transport> = {
        warn!(
            "Built without serial support, commands for {} will not be sent",
            config.serial.port
        );
        Box::new(NullTransport::new())
    };
    transport
}

fn print_report(report: &FrameReport, json: bool) {
    if json {
        match serde_json::to_string(report) {
            Ok(line) => println!("{}", line),
            Err(e) => warn!("Failed to encode frame report: {}", e),
        }
        return;
    }

    match &report.marker {
        Some(marker) => info!("Frame {}: marker '{}' in view", report.frame_index, marker.name),
        None => info!(
            "Frame {}: {} (angle {})",
            report.frame_index,
            report.status,
            report
                .angle
                .map(|a| format!("{:.1}°", a))
                .unwrap_or_else(|| "-".to_string())
        ),
    }
}
