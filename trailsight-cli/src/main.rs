// trailsight command line interface
// Runs the path follower, analyzes still images and inspects configuration

#[cfg(feature = "opencv")]
mod live;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use trailsight_cns::PathFollower;
use trailsight_core::{PipelineProfile, TrailsightConfig};
use trailsight_eye::Frame;

#[derive(Parser)]
#[command(name = "trailsight")]
#[command(about = "Camera-guided path follower", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (JSON, TOML or YAML)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Pipeline profile (lane, table)
    #[arg(long, short, global = true)]
    profile: Option<String>,

    /// Log level used when RUST_LOG is unset (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Follow the path using the camera and the actuator
    Run {
        /// Camera device index
        #[arg(long)]
        camera: Option<u32>,

        /// Serial port of the drive controller
        #[arg(long)]
        serial_port: Option<String>,

        /// Decide and log only, send nothing
        #[arg(long)]
        dry_run: bool,

        /// Print one JSON frame report per line on stdout
        #[arg(long)]
        json: bool,
    },

    /// Run perception on a still image and print its frame report
    Analyze {
        /// Image file (PNG, JPEG, ...)
        image: PathBuf,
    },

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the resolved configuration
    Show,

    /// Validate the resolved configuration
    Validate,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_json);

    let mut config = load_config(cli.config.as_deref(), cli.profile.as_deref())?;

    match cli.command {
        Commands::Run { camera, serial_port, dry_run, json } => {
            if let Some(index) = camera {
                config.camera.index = index;
            }
            if let Some(port) = serial_port {
                config.serial.port = port;
            }
            config.validate()?;
            follow(config, dry_run, json).await?;
        }
        Commands::Analyze { image } => {
            config.validate()?;
            analyze(&config, &image)?;
        }
        Commands::Config(ConfigCommands::Show) => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Config(ConfigCommands::Validate) => {
            config.validate()?;
            println!("Configuration is valid (profile '{}')", config.pipeline.name);
        }
    }

    Ok(())
}

fn init_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// File (or defaults), then environment, then the profile flag.
fn load_config(path: Option<&Path>, profile: Option<&str>) -> anyhow::Result<TrailsightConfig> {
    let mut config = match path {
        Some(path) => TrailsightConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => TrailsightConfig::default(),
    };
    config.apply_env()?;

    if let Some(name) = profile {
        config.pipeline = PipelineProfile::preset(name)
            .ok_or_else(|| anyhow!("Unknown pipeline profile '{}'", name))?;
    }
    debug!(
        "Resolved configuration: camera {}, serial {}, profile '{}'",
        config.camera.index, config.serial.port, config.pipeline.name
    );
    Ok(config)
}

fn analyze(config: &TrailsightConfig, path: &Path) -> anyhow::Result<()> {
    let image = image::open(path)
        .with_context(|| format!("Failed to read image {}", path.display()))?
        .to_rgb8();
    info!("Analyzing {} ({}x{})", path.display(), image.width(), image.height());
    let follower = PathFollower::from_config(config);
    let report = follower.inspect(&Frame::new(image));
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[cfg(feature = "opencv")]
async fn follow(config: TrailsightConfig, dry_run: bool, json: bool) -> anyhow::Result<()> {
    live::follow(config, dry_run, json).await
}

#[cfg(not(feature = "opencv"))]
async fn follow(_config: TrailsightConfig, _dry_run: bool, _json: bool) -> anyhow::Result<()> {
    Err(anyhow!(
        "trailsight was built without camera support; rebuild with --features opencv"
    ))
}
