use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use facepass_core::{
    CapabilityError, Config, DetectorOptions, FaceCapability, FaceDetection, Frame, LogView,
    ModelKind, Session, SessionView,
};
use facepass_hw::V4lCamera;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "facepass", about = "Facepass face verification diagnostics")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List V4L2 capture devices
    Devices,
    /// Open the camera the way a session does and report frame statistics
    Test {
        /// Override the configured camera device
        #[arg(short, long)]
        device: Option<String>,
        /// Number of frames to grab
        #[arg(short, long, default_value_t = 5)]
        frames: usize,
    },
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load().context("failed to load configuration")?;

    match cli.command {
        Commands::Devices => {
            let devices = V4lCamera::list_devices();
            if devices.is_empty() {
                println!("No capture devices found");
            } else {
                println!("{}", serde_json::to_string_pretty(&devices)?);
            }
        }
        Commands::Test { device, frames } => {
            let device = device.unwrap_or_else(|| config.camera_device.clone());
            run_camera_test(config, &device, frames).await?;
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

/// Start capture through a session (no face models) and grab `frames` frames.
async fn run_camera_test(config: Config, device: &str, frames: usize) -> Result<()> {
    println!("Running camera diagnostics on {device}...");

    let camera = V4lCamera::new(device);
    let view: Arc<dyn SessionView> = Arc::new(LogView);
    let session = Session::new(config, Arc::new(NoModels), view);
    session
        .start_capture(&camera)
        .await
        .with_context(|| format!("camera {device} unavailable"))?;

    let mut report = Vec::with_capacity(frames);
    for _ in 0..frames {
        let frame = session.surface().current_frame().await?;
        report.push(serde_json::json!({
            "sequence": frame.sequence,
            "width": frame.width,
            "height": frame.height,
            "avg_brightness": frame.avg_brightness(),
        }));
    }

    tracing::info!(device, frames = report.len(), "camera test complete");
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Face capability stand-in for camera-only diagnostics.
struct NoModels;

#[async_trait]
impl FaceCapability for NoModels {
    async fn load_model(&self, kind: ModelKind, source: &str) -> Result<(), CapabilityError> {
        Err(CapabilityError::ModelLoad {
            kind,
            source_uri: source.to_string(),
            reason: "diagnostics run without face models".into(),
        })
    }

    async fn detect_single_face(
        &self,
        _frame: &Frame,
        _options: &DetectorOptions,
    ) -> Result<Option<FaceDetection>, CapabilityError> {
        Ok(None)
    }

    async fn detect_all_faces(
        &self,
        _frame: &Frame,
        _options: &DetectorOptions,
    ) -> Result<Vec<FaceDetection>, CapabilityError> {
        Ok(Vec::new())
    }
}
