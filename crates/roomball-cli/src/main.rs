use std::{path::PathBuf, str::FromStr, time::Duration};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use roomball_core::{Detector, RoomballSettings};
use roomball_executor::{FrameScheduler, SchedulerHandle};
use tokio::sync::broadcast;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer};

mod log_renderer;
mod mock_detector;

use log_renderer::LogRenderer;
use mock_detector::{MockDetector, MockDetectorConfig, NoHandsDetector};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub(crate) enum DetectorType {
    /// A synthetic hand moving in front of the camera
    Synthetic,
    /// No hand is ever detected
    None,
}

#[derive(Debug, Parser)]
#[command(name = "roomball")]
pub(crate) struct Args {
    #[clap(long, short = 'f', default_value = "roomball-settings.json")]
    settings_file: PathBuf,

    #[clap(long, default_value = "info")]
    log_level: String,

    #[clap(long, default_value = "auto")]
    log_directory: String,

    #[clap(long, default_value = "synthetic")]
    detector: DetectorType,

    /// Probability that the synthetic detector finds no hand in a frame
    #[clap(long, default_value = "0.1")]
    miss_rate: f64,

    /// Duration of one synthetic detection pass
    #[clap(long, default_value = "60")]
    detection_latency_ms: u64,

    /// Run this many frames with a fixed time step and exit, instead of running in
    /// real time
    #[clap(long)]
    frames: Option<u64>,

    /// Flip the camera image horizontally, as in a selfie view
    #[clap(long, default_value_t = true, action = clap::ArgAction::Set)]
    mirror: bool,

    #[clap(long, default_value = "640")]
    frame_width: u32,

    #[clap(long, default_value = "480")]
    frame_height: u32,
}

impl Args {
    fn detector(&self) -> Result<Box<dyn Detector>> {
        match self.detector {
            DetectorType::Synthetic => {
                if !(0.0..=1.0).contains(&self.miss_rate) {
                    bail!("Miss rate must lie in [0, 1], got {}", self.miss_rate);
                }
                Ok(Box::new(MockDetector::new(MockDetectorConfig {
                    frame_width: self.frame_width,
                    frame_height: self.frame_height,
                    miss_rate: self.miss_rate,
                    latency: Duration::from_millis(self.detection_latency_ms),
                    mirror: self.mirror,
                })))
            }
            DetectorType::None => Ok(Box::new(NoHandsDetector)),
        }
    }

    fn log_file_path(&self) -> PathBuf {
        let time = chrono::Local::now().format("%Y-%m-%d_%H-%M-%S").to_string();
        let filename = format!("roomball-{time}.log");
        if self.log_directory != "auto" {
            return PathBuf::from(&self.log_directory).join(filename);
        }
        dirs::data_local_dir()
            .map(|p| p.join("roomball").join("logs").join(&filename))
            .unwrap_or_else(|| PathBuf::from(&filename))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up log file
    let log_file_path = args.log_file_path();
    let log_dir = log_file_path
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    tokio::fs::create_dir_all(&log_dir)
        .await
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;
    let Some(log_file_name) = log_file_path.file_name() else {
        bail!("Invalid log file path: {}", log_file_path.display());
    };
    let appender = tracing_appender::rolling::never(&log_dir, log_file_name);
    let (non_blocking_appender, _guard) = tracing_appender::non_blocking(appender);

    // Set up tracing
    let log_level = match tracing::Level::from_str(&args.log_level) {
        Ok(level) => LevelFilter::from_level(level),
        Err(_) => bail!("Invalid log level: {}", args.log_level),
    };
    let stdout_layer = fmt::layer().without_time().with_filter(log_level);
    let logfile_layer = fmt::layer()
        .json()
        .with_ansi(false)
        .with_writer(non_blocking_appender)
        .with_filter(log_level.max(LevelFilter::DEBUG));
    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(logfile_layer)
        .try_init()
        .context("Unable to set global tracing subscriber")?;

    tracing::info!("Saving logs to {}", log_file_path.display());

    let settings = RoomballSettings::load_or_insert(&args.settings_file)?;
    let scheduler = FrameScheduler::builder()
        .with_settings(settings)
        .with_detector(args.detector()?)
        .with_renderer(Box::new(LogRenderer::new()))
        .build()
        .context("Failed to set up the frame scheduler")?;

    match args.frames {
        Some(frames) => run_headless(scheduler, frames),
        None => run_real_time(scheduler).await,
    }
}

/// Run a fixed number of frames with the nominal time step. The detector is called
/// inline, once per frame.
fn run_headless(mut scheduler: FrameScheduler, frames: u64) -> Result<()> {
    let dt = 1.0 / scheduler.target_fps();
    tracing::info!("Running {} frames with dt = {:.4}s", frames, dt);

    let mut last = None;
    for _ in 0..frames {
        last = Some(scheduler.step(dt));
    }

    if let Some(update) = last {
        println!("{}", serde_json::to_string_pretty(&update)?);
    }
    Ok(())
}

async fn run_real_time(scheduler: FrameScheduler) -> Result<()> {
    let handle = scheduler.handle();
    let (stop_tx, stop_rx) = broadcast::channel(1);
    let mut main_task = tokio::spawn(scheduler.run_real_time(stop_rx));
    let summary_task = tokio::spawn(log_summaries(handle));

    let result = tokio::select! {
        res = tokio::signal::ctrl_c() => {
            res.context("Failed to listen for ctrl-c")?;
            tracing::info!("Shutting down");
            stop_tx.send(()).ok();
            (&mut main_task).await
        }
        res = &mut main_task => res,
    };
    summary_task.abort();

    result.context("Frame loop task failed")?
}

/// Log a short summary of the frame loop every few seconds.
async fn log_summaries(handle: SchedulerHandle) {
    let mut interval = tokio::time::interval(Duration::from_secs(5));
    interval.tick().await;
    loop {
        interval.tick().await;
        let Ok(info) = handle.info() else {
            break;
        };
        let Some(info) = info.recv().await else {
            continue;
        };
        tracing::info!(
            frames = info.stats.frames,
            hit_rate = info.stats.hit_rate(),
            bounces = info.stats.bounces,
            paused = info.paused,
            "Frame loop running at {} fps",
            info.target_fps
        );
    }
}
