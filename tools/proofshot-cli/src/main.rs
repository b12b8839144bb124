//! Proofshot CLI: screenshot and screen-recording evidence capture.
//!
//! Usage:
//!   proofshot shot [OPTIONS]       Take a screenshot
//!   proofshot record [OPTIONS]     Record the screen to a WebM file
//!   proofshot monitors             List detected monitors
//!   proofshot check                Check capture backend availability

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "proofshot",
    about = "Screenshot and screen-recording evidence capture for test runs",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Take a single screenshot
    Shot {
        /// Output image path (format from extension: png, jpg, jpeg)
        #[arg(short, long, default_value = "screenshot.png")]
        output: PathBuf,

        /// Monitor to capture: 0 = whole virtual screen, 1..N = physical monitor
        #[arg(long, default_value = "0")]
        monitor: usize,

        /// Capture region as "left,top,width,height", absolute pixels
        #[arg(long)]
        region: Option<String>,

        /// Quality 0-100 (compression level for png, quality for jpeg)
        #[arg(short, long, default_value = "50")]
        quality: u8,

        /// Capture backend: "generic" or "native"
        #[arg(long)]
        backend: Option<String>,
    },

    /// Record the screen to a VP8/WebM file until Ctrl+C (or --duration)
    Record {
        /// Output video path
        #[arg(short, long, default_value = "recording.webm")]
        output: PathBuf,

        /// Container frame rate (playback speed, not sampling cadence)
        #[arg(long, default_value = "25")]
        fps: u32,

        /// Scale factor applied to every frame, in (0, 1]
        #[arg(long, default_value = "1.0")]
        scale: f64,

        /// Monitor to record: 0 = whole virtual screen, 1..N = physical monitor
        #[arg(long, default_value = "0")]
        monitor: usize,

        /// Capture backend: "generic" or "native"
        #[arg(long)]
        backend: Option<String>,

        /// Stop automatically after this many seconds
        #[arg(long)]
        duration: Option<f64>,
    },

    /// List detected monitors and their geometry
    Monitors {
        /// Capture backend: "generic" or "native"
        #[arg(long)]
        backend: Option<String>,
    },

    /// Check which capture backends are usable on this platform
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    proofshot_common::logging::init_logging(&proofshot_common::config::LoggingConfig {
        level: log_level.to_string(),
        json: false,
    });

    match cli.command {
        Commands::Shot {
            output,
            monitor,
            region,
            quality,
            backend,
        } => commands::shot::run(output, monitor, region, quality, backend),
        Commands::Record {
            output,
            fps,
            scale,
            monitor,
            backend,
            duration,
        } => commands::record::run(output, fps, scale, monitor, backend, duration).await,
        Commands::Monitors { backend } => commands::monitors::run(backend),
        Commands::Check => commands::check::run(),
    }
}
