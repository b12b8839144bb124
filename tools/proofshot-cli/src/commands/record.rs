//! Record the screen to a WebM file.

use std::path::PathBuf;
use std::time::Duration;

use proofshot_capture_engine::{BackendRegistry, RecordingConfig, RecordingSession};

use super::parse_backend;

pub async fn run(
    output: PathBuf,
    fps: u32,
    scale: f64,
    monitor: usize,
    backend: Option<String>,
    duration: Option<f64>,
) -> anyhow::Result<()> {
    let backend = parse_backend(backend)?;
    let registry = BackendRegistry::probe();

    let config = RecordingConfig {
        output_path: output,
        fps,
        scale_factor: scale,
        monitor_index: monitor,
        backend,
    };

    let mut session = RecordingSession::new(config, &registry);
    session.start().await?;

    match duration {
        Some(secs) => {
            println!("Recording for {secs} seconds...");
            tokio::time::sleep(Duration::from_secs_f64(secs)).await;
        }
        None => {
            println!("Recording... press Ctrl+C to stop.");
            tokio::signal::ctrl_c().await?;
            println!();
        }
    }

    let path = session.stop().await?;
    println!("Recording saved to: {}", path.display());
    Ok(())
}
