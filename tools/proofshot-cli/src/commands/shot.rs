//! Take a single screenshot.

use std::path::PathBuf;

use proofshot_capture_engine::{capture_screenshot, BackendRegistry};
use proofshot_platform_core::CaptureTarget;

use super::{parse_backend, parse_region};

pub fn run(
    output: PathBuf,
    monitor: usize,
    region: Option<String>,
    quality: u8,
    backend: Option<String>,
) -> anyhow::Result<()> {
    let backend = parse_backend(backend)?;
    let region = region.as_deref().map(parse_region).transpose()?;

    let registry = BackendRegistry::probe();
    let target = CaptureTarget {
        monitor_index: monitor,
        region,
    };

    let path = capture_screenshot(&registry, backend, &target, &output, quality)?;
    println!("Screenshot saved to: {}", path.display());
    Ok(())
}
