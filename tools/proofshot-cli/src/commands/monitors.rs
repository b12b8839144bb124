//! List detected monitors and their geometry.

use proofshot_capture_engine::BackendRegistry;
use proofshot_platform_core::virtual_screen_bounds;

use super::parse_backend;

pub fn run(backend: Option<String>) -> anyhow::Result<()> {
    let backend = parse_backend(backend)?;
    let registry = BackendRegistry::probe();

    let kind = registry.select(backend)?;
    let mut source = kind.create()?;
    let monitors = source.monitors()?;

    println!("Backend: {kind}");
    println!();
    for (i, m) in monitors.iter().enumerate() {
        let primary = if m.primary { " (primary)" } else { "" };
        println!(
            "  {}: {} {}x{} at ({}, {}){}",
            i + 1,
            m.name,
            m.width,
            m.height,
            m.x,
            m.y,
            primary
        );
    }

    let union = virtual_screen_bounds(&monitors)?;
    println!();
    println!(
        "Virtual screen: {}x{} at ({}, {})",
        union.width, union.height, union.x, union.y
    );
    Ok(())
}
