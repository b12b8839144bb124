//! Report which capture backends are usable on this platform.

use proofshot_capture_engine::{BackendKind, BackendRegistry};

pub fn run() -> anyhow::Result<()> {
    let registry = BackendRegistry::probe();

    println!("Capture backends:");
    for kind in [BackendKind::Generic, BackendKind::Native] {
        let status = if registry.is_available(kind) {
            "available"
        } else {
            "unavailable"
        };
        println!("  {kind:<8} {status}");
    }

    match registry.select(None) {
        Ok(kind) => println!("\nDefault backend: {kind}"),
        Err(err) => println!("\nNo usable backend: {err}"),
    }
    Ok(())
}
