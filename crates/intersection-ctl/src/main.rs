//! Adaptive Intersection Controller - Main Entry Point

use std::path::Path;

use intersection_ctl::{init_logging, run};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    info!("=== Intersection Pipeline v{} ===", env!("CARGO_PKG_VERSION"));
    info!("Starting adaptive intersection controller...");

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/intersection.toml".to_string());
    run(Path::new(&config_path)).await?;

    Ok(())
}
