//! Intersection Controller Daemon
//!
//! Loads the intersection description (signal wiring, detection polygons,
//! timing) from a TOML file with an `INTERSECTION_*` environment overlay,
//! validates it, and runs the control loop against the relay daemon.

use std::path::Path;
use std::sync::atomic::Ordering;
use std::time::Duration;

use serde::Deserialize;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use intersection_control::{Controller, Region, RegionSchedule, SignalHeads, TimingConfig};
use region_detect::{HttpCountSource, Point, RegionLayout, RegionPolygon};
use signal_relay::{RelayClient, RelayConfig};

/// Count endpoint configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DetectorConfig {
    /// Base URL of the count endpoint
    pub base_url: String,
    /// Query timeout in milliseconds
    #[serde(default = "default_detector_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_detector_timeout_ms() -> u64 {
    2000
}

/// One configured approach: signal wiring plus detection polygon
#[derive(Debug, Clone, Deserialize)]
pub struct RegionEntry {
    pub name: String,
    pub signals: SignalHeads,
    pub points: Vec<Point>,
}

/// Full daemon configuration
#[derive(Debug, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub relay: RelayConfig,
    pub detector: DetectorConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    pub regions: Vec<RegionEntry>,
}

/// Load configuration: file first, then `INTERSECTION_*` environment
/// variables on top.
pub fn load_config(path: &Path) -> Result<AppConfig, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(
            config::Environment::with_prefix("INTERSECTION")
                .separator("__"),
        )
        .build()?;
    settings.try_deserialize()
}

/// Detector layout from the configured regions
pub fn build_layout(
    entries: &[RegionEntry],
) -> Result<RegionLayout, region_detect::DetectionError> {
    let mut regions = Vec::with_capacity(entries.len());
    for entry in entries {
        let polygon = RegionPolygon::new(entry.points.clone())?;
        regions.push((entry.name.clone(), polygon));
    }
    RegionLayout::new(regions)
}

/// Visitation schedule from the configured regions, in file order
pub fn build_schedule(
    entries: &[RegionEntry],
) -> Result<RegionSchedule, intersection_control::ConfigError> {
    RegionSchedule::new(
        entries
            .iter()
            .map(|entry| Region {
                name: entry.name.clone(),
                signals: entry.signals,
            })
            .collect(),
    )
}

/// Initialize logging
pub fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

/// Load, validate, wire, and run until ctrl-c.
pub async fn run(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let app = load_config(config_path)?;

    let layout = build_layout(&app.regions)?;
    let schedule = build_schedule(&app.regions)?;
    schedule.validate_against(&layout)?;
    info!(
        regions = schedule.len(),
        relay = %app.relay.base_url,
        detector = %app.detector.base_url,
        "configuration validated"
    );

    let relay = RelayClient::new(app.relay.clone());
    let mut source = HttpCountSource::new(app.detector.base_url.clone());
    source.set_timeout(Duration::from_millis(app.detector.timeout_ms));

    let mut controller = Controller::new(schedule, app.timing.clone(), relay, source)?;

    let stop = controller.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received, stopping at the next safe boundary");
            stop.store(true, Ordering::Relaxed);
        }
    });

    controller.run().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    const SAMPLE: &str = r#"
        [detector]
        base_url = "http://10.206.110.252:5000"

        [relay]
        base_url = "http://10.206.110.252:5000"
        max_retries = 1

        [timing]
        per_vehicle_secs = 2.0
        max_green_secs = 4.0

        [[regions]]
        name = "Region-1"
        signals = { red = 24, yellow = 23, green = 18 }
        points = [[215, 372], [327, 372], [327, 478], [212, 479]]

        [[regions]]
        name = "Region-2"
        signals = { red = 21, yellow = 20, green = 16 }
        points = [[459, 260], [639, 255], [638, 371], [458, 369]]
    "#;

    fn parse(toml: &str) -> AppConfig {
        config::Config::builder()
            .add_source(config::File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_parse_sample_config() {
        let app = parse(SAMPLE);

        assert_eq!(app.regions.len(), 2);
        assert_eq!(app.regions[0].signals.red, 24);
        assert_eq!(app.relay.max_retries, 1);
        // Untouched sections fall back to defaults
        assert_eq!(app.relay.timeout_ms, 2000);
        assert_eq!(app.timing.max_probes, 5);
        assert_eq!(app.detector.timeout_ms, 2000);
    }

    #[test]
    fn test_schedule_and_layout_from_config() {
        let app = parse(SAMPLE);

        let layout = build_layout(&app.regions).unwrap();
        let schedule = build_schedule(&app.regions).unwrap();
        assert!(schedule.validate_against(&layout).is_ok());
        assert_eq!(
            schedule.regions().iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
            vec!["Region-1", "Region-2"]
        );
    }

    #[test]
    fn test_duplicate_pin_across_regions_fails_fast() {
        let toml = r#"
            [detector]
            base_url = "http://localhost:5000"

            [[regions]]
            name = "Region-1"
            signals = { red = 24, yellow = 23, green = 18 }
            points = [[0, 0], [10, 0], [10, 10]]

            [[regions]]
            name = "Region-2"
            signals = { red = 18, yellow = 20, green = 16 }
            points = [[20, 0], [30, 0], [30, 10]]
        "#;
        let app = parse(toml);
        assert!(build_schedule(&app.regions).is_err());
    }

    #[test]
    fn test_degenerate_polygon_fails_fast() {
        let toml = r#"
            [detector]
            base_url = "http://localhost:5000"

            [[regions]]
            name = "Region-1"
            signals = { red = 24, yellow = 23, green = 18 }
            points = [[0, 0], [10, 0]]
        "#;
        let app = parse(toml);
        assert!(build_layout(&app.regions).is_err());
    }
}
