//! Intersection Control Core
//!
//! Drives a multi-approach intersection through repeated cycles:
//! - per-region RED -> GREEN -> YELLOW -> RED sequencing
//! - GREEN duration scaled by observed vehicle count, capped
//! - bounded extension probing when GREEN saturates at the cap
//!
//! One cooperative control task; collaborators (count source, signal relay)
//! are synchronous request/response boundaries.

pub mod config;
pub mod controller;
pub mod schedule;

pub use config::TimingConfig;
pub use controller::Controller;
pub use schedule::{Region, RegionSchedule, SignalColor, SignalHeads};

use thiserror::Error;

/// Configuration errors; all fatal at startup, before the loop runs
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Signal id wired to more than one color or region
    #[error("Signal id {id} assigned more than once")]
    DuplicateSignalId { id: signal_relay::SignalId },

    /// Region scheduled twice
    #[error("Region '{name}' scheduled more than once")]
    DuplicateRegion { name: String },

    /// Region not declared by the detector layout
    #[error("Region '{name}' is not in the detector's region set")]
    UnknownRegion { name: String },

    /// Schedule with no regions
    #[error("Region schedule is empty")]
    EmptySchedule,

    /// Timing value out of range
    #[error("Invalid timing: {field} = {value}")]
    InvalidTiming { field: &'static str, value: f64 },
}
