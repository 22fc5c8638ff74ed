//! Vehicle Count Sources
//!
//! Boundary crate for the vehicle detector:
//! - Named polygonal detection regions in frame coordinates
//! - Fresh per-query count snapshots
//! - HTTP count source polling the relay daemon's count endpoint

pub mod counts;
pub mod layout;
pub mod polygon;
pub mod source;

pub use counts::RegionCounts;
pub use layout::RegionLayout;
pub use polygon::{Point, RegionPolygon};
pub use source::{CountSource, HttpCountSource, ScriptedCounts};

use thiserror::Error;

/// Detection error types
#[derive(Error, Debug)]
pub enum DetectionError {
    /// Count query could not be completed (camera, network, detector down)
    #[error("Count source unavailable: {0}")]
    Unavailable(String),

    /// Response arrived but could not be decoded
    #[error("Count response decode failed: {0}")]
    Decode(String),

    /// Invalid region layout
    #[error("Region layout invalid: {0}")]
    Layout(String),
}
