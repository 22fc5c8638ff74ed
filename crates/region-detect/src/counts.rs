//! Per-query vehicle count snapshots

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Vehicle counts for one frame: region name -> vehicles seen.
///
/// Valid only for the query that produced it. Sources hand out a fresh value
/// every poll; nothing is carried over between calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionCounts {
    counts: HashMap<String, u32>,
}

impl RegionCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count for a region; unknown names read as zero, matching a detector
    /// that reports nothing for an empty lane.
    pub fn get(&self, region: &str) -> u32 {
        self.counts.get(region).copied().unwrap_or(0)
    }

    pub fn set(&mut self, region: impl Into<String>, count: u32) {
        self.counts.insert(region.into(), count);
    }

    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.values().all(|&c| c == 0)
    }
}

impl FromIterator<(String, u32)> for RegionCounts {
    fn from_iter<I: IntoIterator<Item = (String, u32)>>(iter: I) -> Self {
        Self {
            counts: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_region_reads_zero() {
        let counts = RegionCounts::new();
        assert_eq!(counts.get("Region-1"), 0);
    }

    #[test]
    fn test_set_and_total() {
        let mut counts = RegionCounts::new();
        counts.set("Region-1", 3);
        counts.set("Region-2", 1);
        assert_eq!(counts.get("Region-1"), 3);
        assert_eq!(counts.total(), 4);
        assert!(!counts.is_empty());
    }

    #[test]
    fn test_decode_daemon_shape() {
        let json = r#"{"Region-1": 2, "Region-2": 0}"#;
        let counts: RegionCounts = serde_json::from_str(json).unwrap();
        assert_eq!(counts.get("Region-1"), 2);
        assert_eq!(counts.get("Region-2"), 0);
    }
}
