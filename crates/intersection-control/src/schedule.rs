//! Region schedule and signal head wiring

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use region_detect::RegionLayout;
use signal_relay::{DesiredState, SignalId};

use crate::ConfigError;

/// Logical signal color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalColor {
    Red,
    Yellow,
    Green,
}

/// The three signal heads of one approach: one relay line per color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalHeads {
    pub red: SignalId,
    pub yellow: SignalId,
    pub green: SignalId,
}

impl SignalHeads {
    pub fn id_for(&self, color: SignalColor) -> SignalId {
        match color {
            SignalColor::Red => self.red,
            SignalColor::Yellow => self.yellow,
            SignalColor::Green => self.green,
        }
    }

    pub fn ids(&self) -> [SignalId; 3] {
        [self.red, self.yellow, self.green]
    }
}

/// One controlled approach to the intersection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub name: String,
    pub signals: SignalHeads,
}

/// Ordered visitation schedule, fixed for the process lifetime.
///
/// Every region is visited exactly once per cycle; a skipped region still
/// counts as visited.
#[derive(Debug, Clone)]
pub struct RegionSchedule {
    regions: Vec<Region>,
}

impl RegionSchedule {
    /// Build a schedule, enforcing global signal-id uniqueness and unique
    /// region names.
    pub fn new(regions: Vec<Region>) -> Result<Self, ConfigError> {
        if regions.is_empty() {
            return Err(ConfigError::EmptySchedule);
        }

        let mut names = HashSet::new();
        let mut ids = HashSet::new();
        for region in &regions {
            if !names.insert(region.name.as_str()) {
                return Err(ConfigError::DuplicateRegion {
                    name: region.name.clone(),
                });
            }
            for id in region.signals.ids() {
                if !ids.insert(id) {
                    return Err(ConfigError::DuplicateSignalId { id });
                }
            }
        }

        Ok(Self { regions })
    }

    /// Check every scheduled region against the detector's declared set
    pub fn validate_against(&self, layout: &RegionLayout) -> Result<(), ConfigError> {
        let declared: HashSet<&str> = layout.names().collect();
        for region in &self.regions {
            if !declared.contains(region.name.as_str()) {
                return Err(ConfigError::UnknownRegion {
                    name: region.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Regions in visitation order
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn signal_id(&self, region: &str, color: SignalColor) -> Option<SignalId> {
        self.regions
            .iter()
            .find(|r| r.name == region)
            .map(|r| r.signals.id_for(color))
    }

    /// The all-RED baseline: every region's RED on, everything else off.
    ///
    /// Asserted before any GREEN activation and as the resting state.
    pub fn all_red(&self) -> DesiredState {
        let mut state = DesiredState::new();
        for region in &self.regions {
            state.set(region.signals.red, true);
            state.set(region.signals.yellow, false);
            state.set(region.signals.green, false);
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use region_detect::{Point, RegionPolygon};

    fn region(name: &str, red: SignalId, yellow: SignalId, green: SignalId) -> Region {
        Region {
            name: name.to_string(),
            signals: SignalHeads { red, yellow, green },
        }
    }

    fn four_region_schedule() -> RegionSchedule {
        RegionSchedule::new(vec![
            region("Region-1", 24, 23, 18),
            region("Region-2", 21, 20, 16),
            region("Region-3", 17, 27, 22),
            region("Region-4", 5, 6, 13),
        ])
        .unwrap()
    }

    #[test]
    fn test_duplicate_id_across_regions_rejected() {
        let result = RegionSchedule::new(vec![
            region("Region-1", 24, 23, 18),
            region("Region-2", 21, 20, 24),
        ]);
        assert!(matches!(
            result,
            Err(ConfigError::DuplicateSignalId { id: 24 })
        ));
    }

    #[test]
    fn test_duplicate_id_within_region_rejected() {
        let result = RegionSchedule::new(vec![region("Region-1", 24, 24, 18)]);
        assert!(matches!(
            result,
            Err(ConfigError::DuplicateSignalId { id: 24 })
        ));
    }

    #[test]
    fn test_duplicate_region_name_rejected() {
        let result = RegionSchedule::new(vec![
            region("Region-1", 24, 23, 18),
            region("Region-1", 21, 20, 16),
        ]);
        assert!(matches!(result, Err(ConfigError::DuplicateRegion { .. })));
    }

    #[test]
    fn test_empty_schedule_rejected() {
        assert!(matches!(
            RegionSchedule::new(vec![]),
            Err(ConfigError::EmptySchedule)
        ));
    }

    #[test]
    fn test_all_red_baseline() {
        let schedule = four_region_schedule();
        let state = schedule.all_red();

        assert_eq!(state.len(), 12);
        let reds: Vec<SignalId> = state.active().collect();
        assert_eq!(reds, vec![5, 17, 21, 24]);
    }

    #[test]
    fn test_signal_id_lookup() {
        let schedule = four_region_schedule();
        assert_eq!(schedule.signal_id("Region-3", SignalColor::Yellow), Some(27));
        assert_eq!(schedule.signal_id("Region-9", SignalColor::Red), None);
    }

    #[test]
    fn test_validate_against_layout() {
        let schedule = RegionSchedule::new(vec![region("Region-1", 24, 23, 18)]).unwrap();

        let square = RegionPolygon::new(vec![
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(10, 10),
        ])
        .unwrap();

        let matching = RegionLayout::new(vec![("Region-1".into(), square.clone())]).unwrap();
        assert!(schedule.validate_against(&matching).is_ok());

        let mismatched = RegionLayout::new(vec![("Region-7".into(), square)]).unwrap();
        assert!(matches!(
            schedule.validate_against(&mismatched),
            Err(ConfigError::UnknownRegion { .. })
        ));
    }
}
