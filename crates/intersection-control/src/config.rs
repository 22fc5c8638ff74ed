//! Signal timing configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Timing knobs for one intersection.
///
/// Defaults mirror the reference deployment; every value is retunable per
/// intersection without code changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// GREEN seconds granted per observed vehicle
    pub per_vehicle_secs: f64,
    /// Ceiling on computed GREEN duration (seconds)
    pub max_green_secs: f64,
    /// YELLOW hold (seconds)
    pub yellow_secs: f64,
    /// RED hold after YELLOW, before the intersection is considered clear
    pub clearance_secs: f64,
    /// Pause after asserting all-RED, before activating a region
    pub all_red_settle_secs: f64,
    /// Extra hold after a turn so cleared vehicles leave the frame
    pub post_clear_secs: f64,
    /// Wait between extension probes (seconds)
    pub probe_interval_secs: f64,
    /// Extension probe rounds after GREEN saturates at the cap
    pub max_probes: u32,
    /// Pause between cycles when no region needed service
    pub idle_poll_secs: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            per_vehicle_secs: 2.0,
            max_green_secs: 4.0,
            yellow_secs: 2.0,
            clearance_secs: 1.0,
            all_red_settle_secs: 1.0,
            post_clear_secs: 2.0,
            probe_interval_secs: 2.0,
            max_probes: 5,
            idle_poll_secs: 0.5,
        }
    }
}

impl TimingConfig {
    /// Validate all knobs: intervals strictly positive and finite, cap
    /// non-negative.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("per_vehicle_secs", self.per_vehicle_secs),
            ("yellow_secs", self.yellow_secs),
            ("clearance_secs", self.clearance_secs),
            ("all_red_settle_secs", self.all_red_settle_secs),
            ("post_clear_secs", self.post_clear_secs),
            ("probe_interval_secs", self.probe_interval_secs),
            ("idle_poll_secs", self.idle_poll_secs),
        ];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidTiming { field, value });
            }
        }
        if !self.max_green_secs.is_finite() || self.max_green_secs < 0.0 {
            return Err(ConfigError::InvalidTiming {
                field: "max_green_secs",
                value: self.max_green_secs,
            });
        }
        Ok(())
    }

    /// GREEN duration for a vehicle count: linear scaling, capped.
    pub fn green_duration(&self, count: u32) -> Duration {
        let raw = count as f64 * self.per_vehicle_secs;
        Duration::from_secs_f64(raw.min(self.max_green_secs))
    }

    /// The configured GREEN ceiling as a duration
    pub fn max_green(&self) -> Duration {
        Duration::from_secs_f64(self.max_green_secs)
    }

    pub fn yellow(&self) -> Duration {
        Duration::from_secs_f64(self.yellow_secs)
    }

    pub fn clearance(&self) -> Duration {
        Duration::from_secs_f64(self.clearance_secs)
    }

    pub fn all_red_settle(&self) -> Duration {
        Duration::from_secs_f64(self.all_red_settle_secs)
    }

    pub fn post_clear(&self) -> Duration {
        Duration::from_secs_f64(self.post_clear_secs)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs_f64(self.probe_interval_secs)
    }

    pub fn idle_poll(&self) -> Duration {
        Duration::from_secs_f64(self.idle_poll_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_defaults_validate() {
        assert!(TimingConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_non_positive_intervals() {
        let mut timing = TimingConfig::default();
        timing.yellow_secs = 0.0;
        assert!(timing.validate().is_err());

        let mut timing = TimingConfig::default();
        timing.probe_interval_secs = -1.0;
        assert!(timing.validate().is_err());

        let mut timing = TimingConfig::default();
        timing.per_vehicle_secs = f64::NAN;
        assert!(timing.validate().is_err());
    }

    #[test]
    fn test_zero_cap_allowed() {
        let mut timing = TimingConfig::default();
        timing.max_green_secs = 0.0;
        assert!(timing.validate().is_ok());
        assert_eq!(timing.green_duration(5), Duration::ZERO);
    }

    #[test]
    fn test_green_duration_scales_then_caps() {
        let timing = TimingConfig::default();
        assert_eq!(timing.green_duration(0), Duration::ZERO);
        assert_eq!(timing.green_duration(1), Duration::from_secs(2));
        assert_eq!(timing.green_duration(2), Duration::from_secs(4));
        assert_eq!(timing.green_duration(3), Duration::from_secs(4));
        assert_eq!(timing.green_duration(100), Duration::from_secs(4));
    }

    proptest! {
        #[test]
        fn prop_green_duration_monotone_and_capped(a in 0u32..10_000, b in 0u32..10_000) {
            let timing = TimingConfig::default();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(timing.green_duration(lo) <= timing.green_duration(hi));
            prop_assert!(timing.green_duration(hi) <= timing.max_green());
        }

        #[test]
        fn prop_green_duration_matches_law(count in 0u32..10_000) {
            // duration = min(count * k, cap) with the default k=2, cap=4
            let timing = TimingConfig::default();
            let expected = (count as f64 * 2.0).min(4.0);
            prop_assert_eq!(timing.green_duration(count), Duration::from_secs_f64(expected));
        }
    }
}
