//! Sweeper configuration.

use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Seconds between two sweeps.
    pub interval_secs: u64,

    /// Also re-drive tasks sitting in `stopping` so they reach `stopped` once
    /// their nodes let go.
    pub drive_stopping: bool,
}

impl SweepConfig {
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval_secs: 30,
            drive_stopping: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config = SweepConfig::from_json(r#"{ "interval_secs": 5 }"#).unwrap();
        assert_eq!(config.interval_secs, 5);
        assert!(config.drive_stopping);
    }

    #[test]
    fn zero_interval_is_clamped() {
        let config = SweepConfig {
            interval_secs: 0,
            ..SweepConfig::default()
        };
        assert_eq!(config.interval(), Duration::from_secs(1));
    }
}
