//! Run and logging configuration shared by scenarios and the CLI.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::observation::DEFAULT_OBSERVATION_RADIUS;

fn default_steps() -> u64 {
    1_000_000
}

fn default_time_limit_secs() -> f64 {
    15.0
}

fn default_observation_radius() -> usize {
    DEFAULT_OBSERVATION_RADIUS
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_steps")]
    pub steps: u64,
    /// Wall-clock budget; `0` disables it.
    #[serde(default = "default_time_limit_secs")]
    pub time_limit_secs: f64,
    #[serde(default = "default_observation_radius")]
    pub observation_radius: usize,
}

impl RunConfig {
    pub fn time_limit(&self) -> Option<Duration> {
        if self.time_limit_secs > 0.0 {
            Duration::try_from_secs_f64(self.time_limit_secs).ok()
        } else {
            None
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            steps: default_steps(),
            time_limit_secs: default_time_limit_secs(),
            observation_radius: default_observation_radius(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_bench_budget() {
        let run = RunConfig::default();
        assert_eq!(run.steps, 1_000_000);
        assert_eq!(run.time_limit(), Some(Duration::from_secs(15)));
        assert_eq!(run.observation_radius, 1);
        assert_eq!(LoggingConfig::default().level, "info");
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let run: RunConfig = serde_yaml::from_str("steps: 50").unwrap();
        assert_eq!(run.steps, 50);
        assert_eq!(run.observation_radius, 1);

        let unlimited: RunConfig = serde_yaml::from_str("time_limit_secs: 0").unwrap();
        assert_eq!(unlimited.time_limit(), None);
    }

    #[test]
    fn unrepresentable_time_limits_disable_the_budget() {
        for secs in [1e20, f64::INFINITY, f64::NAN] {
            let run = RunConfig {
                time_limit_secs: secs,
                ..RunConfig::default()
            };
            assert_eq!(run.time_limit(), None);
        }
    }
}
