//! Layered configuration (component C9): built-in defaults, optionally
//! overridden by a TOML file, optionally overridden further by environment
//! variables bound through clap's `env` feature on the CLI args (see
//! `Cli`'s global args in `main.rs`). Calendar constants, the solver's time
//! cap, and the two break thresholds all flow through here rather than
//! living as literals inside C1/C4/C7.

use anyhow::Context;
use rso_core::CalendarConfig;
use rso_reschedule::RescheduleConfig;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub scale_factor: i64,
    pub work_hours_per_day: i64,
    pub horizon_days: i64,
    pub work_start_hour: u32,
    pub work_end_hour: u32,
    pub solver_timeout_secs: u64,
    pub short_break_threshold_minutes: i64,
    pub cumulative_break_threshold_minutes: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scale_factor: 100,
            work_hours_per_day: 8,
            horizon_days: 60,
            work_start_hour: 9,
            work_end_hour: 17,
            solver_timeout_secs: 30,
            short_break_threshold_minutes: 30,
            cumulative_break_threshold_minutes: 30,
        }
    }
}

/// Mirror of `EngineConfig` with every field optional, for partial TOML
/// overrides: a file only needs to name the fields it wants to change.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
struct PartialEngineConfig {
    scale_factor: Option<i64>,
    work_hours_per_day: Option<i64>,
    horizon_days: Option<i64>,
    work_start_hour: Option<u32>,
    work_end_hour: Option<u32>,
    solver_timeout_secs: Option<u64>,
    short_break_threshold_minutes: Option<i64>,
    cumulative_break_threshold_minutes: Option<i64>,
}

impl EngineConfig {
    /// Defaults, patched by `path`'s TOML contents if given. Env-variable
    /// overrides are applied separately by the caller, once CLI args have
    /// been parsed (clap already resolved `env = "..."` for each field).
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = Self::default();
        let Some(path) = path else {
            return Ok(config);
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        let partial: PartialEngineConfig = toml::from_str(&text)
            .with_context(|| format!("failed to parse config file '{}'", path.display()))?;
        config.apply(partial);
        Ok(config)
    }

    fn apply(&mut self, partial: PartialEngineConfig) {
        if let Some(v) = partial.scale_factor {
            self.scale_factor = v;
        }
        if let Some(v) = partial.work_hours_per_day {
            self.work_hours_per_day = v;
        }
        if let Some(v) = partial.horizon_days {
            self.horizon_days = v;
        }
        if let Some(v) = partial.work_start_hour {
            self.work_start_hour = v;
        }
        if let Some(v) = partial.work_end_hour {
            self.work_end_hour = v;
        }
        if let Some(v) = partial.solver_timeout_secs {
            self.solver_timeout_secs = v;
        }
        if let Some(v) = partial.short_break_threshold_minutes {
            self.short_break_threshold_minutes = v;
        }
        if let Some(v) = partial.cumulative_break_threshold_minutes {
            self.cumulative_break_threshold_minutes = v;
        }
    }

    pub fn calendar(&self, project_start: chrono::NaiveDate) -> CalendarConfig {
        CalendarConfig {
            project_start,
            scale_factor: self.scale_factor,
            work_hours_per_day: self.work_hours_per_day,
            horizon_days: self.horizon_days,
            work_start_hour: self.work_start_hour,
            work_end_hour: self.work_end_hour,
        }
    }

    pub fn reschedule(&self) -> RescheduleConfig {
        RescheduleConfig {
            short_break_threshold_minutes: self.short_break_threshold_minutes,
            cumulative_break_threshold_minutes: self.cumulative_break_threshold_minutes,
        }
    }

    pub fn solver_timeout(&self) -> Duration {
        Duration::from_secs(self.solver_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_without_a_file() {
        let config = EngineConfig::load(None).unwrap();
        assert_eq!(config.horizon_days, 60);
        assert_eq!(config.scale_factor, 100);
    }

    #[test]
    fn file_overrides_only_named_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "horizon_days = 120\nsolver_timeout_secs = 5").unwrap();
        let config = EngineConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.horizon_days, 120);
        assert_eq!(config.solver_timeout_secs, 5);
        assert_eq!(config.scale_factor, 100, "untouched field keeps its default");
    }

    #[test]
    fn missing_file_is_an_error() {
        let missing = Path::new("/nonexistent/rso-config-does-not-exist.toml");
        assert!(EngineConfig::load(Some(missing)).is_err());
    }
}
