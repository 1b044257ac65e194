//! Validated simulator configuration.

use std::path::Path;
use std::time::Duration;

use photosynth_core::environment::EnvironmentState;

use crate::loader::{DataLoadError, Format, parse_config};
use crate::schema::{default_narration_timeout_ms, default_tick_period_ms};

/// The configuration file shipped with the crate.
pub const BUNDLED_CONFIG: &str = include_str!("../data/photosynth.ron");

/// A resolved environment preset.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub name: String,
    pub description: String,
    pub environment: EnvironmentState,
}

/// Simulator settings after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatorConfig {
    /// Wall-clock period of one tick. Always non-zero.
    pub tick_period: Duration,
    pub log_filter: Option<String>,
    /// Always non-zero.
    pub narration_timeout: Duration,
    /// Presets in file order. Names are unique.
    pub scenarios: Vec<Scenario>,
}

impl SimulatorConfig {
    /// The configuration in [`BUNDLED_CONFIG`].
    pub fn bundled() -> Result<Self, DataLoadError> {
        parse_config(BUNDLED_CONFIG, Format::Ron, Path::new("<bundled>/photosynth.ron"))
    }

    /// Look up a scenario by name (case-insensitive).
    pub fn scenario(&self, name: &str) -> Option<&Scenario> {
        self.scenarios
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }

    pub fn scenario_names(&self) -> impl Iterator<Item = &str> {
        self.scenarios.iter().map(|s| s.name.as_str())
    }
}

impl Default for SimulatorConfig {
    /// One-second ticks, no presets.
    fn default() -> Self {
        Self {
            tick_period: Duration::from_millis(default_tick_period_ms()),
            log_filter: None,
            narration_timeout: Duration::from_millis(default_narration_timeout_ms()),
            scenarios: Vec::new(),
        }
    }
}
