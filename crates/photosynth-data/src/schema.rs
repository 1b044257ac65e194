//! Serde data file structs for simulator configuration.
//!
//! These structs define the on-disk format. They carry raw, unvalidated
//! values and are resolved into [`crate::config::SimulatorConfig`] by the
//! loader.

use serde::Deserialize;

/// Top-level configuration file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigData {
    /// Wall-clock period of one tick, in milliseconds.
    #[serde(default = "default_tick_period_ms")]
    pub tick_period_ms: u64,
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    #[serde(default)]
    pub log_filter: Option<String>,
    /// Upper bound on a single narration request, in milliseconds.
    #[serde(default = "default_narration_timeout_ms")]
    pub narration_timeout_ms: u64,
    #[serde(default)]
    pub scenarios: Vec<ScenarioData>,
}

/// A named environment preset. Omitted fields keep their default value.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioData {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub light: Option<f64>,
    #[serde(default)]
    pub co2: Option<f64>,
    #[serde(default)]
    pub water: Option<f64>,
    #[serde(default)]
    pub temperature: Option<f64>,
}

pub fn default_tick_period_ms() -> u64 {
    1000
}

pub fn default_narration_timeout_ms() -> u64 {
    10_000
}
