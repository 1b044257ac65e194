//! Configuration loading: format detection, file discovery, deserialization
//! and validation into a [`SimulatorConfig`].

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use photosynth_core::environment::{EnvironmentError, EnvironmentField, EnvironmentState};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::{Scenario, SimulatorConfig};
use crate::schema::{ConfigData, ScenarioData};

/// Base name of the configuration file looked up by [`load_config_from_dir`].
pub const CONFIG_BASE_NAME: &str = "photosynth";

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// No configuration file was found in the given directory.
    #[error("no {base_name}.ron, {base_name}.toml or {base_name}.json in {dir}")]
    Missing { base_name: String, dir: PathBuf },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A setting parsed but is out of its allowed domain.
    #[error("invalid value for '{key}' in {file}: {detail}")]
    InvalidValue {
        file: PathBuf,
        key: &'static str,
        detail: String,
    },

    /// A scenario carries a value the environment rejects.
    #[error("invalid scenario '{scenario}' in {file}: {source}")]
    InvalidEnvironment {
        file: PathBuf,
        scenario: String,
        #[source]
        source: EnvironmentError,
    },

    /// Two scenarios share a name.
    #[error("duplicate scenario name '{name}' in {file}")]
    DuplicateName { file: PathBuf, name: String },

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

impl Format {
    pub const ALL: [Format; 3] = [Format::Ron, Format::Toml, Format::Json];

    pub fn extension(self) -> &'static str {
        match self {
            Format::Ron => "ron",
            Format::Toml => "toml",
            Format::Json => "json",
        }
    }
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Scan a directory for `{base_name}.ron`, `.toml` or `.json`.
///
/// Returns `Ok(None)` if no file is found, or `Err(ConflictingFormats)` if
/// more than one format exists for the same base name.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;

    for format in Format::ALL {
        let candidate = dir.join(format!("{base_name}.{}", format.extension()));
        if candidate.exists() {
            if let Some(ref existing) = found {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing.clone(),
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }

    Ok(found)
}

// ===========================================================================
// Deserialization
// ===========================================================================

fn deserialize_str<T: DeserializeOwned>(
    content: &str,
    format: Format,
    origin: &Path,
) -> Result<T, DataLoadError> {
    let parse_err = |detail: String| DataLoadError::Parse {
        file: origin.to_path_buf(),
        detail,
    };
    match format {
        Format::Ron => ron::from_str(content).map_err(|e| parse_err(e.to_string())),
        Format::Json => serde_json::from_str(content).map_err(|e| parse_err(e.to_string())),
        Format::Toml => toml::from_str(content).map_err(|e| parse_err(e.to_string())),
    }
}

/// Parse and validate configuration text. `origin` is only used in errors.
pub fn parse_config(
    content: &str,
    format: Format,
    origin: &Path,
) -> Result<SimulatorConfig, DataLoadError> {
    let data: ConfigData = deserialize_str(content, format, origin)?;
    resolve(data, origin)
}

/// Read a configuration file, detecting its format from the extension.
pub fn load_config(path: &Path) -> Result<SimulatorConfig, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    let config = parse_config(&content, format, path)?;
    debug!(
        file = %path.display(),
        scenarios = config.scenarios.len(),
        "loaded configuration"
    );
    Ok(config)
}

/// Load `photosynth.{ron,toml,json}` from `dir`.
pub fn load_config_from_dir(dir: &Path) -> Result<SimulatorConfig, DataLoadError> {
    let path = find_data_file(dir, CONFIG_BASE_NAME)?.ok_or_else(|| DataLoadError::Missing {
        base_name: CONFIG_BASE_NAME.to_string(),
        dir: dir.to_path_buf(),
    })?;
    load_config(&path)
}

// ===========================================================================
// Validation
// ===========================================================================

fn positive_millis(ms: u64, key: &'static str, file: &Path) -> Result<Duration, DataLoadError> {
    if ms == 0 {
        return Err(DataLoadError::InvalidValue {
            file: file.to_path_buf(),
            key,
            detail: "must be greater than zero".to_string(),
        });
    }
    Ok(Duration::from_millis(ms))
}

fn resolve_scenario(data: ScenarioData, file: &Path) -> Result<Scenario, DataLoadError> {
    let overrides = [
        (EnvironmentField::Light, data.light),
        (EnvironmentField::Co2, data.co2),
        (EnvironmentField::Water, data.water),
        (EnvironmentField::Temperature, data.temperature),
    ];

    let mut environment = EnvironmentState::DEFAULT;
    for (field, value) in overrides {
        if let Some(value) = value {
            environment = environment.with(field, value).map_err(|source| {
                DataLoadError::InvalidEnvironment {
                    file: file.to_path_buf(),
                    scenario: data.name.clone(),
                    source,
                }
            })?;
        }
    }

    Ok(Scenario {
        name: data.name,
        description: data.description,
        environment,
    })
}

/// Validate raw file data into a [`SimulatorConfig`].
pub fn resolve(data: ConfigData, file: &Path) -> Result<SimulatorConfig, DataLoadError> {
    let tick_period = positive_millis(data.tick_period_ms, "tick_period_ms", file)?;
    let narration_timeout =
        positive_millis(data.narration_timeout_ms, "narration_timeout_ms", file)?;

    let mut seen = HashSet::new();
    let mut scenarios = Vec::with_capacity(data.scenarios.len());
    for scenario in data.scenarios {
        if !seen.insert(scenario.name.to_ascii_lowercase()) {
            return Err(DataLoadError::DuplicateName {
                file: file.to_path_buf(),
                name: scenario.name,
            });
        }
        scenarios.push(resolve_scenario(scenario, file)?);
    }

    let log_filter = data.log_filter.filter(|f| !f.trim().is_empty());

    Ok(SimulatorConfig {
        tick_period,
        log_filter,
        narration_timeout,
        scenarios,
    })
}

// ===========================================================================
// Tests
// ===========================================================================
