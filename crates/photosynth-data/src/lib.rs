//! Configuration and scenario loading for the photosynthesis simulator.
//!
//! Data files may be written in RON, TOML or JSON; the format is chosen by
//! file extension. Raw [`schema`] structs are deserialized first and then
//! resolved into the validated [`config::SimulatorConfig`].

pub mod config;
pub mod loader;
pub mod schema;

pub use config::{Scenario, SimulatorConfig};
pub use loader::{DataLoadError, Format, load_config, load_config_from_dir};
