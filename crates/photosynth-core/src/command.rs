//! Control commands submitted by external collaborators.
//!
//! Sliders, buttons, scripts and the CLI all drive the simulation through
//! [`Command`]. Commands take effect immediately when executed: environment
//! writes are visible to the next tick and to any ad-hoc `compute_stats`.

use std::fmt;
use std::str::FromStr;

use crate::environment::{EnvironmentError, EnvironmentField};

// ---------------------------------------------------------------------------
// Command enum
// ---------------------------------------------------------------------------

/// A single control operation on the simulation.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Command {
    /// Clamp `value` into `field`'s range and store it.
    SetEnvironment { field: EnvironmentField, value: f64 },
    /// Halt ticking.
    Pause,
    /// Restart ticking from the current clock.
    Resume,
    /// Flip between running and paused.
    TogglePause,
    /// Restore defaults, clear history, zero clock and total, run.
    Reset,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::SetEnvironment { field, value } => write!(f, "{field}={value}"),
            Command::Pause => f.write_str("pause"),
            Command::Resume => f.write_str("resume"),
            Command::TogglePause => f.write_str("toggle"),
            Command::Reset => f.write_str("reset"),
        }
    }
}

/// Errors from parsing a textual command.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandParseError {
    #[error("unknown command '{0}'")]
    Unknown(String),
    #[error("invalid value '{value}' for {field}")]
    InvalidValue { field: EnvironmentField, value: String },
    #[error(transparent)]
    Environment(#[from] EnvironmentError),
}

impl FromStr for Command {
    type Err = CommandParseError;

    /// Accepts `pause`, `resume`, `toggle`, `reset`, `FIELD=VALUE` and
    /// `set FIELD VALUE`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "pause" => return Ok(Command::Pause),
            "resume" | "run" | "play" => return Ok(Command::Resume),
            "toggle" => return Ok(Command::TogglePause),
            "reset" => return Ok(Command::Reset),
            _ => {}
        }

        let (field, value) = if let Some((field, value)) = s.split_once('=') {
            (field, value)
        } else {
            let mut parts = s.split_whitespace();
            match (parts.next(), parts.next(), parts.next(), parts.next()) {
                (Some(verb), Some(field), Some(value), None) if verb.eq_ignore_ascii_case("set") => {
                    (field, value)
                }
                _ => return Err(CommandParseError::Unknown(s.to_string())),
            }
        };

        let field: EnvironmentField = field.parse()?;
        let value = value
            .trim()
            .parse::<f64>()
            .map_err(|_| CommandParseError::InvalidValue {
                field,
                value: value.trim().to_string(),
            })?;
        Ok(Command::SetEnvironment { field, value })
    }
}
