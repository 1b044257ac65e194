//! Environmental inputs to the rate model.
//!
//! [`EnvironmentState`] is a small `Copy` value. Writes never mutate a field
//! in place from the caller's point of view: [`EnvironmentState::with`] builds
//! a complete new snapshot and [`EnvironmentState::set`] swaps it in whole, so
//! a reader always observes either the old or the new vector.
//!
//! Out-of-range finite values are clamped into the field's domain. Non-finite
//! values are rejected and leave the state untouched.

use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised at the environment write boundary.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EnvironmentError {
    #[error("unknown environment field '{0}' (expected light, co2, water or temperature)")]
    UnknownField(String),
    #[error("non-finite value {value} for {field}")]
    NonFinite { field: EnvironmentField, value: f64 },
}

// ---------------------------------------------------------------------------
// Fields
// ---------------------------------------------------------------------------

/// One of the four environmental inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentField {
    Light,
    Co2,
    Water,
    Temperature,
}

impl EnvironmentField {
    /// All fields in display order.
    pub const ALL: [EnvironmentField; 4] = [
        EnvironmentField::Light,
        EnvironmentField::Co2,
        EnvironmentField::Water,
        EnvironmentField::Temperature,
    ];

    /// Inclusive `(min, max)` domain of the field.
    pub fn range(self) -> (f64, f64) {
        match self {
            EnvironmentField::Light | EnvironmentField::Co2 | EnvironmentField::Water => {
                (0.0, 100.0)
            }
            EnvironmentField::Temperature => (0.0, 50.0),
        }
    }

    /// Short lowercase name, as accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            EnvironmentField::Light => "light",
            EnvironmentField::Co2 => "co2",
            EnvironmentField::Water => "water",
            EnvironmentField::Temperature => "temperature",
        }
    }

    /// Display unit for readouts.
    pub fn unit(self) -> &'static str {
        match self {
            EnvironmentField::Temperature => "°C",
            _ => "%",
        }
    }

    /// Clamp a finite value into this field's domain.
    pub fn clamp(self, value: f64) -> Result<f64, EnvironmentError> {
        if !value.is_finite() {
            return Err(EnvironmentError::NonFinite { field: self, value });
        }
        let (min, max) = self.range();
        Ok(value.clamp(min, max))
    }
}

impl fmt::Display for EnvironmentField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EnvironmentField {
    type Err = EnvironmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" | "light_intensity" | "lightintensity" => Ok(EnvironmentField::Light),
            "co2" | "co2_level" | "co2level" => Ok(EnvironmentField::Co2),
            "water" | "water_level" | "waterlevel" => Ok(EnvironmentField::Water),
            "temperature" | "temp" => Ok(EnvironmentField::Temperature),
            _ => Err(EnvironmentError::UnknownField(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// EnvironmentState
// ---------------------------------------------------------------------------

/// The four environmental inputs, each within its declared range.
///
/// Light, CO2 and water are percentages in `[0, 100]`; temperature is in
/// degrees Celsius within `[0, 50]`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct EnvironmentState {
    light_intensity: f64,
    co2_level: f64,
    water_level: f64,
    temperature: f64,
}

impl EnvironmentState {
    /// Start-up and post-reset environment.
    pub const DEFAULT: EnvironmentState = EnvironmentState {
        light_intensity: 50.0,
        co2_level: 50.0,
        water_level: 50.0,
        temperature: 25.0,
    };

    /// Build a state from raw values, clamping each into range.
    pub fn clamped(
        light_intensity: f64,
        co2_level: f64,
        water_level: f64,
        temperature: f64,
    ) -> Result<Self, EnvironmentError> {
        Ok(Self {
            light_intensity: EnvironmentField::Light.clamp(light_intensity)?,
            co2_level: EnvironmentField::Co2.clamp(co2_level)?,
            water_level: EnvironmentField::Water.clamp(water_level)?,
            temperature: EnvironmentField::Temperature.clamp(temperature)?,
        })
    }

    pub fn light_intensity(&self) -> f64 {
        self.light_intensity
    }

    pub fn co2_level(&self) -> f64 {
        self.co2_level
    }

    pub fn water_level(&self) -> f64 {
        self.water_level
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Read a field by name.
    pub fn get(&self, field: EnvironmentField) -> f64 {
        match field {
            EnvironmentField::Light => self.light_intensity,
            EnvironmentField::Co2 => self.co2_level,
            EnvironmentField::Water => self.water_level,
            EnvironmentField::Temperature => self.temperature,
        }
    }

    /// Return a new snapshot with `field` replaced by the clamped `value`.
    pub fn with(self, field: EnvironmentField, value: f64) -> Result<Self, EnvironmentError> {
        let value = field.clamp(value)?;
        let mut next = self;
        match field {
            EnvironmentField::Light => next.light_intensity = value,
            EnvironmentField::Co2 => next.co2_level = value,
            EnvironmentField::Water => next.water_level = value,
            EnvironmentField::Temperature => next.temperature = value,
        }
        Ok(next)
    }

    /// Replace this state with a copy whose `field` holds the clamped `value`.
    ///
    /// Returns the value actually stored. On error the state is unchanged.
    pub fn set(&mut self, field: EnvironmentField, value: f64) -> Result<f64, EnvironmentError> {
        *self = self.with(field, value)?;
        Ok(self.get(field))
    }

    /// Immutable copy of the current values.
    pub fn snapshot(&self) -> EnvironmentState {
        *self
    }
}

impl Default for EnvironmentState {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for EnvironmentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "light {}%, CO2 {}%, water {}%, {}°C",
            self.light_intensity, self.co2_level, self.water_level, self.temperature
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_startup_values() {
        let env = EnvironmentState::default();
        assert_eq!(env.light_intensity(), 50.0);
        assert_eq!(env.co2_level(), 50.0);
        assert_eq!(env.water_level(), 50.0);
        assert_eq!(env.temperature(), 25.0);
    }

    #[test]
    fn set_clamps_into_range() {
        let mut env = EnvironmentState::default();
        assert_eq!(env.set(EnvironmentField::Light, 140.0), Ok(100.0));
        assert_eq!(env.set(EnvironmentField::Water, -3.0), Ok(0.0));
        assert_eq!(env.set(EnvironmentField::Temperature, 75.0), Ok(50.0));
        assert_eq!(env.light_intensity(), 100.0);
        assert_eq!(env.water_level(), 0.0);
        assert_eq!(env.temperature(), 50.0);
    }

    #[test]
    fn set_leaves_other_fields_alone() {
        let mut env = EnvironmentState::default();
        env.set(EnvironmentField::Co2, 12.5).unwrap();
        assert_eq!(env.co2_level(), 12.5);
        assert_eq!(env.light_intensity(), 50.0);
        assert_eq!(env.water_level(), 50.0);
        assert_eq!(env.temperature(), 25.0);
    }

    #[test]
    fn non_finite_rejected_without_mutation() {
        let mut env = EnvironmentState::default();
        let err = env.set(EnvironmentField::Light, f64::NAN).unwrap_err();
        assert!(matches!(
            err,
            EnvironmentError::NonFinite {
                field: EnvironmentField::Light,
                ..
            }
        ));
        assert!(env.set(EnvironmentField::Water, f64::INFINITY).is_err());
        assert_eq!(env, EnvironmentState::DEFAULT);
    }

    #[test]
    fn with_returns_new_snapshot() {
        let env = EnvironmentState::default();
        let next = env.with(EnvironmentField::Temperature, 40.0).unwrap();
        assert_eq!(env.temperature(), 25.0);
        assert_eq!(next.temperature(), 40.0);
    }

    #[test]
    fn clamped_constructor() {
        let env = EnvironmentState::clamped(120.0, 50.0, -1.0, 60.0).unwrap();
        assert_eq!(env.light_intensity(), 100.0);
        assert_eq!(env.water_level(), 0.0);
        assert_eq!(env.temperature(), 50.0);
        assert!(EnvironmentState::clamped(1.0, f64::NAN, 1.0, 1.0).is_err());
    }

    #[test]
    fn field_names_parse() {
        assert_eq!("light".parse::<EnvironmentField>(), Ok(EnvironmentField::Light));
        assert_eq!("CO2".parse::<EnvironmentField>(), Ok(EnvironmentField::Co2));
        assert_eq!("water_level".parse::<EnvironmentField>(), Ok(EnvironmentField::Water));
        assert_eq!("temp".parse::<EnvironmentField>(), Ok(EnvironmentField::Temperature));
        assert_eq!(
            "humidity".parse::<EnvironmentField>(),
            Err(EnvironmentError::UnknownField("humidity".to_string()))
        );
    }

    #[test]
    fn field_names_round_trip_through_display() {
        for field in EnvironmentField::ALL {
            assert_eq!(field.to_string().parse::<EnvironmentField>(), Ok(field));
        }
    }
}
