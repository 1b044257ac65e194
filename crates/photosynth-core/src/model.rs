//! The photosynthesis rate model.
//!
//! A pure function from an [`EnvironmentState`] to [`ProductionStats`]. The
//! rate is set by the scarcest of four normalized factors (Liebig's Law of the
//! Minimum):
//!
//! | Order | Factor      | Value                                        |
//! |-------|-------------|----------------------------------------------|
//! | 1     | Light       | `light / 100`                                |
//! | 2     | CO2         | CO2 after stomatal closure under water stress |
//! | 3     | Temperature | Gaussian around 25 °C, zero outside (0, 45)  |
//! | 4     | Water       | `water / 100`                                |
//!
//! Ties resolve to the earlier factor in this order.

use std::fmt;

use crate::environment::EnvironmentState;

// ---------------------------------------------------------------------------
// Model constants
// ---------------------------------------------------------------------------

/// Temperature of peak enzyme activity, in °C.
pub const OPTIMAL_TEMPERATURE: f64 = 25.0;

/// Standard deviation of the temperature response curve, in °C.
pub const TEMPERATURE_SPREAD: f64 = 15.0;

/// Upper bound (exclusive) of the viable thermal window, in °C.
pub const DENATURATION_TEMPERATURE: f64 = 45.0;

/// Normalized water level at or below which stomata start to close.
pub const STOMATAL_CLOSURE_THRESHOLD: f64 = 0.2;

/// Slope of CO2 uptake below the closure threshold (`1 / threshold`).
pub const STOMATAL_UPTAKE_SLOPE: f64 = 5.0;

/// Multiplier from the limiting factor to output rates.
pub const RATE_SCALE: f64 = 5.0;

// ---------------------------------------------------------------------------
// Limiting factor
// ---------------------------------------------------------------------------

/// The input currently constraining the glucose rate.
///
/// There is no "none" variant: every valid environment has a minimum among
/// the four factors, so the scan always lands on one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum LimitingFactor {
    Light,
    #[serde(rename = "CO2")]
    Co2,
    Temperature,
    Water,
}

impl LimitingFactor {
    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            LimitingFactor::Light => "Light",
            LimitingFactor::Co2 => "CO2",
            LimitingFactor::Temperature => "Temperature",
            LimitingFactor::Water => "Water",
        }
    }
}

impl fmt::Display for LimitingFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Factor breakdown
// ---------------------------------------------------------------------------

/// Normalized factor values feeding the Liebig scan, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Factors {
    pub light: f64,
    pub effective_co2: f64,
    pub temperature: f64,
    pub water: f64,
}

impl Factors {
    /// Derive the factors from an environment snapshot.
    pub fn from_environment(env: &EnvironmentState) -> Self {
        let light = env.light_intensity() / 100.0;
        let co2 = env.co2_level() / 100.0;
        let water = env.water_level() / 100.0;

        Self {
            light,
            effective_co2: effective_co2(co2, water),
            temperature: temperature_factor(env.temperature()),
            water,
        }
    }

    /// Factors in scan order.
    pub fn ordered(&self) -> [(LimitingFactor, f64); 4] {
        [
            (LimitingFactor::Light, self.light),
            (LimitingFactor::Co2, self.effective_co2),
            (LimitingFactor::Temperature, self.temperature),
            (LimitingFactor::Water, self.water),
        ]
    }

    /// The first factor holding the minimum value, and that value.
    ///
    /// Only a strictly smaller value displaces the current candidate, so on a
    /// tie the factor scanned first wins.
    pub fn limiting(&self) -> (LimitingFactor, f64) {
        let [first, rest @ ..] = self.ordered();
        rest.into_iter().fold(first, |(best, min), (factor, value)| {
            if value < min {
                (factor, value)
            } else {
                (best, min)
            }
        })
    }
}

/// Enzyme activity as a function of temperature.
///
/// A Gaussian centred at [`OPTIMAL_TEMPERATURE`] inside the open interval
/// `(0, DENATURATION_TEMPERATURE)`, and zero outside it.
pub fn temperature_factor(celsius: f64) -> f64 {
    if celsius > 0.0 && celsius < DENATURATION_TEMPERATURE {
        let delta = celsius - OPTIMAL_TEMPERATURE;
        (-(delta * delta) / (2.0 * TEMPERATURE_SPREAD * TEMPERATURE_SPREAD)).exp()
    } else {
        0.0
    }
}

/// CO2 available to the Calvin cycle after stomatal regulation.
///
/// Both arguments are normalized. At or below the closure threshold, uptake
/// falls linearly with water, continuous at the threshold.
pub fn effective_co2(co2: f64, water: f64) -> f64 {
    if water > STOMATAL_CLOSURE_THRESHOLD {
        co2
    } else {
        co2 * water * STOMATAL_UPTAKE_SLOPE
    }
}

// ---------------------------------------------------------------------------
// Production stats
// ---------------------------------------------------------------------------

/// Output of the rate model for one environment snapshot.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct ProductionStats {
    /// Glucose production rate (arbitrary units per tick), `>= 0`.
    pub glucose_rate: f64,
    /// Oxygen release rate (arbitrary units per tick), `>= 0`.
    pub oxygen_rate: f64,
    /// ATP availability proxy, `0..=100`.
    pub atp_level: f64,
    /// NADPH availability proxy; always equal to `atp_level`.
    pub nadph_level: f64,
    pub limiting_factor: LimitingFactor,
}

impl ProductionStats {
    /// Glucose rate as a percentage of the model's maximum rate.
    pub fn efficiency_percent(&self) -> f64 {
        self.glucose_rate * (100.0 / RATE_SCALE)
    }
}

/// Evaluate the rate model. Pure and deterministic.
pub fn compute_stats(env: &EnvironmentState) -> ProductionStats {
    let factors = Factors::from_environment(env);
    let (limiting_factor, min_value) = factors.limiting();

    let glucose_rate = min_value * RATE_SCALE;
    let oxygen_rate = factors.light.min(factors.water) * factors.temperature * RATE_SCALE;

    // Raw CO2 here, not the stomata-adjusted value.
    let light = factors.light;
    let co2 = env.co2_level() / 100.0;
    let atp_level = if light > co2 {
        // Calvin cycle bottleneck: carriers stockpile.
        (50.0 + (light - co2) * 50.0).min(100.0)
    } else {
        (light * 100.0).min(100.0)
    };

    ProductionStats {
        glucose_rate,
        oxygen_rate,
        atp_level,
        nadph_level: atp_level,
        limiting_factor,
    }
}
