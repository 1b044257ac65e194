//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::engine::Simulation;
use crate::environment::{EnvironmentField, EnvironmentState};

// ===========================================================================
// Environment constructors
// ===========================================================================

/// Build an environment, clamping out-of-range inputs.
///
/// # Panics
///
/// Panics on non-finite input.
pub fn env(light: f64, co2: f64, water: f64, temperature: f64) -> EnvironmentState {
    EnvironmentState::clamped(light, co2, water, temperature)
        .expect("test environment values must be finite")
}

/// Every input saturated at the thermal optimum: glucose rate 5.0.
pub fn full_sun() -> EnvironmentState {
    env(100.0, 100.0, 100.0, 25.0)
}

/// Ample light and CO2 but only 10% water.
pub fn drought() -> EnvironmentState {
    env(80.0, 80.0, 10.0, 25.0)
}

// ===========================================================================
// Simulation helpers
// ===========================================================================

/// A fresh simulation running in `environment`.
pub fn simulation_in(environment: EnvironmentState) -> Simulation {
    let mut sim = Simulation::new();
    sim.replace_environment(environment);
    sim
}

/// Set all four fields through the public write path.
pub fn set_all(sim: &mut Simulation, environment: EnvironmentState) {
    for field in EnvironmentField::ALL {
        sim.set_environment(field, environment.get(field))
            .expect("finite environment values");
    }
}

/// Step exactly `n` ticks, panicking if the simulation is paused.
pub fn run_ticks(sim: &mut Simulation, n: u64) {
    let ran = sim.step_n(n);
    assert_eq!(ran, n, "simulation stopped after {ran} of {n} ticks");
}

// ===========================================================================
// Assertions
// ===========================================================================

/// Assert two floats are within `tolerance`.
pub fn assert_approx(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {expected} ± {tolerance}, got {actual}"
    );
}
