//! PhotoSynth Core -- the simulation engine for the photosynthesis simulator.
//!
//! This crate provides the environment input vector, the pure rate model,
//! the bounded production history, the glucose accumulator, and the
//! synchronous tick pipeline that ties them together. Timer-driven execution
//! lives in `photosynth-runtime`; this crate never sleeps or spawns.
//!
//! # Tick Pipeline
//!
//! Each call to [`engine::Simulation::step`] while running advances the
//! simulation by one tick:
//!
//! 1. **Clock** -- Increment the tick counter.
//! 2. **Model** -- Snapshot the environment and evaluate the rate model.
//! 3. **Accumulate** -- Add `glucose_rate / 10` to the running total.
//! 4. **Record** -- Append a rounded sample to the 50-point history.
//!
//! While paused, `step()` is a no-op.
//!
//! # Key Types
//!
//! - [`engine::Simulation`] -- State machine and tick pipeline orchestrator.
//! - [`environment::EnvironmentState`] -- Range-clamped light, CO2, water and
//!   temperature inputs.
//! - [`model::compute_stats`] -- Liebig's-law rate model.
//! - [`history::HistoryBuffer`] -- Sliding window of [`history::HistoryPoint`]s.
//! - [`accumulator::GlucoseAccumulator`] -- Monotonic glucose total.
//! - [`command::Command`] -- Externally submitted control operations.

pub mod accumulator;
pub mod command;
pub mod engine;
pub mod environment;
pub mod history;
pub mod model;
pub mod sim;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
