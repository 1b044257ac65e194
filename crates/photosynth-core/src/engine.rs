//! The simulation: owns the environment, clock, history and glucose total,
//! and runs the tick pipeline.
//!
//! # Architecture
//!
//! The `Simulation` owns:
//! - The current [`EnvironmentState`] (replaced wholesale on every write)
//! - A [`SimState`] (tick counter, running/paused status)
//! - A [`HistoryBuffer`] of the last 50 samples
//! - A [`GlucoseAccumulator`]
//!
//! It has no timer. Callers (the async scheduler in `photosynth-runtime`,
//! the CLI's headless loop, tests) decide when to call [`Simulation::step`].
//! A paused simulation ignores `step()`; a timer-driven caller is expected to
//! stop calling it entirely.

use std::hash::Hasher;

use tracing::{debug, info, trace};

use crate::accumulator::GlucoseAccumulator;
use crate::command::Command;
use crate::environment::{EnvironmentError, EnvironmentField, EnvironmentState};
use crate::history::{HistoryBuffer, HistoryPoint};
use crate::model::{ProductionStats, compute_stats};
use crate::sim::{SimState, SimulationStatus, StateHash, Ticks};

// ---------------------------------------------------------------------------
// Tick report
// ---------------------------------------------------------------------------

/// Everything observable about one completed tick.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct TickReport {
    /// The tick that just completed (equals the new clock value).
    pub tick: Ticks,
    /// Environment snapshot the model was evaluated against.
    pub environment: EnvironmentState,
    pub stats: ProductionStats,
    /// The sample appended to history.
    pub point: HistoryPoint,
    /// Glucose total after this tick.
    pub total_glucose: f64,
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

/// The photosynthesis simulation state machine and tick pipeline.
#[derive(Debug, Clone)]
pub struct Simulation {
    environment: EnvironmentState,
    sim_state: SimState,
    history: HistoryBuffer,
    accumulator: GlucoseAccumulator,
}

impl Simulation {
    /// A running simulation with the default environment at tick 0.
    pub fn new() -> Self {
        Self {
            environment: EnvironmentState::DEFAULT,
            sim_state: SimState::new(),
            history: HistoryBuffer::new(),
            accumulator: GlucoseAccumulator::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Environment
    // -----------------------------------------------------------------------

    /// Snapshot of the current environment.
    pub fn environment(&self) -> EnvironmentState {
        self.environment.snapshot()
    }

    /// Clamp and store one environment field. Returns the stored value.
    ///
    /// Takes effect at the next tick; does not touch the clock.
    pub fn set_environment(
        &mut self,
        field: EnvironmentField,
        value: f64,
    ) -> Result<f64, EnvironmentError> {
        let stored = self.environment.set(field, value)?;
        debug!(%field, requested = value, stored, "environment updated");
        Ok(stored)
    }

    /// Replace the whole environment, e.g. when applying a preset.
    pub fn replace_environment(&mut self, environment: EnvironmentState) {
        debug!(%environment, "environment replaced");
        self.environment = environment;
    }

    /// Evaluate the rate model against the current environment without
    /// advancing anything.
    pub fn compute_stats(&self) -> ProductionStats {
        compute_stats(&self.environment)
    }

    // -----------------------------------------------------------------------
    // Status
    // -----------------------------------------------------------------------

    pub fn status(&self) -> SimulationStatus {
        self.sim_state.status
    }

    pub fn is_running(&self) -> bool {
        self.sim_state.status.is_running()
    }

    /// Pause the simulation. While paused, `step()` is a no-op.
    pub fn pause(&mut self) {
        if self.sim_state.status != SimulationStatus::Paused {
            info!(tick = self.sim_state.tick, "simulation paused");
        }
        self.sim_state.status = SimulationStatus::Paused;
    }

    /// Resume the simulation. The clock continues from its current value.
    pub fn resume(&mut self) {
        if self.sim_state.status != SimulationStatus::Running {
            info!(tick = self.sim_state.tick, "simulation resumed");
        }
        self.sim_state.status = SimulationStatus::Running;
    }

    /// Flip between running and paused. Returns the new status.
    pub fn toggle_pause(&mut self) -> SimulationStatus {
        match self.sim_state.status.toggled() {
            SimulationStatus::Running => self.resume(),
            SimulationStatus::Paused => self.pause(),
        }
        self.sim_state.status
    }

    /// Restore the default environment, clear history, zero the clock and
    /// glucose total, and force the running state.
    pub fn reset(&mut self) {
        info!(
            tick = self.sim_state.tick,
            total_glucose = self.accumulator.value(),
            "simulation reset"
        );
        self.environment = EnvironmentState::DEFAULT;
        self.history.clear();
        self.sim_state = SimState::new();
        self.accumulator.reset();
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Execute a control command.
    pub fn execute(&mut self, command: Command) -> Result<(), EnvironmentError> {
        match command {
            Command::SetEnvironment { field, value } => {
                self.set_environment(field, value)?;
            }
            Command::Pause => self.pause(),
            Command::Resume => self.resume(),
            Command::TogglePause => {
                self.toggle_pause();
            }
            Command::Reset => self.reset(),
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Run one tick if running. Returns `None` when paused.
    pub fn step(&mut self) -> Option<TickReport> {
        if !self.is_running() {
            return None;
        }

        // Clock.
        self.sim_state.tick += 1;
        let tick = self.sim_state.tick;

        // Model.
        let environment = self.environment.snapshot();
        let stats = compute_stats(&environment);

        // Accumulate.
        self.accumulator.add_tick(stats.glucose_rate);

        // Record.
        let point = HistoryPoint::sample(tick, &stats);
        self.history.append(point);

        trace!(
            tick,
            glucose_rate = stats.glucose_rate,
            oxygen_rate = stats.oxygen_rate,
            limiting = %stats.limiting_factor,
            "tick"
        );

        Some(TickReport {
            tick,
            environment,
            stats,
            point,
            total_glucose: self.accumulator.value(),
        })
    }

    /// Run up to `n` ticks. Returns how many actually ran.
    pub fn step_n(&mut self, n: u64) -> u64 {
        let mut ran = 0;
        for _ in 0..n {
            if self.step().is_none() {
                break;
            }
            ran += 1;
        }
        ran
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Current clock value.
    pub fn tick(&self) -> Ticks {
        self.sim_state.tick
    }

    pub fn sim_state(&self) -> SimState {
        self.sim_state
    }

    /// Retained history, oldest first.
    pub fn history(&self) -> Vec<HistoryPoint> {
        self.history.snapshot()
    }

    pub fn history_buffer(&self) -> &HistoryBuffer {
        &self.history
    }

    pub fn total_glucose(&self) -> f64 {
        self.accumulator.value()
    }

    pub fn accumulator(&self) -> &GlucoseAccumulator {
        &self.accumulator
    }

    /// Deterministic hash over clock, status, environment, total and history.
    pub fn state_hash(&self) -> u64 {
        let mut hash = StateHash::new();
        hash.write_u64(self.sim_state.tick);
        hash.write_u64(match self.sim_state.status {
            SimulationStatus::Running => 0,
            SimulationStatus::Paused => 1,
        });
        for field in EnvironmentField::ALL {
            hash.write_f64(self.environment.get(field));
        }
        hash.write_f64(self.accumulator.value());
        for point in self.history.iter() {
            hash.write_u64(point.timestamp);
            hash.write_f64(point.glucose);
            hash.write_f64(point.oxygen);
        }
        hash.finish()
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LimitingFactor;

    #[test]
    fn new_simulation_is_running_at_zero() {
        let sim = Simulation::new();
        assert_eq!(sim.tick(), 0);
        assert_eq!(sim.status(), SimulationStatus::Running);
        assert!(sim.history().is_empty());
        assert_eq!(sim.total_glucose(), 0.0);
        assert_eq!(sim.environment(), EnvironmentState::DEFAULT);
    }

    #[test]
    fn step_advances_clock_and_records() {
        let mut sim = Simulation::new();
        let report = sim.step().unwrap();
        assert_eq!(report.tick, 1);
        assert_eq!(report.point.timestamp, 1);
        assert_eq!(sim.tick(), 1);
        assert_eq!(sim.history().len(), 1);
        assert_eq!(sim.total_glucose(), report.stats.glucose_rate / 10.0);
    }

    #[test]
    fn paused_step_is_noop() {
        let mut sim = Simulation::new();
        sim.step();
        sim.pause();
        let before = sim.state_hash();
        assert!(sim.step().is_none());
        assert_eq!(sim.step_n(10), 0);
        assert_eq!(sim.tick(), 1);
        assert_eq!(sim.state_hash(), before);
    }

    #[test]
    fn toggle_flips_status() {
        let mut sim = Simulation::new();
        assert_eq!(sim.toggle_pause(), SimulationStatus::Paused);
        assert_eq!(sim.toggle_pause(), SimulationStatus::Running);
    }

    #[test]
    fn environment_change_visible_immediately_and_next_tick() {
        let mut sim = Simulation::new();
        sim.step();
        sim.set_environment(EnvironmentField::Light, 0.0).unwrap();
        assert_eq!(sim.compute_stats().glucose_rate, 0.0);
        assert_eq!(sim.tick(), 1);
        let report = sim.step().unwrap();
        assert_eq!(report.stats.limiting_factor, LimitingFactor::Light);
        assert_eq!(report.point.glucose, 0.0);
    }

    #[test]
    fn rejected_write_leaves_environment() {
        let mut sim = Simulation::new();
        assert!(
            sim.set_environment(EnvironmentField::Co2, f64::NAN)
                .is_err()
        );
        assert_eq!(sim.environment(), EnvironmentState::DEFAULT);
    }

    #[test]
    fn execute_dispatches_commands() {
        let mut sim = Simulation::new();
        sim.execute(Command::SetEnvironment {
            field: EnvironmentField::Water,
            value: 5.0,
        })
        .unwrap();
        assert_eq!(sim.environment().water_level(), 5.0);
        sim.execute(Command::Pause).unwrap();
        assert!(!sim.is_running());
        sim.execute(Command::TogglePause).unwrap();
        assert!(sim.is_running());
        sim.step();
        sim.execute(Command::Reset).unwrap();
        assert_eq!(sim.tick(), 0);
        assert_eq!(sim.environment(), EnvironmentState::DEFAULT);
    }

    #[test]
    fn reset_while_paused_forces_running() {
        let mut sim = Simulation::new();
        sim.step_n(3);
        sim.set_environment(EnvironmentField::Temperature, 48.0)
            .unwrap();
        sim.pause();
        sim.reset();
        assert_eq!(sim.status(), SimulationStatus::Running);
        assert_eq!(sim.tick(), 0);
        assert!(sim.history().is_empty());
        assert_eq!(sim.total_glucose(), 0.0);
        assert_eq!(sim.environment(), EnvironmentState::DEFAULT);
        assert_eq!(sim.state_hash(), Simulation::new().state_hash());
    }
}
