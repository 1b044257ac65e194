//! Simulation clock, status, and state hashing.

use std::hash::Hasher;

/// Simulation time, in ticks.
pub type Ticks = u64;

// ---------------------------------------------------------------------------
// Simulation status
// ---------------------------------------------------------------------------

/// Whether the scheduler is advancing the clock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum SimulationStatus {
    #[default]
    Running,
    Paused,
}

impl SimulationStatus {
    /// The opposite status, for a single play/pause control.
    pub fn toggled(self) -> Self {
        match self {
            SimulationStatus::Running => SimulationStatus::Paused,
            SimulationStatus::Paused => SimulationStatus::Running,
        }
    }

    pub fn is_running(self) -> bool {
        matches!(self, SimulationStatus::Running)
    }
}

// ---------------------------------------------------------------------------
// Simulation state
// ---------------------------------------------------------------------------

/// Clock and status tracked by the simulation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct SimState {
    /// Current tick counter. Incremented by 1 for each running step.
    pub tick: Ticks,

    pub status: SimulationStatus,
}

impl SimState {
    /// A running simulation at tick 0.
    pub fn new() -> Self {
        Self {
            tick: 0,
            status: SimulationStatus::Running,
        }
    }
}

// ---------------------------------------------------------------------------
// State hash
// ---------------------------------------------------------------------------

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// FNV-1a digest of simulation state, used to compare runs for determinism.
///
/// Integers are fed little-endian so digests agree across platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateHash {
    state: u64,
}

impl StateHash {
    pub fn new() -> Self {
        Self {
            state: FNV_OFFSET_BASIS,
        }
    }

    /// Feed a float by bit pattern, so `0.0` and `-0.0` differ.
    pub fn write_f64(&mut self, value: f64) {
        self.write_u64(value.to_bits());
    }
}

impl Default for StateHash {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher for StateHash {
    fn write(&mut self, bytes: &[u8]) {
        self.state = bytes
            .iter()
            .fold(self.state, |h, &b| (h ^ u64::from(b)).wrapping_mul(FNV_PRIME));
    }

    fn write_u64(&mut self, value: u64) {
        self.write(&value.to_le_bytes());
    }

    fn finish(&self) -> u64 {
        self.state
    }
}
