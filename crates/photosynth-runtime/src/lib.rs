//! Wall-clock driver and narration for the photosynthesis simulation.
//!
//! [`scheduler::Simulator`] owns a single tokio task that advances a shared
//! [`photosynth_core::engine::Simulation`] once per tick period. The timer is
//! halted while paused, restarted one full period after resume or reset, and
//! never restarted by environment edits. Tick reports are published both as
//! a latest-value watch and as an ordered per-tick broadcast stream.
//!
//! [`narration`] turns the current state into a plain-language explanation
//! through a pluggable [`narration::Narrator`].

pub mod narration;
pub mod scheduler;

pub use narration::{Narration, NarrationError, NarrationRequest, Narrator, RuleNarrator, consult};
pub use scheduler::{
    SchedulerConfig, SchedulerError, Simulator, SimulatorHandle, TICK_STREAM_CAPACITY,
};
