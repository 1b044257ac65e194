//! The periodic tick driver.
//!
//! A [`Simulator`] spawns one tokio task that owns the tick timer. All state
//! lives in a [`Simulation`] behind a mutex shared with every
//! [`SimulatorHandle`]; the lock is taken for the duration of one tick or one
//! control operation and never held across an `.await`.
//!
//! Control operations are applied to the simulation synchronously on the
//! caller's thread, then signalled to the timer task over a `watch` channel:
//!
//! - pause: the task drops its interval and waits for the next signal
//! - resume: a fresh interval starts, first tick one full period later
//! - reset: same as resume, even if the simulation was already running
//!
//! Environment writes send no signal, so they never disturb the timer.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use photosynth_core::command::Command;
use photosynth_core::engine::{Simulation, TickReport};
use photosynth_core::environment::{EnvironmentError, EnvironmentField, EnvironmentState};
use photosynth_core::history::HistoryPoint;
use photosynth_core::model::ProductionStats;
use photosynth_core::sim::{SimulationStatus, Ticks};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info, trace, warn};

/// Reports buffered per [`SimulatorHandle::subscribe_ticks`] receiver.
pub const TICK_STREAM_CAPACITY: usize = 256;

/// Errors returned when starting a [`Simulator`].
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("tick period must be greater than zero")]
    ZeroTickPeriod,
}

/// Timer settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub tick_period: Duration,
}

impl SchedulerConfig {
    pub fn new(tick_period: Duration) -> Self {
        Self { tick_period }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// What the timer task should be doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Control {
    status: SimulationStatus,
    /// Bumped by every reset so the task restarts its interval.
    epoch: u64,
    shutdown: bool,
}

#[derive(Debug)]
struct Shared {
    simulation: Mutex<Simulation>,
    control: watch::Sender<Control>,
    reports: watch::Sender<Option<TickReport>>,
    ticks: broadcast::Sender<TickReport>,
}

// ---------------------------------------------------------------------------
// Simulator
// ---------------------------------------------------------------------------

/// Owner of the tick task. Dropping it stops the timer; handles stay usable
/// for reads and control but no further ticks run.
#[derive(Debug)]
pub struct Simulator {
    handle: SimulatorHandle,
    task: Option<JoinHandle<()>>,
}

impl Simulator {
    /// Start ticking a fresh simulation. Must be called inside a tokio runtime.
    pub fn spawn(config: SchedulerConfig) -> Result<Self, SchedulerError> {
        Self::spawn_with(Simulation::new(), config)
    }

    /// Start ticking an existing simulation, preserving its status.
    pub fn spawn_with(
        simulation: Simulation,
        config: SchedulerConfig,
    ) -> Result<Self, SchedulerError> {
        if config.tick_period.is_zero() {
            return Err(SchedulerError::ZeroTickPeriod);
        }

        let (control, control_rx) = watch::channel(Control {
            status: simulation.status(),
            epoch: 0,
            shutdown: false,
        });
        let (reports, _) = watch::channel(None);
        let (ticks, _) = broadcast::channel(TICK_STREAM_CAPACITY);
        let shared = Arc::new(Shared {
            simulation: Mutex::new(simulation),
            control,
            reports,
            ticks,
        });

        info!(
            period_ms = config.tick_period.as_millis() as u64,
            "simulator started"
        );
        let task = tokio::spawn(run_timer(
            Arc::clone(&shared),
            control_rx,
            config.tick_period,
        ));

        Ok(Self {
            handle: SimulatorHandle { shared },
            task: Some(task),
        })
    }

    /// A cloneable handle for control and reads.
    pub fn handle(&self) -> SimulatorHandle {
        self.handle.clone()
    }

    /// Stop the timer and wait for the task to finish.
    pub async fn shutdown(mut self) {
        self.handle.signal_shutdown();
        if let Some(task) = self.task.take() {
            if let Err(error) = task.await {
                warn!(%error, "tick task ended abnormally");
            }
        }
    }
}

impl std::ops::Deref for Simulator {
    type Target = SimulatorHandle;

    fn deref(&self) -> &SimulatorHandle {
        &self.handle
    }
}

impl Drop for Simulator {
    fn drop(&mut self) {
        if self.task.is_some() {
            self.handle.signal_shutdown();
        }
    }
}

async fn run_timer(shared: Arc<Shared>, mut control: watch::Receiver<Control>, period: Duration) {
    loop {
        let current = *control.borrow_and_update();
        if current.shutdown {
            break;
        }

        if !current.status.is_running() {
            if control.changed().await.is_err() {
                break;
            }
            continue;
        }

        debug!(epoch = current.epoch, "tick timer started");
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                changed = control.changed() => {
                    if changed.is_err() {
                        info!("simulator stopped");
                        return;
                    }
                    break;
                }
                _ = interval.tick() => {
                    let report = shared.simulation.lock().step();
                    if let Some(report) = report {
                        trace!(
                            tick = report.tick,
                            glucose_rate = report.stats.glucose_rate,
                            limiting = %report.stats.limiting_factor,
                            "tick"
                        );
                        shared.reports.send_replace(Some(report));
                        // No receivers is fine.
                        let _ = shared.ticks.send(report);
                    }
                }
            }
        }
    }
    info!("simulator stopped");
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Cloneable access to a running [`Simulator`].
#[derive(Debug, Clone)]
pub struct SimulatorHandle {
    shared: Arc<Shared>,
}

impl SimulatorHandle {
    fn signal_status(&self, status: SimulationStatus) {
        self.shared.control.send_if_modified(|control| {
            let modified = control.status != status;
            control.status = status;
            modified
        });
    }

    fn signal_restart(&self) {
        self.shared.control.send_modify(|control| {
            control.status = SimulationStatus::Running;
            control.epoch += 1;
        });
    }

    fn signal_shutdown(&self) {
        self.shared.control.send_modify(|control| control.shutdown = true);
    }

    /// Clamp and store one environment field. The timer is not touched.
    pub fn set_environment(
        &self,
        field: EnvironmentField,
        value: f64,
    ) -> Result<f64, EnvironmentError> {
        self.shared.simulation.lock().set_environment(field, value)
    }

    /// Replace the whole environment at once.
    pub fn replace_environment(&self, environment: EnvironmentState) {
        self.shared.simulation.lock().replace_environment(environment);
    }

    // Control operations signal the timer while still holding the
    // simulation lock, so the timer's view of the status is updated in the
    // same order the status itself changes.

    /// Halt the timer. No-op if already paused.
    pub fn pause(&self) {
        let mut simulation = self.shared.simulation.lock();
        simulation.pause();
        self.signal_status(simulation.status());
    }

    /// Restart the timer; the first tick comes one full period later.
    /// No-op if already running.
    pub fn resume(&self) {
        let mut simulation = self.shared.simulation.lock();
        simulation.resume();
        self.signal_status(simulation.status());
    }

    pub fn toggle_pause(&self) -> SimulationStatus {
        let mut simulation = self.shared.simulation.lock();
        let status = simulation.toggle_pause();
        self.signal_status(status);
        status
    }

    /// Reset the simulation and restart the timer from now.
    pub fn reset(&self) {
        let mut simulation = self.shared.simulation.lock();
        simulation.reset();
        self.signal_restart();
    }

    /// Execute a control command with the same timer effects as the
    /// dedicated methods.
    pub fn execute(&self, command: Command) -> Result<(), EnvironmentError> {
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

    pub fn compute_stats(&self) -> ProductionStats {
        self.shared.simulation.lock().compute_stats()
    }

    /// History samples, oldest first.
    pub fn history(&self) -> Vec<HistoryPoint> {
        self.shared.simulation.lock().history()
    }

    pub fn total_glucose(&self) -> f64 {
        self.shared.simulation.lock().total_glucose()
    }

    pub fn tick(&self) -> Ticks {
        self.shared.simulation.lock().tick()
    }

    pub fn status(&self) -> SimulationStatus {
        self.shared.simulation.lock().status()
    }

    pub fn environment(&self) -> EnvironmentState {
        self.shared.simulation.lock().environment()
    }

    /// Environment and stats read under one lock.
    pub fn observe(&self) -> (EnvironmentState, ProductionStats) {
        let simulation = self.shared.simulation.lock();
        (simulation.environment(), simulation.compute_stats())
    }

    /// A copy of the whole simulation.
    pub fn snapshot(&self) -> Simulation {
        self.shared.simulation.lock().clone()
    }

    /// Receiver for the most recent tick report (`None` before the first tick).
    pub fn subscribe(&self) -> watch::Receiver<Option<TickReport>> {
        self.shared.reports.subscribe()
    }

    /// Receiver for every tick report from now on, in order.
    ///
    /// Buffers up to [`TICK_STREAM_CAPACITY`] reports; a receiver that falls
    /// further behind gets `RecvError::Lagged` with the number skipped.
    pub fn subscribe_ticks(&self) -> broadcast::Receiver<TickReport> {
        self.shared.ticks.subscribe()
    }
}
