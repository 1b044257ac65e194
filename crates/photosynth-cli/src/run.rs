//! Headless and wall-clock run loops.
//!
//! Both loops count in timer periods. A scheduled command `TICK:COMMAND` is
//! applied once `TICK` periods have elapsed, before the next period's tick,
//! so `10:pause` followed by `15:resume` leaves a five-period gap in either
//! mode. In wall-clock mode commands land a quarter period past the boundary
//! and the run ends half a period past the last one, keeping both clear of
//! the timer's own ticks.

use std::str::FromStr;
use std::time::Duration;

use photosynth_core::command::Command;
use photosynth_core::engine::{Simulation, TickReport};
use photosynth_runtime::{SchedulerConfig, Simulator};
use tokio::sync::broadcast::error::RecvError;
use tokio::time::{Instant, sleep_until};
use tracing::{info, warn};

use crate::CliError;

/// A command to apply after a number of elapsed periods.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledCommand {
    pub at: u64,
    pub command: Command,
}

impl FromStr for ScheduledCommand {
    type Err = CliError;

    /// Parses `TICK:COMMAND`, e.g. `10:pause` or `3:water=15`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (at, command) = s
            .split_once(':')
            .ok_or_else(|| CliError::InvalidSchedule(s.to_string()))?;
        let at = at
            .trim()
            .parse()
            .map_err(|_| CliError::InvalidSchedule(s.to_string()))?;
        let command = command.parse()?;
        Ok(Self { at, command })
    }
}

/// How long to run and what to do along the way.
#[derive(Debug, Clone, Default)]
pub struct RunPlan {
    pub periods: u64,
    /// Sorted by `at`; commands sharing a period keep their given order.
    schedule: Vec<ScheduledCommand>,
}

impl RunPlan {
    pub fn new(periods: u64, mut schedule: Vec<ScheduledCommand>) -> Self {
        schedule.sort_by_key(|s| s.at);
        for late in schedule.iter().filter(|s| s.at > periods) {
            warn!(at = late.at, command = %late.command, periods, "scheduled command is never reached");
        }
        schedule.retain(|s| s.at <= periods);
        Self { periods, schedule }
    }

    pub fn schedule(&self) -> &[ScheduledCommand] {
        &self.schedule
    }
}

/// Every tick produced during a run, and the final state.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub reports: Vec<TickReport>,
    pub simulation: Simulation,
}

fn apply(simulation: &mut Simulation, scheduled: &ScheduledCommand) -> Result<(), CliError> {
    info!(at = scheduled.at, command = %scheduled.command, "applying scheduled command");
    simulation.execute(scheduled.command)?;
    Ok(())
}

/// Step the simulation once per period without waiting.
pub fn run_headless(mut simulation: Simulation, plan: &RunPlan) -> Result<RunOutcome, CliError> {
    let mut reports = Vec::new();
    let mut pending = plan.schedule.iter().peekable();

    for period in 0..plan.periods {
        while let Some(scheduled) = pending.next_if(|s| s.at <= period) {
            apply(&mut simulation, scheduled)?;
        }
        if let Some(report) = simulation.step() {
            reports.push(report);
        }
    }
    for scheduled in pending {
        apply(&mut simulation, scheduled)?;
    }

    Ok(RunOutcome {
        reports,
        simulation,
    })
}

fn periods(period: Duration, n: u64) -> Duration {
    period.saturating_mul(u32::try_from(n).unwrap_or(u32::MAX))
}

/// Drive the simulation from a [`Simulator`] timer for `plan.periods`
/// periods of wall-clock time.
pub async fn run_realtime(
    simulation: Simulation,
    plan: &RunPlan,
    tick_period: Duration,
    mut on_tick: impl FnMut(&TickReport),
) -> Result<RunOutcome, CliError> {
    let simulator = Simulator::spawn_with(simulation, SchedulerConfig::new(tick_period))?;
    let mut ticks = simulator.subscribe_ticks();
    let start = Instant::now();
    let deadline = start + periods(tick_period, plan.periods) + tick_period / 2;

    let mut reports = Vec::new();
    let mut pending = plan.schedule.iter().peekable();

    loop {
        let next_command = pending
            .peek()
            .map(|s| start + periods(tick_period, s.at) + tick_period / 4);

        tokio::select! {
            biased;
            _ = sleep_until(next_command.unwrap_or(deadline)), if next_command.is_some() => {
                if let Some(scheduled) = pending.next() {
                    info!(at = scheduled.at, command = %scheduled.command, "applying scheduled command");
                    simulator.execute(scheduled.command)?;
                }
            }
            received = ticks.recv() => match received {
                Ok(report) => {
                    on_tick(&report);
                    reports.push(report);
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "tick output fell behind the timer");
                }
                Err(RecvError::Closed) => break,
            },
            _ = sleep_until(deadline) => break,
        }
    }

    let simulation = simulator.snapshot();
    simulator.shutdown().await;
    Ok(RunOutcome {
        reports,
        simulation,
    })
}
