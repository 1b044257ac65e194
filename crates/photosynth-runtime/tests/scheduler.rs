//! Timing tests for the simulator, mostly on a paused tokio clock.
//!
//! Sleeps land half a period away from tick deadlines so that the order of
//! timer firings is never ambiguous.

use std::sync::{Arc, Barrier};
use std::time::Duration;

use photosynth_core::command::Command;
use photosynth_core::environment::{EnvironmentField, EnvironmentState};
use photosynth_core::model::LimitingFactor;
use photosynth_core::sim::SimulationStatus;
use photosynth_core::test_utils::*;
use photosynth_runtime::{
    NarrationRequest, RuleNarrator, SchedulerConfig, SchedulerError, Simulator, consult,
};
use tokio::time::sleep;

const PERIOD: Duration = Duration::from_secs(1);

fn periods(n: f64) -> Duration {
    PERIOD.mul_f64(n)
}

fn spawn() -> Simulator {
    Simulator::spawn(SchedulerConfig::new(PERIOD)).unwrap()
}

#[tokio::test(start_paused = true)]
async fn ticks_once_per_period() {
    let sim = spawn();
    sleep(periods(0.5)).await;
    assert_eq!(sim.tick(), 0);

    sleep(periods(10.0)).await;
    assert_eq!(sim.tick(), 10);
    assert_eq!(sim.history().len(), 10);
    assert_approx(sim.total_glucose(), 10.0 * 2.5 / 10.0, 1e-9);
}

#[tokio::test(start_paused = true)]
async fn pause_gap_continues_clock() {
    let sim = spawn();
    sleep(periods(10.5)).await;
    assert_eq!(sim.tick(), 10);

    sim.pause();
    sleep(periods(5.0)).await;
    assert_eq!(sim.tick(), 10);
    assert_eq!(sim.status(), SimulationStatus::Paused);

    sim.resume();
    sleep(periods(5.25)).await;
    assert_eq!(sim.tick(), 15);

    let history = sim.history();
    assert_eq!(history.len(), 15);
    let timestamps: Vec<u64> = history.iter().map(|p| p.timestamp).collect();
    assert_eq!(timestamps, (1..=15).collect::<Vec<_>>());
}

#[tokio::test(start_paused = true)]
async fn resume_waits_a_full_period() {
    let sim = spawn();
    sleep(periods(2.5)).await;
    sim.pause();
    sleep(periods(0.25)).await;
    sim.resume();

    // The old schedule would have ticked at 3.0.
    sleep(periods(0.75)).await;
    assert_eq!(sim.tick(), 2);
    sleep(periods(0.5)).await;
    assert_eq!(sim.tick(), 3);
}

#[tokio::test(start_paused = true)]
async fn nothing_changes_while_paused() {
    let sim = spawn();
    sleep(periods(3.5)).await;
    sim.pause();
    let before = sim.snapshot().state_hash();

    sleep(periods(100.0)).await;
    assert_eq!(sim.snapshot().state_hash(), before);
}

#[tokio::test(start_paused = true)]
async fn reset_restarts_timer() {
    let sim = spawn();
    sleep(periods(3.5)).await;
    sim.set_environment(EnvironmentField::Light, 90.0).unwrap();
    assert_eq!(sim.tick(), 3);

    sim.reset();
    assert_eq!(sim.tick(), 0);
    assert!(sim.history().is_empty());
    assert_eq!(sim.total_glucose(), 0.0);
    assert_eq!(sim.environment(), EnvironmentState::DEFAULT);

    // The old schedule would have ticked at 4.0.
    sleep(periods(0.75)).await;
    assert_eq!(sim.tick(), 0);
    sleep(periods(0.5)).await;
    assert_eq!(sim.tick(), 1);
}

#[tokio::test(start_paused = true)]
async fn reset_while_paused_resumes() {
    let sim = spawn();
    sleep(periods(2.5)).await;
    sim.pause();
    sleep(periods(3.0)).await;

    sim.reset();
    assert_eq!(sim.status(), SimulationStatus::Running);
    sleep(periods(2.5)).await;
    assert_eq!(sim.tick(), 2);
}

#[tokio::test(start_paused = true)]
async fn environment_edit_keeps_schedule() {
    let sim = spawn();
    sleep(periods(2.5)).await;
    sim.set_environment(EnvironmentField::Water, 10.0).unwrap();

    // Next tick still lands at 3.0, and sees the new water level.
    sleep(periods(0.75)).await;
    assert_eq!(sim.tick(), 3);
    let latest = sim.history().last().copied().unwrap();
    assert_eq!(latest.glucose, 0.5);
}

#[tokio::test(start_paused = true)]
async fn toggle_and_commands() {
    let sim = spawn();
    sleep(periods(1.5)).await;

    assert_eq!(sim.toggle_pause(), SimulationStatus::Paused);
    sleep(periods(3.0)).await;
    assert_eq!(sim.tick(), 1);

    sim.execute(Command::TogglePause).unwrap();
    sim.execute(Command::SetEnvironment {
        field: EnvironmentField::Light,
        value: 0.0,
    })
    .unwrap();
    sleep(periods(1.25)).await;
    assert_eq!(sim.tick(), 2);
    assert_eq!(sim.compute_stats().limiting_factor, LimitingFactor::Light);

    sim.execute(Command::Reset).unwrap();
    assert_eq!(sim.tick(), 0);
}

#[tokio::test(start_paused = true)]
async fn redundant_resume_keeps_schedule() {
    let sim = spawn();
    sleep(periods(2.5)).await;
    sim.resume();
    sleep(periods(0.75)).await;
    assert_eq!(sim.tick(), 3);
}

#[tokio::test(start_paused = true)]
async fn subscribers_see_latest_report() {
    let sim = spawn();
    let mut reports = sim.subscribe();
    assert!(reports.borrow().is_none());

    reports.changed().await.unwrap();
    let report = reports.borrow_and_update().unwrap();
    assert_eq!(report.tick, 1);
    assert_eq!(report.point.timestamp, 1);
    assert_eq!(report.total_glucose, 0.25);
}

#[tokio::test(start_paused = true)]
async fn tick_stream_keeps_every_report() {
    let sim = spawn();
    let mut ticks = sim.subscribe_ticks();

    // Nobody reads for several periods; the stream still holds each tick.
    sleep(periods(5.5)).await;
    for expected in 1..=5 {
        let report = ticks.recv().await.unwrap();
        assert_eq!(report.tick, expected);
        assert_eq!(report.point.timestamp, expected);
    }
    assert!(ticks.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn handle_outlives_shutdown() {
    let sim = spawn();
    let handle = sim.handle();
    sleep(periods(4.5)).await;

    sim.shutdown().await;
    sleep(periods(10.0)).await;
    assert_eq!(handle.tick(), 4);

    handle.set_environment(EnvironmentField::Co2, 75.0).unwrap();
    assert_eq!(handle.environment().co2_level(), 75.0);
}

#[tokio::test(start_paused = true)]
async fn drop_stops_ticking() {
    let sim = spawn();
    let handle = sim.handle();
    sleep(periods(2.5)).await;

    drop(sim);
    sleep(periods(5.0)).await;
    assert_eq!(handle.tick(), 2);
}

#[tokio::test(start_paused = true)]
async fn spawn_with_preserves_paused_status() {
    let mut simulation = simulation_in(full_sun());
    simulation.pause();
    let sim = Simulator::spawn_with(simulation, SchedulerConfig::new(PERIOD)).unwrap();

    sleep(periods(5.5)).await;
    assert_eq!(sim.tick(), 0);

    sim.resume();
    sleep(periods(1.5)).await;
    assert_eq!(sim.tick(), 1);
    assert_eq!(sim.total_glucose(), 0.5);
}

#[tokio::test]
async fn zero_period_rejected() {
    let err = Simulator::spawn(SchedulerConfig::new(Duration::ZERO)).unwrap_err();
    assert!(matches!(err, SchedulerError::ZeroTickPeriod));
}

#[tokio::test(start_paused = true)]
async fn narration_reads_live_state_without_ticking_it() {
    let sim = spawn();
    sim.set_environment(EnvironmentField::Water, 5.0).unwrap();
    sleep(periods(2.5)).await;

    let request = NarrationRequest::from_handle(&sim.handle());
    assert_eq!(request.stats.limiting_factor, LimitingFactor::Water);
    let before = sim.snapshot().state_hash();

    let narration = consult(&RuleNarrator, &request, Duration::from_secs(10)).await;
    assert!(narration.is_answer());
    assert!(narration.text().contains("limited by Water"));
    assert_eq!(sim.snapshot().state_hash(), before);
}

// Real clock: control calls race each other from plain threads while the
// timer runs on the runtime's workers.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn racing_controls_leave_timer_in_step_with_status() {
    let sim = Simulator::spawn(SchedulerConfig::new(Duration::from_millis(1))).unwrap();

    for round in 0..50 {
        let barrier = Arc::new(Barrier::new(2));
        let pauser = {
            let handle = sim.handle();
            let barrier = Arc::clone(&barrier);
            tokio::task::spawn_blocking(move || {
                for _ in 0..20 {
                    barrier.wait();
                    handle.pause();
                }
            })
        };
        let resumer = {
            let handle = sim.handle();
            let barrier = Arc::clone(&barrier);
            tokio::task::spawn_blocking(move || {
                for _ in 0..20 {
                    barrier.wait();
                    if round % 2 == 0 {
                        handle.resume();
                    } else {
                        handle.toggle_pause();
                    }
                }
            })
        };
        pauser.await.unwrap();
        resumer.await.unwrap();

        let status = sim.status();
        let before = sim.tick();
        sleep(Duration::from_millis(50)).await;
        let after = sim.tick();
        match status {
            SimulationStatus::Running => {
                assert!(after > before, "round {round}: running but timer idle")
            }
            SimulationStatus::Paused => {
                assert_eq!(after, before, "round {round}: paused but still ticking")
            }
        }
        sim.resume();
    }
}
