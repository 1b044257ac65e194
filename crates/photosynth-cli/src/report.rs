//! Text and JSON rendering of run results.

use std::fmt::Write as _;

use photosynth_core::engine::{Simulation, TickReport};
use photosynth_core::environment::EnvironmentState;
use photosynth_core::history::HistoryPoint;
use photosynth_core::model::ProductionStats;
use photosynth_core::sim::{SimulationStatus, Ticks};
use serde::Serialize;

pub const TABLE_HEADER: &str =
    " tick  light    co2  water   temp  glucose  oxygen    atp  limiting       total";

pub fn format_row(report: &TickReport) -> String {
    let env = &report.environment;
    format!(
        "{:>5} {:>6.1} {:>6.1} {:>6.1} {:>6.1} {:>8.2} {:>7.2} {:>6.1}  {:<11} {:>8.3}",
        report.tick,
        env.light_intensity(),
        env.co2_level(),
        env.water_level(),
        env.temperature(),
        report.point.glucose,
        report.point.oxygen,
        report.stats.atp_level,
        report.stats.limiting_factor.label(),
        report.total_glucose,
    )
}

/// Final state of a run, as printed by `--json`.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub scenario: Option<String>,
    pub tick: Ticks,
    pub status: SimulationStatus,
    pub environment: EnvironmentState,
    pub stats: ProductionStats,
    pub efficiency_percent: f64,
    pub total_glucose: f64,
    pub whole_grams: u64,
    pub history: Vec<HistoryPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narration: Option<String>,
}

impl RunSummary {
    pub fn new(simulation: &Simulation, scenario: Option<String>) -> Self {
        let stats = simulation.compute_stats();
        Self {
            scenario,
            tick: simulation.tick(),
            status: simulation.status(),
            environment: simulation.environment(),
            stats,
            efficiency_percent: stats.efficiency_percent(),
            total_glucose: simulation.total_glucose(),
            whole_grams: simulation.accumulator().whole_grams(),
            history: simulation.history(),
            narration: None,
        }
    }

    pub fn with_narration(mut self, narration: impl Into<String>) -> Self {
        self.narration = Some(narration.into());
        self
    }

    /// Human-readable summary block.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        if let Some(scenario) = &self.scenario {
            let _ = writeln!(out, "scenario:        {scenario}");
        }
        let _ = writeln!(out, "environment:     {}", self.environment);
        let _ = writeln!(out, "ticks:           {} ({:?})", self.tick, self.status);
        let _ = writeln!(
            out,
            "glucose rate:    {:.2} ({:.0}% efficiency)",
            self.stats.glucose_rate, self.efficiency_percent
        );
        let _ = writeln!(out, "oxygen rate:     {:.2}", self.stats.oxygen_rate);
        let _ = writeln!(
            out,
            "ATP / NADPH:     {:.0}% / {:.0}%",
            self.stats.atp_level, self.stats.nadph_level
        );
        let _ = writeln!(out, "limiting factor: {}", self.stats.limiting_factor);
        let _ = writeln!(
            out,
            "total glucose:   {}g ({:.3})",
            self.whole_grams, self.total_glucose
        );
        if let Some(narration) = &self.narration {
            let _ = writeln!(out, "\n{narration}");
        }
        out
    }
}
