//! photosynth - run the leaf photosynthesis simulation from the terminal.
//!
//! Headless by default: the simulation is stepped once per period as fast as
//! possible. With `--realtime` the async scheduler drives it on the
//! configured wall-clock period.

mod report;
mod run;

use std::path::{Path, PathBuf};

use clap::Parser;
use photosynth_core::command::{Command, CommandParseError};
use photosynth_core::engine::Simulation;
use photosynth_core::environment::{EnvironmentError, EnvironmentField};
use photosynth_data::{DataLoadError, SimulatorConfig, load_config, load_config_from_dir};
use photosynth_runtime::{NarrationRequest, RuleNarrator, SchedulerError, consult};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::report::{RunSummary, TABLE_HEADER, format_row};
use crate::run::{RunPlan, ScheduledCommand, run_headless, run_realtime};

const DEFAULT_LOG_FILTER: &str = "photosynth=info";

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] DataLoadError),
    #[error("unknown scenario '{name}' (available: {available})")]
    UnknownScenario { name: String, available: String },
    #[error("invalid --set '{0}': expected FIELD=VALUE")]
    InvalidAssignment(String),
    #[error("invalid --at '{0}': expected TICK:COMMAND")]
    InvalidSchedule(String),
    #[error(transparent)]
    Command(#[from] CommandParseError),
    #[error(transparent)]
    Environment(#[from] EnvironmentError),
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
    #[error("failed to encode summary: {0}")]
    Json(#[from] serde_json::Error),
}

/// One `--set FIELD=VALUE` override.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Assignment {
    field: EnvironmentField,
    value: f64,
}

fn parse_assignment(s: &str) -> Result<Assignment, CliError> {
    match s.parse::<Command>()? {
        Command::SetEnvironment { field, value } => Ok(Assignment { field, value }),
        _ => Err(CliError::InvalidAssignment(s.to_string())),
    }
}

fn parse_scheduled(s: &str) -> Result<ScheduledCommand, CliError> {
    s.parse()
}

#[derive(Parser, Debug)]
#[command(name = "photosynth")]
#[command(about = "Simulate light-dependent photosynthesis in a leaf")]
struct Cli {
    /// Configuration file (.ron, .toml or .json). Without it, photosynth.{ron,toml,json}
    /// in the working directory is used if present, else the bundled presets
    #[arg(long)]
    config: Option<PathBuf>,

    /// Start from a named scenario preset
    #[arg(long)]
    scenario: Option<String>,

    /// Override an environment input, e.g. `--set light=80` (repeatable)
    #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_assignment)]
    set: Vec<Assignment>,

    /// Apply a command after TICK periods, e.g. `--at 10:pause` (repeatable)
    #[arg(long = "at", value_name = "TICK:COMMAND", value_parser = parse_scheduled)]
    at: Vec<ScheduledCommand>,

    /// Number of timer periods to run
    #[arg(long, default_value = "60")]
    ticks: u64,

    /// Tick on the configured wall-clock period instead of as fast as possible
    #[arg(long)]
    realtime: bool,

    /// Explain the final state in plain language
    #[arg(long)]
    narrate: bool,

    /// Print a JSON summary instead of text
    #[arg(long)]
    json: bool,

    /// List the available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,
}

/// An explicit path wins; otherwise look in `dir`, then fall back to the
/// bundled presets.
fn resolve_config(explicit: Option<&Path>, dir: &Path) -> Result<SimulatorConfig, DataLoadError> {
    if let Some(path) = explicit {
        return load_config(path);
    }
    match load_config_from_dir(dir) {
        Err(DataLoadError::Missing { .. }) => SimulatorConfig::bundled(),
        found => found,
    }
}

/// Build the starting simulation: scenario first, then `--set` overrides.
fn initial_simulation(cli: &Cli, config: &SimulatorConfig) -> Result<Simulation, CliError> {
    let mut simulation = Simulation::new();

    if let Some(name) = &cli.scenario {
        let scenario = config
            .scenario(name)
            .ok_or_else(|| CliError::UnknownScenario {
                name: name.clone(),
                available: config.scenario_names().collect::<Vec<_>>().join(", "),
            })?;
        info!(scenario = %scenario.name, "applying scenario");
        simulation.replace_environment(scenario.environment);
    }

    for assignment in &cli.set {
        simulation.set_environment(assignment.field, assignment.value)?;
    }
    Ok(simulation)
}

async fn run(cli: Cli, config: SimulatorConfig) -> Result<(), CliError> {
    if cli.list_scenarios {
        for scenario in &config.scenarios {
            println!("{:<12} {}", scenario.name, scenario.description);
        }
        return Ok(());
    }

    let simulation = initial_simulation(&cli, &config)?;
    let plan = RunPlan::new(cli.ticks, cli.at.clone());
    let print_rows = !cli.json;

    if print_rows {
        println!("{TABLE_HEADER}");
    }
    let outcome = if cli.realtime {
        info!(
            period_ms = config.tick_period.as_millis() as u64,
            periods = plan.periods,
            "running in real time"
        );
        run_realtime(simulation, &plan, config.tick_period, |report| {
            if print_rows {
                println!("{}", format_row(report));
            }
        })
        .await?
    } else {
        let outcome = run_headless(simulation, &plan)?;
        if print_rows {
            for report in &outcome.reports {
                println!("{}", format_row(report));
            }
        }
        outcome
    };
    info!(
        ticks = outcome.reports.len(),
        total_glucose = outcome.simulation.total_glucose(),
        "run complete"
    );

    let mut summary = RunSummary::new(&outcome.simulation, cli.scenario.clone());
    if cli.narrate {
        let request = NarrationRequest::new(outcome.simulation.environment());
        let narration = consult(&RuleNarrator, &request, config.narration_timeout).await;
        summary = summary.with_narration(narration.text());
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!();
        print!("{}", summary.render_text());
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = resolve_config(cli.config.as_deref(), Path::new("."));

    let fallback = config
        .as_ref()
        .ok()
        .and_then(|c| c.log_filter.clone())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(cli, config).await {
        error!("{e}");
        std::process::exit(1);
    }
}
