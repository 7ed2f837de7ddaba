//! rso CLI — operator harness over the scheduling engine library crates.
//!
//! Thin by design (§10.4): no HTTP surface, no persistence beyond the
//! in-memory store a single invocation builds and discards. `check`
//! validates a project fixture, `schedule` runs the full baseline solve
//! and resource assignment, `event` replays one execution event against a
//! freshly-baselined schedule.

mod config;
mod diagnostics;
mod event_io;
mod fixture;
mod report;

use anyhow::Context;
use clap::{Parser, Subcommand};
use rso_core::{InMemoryStore, SchedulingError};
use rso_solver::SolveOutcome;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::EngineConfig;

#[derive(Parser)]
#[command(name = "rso")]
#[command(author, version, about = "Construction project scheduling engine", long_about = None)]
struct Cli {
    /// Path to a TOML config file overriding built-in defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the calendar horizon, in working days.
    #[arg(long, global = true, env = "RSO_HORIZON_DAYS")]
    horizon_days: Option<i64>,

    /// Override the solver's wall-clock time cap, in seconds.
    #[arg(long, global = true, env = "RSO_SOLVER_TIMEOUT_SECS")]
    solver_timeout_secs: Option<u64>,

    /// Override the short-break threshold, in minutes.
    #[arg(long, global = true, env = "RSO_SHORT_BREAK_MINUTES")]
    short_break_minutes: Option<i64>,

    /// Override the cumulative-break threshold, in minutes.
    #[arg(long, global = true, env = "RSO_CUMULATIVE_BREAK_MINUTES")]
    cumulative_break_minutes: Option<i64>,

    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a project fixture: cycle detection and capacity sanity checks.
    Check {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(short, long, default_value = "text")]
        format: String,
        /// Escalate warnings to errors.
        #[arg(long)]
        strict: bool,
    },
    /// Run the baseline solve (C2→C3→C4→C5→C6) and print the schedule.
    Schedule {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Apply one execution event against a freshly-baselined schedule.
    Event {
        /// Project fixture the baseline schedule is built from.
        #[arg(long, value_name = "FILE")]
        project: PathBuf,
        /// Event record (§6 JSON shape) to apply.
        #[arg(long, value_name = "FILE")]
        event: PathBuf,
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let result = match &cli.command {
        Commands::Check { file, format, strict } => cmd_check(&cli, file, format, *strict),
        Commands::Schedule { file, format } => cmd_schedule(&cli, file, format),
        Commands::Event { project, event, format } => cmd_event(&cli, project, event, format),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            tracing::error!("{err:?}");
            eprintln!("error: {err:?}");
            ExitCode::FAILURE
        }
    }
}

fn resolved_config(cli: &Cli) -> anyhow::Result<EngineConfig> {
    let mut config = EngineConfig::load(cli.config.as_deref())?;
    if let Some(v) = cli.horizon_days {
        config.horizon_days = v;
    }
    if let Some(v) = cli.solver_timeout_secs {
        config.solver_timeout_secs = v;
    }
    if let Some(v) = cli.short_break_minutes {
        config.short_break_threshold_minutes = v;
    }
    if let Some(v) = cli.cumulative_break_minutes {
        config.cumulative_break_threshold_minutes = v;
    }
    Ok(config)
}

/// Returns `Ok(true)` on success, `Ok(false)` to exit non-zero without an
/// error message (diagnostics already printed), `Err` for unexpected failure.
fn cmd_check(_cli: &Cli, file: &std::path::Path, format: &str, strict: bool) -> anyhow::Result<bool> {
    let fixture = fixture::load_fixture(file)?;
    let store = InMemoryStore::new();
    fixture::seed_store(&store, fixture);

    let diagnostics = diagnostics::run_check(&store, strict).context("check failed")?;
    match format {
        "json" => {
            let out = serde_json::json!({ "diagnostics": diagnostics });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        _ => {
            for diag in &diagnostics {
                eprintln!("{diag}");
            }
            if diagnostics.is_empty() {
                eprintln!("Checked '{}': no issues found", file.display());
            }
        }
    }
    Ok(!diagnostics::has_errors(&diagnostics))
}

fn cmd_schedule(cli: &Cli, file: &std::path::Path, format: &str) -> anyhow::Result<bool> {
    let config = resolved_config(cli)?;
    let fixture = fixture::load_fixture(file)?;
    let calendar = config.calendar(fixture.start);
    let store = InMemoryStore::new();
    fixture::seed_store(&store, fixture);

    let outcome = run_baseline(&store, &calendar, &config)?;
    if !matches!(outcome, SolveOutcome::Optimal(_) | SolveOutcome::Feasible(_)) {
        eprintln!("Failed to generate schedule: {outcome:?}");
        return Ok(false);
    }

    let assignment = rso_assign::assign_all(&store, true).context("resource assignment failed")?;
    if !assignment.skipped.is_empty() {
        for (task_id, group) in &assignment.skipped {
            tracing::warn!(task_id, group, "no candidate available");
        }
    }

    let report = match format {
        "json" => report::format_json(&store, &calendar)?,
        _ => report::format_text(&store, &calendar)?,
    };
    println!("{report}");
    Ok(true)
}

fn cmd_event(
    cli: &Cli,
    project: &std::path::Path,
    event_path: &std::path::Path,
    format: &str,
) -> anyhow::Result<bool> {
    let config = resolved_config(cli)?;
    let fixture = fixture::load_fixture(project)?;
    let calendar = config.calendar(fixture.start);
    let store = InMemoryStore::new();
    fixture::seed_store(&store, fixture);

    let outcome = run_baseline(&store, &calendar, &config)?;
    if !matches!(outcome, SolveOutcome::Optimal(_) | SolveOutcome::Feasible(_)) {
        eprintln!("Failed to generate baseline schedule: {outcome:?}");
        return Ok(false);
    }
    rso_assign::assign_all(&store, true).context("resource assignment failed")?;

    let event = event_io::load_event(event_path)?;
    let task_id = event.task_id.clone();
    let reschedule_config = config.reschedule();
    let result = match rso_reschedule::handle_event(&store, &calendar, &reschedule_config, event) {
        Ok(result) => result,
        Err(SchedulingError::InvalidEventTransition { task_id, event, from_state }) => {
            eprintln!("event `{event}` is not valid from state `{from_state}` for task {task_id}");
            return Ok(false);
        }
        Err(err) => return Err(err.into()),
    };

    match format {
        "json" => {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "task_id": task_id,
                    "new_status": result.new_status.map(|s| s.to_string()),
                    "rescheduled_count": result.rescheduled.len(),
                    "blocked": result.blocked,
                    "unblocked": result.unblocked,
                    "conflict_resolutions": result.conflict_resolutions.len(),
                    "full_reschedule_ran": result.full_reschedule.is_some(),
                    "warnings": result.warnings.iter().map(|w| w.to_string()).collect::<Vec<_>>(),
                }))?
            );
        }
        _ => {
            println!("Event applied to task {task_id}");
            if let Some(status) = result.new_status {
                println!("  new status: {status}");
            }
            if !result.rescheduled.is_empty() {
                println!("  cascaded {} dependent task(s)", result.rescheduled.len());
            }
            if !result.blocked.is_empty() {
                println!("  blocked: {}", result.blocked.join(", "));
            }
            if !result.unblocked.is_empty() {
                println!("  unblocked: {}", result.unblocked.join(", "));
            }
            if !result.conflict_resolutions.is_empty() {
                println!("  resolved {} resource conflict(s)", result.conflict_resolutions.len());
            }
            if result.full_reschedule.is_some() {
                println!("  triggered a full reschedule");
            }
            for warning in &result.warnings {
                println!("  warning: {warning}");
            }
        }
    }
    Ok(true)
}

fn run_baseline(
    store: &InMemoryStore,
    calendar: &rso_core::CalendarConfig,
    config: &EngineConfig,
) -> anyhow::Result<SolveOutcome> {
    rso_reschedule::full_reschedule(store, calendar, config.solver_timeout())
        .context("baseline solve failed")
}
