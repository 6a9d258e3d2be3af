// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod dispatch;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod report;
pub mod types;

use std::path::Path;

use anyhow::{Result, bail};
use tracing::{debug, info};

use crate::cli::{CliArgs, Command};
use crate::config::loader::load_and_validate;
use crate::config::model::ShopFile;
use crate::dag::cpm::calculate_early_late;
use crate::dispatch::Dispatcher;
use crate::engine::ShiftingBottleneck;
use crate::report::{CpmReport, DispatchTable, ScheduleSummary, render_json};
use crate::types::{DispatchRule, OutputFormat};

/// High-level entry point used by `main.rs`.
///
/// Loads and validates the instance file named by the subcommand, runs the
/// requested analysis and prints its report to stdout.
pub fn run(args: CliArgs) -> Result<()> {
    match args.command {
        Command::Schedule {
            file,
            format,
            parallel,
            dry_run,
        } => run_schedule(&file, format, parallel, dry_run),
        Command::Cpm { file, format } => run_cpm(&file, format),
        Command::Dispatch { file, rule, format } => run_dispatch(&file, rule, format),
    }
}

fn run_schedule(path: &Path, format: OutputFormat, parallel: bool, dry_run: bool) -> Result<()> {
    let cfg = load_and_validate(path)?;
    if cfg.job.is_empty() {
        bail!("{} has no [job.<name>] routing table to schedule", path.display());
    }

    if dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let mut options = cfg.engine_options();
    options.parallel |= parallel;
    info!(jobs = cfg.job.len(), parallel = options.parallel, "starting shifting bottleneck");

    let engine = ShiftingBottleneck::from_routings(&cfg.routings(), options)?;
    let schedule = engine.run()?;

    match format {
        OutputFormat::Text => print!("{}", ScheduleSummary(&schedule)),
        OutputFormat::Json => println!("{}", render_json(&schedule)?),
    }
    Ok(())
}

fn run_cpm(path: &Path, format: OutputFormat) -> Result<()> {
    let cfg = load_and_validate(path)?;
    if cfg.activity.is_empty() {
        bail!("{} has no [activity.<name>] network to analyse", path.display());
    }

    let graph = cfg.project_graph()?;
    let snapshot = calculate_early_late(&graph)?;
    let report = CpmReport::from_snapshot(&snapshot);

    match format {
        OutputFormat::Text => print!("{report}"),
        OutputFormat::Json => println!("{}", render_json(&report)?),
    }
    Ok(())
}

fn run_dispatch(path: &Path, rule: Option<DispatchRule>, format: OutputFormat) -> Result<()> {
    let cfg = load_and_validate(path)?;
    if cfg.item.is_empty() {
        bail!("{} has no [item.<name>] pool to dispatch", path.display());
    }

    let rule = rule.unwrap_or(cfg.config.rule);
    let dispatcher = Dispatcher::for_rule(rule).with_clock_start(cfg.config.clock_start);
    let outcome = dispatcher.sequence(&cfg.dispatch_pool())?;

    match format {
        OutputFormat::Text => print!("{}", DispatchTable(&outcome)),
        OutputFormat::Json => println!("{}", render_json(&outcome)?),
    }
    Ok(())
}

/// Simple dry-run output: print the routing table and config.
fn print_dry_run(cfg: &ShopFile) {
    println!("shopsched dry-run");
    println!("  config.clock_start = {:?}", cfg.config.clock_start);
    println!("  config.parallel = {}", cfg.config.parallel);
    println!();

    println!("jobs ({}):", cfg.job.len());
    for routing in cfg.routings() {
        let steps: Vec<String> = routing
            .steps
            .iter()
            .map(|step| format!("{}({})", step.machine, step.duration))
            .collect();
        println!("  - {}: {}", routing.job, steps.join(" -> "));
    }

    debug!("dry-run complete (nothing scheduled)");
}
