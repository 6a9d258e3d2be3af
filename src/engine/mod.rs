// src/engine/mod.rs

//! Shifting Bottleneck orchestration.
//!
//! This module ties together:
//! - the per-machine state book ([`machine_state`])
//! - dispatch subproblem extraction from a CPM snapshot ([`subproblem`])
//! - the iteration loop that picks a bottleneck and commits its sequence
//!   as chain edges ([`orchestrator`])
//! - per-iteration diagnostics and the terminal schedule ([`iteration`])

use crate::types::ClockStart;

pub mod iteration;
pub mod machine_state;
pub mod orchestrator;
pub mod subproblem;

pub use iteration::{Candidate, IterationReport, ShopSchedule, SkippedMachine};
pub use machine_state::{MachineBook, MachineState};
pub use orchestrator::{Ranking, ShiftingBottleneck, rank_evaluations, select_bottleneck};
pub use subproblem::{MachineEvaluation, build_subproblem, evaluate_machine, evaluate_machines};

/// Options shared by every iteration of the orchestrator.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineOptions {
    /// Evaluate unscheduled machines on the rayon thread pool.
    pub parallel: bool,
    /// Clock start handed to the per-machine dispatcher.
    pub clock_start: ClockStart,
}
