// src/engine/orchestrator.rs

use tracing::{debug, info, warn};

use crate::dag::cpm::calculate_early_late;
use crate::dag::graph::PrecedenceGraph;
use crate::dag::operation::{JobRouting, MachineId, OperationId};
use crate::dispatch::{Dispatcher, EarliestDueDate};
use crate::engine::EngineOptions;
use crate::engine::iteration::{Candidate, IterationReport, ShopSchedule, SkippedMachine};
use crate::engine::machine_state::MachineBook;
use crate::engine::subproblem::{MachineEvaluation, evaluate_machines};
use crate::errors::{Result, ShopError};

/// Shifting Bottleneck state machine.
///
/// Owns the precedence graph. Each [`step`](Self::step) recomputes CPM on
/// the current graph, sequences every unscheduled machine with
/// EDD-with-release, picks the machine with the largest `Lmax` (ties by
/// smallest id) and commits its sequence as chain edges. The loop is
/// finished when every machine is scheduled.
#[derive(Debug)]
pub struct ShiftingBottleneck {
    graph: PrecedenceGraph,
    machines: MachineBook,
    options: EngineOptions,
    iterations: Vec<IterationReport>,
}

impl ShiftingBottleneck {
    pub fn new(graph: PrecedenceGraph, options: EngineOptions) -> Self {
        let machines = MachineBook::new(graph.machines());
        Self {
            graph,
            machines,
            options,
            iterations: Vec::new(),
        }
    }

    pub fn from_routings(routings: &[JobRouting], options: EngineOptions) -> Result<Self> {
        Ok(Self::new(PrecedenceGraph::from_routings(routings)?, options))
    }

    pub fn graph(&self) -> &PrecedenceGraph {
        &self.graph
    }

    pub fn machines(&self) -> &MachineBook {
        &self.machines
    }

    pub fn iterations(&self) -> &[IterationReport] {
        &self.iterations
    }

    pub fn is_complete(&self) -> bool {
        self.machines.is_complete()
    }

    /// Run one iteration. Returns `None` once every machine is scheduled.
    ///
    /// The graph is only mutated by the final commit, so an error leaves it
    /// exactly as it was before the call.
    pub fn step(&mut self) -> Result<Option<IterationReport>> {
        if self.is_complete() {
            return Ok(None);
        }

        let snapshot = calculate_early_late(&self.graph)?;
        let unscheduled = self.machines.unscheduled();
        let dispatcher =
            Dispatcher::new(&EarliestDueDate).with_clock_start(self.options.clock_start);

        let evaluations = evaluate_machines(
            &self.graph,
            &snapshot,
            &unscheduled,
            &dispatcher,
            self.options.parallel,
        );

        let Ranking {
            winner,
            candidates,
            skipped,
        } = rank_evaluations(evaluations)?;

        let chain_edges = self.commit_sequence(&winner.machine, &winner.sequence)?;

        let report = IterationReport {
            iteration: self.iterations.len() + 1,
            makespan_before: snapshot.project_duration(),
            candidates,
            skipped,
            bottleneck: winner.machine,
            sequence: winner.sequence,
            max_lateness: winner.max_lateness,
            chain_edges,
        };

        info!(
            iteration = report.iteration,
            bottleneck = %report.bottleneck,
            lmax = ?report.max_lateness,
            "bottleneck scheduled"
        );

        self.iterations.push(report.clone());
        Ok(Some(report))
    }

    /// Iterate until every machine is scheduled and return the final
    /// schedule.
    pub fn run(mut self) -> Result<ShopSchedule> {
        while self.step()?.is_some() {}

        let snapshot = calculate_early_late(&self.graph)?;
        let critical_path = snapshot.critical_path();
        let makespan = snapshot.project_duration();

        info!(
            iterations = self.iterations.len(),
            makespan,
            "shifting bottleneck finished"
        );

        Ok(ShopSchedule {
            sequences: self.machines.sequences(),
            graph: self.graph,
            snapshot,
            critical_path,
            makespan,
            iterations: self.iterations,
        })
    }

    /// Fix the order of `machine` to `sequence`: add chain edges between
    /// consecutive operations and mark the machine scheduled.
    ///
    /// Either all chain edges are added or none. An edge that would close a
    /// cycle is reported as [`ShopError::InvariantViolation`].
    pub fn commit_sequence(&mut self, machine: &MachineId, sequence: &[OperationId]) -> Result<usize> {
        self.machines.ensure_unscheduled(machine)?;

        for id in sequence {
            let op = self
                .graph
                .operation(id)
                .ok_or_else(|| ShopError::OperationNotFound(id.clone()))?;
            if op.machine.as_ref() != Some(machine) {
                return Err(ShopError::InvalidOperation {
                    operation: id.clone(),
                    reason: format!("not processed on machine '{machine}'"),
                });
            }
        }

        let added = self
            .graph
            .commit_chain(machine, sequence)
            .map_err(|err| match err {
                ShopError::CycleRejected { from, to } => ShopError::InvariantViolation {
                    bottleneck: machine.clone(),
                    sequence: sequence.to_vec(),
                    edge: (from, to),
                },
                other => other,
            })?;

        self.machines.mark_scheduled(machine, sequence.to_vec())?;
        debug!(machine = %machine, edges = added, "committed machine sequence");
        Ok(added)
    }
}

/// Evaluations of one iteration split into candidates and skipped machines,
/// with the selected bottleneck.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ranking {
    pub winner: Candidate,
    pub candidates: Vec<Candidate>,
    pub skipped: Vec<SkippedMachine>,
}

/// Separate usable machines from rejected subproblems and pick the
/// bottleneck.
///
/// A machine whose subproblem is invalid is only skipped; any other error
/// is returned as is. When no machine is left to choose from the iteration
/// cannot make progress and [`ShopError::Stalled`] names the skipped ones.
pub fn rank_evaluations(evaluations: Vec<MachineEvaluation>) -> Result<Ranking> {
    let mut candidates = Vec::with_capacity(evaluations.len());
    let mut skipped = Vec::new();

    for evaluation in evaluations {
        match evaluation.result {
            Ok(outcome) => candidates.push(Candidate {
                machine: evaluation.machine,
                max_lateness: outcome.max_lateness,
                sequence: outcome.sequence,
            }),
            Err(err @ ShopError::InvalidSubproblem { .. }) => {
                warn!(machine = %evaluation.machine, error = %err, "skipping machine this iteration");
                skipped.push(SkippedMachine {
                    machine: evaluation.machine,
                    reason: err.to_string(),
                });
            }
            Err(err) => return Err(err),
        }
    }

    let Some(winner) = select_bottleneck(&candidates).cloned() else {
        return Err(ShopError::Stalled(
            skipped.into_iter().map(|s| s.machine).collect(),
        ));
    };

    Ok(Ranking {
        winner,
        candidates,
        skipped,
    })
}

/// Candidate with the largest `Lmax`; ties go to the smallest machine id.
/// A machine without operations (`Lmax = None`) ranks below any other.
pub fn select_bottleneck(candidates: &[Candidate]) -> Option<&Candidate> {
    candidates.iter().max_by(|a, b| {
        a.max_lateness
            .cmp(&b.max_lateness)
            .then_with(|| b.machine.cmp(&a.machine))
    })
}
