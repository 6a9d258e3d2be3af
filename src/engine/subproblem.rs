// src/engine/subproblem.rs

//! Per-machine dispatch subproblems.
//!
//! For an unscheduled machine every operation becomes a dispatch item with
//! duration `EF - ES`, release `ES` and due date `LF` taken from the current
//! CPM snapshot. Equal due dates fall back to the forward-pass rank, so the
//! sequence never contradicts a path already in the graph. Evaluations of different machines only read the graph and
//! the snapshot, so they can run on the rayon pool.

use rayon::prelude::*;
use tracing::debug;

use crate::dag::cpm::ScheduleSnapshot;
use crate::dag::graph::PrecedenceGraph;
use crate::dag::operation::MachineId;
use crate::dispatch::{DispatchItem, DispatchOutcome, Dispatcher};
use crate::errors::{Result, ShopError};

/// Dispatch result for one machine.
#[derive(Debug)]
pub struct MachineEvaluation {
    pub machine: MachineId,
    pub result: Result<DispatchOutcome>,
}

pub fn build_subproblem(
    graph: &PrecedenceGraph,
    snapshot: &ScheduleSnapshot,
    machine: &MachineId,
) -> Result<Vec<DispatchItem>> {
    graph
        .operations_on(machine)
        .into_iter()
        .map(|op| {
            let missing = || ShopError::OperationNotFound(op.id.clone());
            let timing = snapshot.get(&op.id).ok_or_else(missing)?;
            let rank = snapshot.forward_rank(&op.id).ok_or_else(missing)?;
            Ok(DispatchItem::new(
                op.id.clone(),
                timing.early_finish - timing.early_start,
                timing.early_start,
                timing.late_finish,
            )
            .with_precedence_rank(rank))
        })
        .collect()
}

pub fn evaluate_machine(
    graph: &PrecedenceGraph,
    snapshot: &ScheduleSnapshot,
    machine: &MachineId,
    dispatcher: &Dispatcher<'_>,
) -> MachineEvaluation {
    let result = build_subproblem(graph, snapshot, machine)
        .and_then(|pool| dispatcher.sequence(&pool));

    if let Ok(outcome) = &result {
        debug!(
            machine = %machine,
            max_lateness = ?outcome.max_lateness,
            sequence = ?outcome.sequence,
            "evaluated machine"
        );
    }

    MachineEvaluation {
        machine: machine.clone(),
        result,
    }
}

/// Evaluate `machines`, returning results in the same order.
pub fn evaluate_machines(
    graph: &PrecedenceGraph,
    snapshot: &ScheduleSnapshot,
    machines: &[MachineId],
    dispatcher: &Dispatcher<'_>,
    parallel: bool,
) -> Vec<MachineEvaluation> {
    let eval = |machine: &MachineId| evaluate_machine(graph, snapshot, machine, dispatcher);

    if parallel {
        machines.par_iter().map(eval).collect()
    } else {
        machines.iter().map(eval).collect()
    }
}
