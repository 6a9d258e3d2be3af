// src/engine/iteration.rs

//! Per-iteration diagnostics and the terminal schedule.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::dag::cpm::{OperationTiming, ScheduleSnapshot};
use crate::dag::graph::PrecedenceGraph;
use crate::dag::operation::{MachineId, OperationId};
use crate::types::Time;

/// Dispatch result of one machine considered for bottleneck selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub machine: MachineId,
    /// `None` when the machine has no operations to sequence.
    pub max_lateness: Option<Time>,
    pub sequence: Vec<OperationId>,
}

/// Machine whose subproblem was rejected in an iteration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedMachine {
    pub machine: MachineId,
    pub reason: String,
}

/// What happened in one orchestrator iteration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IterationReport {
    /// 1-based.
    pub iteration: usize,
    /// Snapshot makespan the subproblems were built from.
    pub makespan_before: Time,
    pub candidates: Vec<Candidate>,
    pub skipped: Vec<SkippedMachine>,
    pub bottleneck: MachineId,
    pub sequence: Vec<OperationId>,
    pub max_lateness: Option<Time>,
    /// Chain edges newly added to the graph by the commit.
    pub chain_edges: usize,
}

/// Complete multi-machine schedule: the final graph, its CPM snapshot and
/// the committed sequence of every machine.
#[derive(Debug, Clone, Serialize)]
pub struct ShopSchedule {
    #[serde(skip)]
    pub graph: PrecedenceGraph,
    pub snapshot: ScheduleSnapshot,
    pub sequences: BTreeMap<MachineId, Vec<OperationId>>,
    pub critical_path: Vec<OperationId>,
    pub makespan: Time,
    pub iterations: Vec<IterationReport>,
}

impl ShopSchedule {
    pub fn sequence_of(&self, machine: &MachineId) -> Option<&[OperationId]> {
        self.sequences.get(machine).map(Vec::as_slice)
    }

    pub fn timing(&self, id: &OperationId) -> Option<&OperationTiming> {
        self.snapshot.get(id)
    }

    /// Bottlenecks in the order they were chosen.
    pub fn bottleneck_order(&self) -> Vec<&MachineId> {
        self.iterations.iter().map(|it| &it.bottleneck).collect()
    }
}
