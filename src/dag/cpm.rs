// src/dag/cpm.rs

//! Critical Path Method over a [`PrecedenceGraph`].
//!
//! The forward pass resolves operations once every predecessor is resolved
//! and assigns early start / early finish; the backward pass does the same
//! against successors and assigns late finish / late start. Both passes
//! stop with [`ShopError::CycleDetected`] when no operation becomes ready
//! while some are still unresolved. The graph is only read.

use std::collections::{BTreeMap, VecDeque};

use petgraph::Direction;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use tracing::{debug, trace};

use crate::dag::graph::{PrecedenceGraph, PrecedenceKind};
use crate::dag::operation::{MachineId, Operation, OperationId};
use crate::errors::{Result, ShopError};
use crate::types::Time;

/// CPM timing of one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OperationTiming {
    pub duration: Time,
    pub early_start: Time,
    pub early_finish: Time,
    pub late_start: Time,
    pub late_finish: Time,
}

impl OperationTiming {
    /// `late_start - early_start` (equal to `late_finish - early_finish`).
    pub fn slack(&self) -> Time {
        self.late_start - self.early_start
    }

    pub fn is_critical(&self) -> bool {
        self.slack() == 0
    }
}

/// Timing of every operation of a graph, recomputed from scratch on each
/// CPM run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScheduleSnapshot {
    timings: BTreeMap<OperationId, OperationTiming>,
    project_duration: Time,
    /// Position of each operation in the forward resolution order.
    #[serde(skip)]
    forward_rank: BTreeMap<OperationId, usize>,
}

impl ScheduleSnapshot {
    /// Snapshot from precomputed timings.
    ///
    /// The project duration is the largest early finish. Forward ranks follow
    /// ascending early start, ties by id, which is a valid resolution order
    /// whenever every predecessor starts no later than its successors.
    pub fn from_timings(timings: impl IntoIterator<Item = (OperationId, OperationTiming)>) -> Self {
        let timings: BTreeMap<OperationId, OperationTiming> = timings.into_iter().collect();
        let project_duration = timings.values().map(|t| t.early_finish).max().unwrap_or(0);

        let mut order: Vec<(Time, &OperationId)> =
            timings.iter().map(|(id, t)| (t.early_start, id)).collect();
        order.sort();
        let forward_rank = order
            .into_iter()
            .enumerate()
            .map(|(rank, (_, id))| (id.clone(), rank))
            .collect();

        Self {
            timings,
            project_duration,
            forward_rank,
        }
    }

    pub fn get(&self, id: &OperationId) -> Option<&OperationTiming> {
        self.timings.get(id)
    }

    /// Timings in ascending operation id order.
    pub fn iter(&self) -> impl Iterator<Item = (&OperationId, &OperationTiming)> {
        self.timings.iter()
    }

    pub fn len(&self) -> usize {
        self.timings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timings.is_empty()
    }

    /// Largest early finish over all operations (0 for an empty graph).
    pub fn project_duration(&self) -> Time {
        self.project_duration
    }

    /// Zero-slack operations, sorted by id.
    pub fn critical_path(&self) -> Vec<OperationId> {
        self.timings
            .iter()
            .filter(|(_, timing)| timing.is_critical())
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Position of `id` in the forward pass. An operation always ranks below
    /// everything it reaches.
    pub fn forward_rank(&self, id: &OperationId) -> Option<usize> {
        self.forward_rank.get(id).copied()
    }

    /// Operations on `machine` ordered by early start, ties by id.
    pub fn sequence_on(&self, graph: &PrecedenceGraph, machine: &MachineId) -> Vec<OperationId> {
        let mut ops: Vec<(Time, &OperationId)> = graph
            .operations_on(machine)
            .into_iter()
            .filter_map(|op| self.timings.get(&op.id).map(|t| (t.early_start, &op.id)))
            .collect();
        ops.sort();
        ops.into_iter().map(|(_, id)| id.clone()).collect()
    }
}

/// Run the forward and backward passes over `graph`.
pub fn calculate_early_late(graph: &PrecedenceGraph) -> Result<ScheduleSnapshot> {
    let inner = graph.inner();
    let count = inner.node_count();

    let forward = resolution_order(inner, Direction::Incoming)?;

    let mut early_start: Vec<Time> = vec![0; count];
    let mut early_finish: Vec<Time> = vec![0; count];

    for &node in &forward {
        let es = inner
            .neighbors_directed(node, Direction::Incoming)
            .map(|pred| early_finish[pred.index()])
            .max()
            .unwrap_or(0);
        let ef = es
            .checked_add(inner[node].duration)
            .ok_or_else(|| ShopError::InvalidOperation {
                operation: inner[node].id.clone(),
                reason: format!("early finish {es} + {} overflows", inner[node].duration),
            })?;
        early_start[node.index()] = es;
        early_finish[node.index()] = ef;
    }

    let project_duration = early_finish.iter().copied().max().unwrap_or(0);
    trace!(project_duration, "cpm forward pass complete");

    let backward = resolution_order(inner, Direction::Outgoing)?;

    let mut late_start: Vec<Time> = vec![0; count];
    let mut late_finish: Vec<Time> = vec![0; count];

    for &node in &backward {
        let lf = inner
            .neighbors_directed(node, Direction::Outgoing)
            .map(|succ| late_start[succ.index()])
            .min()
            .unwrap_or(project_duration);
        late_finish[node.index()] = lf;
        late_start[node.index()] = lf - inner[node].duration;
    }

    let timings = inner
        .node_indices()
        .map(|node| {
            let i = node.index();
            (
                inner[node].id.clone(),
                OperationTiming {
                    duration: inner[node].duration,
                    early_start: early_start[i],
                    early_finish: early_finish[i],
                    late_start: late_start[i],
                    late_finish: late_finish[i],
                },
            )
        })
        .collect();

    let forward_rank = forward
        .iter()
        .enumerate()
        .map(|(rank, &node)| (inner[node].id.clone(), rank))
        .collect();

    debug!(operations = count, project_duration, "cpm pass complete");

    Ok(ScheduleSnapshot {
        timings,
        project_duration,
        forward_rank,
    })
}

/// Order in which operations become ready when waiting on neighbours in
/// `waits_on` (`Incoming` = predecessors, `Outgoing` = successors).
fn resolution_order(
    graph: &DiGraph<Operation, PrecedenceKind>,
    waits_on: Direction,
) -> Result<Vec<NodeIndex>> {
    let mut unresolved: Vec<usize> = graph
        .node_indices()
        .map(|node| graph.neighbors_directed(node, waits_on).count())
        .collect();

    let mut ready: VecDeque<NodeIndex> = graph
        .node_indices()
        .filter(|node| unresolved[node.index()] == 0)
        .collect();

    let mut order = Vec::with_capacity(graph.node_count());

    while let Some(node) = ready.pop_front() {
        order.push(node);
        for next in graph.neighbors_directed(node, waits_on.opposite()) {
            let remaining = &mut unresolved[next.index()];
            *remaining -= 1;
            if *remaining == 0 {
                ready.push_back(next);
            }
        }
    }

    if order.len() < graph.node_count() {
        return Err(cycle_error(graph));
    }

    Ok(order)
}

fn cycle_error(graph: &DiGraph<Operation, PrecedenceKind>) -> ShopError {
    let mut cycle: Vec<OperationId> = tarjan_scc(graph)
        .into_iter()
        .filter(|component| match component.as_slice() {
            [single] => graph.find_edge(*single, *single).is_some(),
            _ => true,
        })
        .map(|component| {
            let mut ids: Vec<OperationId> =
                component.into_iter().map(|node| graph[node].id.clone()).collect();
            ids.sort();
            ids
        })
        .min()
        .unwrap_or_default();

    // An unresolved pass always leaves a non-trivial component behind.
    if cycle.is_empty() {
        cycle = graph.node_weights().map(|op| op.id.clone()).collect();
        cycle.sort();
    }

    let operation = cycle
        .first()
        .cloned()
        .unwrap_or_else(|| OperationId::new("<empty>"));

    ShopError::CycleDetected { operation, cycle }
}
