// src/dag/graph.rs

use std::collections::{BTreeSet, HashMap};

use petgraph::Direction;
use petgraph::algo::{has_path_connecting, is_cyclic_directed};
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use serde::Serialize;
use tracing::{debug, trace};

use crate::dag::operation::{JobRouting, MachineId, Operation, OperationId};
use crate::errors::{Result, ShopError};

/// Why a precedence edge exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrecedenceKind {
    /// Given explicitly by the input (`after = [...]` on an activity).
    Declared,
    /// Consecutive visits of the same job.
    Routing,
    /// Consecutive operations of a committed machine sequence.
    Sequencing(MachineId),
}

/// Operations plus the directed precedence edges between them.
///
/// Edge direction: predecessor -> successor. Plain insertion
/// ([`add_precedence`](Self::add_precedence)) only checks that both ends
/// exist, so a graph seeded from external tables can still contain a cycle;
/// the CPM solver reports that as [`ShopError::CycleDetected`]. The checked
/// insertions ([`try_add_precedence`](Self::try_add_precedence) and
/// [`commit_chain`](Self::commit_chain)) reject any edge that would close a
/// cycle, using an incremental reachability query.
#[derive(Debug, Clone, Default)]
pub struct PrecedenceGraph {
    graph: DiGraph<Operation, PrecedenceKind>,
    index: HashMap<OperationId, NodeIndex>,
}

impl PrecedenceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a graph from a routing table: one operation per job visit, each
    /// visit preceded by the job's previous visit.
    pub fn from_routings(routings: &[JobRouting]) -> Result<Self> {
        let mut graph = Self::new();

        for routing in routings {
            let mut previous: Option<OperationId> = None;

            for step in &routing.steps {
                if step.machine.as_str().contains(',') || routing.job.as_str().contains(',') {
                    return Err(ShopError::InvalidOperation {
                        operation: OperationId::for_visit(&step.machine, &routing.job),
                        reason: "machine and job names must not contain ','".to_string(),
                    });
                }
                let op = Operation::visit(step.machine.clone(), routing.job.clone(), step.duration);
                let id = op.id.clone();
                graph.add_operation(op)?;

                if let Some(prev) = previous.take() {
                    graph.add_precedence(&prev, &id, PrecedenceKind::Routing)?;
                }
                previous = Some(id);
            }
        }

        debug!(
            operations = graph.len(),
            precedences = graph.edge_count(),
            "seeded precedence graph from routing table"
        );

        Ok(graph)
    }

    /// Insert a new operation with no edges.
    pub fn add_operation(&mut self, op: Operation) -> Result<()> {
        if op.duration < 0 {
            return Err(ShopError::InvalidOperation {
                operation: op.id,
                reason: format!("duration must be >= 0 (got {})", op.duration),
            });
        }
        if self.index.contains_key(&op.id) {
            return Err(ShopError::DuplicateOperation(op.id));
        }

        let id = op.id.clone();
        let node = self.graph.add_node(op);
        self.index.insert(id, node);
        Ok(())
    }

    /// Add `pred -> succ` without a cycle check.
    ///
    /// Returns `false` if the edge was already present.
    pub fn add_precedence(
        &mut self,
        pred: &OperationId,
        succ: &OperationId,
        kind: PrecedenceKind,
    ) -> Result<bool> {
        let from = self.node_of(pred)?;
        let to = self.node_of(succ)?;

        if self.graph.find_edge(from, to).is_some() {
            return Ok(false);
        }
        self.graph.add_edge(from, to, kind);
        Ok(true)
    }

    /// Add `pred -> succ`, rejecting it if `succ` already reaches `pred`.
    pub fn try_add_precedence(
        &mut self,
        pred: &OperationId,
        succ: &OperationId,
        kind: PrecedenceKind,
    ) -> Result<bool> {
        Ok(self.insert_checked(pred, succ, kind)?.is_some())
    }

    /// Add chain edges between consecutive operations of `sequence`.
    ///
    /// Either every edge is added or none is: on the first edge that would
    /// close a cycle the edges already inserted by this call are removed
    /// again and [`ShopError::CycleRejected`] names the offending edge.
    /// Returns the number of edges actually inserted.
    pub fn commit_chain(&mut self, machine: &MachineId, sequence: &[OperationId]) -> Result<usize> {
        for id in sequence {
            self.node_of(id)?;
        }

        let mut added: Vec<EdgeIndex> = Vec::with_capacity(sequence.len().saturating_sub(1));

        for pair in sequence.windows(2) {
            match self.insert_checked(&pair[0], &pair[1], PrecedenceKind::Sequencing(machine.clone())) {
                Ok(Some(edge)) => added.push(edge),
                Ok(None) => {}
                Err(err) => {
                    // Newest edge is always the last index, so popping in
                    // reverse keeps the remaining indices stable.
                    for edge in added.into_iter().rev() {
                        self.graph.remove_edge(edge);
                    }
                    return Err(err);
                }
            }
        }

        trace!(machine = %machine, edges = added.len(), "committed chain edges");
        Ok(added.len())
    }

    fn insert_checked(
        &mut self,
        pred: &OperationId,
        succ: &OperationId,
        kind: PrecedenceKind,
    ) -> Result<Option<EdgeIndex>> {
        let from = self.node_of(pred)?;
        let to = self.node_of(succ)?;

        if self.graph.find_edge(from, to).is_some() {
            return Ok(None);
        }
        if has_path_connecting(&self.graph, to, from, None) {
            return Err(ShopError::CycleRejected {
                from: pred.clone(),
                to: succ.clone(),
            });
        }
        Ok(Some(self.graph.add_edge(from, to, kind)))
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, id: &OperationId) -> bool {
        self.index.contains_key(id)
    }

    pub fn operation(&self, id: &OperationId) -> Option<&Operation> {
        self.index.get(id).map(|&node| &self.graph[node])
    }

    /// All operations, in insertion order.
    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.graph.node_weights()
    }

    /// Immediate predecessors of an operation, sorted by id.
    pub fn predecessors_of(&self, id: &OperationId) -> Vec<&OperationId> {
        self.neighbors(id, Direction::Incoming)
    }

    /// Immediate successors of an operation, sorted by id.
    pub fn successors_of(&self, id: &OperationId) -> Vec<&OperationId> {
        self.neighbors(id, Direction::Outgoing)
    }

    fn neighbors(&self, id: &OperationId, direction: Direction) -> Vec<&OperationId> {
        let Some(&node) = self.index.get(id) else {
            return Vec::new();
        };
        let mut ids: Vec<&OperationId> = self
            .graph
            .neighbors_directed(node, direction)
            .map(|n| &self.graph[n].id)
            .collect();
        ids.sort();
        ids
    }

    /// Whether `to` is reachable from `from` (an operation reaches itself).
    pub fn has_path(&self, from: &OperationId, to: &OperationId) -> bool {
        match (self.index.get(from), self.index.get(to)) {
            (Some(&a), Some(&b)) => has_path_connecting(&self.graph, a, b, None),
            _ => false,
        }
    }

    pub fn is_acyclic(&self) -> bool {
        !is_cyclic_directed(&self.graph)
    }

    /// Machines referenced by at least one operation, ascending.
    pub fn machines(&self) -> BTreeSet<MachineId> {
        self.graph
            .node_weights()
            .filter_map(|op| op.machine.clone())
            .collect()
    }

    /// Operations bound to `machine`, sorted by id.
    pub fn operations_on(&self, machine: &MachineId) -> Vec<&Operation> {
        let mut ops: Vec<&Operation> = self
            .graph
            .node_weights()
            .filter(|op| op.machine.as_ref() == Some(machine))
            .collect();
        ops.sort_by(|a, b| a.id.cmp(&b.id));
        ops
    }

    pub(crate) fn inner(&self) -> &DiGraph<Operation, PrecedenceKind> {
        &self.graph
    }

    fn node_of(&self, id: &OperationId) -> Result<NodeIndex> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| ShopError::OperationNotFound(id.clone()))
    }
}
