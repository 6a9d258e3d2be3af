// src/engine/machine_state.rs

use std::collections::BTreeMap;

use anyhow::anyhow;
use serde::Serialize;
use tracing::debug;

use crate::dag::operation::{MachineId, OperationId};
use crate::errors::{Result, ShopError};

/// Lifecycle of one machine inside the orchestrator.
///
/// A machine moves from `Unscheduled` to `Scheduled` exactly once and is
/// never re-opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "sequence", rename_all = "snake_case")]
pub enum MachineState {
    Unscheduled,
    Scheduled(Vec<OperationId>),
}

impl MachineState {
    pub fn is_scheduled(&self) -> bool {
        matches!(self, MachineState::Scheduled(_))
    }

    pub fn sequence(&self) -> Option<&[OperationId]> {
        match self {
            MachineState::Unscheduled => None,
            MachineState::Scheduled(seq) => Some(seq),
        }
    }
}

/// State of every machine, keyed (and iterated) by ascending machine id.
#[derive(Debug, Clone, Default)]
pub struct MachineBook {
    states: BTreeMap<MachineId, MachineState>,
}

impl MachineBook {
    pub fn new<I>(machines: I) -> Self
    where
        I: IntoIterator<Item = MachineId>,
    {
        Self {
            states: machines
                .into_iter()
                .map(|m| (m, MachineState::Unscheduled))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn state(&self, machine: &MachineId) -> Option<&MachineState> {
        self.states.get(machine)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MachineId, &MachineState)> {
        self.states.iter()
    }

    /// Machines still waiting for a sequence, ascending.
    pub fn unscheduled(&self) -> Vec<MachineId> {
        self.states
            .iter()
            .filter(|(_, state)| !state.is_scheduled())
            .map(|(m, _)| m.clone())
            .collect()
    }

    /// True once every machine has a committed sequence.
    pub fn is_complete(&self) -> bool {
        self.states.values().all(MachineState::is_scheduled)
    }

    /// Ensure `machine` exists and is still open for a sequence.
    pub fn ensure_unscheduled(&self, machine: &MachineId) -> Result<()> {
        match self.states.get(machine) {
            None => Err(ShopError::Other(anyhow!("unknown machine '{machine}'"))),
            Some(MachineState::Scheduled(_)) => Err(ShopError::Other(anyhow!(
                "machine '{machine}' is already scheduled"
            ))),
            Some(MachineState::Unscheduled) => Ok(()),
        }
    }

    pub fn mark_scheduled(&mut self, machine: &MachineId, sequence: Vec<OperationId>) -> Result<()> {
        self.ensure_unscheduled(machine)?;
        debug!(machine = %machine, ops = sequence.len(), "machine marked Scheduled");
        self.states
            .insert(machine.clone(), MachineState::Scheduled(sequence));
        Ok(())
    }

    /// Committed sequences of the scheduled machines.
    pub fn sequences(&self) -> BTreeMap<MachineId, Vec<OperationId>> {
        self.states
            .iter()
            .filter_map(|(m, state)| state.sequence().map(|seq| (m.clone(), seq.to_vec())))
            .collect()
    }
}
