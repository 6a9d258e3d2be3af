// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::dag::operation::{MachineId, OperationId};

#[derive(Error, Debug)]
pub enum ShopError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON encoding error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Operation not found: {0}")]
    OperationNotFound(OperationId),

    #[error("Duplicate operation: {0}")]
    DuplicateOperation(OperationId),

    #[error("Invalid operation '{operation}': {reason}")]
    InvalidOperation {
        operation: OperationId,
        reason: String,
    },

    /// The precedence graph is not a DAG. `operation` is the smallest id on
    /// the offending cycle, `cycle` lists every operation of that component.
    #[error("Cycle detected in precedence graph involving operation '{operation}' (component: {cycle:?})")]
    CycleDetected {
        operation: OperationId,
        cycle: Vec<OperationId>,
    },

    #[error("Precedence '{from}' -> '{to}' rejected: it would close a cycle")]
    CycleRejected { from: OperationId, to: OperationId },

    #[error("Invalid subproblem at item '{item}': {reason}")]
    InvalidSubproblem { item: OperationId, reason: String },

    #[error(
        "Invariant violation committing bottleneck '{bottleneck}': edge '{}' -> '{}' closes a cycle (sequence: {sequence:?})",
        .edge.0,
        .edge.1
    )]
    InvariantViolation {
        bottleneck: MachineId,
        sequence: Vec<OperationId>,
        edge: (OperationId, OperationId),
    },

    #[error("No bottleneck could be selected; every remaining machine was skipped: {0:?}")]
    Stalled(Vec<MachineId>),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ShopError>;
