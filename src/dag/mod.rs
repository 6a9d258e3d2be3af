// src/dag/mod.rs

//! Precedence network and critical-path analysis.
//!
//! - [`operation`] defines identifiers, operations and routing rows.
//! - [`graph`] holds the precedence graph with validated edge insertion.
//! - [`cpm`] computes early/late times, slack and the critical path.

pub mod cpm;
pub mod graph;
pub mod operation;

pub use cpm::{OperationTiming, ScheduleSnapshot, calculate_early_late};
pub use graph::{PrecedenceGraph, PrecedenceKind};
pub use operation::{JobId, JobRouting, MachineId, Operation, OperationId, RoutingStep};
