// src/dag/operation.rs

//! Identifiers and the operation record stored in the precedence graph.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::Time;

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

opaque_id!(
    /// Identifier of a single-capacity resource ("machine").
    MachineId
);

opaque_id!(
    /// Identifier of a job in the routing table.
    JobId
);

opaque_id!(
    /// Opaque operation identifier.
    ///
    /// Operations seeded from a routing table are named `"<machine>,<job>"`;
    /// free-standing project activities and dispatch items keep whatever
    /// name the input gave them. Ordering is plain string ordering and is
    /// used for every deterministic tie-break.
    OperationId
);

impl OperationId {
    /// Identifier of a job's visit to a machine.
    pub fn for_visit(machine: &MachineId, job: &JobId) -> Self {
        Self(format!("{machine},{job}"))
    }
}

/// One unit of work: a node of the precedence graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Operation {
    pub id: OperationId,
    pub duration: Time,
    /// Resource this operation occupies, if it came from a routing table.
    pub machine: Option<MachineId>,
    /// Job this operation belongs to, if it came from a routing table.
    pub job: Option<JobId>,
}

impl Operation {
    /// A free-standing activity that is not bound to a machine.
    pub fn activity(id: impl Into<OperationId>, duration: Time) -> Self {
        Self {
            id: id.into(),
            duration,
            machine: None,
            job: None,
        }
    }

    /// A job's visit to a machine.
    pub fn visit(machine: MachineId, job: JobId, duration: Time) -> Self {
        Self {
            id: OperationId::for_visit(&machine, &job),
            duration,
            machine: Some(machine),
            job: Some(job),
        }
    }
}

/// One step of a job's route: which machine, for how long.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingStep {
    pub machine: MachineId,
    pub duration: Time,
}

impl RoutingStep {
    pub fn new(machine: impl Into<MachineId>, duration: Time) -> Self {
        Self {
            machine: machine.into(),
            duration,
        }
    }
}

/// A row of the routing table: a job and its ordered machine visits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobRouting {
    pub job: JobId,
    pub steps: Vec<RoutingStep>,
}

impl JobRouting {
    pub fn new(job: impl Into<JobId>, steps: Vec<RoutingStep>) -> Self {
        Self {
            job: job.into(),
            steps,
        }
    }
}
