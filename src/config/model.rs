// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::dag::graph::{PrecedenceGraph, PrecedenceKind};
use crate::dag::operation::{JobId, JobRouting, MachineId, Operation, OperationId, RoutingStep};
use crate::dispatch::DispatchItem;
use crate::engine::EngineOptions;
use crate::errors::Result;
use crate::types::{ClockStart, DispatchRule, Time};

/// Instance file as read from TOML, before validation.
///
/// ```toml
/// [config]
/// rule = "edd"
///
/// [job.J1]
/// routing = [ { machine = "M1", duration = 3 }, { machine = "M2", duration = 2 } ]
///
/// [activity.B]
/// duration = 3
/// after = ["A"]
///
/// [item.X]
/// duration = 3
/// release = 0
/// due = 5
/// ```
///
/// All sections are optional, but at least one of `job`, `activity` and
/// `item` must be present for the file to validate.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawShopFile {
    #[serde(default)]
    pub config: ConfigSection,

    /// Routing table from `[job.<name>]`.
    #[serde(default)]
    pub job: BTreeMap<String, JobConfig>,

    /// Project network from `[activity.<name>]`.
    #[serde(default)]
    pub activity: BTreeMap<String, ActivityConfig>,

    /// Dispatch pool from `[item.<name>]`.
    #[serde(default)]
    pub item: BTreeMap<String, ItemConfig>,
}

/// `[config]` section.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ConfigSection {
    /// Rule used by the stand-alone dispatcher. The shifting bottleneck
    /// loop always dispatches with EDD.
    #[serde(default)]
    pub rule: DispatchRule,

    #[serde(default)]
    pub clock_start: ClockStart,

    /// Evaluate unscheduled machines concurrently.
    #[serde(default)]
    pub parallel: bool,
}

/// `[job.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct JobConfig {
    /// Machine visits in processing order.
    pub routing: Vec<RoutingStepConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoutingStepConfig {
    pub machine: String,
    pub duration: Time,
}

/// `[activity.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ActivityConfig {
    pub duration: Time,

    /// Activities that must finish before this one starts.
    #[serde(default)]
    pub after: Vec<String>,
}

/// `[item.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemConfig {
    pub duration: Time,
    #[serde(default)]
    pub release: Time,
    pub due: Time,
    #[serde(default = "default_weight")]
    pub weight: Time,
}

fn default_weight() -> Time {
    1
}

/// Validated instance file. Built through `TryFrom<RawShopFile>`.
#[derive(Debug, Clone)]
pub struct ShopFile {
    pub config: ConfigSection,
    pub job: BTreeMap<String, JobConfig>,
    pub activity: BTreeMap<String, ActivityConfig>,
    pub item: BTreeMap<String, ItemConfig>,
}

impl ShopFile {
    pub(crate) fn new_unchecked(raw: RawShopFile) -> Self {
        Self {
            config: raw.config,
            job: raw.job,
            activity: raw.activity,
            item: raw.item,
        }
    }

    /// Routing table, one row per job in ascending job name order.
    pub fn routings(&self) -> Vec<JobRouting> {
        self.job
            .iter()
            .map(|(name, job)| {
                JobRouting::new(
                    JobId::from(name.as_str()),
                    job.routing
                        .iter()
                        .map(|step| {
                            RoutingStep::new(MachineId::from(step.machine.trim()), step.duration)
                        })
                        .collect(),
                )
            })
            .collect()
    }

    /// Precedence graph of the `[activity.*]` network.
    pub fn project_graph(&self) -> Result<PrecedenceGraph> {
        let mut graph = PrecedenceGraph::new();

        for (name, activity) in &self.activity {
            graph.add_operation(Operation::activity(name.as_str(), activity.duration))?;
        }
        for (name, activity) in &self.activity {
            let succ = OperationId::from(name.as_str());
            for dep in &activity.after {
                graph.add_precedence(&OperationId::from(dep.as_str()), &succ, PrecedenceKind::Declared)?;
            }
        }

        Ok(graph)
    }

    /// Dispatch pool of the `[item.*]` section, in ascending item order.
    pub fn dispatch_pool(&self) -> Vec<DispatchItem> {
        self.item
            .iter()
            .map(|(name, item)| {
                DispatchItem::new(name.as_str(), item.duration, item.release, item.due)
                    .with_weight(item.weight)
            })
            .collect()
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            parallel: self.config.parallel,
            clock_start: self.config.clock_start,
        }
    }
}
