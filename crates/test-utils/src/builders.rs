#![allow(dead_code)]

use std::collections::BTreeMap;

use shopsched::config::{
    ActivityConfig, ConfigSection, ItemConfig, JobConfig, RawShopFile, RoutingStepConfig, ShopFile,
};
use shopsched::dag::{JobRouting, Operation, OperationId, PrecedenceGraph, PrecedenceKind, RoutingStep};
use shopsched::dispatch::DispatchItem;
use shopsched::types::{ClockStart, DispatchRule, Time};

/// Builder for `ShopFile` to simplify test setup.
pub struct ShopFileBuilder {
    raw: RawShopFile,
}

impl ShopFileBuilder {
    pub fn new() -> Self {
        Self {
            raw: RawShopFile {
                config: ConfigSection::default(),
                job: BTreeMap::new(),
                activity: BTreeMap::new(),
                item: BTreeMap::new(),
            },
        }
    }

    pub fn with_job(mut self, name: &str, job: JobConfig) -> Self {
        self.raw.job.insert(name.to_string(), job);
        self
    }

    pub fn with_activity(mut self, name: &str, activity: ActivityConfig) -> Self {
        self.raw.activity.insert(name.to_string(), activity);
        self
    }

    pub fn with_item(mut self, name: &str, item: ItemConfig) -> Self {
        self.raw.item.insert(name.to_string(), item);
        self
    }

    pub fn with_rule(mut self, rule: DispatchRule) -> Self {
        self.raw.config.rule = rule;
        self
    }

    pub fn with_clock_start(mut self, clock_start: ClockStart) -> Self {
        self.raw.config.clock_start = clock_start;
        self
    }

    pub fn parallel(mut self, val: bool) -> Self {
        self.raw.config.parallel = val;
        self
    }

    /// The unvalidated file, for tests that expect validation to fail.
    pub fn build_raw(self) -> RawShopFile {
        self.raw
    }

    pub fn build(self) -> ShopFile {
        ShopFile::try_from(self.raw).expect("Failed to build valid shop file from builder")
    }
}

impl Default for ShopFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `JobConfig`.
pub struct JobBuilder {
    job: JobConfig,
}

impl JobBuilder {
    pub fn new() -> Self {
        Self {
            job: JobConfig { routing: vec![] },
        }
    }

    pub fn visit(mut self, machine: &str, duration: Time) -> Self {
        self.job.routing.push(RoutingStepConfig {
            machine: machine.to_string(),
            duration,
        });
        self
    }

    pub fn build(self) -> JobConfig {
        self.job
    }
}

impl Default for JobBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `ActivityConfig`.
pub struct ActivityBuilder {
    activity: ActivityConfig,
}

impl ActivityBuilder {
    pub fn new(duration: Time) -> Self {
        Self {
            activity: ActivityConfig {
                duration,
                after: vec![],
            },
        }
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.activity.after.push(dep.to_string());
        self
    }

    pub fn build(self) -> ActivityConfig {
        self.activity
    }
}

/// Builder for `ItemConfig`.
pub struct ItemBuilder {
    item: ItemConfig,
}

impl ItemBuilder {
    pub fn new(duration: Time, release: Time, due: Time) -> Self {
        Self {
            item: ItemConfig {
                duration,
                release,
                due,
                weight: 1,
            },
        }
    }

    pub fn weight(mut self, weight: Time) -> Self {
        self.item.weight = weight;
        self
    }

    pub fn build(self) -> ItemConfig {
        self.item
    }
}

/// Routing row from `(machine, duration)` pairs.
pub fn routing(job: &str, visits: &[(&str, Time)]) -> JobRouting {
    JobRouting::new(
        job,
        visits
            .iter()
            .map(|&(machine, duration)| RoutingStep::new(machine, duration))
            .collect(),
    )
}

/// Dispatch pool from `(id, duration, release, due)` tuples.
pub fn pool(items: &[(&str, Time, Time, Time)]) -> Vec<DispatchItem> {
    items
        .iter()
        .map(|&(id, p, r, d)| DispatchItem::new(id, p, r, d))
        .collect()
}

/// Project network from `(id, duration, predecessors)` rows.
///
/// Edges are inserted without a cycle check so tests can build cyclic
/// graphs on purpose.
pub fn project(activities: &[(&str, Time, &[&str])]) -> PrecedenceGraph {
    let mut graph = PrecedenceGraph::new();
    for &(id, duration, _) in activities {
        graph
            .add_operation(Operation::activity(id, duration))
            .expect("duplicate activity in test network");
    }
    for &(id, _, preds) in activities {
        for pred in preds {
            graph
                .add_precedence(&OperationId::from(*pred), &OperationId::from(id), PrecedenceKind::Declared)
                .expect("unknown predecessor in test network");
        }
    }
    graph
}

/// Shorthand for an operation id.
pub fn op(id: &str) -> OperationId {
    OperationId::from(id)
}
