// src/config/validate.rs

use std::collections::HashSet;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{RawShopFile, ShopFile};
use crate::dag::operation::OperationId;
use crate::errors::{Result, ShopError};

impl TryFrom<RawShopFile> for ShopFile {
    type Error = ShopError;

    fn try_from(raw: RawShopFile) -> std::result::Result<Self, Self::Error> {
        validate_shop_file(&raw)?;
        Ok(ShopFile::new_unchecked(raw))
    }
}

pub fn validate_shop_file(cfg: &RawShopFile) -> Result<()> {
    ensure_has_content(cfg)?;
    validate_jobs(cfg)?;
    validate_activity_dependencies(cfg)?;
    validate_activity_dag(cfg)?;
    validate_items(cfg)?;
    Ok(())
}

fn ensure_has_content(cfg: &RawShopFile) -> Result<()> {
    if cfg.job.is_empty() && cfg.activity.is_empty() && cfg.item.is_empty() {
        return Err(ShopError::ConfigError(
            "instance must contain at least one [job.<name>], [activity.<name>] or [item.<name>] section"
                .to_string(),
        ));
    }
    Ok(())
}

fn validate_jobs(cfg: &RawShopFile) -> Result<()> {
    for (name, job) in cfg.job.iter() {
        // Operation ids are "<machine>,<job>".
        if name.contains(',') {
            return Err(ShopError::ConfigError(format!(
                "job name '{name}' must not contain ','"
            )));
        }
        if job.routing.is_empty() {
            return Err(ShopError::ConfigError(format!(
                "job '{name}' must have a non-empty `routing`"
            )));
        }

        let mut visited: HashSet<&str> = HashSet::new();
        for step in job.routing.iter() {
            let machine = step.machine.trim();
            if machine.is_empty() {
                return Err(ShopError::ConfigError(format!(
                    "job '{name}' has a routing step with an empty machine name"
                )));
            }
            if machine.contains(',') {
                return Err(ShopError::ConfigError(format!(
                    "job '{name}' routes through machine '{machine}' whose name contains ','"
                )));
            }
            if step.duration < 0 {
                return Err(ShopError::ConfigError(format!(
                    "job '{name}' has negative duration {} on machine '{machine}'",
                    step.duration
                )));
            }
            if !visited.insert(machine) {
                return Err(ShopError::ConfigError(format!(
                    "job '{name}' visits machine '{machine}' more than once"
                )));
            }
        }
    }
    Ok(())
}

fn validate_activity_dependencies(cfg: &RawShopFile) -> Result<()> {
    for (name, activity) in cfg.activity.iter() {
        if activity.duration < 0 {
            return Err(ShopError::ConfigError(format!(
                "activity '{name}' has negative duration {}",
                activity.duration
            )));
        }
        for dep in activity.after.iter() {
            if dep == name {
                return Err(ShopError::ConfigError(format!(
                    "activity '{name}' cannot depend on itself in `after`"
                )));
            }
            if !cfg.activity.contains_key(dep) {
                return Err(ShopError::ConfigError(format!(
                    "activity '{name}' has unknown dependency '{dep}' in `after`"
                )));
            }
        }
    }
    Ok(())
}

fn validate_activity_dag(cfg: &RawShopFile) -> Result<()> {
    // Edge direction: dep -> activity.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.activity.keys() {
        graph.add_node(name.as_str());
    }
    for (name, activity) in cfg.activity.iter() {
        for dep in activity.after.iter() {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => {
            let node = OperationId::from(cycle.node_id());
            Err(ShopError::CycleDetected {
                operation: node.clone(),
                cycle: vec![node],
            })
        }
    }
}

fn validate_items(cfg: &RawShopFile) -> Result<()> {
    for (name, item) in cfg.item.iter() {
        if item.duration < 0 {
            return Err(ShopError::ConfigError(format!(
                "item '{name}' has negative duration {}",
                item.duration
            )));
        }
        if item.weight < 0 {
            return Err(ShopError::ConfigError(format!(
                "item '{name}' has negative weight {}",
                item.weight
            )));
        }
        if item.due < item.release {
            return Err(ShopError::ConfigError(format!(
                "item '{name}' is due at {} before its release at {}",
                item.due, item.release
            )));
        }
    }
    Ok(())
}
