// src/dispatch/sequencer.rs

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::dag::operation::OperationId;
use crate::dispatch::rules::PriorityRule;
use crate::errors::{Result, ShopError};
use crate::types::{ClockStart, DispatchRule, Time};

fn default_weight() -> Time {
    1
}

/// One record of a dispatch pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchItem {
    pub id: OperationId,
    pub duration: Time,
    pub release_time: Time,
    pub due_date: Time,
    /// Tardiness weight; only affects the weighted tardiness metric.
    #[serde(default = "default_weight")]
    pub weight: Time,
    /// Tie-break applied after the rule key and before the id. Items built
    /// from a precedence graph carry their topological position here so that
    /// equal keys never invert an existing precedence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precedence_rank: Option<usize>,
}

impl DispatchItem {
    pub fn new(id: impl Into<OperationId>, duration: Time, release_time: Time, due_date: Time) -> Self {
        Self {
            id: id.into(),
            duration,
            release_time,
            due_date,
            weight: default_weight(),
            precedence_rank: None,
        }
    }

    pub fn with_weight(mut self, weight: Time) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_precedence_rank(mut self, rank: usize) -> Self {
        self.precedence_rank = Some(rank);
        self
    }
}

/// Exact timing of one item once the sequence is fixed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduledItem {
    pub id: OperationId,
    pub start: Time,
    pub completion: Time,
    pub lateness: Time,
    pub tardiness: Time,
    pub weighted_tardiness: Time,
}

/// Result of sequencing one pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchOutcome {
    pub rule: String,
    pub sequence: Vec<OperationId>,
    /// Completion times as seen by the selection clock, in sequence order.
    pub simulated_completions: Vec<Time>,
    /// Timing re-derived by replaying `sequence` against release times.
    pub schedule: Vec<ScheduledItem>,
    /// `None` for an empty pool: no lateness constraint at all.
    pub max_lateness: Option<Time>,
    pub total_tardiness: Time,
    pub total_weighted_tardiness: Time,
    pub total_completion_time: Time,
    pub makespan: Option<Time>,
}

impl DispatchOutcome {
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn item(&self, id: &OperationId) -> Option<&ScheduledItem> {
        self.schedule.iter().find(|item| &item.id == id)
    }
}

/// Single-resource dispatcher parameterised by a [`PriorityRule`].
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher<'r> {
    rule: &'r dyn PriorityRule,
    clock_start: ClockStart,
}

impl Dispatcher<'static> {
    pub fn for_rule(rule: DispatchRule) -> Self {
        Dispatcher::new(rule.strategy())
    }
}

impl<'r> Dispatcher<'r> {
    pub fn new(rule: &'r dyn PriorityRule) -> Self {
        Self {
            rule,
            clock_start: ClockStart::default(),
        }
    }

    pub fn with_clock_start(mut self, clock_start: ClockStart) -> Self {
        self.clock_start = clock_start;
        self
    }

    /// Build a sequence for `pool` and derive its lateness metrics.
    ///
    /// At each decision point the released, unscheduled item with the
    /// smallest rule key starts (ties by precedence rank, then ascending id);
    /// when nothing is released the clock jumps to the next release time.
    pub fn sequence(&self, pool: &[DispatchItem]) -> Result<DispatchOutcome> {
        validate_pool(pool)?;

        let mut remaining: Vec<&DispatchItem> = pool.iter().collect();
        let mut sequence = Vec::with_capacity(pool.len());
        let mut simulated_completions = Vec::with_capacity(pool.len());
        let mut clock = start_clock(pool, self.clock_start);

        while !remaining.is_empty() {
            let chosen = remaining
                .iter()
                .enumerate()
                .filter(|(_, item)| item.release_time <= clock)
                .min_by(|(_, a), (_, b)| {
                    self.rule
                        .compare(a, b, clock)
                        .then_with(|| a.precedence_rank.cmp(&b.precedence_rank))
                        .then_with(|| a.id.cmp(&b.id))
                })
                .map(|(pos, _)| pos);

            match chosen {
                Some(pos) => {
                    let item = remaining.swap_remove(pos);
                    trace!(
                        clock,
                        item = %item.id,
                        release = item.release_time,
                        due = item.due_date,
                        rule = self.rule.name(),
                        "dispatching item"
                    );
                    clock = clock
                        .checked_add(item.duration)
                        .ok_or_else(|| overflow(&item.id))?;
                    sequence.push(item.id.clone());
                    simulated_completions.push(clock);
                }
                None => {
                    let next_release = remaining
                        .iter()
                        .map(|item| item.release_time)
                        .min()
                        .unwrap_or(clock);
                    trace!(clock, next_release, "machine idle; advancing clock");
                    clock = next_release;
                }
            }
        }

        let schedule = replay_sequence(pool, &sequence, self.clock_start)?;
        let outcome = summarize(self.rule.name(), sequence, simulated_completions, schedule)?;

        debug!(
            rule = self.rule.name(),
            items = pool.len(),
            max_lateness = ?outcome.max_lateness,
            "sequenced dispatch pool"
        );

        Ok(outcome)
    }
}

/// Reject items that no sequence can honour.
pub fn validate_pool(pool: &[DispatchItem]) -> Result<()> {
    let mut seen: HashSet<&OperationId> = HashSet::with_capacity(pool.len());

    for item in pool {
        let reason = if item.duration < 0 {
            Some(format!("duration must be >= 0 (got {})", item.duration))
        } else if item.due_date < item.release_time {
            Some(format!(
                "due date {} is before release time {}",
                item.due_date, item.release_time
            ))
        } else if item.weight < 0 {
            Some(format!("weight must be >= 0 (got {})", item.weight))
        } else if !seen.insert(&item.id) {
            Some("duplicate item id in pool".to_string())
        } else {
            None
        };

        if let Some(reason) = reason {
            return Err(ShopError::InvalidSubproblem {
                item: item.id.clone(),
                reason,
            });
        }
    }

    Ok(())
}

/// Timing of `sequence` when every item starts as soon as both the machine
/// and its release time allow.
pub fn replay_sequence(
    pool: &[DispatchItem],
    sequence: &[OperationId],
    clock_start: ClockStart,
) -> Result<Vec<ScheduledItem>> {
    let by_id: HashMap<&OperationId, &DispatchItem> =
        pool.iter().map(|item| (&item.id, item)).collect();

    let mut clock = start_clock(pool, clock_start);
    let mut schedule = Vec::with_capacity(sequence.len());

    for id in sequence {
        let item = by_id
            .get(id)
            .ok_or_else(|| ShopError::OperationNotFound(id.clone()))?;

        let start = clock.max(item.release_time);
        let completion = start
            .checked_add(item.duration)
            .ok_or_else(|| overflow(id))?;
        let lateness = completion
            .checked_sub(item.due_date)
            .ok_or_else(|| overflow(id))?;
        let tardiness = lateness.max(0);
        let weighted_tardiness = item
            .weight
            .checked_mul(tardiness)
            .ok_or_else(|| overflow(id))?;

        schedule.push(ScheduledItem {
            id: id.clone(),
            start,
            completion,
            lateness,
            tardiness,
            weighted_tardiness,
        });
        clock = completion;
    }

    Ok(schedule)
}

fn start_clock(pool: &[DispatchItem], clock_start: ClockStart) -> Time {
    match clock_start {
        ClockStart::MinRelease => pool.iter().map(|item| item.release_time).min().unwrap_or(0),
        ClockStart::Zero => 0,
    }
}

fn overflow(id: &OperationId) -> ShopError {
    ShopError::InvalidSubproblem {
        item: id.clone(),
        reason: "time arithmetic overflows".to_string(),
    }
}

fn checked_total(schedule: &[ScheduledItem], field: impl Fn(&ScheduledItem) -> Time) -> Result<Time> {
    schedule.iter().try_fold(0, |total: Time, item| {
        total.checked_add(field(item)).ok_or_else(|| overflow(&item.id))
    })
}

fn summarize(
    rule: &str,
    sequence: Vec<OperationId>,
    simulated_completions: Vec<Time>,
    schedule: Vec<ScheduledItem>,
) -> Result<DispatchOutcome> {
    Ok(DispatchOutcome {
        rule: rule.to_string(),
        max_lateness: schedule.iter().map(|item| item.lateness).max(),
        total_tardiness: checked_total(&schedule, |item| item.tardiness)?,
        total_weighted_tardiness: checked_total(&schedule, |item| item.weighted_tardiness)?,
        total_completion_time: checked_total(&schedule, |item| item.completion)?,
        makespan: schedule.last().map(|item| item.completion),
        sequence,
        simulated_completions,
        schedule,
    })
}
