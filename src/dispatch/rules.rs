// src/dispatch/rules.rs

//! Priority rules for the single-resource dispatcher.
//!
//! A rule maps a released item and the current clock to a key; the
//! dispatcher starts the item with the smallest key, ties broken by
//! ascending id.

use std::cmp::Ordering;
use std::fmt;

use crate::dispatch::sequencer::DispatchItem;
use crate::types::{DispatchRule, Time};

/// Strategy used by [`Dispatcher`](crate::dispatch::Dispatcher) to rank
/// released items.
pub trait PriorityRule: fmt::Debug + Send + Sync {
    /// Short name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Ranking key of `item` at time `clock`; smaller runs first.
    fn key(&self, item: &DispatchItem, clock: Time) -> f64;

    /// Order of two items at time `clock`. Rules whose key is an exact
    /// integer override this to avoid the lossy float conversion.
    fn compare(&self, a: &DispatchItem, b: &DispatchItem, clock: Time) -> Ordering {
        self.key(a, clock).total_cmp(&self.key(b, clock))
    }
}

/// Earliest due date (with release times).
#[derive(Debug, Clone, Copy, Default)]
pub struct EarliestDueDate;

impl PriorityRule for EarliestDueDate {
    fn name(&self) -> &'static str {
        "edd"
    }

    fn key(&self, item: &DispatchItem, _clock: Time) -> f64 {
        item.due_date as f64
    }

    fn compare(&self, a: &DispatchItem, b: &DispatchItem, _clock: Time) -> Ordering {
        a.due_date.cmp(&b.due_date)
    }
}

/// Shortest processing time.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShortestProcessingTime;

impl PriorityRule for ShortestProcessingTime {
    fn name(&self) -> &'static str {
        "spt"
    }

    fn key(&self, item: &DispatchItem, _clock: Time) -> f64 {
        item.duration as f64
    }

    fn compare(&self, a: &DispatchItem, b: &DispatchItem, _clock: Time) -> Ordering {
        a.duration.cmp(&b.duration)
    }
}

/// Critical ratio `(due - clock) / duration`.
///
/// A zero-length item has no meaningful ratio: it ranks as `-inf` when
/// already past due, `0` when exactly due and `+inf` otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct CriticalRatio;

impl PriorityRule for CriticalRatio {
    fn name(&self) -> &'static str {
        "critical_ratio"
    }

    fn key(&self, item: &DispatchItem, clock: Time) -> f64 {
        let remaining = item.due_date.saturating_sub(clock);
        if item.duration == 0 {
            return match remaining.signum() {
                -1 => f64::NEG_INFINITY,
                0 => 0.0,
                _ => f64::INFINITY,
            };
        }
        remaining as f64 / item.duration as f64
    }
}

impl DispatchRule {
    /// The strategy implementing this rule.
    pub fn strategy(self) -> &'static dyn PriorityRule {
        match self {
            DispatchRule::Edd => &EarliestDueDate,
            DispatchRule::Spt => &ShortestProcessingTime,
            DispatchRule::CriticalRatio => &CriticalRatio,
        }
    }
}
