// src/dispatch/mod.rs

//! Single-resource dispatching.
//!
//! A pool of items (duration, release time, due date) is sequenced on one
//! machine by a pluggable [`PriorityRule`]; the resulting sequence is then
//! replayed to derive completion, lateness and tardiness per item.

pub mod rules;
pub mod sequencer;

pub use rules::{CriticalRatio, EarliestDueDate, PriorityRule, ShortestProcessingTime};
pub use sequencer::{
    DispatchItem, DispatchOutcome, Dispatcher, ScheduledItem, replay_sequence, validate_pool,
};
