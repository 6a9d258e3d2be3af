// src/report.rs

//! Human-readable and JSON rendering of analysis results.
//!
//! Text reports go to stdout from the binary; logs never do.

use std::fmt;

use serde::Serialize;

use crate::dag::cpm::ScheduleSnapshot;
use crate::dag::operation::OperationId;
use crate::dispatch::DispatchOutcome;
use crate::engine::ShopSchedule;
use crate::errors::Result;
use crate::types::Time;

/// One row of the CPM timing table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimingRow {
    pub id: OperationId,
    pub duration: Time,
    pub early_start: Time,
    pub early_finish: Time,
    pub late_start: Time,
    pub late_finish: Time,
    pub slack: Time,
    pub critical: bool,
}

/// CPM result in report form: timing table, project duration and critical
/// path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CpmReport {
    pub rows: Vec<TimingRow>,
    pub project_duration: Time,
    pub critical_path: Vec<OperationId>,
}

impl CpmReport {
    pub fn from_snapshot(snapshot: &ScheduleSnapshot) -> Self {
        let rows = snapshot
            .iter()
            .map(|(id, t)| TimingRow {
                id: id.clone(),
                duration: t.duration,
                early_start: t.early_start,
                early_finish: t.early_finish,
                late_start: t.late_start,
                late_finish: t.late_finish,
                slack: t.slack(),
                critical: t.is_critical(),
            })
            .collect();

        Self {
            rows,
            project_duration: snapshot.project_duration(),
            critical_path: snapshot.critical_path(),
        }
    }
}

impl fmt::Display for CpmReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = id_width(self.rows.iter().map(|r| &r.id));

        writeln!(
            f,
            "{:<width$}  {:>8}  {:>6}  {:>6}  {:>6}  {:>6}  {:>6}  critical",
            "operation", "duration", "ES", "EF", "LS", "LF", "slack"
        )?;
        for row in &self.rows {
            writeln!(
                f,
                "{:<width$}  {:>8}  {:>6}  {:>6}  {:>6}  {:>6}  {:>6}  {}",
                row.id.as_str(),
                row.duration,
                row.early_start,
                row.early_finish,
                row.late_start,
                row.late_finish,
                row.slack,
                if row.critical { "yes" } else { "no" },
            )?;
        }
        writeln!(f)?;
        writeln!(f, "project duration: {}", self.project_duration)?;
        writeln!(f, "critical path: {}", join_path(&self.critical_path))
    }
}

/// Text table for a dispatch outcome.
pub struct DispatchTable<'a>(pub &'a DispatchOutcome);

impl fmt::Display for DispatchTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = self.0;
        let width = id_width(outcome.schedule.iter().map(|s| &s.id));

        writeln!(f, "rule: {}", outcome.rule)?;
        writeln!(f, "sequence: {}", join_path(&outcome.sequence))?;
        writeln!(f)?;
        writeln!(
            f,
            "{:<width$}  {:>6}  {:>6}  {:>6}  {:>6}  {:>6}",
            "item", "start", "C", "L", "T", "wT"
        )?;
        for item in &outcome.schedule {
            writeln!(
                f,
                "{:<width$}  {:>6}  {:>6}  {:>6}  {:>6}  {:>6}",
                item.id.as_str(),
                item.start,
                item.completion,
                item.lateness,
                item.tardiness,
                item.weighted_tardiness,
            )?;
        }
        writeln!(f)?;
        writeln!(f, "Lmax: {}", optional(outcome.max_lateness))?;
        writeln!(f, "total tardiness: {}", outcome.total_tardiness)?;
        writeln!(f, "total weighted tardiness: {}", outcome.total_weighted_tardiness)?;
        writeln!(f, "total completion time: {}", outcome.total_completion_time)?;
        writeln!(f, "makespan: {}", optional(outcome.makespan))
    }
}

/// Text summary of a shifting bottleneck run.
pub struct ScheduleSummary<'a>(pub &'a ShopSchedule);

impl fmt::Display for ScheduleSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let schedule = self.0;

        writeln!(f, "iterations:")?;
        for it in &schedule.iterations {
            let candidates: Vec<String> = it
                .candidates
                .iter()
                .map(|c| format!("{}={}", c.machine, optional(c.max_lateness)))
                .collect();
            writeln!(
                f,
                "  {:>3}. bottleneck {} (Lmax {}) [{}] -> {}",
                it.iteration,
                it.bottleneck,
                optional(it.max_lateness),
                candidates.join(", "),
                join_path(&it.sequence),
            )?;
            for skipped in &it.skipped {
                writeln!(f, "       skipped {}: {}", skipped.machine, skipped.reason)?;
            }
        }
        writeln!(f)?;

        writeln!(f, "machine sequences:")?;
        for (machine, sequence) in &schedule.sequences {
            writeln!(f, "  {machine}: {}", join_path(sequence))?;
        }
        writeln!(f)?;

        write!(f, "{}", CpmReport::from_snapshot(&schedule.snapshot))?;
        writeln!(f, "makespan: {}", schedule.makespan)
    }
}

/// Pretty JSON for any serializable report.
pub fn render_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn join_path(ids: &[OperationId]) -> String {
    if ids.is_empty() {
        return "(none)".to_string();
    }
    ids.iter().map(OperationId::as_str).collect::<Vec<_>>().join(" -> ")
}

fn optional(value: Option<Time>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn id_width<'a>(ids: impl Iterator<Item = &'a OperationId>) -> usize {
    ids.map(|id| id.as_str().len()).max().unwrap_or(0).max(9)
}
