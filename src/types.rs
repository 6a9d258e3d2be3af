use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Time unit used for durations, release times, due dates and schedule
/// timestamps.
pub type Time = i64;

/// Priority rule used by the single-resource dispatcher.
///
/// - `Edd`: earliest due date among released items (minimises `Lmax`
///   heuristically when release times are present).
/// - `Spt`: shortest processing time among released items.
/// - `CriticalRatio`: smallest `(due - clock) / duration`, recomputed at
///   every decision point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum DispatchRule {
    Edd,
    Spt,
    #[value(alias = "critical_ratio", alias = "cr")]
    CriticalRatio,
}

impl Default for DispatchRule {
    fn default() -> Self {
        DispatchRule::Edd
    }
}

impl FromStr for DispatchRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "edd" => Ok(DispatchRule::Edd),
            "spt" => Ok(DispatchRule::Spt),
            "critical_ratio" | "cr" => Ok(DispatchRule::CriticalRatio),
            other => Err(format!(
                "invalid dispatch rule: {other} (expected \"edd\", \"spt\" or \"critical_ratio\")"
            )),
        }
    }
}

/// Where the dispatcher's simulation clock starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockStart {
    /// Start at the smallest release time in the pool.
    MinRelease,
    /// Start at time zero; an idle gap is skipped by jumping to the next
    /// release.
    Zero,
}

impl Default for ClockStart {
    fn default() -> Self {
        ClockStart::MinRelease
    }
}

impl FromStr for ClockStart {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "min_release" => Ok(ClockStart::MinRelease),
            "zero" => Ok(ClockStart::Zero),
            other => Err(format!(
                "invalid clock_start: {other} (expected \"min_release\" or \"zero\")"
            )),
        }
    }
}

/// Report format for CLI output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
