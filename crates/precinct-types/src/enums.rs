//! Enumeration types for the Precinct dispatch simulation.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// Ordinal severity tier of a crime report.
///
/// The tier decides, through the severity table in the core configuration,
/// how many officers a report needs, how long it takes to resolve, and how
/// many points it is worth. Ordering follows seriousness: `Low < Moderate <
/// High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Severity {
    /// Nuisance calls: noise complaints, littering.
    Low,
    /// Property crime: theft, vandalism, trespassing.
    Moderate,
    /// Violent or escalating incidents: armed robbery, hostage situations.
    High,
}

impl Severity {
    /// Every tier, least serious first.
    pub const ALL: [Self; 3] = [Self::Low, Self::Moderate, Self::High];

    /// Lower-case name used in logs and configuration keys.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
        }
    }
}

impl core::fmt::Display for Severity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ReportStatus
// ---------------------------------------------------------------------------

/// Lifecycle state of a report.
///
/// Only `Active` reports live in the active set. The three closed states are
/// terminal: a closed report is never mutated again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum ReportStatus {
    /// Open and accepting officers.
    Active,
    /// Progress reached completion; reward paid.
    Resolved,
    /// Deadline elapsed before completion; penalty applied.
    TimedOut,
    /// Withdrawn by the consuming layer; no score change.
    Cancelled,
}

impl ReportStatus {
    /// Whether the report has left the active set.
    pub const fn is_closed(self) -> bool {
        !matches!(self, Self::Active)
    }

    /// Snake-case name used in logs and error messages.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Resolved => "resolved",
            Self::TimedOut => "timed_out",
            Self::Cancelled => "cancelled",
        }
    }
}

impl core::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SessionEndReason
// ---------------------------------------------------------------------------

/// Reason a bounded session run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum SessionEndReason {
    /// Reached the configured `max_ticks` limit.
    MaxTicksReached,
    /// Simulated session time ran out (the shift is over).
    SessionTimeElapsed,
}
