//! Core entity structs for the Precinct dispatch simulation.
//!
//! Covers [`Report`], [`Officer`], and the [`Scoreboard`] that tracks
//! cumulative points and progression.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{ReportStatus, Severity};
use crate::ids::{OfficerId, ReportId};

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// A generated incident that needs officers to resolve.
///
/// Requirement fields (`officers_required`, `time_to_resolve_ms`, `reward`,
/// `penalty`, `officer_leeway`, `deadline_ms`) are fixed at creation. Only
/// `assigned`, `progress`, and `status` change afterwards, and only while the
/// report is [`ReportStatus::Active`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Report {
    /// Unique report identifier.
    pub id: ReportId,
    /// Severity tier the requirements were drawn from.
    pub severity: Severity,
    /// Short human-readable description ("Armed Robbery").
    pub description: String,
    /// Officers that must be attached before progress accrues (at least 1).
    pub officers_required: u32,
    /// Extra officers accepted beyond `officers_required`.
    pub officer_leeway: u32,
    /// Simulated milliseconds to resolve at efficiency 1.0.
    pub time_to_resolve_ms: u64,
    /// Points awarded on resolution.
    pub reward: i64,
    /// Points deducted if the deadline passes first.
    pub penalty: i64,
    /// Completion fraction in `[0, 1]`.
    #[ts(as = "String")]
    pub progress: Decimal,
    /// Effective officer-milliseconds of work done so far.
    ///
    /// The report resolves once this reaches [`Report::effort_target`].
    /// `progress` is derived from it.
    #[ts(as = "String")]
    pub effort: Decimal,
    /// Officers currently attached to this report.
    pub assigned: BTreeSet<OfficerId>,
    /// Lifecycle state.
    pub status: ReportStatus,
    /// Simulated time the report was generated.
    pub created_at_ms: u64,
    /// Simulated time after which the report times out, if any.
    pub deadline_ms: Option<u64>,
}

impl Report {
    /// Whether the report completed successfully.
    pub const fn is_resolved(&self) -> bool {
        matches!(self.status, ReportStatus::Resolved)
    }

    /// Whether the report is still in the active set.
    pub const fn is_active(&self) -> bool {
        !self.status.is_closed()
    }

    /// Number of officers currently attached.
    pub fn assigned_count(&self) -> u32 {
        u32::try_from(self.assigned.len()).unwrap_or(u32::MAX)
    }

    /// Most officers this report will accept (`required + leeway`).
    pub const fn staffing_cap(&self) -> u32 {
        self.officers_required.saturating_add(self.officer_leeway)
    }

    /// Whether enough officers are attached for progress to accrue.
    pub fn is_fully_staffed(&self) -> bool {
        self.assigned_count() >= self.officers_required
    }

    /// Officers still missing before progress can accrue.
    pub fn officers_missing(&self) -> u32 {
        self.officers_required.saturating_sub(self.assigned_count())
    }

    /// Officer-milliseconds needed to resolve (`time_to_resolve_ms * required`).
    pub fn effort_target(&self) -> Decimal {
        Decimal::from(self.time_to_resolve_ms)
            .checked_mul(Decimal::from(self.officers_required))
            .unwrap_or(Decimal::MAX)
    }
}

// ---------------------------------------------------------------------------
// Officer
// ---------------------------------------------------------------------------

/// An allocatable unit of precinct capacity.
///
/// Availability is derived from `assignment`, so the two can never disagree
/// in memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Officer {
    /// Unique officer identifier.
    pub id: OfficerId,
    /// The report this officer is attached to, if any.
    pub assignment: Option<ReportId>,
}

impl Officer {
    /// Create an idle officer.
    pub const fn new(id: OfficerId) -> Self {
        Self {
            id,
            assignment: None,
        }
    }

    /// Whether the officer is idle.
    pub const fn is_available(&self) -> bool {
        self.assignment.is_none()
    }
}

// ---------------------------------------------------------------------------
// Scoreboard
// ---------------------------------------------------------------------------

/// Cumulative score and progression counters for a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Scoreboard {
    /// Total points; penalties can push it below zero.
    pub total: i64,
    /// Highest progression level reached (starts at 1, never decreases).
    pub level: u32,
    /// Reports closed as resolved.
    pub reports_resolved: u64,
    /// Reports closed by deadline.
    pub reports_timed_out: u64,
}

impl Scoreboard {
    /// A fresh scoreboard at level 1.
    pub const fn new() -> Self {
        Self {
            total: 0,
            level: 1,
            reports_resolved: 0,
            reports_timed_out: 0,
        }
    }
}

impl Default for Scoreboard {
    fn default() -> Self {
        Self::new()
    }
}
