//! Save-blob records for the persistence boundary.
//!
//! A [`SaveGame`] is the opaque blob a save/load collaborator stores. It holds
//! score, difficulty, the active reports with their assigned officer IDs, and
//! the officer pool with each officer's availability and current report.
//! Closed report IDs ride along so that commands against them keep failing
//! with an invalid-state error after a reload.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{ReportStatus, Severity};
use crate::ids::{OfficerId, ReportId};
use crate::structs::Scoreboard;

/// Current save format version.
pub const SAVE_FORMAT_VERSION: u32 = 1;

/// Full persisted state of a dispatch session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SaveGame {
    /// Format version ([`SAVE_FORMAT_VERSION`] when written).
    pub version: u32,
    /// Wall-clock time the blob was written.
    pub saved_at: DateTime<Utc>,
    /// Seed the session was started with.
    pub seed: u64,
    /// Ticks executed so far.
    pub tick: u64,
    /// Simulated milliseconds elapsed so far.
    pub now_ms: u64,
    /// Score and progression counters.
    pub score: Scoreboard,
    /// Difficulty multiplier at save time.
    #[ts(as = "String")]
    pub difficulty: Decimal,
    /// When the next report is due, if generation is scheduled.
    pub next_generation_ms: Option<u64>,
    /// Reports in the active set, in creation order.
    pub reports: Vec<SavedReport>,
    /// Every officer in the pool, in enlistment order.
    pub officers: Vec<SavedOfficer>,
    /// Reports that already left the active set.
    pub closed_reports: Vec<ClosedReport>,
}

/// A persisted active report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SavedReport {
    /// Report identifier.
    pub id: ReportId,
    /// Severity tier.
    pub severity: Severity,
    /// Human-readable description.
    pub description: String,
    /// Officers required before progress accrues.
    pub officers_required: u32,
    /// Extra officers accepted beyond the requirement.
    pub officer_leeway: u32,
    /// Resolution time at efficiency 1.0.
    pub time_to_resolve_ms: u64,
    /// Points on resolution.
    pub reward: i64,
    /// Points deducted on timeout.
    pub penalty: i64,
    /// Completion fraction in `[0, 1]`.
    #[ts(as = "String")]
    pub progress: Decimal,
    /// Effective officer-milliseconds of work done so far. Optional; when
    /// absent or out of step with `progress`, restore rebuilds it from
    /// `progress`.
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub effort: Option<Decimal>,
    /// IDs of the officers attached at save time.
    pub assigned_officer_ids: Vec<OfficerId>,
    /// Simulated creation time.
    pub created_at_ms: u64,
    /// Simulated deadline, if any.
    pub deadline_ms: Option<u64>,
}

/// A persisted officer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SavedOfficer {
    /// Officer identifier.
    pub id: OfficerId,
    /// Availability flag; must agree with `current_report_id`.
    pub available: bool,
    /// The report the officer is attached to, if any.
    pub current_report_id: Option<ReportId>,
}

/// A report that is no longer active, kept for invalid-state checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ClosedReport {
    /// Report identifier.
    pub id: ReportId,
    /// Terminal status the report closed with.
    pub status: ReportStatus,
}
