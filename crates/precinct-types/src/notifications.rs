//! Outbound notifications emitted by the dispatch core.
//!
//! The core never calls into the consuming layer directly. Every state change
//! worth reporting is pushed onto the session outbox as a [`Notification`],
//! and the outbox is drained once per tick in emission order. Payloads carry
//! snapshots, so a consumer never needs to query back into the session to
//! render what happened.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::OfficerId;
use crate::structs::{Officer, Report};

/// A single outbound notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Notification {
    /// Tick during which the change happened (0 before the first tick).
    pub tick: u64,
    /// Simulated time of the change, in milliseconds.
    pub at_ms: u64,
    /// What happened.
    pub kind: NotificationKind,
}

/// The payload of a [`Notification`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(tag = "type", content = "details")]
pub enum NotificationKind {
    /// A new report entered the active set.
    ReportGenerated {
        /// The report as generated.
        report: Report,
    },
    /// An idle officer was attached to a report.
    OfficerAssigned {
        /// The officer after assignment.
        officer: Officer,
        /// The report after assignment.
        report: Report,
    },
    /// A report reached full progress and paid its reward.
    ReportResolved {
        /// The report in its closed state.
        report: Report,
        /// Officers returned to the idle pool.
        released: Vec<OfficerId>,
        /// Points awarded.
        reward: i64,
    },
    /// The officer pool grew.
    PoolUpgraded {
        /// Officers added by this upgrade.
        added: u32,
        /// Pool size after the upgrade.
        new_total: u32,
    },
    /// A report's deadline passed before it resolved.
    ReportTimedOut {
        /// The report in its closed state.
        report: Report,
        /// Officers returned to the idle pool.
        released: Vec<OfficerId>,
        /// Points deducted.
        penalty: i64,
    },
    /// A report was withdrawn by the consuming layer.
    ReportCancelled {
        /// The report in its closed state.
        report: Report,
        /// Officers returned to the idle pool.
        released: Vec<OfficerId>,
    },
    /// The difficulty multiplier moved after a score change.
    DifficultyChanged {
        /// Multiplier before the change.
        #[ts(as = "String")]
        previous: Decimal,
        /// Multiplier after the change.
        #[ts(as = "String")]
        current: Decimal,
    },
    /// The session reached a new progression level.
    LevelReached {
        /// The level reached.
        level: u32,
        /// Officers added to the pool as a level bonus.
        officers_granted: u32,
    },
}

impl NotificationKind {
    /// Short stable label for logs.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::ReportGenerated { .. } => "report_generated",
            Self::OfficerAssigned { .. } => "officer_assigned",
            Self::ReportResolved { .. } => "report_resolved",
            Self::PoolUpgraded { .. } => "pool_upgraded",
            Self::ReportTimedOut { .. } => "report_timed_out",
            Self::ReportCancelled { .. } => "report_cancelled",
            Self::DifficultyChanged { .. } => "difficulty_changed",
            Self::LevelReached { .. } => "level_reached",
        }
    }
}
