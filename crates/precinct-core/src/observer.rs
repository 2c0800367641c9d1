//! Outbound notification routing.
//!
//! Consumers that prefer callbacks over matching on
//! [`NotificationKind`] implement [`DispatchObserver`] and override only the
//! events they care about. [`deliver`] routes one drained notification to the
//! matching method. The runner calls it for every notification, in emission
//! order, and then calls [`DispatchObserver::on_tick`] with the summary.

use precinct_types::{Notification, NotificationKind, Officer, OfficerId, Report};
use rust_decimal::Decimal;

use crate::tick::TickSummary;

/// Receiver for outbound dispatch events. Every method defaults to a no-op.
pub trait DispatchObserver {
    /// A report entered the active set.
    fn on_report_generated(&mut self, _at_ms: u64, _report: &Report) {}

    /// An officer was attached to a report.
    fn on_officer_assigned(&mut self, _at_ms: u64, _officer: &Officer, _report: &Report) {}

    /// A report resolved and paid `reward`.
    fn on_report_resolved(
        &mut self,
        _at_ms: u64,
        _report: &Report,
        _released: &[OfficerId],
        _reward: i64,
    ) {
    }

    /// The officer pool grew.
    fn on_pool_upgraded(&mut self, _at_ms: u64, _added: u32, _new_total: u32) {}

    /// A report timed out and cost `penalty`.
    fn on_report_timed_out(
        &mut self,
        _at_ms: u64,
        _report: &Report,
        _released: &[OfficerId],
        _penalty: i64,
    ) {
    }

    /// A report was cancelled.
    fn on_report_cancelled(&mut self, _at_ms: u64, _report: &Report, _released: &[OfficerId]) {}

    /// The difficulty multiplier moved.
    fn on_difficulty_changed(&mut self, _at_ms: u64, _previous: Decimal, _current: Decimal) {}

    /// A new progression level was reached.
    fn on_level_reached(&mut self, _at_ms: u64, _level: u32, _officers_granted: u32) {}

    /// A tick finished; called after its notifications were delivered.
    fn on_tick(&mut self, _summary: &TickSummary) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl DispatchObserver for NoOpObserver {}

/// Route one notification to the matching observer method.
pub fn deliver(observer: &mut dyn DispatchObserver, notification: &Notification) {
    let at = notification.at_ms;
    match &notification.kind {
        NotificationKind::ReportGenerated { report } => observer.on_report_generated(at, report),
        NotificationKind::OfficerAssigned { officer, report } => {
            observer.on_officer_assigned(at, officer, report);
        }
        NotificationKind::ReportResolved {
            report,
            released,
            reward,
        } => observer.on_report_resolved(at, report, released, *reward),
        NotificationKind::PoolUpgraded { added, new_total } => {
            observer.on_pool_upgraded(at, *added, *new_total);
        }
        NotificationKind::ReportTimedOut {
            report,
            released,
            penalty,
        } => observer.on_report_timed_out(at, report, released, *penalty),
        NotificationKind::ReportCancelled { report, released } => {
            observer.on_report_cancelled(at, report, released);
        }
        NotificationKind::DifficultyChanged { previous, current } => {
            observer.on_difficulty_changed(at, *previous, *current);
        }
        NotificationKind::LevelReached {
            level,
            officers_granted,
        } => observer.on_level_reached(at, *level, *officers_granted),
    }
}
