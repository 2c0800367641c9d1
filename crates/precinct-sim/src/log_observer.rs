//! Observer that turns dispatch notifications into log lines.
//!
//! Report lifecycle events log at `info`, per-officer and per-tick detail at
//! `debug`. The observer also keeps a handful of running tallies that `main`
//! prints when the shift ends.

use precinct_core::observer::DispatchObserver;
use precinct_core::tick::TickSummary;
use precinct_types::{Officer, OfficerId, Report};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

/// Logs every notification and counts what happened during the run.
#[derive(Debug, Default)]
pub struct LogObserver {
    generated: u64,
    assignments: u64,
    rejected: u64,
}

impl LogObserver {
    /// Create an observer with zeroed tallies.
    pub const fn new() -> Self {
        Self {
            generated: 0,
            assignments: 0,
            rejected: 0,
        }
    }

    /// Reports generated while this observer was attached.
    pub const fn reports_generated(&self) -> u64 {
        self.generated
    }

    /// Officer assignments seen while this observer was attached.
    pub const fn assignments(&self) -> u64 {
        self.assignments
    }

    /// Queued commands rejected while this observer was attached.
    pub const fn rejected_commands(&self) -> u64 {
        self.rejected
    }
}

impl DispatchObserver for LogObserver {
    fn on_report_generated(&mut self, at_ms: u64, report: &Report) {
        self.generated = self.generated.saturating_add(1);
        info!(
            at_ms,
            report_id = %report.id,
            severity = %report.severity,
            description = %report.description,
            officers_required = report.officers_required,
            deadline_ms = ?report.deadline_ms,
            "Report generated"
        );
    }

    fn on_officer_assigned(&mut self, at_ms: u64, officer: &Officer, report: &Report) {
        self.assignments = self.assignments.saturating_add(1);
        debug!(
            at_ms,
            officer_id = %officer.id,
            report_id = %report.id,
            assigned = report.assigned_count(),
            required = report.officers_required,
            "Officer assigned"
        );
    }

    fn on_report_resolved(
        &mut self,
        at_ms: u64,
        report: &Report,
        released: &[OfficerId],
        reward: i64,
    ) {
        info!(
            at_ms,
            report_id = %report.id,
            description = %report.description,
            released = released.len(),
            reward,
            "Report resolved"
        );
    }

    fn on_pool_upgraded(&mut self, at_ms: u64, added: u32, new_total: u32) {
        info!(at_ms, added, new_total, "Officer pool upgraded");
    }

    fn on_report_timed_out(
        &mut self,
        at_ms: u64,
        report: &Report,
        released: &[OfficerId],
        penalty: i64,
    ) {
        warn!(
            at_ms,
            report_id = %report.id,
            description = %report.description,
            released = released.len(),
            penalty,
            "Report timed out"
        );
    }

    fn on_report_cancelled(&mut self, at_ms: u64, report: &Report, released: &[OfficerId]) {
        info!(
            at_ms,
            report_id = %report.id,
            released = released.len(),
            "Report cancelled"
        );
    }

    fn on_difficulty_changed(&mut self, at_ms: u64, previous: Decimal, current: Decimal) {
        info!(at_ms, %previous, %current, "Difficulty changed");
    }

    fn on_level_reached(&mut self, at_ms: u64, level: u32, officers_granted: u32) {
        info!(at_ms, level, officers_granted, "Level reached");
    }

    fn on_tick(&mut self, summary: &TickSummary) {
        let rejected = u64::try_from(summary.rejected_commands.len()).unwrap_or(u64::MAX);
        self.rejected = self.rejected.saturating_add(rejected);
        debug!(
            tick = summary.tick,
            now_ms = summary.now_ms,
            active = summary.active_reports,
            idle = summary.idle_officers,
            score = summary.score,
            "Tick observed"
        );
    }
}
