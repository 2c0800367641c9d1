//! Deferred completions driven by simulated time.
//!
//! Report generation and report deadlines are both "do this at time T"
//! actions. They live in one [`TimerQueue`] ordered by `(due_ms, sequence)`,
//! and each tick phase pops only the kind of timer it owns. Nothing fires on
//! its own: the tick cycle asks for due timers after the clock advances.

use std::collections::BTreeMap;

use precinct_types::ReportId;

/// What a timer does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Generate the next report and reschedule.
    GenerateReport,
    /// Time out the given report if it is still active.
    ReportDeadline(ReportId),
}

impl TimerKind {
    /// Whether this is a report generation timer.
    pub const fn is_generation(&self) -> bool {
        matches!(self, Self::GenerateReport)
    }

    /// Whether this is a deadline timer.
    pub const fn is_deadline(&self) -> bool {
        matches!(self, Self::ReportDeadline(_))
    }
}

/// A timer popped from the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiredTimer {
    /// Simulated time the timer was due.
    pub due_ms: u64,
    /// What to do.
    pub kind: TimerKind,
}

/// Pending timers ordered by due time, then by scheduling order.
#[derive(Debug, Clone, Default)]
pub struct TimerQueue {
    entries: BTreeMap<(u64, u64), TimerKind>,
    next_seq: u64,
}

impl TimerQueue {
    /// An empty queue.
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_seq: 0,
        }
    }

    /// Schedule `kind` to fire once simulated time reaches `due_ms`.
    pub fn schedule(&mut self, due_ms: u64, kind: TimerKind) {
        let seq = self.next_seq;
        // A session cannot schedule 2^64 timers; wrap rather than panic.
        self.next_seq = self.next_seq.wrapping_add(1);
        self.entries.insert((due_ms, seq), kind);
    }

    /// Cancel every deadline timer for `report_id`. Returns how many were
    /// removed.
    pub fn cancel_report(&mut self, report_id: ReportId) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, kind| *kind != TimerKind::ReportDeadline(report_id));
        before.saturating_sub(self.entries.len())
    }

    /// Pop the earliest timer due at or before `now_ms` that matches
    /// `filter`. Timers that do not match stay queued.
    pub fn pop_due<F>(&mut self, now_ms: u64, filter: F) -> Option<FiredTimer>
    where
        F: Fn(&TimerKind) -> bool,
    {
        let key = self
            .entries
            .iter()
            .take_while(|((due, _), _)| *due <= now_ms)
            .find(|(_, kind)| filter(kind))
            .map(|(key, _)| *key)?;
        let kind = self.entries.remove(&key)?;
        Some(FiredTimer {
            due_ms: key.0,
            kind,
        })
    }

    /// Due time of the earliest pending timer matching `filter`.
    pub fn next_due<F>(&self, filter: F) -> Option<u64>
    where
        F: Fn(&TimerKind) -> bool,
    {
        self.entries
            .iter()
            .find(|(_, kind)| filter(kind))
            .map(|((due, _), _)| *due)
    }

    /// Number of pending timers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no timers are pending.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
