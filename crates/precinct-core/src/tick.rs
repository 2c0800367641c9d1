//! Tick cycle: the six-phase loop that drives a dispatch session.
//!
//! Each tick runs through these phases, in order:
//!
//! 1. **Clock** -- advance simulated time by `elapsed_ms`.
//!
//! 2. **Generation** -- fire due generation timers. Each fire produces one
//!    report and schedules the next at the current difficulty.
//!
//! 3. **Resolution** -- fire due deadline timers first, then advance progress
//!    on every remaining active report and resolve completions. A report
//!    closed by its deadline cannot also resolve in the same tick, so its
//!    officers are released exactly once. Within one long tick, a report
//!    whose work finishes strictly before its deadline resolves instead of
//!    timing out; a tie goes to the deadline.
//!
//! 4. **Allocation** -- ask the [`DispatchPolicy`] for commands, append them
//!    to the inbox behind anything the consuming layer queued, and run the
//!    inbox in FIFO order.
//!
//! 5. **Progression** -- recompute difficulty from score and grant any new
//!    levels.
//!
//! 6. **Flush** -- drain the outbox into the [`TickSummary`].
//!
//! Given the same seed, configuration, and commands, a session replays
//! identically.

use precinct_types::Notification;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::clock::ClockError;
use crate::error::DispatchError;
use crate::policy::DispatchPolicy;
use crate::session::{DispatchSession, RejectedCommand};

/// Errors that can occur during tick execution.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// A clock operation failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// A phase hit an unrecoverable dispatch error.
    #[error("dispatch error in {phase} phase: {source}")]
    Dispatch {
        /// The phase that failed.
        phase: &'static str,
        /// The underlying dispatch error.
        source: DispatchError,
    },
}

/// Summary of a completed tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickSummary {
    /// The tick number that was executed.
    pub tick: u64,
    /// Simulated time at the end of the tick.
    pub now_ms: u64,
    /// Reports generated by timers this tick.
    pub reports_generated: u32,
    /// Reports that resolved this tick.
    pub reports_resolved: u32,
    /// Reports that hit their deadline this tick.
    pub reports_timed_out: u32,
    /// Queued commands that applied.
    pub commands_applied: u32,
    /// Queued commands that were rejected, in queue order.
    pub rejected_commands: Vec<RejectedCommand>,
    /// Active reports at end of tick.
    pub active_reports: u32,
    /// Idle officers at end of tick.
    pub idle_officers: u32,
    /// Total officers at end of tick.
    pub total_officers: u32,
    /// Score at end of tick.
    pub score: i64,
    /// Difficulty multiplier at end of tick.
    pub difficulty: Decimal,
    /// Progression level at end of tick.
    pub level: u32,
    /// Every notification emitted since the previous flush, in order.
    pub notifications: Vec<Notification>,
}

fn phase_err(phase: &'static str) -> impl FnOnce(DispatchError) -> TickError {
    move |source| TickError::Dispatch { phase, source }
}

/// Execute one complete tick of `elapsed_ms` simulated milliseconds.
pub fn run_tick(
    session: &mut DispatchSession,
    elapsed_ms: u64,
    policy: &mut dyn DispatchPolicy,
) -> Result<TickSummary, TickError> {
    // --- Phase 1: Clock ---
    let tick = session.advance_clock(elapsed_ms)?;
    debug!(tick, now_ms = session.now_ms(), elapsed_ms, "Tick started");

    // --- Phase 2: Generation ---
    let reports_generated = session
        .fire_generation()
        .map_err(phase_err("generation"))?;

    // --- Phase 3: Resolution ---
    let reports_timed_out = session
        .fire_deadlines(elapsed_ms)
        .map_err(phase_err("resolution"))?;
    let reports_resolved = session
        .advance_reports(elapsed_ms)
        .map_err(phase_err("resolution"))?;

    // --- Phase 4: Allocation ---
    let planned = policy.plan(session);
    for command in planned {
        session.queue_command(command);
    }
    let inbox = session.drain_inbox();
    for rejected in &inbox.rejected {
        debug!(tick, command = %rejected.command, error = %rejected.error, "Command rejected");
    }

    // --- Phase 5: Progression ---
    session
        .apply_progression()
        .map_err(phase_err("progression"))?;

    // --- Phase 6: Flush ---
    let notifications = session.drain_notifications();

    let summary = TickSummary {
        tick,
        now_ms: session.now_ms(),
        reports_generated,
        reports_resolved,
        reports_timed_out,
        commands_applied: inbox.applied,
        rejected_commands: inbox.rejected,
        active_reports: u32::try_from(session.list_active_reports().len()).unwrap_or(u32::MAX),
        idle_officers: session.idle_officer_count(),
        total_officers: session.pool_size(),
        score: session.current_score(),
        difficulty: session.current_difficulty(),
        level: session.current_level(),
        notifications,
    };

    if summary.reports_generated > 0 || summary.reports_resolved > 0 || summary.reports_timed_out > 0
    {
        info!(
            tick,
            generated = summary.reports_generated,
            resolved = summary.reports_resolved,
            timed_out = summary.reports_timed_out,
            active = summary.active_reports,
            idle = summary.idle_officers,
            score = summary.score,
            "Tick completed"
        );
    }

    Ok(summary)
}
