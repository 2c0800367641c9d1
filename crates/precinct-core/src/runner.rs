//! Bounded session runner.
//!
//! [`run_session`] drives the tick loop until the shift is over or a tick
//! limit is hit. It steps simulated time directly and never sleeps, so a
//! five-minute shift runs as fast as the host can execute ticks. Hosts that
//! want real-time pacing call [`run_tick`] themselves.
//!
//! [`run_tick`]: crate::tick::run_tick

use precinct_types::SessionEndReason;
use tracing::{info, warn};

use crate::config::SessionConfig;
use crate::observer::{self, DispatchObserver};
use crate::policy::DispatchPolicy;
use crate::session::DispatchSession;
use crate::tick::{self, TickError, TickSummary};

/// Errors that can occur during the session run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A tick execution failed.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },

    /// Neither a tick limit nor a session length was given.
    #[error("session is unbounded: set max_ticks or max_session_ms")]
    Unbounded,
}

/// Limits for a bounded run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionBounds {
    /// Simulated milliseconds per tick.
    pub tick_interval_ms: u64,
    /// Stop once the session has run this many ticks (0 = no limit).
    pub max_ticks: u64,
    /// Stop once simulated time reaches this (0 = no limit).
    pub max_session_ms: u64,
}

impl SessionBounds {
    /// Bounds from the session section of the configuration.
    pub const fn from_config(config: &SessionConfig) -> Self {
        Self {
            tick_interval_ms: config.tick_interval_ms,
            max_ticks: config.max_ticks,
            max_session_ms: config.max_session_ms,
        }
    }

    const fn tick_limit_reached(&self, tick: u64) -> bool {
        self.max_ticks > 0 && tick >= self.max_ticks
    }

    const fn time_limit_reached(&self, now_ms: u64) -> bool {
        self.max_session_ms > 0 && now_ms >= self.max_session_ms
    }

    /// Length of the next tick: the configured interval, cut short so the
    /// last tick ends exactly at the session length.
    fn next_step(&self, now_ms: u64) -> u64 {
        if self.max_session_ms == 0 {
            return self.tick_interval_ms;
        }
        self.tick_interval_ms
            .min(self.max_session_ms.saturating_sub(now_ms))
    }
}

/// Result of a session run.
#[derive(Debug)]
pub struct SessionResult {
    /// The reason the run ended.
    pub end_reason: SessionEndReason,
    /// The last tick summary, if any tick ran.
    pub final_summary: Option<TickSummary>,
    /// Ticks executed by this run.
    pub total_ticks: u64,
}

/// Run the tick loop until a bound is reached.
///
/// Limits are checked against the session's own tick counter and clock, so
/// a restored session stops at the same point an uninterrupted one would.
/// When both limits are hit by the same tick, the session-time limit wins.
///
/// # Errors
///
/// Returns [`RunnerError::Unbounded`] if no limit is set, or
/// [`RunnerError::Tick`] if a tick fails.
pub fn run_session(
    session: &mut DispatchSession,
    policy: &mut dyn DispatchPolicy,
    observer: &mut dyn DispatchObserver,
    bounds: SessionBounds,
) -> Result<SessionResult, RunnerError> {
    if bounds.max_ticks == 0 && bounds.max_session_ms == 0 {
        return Err(RunnerError::Unbounded);
    }

    let mut last_summary: Option<TickSummary> = None;
    let mut total_ticks: u64 = 0;

    info!(
        max_ticks = bounds.max_ticks,
        max_session_ms = bounds.max_session_ms,
        tick_interval_ms = bounds.tick_interval_ms,
        "Session run starting"
    );

    loop {
        if bounds.time_limit_reached(session.now_ms()) {
            info!(now_ms = session.now_ms(), "Shift over");
            return Ok(SessionResult {
                end_reason: SessionEndReason::SessionTimeElapsed,
                final_summary: last_summary,
                total_ticks,
            });
        }
        if bounds.tick_limit_reached(session.tick()) {
            info!(tick = session.tick(), max_ticks = bounds.max_ticks, "Tick limit reached");
            return Ok(SessionResult {
                end_reason: SessionEndReason::MaxTicksReached,
                final_summary: last_summary,
                total_ticks,
            });
        }

        let step = bounds.next_step(session.now_ms());
        let summary = tick::run_tick(session, step, policy)?;
        total_ticks = total_ticks.saturating_add(1);

        for notification in &summary.notifications {
            observer::deliver(observer, notification);
        }
        observer.on_tick(&summary);

        last_summary = Some(summary);
    }
}

/// Log the end of a session run.
pub fn log_session_end(result: &SessionResult, session: &DispatchSession) {
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        now_ms = session.now_ms(),
        score = session.current_score(),
        level = session.current_level(),
        difficulty = %session.current_difficulty(),
        resolved = session.scoreboard().reports_resolved,
        timed_out = session.scoreboard().reports_timed_out,
        "Session ended"
    );

    if let Some(ref summary) = result.final_summary {
        info!(
            tick = summary.tick,
            active_reports = summary.active_reports,
            idle_officers = summary.idle_officers,
            total_officers = summary.total_officers,
            "Final tick summary"
        );
    } else {
        warn!("Session ended with no ticks executed");
    }
}
