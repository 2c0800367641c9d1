//! The dispatch session: one context object holding all mutable state.
//!
//! A [`DispatchSession`] owns the clock, the timer queue, the officer pool,
//! the report book, the score, and the seeded RNG. Immediate commands take
//! `&mut self`, so they can never interleave with a tick. Every command
//! either applies completely or returns a [`DispatchError`] with the session
//! untouched, and every applied change pushes a [`Notification`] onto the
//! outbox, which the tick cycle drains once per tick.

use std::collections::VecDeque;

use precinct_types::{
    Notification, NotificationKind, Officer, OfficerId, Report, ReportId, ReportStatus,
    SaveGame, Scoreboard, Severity,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::allocator::{self, Assignment};
use crate::clock::{ClockError, SimClock};
use crate::command::Command;
use crate::config::{ConfigError, DispatchConfig};
use crate::difficulty::{self, DifficultyCurve};
use crate::error::DispatchError;
use crate::generator;
use crate::persistence::{self, PersistenceError};
use crate::pool::OfficerPool;
use crate::progression::ProgressionCurve;
use crate::reports::ReportBook;
use crate::resolution;
use crate::timers::{TimerKind, TimerQueue};

/// A queued command that the allocation phase rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedCommand {
    /// The command as queued.
    pub command: Command,
    /// Why it was rejected.
    pub error: DispatchError,
}

/// Counts from draining the command inbox.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboxOutcome {
    /// Commands that applied.
    pub applied: u32,
    /// Commands that were rejected, in queue order.
    pub rejected: Vec<RejectedCommand>,
}

/// Parts a restored session is rebuilt from.
#[derive(Debug)]
pub(crate) struct RestoredParts {
    pub(crate) clock: SimClock,
    pub(crate) pool: OfficerPool,
    pub(crate) reports: ReportBook,
    pub(crate) score: Scoreboard,
    pub(crate) next_generation_ms: Option<u64>,
}

/// All mutable state of one dispatch session.
#[derive(Debug)]
pub struct DispatchSession {
    config: DispatchConfig,
    seed: u64,
    rng: StdRng,
    clock: SimClock,
    timers: TimerQueue,
    pool: OfficerPool,
    reports: ReportBook,
    score: Scoreboard,
    difficulty: Decimal,
    difficulty_curve: DifficultyCurve,
    progression: ProgressionCurve,
    inbox: VecDeque<Command>,
    outbox: Vec<Notification>,
}

impl DispatchSession {
    /// Start a fresh session: enlist the starting officers and schedule the
    /// first report.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the configuration fails
    /// validation.
    pub fn new(config: DispatchConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let seed = config.session.seed;
        let mut session = Self::empty(config, seed, StdRng::seed_from_u64(seed));
        let starting = session.config.pool.starting_officers;
        session.pool.enlist(&mut session.rng, starting);
        session.timers.schedule(
            session.config.generation.first_report_delay_ms,
            TimerKind::GenerateReport,
        );
        info!(
            session = %session.config.session.name,
            seed,
            officers = starting,
            "Dispatch session started"
        );
        Ok(session)
    }

    /// Rebuild a session from a save blob.
    ///
    /// The blob is checked against the data-model invariants before
    /// anything is built. The difficulty multiplier is recomputed from the
    /// saved score.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Config`] for an invalid configuration and
    /// [`PersistenceError::InvalidSnapshot`] for an inconsistent blob.
    pub fn restore(config: DispatchConfig, save: &SaveGame) -> Result<Self, PersistenceError> {
        config.validate()?;
        let parts = persistence::validate_save(save)?;
        Ok(Self::from_restored(config, save.seed, parts))
    }

    fn empty(config: DispatchConfig, seed: u64, rng: StdRng) -> Self {
        let difficulty_curve = DifficultyCurve::new(&config.difficulty);
        let progression = ProgressionCurve::new(&config.progression);
        Self {
            seed,
            rng,
            clock: SimClock::new(),
            timers: TimerQueue::new(),
            pool: OfficerPool::new(),
            reports: ReportBook::new(),
            score: Scoreboard::new(),
            difficulty: difficulty_curve.recompute(0),
            difficulty_curve,
            progression,
            inbox: VecDeque::new(),
            outbox: Vec::new(),
            config,
        }
    }

    fn from_restored(config: DispatchConfig, seed: u64, parts: RestoredParts) -> Self {
        // The saved RNG stream is not persisted; derive a fresh one from the
        // seed and the tick so a given save always resumes the same way.
        let resume_seed = seed
            .rotate_left(17)
            .wrapping_add(parts.clock.tick().wrapping_mul(0x9E37_79B9_7F4A_7C15));
        let mut session = Self::empty(config, seed, StdRng::seed_from_u64(resume_seed));
        session.clock = parts.clock;
        session.pool = parts.pool;
        session.reports = parts.reports;
        session.score = parts.score;
        session.difficulty = session.difficulty_curve.recompute(session.score.total);
        if let Some(due) = parts.next_generation_ms {
            session.timers.schedule(due, TimerKind::GenerateReport);
        }
        let deadlines: Vec<(u64, ReportId)> = session
            .reports
            .active()
            .iter()
            .filter_map(|r| r.deadline_ms.map(|d| (d, r.id)))
            .collect();
        for (due, id) in deadlines {
            session.timers.schedule(due, TimerKind::ReportDeadline(id));
        }
        info!(
            tick = session.clock.tick(),
            now_ms = session.clock.now_ms(),
            reports = session.reports.active_count(),
            officers = session.pool.total(),
            score = session.score.total,
            "Dispatch session restored"
        );
        session
    }

    // -----------------------------------------------------------------------
    // Immediate commands
    // -----------------------------------------------------------------------

    /// Generate a report with a difficulty-scaled severity roll.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidState`] if the drawn ID collides with
    /// an existing report.
    pub fn generate_report(&mut self) -> Result<Report, DispatchError> {
        let severity =
            generator::roll_severity(&mut self.rng, self.difficulty, &self.config.generation);
        self.spawn_report(severity)
    }

    /// Generate a report of a chosen tier (walk-in reports, scripted
    /// scenarios).
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidState`] if the drawn ID collides with
    /// an existing report.
    pub fn generate_report_with(&mut self, severity: Severity) -> Result<Report, DispatchError> {
        self.spawn_report(severity)
    }

    fn spawn_report(&mut self, severity: Severity) -> Result<Report, DispatchError> {
        let now = self.clock.now_ms();
        let report = generator::build_report(&mut self.rng, severity, &self.config.severity, now);
        if self.report_status(report.id).is_some() {
            return Err(DispatchError::InvalidState {
                reason: format!("report id {} already in use", report.id),
            });
        }
        if let Some(deadline) = report.deadline_ms {
            self.timers
                .schedule(deadline, TimerKind::ReportDeadline(report.id));
        }
        info!(
            report_id = %report.id,
            severity = %report.severity,
            description = %report.description,
            officers_required = report.officers_required,
            time_to_resolve_ms = report.time_to_resolve_ms,
            "Report generated"
        );
        self.reports.insert(report.clone());
        self.notify(NotificationKind::ReportGenerated {
            report: report.clone(),
        });
        Ok(report)
    }

    /// Attach one idle officer to `report_id`.
    ///
    /// # Errors
    ///
    /// See [`allocator::assign`]. The session is unchanged on error.
    pub fn assign_officer(&mut self, report_id: ReportId) -> Result<Assignment, DispatchError> {
        match allocator::assign(&mut self.reports, &mut self.pool, report_id) {
            Ok(assignment) => {
                info!(
                    %report_id,
                    officer_id = %assignment.officer.id,
                    assigned = assignment.report.assigned_count(),
                    required = assignment.report.officers_required,
                    "Officer assigned"
                );
                self.notify(NotificationKind::OfficerAssigned {
                    officer: assignment.officer.clone(),
                    report: assignment.report.clone(),
                });
                Ok(assignment)
            }
            Err(err) => {
                warn!(%report_id, %err, "Assignment rejected");
                Err(err)
            }
        }
    }

    /// Enlist `additional` officers. Returns the new pool size.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidInput`] if `additional` is zero.
    pub fn upgrade_pool(&mut self, additional: u32) -> Result<u32, DispatchError> {
        let new_total = self.pool.grow(&mut self.rng, additional).inspect_err(|err| {
            warn!(additional, %err, "Pool upgrade rejected");
        })?;
        info!(added = additional, new_total, "Officer pool upgraded");
        self.notify(NotificationKind::PoolUpgraded {
            added: additional,
            new_total,
        });
        Ok(new_total)
    }

    /// Withdraw an active report. Officers are released; the score does not
    /// change.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidState`] for a closed report and
    /// [`DispatchError::NotFound`] for an unknown one.
    pub fn cancel_report(&mut self, report_id: ReportId) -> Result<Report, DispatchError> {
        self.reports.lookup(report_id).inspect_err(|err| {
            warn!(%report_id, %err, "Cancellation rejected");
        })?;
        let (report, released) = self.close_report(report_id, ReportStatus::Cancelled)?;
        info!(%report_id, released = released.len(), "Report cancelled");
        self.notify(NotificationKind::ReportCancelled {
            report: report.clone(),
            released,
        });
        Ok(report)
    }

    /// Queue a command for the next allocation phase.
    pub fn queue_command(&mut self, command: Command) {
        debug!(%command, "Command queued");
        self.inbox.push_back(command);
    }

    /// Run one command immediately.
    ///
    /// # Errors
    ///
    /// Returns whatever the underlying command returns.
    pub fn execute(&mut self, command: Command) -> Result<(), DispatchError> {
        match command {
            Command::AssignOfficer(id) => self.assign_officer(id).map(|_| ()),
            Command::UpgradePool(n) => self.upgrade_pool(n).map(|_| ()),
            Command::GenerateReport(Some(severity)) => {
                self.generate_report_with(severity).map(|_| ())
            }
            Command::GenerateReport(None) => self.generate_report().map(|_| ()),
            Command::CancelReport(id) => self.cancel_report(id).map(|_| ()),
        }
    }

    /// Take every notification emitted since the last drain, in emission
    /// order.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.outbox)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Active reports in creation order.
    pub fn list_active_reports(&self) -> &[Report] {
        self.reports.active()
    }

    /// Idle officers in enlistment order.
    pub fn list_available_officers(&self) -> Vec<&Officer> {
        self.pool.available().collect()
    }

    /// Total points.
    pub const fn current_score(&self) -> i64 {
        self.score.total
    }

    /// Current difficulty multiplier.
    pub const fn current_difficulty(&self) -> Decimal {
        self.difficulty
    }

    /// Highest progression level reached.
    pub const fn current_level(&self) -> u32 {
        self.score.level
    }

    /// Score needed for the next level, or `None` past the last reachable one.
    pub fn next_level_points(&self) -> Option<u64> {
        self.progression
            .points_to_reach(self.score.level.saturating_add(1))
    }

    /// Score and progression counters.
    pub const fn scoreboard(&self) -> &Scoreboard {
        &self.score
    }

    /// An active report by ID.
    pub fn report(&self, id: ReportId) -> Option<&Report> {
        self.reports.get(id)
    }

    /// Status of any report this session has seen, active or closed.
    pub fn report_status(&self, id: ReportId) -> Option<ReportStatus> {
        self.reports
            .get(id)
            .map(|r| r.status)
            .or_else(|| self.reports.closed_status(id))
    }

    /// Terminal statuses of every closed report.
    pub fn closed_reports(&self) -> impl Iterator<Item = (ReportId, ReportStatus)> + '_ {
        self.reports.closed().iter().map(|(id, status)| (*id, *status))
    }

    /// Every officer in enlistment order.
    pub fn officers(&self) -> impl Iterator<Item = &Officer> {
        self.pool.iter()
    }

    /// An officer by ID.
    pub fn officer(&self, id: OfficerId) -> Option<&Officer> {
        self.pool.get(id)
    }

    /// Total officers.
    pub fn pool_size(&self) -> u32 {
        self.pool.total()
    }

    /// Officers not attached to any report.
    pub fn idle_officer_count(&self) -> u32 {
        self.pool.idle_count()
    }

    /// When the next generated report is due, if scheduled.
    pub fn next_generation_ms(&self) -> Option<u64> {
        self.timers.next_due(TimerKind::is_generation)
    }

    /// Commands waiting for the next allocation phase.
    pub fn pending_commands(&self) -> usize {
        self.inbox.len()
    }

    /// Current simulated time.
    pub const fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Ticks executed so far.
    pub const fn tick(&self) -> u64 {
        self.clock.tick()
    }

    /// Seed the session was started with.
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// The configuration the session runs with.
    pub const fn config(&self) -> &DispatchConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Tick phases
    // -----------------------------------------------------------------------

    pub(crate) fn advance_clock(&mut self, elapsed_ms: u64) -> Result<u64, ClockError> {
        self.clock.advance(elapsed_ms)
    }

    /// Fire every due generation timer. Returns the number of reports made.
    pub(crate) fn fire_generation(&mut self) -> Result<u32, DispatchError> {
        let now = self.clock.now_ms();
        let mut generated: u32 = 0;
        while let Some(fired) = self.timers.pop_due(now, TimerKind::is_generation) {
            self.generate_report()?;
            generated = generated.saturating_add(1);
            let interval =
                difficulty::generation_interval_ms(&self.config.generation, self.difficulty);
            match fired.due_ms.checked_add(interval) {
                Some(next) => {
                    self.timers.schedule(next, TimerKind::GenerateReport);
                    debug!(next_due_ms = next, interval, "Next report scheduled");
                }
                None => warn!(due_ms = fired.due_ms, "Generation clock exhausted"),
            }
        }
        Ok(generated)
    }

    /// Fire every deadline that fell inside the last `elapsed_ms`. Returns
    /// the number of timeouts.
    ///
    /// A staffed report whose work would finish strictly before its deadline
    /// within this tick is left for the progress step to resolve. Finishing
    /// at the deadline instant or later is a timeout.
    pub(crate) fn fire_deadlines(&mut self, elapsed_ms: u64) -> Result<u32, DispatchError> {
        let now = self.clock.now_ms();
        let tick_start = now.saturating_sub(elapsed_ms);
        let mut timed_out: u32 = 0;
        while let Some(fired) = self.timers.pop_due(now, TimerKind::is_deadline) {
            let TimerKind::ReportDeadline(report_id) = fired.kind else {
                continue;
            };
            let Some(report) = self.reports.get(report_id) else {
                debug!(%report_id, "Stale deadline ignored");
                continue;
            };
            let window = Decimal::from(fired.due_ms.saturating_sub(tick_start));
            if resolution::remaining_ms(report, &self.config.efficiency)?
                .is_some_and(|left| left < window)
            {
                debug!(%report_id, due_ms = fired.due_ms, "Completes before deadline");
                continue;
            }
            self.time_out(report_id)?;
            timed_out = timed_out.saturating_add(1);
        }
        Ok(timed_out)
    }

    /// Advance progress on every active report and resolve completions.
    /// Returns the number of reports resolved.
    pub(crate) fn advance_reports(&mut self, elapsed_ms: u64) -> Result<u32, DispatchError> {
        let mut completed = Vec::new();
        for report in self.reports.active_mut() {
            if resolution::advance(report, elapsed_ms, &self.config.efficiency)? {
                completed.push(report.id);
            }
        }
        let mut resolved: u32 = 0;
        for report_id in completed {
            self.resolve(report_id)?;
            resolved = resolved.saturating_add(1);
        }
        Ok(resolved)
    }

    /// Run every queued command in FIFO order.
    pub(crate) fn drain_inbox(&mut self) -> InboxOutcome {
        let mut outcome = InboxOutcome::default();
        while let Some(command) = self.inbox.pop_front() {
            match self.execute(command) {
                Ok(()) => outcome.applied = outcome.applied.saturating_add(1),
                Err(error) => outcome.rejected.push(RejectedCommand { command, error }),
            }
        }
        outcome
    }

    /// Recompute difficulty from score and grant any new levels.
    pub(crate) fn apply_progression(&mut self) -> Result<(), DispatchError> {
        let current = self.difficulty_curve.recompute(self.score.total);
        if current != self.difficulty {
            let previous = self.difficulty;
            self.difficulty = current;
            info!(%previous, %current, score = self.score.total, "Difficulty changed");
            self.notify(NotificationKind::DifficultyChanged { previous, current });
        }

        let level = self.progression.level_for_score(self.score.total);
        if level <= self.score.level {
            return Ok(());
        }
        let gained = level.saturating_sub(self.score.level);
        let granted = self
            .config
            .progression
            .officers_per_level
            .checked_mul(gained)
            .ok_or(DispatchError::ArithmeticOverflow {
                context: "level-up officer grant",
            })?;
        if granted > 0 {
            let new_total = self.pool.grow(&mut self.rng, granted)?;
            self.notify(NotificationKind::PoolUpgraded {
                added: granted,
                new_total,
            });
        }
        self.score.level = level;
        let next_level_at = self.progression.points_to_reach(level.saturating_add(1));
        info!(level, officers_granted = granted, ?next_level_at, "Level reached");
        self.notify(NotificationKind::LevelReached {
            level,
            officers_granted: granted,
        });
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Closing reports
    // -----------------------------------------------------------------------

    fn resolve(&mut self, report_id: ReportId) -> Result<(), DispatchError> {
        let reward = self
            .reports
            .get(report_id)
            .ok_or(DispatchError::report_not_found(report_id))?
            .reward;
        let total = self
            .score
            .total
            .checked_add(reward)
            .ok_or(DispatchError::ArithmeticOverflow { context: "score" })?;
        let count = self
            .score
            .reports_resolved
            .checked_add(1)
            .ok_or(DispatchError::ArithmeticOverflow {
                context: "resolved counter",
            })?;

        let (report, released) = self.close_report(report_id, ReportStatus::Resolved)?;
        self.score.total = total;
        self.score.reports_resolved = count;
        info!(%report_id, reward, score = total, released = released.len(), "Report resolved");
        self.notify(NotificationKind::ReportResolved {
            report,
            released,
            reward,
        });
        Ok(())
    }

    fn time_out(&mut self, report_id: ReportId) -> Result<(), DispatchError> {
        let penalty = self
            .reports
            .get(report_id)
            .ok_or(DispatchError::report_not_found(report_id))?
            .penalty;
        let total = self
            .score
            .total
            .checked_sub(penalty)
            .ok_or(DispatchError::ArithmeticOverflow { context: "score" })?;
        let count = self
            .score
            .reports_timed_out
            .checked_add(1)
            .ok_or(DispatchError::ArithmeticOverflow {
                context: "timed-out counter",
            })?;

        let (report, released) = self.close_report(report_id, ReportStatus::TimedOut)?;
        self.score.total = total;
        self.score.reports_timed_out = count;
        warn!(%report_id, penalty, score = total, released = released.len(), "Report timed out");
        self.notify(NotificationKind::ReportTimedOut {
            report,
            released,
            penalty,
        });
        Ok(())
    }

    fn close_report(
        &mut self,
        report_id: ReportId,
        status: ReportStatus,
    ) -> Result<(Report, Vec<OfficerId>), DispatchError> {
        let mut report = self
            .reports
            .close(report_id, status)
            .ok_or(DispatchError::report_not_found(report_id))?;
        let released = resolution::release_officers(&mut report, &mut self.pool);
        self.timers.cancel_report(report_id);
        Ok((report, released))
    }

    fn notify(&mut self, kind: NotificationKind) {
        self.outbox.push(Notification {
            tick: self.clock.tick(),
            at_ms: self.clock.now_ms(),
            kind,
        });
    }
}
