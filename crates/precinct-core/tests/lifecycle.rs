//! End-to-end tests for the crime lifecycle and officer allocation loop.
//!
//! Every test drives a real `DispatchSession` through the public API:
//! immediate commands, queued commands, ticks, and bounded runs. Automatic
//! generation is pushed out of the way where a test wants to control exactly
//! which reports exist.

// Scenario tests unwrap freely; a panic is a test failure.
#![allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    clippy::missing_panics_doc,
    clippy::too_many_lines
)]

use std::collections::BTreeMap;

use precinct_core::command::Command;
use precinct_core::config::DispatchConfig;
use precinct_core::error::{CapacityShortfall, DispatchError};
use precinct_core::observer::DispatchObserver;
use precinct_core::persistence::{decode_blob, encode_blob, save_game};
use precinct_core::policy::{GreedyPolicy, IdlePolicy};
use precinct_core::runner::{SessionBounds, run_session};
use precinct_core::session::DispatchSession;
use precinct_core::tick::{TickSummary, run_tick};
use precinct_types::{
    Notification, NotificationKind, OfficerId, Report, ReportId, ReportStatus, SessionEndReason,
    Severity,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const TICK_MS: u64 = 100;

/// Default tuning with automatic generation disabled.
fn quiet_config() -> DispatchConfig {
    let mut config = DispatchConfig::default();
    config.generation.first_report_delay_ms = u64::MAX;
    config
}

fn tick(session: &mut DispatchSession) -> TickSummary {
    run_tick(session, TICK_MS, &mut IdlePolicy::new()).unwrap()
}

fn run_ticks(session: &mut DispatchSession, count: u64) -> Vec<Notification> {
    let mut notes = Vec::new();
    for _ in 0..count {
        notes.extend(tick(session).notifications);
    }
    notes
}

/// Officers idle plus officers attached to active reports equals the pool,
/// and every attachment is mirrored on both sides.
fn assert_pool_accounting(session: &DispatchSession) {
    let idle = session.list_available_officers().len();
    let attached: usize = session
        .list_active_reports()
        .iter()
        .map(|r| r.assigned.len())
        .sum();
    assert_eq!(
        idle + attached,
        session.pool_size() as usize,
        "idle + attached must equal pool size"
    );
    for report in session.list_active_reports() {
        for officer_id in &report.assigned {
            let officer = session.officer(*officer_id).unwrap();
            assert_eq!(officer.assignment, Some(report.id));
        }
    }
    for officer in session.officers() {
        if let Some(report_id) = officer.assignment {
            let report = session.report(report_id).unwrap();
            assert!(report.assigned.contains(&officer.id));
        }
    }
}

#[derive(Default)]
struct Recorder {
    resolved: Vec<(ReportId, Vec<OfficerId>, i64)>,
    timed_out: Vec<(ReportId, Vec<OfficerId>, i64)>,
    generated: Vec<Report>,
    ticks: u64,
}

impl DispatchObserver for Recorder {
    fn on_report_generated(&mut self, _at_ms: u64, report: &Report) {
        self.generated.push(report.clone());
    }

    fn on_report_resolved(
        &mut self,
        _at_ms: u64,
        report: &Report,
        released: &[OfficerId],
        reward: i64,
    ) {
        self.resolved.push((report.id, released.to_vec(), reward));
    }

    fn on_report_timed_out(
        &mut self,
        _at_ms: u64,
        report: &Report,
        released: &[OfficerId],
        penalty: i64,
    ) {
        self.timed_out.push((report.id, released.to_vec(), penalty));
    }

    fn on_tick(&mut self, _summary: &TickSummary) {
        self.ticks += 1;
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn high_report_needs_pool_upgrade_before_assignment() {
    let mut config = quiet_config();
    config.severity.high.officers_min = 5;
    config.severity.high.officers_max = 5;
    let mut session = DispatchSession::new(config).unwrap();
    assert_eq!(session.pool_size(), 3);

    let report = session.generate_report_with(Severity::High).unwrap();
    assert_eq!(report.officers_required, 5);

    let err = session.assign_officer(report.id).unwrap_err();
    assert!(matches!(
        err,
        DispatchError::InsufficientCapacity {
            shortfall: CapacityShortfall::PoolTooSmall {
                required: 5,
                reachable: 3
            },
            ..
        }
    ));

    session.upgrade_pool(1).unwrap();
    assert!(matches!(
        session.assign_officer(report.id),
        Err(DispatchError::InsufficientCapacity { .. })
    ));

    assert_eq!(session.upgrade_pool(1).unwrap(), 5);
    for _ in 0..5 {
        session.assign_officer(report.id).unwrap();
    }
    let staffed = session.report(report.id).unwrap();
    assert!(staffed.is_fully_staffed());
    assert_eq!(session.idle_officer_count(), 0);
    assert_pool_accounting(&session);
}

#[test]
fn low_report_resolves_after_thirty_seconds() {
    let mut session = DispatchSession::new(quiet_config()).unwrap();
    let report = session.generate_report_with(Severity::Low).unwrap();
    assert_eq!(report.officers_required, 1);
    assert_eq!(report.time_to_resolve_ms, 30_000);

    let assignment = session.assign_officer(report.id).unwrap();
    let officer_id = assignment.officer.id;

    run_ticks(&mut session, 299);
    let pending = session.report(report.id).unwrap();
    assert!(!pending.is_resolved());
    assert!(pending.progress < Decimal::ONE);
    assert_eq!(session.current_score(), 0);

    let notes = run_ticks(&mut session, 1);
    assert_eq!(session.now_ms(), 30_000);
    assert_eq!(session.report_status(report.id), Some(ReportStatus::Resolved));
    assert!(session.report(report.id).is_none());
    assert_eq!(session.current_score(), 10);
    assert!(session.officer(officer_id).unwrap().is_available());

    let resolved = notes
        .iter()
        .find_map(|n| match &n.kind {
            NotificationKind::ReportResolved {
                report,
                released,
                reward,
            } => Some((report.clone(), released.clone(), *reward)),
            _ => None,
        })
        .unwrap();
    assert_eq!(resolved.0.status, ReportStatus::Resolved);
    assert_eq!(resolved.0.progress, Decimal::ONE);
    assert_eq!(resolved.1, vec![officer_id]);
    assert_eq!(resolved.2, 10);
}

#[test]
fn timeout_in_the_same_tick_as_completion_releases_once() {
    let mut config = quiet_config();
    config.severity.low.deadline_ms = Some(30_000);
    let mut session = DispatchSession::new(config).unwrap();

    let report = session.generate_report_with(Severity::Low).unwrap();
    let officer_id = session.assign_officer(report.id).unwrap().officer.id;
    session.drain_notifications();

    // Completion and deadline both land at 30 000 ms.
    let notes = run_ticks(&mut session, 300);

    let timeouts: Vec<&NotificationKind> = notes
        .iter()
        .map(|n| &n.kind)
        .filter(|k| matches!(k, NotificationKind::ReportTimedOut { .. }))
        .collect();
    let resolutions = notes
        .iter()
        .filter(|n| matches!(n.kind, NotificationKind::ReportResolved { .. }))
        .count();
    assert_eq!(timeouts.len(), 1);
    assert_eq!(resolutions, 0);
    if let Some(NotificationKind::ReportTimedOut {
        released, penalty, ..
    }) = timeouts.first()
    {
        assert_eq!(released, &vec![officer_id]);
        assert_eq!(*penalty, 5);
    }

    assert_eq!(session.report_status(report.id), Some(ReportStatus::TimedOut));
    assert_eq!(session.current_score(), -5);
    assert_eq!(session.scoreboard().reports_timed_out, 1);
    assert_eq!(session.scoreboard().reports_resolved, 0);
    assert_eq!(session.idle_officer_count(), 3);
    assert_pool_accounting(&session);

    // Negative score does not push difficulty below the base multiplier.
    assert_eq!(session.current_difficulty(), Decimal::ONE);
}

#[test]
fn timeout_penalizes_partially_staffed_report() {
    let mut config = quiet_config();
    config.severity.moderate.officers_min = 3;
    config.severity.moderate.officers_max = 3;
    let mut session = DispatchSession::new(config).unwrap();

    let report = session.generate_report_with(Severity::Moderate).unwrap();
    session.assign_officer(report.id).unwrap();
    session.assign_officer(report.id).unwrap();

    // Default Moderate deadline: 180 s.
    run_ticks(&mut session, 1_799);
    assert!(session.report(report.id).is_some());
    assert_eq!(session.report(report.id).unwrap().progress, Decimal::ZERO);

    run_ticks(&mut session, 1);
    assert_eq!(session.report_status(report.id), Some(ReportStatus::TimedOut));
    assert_eq!(session.current_score(), -12);
    assert_eq!(session.idle_officer_count(), 3);
}

#[test]
fn level_up_grants_officers_and_raises_difficulty() {
    let mut config = quiet_config();
    config.severity.low.reward = 100;
    let mut session = DispatchSession::new(config).unwrap();

    let report = session.generate_report_with(Severity::Low).unwrap();
    session.assign_officer(report.id).unwrap();
    session.drain_notifications();
    let notes = run_ticks(&mut session, 300);

    assert_eq!(session.current_score(), 100);
    assert_eq!(session.current_level(), 2);
    assert_eq!(session.pool_size(), 5);
    assert_eq!(session.current_difficulty(), dec!(1.1));
    assert_eq!(session.next_level_points(), Some(200));

    let labels: Vec<&str> = notes.iter().map(|n| n.kind.label()).collect();
    assert_eq!(
        labels,
        vec![
            "report_resolved",
            "difficulty_changed",
            "pool_upgraded",
            "level_reached"
        ]
    );
}

#[test]
fn levels_are_kept_when_score_drops() {
    let mut config = quiet_config();
    config.severity.low.reward = 100;
    config.severity.high.penalty = 500;
    config.severity.high.deadline_ms = Some(1_000);
    let mut session = DispatchSession::new(config).unwrap();

    let low = session.generate_report_with(Severity::Low).unwrap();
    session.assign_officer(low.id).unwrap();
    run_ticks(&mut session, 300);
    assert_eq!(session.current_level(), 2);

    session.generate_report_with(Severity::High).unwrap();
    run_ticks(&mut session, 10);
    assert_eq!(session.current_score(), -400);
    assert_eq!(session.current_level(), 2);
    assert_eq!(session.pool_size(), 5);
    assert_eq!(session.current_difficulty(), Decimal::ONE);
}

#[test]
fn cancelled_report_frees_officers_without_score_change() {
    let mut session = DispatchSession::new(quiet_config()).unwrap();
    let report = session.generate_report_with(Severity::Low).unwrap();
    session.assign_officer(report.id).unwrap();
    run_ticks(&mut session, 100);

    session.queue_command(Command::CancelReport(report.id));
    session.queue_command(Command::AssignOfficer(report.id));
    let summary = tick(&mut session);

    assert_eq!(summary.commands_applied, 1);
    assert!(matches!(
        summary.rejected_commands.first().map(|r| &r.error),
        Some(DispatchError::InvalidState { .. })
    ));
    assert_eq!(session.current_score(), 0);
    assert_eq!(session.idle_officer_count(), 3);

    // The cancelled report's deadline never fires.
    let later = run_ticks(&mut session, 1_000);
    assert!(
        later
            .iter()
            .all(|n| !matches!(n.kind, NotificationKind::ReportTimedOut { .. }))
    );
}

#[test]
fn unknown_report_is_not_found() {
    let mut session = DispatchSession::new(quiet_config()).unwrap();
    let err = session.assign_officer(ReportId::new()).unwrap_err();
    assert!(matches!(err, DispatchError::NotFound { .. }));
    let err = session.cancel_report(ReportId::new()).unwrap_err();
    assert!(matches!(err, DispatchError::NotFound { .. }));
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

#[test]
fn pool_accounting_holds_under_random_operations() {
    let mut rng = StdRng::seed_from_u64(2024);
    let mut session = DispatchSession::new(DispatchConfig::default()).unwrap();

    for _ in 0..3_000 {
        match rng.random_range(0..10_u32) {
            0 => {
                let _ = session.generate_report();
            }
            1 => {
                let _ = session.upgrade_pool(rng.random_range(0..3));
            }
            2 => {
                let active = session.list_active_reports();
                if !active.is_empty() {
                    let id = active[rng.random_range(0..active.len())].id;
                    let _ = session.cancel_report(id);
                }
            }
            3..=5 => {
                let active = session.list_active_reports();
                if !active.is_empty() {
                    let id = active[rng.random_range(0..active.len())].id;
                    let _ = session.assign_officer(id);
                }
            }
            _ => {
                let elapsed = rng.random_range(0..2_000);
                run_tick(&mut session, elapsed, &mut IdlePolicy::new()).unwrap();
            }
        }
        assert_pool_accounting(&session);
        for report in session.list_active_reports() {
            assert!(report.assigned_count() <= report.staffing_cap());
            assert!(report.progress >= Decimal::ZERO && report.progress <= Decimal::ONE);
        }
    }
}

#[test]
fn progress_moves_only_while_fully_staffed() {
    let mut session = DispatchSession::new(DispatchConfig::default()).unwrap();
    session.upgrade_pool(6).unwrap();
    let mut rng = StdRng::seed_from_u64(77);

    for step in 0..2_000_u32 {
        if step % 40 == 0 {
            let active: Vec<ReportId> =
                session.list_active_reports().iter().map(|r| r.id).collect();
            for id in active {
                if rng.random_bool(0.5) {
                    let _ = session.assign_officer(id);
                }
            }
        }

        let before: BTreeMap<ReportId, (Decimal, bool)> = session
            .list_active_reports()
            .iter()
            .map(|r| (r.id, (r.progress, r.is_fully_staffed())))
            .collect();
        tick(&mut session);

        for report in session.list_active_reports() {
            if let Some((progress, staffed)) = before.get(&report.id) {
                if *staffed {
                    assert!(report.progress >= *progress);
                } else {
                    assert_eq!(report.progress, *progress);
                }
            }
        }
    }
}

#[test]
fn resolution_releases_exactly_the_officers_held() {
    let mut session = DispatchSession::new(DispatchConfig::default()).unwrap();
    session.upgrade_pool(9).unwrap();
    let mut recorder = Recorder::default();
    let mut held: BTreeMap<ReportId, Vec<OfficerId>> = BTreeMap::new();

    for _ in 0..6_000 {
        let summary = run_tick(&mut session, TICK_MS, &mut GreedyPolicy::new()).unwrap();
        for n in &summary.notifications {
            precinct_core::observer::deliver(&mut recorder, n);
        }
        for report in session.list_active_reports() {
            held.insert(report.id, report.assigned.iter().copied().collect());
        }
        for (id, released, _) in recorder.resolved.drain(..) {
            let mut expected = held.remove(&id).unwrap_or_default();
            expected.sort();
            assert_eq!(released, expected);
        }
    }
    assert!(session.scoreboard().reports_resolved > 0);
    assert_pool_accounting(&session);
}

#[test]
fn same_seed_replays_identically() {
    let run = |seed: u64| {
        let mut config = DispatchConfig::default();
        config.session.seed = seed;
        let mut session = DispatchSession::new(config).unwrap();
        let mut recorder = Recorder::default();
        let bounds = SessionBounds {
            tick_interval_ms: 250,
            max_ticks: 0,
            max_session_ms: 300_000,
        };
        let result =
            run_session(&mut session, &mut GreedyPolicy::new(), &mut recorder, bounds).unwrap();
        assert_eq!(result.end_reason, SessionEndReason::SessionTimeElapsed);
        (recorder, session.current_score())
    };

    let (a, score_a) = run(9);
    let (b, score_b) = run(9);
    let (c, _) = run(10);
    assert_eq!(a.generated, b.generated);
    assert_eq!(a.resolved, b.resolved);
    assert_eq!(a.timed_out, b.timed_out);
    assert_eq!(score_a, score_b);
    assert_eq!(a.ticks, 1_200);
    assert_ne!(a.generated, c.generated);
}

#[test]
fn restored_session_continues_from_the_save() {
    let mut session = DispatchSession::new(DispatchConfig::default()).unwrap();
    session.upgrade_pool(3).unwrap();
    let mut policy = GreedyPolicy::new();
    for _ in 0..700 {
        run_tick(&mut session, TICK_MS, &mut policy).unwrap();
    }

    let blob = encode_blob(&save_game(&session)).unwrap();
    let save = decode_blob(&blob).unwrap();
    let mut restored = DispatchSession::restore(DispatchConfig::default(), &save).unwrap();

    assert_eq!(restored.tick(), session.tick());
    assert_eq!(restored.now_ms(), session.now_ms());
    assert_eq!(restored.current_score(), session.current_score());
    assert_eq!(restored.current_level(), session.current_level());
    assert_eq!(restored.current_difficulty(), session.current_difficulty());
    assert_eq!(restored.list_active_reports(), session.list_active_reports());
    assert_eq!(restored.pool_size(), session.pool_size());
    assert_pool_accounting(&restored);

    // Progress on restored reports continues exactly where it left off.
    for _ in 0..50 {
        run_tick(&mut session, TICK_MS, &mut IdlePolicy::new()).unwrap();
        run_tick(&mut restored, TICK_MS, &mut IdlePolicy::new()).unwrap();
    }
    for report in restored.list_active_reports() {
        if let Some(original) = session.report(report.id) {
            assert_eq!(report.progress, original.progress);
        }
    }
    assert_pool_accounting(&restored);
}

#[test]
fn restored_progress_is_authoritative() {
    let mut session = DispatchSession::new(quiet_config()).unwrap();
    let report = session.generate_report_with(Severity::Low).unwrap();
    session.assign_officer(report.id).unwrap();
    run_ticks(&mut session, 100);

    // Progress edited by the persistence layer; the stale effort must not
    // drag it back on the next tick.
    let mut save = save_game(&session);
    save.reports[0].progress = dec!(0.9);
    let mut restored = DispatchSession::restore(quiet_config(), &save).unwrap();
    assert_eq!(restored.report(report.id).unwrap().progress, dec!(0.9));

    tick(&mut restored);
    let after = restored.report(report.id).unwrap().progress;
    assert!(after > dec!(0.9), "progress went from 0.9 to {after}");

    // 10% of 30 s is left.
    run_ticks(&mut restored, 29);
    assert_eq!(restored.report_status(report.id), Some(ReportStatus::Resolved));
}

#[test]
fn save_without_effort_restores_from_progress() {
    let mut session = DispatchSession::new(quiet_config()).unwrap();
    let report = session.generate_report_with(Severity::Low).unwrap();
    session.assign_officer(report.id).unwrap();
    run_ticks(&mut session, 150);

    let blob = encode_blob(&save_game(&session)).unwrap();
    let mut value: serde_json::Value = serde_json::from_str(&blob).unwrap();
    let saved_report = value["reports"][0].as_object_mut().unwrap();
    assert!(saved_report.remove("effort").is_some());
    let save = decode_blob(&value.to_string()).unwrap();
    assert_eq!(save.reports[0].effort, None);

    let mut restored = DispatchSession::restore(quiet_config(), &save).unwrap();
    let before = restored.report(report.id).unwrap().clone();
    assert_eq!(before.progress, dec!(0.5));
    assert_eq!(before.effort, dec!(15000));

    run_ticks(&mut restored, 150);
    assert_eq!(restored.report_status(report.id), Some(ReportStatus::Resolved));
    assert_eq!(restored.current_score(), 10);
}

#[test]
fn restore_rejects_cross_reference_mismatch() {
    let mut session = DispatchSession::new(quiet_config()).unwrap();
    let a = session.generate_report_with(Severity::Low).unwrap();
    let b = session.generate_report_with(Severity::Low).unwrap();
    session.assign_officer(a.id).unwrap();

    let mut save = save_game(&session);
    let officer = save
        .officers
        .iter_mut()
        .find(|o| o.current_report_id == Some(a.id))
        .unwrap();
    officer.current_report_id = Some(b.id);

    let err = DispatchSession::restore(quiet_config(), &save).unwrap_err();
    assert!(matches!(
        err,
        precinct_core::persistence::PersistenceError::InvalidSnapshot { .. }
    ));
}
