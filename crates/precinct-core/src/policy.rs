//! Dispatch policies: who decides which reports get officers.
//!
//! Once per tick, before the allocation phase, the tick cycle asks the
//! [`DispatchPolicy`] for commands. The policy sees the session through its
//! read-only query API and answers with [`Command`]s, which are appended to
//! the inbox behind anything the consuming layer queued.
//!
//! A player-driven host uses [`IdlePolicy`] and queues its own commands.
//! [`GreedyPolicy`] plays automatically.

use crate::command::Command;
use crate::session::DispatchSession;

/// A source of dispatch commands.
pub trait DispatchPolicy {
    /// Decide this tick's commands.
    fn plan(&mut self, session: &DispatchSession) -> Vec<Command>;
}

/// A policy that never issues commands.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdlePolicy;

impl IdlePolicy {
    /// Create a new idle policy.
    pub const fn new() -> Self {
        Self
    }
}

impl DispatchPolicy for IdlePolicy {
    fn plan(&mut self, _session: &DispatchSession) -> Vec<Command> {
        Vec::new()
    }
}

/// Staff the oldest reports first, but only those the idle officers can
/// fully staff this tick.
///
/// A report that would need more officers than are idle is skipped rather
/// than half-staffed, so officers are never parked on a report that cannot
/// progress. Optionally buys extra officers when the pool is too small for
/// the most demanding active report.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyPolicy {
    /// Officers to request via `UpgradePool` when a report can never be
    /// staffed by the whole pool (0 = never upgrade).
    upgrade_step: u32,
}

impl GreedyPolicy {
    /// A greedy policy that never upgrades the pool.
    pub const fn new() -> Self {
        Self { upgrade_step: 0 }
    }

    /// A greedy policy that upgrades the pool by `step` whenever an active
    /// report needs more officers than the pool holds.
    pub const fn with_upgrades(step: u32) -> Self {
        Self { upgrade_step: step }
    }
}

impl DispatchPolicy for GreedyPolicy {
    fn plan(&mut self, session: &DispatchSession) -> Vec<Command> {
        let mut commands = Vec::new();
        let total = session.pool_size();

        if self.upgrade_step > 0 {
            let largest = session
                .list_active_reports()
                .iter()
                .map(|r| r.officers_required)
                .max()
                .unwrap_or(0);
            if largest > total {
                commands.push(Command::UpgradePool(self.upgrade_step));
            }
        }

        let mut idle = session.idle_officer_count();
        for report in session.list_active_reports() {
            if idle == 0 {
                break;
            }
            let missing = report.officers_missing();
            if missing == 0 || missing > idle {
                continue;
            }
            commands.extend((0..missing).map(|_| Command::AssignOfficer(report.id)));
            idle = idle.saturating_sub(missing);
        }
        commands
    }
}
