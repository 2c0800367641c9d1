//! Resolution clock: turning staffed time into progress.
//!
//! Work is tracked in effective officer-milliseconds. A fully staffed report
//! gains `elapsed_ms * clamp(assigned, floor * required, cap * required)` each
//! tick and resolves once it has done `time_to_resolve_ms * required`. This
//! is the same as advancing progress by `elapsed * efficiency / time` but
//! stays exact when the fraction would repeat.

use precinct_types::{OfficerId, Report};
use rust_decimal::Decimal;

use crate::config::EfficiencyConfig;
use crate::error::DispatchError;
use crate::pool::OfficerPool;

/// Officers that count toward progress: the assigned headcount clamped to
/// `[floor * required, cap * required]`.
///
/// Divided by `required` this is the staffing efficiency multiplier; it is
/// kept in officer units so progress stays exact.
///
/// # Errors
///
/// Returns [`DispatchError::ArithmeticOverflow`] if the band overflows.
pub fn effective_officers(
    report: &Report,
    config: &EfficiencyConfig,
) -> Result<Decimal, DispatchError> {
    let overflow = || DispatchError::ArithmeticOverflow {
        context: "staffing band",
    };
    let required = Decimal::from(report.officers_required);
    let low = config.floor.checked_mul(required).ok_or_else(overflow)?;
    let high = config.cap.checked_mul(required).ok_or_else(overflow)?;
    Ok(Decimal::from(report.assigned_count()).clamp(low, high))
}

/// Simulated milliseconds a staffed report still needs, rounded up.
///
/// `None` if the report is not progressing (closed or understaffed).
///
/// # Errors
///
/// Returns [`DispatchError::ArithmeticOverflow`] if the band overflows.
pub fn remaining_ms(
    report: &Report,
    config: &EfficiencyConfig,
) -> Result<Option<Decimal>, DispatchError> {
    if !report.is_active() || !report.is_fully_staffed() {
        return Ok(None);
    }
    let staffed = effective_officers(report, config)?;
    let left = report
        .effort_target()
        .checked_sub(report.effort)
        .unwrap_or(Decimal::ZERO)
        .max(Decimal::ZERO);
    Ok(left.checked_div(staffed).map(|ms| ms.ceil()))
}

/// Advance `report` by `elapsed_ms` of simulated time.
///
/// Understaffed reports do not move. Returns `true` once the report has done
/// all of its work, at which point `progress` is exactly 1.
///
/// # Errors
///
/// Returns [`DispatchError::ArithmeticOverflow`] if the accumulated effort
/// would overflow. The report is unchanged on error.
pub fn advance(
    report: &mut Report,
    elapsed_ms: u64,
    config: &EfficiencyConfig,
) -> Result<bool, DispatchError> {
    if !report.is_active() || !report.is_fully_staffed() || elapsed_ms == 0 {
        return Ok(false);
    }
    let staffed = effective_officers(report, config)?;
    let effort = Decimal::from(elapsed_ms)
        .checked_mul(staffed)
        .and_then(|gain| report.effort.checked_add(gain))
        .ok_or(DispatchError::ArithmeticOverflow {
            context: "report effort",
        })?;
    let target = report.effort_target();
    let complete = effort >= target;

    report.effort = effort;
    report.progress = progress_for(effort, target);
    Ok(complete)
}

/// Completion fraction for `effort` out of `target`, capped at 1.
pub fn progress_for(effort: Decimal, target: Decimal) -> Decimal {
    if effort >= target {
        return Decimal::ONE;
    }
    effort
        .checked_div(target)
        .unwrap_or(Decimal::ZERO)
        .min(Decimal::ONE)
}

/// Return every officer on `report` to the idle pool.
///
/// Clears the report's assigned set and returns the released IDs in order.
pub fn release_officers(report: &mut Report, pool: &mut OfficerPool) -> Vec<OfficerId> {
    let released: Vec<OfficerId> = std::mem::take(&mut report.assigned).into_iter().collect();
    for id in &released {
        pool.release(*id);
    }
    released
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use std::collections::BTreeSet;

    use precinct_types::{ReportId, ReportStatus, Severity};
    use rust_decimal_macros::dec;

    use super::*;

    fn report(required: u32, time_ms: u64, assigned: u32) -> Report {
        Report {
            id: ReportId::new(),
            severity: Severity::Moderate,
            description: "Theft".to_owned(),
            officers_required: required,
            officer_leeway: 3,
            time_to_resolve_ms: time_ms,
            reward: 25,
            penalty: 12,
            progress: Decimal::ZERO,
            effort: Decimal::ZERO,
            assigned: (0..assigned).map(|_| OfficerId::new()).collect::<BTreeSet<_>>(),
            status: ReportStatus::Active,
            created_at_ms: 0,
            deadline_ms: None,
        }
    }

    /// Run 100 ms ticks until the report completes; returns elapsed time.
    fn ticks_to_complete(report: &mut Report) -> u64 {
        let config = EfficiencyConfig::default();
        let mut elapsed = 0_u64;
        while !advance(report, 100, &config).unwrap() {
            elapsed += 100;
            assert!(elapsed < 1_000_000, "report never completed");
        }
        elapsed + 100
    }

    #[test]
    fn exactly_staffed_takes_time_to_resolve() {
        let mut low = report(1, 30_000, 1);
        assert_eq!(ticks_to_complete(&mut low), 30_000);
        assert_eq!(low.progress, Decimal::ONE);

        let mut moderate = report(3, 60_000, 3);
        assert_eq!(ticks_to_complete(&mut moderate), 60_000);
    }

    #[test]
    fn overstaffing_speeds_up_to_cap() {
        let mut doubled = report(1, 30_000, 2);
        assert_eq!(ticks_to_complete(&mut doubled), 15_000);

        // Four officers on a one-officer report still only count as two.
        let mut quadrupled = report(1, 30_000, 4);
        assert_eq!(ticks_to_complete(&mut quadrupled), 15_000);
    }

    #[test]
    fn understaffed_report_does_not_progress() {
        let mut r = report(2, 60_000, 1);
        let config = EfficiencyConfig::default();
        assert!(!advance(&mut r, 10_000, &config).unwrap());
        assert_eq!(r.progress, Decimal::ZERO);
        assert_eq!(r.effort, Decimal::ZERO);
    }

    #[test]
    fn progress_is_monotone_and_bounded() {
        let mut r = report(3, 60_000, 4);
        let config = EfficiencyConfig::default();
        let mut last = Decimal::ZERO;
        for _ in 0..1_000 {
            advance(&mut r, 70, &config).unwrap();
            assert!(r.progress >= last);
            assert!(r.progress <= Decimal::ONE);
            last = r.progress;
        }
        assert_eq!(last, Decimal::ONE);
    }

    #[test]
    fn effective_officers_are_clamped_to_band() {
        let config = EfficiencyConfig::default();
        let count = |r: &Report| effective_officers(r, &config).unwrap();
        assert_eq!(count(&report(2, 1_000, 1)), dec!(1));
        assert_eq!(count(&report(2, 1_000, 0)), dec!(1));
        assert_eq!(count(&report(2, 1_000, 3)), dec!(3));
        assert_eq!(count(&report(1, 1_000, 4)), dec!(2));
    }

    #[test]
    fn remaining_time_tracks_effort() {
        let config = EfficiencyConfig::default();
        let mut low = report(1, 30_000, 1);
        assert_eq!(remaining_ms(&low, &config).unwrap(), Some(dec!(30000)));
        advance(&mut low, 10_000, &config).unwrap();
        assert_eq!(remaining_ms(&low, &config).unwrap(), Some(dec!(20000)));

        // Three officers on a two-officer job: 1.5x speed, rounded up.
        let mut fast = report(2, 1_001, 3);
        assert_eq!(remaining_ms(&fast, &config).unwrap(), Some(dec!(668)));
        advance(&mut fast, 668, &config).unwrap();
        assert_eq!(fast.progress, Decimal::ONE);

        assert_eq!(remaining_ms(&report(2, 1_000, 1), &config).unwrap(), None);
    }

    #[test]
    fn release_returns_everyone_once() {
        let mut pool = OfficerPool::new();
        let mut rng = <rand::rngs::StdRng as rand::SeedableRng>::seed_from_u64(3);
        pool.enlist(&mut rng, 2);
        let mut r = report(2, 1_000, 0);
        let ids: Vec<OfficerId> = pool.iter().map(|o| o.id).collect();
        for id in &ids {
            pool.attach(*id, r.id).unwrap();
            r.assigned.insert(*id);
        }

        let released = release_officers(&mut r, &mut pool);
        assert_eq!(released.len(), 2);
        assert!(r.assigned.is_empty());
        assert_eq!(pool.idle_count(), 2);
        assert!(release_officers(&mut r, &mut pool).is_empty());
    }
}
