//! Officer allocation.
//!
//! [`assign`] attaches one idle officer to one report. Every check runs
//! before anything is mutated, so a rejected assignment leaves both the
//! pool and the report exactly as they were.

use precinct_types::{Officer, Report, ReportId};

use crate::error::{CapacityShortfall, DispatchError};
use crate::pool::OfficerPool;
use crate::reports::ReportBook;

/// Snapshot of both sides of a successful assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    /// The officer after attachment.
    pub officer: Officer,
    /// The report after attachment.
    pub report: Report,
}

/// Why `report` cannot take another officer from `pool` right now, if it
/// cannot.
///
/// Checks run in order: staffing cap, then idle officers, then whether the
/// pool as it stands could ever staff the report.
pub fn shortfall(report: &Report, pool: &OfficerPool) -> Option<CapacityShortfall> {
    let assigned = report.assigned_count();
    let cap = report.staffing_cap();
    if assigned >= cap {
        return Some(CapacityShortfall::OvercommitLimit { cap });
    }
    let idle = pool.idle_count();
    if idle == 0 {
        return Some(CapacityShortfall::NoIdleOfficer);
    }
    let reachable = idle.saturating_add(assigned);
    if reachable < report.officers_required {
        return Some(CapacityShortfall::PoolTooSmall {
            required: report.officers_required,
            reachable,
        });
    }
    None
}

/// Attach the first idle officer (in enlistment order) to `report_id`.
///
/// # Errors
///
/// - [`DispatchError::InvalidState`] if the report already closed.
/// - [`DispatchError::NotFound`] if the report never existed.
/// - [`DispatchError::InsufficientCapacity`] if the report is at its
///   staffing cap, no officer is idle, or the pool is too small to ever
///   fully staff the report.
pub fn assign(
    book: &mut ReportBook,
    pool: &mut OfficerPool,
    report_id: ReportId,
) -> Result<Assignment, DispatchError> {
    let report = book.lookup(report_id)?;
    if let Some(shortfall) = shortfall(report, pool) {
        return Err(DispatchError::InsufficientCapacity {
            report_id,
            shortfall,
        });
    }
    let officer_id = pool.first_idle().ok_or(DispatchError::InsufficientCapacity {
        report_id,
        shortfall: CapacityShortfall::NoIdleOfficer,
    })?;

    let report = book
        .get_mut(report_id)
        .ok_or(DispatchError::report_not_found(report_id))?;
    let officer = pool.attach(officer_id, report_id)?.clone();
    report.assigned.insert(officer_id);

    Ok(Assignment {
        officer,
        report: report.clone(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use precinct_types::{ReportStatus, Severity};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::config::SeverityTable;
    use crate::generator::build_report;

    struct Fixture {
        book: ReportBook,
        pool: OfficerPool,
        rng: StdRng,
    }

    fn fixture(officers: u32) -> Fixture {
        let mut rng = StdRng::seed_from_u64(21);
        let mut pool = OfficerPool::new();
        pool.enlist(&mut rng, officers);
        Fixture {
            book: ReportBook::new(),
            pool,
            rng,
        }
    }

    fn add_report(fx: &mut Fixture, severity: Severity) -> ReportId {
        let report = build_report(&mut fx.rng, severity, &SeverityTable::default(), 0);
        let id = report.id;
        fx.book.insert(report);
        id
    }

    #[test]
    fn assigns_first_idle_officer() {
        let mut fx = fixture(3);
        let id = add_report(&mut fx, Severity::Low);
        let expected = fx.pool.first_idle().unwrap();

        let assignment = assign(&mut fx.book, &mut fx.pool, id).unwrap();
        assert_eq!(assignment.officer.id, expected);
        assert_eq!(assignment.officer.assignment, Some(id));
        assert!(assignment.report.assigned.contains(&expected));
        assert_eq!(fx.pool.idle_count(), 2);
    }

    #[test]
    fn unknown_report_is_not_found() {
        let mut fx = fixture(1);
        let err = assign(&mut fx.book, &mut fx.pool, ReportId::new()).unwrap_err();
        assert!(matches!(err, DispatchError::NotFound { .. }));
    }

    #[test]
    fn closed_report_is_invalid_state() {
        let mut fx = fixture(1);
        let id = add_report(&mut fx, Severity::Low);
        fx.book.close(id, ReportStatus::Cancelled);
        let err = assign(&mut fx.book, &mut fx.pool, id).unwrap_err();
        assert!(matches!(err, DispatchError::InvalidState { .. }));
    }

    #[test]
    fn pool_too_small_for_high_report() {
        let mut fx = fixture(3);
        let id = add_report(&mut fx, Severity::High);
        let before = fx.book.get(id).unwrap().clone();

        let err = assign(&mut fx.book, &mut fx.pool, id).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::InsufficientCapacity {
                shortfall: CapacityShortfall::PoolTooSmall { reachable: 3, .. },
                ..
            }
        ));
        assert_eq!(fx.book.get(id), Some(&before));
        assert_eq!(fx.pool.idle_count(), 3);
    }

    #[test]
    fn no_idle_officer_when_pool_exhausted() {
        let mut fx = fixture(1);
        let first = add_report(&mut fx, Severity::Low);
        let second = add_report(&mut fx, Severity::Low);
        assign(&mut fx.book, &mut fx.pool, first).unwrap();

        let err = assign(&mut fx.book, &mut fx.pool, second).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::InsufficientCapacity {
                shortfall: CapacityShortfall::NoIdleOfficer,
                ..
            }
        ));
    }

    #[test]
    fn staffing_cap_bounds_overcommitment() {
        let mut fx = fixture(5);
        let id = add_report(&mut fx, Severity::Low);
        // Low: one required plus one leeway.
        assign(&mut fx.book, &mut fx.pool, id).unwrap();
        assign(&mut fx.book, &mut fx.pool, id).unwrap();

        let err = assign(&mut fx.book, &mut fx.pool, id).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::InsufficientCapacity {
                shortfall: CapacityShortfall::OvercommitLimit { cap: 2 },
                ..
            }
        ));
        assert_eq!(fx.book.get(id).unwrap().assigned_count(), 2);
        assert_eq!(fx.pool.idle_count(), 3);
    }
}
