//! Active reports and the archive of closed ones.

use std::collections::BTreeMap;

use precinct_types::{Report, ReportId, ReportStatus};

use crate::error::DispatchError;

/// Active reports in creation order, plus the terminal status of every
/// report that has left the active set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportBook {
    active: Vec<Report>,
    closed: BTreeMap<ReportId, ReportStatus>,
}

impl ReportBook {
    /// An empty book.
    pub const fn new() -> Self {
        Self {
            active: Vec::new(),
            closed: BTreeMap::new(),
        }
    }

    /// Rebuild a book from restored parts.
    pub const fn from_parts(active: Vec<Report>, closed: BTreeMap<ReportId, ReportStatus>) -> Self {
        Self { active, closed }
    }

    /// Add a freshly generated report to the active set.
    pub fn insert(&mut self, report: Report) {
        self.active.push(report);
    }

    /// Active reports in creation order.
    pub fn active(&self) -> &[Report] {
        &self.active
    }

    /// Active reports in creation order, mutably.
    pub fn active_mut(&mut self) -> impl Iterator<Item = &mut Report> {
        self.active.iter_mut()
    }

    /// Look up an active report.
    pub fn get(&self, id: ReportId) -> Option<&Report> {
        self.active.iter().find(|r| r.id == id)
    }

    /// Look up an active report mutably.
    pub fn get_mut(&mut self, id: ReportId) -> Option<&mut Report> {
        self.active.iter_mut().find(|r| r.id == id)
    }

    /// Terminal status of a closed report.
    pub fn closed_status(&self, id: ReportId) -> Option<ReportStatus> {
        self.closed.get(&id).copied()
    }

    /// Closed reports by ID.
    pub const fn closed(&self) -> &BTreeMap<ReportId, ReportStatus> {
        &self.closed
    }

    /// Resolve an ID to an active report, distinguishing closed from unknown.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidState`] if the report already closed
    /// and [`DispatchError::NotFound`] if it never existed.
    pub fn lookup(&self, id: ReportId) -> Result<&Report, DispatchError> {
        if let Some(status) = self.closed_status(id) {
            return Err(DispatchError::InvalidState {
                reason: format!("report {id} is already closed ({status})"),
            });
        }
        self.get(id).ok_or(DispatchError::report_not_found(id))
    }

    /// Move a report out of the active set with a terminal status.
    ///
    /// Returns the closed report, or `None` if it was not active.
    pub fn close(&mut self, id: ReportId, status: ReportStatus) -> Option<Report> {
        let index = self.active.iter().position(|r| r.id == id)?;
        let mut report = self.active.remove(index);
        report.status = status;
        self.closed.insert(id, status);
        Some(report)
    }

    /// Number of active reports.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}
