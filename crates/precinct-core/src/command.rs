//! Inbound commands that can be queued for the allocation phase.

use core::fmt;

use precinct_types::{ReportId, Severity};

/// A request from a dispatch policy or the consuming layer.
///
/// Queued commands run in FIFO order during the allocation phase of the next
/// tick. The same operations are also available as immediate methods on
/// [`DispatchSession`](crate::session::DispatchSession).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Attach one idle officer to a report.
    AssignOfficer(ReportId),
    /// Enlist additional officers.
    UpgradePool(u32),
    /// Generate a report now, of a given tier or a rolled one.
    GenerateReport(Option<Severity>),
    /// Withdraw an active report without score change.
    CancelReport(ReportId),
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AssignOfficer(id) => write!(f, "assign_officer({id})"),
            Self::UpgradePool(n) => write!(f, "upgrade_pool({n})"),
            Self::GenerateReport(Some(severity)) => write!(f, "generate_report({severity})"),
            Self::GenerateReport(None) => f.write_str("generate_report"),
            Self::CancelReport(id) => write!(f, "cancel_report({id})"),
        }
    }
}
