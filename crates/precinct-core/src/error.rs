//! Error taxonomy for dispatch commands.
//!
//! Every command on a [`DispatchSession`](crate::session::DispatchSession)
//! either applies completely or returns one of these errors with the session
//! left untouched. Errors are values, never panics, and carry enough context
//! for the consuming layer to show the player what went wrong.

use std::fmt;

use precinct_types::{OfficerId, ReportId};

/// An entity a command referred to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef {
    /// A report by ID.
    Report(ReportId),
    /// An officer by ID.
    Officer(OfficerId),
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Report(id) => write!(f, "report {id}"),
            Self::Officer(id) => write!(f, "officer {id}"),
        }
    }
}

/// Why an assignment could not find capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityShortfall {
    /// Every officer in the pool is already attached to a report.
    NoIdleOfficer,
    /// The pool could never staff the report, even with every idle officer.
    PoolTooSmall {
        /// Officers the report requires.
        required: u32,
        /// Idle officers plus officers already on the report.
        reachable: u32,
    },
    /// The report already holds `required + leeway` officers.
    OvercommitLimit {
        /// The staffing cap that was hit.
        cap: u32,
    },
}

impl fmt::Display for CapacityShortfall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoIdleOfficer => f.write_str("no idle officer"),
            Self::PoolTooSmall {
                required,
                reachable,
            } => write!(
                f,
                "pool too small: {required} required, {reachable} reachable"
            ),
            Self::OvercommitLimit { cap } => write!(f, "staffing cap of {cap} reached"),
        }
    }
}

/// Errors returned by dispatch commands.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// The referenced entity does not exist in this session.
    #[error("{entity} not found")]
    NotFound {
        /// The missing entity.
        entity: EntityRef,
    },

    /// The request is well-formed but there is no capacity to satisfy it.
    #[error("insufficient capacity for report {report_id}: {shortfall}")]
    InsufficientCapacity {
        /// The report that could not be staffed.
        report_id: ReportId,
        /// Which capacity limit was hit.
        shortfall: CapacityShortfall,
    },

    /// The referenced entity exists but is in a state that forbids the
    /// operation (for example, a report that already closed).
    #[error("invalid state: {reason}")]
    InvalidState {
        /// Explanation of the conflicting state.
        reason: String,
    },

    /// The command arguments are out of range.
    #[error("invalid input: {reason}")]
    InvalidInput {
        /// Explanation of the rejected input.
        reason: String,
    },

    /// A counter or score would overflow.
    #[error("arithmetic overflow in {context}")]
    ArithmeticOverflow {
        /// Where the overflow would have happened.
        context: &'static str,
    },
}

impl DispatchError {
    /// Shorthand for a missing report.
    pub const fn report_not_found(id: ReportId) -> Self {
        Self::NotFound {
            entity: EntityRef::Report(id),
        }
    }

    /// Shorthand for a missing officer.
    pub const fn officer_not_found(id: OfficerId) -> Self {
        Self::NotFound {
            entity: EntityRef::Officer(id),
        }
    }
}
