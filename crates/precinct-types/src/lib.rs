//! Shared type definitions for the Precinct dispatch simulation.
//!
//! This crate is the single source of truth for the types that cross the
//! boundary between the dispatch core and its consumers (UI, persistence,
//! audio/animation). Types flow downstream to `TypeScript` via `ts-rs`.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for reports and officers
//! - [`enums`] -- Severity tiers, report status, session end reasons
//! - [`structs`] -- `Report`, `Officer`, and the `Scoreboard`
//! - [`notifications`] -- Outbound notifications drained once per tick
//! - [`save`] -- Save-blob records for the persistence boundary

pub mod enums;
pub mod ids;
pub mod notifications;
pub mod save;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{ReportStatus, SessionEndReason, Severity};
pub use ids::{OfficerId, ReportId};
pub use notifications::{Notification, NotificationKind};
pub use save::{ClosedReport, SAVE_FORMAT_VERSION, SaveGame, SavedOfficer, SavedReport};
pub use structs::{Officer, Report, Scoreboard};
