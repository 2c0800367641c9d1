//! Save and load.
//!
//! A session is captured as a [`SaveGame`] and stored as JSON. Writes go
//! through a temporary file that is synced and then renamed over the target,
//! so a crash mid-write never corrupts an existing save. Loading checks the
//! blob against the data-model invariants before a session is rebuilt from
//! it; nothing is trusted just because it parsed.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use precinct_types::{
    ClosedReport, Officer, OfficerId, Report, ReportId, ReportStatus, SAVE_FORMAT_VERSION, SaveGame,
    SavedOfficer, SavedReport,
};
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::clock::SimClock;
use crate::config::ConfigError;
use crate::pool::OfficerPool;
use crate::reports::ReportBook;
use crate::resolution;
use crate::session::{DispatchSession, RestoredParts};

/// Errors from saving or loading a session.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// Reading or writing the save file failed.
    #[error("save file I/O failed: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The blob is not valid save JSON.
    #[error("save blob is not valid JSON: {source}")]
    Json {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// The blob parsed but violates a session invariant.
    #[error("inconsistent save blob: {reason}")]
    InvalidSnapshot {
        /// The first violation found.
        reason: String,
    },

    /// The configuration to restore with is invalid.
    #[error("cannot restore with this configuration: {source}")]
    Config {
        /// The underlying configuration error.
        #[from]
        source: ConfigError,
    },
}

fn invalid(reason: String) -> PersistenceError {
    PersistenceError::InvalidSnapshot { reason }
}

/// Capture the full state of `session`.
pub fn save_game(session: &DispatchSession) -> SaveGame {
    let reports = session
        .list_active_reports()
        .iter()
        .map(|r| SavedReport {
            id: r.id,
            severity: r.severity,
            description: r.description.clone(),
            officers_required: r.officers_required,
            officer_leeway: r.officer_leeway,
            time_to_resolve_ms: r.time_to_resolve_ms,
            reward: r.reward,
            penalty: r.penalty,
            progress: r.progress,
            effort: Some(r.effort),
            assigned_officer_ids: r.assigned.iter().copied().collect(),
            created_at_ms: r.created_at_ms,
            deadline_ms: r.deadline_ms,
        })
        .collect();
    let officers = session
        .officers()
        .map(|o| SavedOfficer {
            id: o.id,
            available: o.is_available(),
            current_report_id: o.assignment,
        })
        .collect();
    let closed_reports = session
        .closed_reports()
        .map(|(id, status)| ClosedReport { id, status })
        .collect();

    SaveGame {
        version: SAVE_FORMAT_VERSION,
        saved_at: Utc::now(),
        seed: session.seed(),
        tick: session.tick(),
        now_ms: session.now_ms(),
        score: session.scoreboard().clone(),
        difficulty: session.current_difficulty(),
        next_generation_ms: session.next_generation_ms(),
        reports,
        officers,
        closed_reports,
    }
}

/// Serialize a save to pretty-printed JSON.
///
/// # Errors
///
/// Returns [`PersistenceError::Json`] if serialization fails.
pub fn encode_blob(save: &SaveGame) -> Result<String, PersistenceError> {
    Ok(serde_json::to_string_pretty(save)?)
}

/// Parse a save from JSON. Only the shape is checked here; invariants are
/// checked on restore.
///
/// # Errors
///
/// Returns [`PersistenceError::Json`] if the text is not a valid save.
pub fn decode_blob(json: &str) -> Result<SaveGame, PersistenceError> {
    Ok(serde_json::from_str(json)?)
}

/// Write a save to `path` atomically.
///
/// The blob goes to `{path}.tmp` first, is synced to disk, and is then
/// renamed over `path`. Parent directories are created as needed.
///
/// # Errors
///
/// Returns [`PersistenceError::Io`] or [`PersistenceError::Json`].
pub fn write_save_file(path: &Path, save: &SaveGame) -> Result<(), PersistenceError> {
    let blob = encode_blob(save)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let tmp_path = temp_path(path);
    let mut file = File::create(&tmp_path)?;
    file.write_all(blob.as_bytes())?;
    file.sync_all()?;
    fs::rename(&tmp_path, path)?;
    info!(path = %path.display(), tick = save.tick, bytes = blob.len(), "Save written");
    Ok(())
}

/// Read and parse a save from `path`.
///
/// # Errors
///
/// Returns [`PersistenceError::Io`] or [`PersistenceError::Json`].
pub fn read_save_file(path: &Path) -> Result<SaveGame, PersistenceError> {
    let json = fs::read_to_string(path)?;
    decode_blob(&json)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Check a save against the data-model invariants and build the parts a
/// session is restored from.
pub(crate) fn validate_save(save: &SaveGame) -> Result<RestoredParts, PersistenceError> {
    if save.version != SAVE_FORMAT_VERSION {
        return Err(invalid(format!(
            "unsupported save version {} (expected {SAVE_FORMAT_VERSION})",
            save.version
        )));
    }
    if save.score.level == 0 {
        return Err(invalid("level must be at least 1".to_owned()));
    }

    let mut closed: BTreeMap<ReportId, ReportStatus> = BTreeMap::new();
    for entry in &save.closed_reports {
        if !entry.status.is_closed() {
            return Err(invalid(format!(
                "closed report {} has non-terminal status {}",
                entry.id, entry.status
            )));
        }
        if closed.insert(entry.id, entry.status).is_some() {
            return Err(invalid(format!("closed report {} listed twice", entry.id)));
        }
    }

    let mut officer_index: BTreeMap<OfficerId, Option<ReportId>> = BTreeMap::new();
    let mut officers = Vec::with_capacity(save.officers.len());
    for saved in &save.officers {
        if saved.available != saved.current_report_id.is_none() {
            return Err(invalid(format!(
                "officer {} availability flag disagrees with its assignment",
                saved.id
            )));
        }
        if officer_index
            .insert(saved.id, saved.current_report_id)
            .is_some()
        {
            return Err(invalid(format!("officer {} listed twice", saved.id)));
        }
        officers.push(Officer {
            id: saved.id,
            assignment: saved.current_report_id,
        });
    }

    let mut report_ids = BTreeSet::new();
    let mut active = Vec::with_capacity(save.reports.len());
    for saved in &save.reports {
        if closed.contains_key(&saved.id) || !report_ids.insert(saved.id) {
            return Err(invalid(format!("report {} listed twice", saved.id)));
        }
        active.push(restore_report(saved, &officer_index)?);
    }

    for (officer_id, assignment) in &officer_index {
        if let Some(report_id) = assignment {
            let listed = active
                .iter()
                .find(|r: &&Report| r.id == *report_id)
                .is_some_and(|r| r.assigned.contains(officer_id));
            if !listed {
                return Err(invalid(format!(
                    "officer {officer_id} points at report {report_id}, which does not list it"
                )));
            }
        }
    }

    Ok(RestoredParts {
        clock: SimClock::from_parts(save.tick, save.now_ms),
        pool: OfficerPool::from_officers(officers),
        reports: ReportBook::from_parts(active, closed),
        score: save.score.clone(),
        next_generation_ms: save.next_generation_ms,
    })
}

fn restore_report(
    saved: &SavedReport,
    officers: &BTreeMap<OfficerId, Option<ReportId>>,
) -> Result<Report, PersistenceError> {
    let id = saved.id;
    if saved.officers_required == 0 || saved.time_to_resolve_ms == 0 {
        return Err(invalid(format!(
            "report {id} has a zero officer or time requirement"
        )));
    }
    if saved.progress < Decimal::ZERO || saved.progress > Decimal::ONE {
        return Err(invalid(format!(
            "report {id} progress {} is outside [0, 1]",
            saved.progress
        )));
    }
    if saved.effort.is_some_and(|e| e.is_sign_negative()) {
        return Err(invalid(format!("report {id} has negative effort")));
    }

    let assigned: BTreeSet<OfficerId> = saved.assigned_officer_ids.iter().copied().collect();
    if assigned.len() != saved.assigned_officer_ids.len() {
        return Err(invalid(format!("report {id} lists an officer twice")));
    }
    let cap = saved.officers_required.saturating_add(saved.officer_leeway);
    if u32::try_from(assigned.len()).unwrap_or(u32::MAX) > cap {
        return Err(invalid(format!(
            "report {id} has more than {cap} officers assigned"
        )));
    }
    for officer_id in &assigned {
        match officers.get(officer_id) {
            Some(Some(report_id)) if *report_id == id => {}
            Some(_) => {
                return Err(invalid(format!(
                    "report {id} lists officer {officer_id}, which is assigned elsewhere"
                )));
            }
            None => {
                return Err(invalid(format!(
                    "report {id} lists unknown officer {officer_id}"
                )));
            }
        }
    }

    let mut report = Report {
        id,
        severity: saved.severity,
        description: saved.description.clone(),
        officers_required: saved.officers_required,
        officer_leeway: saved.officer_leeway,
        time_to_resolve_ms: saved.time_to_resolve_ms,
        reward: saved.reward,
        penalty: saved.penalty,
        progress: saved.progress,
        effort: Decimal::ZERO,
        assigned,
        status: ReportStatus::Active,
        created_at_ms: saved.created_at_ms,
        deadline_ms: saved.deadline_ms,
    };
    report.effort = restored_effort(&report, saved.effort)?;
    Ok(report)
}

/// Effort for a restored report. `progress` is authoritative: a saved effort
/// is kept only when it maps back to exactly that progress, otherwise effort
/// is rebuilt as `progress * effort_target`.
fn restored_effort(
    report: &Report,
    saved: Option<Decimal>,
) -> Result<Decimal, PersistenceError> {
    let target = report.effort_target();
    if let Some(effort) = saved {
        if resolution::progress_for(effort, target) == report.progress {
            return Ok(effort);
        }
        debug!(
            report_id = %report.id,
            %effort,
            progress = %report.progress,
            "Saved effort disagrees with progress; rebuilding"
        );
    }
    report
        .progress
        .checked_mul(target)
        .ok_or_else(|| invalid(format!("report {} effort overflows", report.id)))
}
