//! Report generation.
//!
//! A generated report gets its severity from a difficulty-scaled roll and
//! its requirements from the [`SeverityTable`]. All randomness comes from
//! the caller's RNG, so a seeded session produces the same reports in the
//! same order every run.

use std::collections::BTreeSet;

use precinct_types::{Report, ReportId, ReportStatus, Severity};
use rand::Rng;
use rust_decimal::Decimal;

use crate::config::{GenerationConfig, SeverityProfile, SeverityTable};

/// Resolution of the severity roll: draws are whole numbers in
/// `0..ROLL_SCALE`, read as four decimal places.
const ROLL_SCALE: u32 = 10_000;

/// Decimal places of the severity roll.
const ROLL_DECIMALS: u32 = 4;

const LOW_DESCRIPTIONS: &[&str] = &[
    "Noise Complaint",
    "Littering",
    "Minor Disturbance",
    "Loitering",
    "Parking Violation",
];

const MODERATE_DESCRIPTIONS: &[&str] = &[
    "Theft",
    "Vandalism",
    "Trespassing",
    "Burglary",
    "Street Fight",
];

const HIGH_DESCRIPTIONS: &[&str] = &[
    "Armed Robbery",
    "Hostage Situation",
    "Major Assault",
    "Bank Heist",
];

/// Description pool for a tier.
pub const fn descriptions(severity: Severity) -> &'static [&'static str] {
    match severity {
        Severity::Low => LOW_DESCRIPTIONS,
        Severity::Moderate => MODERATE_DESCRIPTIONS,
        Severity::High => HIGH_DESCRIPTIONS,
    }
}

/// Roll a severity tier.
///
/// Draws `r` uniformly from `[0, 1)` and compares `r * multiplier` against
/// the configured thresholds. A higher multiplier pushes more rolls past the
/// thresholds, so hard sessions see more High reports.
pub fn roll_severity<R: Rng + ?Sized>(
    rng: &mut R,
    multiplier: Decimal,
    config: &GenerationConfig,
) -> Severity {
    let raw: u32 = rng.random_range(0..ROLL_SCALE);
    let scaled = Decimal::new(i64::from(raw), ROLL_DECIMALS)
        .checked_mul(multiplier)
        .unwrap_or(Decimal::MAX);
    if scaled > config.high_threshold {
        Severity::High
    } else if scaled > config.moderate_threshold {
        Severity::Moderate
    } else {
        Severity::Low
    }
}

/// Manufacture an active report of the given tier at `now_ms`.
pub fn build_report<R: Rng + ?Sized>(
    rng: &mut R,
    severity: Severity,
    table: &SeverityTable,
    now_ms: u64,
) -> Report {
    let profile: &SeverityProfile = table.profile(severity);
    let id = ReportId::from_random_bytes(rng.random());
    let officers_required = rng.random_range(profile.officers_min..=profile.officers_max);
    let time_to_resolve_ms = rng.random_range(profile.resolve_ms_min..=profile.resolve_ms_max);
    let pool = descriptions(severity);
    let description = pool
        .get(rng.random_range(0..pool.len()))
        .copied()
        .unwrap_or("Incident")
        .to_owned();

    Report {
        id,
        severity,
        description,
        officers_required,
        officer_leeway: profile.leeway,
        time_to_resolve_ms,
        reward: profile.reward,
        penalty: profile.penalty,
        progress: Decimal::ZERO,
        effort: Decimal::ZERO,
        assigned: BTreeSet::new(),
        status: ReportStatus::Active,
        created_at_ms: now_ms,
        deadline_ms: profile
            .deadline_ms
            .and_then(|window| now_ms.checked_add(window)),
    }
}
