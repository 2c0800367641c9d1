//! Configuration loading and typed config structures for the dispatch core.
//!
//! The canonical configuration lives in `precinct-config.yaml` in the working
//! directory. This module defines strongly-typed structs that mirror the YAML
//! structure and provides a loader that reads, overrides, and validates it.
//! Every section is optional; a missing section takes the defaults below,
//! which describe a five-minute shift with three officers.

use std::path::Path;

use precinct_types::Severity;
use rust_decimal::Decimal;
use serde::Deserialize;

/// Environment variable that overrides `session.seed`.
pub const SEED_ENV_VAR: &str = "PRECINCT_SEED";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but describes an impossible setup.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level dispatch configuration.
///
/// Mirrors the structure of `precinct-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DispatchConfig {
    /// Session-level settings (seed, tick length, bounds, save path).
    #[serde(default)]
    pub session: SessionConfig,

    /// Officer pool settings.
    #[serde(default)]
    pub pool: PoolConfig,

    /// Report generation timing and severity weighting.
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Per-tier report requirements.
    #[serde(default)]
    pub severity: SeverityTable,

    /// Staffing efficiency band.
    #[serde(default)]
    pub efficiency: EfficiencyConfig,

    /// Difficulty curve parameters.
    #[serde(default)]
    pub difficulty: DifficultyConfig,

    /// Level thresholds and level-up rewards.
    #[serde(default)]
    pub progression: ProgressionConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl DispatchConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `PRECINCT_SEED` overrides `session.seed` when set to a valid `u64`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.session.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for values the core cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.tick_interval_ms == 0 {
            return Err(invalid("session.tick_interval_ms must be at least 1"));
        }
        if self.generation.base_interval_ms == 0 {
            return Err(invalid("generation.base_interval_ms must be at least 1"));
        }
        if self.generation.min_interval_ms == 0 {
            return Err(invalid("generation.min_interval_ms must be at least 1"));
        }
        if self.generation.min_interval_ms > self.generation.base_interval_ms {
            return Err(invalid(
                "generation.min_interval_ms must not exceed generation.base_interval_ms",
            ));
        }
        if self.generation.moderate_threshold.is_sign_negative()
            || self.generation.moderate_threshold >= self.generation.high_threshold
        {
            return Err(invalid(
                "generation thresholds must satisfy 0 <= moderate_threshold < high_threshold",
            ));
        }
        for severity in Severity::ALL {
            self.severity.profile(severity).validate(severity)?;
        }
        if !self.efficiency.floor.is_sign_positive()
            || self.efficiency.floor.is_zero()
            || self.efficiency.floor > Decimal::ONE
            || self.efficiency.cap < Decimal::ONE
        {
            return Err(invalid(
                "efficiency band must satisfy 0 < floor <= 1 <= cap",
            ));
        }
        if self.difficulty.points_per_step == 0 {
            return Err(invalid("difficulty.points_per_step must be at least 1"));
        }
        if self.difficulty.scaling_factor.is_sign_negative() {
            return Err(invalid("difficulty.scaling_factor must not be negative"));
        }
        if self.progression.base_threshold == 0 || self.progression.threshold_step == 0 {
            return Err(invalid(
                "progression.base_threshold and progression.threshold_step must be at least 1",
            ));
        }
        Ok(())
    }
}

fn invalid(reason: &str) -> ConfigError {
    ConfigError::Invalid {
        reason: reason.to_owned(),
    }
}

/// Session-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionConfig {
    /// Human-readable session name.
    #[serde(default = "default_session_name")]
    pub name: String,

    /// Random seed for reproducibility.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Simulated milliseconds per tick.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Stop after this many ticks (0 = unbounded).
    #[serde(default)]
    pub max_ticks: u64,

    /// Length of a shift in simulated milliseconds (0 = unbounded).
    #[serde(default = "default_max_session_ms")]
    pub max_session_ms: u64,

    /// Where the binary writes the save blob at the end of a run.
    #[serde(default)]
    pub save_path: Option<String>,
}

impl SessionConfig {
    /// Override the seed from `PRECINCT_SEED` when it holds a valid `u64`.
    pub fn apply_env_overrides(&mut self) {
        let raw = std::env::var(SEED_ENV_VAR).ok();
        self.apply_seed_override(raw.as_deref());
    }

    /// Replace the seed with `raw` if it parses as a `u64`. Returns whether
    /// the override applied; blank or malformed values keep the current seed.
    pub fn apply_seed_override(&mut self, raw: Option<&str>) -> bool {
        match raw.and_then(|val| val.trim().parse::<u64>().ok()) {
            Some(seed) => {
                self.seed = seed;
                true
            }
            None => false,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            name: default_session_name(),
            seed: default_seed(),
            tick_interval_ms: default_tick_interval_ms(),
            max_ticks: 0,
            max_session_ms: default_max_session_ms(),
            save_path: None,
        }
    }
}

/// Officer pool configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PoolConfig {
    /// Officers enlisted when the session starts.
    #[serde(default = "default_starting_officers")]
    pub starting_officers: u32,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            starting_officers: default_starting_officers(),
        }
    }
}

/// Report generation configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GenerationConfig {
    /// Delay before the first generated report.
    #[serde(default = "default_first_report_delay_ms")]
    pub first_report_delay_ms: u64,

    /// Interval between reports at difficulty 1.0.
    #[serde(default = "default_base_interval_ms")]
    pub base_interval_ms: u64,

    /// Lower bound on the interval however high difficulty climbs.
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,

    /// Scaled roll above which a report is at least Moderate.
    #[serde(default = "default_moderate_threshold")]
    pub moderate_threshold: Decimal,

    /// Scaled roll above which a report is High.
    #[serde(default = "default_high_threshold")]
    pub high_threshold: Decimal,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            first_report_delay_ms: default_first_report_delay_ms(),
            base_interval_ms: default_base_interval_ms(),
            min_interval_ms: default_min_interval_ms(),
            moderate_threshold: default_moderate_threshold(),
            high_threshold: default_high_threshold(),
        }
    }
}

/// Requirements for one severity tier.
///
/// A tier given in YAML must list every field; an omitted tier keeps its
/// defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SeverityProfile {
    /// Fewest officers a report of this tier can require.
    pub officers_min: u32,
    /// Most officers a report of this tier can require.
    pub officers_max: u32,
    /// Extra officers accepted beyond the requirement.
    pub leeway: u32,
    /// Shortest resolution time at efficiency 1.0.
    pub resolve_ms_min: u64,
    /// Longest resolution time at efficiency 1.0.
    pub resolve_ms_max: u64,
    /// Points awarded on resolution.
    pub reward: i64,
    /// Points deducted on timeout.
    pub penalty: i64,
    /// Time from generation until the report times out (`None` = never).
    #[serde(default)]
    pub deadline_ms: Option<u64>,
}

impl SeverityProfile {
    fn validate(&self, severity: Severity) -> Result<(), ConfigError> {
        let problem = if self.officers_min == 0 {
            Some("officers_min must be at least 1")
        } else if self.officers_min > self.officers_max {
            Some("officers_min must not exceed officers_max")
        } else if self.resolve_ms_min == 0 {
            Some("resolve_ms_min must be at least 1")
        } else if self.resolve_ms_min > self.resolve_ms_max {
            Some("resolve_ms_min must not exceed resolve_ms_max")
        } else if self.reward < 0 || self.penalty < 0 {
            Some("reward and penalty must not be negative")
        } else if self.deadline_ms == Some(0) {
            Some("deadline_ms must be at least 1 when set")
        } else {
            None
        };
        match problem {
            Some(reason) => Err(ConfigError::Invalid {
                reason: format!("severity.{severity}: {reason}"),
            }),
            None => Ok(()),
        }
    }
}

/// Severity-to-requirements lookup table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SeverityTable {
    /// Low tier requirements.
    #[serde(default = "default_low_profile")]
    pub low: SeverityProfile,
    /// Moderate tier requirements.
    #[serde(default = "default_moderate_profile")]
    pub moderate: SeverityProfile,
    /// High tier requirements.
    #[serde(default = "default_high_profile")]
    pub high: SeverityProfile,
}

impl SeverityTable {
    /// Requirements for the given tier.
    pub const fn profile(&self, severity: Severity) -> &SeverityProfile {
        match severity {
            Severity::Low => &self.low,
            Severity::Moderate => &self.moderate,
            Severity::High => &self.high,
        }
    }
}

impl Default for SeverityTable {
    fn default() -> Self {
        Self {
            low: default_low_profile(),
            moderate: default_moderate_profile(),
            high: default_high_profile(),
        }
    }
}

/// Staffing efficiency band.
///
/// Efficiency is `assigned / required`, clamped to `[floor, cap]`, and scales
/// how fast a staffed report progresses. It never scales the reward.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EfficiencyConfig {
    /// Lowest efficiency applied.
    #[serde(default = "default_efficiency_floor")]
    pub floor: Decimal,
    /// Highest efficiency applied.
    #[serde(default = "default_efficiency_cap")]
    pub cap: Decimal,
}

impl Default for EfficiencyConfig {
    fn default() -> Self {
        Self {
            floor: default_efficiency_floor(),
            cap: default_efficiency_cap(),
        }
    }
}

/// Difficulty curve parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DifficultyConfig {
    /// Points per difficulty step.
    #[serde(default = "default_points_per_step")]
    pub points_per_step: u64,
    /// Multiplier increase per step.
    #[serde(default = "default_scaling_factor")]
    pub scaling_factor: Decimal,
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Self {
            points_per_step: default_points_per_step(),
            scaling_factor: default_scaling_factor(),
        }
    }
}

/// Level thresholds and level-up rewards.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProgressionConfig {
    /// Points needed to reach level 2.
    #[serde(default = "default_base_threshold")]
    pub base_threshold: u64,
    /// Added to the previous threshold, times the level being left.
    #[serde(default = "default_threshold_step")]
    pub threshold_step: u64,
    /// Officers enlisted for every level gained.
    #[serde(default = "default_officers_per_level")]
    pub officers_per_level: u32,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            base_threshold: default_base_threshold(),
            threshold_step: default_threshold_step(),
            officers_per_level: default_officers_per_level(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_session_name() -> String {
    "Night Shift".to_owned()
}

const fn default_seed() -> u64 {
    42
}

const fn default_tick_interval_ms() -> u64 {
    100
}

const fn default_max_session_ms() -> u64 {
    300_000
}

const fn default_starting_officers() -> u32 {
    3
}

const fn default_first_report_delay_ms() -> u64 {
    5_000
}

const fn default_base_interval_ms() -> u64 {
    15_000
}

const fn default_min_interval_ms() -> u64 {
    5_000
}

const fn default_moderate_threshold() -> Decimal {
    Decimal::from_parts(4, 0, 0, false, 1)
}

const fn default_high_threshold() -> Decimal {
    Decimal::from_parts(8, 0, 0, false, 1)
}

const fn default_low_profile() -> SeverityProfile {
    SeverityProfile {
        officers_min: 1,
        officers_max: 1,
        leeway: 1,
        resolve_ms_min: 30_000,
        resolve_ms_max: 30_000,
        reward: 10,
        penalty: 5,
        deadline_ms: Some(90_000),
    }
}

const fn default_moderate_profile() -> SeverityProfile {
    SeverityProfile {
        officers_min: 2,
        officers_max: 4,
        leeway: 2,
        resolve_ms_min: 60_000,
        resolve_ms_max: 60_000,
        reward: 25,
        penalty: 12,
        deadline_ms: Some(180_000),
    }
}

const fn default_high_profile() -> SeverityProfile {
    SeverityProfile {
        officers_min: 5,
        officers_max: 8,
        leeway: 3,
        resolve_ms_min: 120_000,
        resolve_ms_max: 120_000,
        reward: 50,
        penalty: 25,
        deadline_ms: Some(300_000),
    }
}

const fn default_efficiency_floor() -> Decimal {
    Decimal::from_parts(5, 0, 0, false, 1)
}

const fn default_efficiency_cap() -> Decimal {
    Decimal::TWO
}

const fn default_points_per_step() -> u64 {
    100
}

const fn default_scaling_factor() -> Decimal {
    Decimal::from_parts(1, 0, 0, false, 1)
}

const fn default_base_threshold() -> u64 {
    100
}

const fn default_threshold_step() -> u64 {
    50
}

const fn default_officers_per_level() -> u32 {
    2
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = DispatchConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.session.seed, 42);
        assert_eq!(config.pool.starting_officers, 3);
        assert_eq!(config.generation.base_interval_ms, 15_000);
        assert_eq!(config.generation.moderate_threshold, dec!(0.4));
        assert_eq!(config.generation.high_threshold, dec!(0.8));
        assert_eq!(config.efficiency.floor, dec!(0.5));
        assert_eq!(config.efficiency.cap, dec!(2));
        assert_eq!(config.difficulty.scaling_factor, dec!(0.1));
    }

    #[test]
    fn severity_table_is_a_lookup() {
        let table = SeverityTable::default();
        assert_eq!(table.profile(Severity::Low).officers_min, 1);
        assert_eq!(table.profile(Severity::Low).resolve_ms_min, 30_000);
        assert_eq!(table.profile(Severity::High).officers_min, 5);
        assert_eq!(table.profile(Severity::High).officers_max, 8);
        assert_eq!(table.profile(Severity::Moderate).reward, 25);
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r"
session:
  name: Day Shift
  seed: 7
  tick_interval_ms: 250
  max_ticks: 1000
  max_session_ms: 600000
  save_path: saves/day.json

pool:
  starting_officers: 6

generation:
  first_report_delay_ms: 1000
  base_interval_ms: 20000
  min_interval_ms: 4000
  moderate_threshold: 0.5
  high_threshold: 0.9

severity:
  high:
    officers_min: 4
    officers_max: 6
    leeway: 2
    resolve_ms_min: 90000
    resolve_ms_max: 150000
    reward: 80
    penalty: 40

efficiency:
  floor: 0.25
  cap: 3

difficulty:
  points_per_step: 50
  scaling_factor: 0.2

progression:
  base_threshold: 120
  threshold_step: 60
  officers_per_level: 1

logging:
  level: debug
  json: true
";
        let config = DispatchConfig::parse(yaml).unwrap();
        assert_eq!(config.session.name, "Day Shift");
        assert_eq!(config.session.tick_interval_ms, 250);
        assert_eq!(config.session.max_ticks, 1000);
        assert_eq!(config.session.save_path.as_deref(), Some("saves/day.json"));
        assert_eq!(config.pool.starting_officers, 6);
        assert_eq!(config.generation.high_threshold, dec!(0.9));
        assert_eq!(config.severity.high.reward, 80);
        assert_eq!(config.severity.high.deadline_ms, None);
        // Tiers not listed keep their defaults.
        assert_eq!(config.severity.low.reward, 10);
        assert_eq!(config.efficiency.floor, dec!(0.25));
        assert_eq!(config.efficiency.cap, dec!(3));
        assert_eq!(config.difficulty.points_per_step, 50);
        assert_eq!(config.progression.officers_per_level, 1);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
    }

    #[test]
    fn empty_yaml_uses_defaults() {
        let parsed = DispatchConfig::parse("{}");
        assert!(parsed.is_ok(), "empty mapping must parse: {parsed:?}");
        let config = parsed.unwrap();
        assert_eq!(config.pool, PoolConfig::default());
        assert_eq!(config.severity, SeverityTable::default());
    }

    #[test]
    fn seed_override_accepts_only_valid_u64() {
        let mut session = SessionConfig::default();
        assert!(session.apply_seed_override(Some(" 1234 ")));
        assert_eq!(session.seed, 1234);

        assert!(!session.apply_seed_override(Some("not-a-seed")));
        assert!(!session.apply_seed_override(Some("-5")));
        assert!(!session.apply_seed_override(Some("")));
        assert!(!session.apply_seed_override(None));
        assert_eq!(session.seed, 1234);
    }

    #[test]
    fn rejects_inverted_officer_range() {
        let yaml = r"
severity:
  low:
    officers_min: 3
    officers_max: 1
    leeway: 0
    resolve_ms_min: 1000
    resolve_ms_max: 1000
    reward: 1
    penalty: 1
";
        let result = DispatchConfig::parse(yaml);
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn rejects_zero_officer_requirement() {
        let mut config = DispatchConfig::default();
        config.severity.moderate.officers_min = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn rejects_thresholds_out_of_order() {
        let mut config = DispatchConfig::default();
        config.generation.moderate_threshold = dec!(0.9);
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_efficiency_band_excluding_one() {
        let mut config = DispatchConfig::default();
        config.efficiency.cap = dec!(0.9);
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_malformed_yaml() {
        let result = DispatchConfig::parse("session: [unclosed");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }
}
