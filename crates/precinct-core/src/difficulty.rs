//! Difficulty curve: score in, multiplier out.
//!
//! The multiplier rises by `scaling_factor` for every `points_per_step`
//! points of positive score. It scales the severity roll and shortens the
//! generation interval. Recomputing is pure, so the multiplier never needs
//! to be persisted as state of its own.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::config::{DifficultyConfig, GenerationConfig};

/// Pure mapping from total score to difficulty multiplier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DifficultyCurve {
    points_per_step: u64,
    scaling_factor: Decimal,
}

impl DifficultyCurve {
    /// Build a curve from configuration.
    pub fn new(config: &DifficultyConfig) -> Self {
        Self {
            points_per_step: config.points_per_step.max(1),
            scaling_factor: config.scaling_factor,
        }
    }

    /// Multiplier for `total_score`: `1 + floor(max(score, 0) / step) * factor`.
    ///
    /// Negative scores map to the base multiplier of 1.
    pub fn recompute(&self, total_score: i64) -> Decimal {
        let positive = u64::try_from(total_score).unwrap_or(0);
        let steps = positive.checked_div(self.points_per_step).unwrap_or(0);
        Decimal::from(steps)
            .checked_mul(self.scaling_factor)
            .and_then(|bonus| Decimal::ONE.checked_add(bonus))
            .unwrap_or(Decimal::MAX)
    }
}

/// Interval until the next generated report at the given multiplier.
///
/// `max(min_interval_ms, floor(base_interval_ms / multiplier))`, never
/// longer than the base interval.
pub fn generation_interval_ms(config: &GenerationConfig, multiplier: Decimal) -> u64 {
    let base = config.base_interval_ms;
    if multiplier <= Decimal::ONE {
        return base.max(config.min_interval_ms);
    }
    let scaled = Decimal::from(base)
        .checked_div(multiplier)
        .and_then(|ms| ms.floor().to_u64())
        .unwrap_or(config.min_interval_ms);
    scaled.clamp(config.min_interval_ms, base.max(config.min_interval_ms))
}
