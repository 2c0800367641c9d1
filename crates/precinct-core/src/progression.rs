//! Level thresholds.
//!
//! Level 1 starts at zero points. Reaching level 2 takes `base_threshold`
//! points, and each later threshold adds `threshold_step * n` on top of the
//! previous one, where `n` is the level being reached minus one.

use crate::config::ProgressionConfig;

/// Pure mapping between score and progression level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressionCurve {
    base_threshold: u64,
    threshold_step: u64,
}

impl ProgressionCurve {
    /// Build a curve from configuration.
    pub const fn new(config: &ProgressionConfig) -> Self {
        Self {
            base_threshold: config.base_threshold,
            threshold_step: config.threshold_step,
        }
    }

    /// Points needed to reach `level`, or `None` if it overflows `u64`.
    pub fn points_to_reach(&self, level: u32) -> Option<u64> {
        if level <= 1 {
            return Some(0);
        }
        let mut threshold = self.base_threshold;
        for reached in 2..level {
            let bump = self.threshold_step.checked_mul(u64::from(reached))?;
            threshold = threshold.checked_add(bump)?;
        }
        Some(threshold)
    }

    /// Highest level whose threshold `score` has reached.
    pub fn level_for_score(&self, score: i64) -> u32 {
        let Ok(score) = u64::try_from(score) else {
            return 1;
        };
        if self.base_threshold == 0 || self.threshold_step == 0 {
            return 1;
        }
        let mut level: u32 = 1;
        let mut threshold = self.base_threshold;
        while score >= threshold {
            let Some(next) = level.checked_add(1) else {
                break;
            };
            level = next;
            let bump = self.threshold_step.checked_mul(u64::from(level));
            match bump.and_then(|b| threshold.checked_add(b)) {
                Some(t) => threshold = t,
                None => break,
            }
        }
        level
    }
}
