//! Forgetting: decay of episode importance over time.
//!
//! For every episode:
//!
//! ```text
//! f = e^(-Δt_days · decay_rate)          (Δt since last access)
//! p = f · (1 - consolidation_level)      (consolidation protects)
//! importance ← importance · (1 - p)
//! ```
//!
//! Episodes with `importance < 0.1` and `consolidation_level < 0.3` are
//! then purged. A fully consolidated episode has `p = 0` and is never
//! removed.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::memory::SequenceMemory;
use crate::types::{EpisodeId, Timestamp};

/// Importance below which an unprotected episode is forgotten.
pub const FORGET_IMPORTANCE_FLOOR: f64 = 0.1;

/// Consolidation level at or above which an episode is never forgotten.
pub const PROTECTED_CONSOLIDATION: f64 = 0.3;

/// Samples retained in the forgetting curve.
pub const FORGETTING_CURVE_CAPACITY: usize = 1000;

/// One point on the forgetting curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForgettingSample {
    /// When the pass ran.
    pub timestamp: Timestamp,
    /// Episodes before the pass.
    pub before: usize,
    /// Episodes after the pass.
    pub after: usize,
    /// `after / before` (1.0 for an empty store).
    pub retention_ratio: f64,
}

/// Outcome of a forgetting pass.
#[derive(Debug, Clone)]
pub struct ForgettingReport {
    /// Ids purged by this pass.
    pub removed: Vec<EpisodeId>,
    /// The sample appended to the forgetting curve.
    pub sample: ForgettingSample,
}

/// Raw forgetting factor `e^(-Δt_days · decay_rate)`.
#[must_use]
pub fn forgetting_factor(delta_days: f64, decay_rate: f64) -> f64 {
    (-delta_days.max(0.0) * decay_rate.max(0.0)).exp()
}

/// Forgetting after consolidation protection: `factor · (1 - level)`.
#[must_use]
pub fn protected_forgetting(factor: f64, consolidation_level: f64) -> f64 {
    factor * (1.0 - consolidation_level.clamp(0.0, 1.0))
}

/// Whether an episode in this state is purged by forgetting.
#[must_use]
pub fn is_forgettable(importance: f64, consolidation_level: f64) -> bool {
    importance < FORGET_IMPORTANCE_FLOOR && consolidation_level < PROTECTED_CONSOLIDATION
}

impl<E> SequenceMemory<E> {
    /// Decay every episode's importance and purge the forgotten ones.
    pub fn apply_forgetting(&mut self) -> ForgettingReport {
        let _span = tracing::debug_span!(crate::spans::FORGETTING).entered();
        let now = self.clock.now();
        let decay_rate = self.config.decay_rate;
        let before = self.episodes.len();

        let mut doomed = Vec::new();
        for episode in self.episodes.values_mut() {
            let factor = forgetting_factor(now.days_since(episode.last_accessed), decay_rate);
            let loss = protected_forgetting(factor, episode.consolidation_level);
            episode.importance = (episode.importance * (1.0 - loss)).max(0.0);
            if is_forgettable(episode.importance, episode.consolidation_level) {
                doomed.push(episode.id);
            }
        }
        doomed.sort();

        for id in &doomed {
            self.remove_episode(*id);
        }

        let after = self.episodes.len();
        let retention_ratio = if before == 0 { 1.0 } else { after as f64 / before as f64 };
        let sample = ForgettingSample {
            timestamp: now,
            before,
            after,
            retention_ratio,
        };
        self.forgetting_curve.push(sample.clone());

        if doomed.is_empty() {
            debug!(examined = before, "forgetting pass removed nothing");
        } else {
            info!(removed = doomed.len(), remaining = after, retention_ratio, "forgot episodes");
        }

        ForgettingReport {
            removed: doomed,
            sample,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::MemoryConfig;

    #[test]
    fn factor_is_one_at_zero_elapsed() {
        assert!((forgetting_factor(0.0, 0.5) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn factor_shrinks_with_time() {
        let f1 = forgetting_factor(1.0, 0.1);
        let f10 = forgetting_factor(10.0, 0.1);
        assert!(f1 > f10);
        assert!((f10 - (-1.0_f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn full_consolidation_blocks_forgetting() {
        assert!(protected_forgetting(0.9, 1.0).abs() < 1e-12);
        assert!(!is_forgettable(0.0, 1.0));
        assert!(!is_forgettable(0.0, PROTECTED_CONSOLIDATION));
        assert!(is_forgettable(0.05, 0.29));
        assert!(!is_forgettable(FORGET_IMPORTANCE_FLOOR, 0.0));
    }

    #[test]
    fn pass_decays_and_records_sample() {
        let clock = ManualClock::new(Timestamp(0));
        let mut mem: SequenceMemory<u8> =
            SequenceMemory::with_clock(MemoryConfig::default(), clock.clone());
        let id = mem.store_episode(vec![1, 2, 3, 4, 5, 6, 7, 8], vec![], vec![], &[], 1.0);
        let initial = mem.get_episode(id).expect("stored").importance;

        clock.advance_days(30.0);
        let report = mem.apply_forgetting();
        assert!(report.removed.is_empty());
        let decayed = mem.get_episode(id).expect("kept").importance;
        let expected = initial * (1.0 - forgetting_factor(30.0, 0.1));
        assert!((decayed - expected).abs() < 1e-9);
        assert_eq!(report.sample.before, 1);
        assert!((report.sample.retention_ratio - 1.0).abs() < 1e-12);
        assert_eq!(mem.forgetting_curve().count(), 1);
    }

    #[test]
    fn empty_store_retains_everything() {
        let mut mem: SequenceMemory<u8> = SequenceMemory::with_clock(
            MemoryConfig::default(),
            ManualClock::new(Timestamp(0)),
        );
        let report = mem.apply_forgetting();
        assert!((report.sample.retention_ratio - 1.0).abs() < 1e-12);
    }
}
