//! Signal propagation through the hierarchy.
//!
//! One cycle runs three ordered steps:
//!
//! 1. **Ascend** (levels `0..L-1`): each level's ascending queue is drained
//!    into the resident list of the level above.
//! 2. **Descend** (levels `L-1..1`): each drained descending signal damps
//!    the flagged components of every signal already resident one level
//!    below by `1 − strength × suppression_strength`, then joins them.
//! 3. **Decay**: every resident signal is scaled by
//!    `(1 − decay_rate) × 0.5^(Δt / 10 s)` and weak ones are pruned.
//!
//! The order matters: a signal delivered upward this cycle can only be
//! suppressed by a descending signal from a level processed after it.

use tracing::{debug, trace};

use crate::prediction::analysis::{DecayReport, PropagationReport};
use crate::prediction::types::ErrorSignal;
use crate::prediction::PredictionErrorProcessor;
use crate::ring::BoundedQueue;

/// Most chunks an error is pooled into on the way up.
pub const ABSTRACT_CHUNKS: usize = 4;
/// Suppression flags components above this multiple of the error threshold.
pub const SUPPRESSION_MULTIPLE: f64 = 5.0;
/// Signal half-life in milliseconds.
pub const SIGNAL_HALF_LIFE_MS: f64 = 10_000.0;
/// Signals at or below this strength are pruned.
pub const PRUNE_STRENGTH: f64 = 0.01;

/// Mean-pool `error` into at most four equal chunks (the last may be short).
#[must_use]
pub fn abstract_error(error: &[f64]) -> Vec<f64> {
    if error.is_empty() {
        return Vec::new();
    }
    let chunk = error.len().div_ceil(ABSTRACT_CHUNKS);
    error
        .chunks(chunk)
        .map(|c| c.iter().sum::<f64>() / c.len() as f64)
        .collect()
}

/// Linearly interpolate `error` to twice its length, keeping both endpoints.
#[must_use]
pub fn elaborate_error(error: &[f64]) -> Vec<f64> {
    match error {
        [] => Vec::new(),
        [only] => vec![*only; 2],
        _ => {
            let last = error.len() - 1;
            let out = error.len() * 2;
            let step = last as f64 / (out - 1) as f64;
            (0..out)
                .map(|j| {
                    let position = j as f64 * step;
                    let lo = (position.floor() as usize).min(last);
                    let hi = (lo + 1).min(last);
                    let t = position - lo as f64;
                    error[lo] * (1.0 - t) + error[hi] * t
                })
                .collect()
        }
    }
}

/// Flag components whose magnitude exceeds five times `error_threshold`.
#[must_use]
pub fn suppression_mask(values: &[f64], error_threshold: f64) -> Vec<bool> {
    values
        .iter()
        .map(|v| v.abs() > SUPPRESSION_MULTIPLE * error_threshold)
        .collect()
}

/// `(1 − decay_rate) × 0.5^(elapsed / half-life)`.
#[must_use]
pub fn decay_factor(elapsed_ms: i64, decay_rate: f64) -> f64 {
    let retention = (1.0 - decay_rate).clamp(0.0, 1.0);
    retention * 0.5_f64.powf(elapsed_ms.max(0) as f64 / SIGNAL_HALF_LIFE_MS)
}

/// Damp every masked component of every resident signal; returns the count damped.
fn suppress(resident: &mut BoundedQueue<ErrorSignal>, descending: &ErrorSignal, suppression_strength: f64) -> usize {
    let factor = (1.0 - descending.strength * suppression_strength).clamp(0.0, 1.0);
    let mut damped = 0;
    for signal in resident.iter_mut() {
        for (value, masked) in signal.error_vector.iter_mut().zip(&descending.suppression_mask) {
            if *masked {
                *value *= factor;
                damped += 1;
            }
        }
    }
    damped
}

impl PredictionErrorProcessor {
    /// Run one ascend → descend → decay cycle.
    pub fn propagate_error_signals(&mut self) -> PropagationReport {
        let _span = tracing::debug_span!(crate::spans::PROPAGATION).entered();
        let mut report = PropagationReport::default();
        let levels = self.levels.len();

        for level in 0..levels.saturating_sub(1) {
            let drained = self.levels[level].ascending.drain();
            let target = &mut self.levels[level + 1];
            for signal in drained {
                trace!(from = level, strength = signal.strength, "ascending signal delivered");
                target.statistics.total_errors += 1;
                target.resident.push(signal);
                report.ascended += 1;
            }
        }

        let suppression_strength = self.config.suppression_strength;
        for level in (1..levels).rev() {
            let drained = self.levels[level].descending.drain();
            let target = &mut self.levels[level - 1];
            for signal in drained {
                let damped = suppress(&mut target.resident, &signal, suppression_strength);
                trace!(from = level, strength = signal.strength, damped, "descending signal delivered");
                report.suppressed_components += damped;
                target.resident.push(signal);
                report.descended += 1;
            }
        }

        report.decay = self.apply_error_decay();
        debug!(
            ascended = report.ascended,
            descended = report.descended,
            suppressed = report.suppressed_components,
            pruned = report.decay.pruned,
            remaining = report.decay.remaining,
            "propagation cycle complete"
        );
        report
    }

    /// Decay every resident signal and prune those at or below 0.01 strength.
    pub fn apply_error_decay(&mut self) -> DecayReport {
        let _span = tracing::trace_span!(crate::spans::SIGNAL_DECAY).entered();
        let now = self.clock.now();
        let decay_rate = self.config.decay_rate;
        let mut report = DecayReport::default();

        for level in &mut self.levels {
            for signal in level.resident.iter_mut() {
                signal.scale(decay_factor(now.millis_since(signal.last_decay), decay_rate));
                signal.last_decay = now;
            }
            let before = level.resident.len();
            level.resident.retain(|s| s.strength > PRUNE_STRENGTH);
            report.pruned += before - level.resident.len();
            report.remaining += level.resident.len();
        }
        report
    }
}
