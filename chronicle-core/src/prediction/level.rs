//! Adaptive state of one hierarchy level.
//!
//! Each level keeps its own learning rate, a window of recent error
//! magnitudes (its expectation of how wrong it usually is), a surprise
//! scalar, the bounded error history, outgoing signal queues, the list of
//! signals resident at the level and its statistics.

use serde::{Deserialize, Serialize};

use crate::prediction::analysis::ErrorStatistics;
use crate::prediction::types::{ErrorSignal, ErrorType, PredictionError};
use crate::ring::{mean, BoundedQueue};

/// Magnitudes kept in the expectation window.
pub const EXPECTATION_CAPACITY: usize = 100;
/// Errors kept in the per-level history.
pub const HISTORY_CAPACITY: usize = 1000;
/// Samples compared when nudging the learning rate.
pub const ADAPTATION_WINDOW: usize = 5;
/// Learning-rate multiplier when errors grow.
pub const RATE_INCREASE: f64 = 1.05;
/// Learning-rate multiplier when errors shrink.
pub const RATE_DECREASE: f64 = 0.95;
/// Learning-rate floor.
pub const MIN_LEARNING_RATE: f64 = 0.01;
/// Learning-rate ceiling.
pub const MAX_LEARNING_RATE: f64 = 0.5;
/// Significance gain per unit of surprise.
pub const SURPRISE_GAIN: f64 = 0.5;
/// Guards ratios against a zero mean.
pub const EPSILON: f64 = 1e-10;

/// State of one level in the hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelState {
    pub(crate) learning_rate: f64,
    pub(crate) expectations: BoundedQueue<f64>,
    pub(crate) surprise: f64,
    pub(crate) history: BoundedQueue<PredictionError>,
    pub(crate) ascending: BoundedQueue<ErrorSignal>,
    pub(crate) descending: BoundedQueue<ErrorSignal>,
    pub(crate) resident: BoundedQueue<ErrorSignal>,
    pub(crate) statistics: ErrorStatistics,
}

impl LevelState {
    /// Fresh level state.
    #[must_use]
    pub fn new(learning_rate: f64, signal_capacity: usize) -> Self {
        Self {
            learning_rate: learning_rate.clamp(MIN_LEARNING_RATE, MAX_LEARNING_RATE),
            expectations: BoundedQueue::new(EXPECTATION_CAPACITY),
            surprise: 0.0,
            history: BoundedQueue::new(HISTORY_CAPACITY),
            ascending: BoundedQueue::new(signal_capacity),
            descending: BoundedQueue::new(signal_capacity),
            resident: BoundedQueue::new(signal_capacity),
            statistics: ErrorStatistics::default(),
        }
    }

    /// Current learning rate.
    #[must_use]
    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// Current surprise.
    #[must_use]
    pub fn surprise(&self) -> f64 {
        self.surprise
    }

    /// Mean of the expectation window.
    #[must_use]
    pub fn expected_magnitude(&self) -> Option<f64> {
        self.expectations.mean()
    }

    /// Recorded errors, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &PredictionError> {
        self.history.iter()
    }

    /// Signals resident at this level, oldest first.
    pub fn resident_signals(&self) -> impl Iterator<Item = &ErrorSignal> {
        self.resident.iter()
    }

    /// Statistics for this level.
    #[must_use]
    pub fn statistics(&self) -> &ErrorStatistics {
        &self.statistics
    }

    /// Significance of an error of `magnitude` and `error_type` at this level.
    ///
    /// ```text
    /// s = magnitude
    /// s *= ln(magnitude / (mean(window) + ε) + 1)    (non-empty window only)
    /// s *= type weight
    /// s *= 1 + surprise × 0.5
    /// ```
    /// clamped to `[0, 1]`.
    #[must_use]
    pub fn significance(&self, magnitude: f64, error_type: ErrorType) -> f64 {
        let mut significance = magnitude;
        if let Some(expected) = self.expected_magnitude() {
            significance *= (magnitude / (expected + EPSILON) + 1.0).ln();
        }
        significance *= error_type.weight();
        significance *= 1.0 + self.surprise * SURPRISE_GAIN;
        if significance.is_nan() { 0.0 } else { significance.clamp(0.0, 1.0) }
    }

    /// Nudge the learning rate, recompute surprise against the prior
    /// window, then push `magnitude` into the window.
    pub(crate) fn adapt(&mut self, magnitude: f64) {
        if self.expectations.len() >= ADAPTATION_WINDOW {
            if let Some(recent) = mean(self.expectations.recent(ADAPTATION_WINDOW).copied()) {
                let factor = if magnitude > recent { RATE_INCREASE } else { RATE_DECREASE };
                self.learning_rate = (self.learning_rate * factor).clamp(MIN_LEARNING_RATE, MAX_LEARNING_RATE);
            }
        }
        self.surprise = self
            .expected_magnitude()
            .map_or(0.0, |expected| (magnitude - expected).abs() / (expected + EPSILON));
        self.expectations.push(magnitude);
    }

    /// Append to the history and update statistics.
    pub(crate) fn record(&mut self, error: &PredictionError) {
        self.history.push(error.clone());
        self.statistics.record(error, &self.history);
    }
}
