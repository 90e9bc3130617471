//! Statistics and reports over processed errors and propagated signals.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::prediction::types::{ErrorType, PredictionError};
use crate::ring::{mean, BoundedQueue};

/// History entries compared when computing the error reduction rate.
pub const REDUCTION_WINDOW: usize = 10;

/// Per-level error statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorStatistics {
    /// Errors processed at this level plus ascending signals received.
    pub total_errors: usize,
    /// Processed errors by kind.
    pub errors_by_type: BTreeMap<ErrorType, usize>,
    /// Running mean magnitude of processed errors.
    pub mean_magnitude: f64,
    /// Processed errors contributing to `mean_magnitude`.
    pub magnitude_samples: usize,
    /// `(older − recent) / older` over the last two windows of ten
    /// magnitudes; positive when errors shrink, 0 when undefined.
    pub error_reduction_rate: f64,
}

impl ErrorStatistics {
    /// Fold a newly processed error into the statistics.
    ///
    /// `history` must already contain the error.
    pub(crate) fn record(&mut self, error: &PredictionError, history: &BoundedQueue<PredictionError>) {
        self.total_errors += 1;
        *self.errors_by_type.entry(error.error_type).or_insert(0) += 1;
        self.magnitude_samples += 1;
        self.mean_magnitude += (error.magnitude - self.mean_magnitude) / self.magnitude_samples as f64;
        self.error_reduction_rate = reduction_rate(history);
    }
}

/// Reduction rate over the last ten magnitudes versus the up-to-ten before them.
#[must_use]
pub fn reduction_rate(history: &BoundedQueue<PredictionError>) -> f64 {
    let len = history.len();
    if len < REDUCTION_WINDOW {
        return 0.0;
    }
    let magnitudes: Vec<f64> = history
        .recent(REDUCTION_WINDOW * 2)
        .map(|e| e.magnitude)
        .collect();
    let split = magnitudes.len() - REDUCTION_WINDOW;
    let (older, recent) = magnitudes.split_at(split);
    match (mean(older.iter().copied()), mean(recent.iter().copied())) {
        (Some(older), Some(recent)) if older > f64::EPSILON => (older - recent) / older,
        _ => 0.0,
    }
}

/// Aggregate view over the whole processor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorAnalysis {
    /// Errors in the active table.
    pub active_errors: usize,
    /// `total_errors` of each level, indexed by level.
    pub errors_by_level: Vec<usize>,
    /// Mean significance of active errors (0 when none).
    pub mean_significance: f64,
    /// Mean confidence of the last 100 learning updates (0 when none).
    pub learning_efficiency: f64,
    /// Mean of the last 10 recorded improvement samples (0 when none).
    pub prediction_improvement: f64,
}

/// Outcome of one propagation cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropagationReport {
    /// Ascending signals delivered.
    pub ascended: usize,
    /// Descending signals delivered.
    pub descended: usize,
    /// Resident components damped by suppression.
    pub suppressed_components: usize,
    /// The decay step that closed the cycle.
    pub decay: DecayReport,
}

/// Outcome of a decay step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecayReport {
    /// Signals whose strength fell to 0.01 or below.
    pub pruned: usize,
    /// Signals still resident across all levels.
    pub remaining: usize,
}
