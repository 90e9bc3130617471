//! Hierarchical prediction error processor.
//!
//! Levels `0..L` form an abstraction hierarchy (0 is concrete). Every
//! processed error is scored for significance against the level's own
//! expectation of error size, recorded, and turned into a
//! [`LearningUpdate`]. Significant errors also spawn signals:
//!
//! - **ascending** to `level + 1`, mean-pooled into at most four chunks,
//! - **descending** to `level − 1`, interpolated to double length with a
//!   suppression mask,
//! - **lateral**, resident at the producing level, carrying the raw error.
//!
//! Ascending and descending signals wait in outgoing queues until
//! [`PredictionErrorProcessor::propagate_error_signals`] delivers them.

pub mod analysis;
pub mod level;
pub mod propagation;
pub mod types;

pub use analysis::{DecayReport, ErrorAnalysis, ErrorStatistics, PropagationReport};
pub use level::LevelState;
pub use types::{ErrorSignal, ErrorType, LearningUpdate, PredictionError, SignalDirection, UpdateType};

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::ProcessorConfig;
use crate::error::{ChronicleError, Result};
use crate::ring::{mean, BoundedQueue};
use crate::snapshot::ProcessorSnapshot;
use crate::types::{ErrorId, Timestamp};

use propagation::{abstract_error, elaborate_error, suppression_mask};

/// Learning updates held until drained (oldest evicted).
pub const LEARNING_UPDATE_CAPACITY: usize = 1000;
/// Learning updates averaged for learning efficiency.
pub const EFFICIENCY_WINDOW: usize = 100;
/// Improvement samples averaged for prediction improvement.
pub const IMPROVEMENT_WINDOW: usize = 10;
/// Improvement samples retained.
pub const IMPROVEMENT_CAPACITY: usize = 1000;
/// Significance above which a large error creates new structure.
pub const CREATE_SIGNIFICANCE: f64 = 0.8;

/// The prediction error processor.
#[derive(Debug)]
pub struct PredictionErrorProcessor {
    pub(crate) config: ProcessorConfig,
    pub(crate) levels: Vec<LevelState>,
    pub(crate) active_errors: HashMap<ErrorId, PredictionError>,
    pub(crate) active_order: BoundedQueue<ErrorId>,
    pub(crate) learning_updates: BoundedQueue<LearningUpdate>,
    pub(crate) update_confidences: BoundedQueue<f64>,
    pub(crate) improvements: BoundedQueue<f64>,
    pub(crate) clock: Box<dyn Clock>,
}

impl PredictionErrorProcessor {
    /// Create a processor driven by the wall clock.
    #[must_use]
    pub fn new(config: ProcessorConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }

    /// Create a processor driven by `clock`.
    #[must_use]
    pub fn with_clock(config: ProcessorConfig, clock: impl Clock + 'static) -> Self {
        let levels = (0..config.max_levels)
            .map(|_| LevelState::new(config.learning_rate, config.signal_capacity))
            .collect();
        Self {
            active_order: BoundedQueue::new(config.max_active_errors),
            config,
            levels,
            active_errors: HashMap::new(),
            learning_updates: BoundedQueue::new(LEARNING_UPDATE_CAPACITY),
            update_confidences: BoundedQueue::new(EFFICIENCY_WINDOW),
            improvements: BoundedQueue::new(IMPROVEMENT_CAPACITY),
            clock: Box::new(clock),
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Number of levels.
    #[must_use]
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// State of one level.
    #[must_use]
    pub fn level(&self, level: usize) -> Option<&LevelState> {
        self.levels.get(level)
    }

    /// Score and record a prediction error.
    ///
    /// # Errors
    /// `LevelOutOfRange` when `level >= max_levels`; `DimensionMismatch`
    /// when `predicted` and `actual` differ in length; `NonFiniteComponent`
    /// when an input or a difference is NaN or infinite. Rejected errors
    /// leave the processor untouched.
    pub fn process_error(
        &mut self,
        level: usize,
        predicted: &[f64],
        actual: &[f64],
        error_type: ErrorType,
        confidence: f64,
    ) -> Result<PredictionError> {
        let _span = tracing::debug_span!(crate::spans::PROCESS_ERROR, level).entered();
        let max_levels = self.levels.len();
        if level >= max_levels {
            warn!(level, max_levels, "rejected prediction error: level out of range");
            return Err(ChronicleError::LevelOutOfRange { level, max_levels });
        }
        if predicted.len() != actual.len() {
            warn!(
                predicted = predicted.len(),
                actual = actual.len(),
                "rejected prediction error: dimension mismatch"
            );
            return Err(ChronicleError::DimensionMismatch {
                predicted: predicted.len(),
                actual: actual.len(),
            });
        }

        let error: Vec<f64> = actual.iter().zip(predicted).map(|(a, p)| a - p).collect();
        let non_finite = predicted
            .iter()
            .zip(actual)
            .zip(&error)
            .position(|((p, a), e)| !(p.is_finite() && a.is_finite() && e.is_finite()));
        if let Some(index) = non_finite {
            warn!(level, index, "rejected prediction error: non-finite component");
            return Err(ChronicleError::NonFiniteComponent { index });
        }

        let now = self.clock.now();
        let magnitude = root_mean_square(&error);
        let state = &mut self.levels[level];
        let significance = state.significance(magnitude, error_type);

        let record = PredictionError {
            id: ErrorId::new(),
            level,
            timestamp: now,
            predicted: predicted.to_vec(),
            actual: actual.to_vec(),
            error,
            magnitude,
            significance,
            error_type,
            confidence,
        };
        state.record(&record);
        self.remember(record.clone());

        if significance > self.config.significance_threshold {
            self.emit_signals(&record, now);
        }
        if self.config.adaptive_learning {
            self.levels[level].adapt(magnitude);
        }
        self.emit_learning_update(&record, now);

        debug!(
            error = %record.id,
            level,
            magnitude,
            significance,
            "processed prediction error"
        );
        Ok(record)
    }

    /// Signals resident at `level`, oldest first (empty for unknown levels).
    #[must_use]
    pub fn get_error_signals(&self, level: usize) -> Vec<ErrorSignal> {
        self.levels
            .get(level)
            .map(|state| state.resident.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Drain the learning-update queue, oldest first.
    pub fn get_learning_updates(&mut self) -> Vec<LearningUpdate> {
        self.learning_updates.drain()
    }

    /// Learning updates waiting to be drained.
    #[must_use]
    pub fn pending_learning_updates(&self) -> usize {
        self.learning_updates.len()
    }

    /// Statistics for `level`.
    #[must_use]
    pub fn get_error_statistics(&self, level: usize) -> Option<&ErrorStatistics> {
        self.levels.get(level).map(LevelState::statistics)
    }

    /// Aggregate analysis over every level.
    #[must_use]
    pub fn get_error_analysis(&self) -> ErrorAnalysis {
        ErrorAnalysis {
            active_errors: self.active_errors.len(),
            errors_by_level: self.levels.iter().map(|l| l.statistics.total_errors).collect(),
            mean_significance: mean(self.active_errors.values().map(|e| e.significance)).unwrap_or(0.0),
            learning_efficiency: self.update_confidences.mean().unwrap_or(0.0),
            prediction_improvement: mean(self.improvements.recent(IMPROVEMENT_WINDOW).copied())
                .unwrap_or(0.0),
        }
    }

    /// Feed an improvement sample from an external learner.
    ///
    /// Non-finite samples are dropped.
    pub fn record_prediction_improvement(&mut self, improvement: f64) {
        if improvement.is_finite() {
            self.improvements.push(improvement);
        } else {
            warn!(improvement, "dropped non-finite improvement sample");
        }
    }

    /// Current learning rate of `level`.
    #[must_use]
    pub fn learning_rate(&self, level: usize) -> Option<f64> {
        self.levels.get(level).map(LevelState::learning_rate)
    }

    /// Current surprise of `level`.
    #[must_use]
    pub fn surprise(&self, level: usize) -> Option<f64> {
        self.levels.get(level).map(LevelState::surprise)
    }

    /// Look up an active error.
    #[must_use]
    pub fn active_error(&self, id: ErrorId) -> Option<&PredictionError> {
        self.active_errors.get(&id)
    }

    /// Capture the full processor state.
    #[must_use]
    pub fn snapshot(&self) -> ProcessorSnapshot {
        ProcessorSnapshot {
            config: self.config.clone(),
            levels: self.levels.clone(),
            active_errors: self
                .active_order
                .iter()
                .filter_map(|id| self.active_errors.get(id).cloned())
                .collect(),
            learning_updates: self.learning_updates.iter().cloned().collect(),
            update_confidences: self.update_confidences.iter().copied().collect(),
            improvements: self.improvements.iter().copied().collect(),
        }
    }

    /// Rebuild a processor from a snapshot.
    ///
    /// # Errors
    /// `Config` when the configuration is invalid or the level count does
    /// not match `max_levels`.
    pub fn from_snapshot(snapshot: ProcessorSnapshot, clock: impl Clock + 'static) -> Result<Self> {
        snapshot.config.validate()?;
        if snapshot.levels.len() != snapshot.config.max_levels {
            return Err(ChronicleError::Config(format!(
                "snapshot has {} levels but max_levels is {}",
                snapshot.levels.len(),
                snapshot.config.max_levels
            )));
        }
        let mut processor = Self::with_clock(snapshot.config, clock);
        processor.levels = snapshot.levels;
        for error in snapshot.active_errors {
            processor.remember(error);
        }
        for update in snapshot.learning_updates {
            processor.learning_updates.push(update);
        }
        for confidence in snapshot.update_confidences {
            processor.update_confidences.push(confidence);
        }
        for improvement in snapshot.improvements {
            processor.improvements.push(improvement);
        }
        Ok(processor)
    }

    /// Insert into the active table, evicting the oldest entry when full.
    fn remember(&mut self, error: PredictionError) {
        if let Some(evicted) = self.active_order.push(error.id) {
            self.active_errors.remove(&evicted);
        }
        self.active_errors.insert(error.id, error);
    }

    fn emit_signals(&mut self, error: &PredictionError, now: Timestamp) {
        let level = error.level;
        let top = self.levels.len() - 1;
        let threshold = self.config.error_threshold;
        let state = &mut self.levels[level];
        let rate = state.learning_rate;
        let signal = |target_level, direction, error_vector: Vec<f64>, suppression_mask| ErrorSignal {
            error_id: error.id,
            source_level: level,
            target_level,
            direction,
            strength: error.significance,
            learning_signal: error_vector.iter().map(|v| v * rate).collect(),
            error_vector,
            suppression_mask,
            timestamp: now,
            last_decay: now,
        };

        if level < top {
            let pooled = abstract_error(&error.error);
            let mask = vec![false; pooled.len()];
            state.ascending.push(signal(level + 1, SignalDirection::Ascending, pooled, mask));
        }
        if level > 0 {
            let elaborated = elaborate_error(&error.error);
            let mask = suppression_mask(&elaborated, threshold);
            state.descending.push(signal(level - 1, SignalDirection::Descending, elaborated, mask));
        }
        let mask = vec![false; error.error.len()];
        state.resident.push(signal(level, SignalDirection::Lateral, error.error.clone(), mask));
    }

    fn emit_learning_update(&mut self, error: &PredictionError, now: Timestamp) {
        let threshold = self.config.error_threshold;
        let rate = self.levels[error.level].learning_rate;
        let update = LearningUpdate {
            target_level: error.level,
            update_type: classify_update(error.magnitude, error.significance, threshold),
            magnitude: error.magnitude * rate,
            specificity: error.error.iter().map(|e| specificity(*e, threshold)).collect(),
            confidence: error.confidence,
            error_contribution: error.significance,
            timestamp: now,
        };
        self.update_confidences.push(update.confidence);
        self.learning_updates.push(update);
    }
}

/// Root mean square, 0 for an empty vector.
///
/// Components are scaled by the largest magnitude first, so finite input
/// never overflows to infinity.
#[must_use]
pub fn root_mean_square(values: &[f64]) -> f64 {
    let scale = values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if scale <= 0.0 || !scale.is_finite() {
        return scale;
    }
    mean(values.iter().map(|v| (v / scale).powi(2))).map_or(0.0, |m| scale * m.sqrt())
}

/// Choose the update type for an error.
///
/// | magnitude            | significance | update       |
/// |----------------------|--------------|--------------|
/// | > 2 × threshold      | > 0.8        | `Create`     |
/// | > 2 × threshold      | ≤ 0.8        | `Strengthen` |
/// | (threshold, 2 × thr] | any          | `Strengthen` |
/// | ≤ threshold          | any          | `Weaken`     |
#[must_use]
pub fn classify_update(magnitude: f64, significance: f64, error_threshold: f64) -> UpdateType {
    if magnitude > 2.0 * error_threshold {
        if significance > CREATE_SIGNIFICANCE {
            UpdateType::Create
        } else {
            UpdateType::Strengthen
        }
    } else if magnitude > error_threshold {
        UpdateType::Strengthen
    } else {
        UpdateType::Weaken
    }
}

/// `min(1, |component| / error_threshold)`.
fn specificity(component: f64, error_threshold: f64) -> f64 {
    if error_threshold > 0.0 {
        (component.abs() / error_threshold).min(1.0)
    } else if component == 0.0 {
        0.0
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn processor() -> (PredictionErrorProcessor, ManualClock) {
        let clock = ManualClock::new(Timestamp(0));
        (PredictionErrorProcessor::with_clock(ProcessorConfig::default(), clock.clone()), clock)
    }

    #[test]
    fn error_is_actual_minus_predicted() {
        let (mut p, _) = processor();
        let e = p
            .process_error(1, &[1.0, 2.0, 3.0], &[2.0, 2.0, 1.0], ErrorType::Spatial, 0.5)
            .expect("valid");
        assert_eq!(e.error, vec![1.0, 0.0, -2.0]);
        assert!((e.magnitude - (5.0_f64 / 3.0).sqrt()).abs() < 1e-12);
        assert!(p.active_error(e.id).is_some());
    }

    #[test]
    fn temporal_unit_error_saturates_significance() {
        let (mut p, _) = processor();
        let e = p
            .process_error(0, &[0.0, 0.0, 0.0], &[1.0, 1.0, 1.0], ErrorType::Temporal, 1.0)
            .expect("valid");
        assert!((e.magnitude - 1.0).abs() < 1e-12);
        assert!((e.significance - 1.0).abs() < 1e-12);
    }

    #[test]
    fn contract_violations_are_rejected() {
        let (mut p, _) = processor();
        assert!(matches!(
            p.process_error(5, &[0.0], &[0.0], ErrorType::Spatial, 1.0),
            Err(ChronicleError::LevelOutOfRange { level: 5, max_levels: 5 })
        ));
        assert!(matches!(
            p.process_error(0, &[0.0, 1.0], &[0.0], ErrorType::Spatial, 1.0),
            Err(ChronicleError::DimensionMismatch { predicted: 2, actual: 1 })
        ));
        assert_eq!(p.pending_learning_updates(), 0);
    }

    #[test]
    fn non_finite_components_leave_level_untouched() {
        let (mut p, _) = processor();
        assert!(matches!(
            p.process_error(0, &[0.0], &[f64::INFINITY], ErrorType::Spatial, 1.0),
            Err(ChronicleError::NonFiniteComponent { index: 0 })
        ));
        assert!(matches!(
            p.process_error(0, &[0.0, f64::NAN], &[1.0, 1.0], ErrorType::Spatial, 1.0),
            Err(ChronicleError::NonFiniteComponent { index: 1 })
        ));
        assert!(matches!(
            p.process_error(1, &[-f64::MAX], &[f64::MAX], ErrorType::Spatial, 1.0),
            Err(ChronicleError::NonFiniteComponent { index: 0 })
        ));
        assert_eq!(p.pending_learning_updates(), 0);
        assert_eq!(p.surprise(0), Some(0.0));
        assert!(p.get_error_signals(0).is_empty());

        let e = p
            .process_error(0, &[0.0, 0.0, 0.0], &[1.0, 1.0, 1.0], ErrorType::Temporal, 1.0)
            .expect("valid");
        assert!((e.significance - 1.0).abs() < 1e-12);
        let stats = p.get_error_statistics(0).expect("level 0");
        assert_eq!(stats.total_errors, 1);
        assert!((stats.mean_magnitude - 1.0).abs() < 1e-12);
        assert!(p.get_error_statistics(1).is_some_and(|s| s.mean_magnitude.abs() < f64::EPSILON));
    }

    #[test]
    fn huge_finite_components_keep_magnitude_finite() {
        assert!((root_mean_square(&[3.0, 4.0]) - 12.5_f64.sqrt()).abs() < 1e-12);
        let rms = root_mean_square(&[1e200, 1e200]);
        assert!(rms.is_finite());
        assert!((rms / 1e200 - 1.0).abs() < 1e-12);
        assert!(root_mean_square(&[]).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_vectors_have_zero_magnitude() {
        let (mut p, _) = processor();
        let e = p.process_error(0, &[], &[], ErrorType::Semantic, 1.0).expect("valid");
        assert!(e.magnitude.abs() < f64::EPSILON);
        assert!(e.significance.abs() < f64::EPSILON);
    }

    #[test]
    fn significant_error_spawns_three_signals() {
        let (mut p, _) = processor();
        p.process_error(2, &[0.0, 0.0], &[1.0, 1.0], ErrorType::Semantic, 1.0)
            .expect("valid");
        let lateral = p.get_error_signals(2);
        assert_eq!(lateral.len(), 1);
        assert_eq!(lateral[0].direction, SignalDirection::Lateral);

        let report = p.propagate_error_signals();
        assert_eq!(report.ascended, 1);
        assert_eq!(report.descended, 1);
        let up = p.get_error_signals(3);
        assert_eq!(up[0].direction, SignalDirection::Ascending);
        assert_eq!(up[0].error_vector.len(), 2);
        let down = p.get_error_signals(1);
        assert_eq!(down[0].direction, SignalDirection::Descending);
        assert_eq!(down[0].error_vector.len(), 4);
        assert!(down[0].suppression_mask.iter().all(|m| *m));
        assert_eq!(p.get_error_statistics(3).expect("level").total_errors, 1);
    }

    #[test]
    fn edge_levels_skip_missing_neighbours() {
        let (mut p, _) = processor();
        p.process_error(0, &[0.0], &[1.0], ErrorType::Spatial, 1.0).expect("valid");
        p.process_error(4, &[0.0], &[1.0], ErrorType::Spatial, 1.0).expect("valid");
        assert_eq!(p.levels[0].descending.len(), 0);
        assert_eq!(p.levels[0].ascending.len(), 1);
        assert_eq!(p.levels[4].ascending.len(), 0);
        assert_eq!(p.levels[4].descending.len(), 1);
    }

    #[test]
    fn threshold_comparison_is_strict() {
        let config = ProcessorConfig {
            significance_threshold: 0.5,
            adaptive_learning: false,
            ..ProcessorConfig::default()
        };
        let mut p = PredictionErrorProcessor::with_clock(config, ManualClock::new(Timestamp(0)));
        // Spatial weight 1.0, empty window, no surprise: significance == magnitude.
        p.process_error(1, &[0.0], &[0.5], ErrorType::Spatial, 1.0).expect("valid");
        assert!(p.get_error_signals(1).is_empty());
        p.process_error(1, &[0.0], &[0.5 + 1e-9], ErrorType::Spatial, 1.0).expect("valid");
        assert_eq!(p.get_error_signals(1).len(), 1);
    }

    #[test]
    fn learning_update_always_emitted() {
        let (mut p, _) = processor();
        p.process_error(0, &[0.0], &[1.0], ErrorType::Temporal, 0.9).expect("valid");
        p.process_error(0, &[0.0], &[0.15], ErrorType::Spatial, 0.7).expect("valid");
        p.process_error(0, &[0.0], &[0.01], ErrorType::Spatial, 0.5).expect("valid");
        let updates = p.get_learning_updates();
        assert_eq!(updates.len(), 3);
        assert_eq!(updates[0].update_type, UpdateType::Create);
        assert_eq!(updates[1].update_type, UpdateType::Strengthen);
        assert_eq!(updates[2].update_type, UpdateType::Weaken);
        assert!((updates[2].specificity[0] - 0.1).abs() < 1e-9);
        assert!((updates[0].specificity[0] - 1.0).abs() < 1e-12);
        assert!((updates[0].magnitude - 0.1).abs() < 1e-12);
        assert_eq!(p.pending_learning_updates(), 0);
    }

    #[test]
    fn classification_table() {
        assert_eq!(classify_update(0.3, 0.9, 0.1), UpdateType::Create);
        assert_eq!(classify_update(0.3, 0.8, 0.1), UpdateType::Strengthen);
        assert_eq!(classify_update(0.15, 1.0, 0.1), UpdateType::Strengthen);
        assert_eq!(classify_update(0.1, 1.0, 0.1), UpdateType::Weaken);
    }

    #[test]
    fn active_table_is_bounded() {
        let config = ProcessorConfig {
            max_active_errors: 2,
            ..ProcessorConfig::default()
        };
        let mut p = PredictionErrorProcessor::with_clock(config, ManualClock::new(Timestamp(0)));
        let first = p.process_error(0, &[0.0], &[0.1], ErrorType::Spatial, 1.0).expect("valid");
        p.process_error(0, &[0.0], &[0.1], ErrorType::Spatial, 1.0).expect("valid");
        p.process_error(0, &[0.0], &[0.1], ErrorType::Spatial, 1.0).expect("valid");
        assert!(p.active_error(first.id).is_none());
        assert_eq!(p.get_error_analysis().active_errors, 2);
    }

    #[test]
    fn analysis_aggregates() {
        let (mut p, _) = processor();
        assert_eq!(p.get_error_analysis(), ErrorAnalysis {
            errors_by_level: vec![0; 5],
            ..ErrorAnalysis::default()
        });
        p.process_error(0, &[0.0], &[0.2], ErrorType::Spatial, 0.4).expect("valid");
        p.process_error(1, &[0.0], &[0.2], ErrorType::Spatial, 0.8).expect("valid");
        for v in 0..12 {
            p.record_prediction_improvement(f64::from(v));
        }
        p.record_prediction_improvement(f64::NAN);
        let analysis = p.get_error_analysis();
        assert_eq!(analysis.active_errors, 2);
        assert_eq!(analysis.errors_by_level, vec![1, 1, 0, 0, 0]);
        assert!((analysis.mean_significance - 0.2).abs() < 1e-12);
        assert!((analysis.learning_efficiency - 0.6).abs() < 1e-12);
        // mean of 2..=11
        assert!((analysis.prediction_improvement - 6.5).abs() < 1e-12);
    }

    #[test]
    fn idle_propagation_drains_every_level() {
        let (mut p, _) = processor();
        for level in 0..5 {
            p.process_error(level, &[0.0, 0.0], &[2.0, -2.0], ErrorType::Contextual, 1.0)
                .expect("valid");
        }
        let mut cycles = 0;
        while (0..5).any(|l| !p.get_error_signals(l).is_empty()) {
            p.propagate_error_signals();
            cycles += 1;
            assert!(cycles < 100, "signals never drained");
        }
    }

    #[test]
    fn elapsed_time_speeds_decay() {
        let (mut p, clock) = processor();
        p.process_error(0, &[0.0], &[1.0], ErrorType::Spatial, 1.0).expect("valid");
        clock.advance_millis(10_000);
        p.apply_error_decay();
        let strength = p.get_error_signals(0)[0].strength;
        assert!((strength - 0.45).abs() < 1e-9);
    }

    #[test]
    fn signal_ascended_this_cycle_is_suppressed_from_above() {
        let config = ProcessorConfig {
            decay_rate: 0.0,
            ..ProcessorConfig::default()
        };
        let mut p = PredictionErrorProcessor::with_clock(config, ManualClock::new(Timestamp(0)));
        p.process_error(0, &[0.0; 8], &[1.0; 8], ErrorType::Temporal, 1.0).expect("valid");
        p.process_error(2, &[0.0, 0.0], &[1.0, 1.0], ErrorType::Temporal, 1.0).expect("valid");
        assert!(p.get_error_signals(1).is_empty());

        let report = p.propagate_error_signals();
        assert_eq!(report.suppressed_components, 4);
        let signals = p.get_error_signals(1);
        let ascended = signals
            .iter()
            .find(|s| s.direction == SignalDirection::Ascending)
            .expect("ascended from level 0");
        // Pooled to four unit chunks, then damped by (1 − 1.0 × 0.5).
        assert_eq!(ascended.error_vector.len(), 4);
        assert!(ascended.error_vector.iter().all(|v| (v - 0.5).abs() < 1e-12));
        let descended = signals
            .iter()
            .find(|s| s.direction == SignalDirection::Descending)
            .expect("descended from level 2");
        assert!(descended.error_vector.iter().all(|v| (v - 1.0).abs() < 1e-12));
    }

    #[test]
    fn descending_signal_suppresses_resident_components() {
        let (mut p, _) = processor();
        // Resident lateral signal at level 0 with a two-component error.
        p.process_error(0, &[0.0, 0.0], &[1.0, 1.0], ErrorType::Spatial, 1.0).expect("valid");
        // Level 1 sends a large descending signal: mask all true.
        p.process_error(1, &[0.0], &[1.0], ErrorType::Spatial, 1.0).expect("valid");
        let report = p.propagate_error_signals();
        assert_eq!(report.suppressed_components, 2);
        let lateral = p
            .get_error_signals(0)
            .into_iter()
            .find(|s| s.direction == SignalDirection::Lateral)
            .expect("lateral");
        // Damped by (1 − 1.0 × 0.5), then decayed by 0.9.
        assert!((lateral.error_vector[0] - 0.45).abs() < 1e-9);
    }
}
