//! Records produced by the prediction error processor.

use serde::{Deserialize, Serialize};

use crate::types::{ErrorId, Timestamp};

/// What kind of prediction went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ErrorType {
    /// Where something is.
    Spatial,
    /// When something happens.
    Temporal,
    /// The surrounding situation.
    Contextual,
    /// What something means.
    Semantic,
}

impl ErrorType {
    /// Every variant, in declaration order.
    pub const ALL: [Self; 4] = [Self::Spatial, Self::Temporal, Self::Contextual, Self::Semantic];

    /// Multiplier applied to significance.
    #[must_use]
    pub fn weight(self) -> f64 {
        match self {
            Self::Spatial => 1.0,
            Self::Temporal => 1.2,
            Self::Contextual => 1.1,
            Self::Semantic => 1.3,
        }
    }
}

/// One recorded prediction error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionError {
    /// Unique id.
    pub id: ErrorId,
    /// Hierarchy level that produced the prediction.
    pub level: usize,
    /// When the error was processed.
    pub timestamp: Timestamp,
    /// The prediction.
    pub predicted: Vec<f64>,
    /// What actually happened.
    pub actual: Vec<f64>,
    /// `actual[i] - predicted[i]`.
    pub error: Vec<f64>,
    /// Root mean square of `error` (0 for empty vectors).
    pub magnitude: f64,
    /// Significance in `[0, 1]`.
    pub significance: f64,
    /// Error kind.
    pub error_type: ErrorType,
    /// Caller-supplied confidence in the prediction.
    pub confidence: f64,
}

/// Direction of an error signal relative to the level that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalDirection {
    /// Towards the more abstract level above.
    Ascending,
    /// Towards the more concrete level below.
    Descending,
    /// Kept at the producing level.
    Lateral,
}

/// An error travelling through the hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorSignal {
    /// The error this signal was derived from.
    pub error_id: ErrorId,
    /// Producing level.
    pub source_level: usize,
    /// Receiving level.
    pub target_level: usize,
    /// Direction of travel.
    pub direction: SignalDirection,
    /// Current strength; pruned at or below 0.01.
    pub strength: f64,
    /// Error vector, reshaped for the receiving level.
    pub error_vector: Vec<f64>,
    /// Error vector scaled by the producing level's learning rate.
    pub learning_signal: Vec<f64>,
    /// Components a descending signal suppresses at its target.
    ///
    /// Same length as `error_vector`; all `false` for other directions.
    pub suppression_mask: Vec<bool>,
    /// Creation time.
    pub timestamp: Timestamp,
    /// Time decay was last applied.
    pub last_decay: Timestamp,
}

impl ErrorSignal {
    /// Multiply strength and both vectors by `factor`.
    pub fn scale(&mut self, factor: f64) {
        self.strength *= factor;
        self.error_vector.iter_mut().for_each(|v| *v *= factor);
        self.learning_signal.iter_mut().for_each(|v| *v *= factor);
    }

    /// Number of flagged components.
    #[must_use]
    pub fn masked_components(&self) -> usize {
        self.suppression_mask.iter().filter(|m| **m).count()
    }
}

/// How a learner should adjust the model at a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpdateType {
    /// Reinforce existing structure.
    Strengthen,
    /// Relax existing structure.
    Weaken,
    /// Add new structure.
    Create,
    /// Remove structure.
    ///
    /// Never emitted by the processor; kept for learners that share the type.
    Prune,
}

/// A learning instruction emitted for every processed error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningUpdate {
    /// Level to adjust.
    pub target_level: usize,
    /// Kind of adjustment.
    pub update_type: UpdateType,
    /// Error magnitude × the level's learning rate.
    pub magnitude: f64,
    /// Per-component `min(1, |error[i]| / error_threshold)`.
    pub specificity: Vec<f64>,
    /// Confidence carried over from the error.
    pub confidence: f64,
    /// The error's significance.
    pub error_contribution: f64,
    /// Emission time.
    pub timestamp: Timestamp,
}
