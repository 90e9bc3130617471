//! Configuration for the CHRONICLE substrate.
//!
//! Maps directly to a `chronicle.toml` with `[memory]` and `[processor]`
//! tables. Every field has a serde default, so partial files are valid.

use serde::{Deserialize, Serialize};

use crate::error::{ChronicleError, Result};

/// Top-level configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChronicleConfig {
    /// Episodic sequence memory settings.
    #[serde(default)]
    pub memory: MemoryConfig,
    /// Prediction error processor settings.
    #[serde(default)]
    pub processor: ProcessorConfig,
}

impl ChronicleConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `ChronicleError::Config` if the TOML is invalid or fails
    /// validation.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| ChronicleError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Render the configuration as TOML.
    ///
    /// # Errors
    /// Returns `ChronicleError::Config` if serialization fails.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ChronicleError::Config(e.to_string()))
    }

    /// Check both sections for nonsensical values.
    ///
    /// # Errors
    /// Returns `ChronicleError::Config` describing the first bad field.
    pub fn validate(&self) -> Result<()> {
        self.memory.validate()?;
        self.processor.validate()
    }
}

// ---------------------------------------------------------------------------
// Episodic memory
// ---------------------------------------------------------------------------

/// Episodic sequence memory capacity and dynamics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Episode ceiling; exceeding it on insert triggers maintenance.
    #[serde(default = "default_max_episodes")]
    pub max_episodes: usize,
    /// Episodes stored with importance above this are queued for consolidation.
    #[serde(default = "default_consolidation_threshold")]
    pub consolidation_threshold: f64,
    /// Forgetting decay constant per day.
    #[serde(default = "default_memory_decay_rate")]
    pub decay_rate: f64,
    /// Minimum retrieval score for an episode to be returned.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
    /// Importance weighting factors.
    #[serde(default)]
    pub importance_weighting: ImportanceWeighting,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_episodes: 10_000,
            consolidation_threshold: 0.7,
            decay_rate: 0.1,
            similarity_threshold: 0.3,
            importance_weighting: ImportanceWeighting::default(),
        }
    }
}

impl MemoryConfig {
    /// Validate memory settings.
    ///
    /// # Errors
    /// Returns `ChronicleError::Config` on a bad field.
    pub fn validate(&self) -> Result<()> {
        if self.max_episodes == 0 {
            return Err(ChronicleError::Config(
                "memory.max_episodes must be at least 1".to_string(),
            ));
        }
        non_negative("memory.consolidation_threshold", self.consolidation_threshold)?;
        non_negative("memory.decay_rate", self.decay_rate)?;
        non_negative("memory.similarity_threshold", self.similarity_threshold)
    }
}

/// Per-factor importance weights.
///
/// Carried for configuration compatibility; the importance formula does not
/// read them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportanceWeighting {
    /// Weight for how recently an episode occurred.
    #[serde(default = "default_0_3")]
    pub recency: f64,
    /// Weight for how often an episode is accessed.
    #[serde(default = "default_0_2")]
    pub frequency: f64,
    /// Weight for how unlike other episodes it is.
    #[serde(default = "default_0_3")]
    pub distinctiveness: f64,
    /// Weight for emotional valence.
    #[serde(default = "default_0_2")]
    pub emotional: f64,
}

impl Default for ImportanceWeighting {
    fn default() -> Self {
        Self {
            recency: 0.3,
            frequency: 0.2,
            distinctiveness: 0.3,
            emotional: 0.2,
        }
    }
}

// ---------------------------------------------------------------------------
// Prediction error processor
// ---------------------------------------------------------------------------

/// Hierarchical prediction error processor settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// Number of abstraction levels (0 = concrete).
    #[serde(default = "default_max_levels")]
    pub max_levels: usize,
    /// Per-component error scale: drives update types, specificity and suppression.
    #[serde(default = "default_error_threshold")]
    pub error_threshold: f64,
    /// Initial learning rate for every level.
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    /// Per-propagation decay applied to resident signals, on top of the time half-life.
    #[serde(default = "default_processor_decay_rate")]
    pub decay_rate: f64,
    /// Significance must strictly exceed this to spawn signals.
    #[serde(default = "default_significance_threshold")]
    pub significance_threshold: f64,
    /// How strongly descending signals damp flagged components.
    #[serde(default = "default_suppression_strength")]
    pub suppression_strength: f64,
    /// Whether learning rates, expectations and surprise adapt per error.
    #[serde(default = "default_true")]
    pub adaptive_learning: bool,
    /// Error weighting factors.
    #[serde(default)]
    pub error_weighting: ErrorWeighting,
    /// Resident signal ceiling per level (oldest evicted).
    #[serde(default = "default_signal_capacity")]
    pub signal_capacity: usize,
    /// Active-error table ceiling (oldest evicted).
    #[serde(default = "default_max_active_errors")]
    pub max_active_errors: usize,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            max_levels: 5,
            error_threshold: 0.1,
            learning_rate: 0.1,
            decay_rate: 0.1,
            significance_threshold: 0.5,
            suppression_strength: 0.5,
            adaptive_learning: true,
            error_weighting: ErrorWeighting::default(),
            signal_capacity: 1000,
            max_active_errors: 10_000,
        }
    }
}

impl ProcessorConfig {
    /// Validate processor settings.
    ///
    /// # Errors
    /// Returns `ChronicleError::Config` on a bad field.
    pub fn validate(&self) -> Result<()> {
        if self.max_levels == 0 {
            return Err(ChronicleError::Config(
                "processor.max_levels must be at least 1".to_string(),
            ));
        }
        if self.error_threshold <= 0.0 || !self.error_threshold.is_finite() {
            return Err(ChronicleError::Config(format!(
                "processor.error_threshold must be positive, got {}",
                self.error_threshold
            )));
        }
        non_negative("processor.learning_rate", self.learning_rate)?;
        unit_interval("processor.decay_rate", self.decay_rate)?;
        unit_interval("processor.significance_threshold", self.significance_threshold)?;
        unit_interval("processor.suppression_strength", self.suppression_strength)
    }
}

/// Per-factor error weights.
///
/// Carried for configuration compatibility; significance uses the fixed
/// per-type weights instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorWeighting {
    /// Weight for raw error magnitude.
    #[serde(default = "default_0_4")]
    pub magnitude: f64,
    /// Weight for novelty.
    #[serde(default = "default_0_3")]
    pub novelty: f64,
    /// Weight for consistency across samples.
    #[serde(default = "default_0_2")]
    pub consistency: f64,
    /// Weight for contextual relevance.
    #[serde(default = "default_0_1")]
    pub contextual: f64,
}

impl Default for ErrorWeighting {
    fn default() -> Self {
        Self {
            magnitude: 0.4,
            novelty: 0.3,
            consistency: 0.2,
            contextual: 0.1,
        }
    }
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

fn non_negative(field: &str, value: f64) -> Result<()> {
    if value < 0.0 || !value.is_finite() {
        return Err(ChronicleError::Config(format!(
            "{field} must be a finite non-negative number, got {value}"
        )));
    }
    Ok(())
}

fn unit_interval(field: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ChronicleError::Config(format!(
            "{field} must lie in [0, 1], got {value}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_true() -> bool { true }
fn default_0_1() -> f64 { 0.1 }
fn default_0_2() -> f64 { 0.2 }
fn default_0_3() -> f64 { 0.3 }
fn default_0_4() -> f64 { 0.4 }
fn default_max_episodes() -> usize { 10_000 }
fn default_consolidation_threshold() -> f64 { 0.7 }
fn default_memory_decay_rate() -> f64 { 0.1 }
fn default_similarity_threshold() -> f64 { 0.3 }
fn default_max_levels() -> usize { 5 }
fn default_error_threshold() -> f64 { 0.1 }
fn default_learning_rate() -> f64 { 0.1 }
fn default_processor_decay_rate() -> f64 { 0.1 }
fn default_significance_threshold() -> f64 { 0.5 }
fn default_suppression_strength() -> f64 { 0.5 }
fn default_signal_capacity() -> usize { 1000 }
fn default_max_active_errors() -> usize { 10_000 }
