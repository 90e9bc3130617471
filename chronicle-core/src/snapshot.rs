//! Serializable snapshots of both aggregates.
//!
//! The library does no I/O; a host persists snapshots however it likes.
//! Two encodings are provided:
//!
//! - JSON via `serde_json`, human readable and stable across field
//!   additions,
//! - compact binary via `bincode`.
//!
//! Indices are not stored; [`SequenceMemory::from_snapshot`] rebuilds them.
//!
//! [`SequenceMemory::from_snapshot`]: crate::memory::SequenceMemory::from_snapshot

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{MemoryConfig, ProcessorConfig};
use crate::decay::ForgettingSample;
use crate::error::Result;
use crate::memory::SequenceEpisode;
use crate::prediction::{LearningUpdate, LevelState, PredictionError};
use crate::types::EpisodeId;

/// Persistent state of a [`SequenceMemory`](crate::memory::SequenceMemory).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemorySnapshot<E> {
    /// Memory configuration.
    pub config: MemoryConfig,
    /// Every episode, oldest first.
    pub episodes: Vec<SequenceEpisode<E>>,
    /// Pending consolidation, in queue order.
    pub consolidation_queue: Vec<EpisodeId>,
    /// Forgetting curve, oldest first.
    pub forgetting_curve: Vec<ForgettingSample>,
}

/// Persistent state of a [`PredictionErrorProcessor`](crate::prediction::PredictionErrorProcessor).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessorSnapshot {
    /// Processor configuration.
    pub config: ProcessorConfig,
    /// Per-level state, indexed by level.
    pub levels: Vec<LevelState>,
    /// Active errors, oldest first.
    pub active_errors: Vec<PredictionError>,
    /// Undrained learning updates, oldest first.
    pub learning_updates: Vec<LearningUpdate>,
    /// Confidences of the most recent learning updates.
    pub update_confidences: Vec<f64>,
    /// Recorded improvement samples.
    pub improvements: Vec<f64>,
}

/// Encode a snapshot as JSON.
///
/// # Errors
/// `Serialization` when a value cannot be represented.
pub fn to_json<T: Serialize>(snapshot: &T) -> Result<String> {
    let json = serde_json::to_string(snapshot)?;
    debug!(bytes = json.len(), "encoded snapshot as JSON");
    Ok(json)
}

/// Decode a JSON snapshot.
///
/// # Errors
/// `Serialization` on malformed input.
pub fn from_json<T: DeserializeOwned>(json: &str) -> Result<T> {
    Ok(serde_json::from_str(json)?)
}

/// Encode a snapshot with bincode.
///
/// # Errors
/// `Serialization` when a value cannot be represented.
pub fn to_bytes<T: Serialize>(snapshot: &T) -> Result<Vec<u8>> {
    let bytes = bincode::serialize(snapshot)?;
    debug!(bytes = bytes.len(), "encoded snapshot as bincode");
    Ok(bytes)
}

/// Decode a bincode snapshot.
///
/// # Errors
/// `Serialization` on malformed input.
pub fn from_bytes<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(bincode::deserialize(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::ChronicleError;
    use crate::memory::SequenceMemory;
    use crate::prediction::{ErrorType, PredictionErrorProcessor};
    use crate::types::Timestamp;

    #[test]
    fn memory_restores_with_rebuilt_indices() {
        let clock = ManualClock::new(Timestamp(0));
        let mut mem: SequenceMemory<String> = SequenceMemory::with_clock(MemoryConfig::default(), clock.clone());
        let a = mem.store_episode(
            vec!["open".into(), "door".into(), "enter".into()],
            vec![0.2, 0.4],
            vec![1.0],
            &["home"],
            0.3,
        );
        let b = mem.store_episode(vec!["sit".into()], vec![0.2, 0.4], vec![1.0], &["home"], 0.0);
        mem.create_association(a, b, 0.8);

        let json = to_json(&mem.snapshot()).expect("encode");
        let restored: SequenceMemory<String> =
            SequenceMemory::from_snapshot(from_json(&json).expect("decode"), clock);
        assert_eq!(restored.len(), 2);
        assert!(restored.verify_indices());
        assert!(restored.verify_associations());
        assert_eq!(restored.episodes_with_tag("home").len(), 2);
        assert_eq!(restored.pending_consolidation(), mem.pending_consolidation());
    }

    #[test]
    fn processor_restores_levels_and_queues() {
        let clock = ManualClock::new(Timestamp(0));
        let mut p = PredictionErrorProcessor::with_clock(ProcessorConfig::default(), clock.clone());
        let e = p.process_error(2, &[0.0, 0.0], &[1.0, 0.5], ErrorType::Semantic, 0.9).expect("valid");

        let bytes = to_bytes(&p.snapshot()).expect("encode");
        let restored = PredictionErrorProcessor::from_snapshot(from_bytes(&bytes).expect("decode"), clock)
            .expect("consistent");
        assert!(restored.active_error(e.id).is_some());
        assert_eq!(restored.pending_learning_updates(), 1);
        assert_eq!(restored.get_error_signals(2), p.get_error_signals(2));
        assert_eq!(restored.learning_rate(2), p.learning_rate(2));
    }

    #[test]
    fn mismatched_level_count_is_rejected() {
        let p = PredictionErrorProcessor::with_clock(ProcessorConfig::default(), ManualClock::new(Timestamp(0)));
        let mut snapshot = p.snapshot();
        snapshot.levels.pop();
        let result = PredictionErrorProcessor::from_snapshot(snapshot, ManualClock::new(Timestamp(0)));
        assert!(matches!(result, Err(ChronicleError::Config(_))));
    }

    #[test]
    fn garbage_is_a_serialization_error() {
        let result: Result<ProcessorSnapshot> = from_json("{not json");
        assert!(matches!(result, Err(ChronicleError::Serialization(_))));
    }
}
