//! Sequence Episode: one stored occurrence of a sequence.
//!
//! An episode carries the sequence itself, the temporal and spatial context
//! it occurred in, and the bookkeeping the memory dynamics act on:
//! importance, access statistics, consolidation level and associations.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::types::{EpisodeId, Timestamp};

/// Importance multiplier applied each time an episode is returned by retrieval.
pub const RETRIEVAL_REINFORCEMENT: f64 = 1.05;

/// A weighted, non-owning edge to another episode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Association {
    /// The associated episode (a lookup key, not a reference).
    pub neighbor: EpisodeId,
    /// Association strength.
    pub strength: f64,
}

impl Association {
    /// Exact (neighbour, strength) identity used for idempotent inserts.
    fn same_edge(&self, neighbor: EpisodeId, strength: f64) -> bool {
        self.neighbor == neighbor && self.strength.to_bits() == strength.to_bits()
    }
}

/// A stored sequence episode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceEpisode<E> {
    /// Unique identifier.
    pub id: EpisodeId,
    /// The ordered elements of the episode.
    pub sequence: Vec<E>,
    /// Temporal context vector at storage time.
    pub temporal_context: Vec<f64>,
    /// Spatial context vector at storage time.
    pub spatial_context: Vec<f64>,
    /// When the episode was stored.
    pub timestamp: Timestamp,
    /// Non-negative importance; drives retrieval ranking and forgetting.
    pub importance: f64,
    /// How many times retrieval has returned this episode.
    pub access_count: u32,
    /// Last time retrieval returned this episode.
    pub last_accessed: Timestamp,
    /// Free-form labels, indexed by the tag index.
    pub tags: BTreeSet<String>,
    /// Bidirectional weighted links to other episodes.
    pub associations: Vec<Association>,
    /// Consolidation progress in `[0, 1]`; resists forgetting.
    pub consolidation_level: f64,
    /// Emotional valence in `[-1, 1]`.
    pub emotional_valence: f64,
}

impl<E> SequenceEpisode<E> {
    /// Create a fresh, unconsolidated episode.
    ///
    /// Valence is clamped to `[-1, 1]` and importance to `≥ 0`.
    #[must_use]
    pub fn new(
        sequence: Vec<E>,
        temporal_context: Vec<f64>,
        spatial_context: Vec<f64>,
        timestamp: Timestamp,
        importance: f64,
        emotional_valence: f64,
    ) -> Self {
        Self {
            id: EpisodeId::new(),
            sequence,
            temporal_context,
            spatial_context,
            timestamp,
            importance: importance.max(0.0),
            access_count: 0,
            last_accessed: timestamp,
            tags: BTreeSet::new(),
            associations: Vec::new(),
            consolidation_level: 0.0,
            emotional_valence: clamp_valence(emotional_valence),
        }
    }

    /// Attach tags.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Record a retrieval hit: bump the access count, refresh the access
    /// time, and reinforce importance.
    pub fn record_access(&mut self, now: Timestamp) {
        self.access_count = self.access_count.saturating_add(1);
        self.last_accessed = now;
        self.importance *= RETRIEVAL_REINFORCEMENT;
    }

    /// Add a one-directional edge. Returns `false` if this exact
    /// (neighbour, strength) edge is already present.
    pub fn add_association(&mut self, neighbor: EpisodeId, strength: f64) -> bool {
        if self.associations.iter().any(|a| a.same_edge(neighbor, strength)) {
            return false;
        }
        self.associations.push(Association { neighbor, strength });
        true
    }

    /// Drop every edge pointing at `neighbor`. Returns how many were removed.
    pub fn remove_associations_to(&mut self, neighbor: EpisodeId) -> usize {
        let before = self.associations.len();
        self.associations.retain(|a| a.neighbor != neighbor);
        before - self.associations.len()
    }

    /// Whether any edge points at `neighbor`.
    #[must_use]
    pub fn is_associated_with(&self, neighbor: EpisodeId) -> bool {
        self.associations.iter().any(|a| a.neighbor == neighbor)
    }

    /// Distinct neighbour ids, in first-linked order.
    #[must_use]
    pub fn neighbors(&self) -> Vec<EpisodeId> {
        let mut seen = HashSet::new();
        self.associations
            .iter()
            .filter(|a| seen.insert(a.neighbor))
            .map(|a| a.neighbor)
            .collect()
    }

    /// Strongest recorded edge to `neighbor`, if any.
    #[must_use]
    pub fn association_strength(&self, neighbor: EpisodeId) -> Option<f64> {
        self.associations
            .iter()
            .filter(|a| a.neighbor == neighbor)
            .map(|a| a.strength)
            .reduce(f64::max)
    }

    /// Number of elements in the sequence.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    /// Whether the sequence is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

fn clamp_valence(valence: f64) -> f64 {
    if valence.is_nan() { 0.0 } else { valence.clamp(-1.0, 1.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn episode() -> SequenceEpisode<i32> {
        SequenceEpisode::new(vec![1, 2, 3], vec![0.1], vec![0.2], Timestamp(0), 1.0, 0.0)
    }

    #[test]
    fn valence_is_clamped() {
        let e = SequenceEpisode::new(vec![1], vec![], vec![], Timestamp(0), 1.0, 7.5);
        assert!((e.emotional_valence - 1.0).abs() < f64::EPSILON);
        let e = SequenceEpisode::new(vec![1], vec![], vec![], Timestamp(0), 1.0, f64::NAN);
        assert!(e.emotional_valence.abs() < f64::EPSILON);
    }

    #[test]
    fn access_reinforces_importance() {
        let mut e = episode();
        e.record_access(Timestamp(42));
        assert_eq!(e.access_count, 1);
        assert_eq!(e.last_accessed, Timestamp(42));
        assert!((e.importance - 1.05).abs() < 1e-12);
    }

    #[test]
    fn associations_are_idempotent_per_exact_edge() {
        let mut e = episode();
        let other = EpisodeId::new();
        assert!(e.add_association(other, 0.8));
        assert!(!e.add_association(other, 0.8));
        assert!(e.add_association(other, 0.9));
        assert_eq!(e.associations.len(), 2);
        assert_eq!(e.neighbors(), vec![other]);
        assert_eq!(e.association_strength(other), Some(0.9));
        assert_eq!(e.remove_associations_to(other), 2);
        assert!(!e.is_associated_with(other));
    }
}
