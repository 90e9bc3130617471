//! Memory Consolidation: strengthening queued episodes.
//!
//! Each queued episode:
//!   1. advances its consolidation level by 0.1 (capped at 1.0),
//!   2. links to up to five similar episodes, where similarity is the mean
//!      of sequence, temporal-context and spatial-context similarity and
//!      must reach 0.7,
//!   3. gains importance: `importance × (1 + level × 0.2)`.
//!
//! The queue is emptied by each pass.

use tracing::debug;

use crate::memory::{SequenceEpisode, SequenceMemory};
use crate::similarity::{context_similarity, sequence_similarity, SequenceElement};
use crate::types::EpisodeId;

/// Consolidation level gained per pass.
pub const CONSOLIDATION_STEP: f64 = 0.1;

/// Most associations created for one episode in one pass.
pub const MAX_NEW_ASSOCIATIONS: usize = 5;

/// Minimum combined similarity for an association.
pub const ASSOCIATION_THRESHOLD: f64 = 0.7;

/// Importance gain per unit of consolidation level.
pub const IMPORTANCE_GAIN: f64 = 0.2;

/// Outcome of a consolidation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsolidationReport {
    /// Episodes consolidated.
    pub consolidated: usize,
    /// New association edges created.
    pub associations_created: usize,
    /// Queued ids that no longer existed.
    pub skipped: usize,
}

/// Mean of sequence, temporal-context and spatial-context similarity.
#[must_use]
pub fn episode_similarity<E: SequenceElement>(a: &SequenceEpisode<E>, b: &SequenceEpisode<E>) -> f64 {
    (sequence_similarity(&a.sequence, &b.sequence)
        + context_similarity(&a.temporal_context, &b.temporal_context)
        + context_similarity(&a.spatial_context, &b.spatial_context))
        / 3.0
}

impl<E: SequenceElement> SequenceMemory<E> {
    /// Consolidate every queued episode and empty the queue.
    pub fn consolidate_memories(&mut self) -> ConsolidationReport {
        let _span = tracing::debug_span!(crate::spans::CONSOLIDATION).entered();
        let mut report = ConsolidationReport::default();

        while let Some(id) = self.consolidation_queue.pop_front() {
            let Some(level) = self.advance_consolidation(id) else {
                report.skipped += 1;
                continue;
            };

            for (neighbor, similarity) in self.similar_episodes(id) {
                if self.link(id, neighbor, similarity) == Some(true) {
                    report.associations_created += 1;
                }
            }

            if let Some(episode) = self.episodes.get_mut(&id) {
                episode.importance *= 1.0 + level * IMPORTANCE_GAIN;
            }
            report.consolidated += 1;
        }

        debug!(
            consolidated = report.consolidated,
            associations = report.associations_created,
            skipped = report.skipped,
            "consolidation pass complete"
        );
        report
    }

    fn advance_consolidation(&mut self, id: EpisodeId) -> Option<f64> {
        let episode = self.episodes.get_mut(&id)?;
        episode.consolidation_level = (episode.consolidation_level + CONSOLIDATION_STEP).min(1.0);
        Some(episode.consolidation_level)
    }

    /// The most similar other episodes above the association threshold.
    fn similar_episodes(&self, id: EpisodeId) -> Vec<(EpisodeId, f64)> {
        let Some(source) = self.episodes.get(&id) else {
            return Vec::new();
        };
        let mut similar: Vec<(EpisodeId, f64)> = self
            .episodes
            .values()
            .filter(|other| other.id != id)
            .map(|other| (other.id, episode_similarity(source, other)))
            .filter(|(_, similarity)| *similarity >= ASSOCIATION_THRESHOLD)
            .collect();
        similar.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        similar.truncate(MAX_NEW_ASSOCIATIONS);
        similar
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::MemoryConfig;
    use crate::types::Timestamp;

    fn memory() -> SequenceMemory<i32> {
        SequenceMemory::with_clock(MemoryConfig::default(), ManualClock::new(Timestamp(0)))
    }

    #[test]
    fn consolidation_raises_level_and_importance() {
        let mut mem = memory();
        let id = mem.store_episode(vec![1, 2, 3, 4, 5], vec![1.0], vec![1.0], &[], 0.0);
        let before = mem.get_episode(id).expect("stored").importance;

        let report = mem.consolidate_memories();
        assert_eq!(report.consolidated, 1);
        let episode = mem.get_episode(id).expect("kept");
        assert!((episode.consolidation_level - 0.1).abs() < 1e-12);
        assert!((episode.importance - before * 1.02).abs() < 1e-9);
        assert!(mem.pending_consolidation().is_empty());
    }

    #[test]
    fn similar_episodes_become_associated() {
        let mut mem = memory();
        let near = mem.store_episode(vec![7, 8, 9, 10, 11, 12], vec![1.0, 0.0], vec![0.0, 1.0], &[], 0.0);
        let far = mem.store_episode(vec![40, 41], vec![0.0, 1.0], vec![1.0, 0.0], &[], 0.0);
        let id = mem.store_episode(vec![7, 8, 9, 10, 11, 99], vec![1.0, 0.1], vec![0.0, 1.0], &[], 0.0);
        mem.consolidation_queue.clear();
        mem.enqueue_consolidation(id);

        let report = mem.consolidate_memories();
        assert_eq!(report.associations_created, 1);
        let episode = mem.get_episode(id).expect("kept");
        assert!(episode.is_associated_with(near));
        assert!(!episode.is_associated_with(far));
        assert!(mem.verify_associations());
    }

    #[test]
    fn at_most_five_associations_per_pass() {
        let mut mem = memory();
        for _ in 0..8 {
            mem.store_episode(vec![1, 2, 3], vec![1.0], vec![1.0], &[], 0.0);
        }
        let id = mem.store_episode(vec![1, 2, 3], vec![1.0], vec![1.0], &[], 0.0);
        mem.consolidation_queue.clear();
        mem.enqueue_consolidation(id);
        mem.consolidate_memories();
        assert_eq!(mem.get_episode(id).expect("kept").neighbors().len(), MAX_NEW_ASSOCIATIONS);
    }

    #[test]
    fn removed_ids_are_skipped() {
        let mut mem = memory();
        let id = mem.store_episode(vec![1, 2, 3, 4], vec![], vec![], &[], 0.0);
        mem.episodes.remove(&id);
        let report = mem.consolidate_memories();
        assert_eq!(report.skipped, 1);
        assert_eq!(report.consolidated, 0);
    }

    #[test]
    fn level_caps_at_one() {
        let mut mem = memory();
        let id = mem.store_episode(vec![1, 2, 3, 4], vec![], vec![], &[], 0.0);
        for _ in 0..15 {
            mem.enqueue_consolidation(id);
            mem.consolidate_memories();
        }
        let level = mem.get_episode(id).expect("kept").consolidation_level;
        assert!((level - 1.0).abs() < 1e-12);
    }
}
