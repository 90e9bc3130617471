//! Episodic sequence memory and its owned aggregate.
//!
//! [`SequenceMemory`] owns every episode plus the three secondary indices,
//! the consolidation queue, the access-pattern table and the forgetting
//! curve. The retrieval, decay and consolidation algorithms live in their
//! own modules and operate on this aggregate.
//!
//! The memory is polled opportunistically, so misses never error: unknown
//! ids yield `None` or empty lists.

pub mod episode;
pub mod index;

pub use episode::{Association, SequenceEpisode};
pub use index::{ContextSignature, EpisodeIndex};

use std::collections::{BTreeSet, HashMap, VecDeque};

use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::config::MemoryConfig;
use crate::consolidation::ConsolidationReport;
use crate::decay::{ForgettingReport, ForgettingSample, FORGETTING_CURVE_CAPACITY};
use crate::ring::BoundedQueue;
use crate::similarity::{sequence_similarity, SequenceElement};
use crate::snapshot::MemorySnapshot;
use crate::types::{EpisodeId, Timestamp};

/// Retrieval timestamps kept per episode in the access-pattern table.
pub const ACCESS_HISTORY_CAPACITY: usize = 100;

/// The episodic sequence memory.
#[derive(Debug)]
pub struct SequenceMemory<E> {
    pub(crate) config: MemoryConfig,
    pub(crate) episodes: HashMap<EpisodeId, SequenceEpisode<E>>,
    pub(crate) index: EpisodeIndex,
    pub(crate) consolidation_queue: VecDeque<EpisodeId>,
    pub(crate) access_patterns: HashMap<EpisodeId, BoundedQueue<Timestamp>>,
    pub(crate) forgetting_curve: BoundedQueue<ForgettingSample>,
    pub(crate) clock: Box<dyn Clock>,
}

/// Aggregate statistics over the memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryStatistics {
    /// Live episodes.
    pub total_episodes: usize,
    /// Distinct undirected associations.
    pub total_associations: usize,
    /// Mean importance (0 when empty).
    pub average_importance: f64,
    /// Mean consolidation level (0 when empty).
    pub average_consolidation: f64,
    /// Episodes waiting in the consolidation queue.
    pub pending_consolidation: usize,
    /// Populated day buckets in the temporal index.
    pub temporal_buckets: usize,
    /// Distinct context signatures.
    pub context_signatures: usize,
    /// Distinct tags.
    pub tags: usize,
    /// Samples in the forgetting curve.
    pub forgetting_samples: usize,
}

/// Outcome of a maintenance pass (forgetting → consolidation → cleanup).
#[derive(Debug, Clone)]
pub struct MaintenanceReport {
    /// The forgetting step.
    pub forgetting: ForgettingReport,
    /// The consolidation step.
    pub consolidation: ConsolidationReport,
    /// Dangling index entries dropped during cleanup.
    pub dangling_index_entries: usize,
}

impl<E> SequenceMemory<E> {
    /// Create an empty memory driven by the wall clock.
    #[must_use]
    pub fn new(config: MemoryConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }

    /// Create an empty memory driven by `clock`.
    #[must_use]
    pub fn with_clock(config: MemoryConfig, clock: impl Clock + 'static) -> Self {
        Self {
            config,
            episodes: HashMap::new(),
            index: EpisodeIndex::new(),
            consolidation_queue: VecDeque::new(),
            access_patterns: HashMap::new(),
            forgetting_curve: BoundedQueue::new(FORGETTING_CURVE_CAPACITY),
            clock: Box::new(clock),
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    /// Current time according to the injected clock.
    #[must_use]
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Number of live episodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.episodes.len()
    }

    /// Whether the memory holds no episodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }

    /// Look up an episode.
    #[must_use]
    pub fn get_episode(&self, id: EpisodeId) -> Option<&SequenceEpisode<E>> {
        self.episodes.get(&id)
    }

    /// All live episodes, in no particular order.
    pub fn episodes(&self) -> impl Iterator<Item = &SequenceEpisode<E>> {
        self.episodes.values()
    }

    /// Episodes carrying `tag`, in id order.
    #[must_use]
    pub fn episodes_with_tag(&self, tag: &str) -> Vec<&SequenceEpisode<E>> {
        self.index
            .by_tag(tag)
            .filter_map(|id| self.episodes.get(&id))
            .collect()
    }

    /// Episodes stored within `[start, end]`, oldest first.
    #[must_use]
    pub fn episodes_in_range(&self, start: Timestamp, end: Timestamp) -> Vec<&SequenceEpisode<E>> {
        let mut found: Vec<_> = self
            .index
            .by_time_range(start, end)
            .filter_map(|id| self.episodes.get(&id))
            .filter(|e| e.timestamp >= start && e.timestamp <= end)
            .collect();
        found.sort_by_key(|e| (e.timestamp, e.id));
        found
    }

    /// Retrieval timestamps recorded for an episode, oldest first.
    #[must_use]
    pub fn access_history(&self, id: EpisodeId) -> Vec<Timestamp> {
        self.access_patterns
            .get(&id)
            .map(|log| log.iter().copied().collect())
            .unwrap_or_default()
    }

    /// The forgetting curve: one retention sample per forgetting pass.
    pub fn forgetting_curve(&self) -> impl Iterator<Item = &ForgettingSample> {
        self.forgetting_curve.iter()
    }

    /// Ids waiting for consolidation, in queue order.
    #[must_use]
    pub fn pending_consolidation(&self) -> Vec<EpisodeId> {
        self.consolidation_queue.iter().copied().collect()
    }

    // -----------------------------------------------------------------------
    // Associations
    // -----------------------------------------------------------------------

    /// Link two episodes in both directions with `strength`.
    ///
    /// Each direction is idempotent per exact (neighbour, strength) pair.
    /// Returns `false` when either id is unknown or both ids are equal.
    pub fn create_association(&mut self, a: EpisodeId, b: EpisodeId, strength: f64) -> bool {
        self.link(a, b, strength).is_some()
    }

    /// Link `a` and `b`; `Some(true)` when at least one edge was new.
    pub(crate) fn link(&mut self, a: EpisodeId, b: EpisodeId, strength: f64) -> Option<bool> {
        if a == b || !self.episodes.contains_key(&a) || !self.episodes.contains_key(&b) {
            return None;
        }
        let forward = self.episodes.get_mut(&a)?.add_association(b, strength);
        let backward = self.episodes.get_mut(&b)?.add_association(a, strength);
        Some(forward || backward)
    }

    /// Distinct episodes associated with `id`, in first-linked order.
    #[must_use]
    pub fn get_associated_episodes(&self, id: EpisodeId) -> Vec<&SequenceEpisode<E>> {
        self.episodes
            .get(&id)
            .map(|episode| {
                episode
                    .neighbors()
                    .into_iter()
                    .filter_map(|n| self.episodes.get(&n))
                    .collect()
            })
            .unwrap_or_default()
    }

    // -----------------------------------------------------------------------
    // Removal & integrity
    // -----------------------------------------------------------------------

    /// Remove an episode from the store, every index, the consolidation
    /// queue, the access-pattern table and every neighbour's edge list.
    pub fn remove_episode(&mut self, id: EpisodeId) -> Option<SequenceEpisode<E>> {
        let episode = self.episodes.remove(&id)?;
        self.index.remove(&episode);
        self.consolidation_queue.retain(|queued| *queued != id);
        self.access_patterns.remove(&id);
        for neighbor in episode.neighbors() {
            if let Some(other) = self.episodes.get_mut(&neighbor) {
                other.remove_associations_to(id);
            }
        }
        Some(episode)
    }

    /// Whether the ids reachable through the indices are exactly the live ids.
    #[must_use]
    pub fn verify_indices(&self) -> bool {
        let live: BTreeSet<EpisodeId> = self.episodes.keys().copied().collect();
        self.index.reachable_ids() == live
    }

    /// Whether every association has its reverse edge and targets a live episode.
    #[must_use]
    pub fn verify_associations(&self) -> bool {
        self.episodes.values().all(|episode| {
            episode.associations.iter().all(|edge| {
                self.episodes
                    .get(&edge.neighbor)
                    .is_some_and(|other| other.is_associated_with(episode.id))
            })
        })
    }

    /// Drop dangling index entries and stale queue / access-table rows.
    ///
    /// Returns the number of dangling index entries removed.
    pub fn cleanup_indices(&mut self) -> usize {
        let episodes = &self.episodes;
        let removed = self.index.cleanup(|id| episodes.contains_key(id));
        self.consolidation_queue.retain(|id| episodes.contains_key(id));
        self.access_patterns.retain(|id, _| episodes.contains_key(id));
        removed
    }

    /// Summary statistics.
    #[must_use]
    pub fn statistics(&self) -> MemoryStatistics {
        let total = self.episodes.len();
        let (importance_sum, consolidation_sum, edge_count) = self.episodes.values().fold(
            (0.0, 0.0, 0_usize),
            |(imp, cons, edges), e| {
                (imp + e.importance, cons + e.consolidation_level, edges + e.neighbors().len())
            },
        );
        let average = |sum: f64| if total == 0 { 0.0 } else { sum / total as f64 };
        MemoryStatistics {
            total_episodes: total,
            total_associations: edge_count / 2,
            average_importance: average(importance_sum),
            average_consolidation: average(consolidation_sum),
            pending_consolidation: self.consolidation_queue.len(),
            temporal_buckets: self.index.temporal_buckets(),
            context_signatures: self.index.context_signatures(),
            tags: self.index.tag_count(),
            forgetting_samples: self.forgetting_curve.len(),
        }
    }

    pub(crate) fn enqueue_consolidation(&mut self, id: EpisodeId) {
        if !self.consolidation_queue.contains(&id) {
            self.consolidation_queue.push_back(id);
        }
    }

    pub(crate) fn record_access(&mut self, id: EpisodeId, now: Timestamp) {
        if let Some(episode) = self.episodes.get_mut(&id) {
            episode.record_access(now);
            self.access_patterns
                .entry(id)
                .or_insert_with(|| BoundedQueue::new(ACCESS_HISTORY_CAPACITY))
                .push(now);
        }
    }
}

impl<E: SequenceElement> SequenceMemory<E> {
    /// Store a new episode and return its id.
    ///
    /// Initial importance is `ln(len + 1) × uniqueness × (1 + |valence|)`,
    /// where uniqueness is one minus the best sequence similarity against
    /// every stored episode. Episodes above the consolidation threshold are
    /// queued for consolidation; exceeding `max_episodes` triggers a
    /// maintenance pass before returning.
    pub fn store_episode(
        &mut self,
        sequence: Vec<E>,
        temporal_context: Vec<f64>,
        spatial_context: Vec<f64>,
        tags: &[&str],
        emotional_valence: f64,
    ) -> EpisodeId {
        let _span = tracing::debug_span!(crate::spans::STORE).entered();
        let now = self.clock.now();
        let uniqueness = 1.0 - self.max_similarity(&sequence);
        let mut episode = SequenceEpisode::new(
            sequence,
            temporal_context,
            spatial_context,
            now,
            0.0,
            emotional_valence,
        )
        .with_tags(tags.iter().copied());
        episode.importance = initial_importance(episode.len(), uniqueness, episode.emotional_valence);

        let id = episode.id;
        let importance = episode.importance;
        self.index.insert(&episode);
        self.episodes.insert(id, episode);
        if importance > self.config.consolidation_threshold {
            self.enqueue_consolidation(id);
        }
        debug!(episode = %id, importance, uniqueness, "stored episode");

        if self.episodes.len() > self.config.max_episodes {
            let report = self.run_maintenance();
            info!(
                removed = report.forgetting.removed.len(),
                remaining = self.episodes.len(),
                "episode ceiling exceeded, ran maintenance"
            );
        }
        id
    }

    /// Forgetting, then consolidation, then index cleanup.
    pub fn run_maintenance(&mut self) -> MaintenanceReport {
        let _span = tracing::info_span!(crate::spans::MAINTENANCE).entered();
        let forgetting = self.apply_forgetting();
        let consolidation = self.consolidate_memories();
        let dangling_index_entries = self.cleanup_indices();
        MaintenanceReport {
            forgetting,
            consolidation,
            dangling_index_entries,
        }
    }

    fn max_similarity(&self, sequence: &[E]) -> f64 {
        self.episodes
            .values()
            .map(|e| sequence_similarity(sequence, &e.sequence))
            .fold(0.0, f64::max)
    }
}

impl<E: Clone> SequenceMemory<E> {
    /// Capture every episode, the consolidation queue and the forgetting curve.
    #[must_use]
    pub fn snapshot(&self) -> MemorySnapshot<E> {
        let mut episodes: Vec<_> = self.episodes.values().cloned().collect();
        episodes.sort_by_key(|e| (e.timestamp, e.id));
        MemorySnapshot {
            config: self.config.clone(),
            episodes,
            consolidation_queue: self.consolidation_queue.iter().copied().collect(),
            forgetting_curve: self.forgetting_curve.iter().cloned().collect(),
        }
    }

    /// Rebuild a memory from a snapshot; indices are reconstructed.
    #[must_use]
    pub fn from_snapshot(snapshot: MemorySnapshot<E>, clock: impl Clock + 'static) -> Self {
        let mut memory = Self::with_clock(snapshot.config, clock);
        for episode in snapshot.episodes {
            memory.index.insert(&episode);
            memory.episodes.insert(episode.id, episode);
        }
        for id in snapshot.consolidation_queue {
            if memory.episodes.contains_key(&id) {
                memory.enqueue_consolidation(id);
            }
        }
        for sample in snapshot.forgetting_curve {
            memory.forgetting_curve.push(sample);
        }
        memory
    }
}

/// `ln(len + 1) × uniqueness × (1 + |valence|)`, never negative.
#[must_use]
pub fn initial_importance(len: usize, uniqueness: f64, emotional_valence: f64) -> f64 {
    let length_factor = (len as f64 + 1.0).ln();
    (length_factor * uniqueness.clamp(0.0, 1.0) * (1.0 + emotional_valence.abs())).max(0.0)
}
