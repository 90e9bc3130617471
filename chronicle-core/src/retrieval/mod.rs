//! Episode Retrieval: index-filtered candidates ranked by weighted similarity.
//!
//! 1. **Candidates**: the union of index lookups for every criterion the
//!    query supplies (context signature when both context vectors are
//!    given, each tag, the time range). No criteria means every episode.
//! 2. **Scoring**: see [`scoring`].
//! 3. **Ranking**: drop scores below the threshold, sort descending with
//!    ties broken by id, truncate.
//! 4. **Reinforcement**: every returned episode is accessed, which bumps
//!    its access count and access time and multiplies importance by 1.05.

pub mod scoring;

pub use scoring::ScoreBreakdown;

use std::collections::BTreeSet;

use tracing::debug;

use crate::memory::{ContextSignature, SequenceEpisode, SequenceMemory};
use crate::similarity::{contains_subsequence, SequenceElement};
use crate::types::{EpisodeId, RetrievalScore, Timestamp};

/// Results returned when a query does not set `max_results`.
pub const DEFAULT_MAX_RESULTS: usize = 10;

/// Threshold used by [`SequenceMemory::find_most_similar`].
pub const MOST_SIMILAR_THRESHOLD: f64 = 0.1;

/// A multi-criteria retrieval query.
#[derive(Debug, Clone)]
pub struct MemoryQuery<E> {
    /// Sequence to compare against stored sequences.
    pub pattern: Option<Vec<E>>,
    /// Temporal context to compare against.
    pub temporal_context: Option<Vec<f64>>,
    /// Spatial context to compare against.
    pub spatial_context: Option<Vec<f64>>,
    /// Candidate tags (any match).
    pub tags: Vec<String>,
    /// Inclusive storage-time window.
    pub time_range: Option<(Timestamp, Timestamp)>,
    /// Overrides the configured similarity threshold.
    pub similarity_threshold: Option<f64>,
    /// Maximum number of results.
    pub max_results: usize,
}

impl<E> Default for MemoryQuery<E> {
    fn default() -> Self {
        Self {
            pattern: None,
            temporal_context: None,
            spatial_context: None,
            tags: Vec::new(),
            time_range: None,
            similarity_threshold: None,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

impl<E> MemoryQuery<E> {
    /// An empty query: every episode is a candidate, ranked by importance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare stored sequences against `pattern`.
    #[must_use]
    pub fn with_pattern(mut self, pattern: Vec<E>) -> Self {
        self.pattern = Some(pattern);
        self
    }

    /// Compare temporal contexts.
    #[must_use]
    pub fn with_temporal_context(mut self, context: Vec<f64>) -> Self {
        self.temporal_context = Some(context);
        self
    }

    /// Compare spatial contexts.
    #[must_use]
    pub fn with_spatial_context(mut self, context: Vec<f64>) -> Self {
        self.spatial_context = Some(context);
        self
    }

    /// Restrict candidates to episodes carrying any of `tags`.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Restrict candidates to episodes stored within `[start, end]`.
    #[must_use]
    pub fn with_time_range(mut self, start: Timestamp, end: Timestamp) -> Self {
        self.time_range = Some((start, end));
        self
    }

    /// Override the similarity threshold.
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = Some(threshold);
        self
    }

    /// Cap the number of results.
    #[must_use]
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    fn has_index_criteria(&self) -> bool {
        (self.temporal_context.is_some() && self.spatial_context.is_some())
            || !self.tags.is_empty()
            || self.time_range.is_some()
    }
}

/// A scored retrieval result.
#[derive(Debug, Clone)]
pub struct RetrievalResult<E> {
    /// The episode, after access reinforcement.
    pub episode: SequenceEpisode<E>,
    /// Combined score in `[0, 1]`.
    pub score: f64,
    /// Per-component breakdown.
    pub breakdown: ScoreBreakdown,
}

impl<E: SequenceElement> SequenceMemory<E> {
    /// Rank episodes against `query` and reinforce the ones returned.
    pub fn retrieve_episodes(&mut self, query: &MemoryQuery<E>) -> Vec<RetrievalResult<E>> {
        let _span = tracing::debug_span!(crate::spans::RETRIEVAL).entered();
        let threshold = query
            .similarity_threshold
            .unwrap_or(self.config.similarity_threshold);

        let candidates = self.candidate_ids(query);
        let mut ranked: Vec<(RetrievalScore, EpisodeId, ScoreBreakdown)> = candidates
            .iter()
            .filter_map(|id| self.episodes.get(id))
            .map(|episode| {
                let breakdown = scoring::compute_breakdown(episode, query);
                (RetrievalScore::new(breakdown.combined()), episode.id, breakdown)
            })
            .filter(|(score, _, _)| score.value() >= threshold)
            .collect();
        ranked.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        ranked.truncate(query.max_results);

        debug!(
            candidates = candidates.len(),
            returned = ranked.len(),
            threshold,
            "retrieved episodes"
        );

        let now = self.clock.now();
        ranked
            .into_iter()
            .filter_map(|(score, id, breakdown)| {
                self.record_access(id, now);
                self.episodes.get(&id).map(|episode| RetrievalResult {
                    episode: episode.clone(),
                    score: score.value(),
                    breakdown,
                })
            })
            .collect()
    }

    /// The single best match scoring at least 0.1, if any.
    pub fn find_most_similar(&mut self, query: MemoryQuery<E>) -> Option<RetrievalResult<E>> {
        let query = query
            .with_threshold(MOST_SIMILAR_THRESHOLD)
            .with_max_results(1);
        self.retrieve_episodes(&query).into_iter().next()
    }

    /// Episodes whose sequence contains `subsequence` as a contiguous run,
    /// oldest first. Does not count as an access.
    #[must_use]
    pub fn find_containing(&self, subsequence: &[E]) -> Vec<&SequenceEpisode<E>> {
        let mut found: Vec<_> = self
            .episodes
            .values()
            .filter(|e| contains_subsequence(&e.sequence, subsequence))
            .collect();
        found.sort_by_key(|e| (e.timestamp, e.id));
        found
    }

    fn candidate_ids(&self, query: &MemoryQuery<E>) -> BTreeSet<EpisodeId> {
        if !query.has_index_criteria() {
            return self.episodes.keys().copied().collect();
        }
        let mut ids = BTreeSet::new();
        if let (Some(temporal), Some(spatial)) = (&query.temporal_context, &query.spatial_context) {
            let signature = ContextSignature::from_contexts(temporal, spatial);
            ids.extend(self.index.by_signature(&signature));
        }
        for tag in &query.tags {
            ids.extend(self.index.by_tag(tag));
        }
        if let Some((start, end)) = query.time_range {
            ids.extend(self.index.by_time_range(start, end).filter(|id| {
                self.episodes
                    .get(id)
                    .is_some_and(|e| e.timestamp >= start && e.timestamp <= end)
            }));
        }
        ids
    }
}
