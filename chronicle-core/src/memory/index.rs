//! Secondary indices over stored episodes.
//!
//! Three coarse lookups feed the retrieval candidate set:
//!
//! - **temporal**: day bucket `⌊timestamp / 86 400 000⌋` → ids (ordered,
//!   so a time range only scans the buckets it covers)
//! - **context**: quantised [`ContextSignature`] → ids
//! - **tag**: tag string → ids
//!
//! Invariant: the ids reachable through all three indices are exactly the
//! live episode ids. [`EpisodeIndex::cleanup`] restores it after bulk
//! removals.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::memory::episode::SequenceEpisode;
use crate::types::{EpisodeId, Timestamp};

/// How many leading components of each context vector enter a signature.
pub const SIGNATURE_COMPONENTS: usize = 3;

/// Quantised key for coarse context lookup.
///
/// Each of the first [`SIGNATURE_COMPONENTS`] components is rounded to one
/// decimal place and stored as integer tenths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContextSignature {
    /// Quantised temporal context.
    pub temporal: Vec<i64>,
    /// Quantised spatial context.
    pub spatial: Vec<i64>,
}

impl ContextSignature {
    /// Build a signature from raw context vectors.
    #[must_use]
    pub fn from_contexts(temporal: &[f64], spatial: &[f64]) -> Self {
        Self {
            temporal: quantize(temporal),
            spatial: quantize(spatial),
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn quantize(values: &[f64]) -> Vec<i64> {
    values
        .iter()
        .take(SIGNATURE_COMPONENTS)
        .map(|v| (v * 10.0).round() as i64)
        .collect()
}

/// The three secondary indices.
#[derive(Debug, Clone, Default)]
pub struct EpisodeIndex {
    temporal: BTreeMap<i64, BTreeSet<EpisodeId>>,
    context: HashMap<ContextSignature, BTreeSet<EpisodeId>>,
    tags: HashMap<String, BTreeSet<EpisodeId>>,
}

impl EpisodeIndex {
    /// Create empty indices.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Index an episode under its day bucket, signature and tags.
    pub fn insert<E>(&mut self, episode: &SequenceEpisode<E>) {
        self.temporal
            .entry(episode.timestamp.day_bucket())
            .or_default()
            .insert(episode.id);
        self.context
            .entry(signature_of(episode))
            .or_default()
            .insert(episode.id);
        for tag in &episode.tags {
            self.tags.entry(tag.clone()).or_default().insert(episode.id);
        }
    }

    /// Remove an episode from every index, dropping emptied keys.
    pub fn remove<E>(&mut self, episode: &SequenceEpisode<E>) {
        let bucket = episode.timestamp.day_bucket();
        if let Some(ids) = self.temporal.get_mut(&bucket) {
            ids.remove(&episode.id);
            if ids.is_empty() {
                self.temporal.remove(&bucket);
            }
        }
        let signature = signature_of(episode);
        if let Some(ids) = self.context.get_mut(&signature) {
            ids.remove(&episode.id);
            if ids.is_empty() {
                self.context.remove(&signature);
            }
        }
        for tag in &episode.tags {
            if let Some(ids) = self.tags.get_mut(tag) {
                ids.remove(&episode.id);
                if ids.is_empty() {
                    self.tags.remove(tag);
                }
            }
        }
    }

    /// Ids stored in the day buckets covering `[start, end]`.
    ///
    /// Bucket granularity is a day; callers filter exact timestamps.
    pub fn by_time_range(&self, start: Timestamp, end: Timestamp) -> impl Iterator<Item = EpisodeId> + '_ {
        let (lo, hi) = (start.day_bucket(), end.day_bucket());
        let buckets = if lo <= hi { Some(self.temporal.range(lo..=hi)) } else { None };
        buckets
            .into_iter()
            .flatten()
            .flat_map(|(_, ids)| ids.iter().copied())
    }

    /// Ids stored under an exact context signature.
    pub fn by_signature(&self, signature: &ContextSignature) -> impl Iterator<Item = EpisodeId> + '_ {
        self.context.get(signature).into_iter().flatten().copied()
    }

    /// Ids carrying `tag`.
    pub fn by_tag(&self, tag: &str) -> impl Iterator<Item = EpisodeId> + '_ {
        self.tags.get(tag).into_iter().flatten().copied()
    }

    /// Every id reachable through any index.
    #[must_use]
    pub fn reachable_ids(&self) -> BTreeSet<EpisodeId> {
        self.temporal
            .values()
            .chain(self.context.values())
            .chain(self.tags.values())
            .flatten()
            .copied()
            .collect()
    }

    /// Drop ids for which `is_live` is false and any keys left empty.
    ///
    /// Returns the number of dangling entries removed.
    pub fn cleanup<F: Fn(&EpisodeId) -> bool>(&mut self, is_live: F) -> usize {
        let mut removed = 0;
        for ids in self
            .temporal
            .values_mut()
            .chain(self.context.values_mut())
            .chain(self.tags.values_mut())
        {
            let before = ids.len();
            ids.retain(|id| is_live(id));
            removed += before - ids.len();
        }
        self.temporal.retain(|_, ids| !ids.is_empty());
        self.context.retain(|_, ids| !ids.is_empty());
        self.tags.retain(|_, ids| !ids.is_empty());
        removed
    }

    /// Number of populated day buckets.
    #[must_use]
    pub fn temporal_buckets(&self) -> usize {
        self.temporal.len()
    }

    /// Number of distinct context signatures.
    #[must_use]
    pub fn context_signatures(&self) -> usize {
        self.context.len()
    }

    /// Number of distinct tags.
    #[must_use]
    pub fn tag_count(&self) -> usize {
        self.tags.len()
    }
}

fn signature_of<E>(episode: &SequenceEpisode<E>) -> ContextSignature {
    ContextSignature::from_contexts(&episode.temporal_context, &episode.spatial_context)
}
