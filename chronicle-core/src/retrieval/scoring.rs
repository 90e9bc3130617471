//! Per-component scoring for episode retrieval.
//!
//! Score = Σ wᵢ·simᵢ / Σ wᵢ over the components the query supplies:
//!
//! | component        | weight | similarity                          |
//! |------------------|--------|-------------------------------------|
//! | pattern          | 0.4    | Dice-normalised LCS                 |
//! | temporal context | 0.3    | cosine, clamped to [0, 1]           |
//! | spatial context  | 0.2    | cosine, clamped to [0, 1]           |
//! | importance       | 0.1    | `min(importance, 10) / 10` (always) |

use crate::memory::SequenceEpisode;
use crate::retrieval::MemoryQuery;
use crate::similarity::{context_similarity, sequence_similarity, SequenceElement};

/// Weight of the pattern component.
pub const PATTERN_WEIGHT: f64 = 0.4;
/// Weight of the temporal-context component.
pub const TEMPORAL_WEIGHT: f64 = 0.3;
/// Weight of the spatial-context component.
pub const SPATIAL_WEIGHT: f64 = 0.2;
/// Weight of the importance component.
pub const IMPORTANCE_WEIGHT: f64 = 0.1;
/// Importance at which the importance component saturates.
pub const IMPORTANCE_CAP: f64 = 10.0;

/// Breakdown of a retrieval score into its components.
///
/// Components the query did not supply are `None` and carry no weight.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreBreakdown {
    /// Pattern similarity.
    pub pattern: Option<f64>,
    /// Temporal-context similarity.
    pub temporal: Option<f64>,
    /// Spatial-context similarity.
    pub spatial: Option<f64>,
    /// Normalised importance.
    pub importance: f64,
}

impl ScoreBreakdown {
    /// Weighted mean over the supplied components.
    #[must_use]
    pub fn combined(&self) -> f64 {
        let components = [
            (self.pattern, PATTERN_WEIGHT),
            (self.temporal, TEMPORAL_WEIGHT),
            (self.spatial, SPATIAL_WEIGHT),
            (Some(self.importance), IMPORTANCE_WEIGHT),
        ];
        let (weighted, weights) = components
            .iter()
            .filter_map(|(value, weight)| value.map(|v| (v * weight, *weight)))
            .fold((0.0, 0.0), |(sum, total), (v, w)| (sum + v, total + w));
        if weights > 0.0 { weighted / weights } else { 0.0 }
    }
}

/// Score one episode against a query.
pub fn compute_breakdown<E: SequenceElement>(
    episode: &SequenceEpisode<E>,
    query: &MemoryQuery<E>,
) -> ScoreBreakdown {
    ScoreBreakdown {
        pattern: query
            .pattern
            .as_ref()
            .map(|pattern| sequence_similarity(pattern, &episode.sequence)),
        temporal: query
            .temporal_context
            .as_ref()
            .map(|ctx| context_similarity(ctx, &episode.temporal_context)),
        spatial: query
            .spatial_context
            .as_ref()
            .map(|ctx| context_similarity(ctx, &episode.spatial_context)),
        importance: importance_score(episode.importance),
    }
}

/// `min(importance, 10) / 10`, clamped to `[0, 1]`.
#[must_use]
pub fn importance_score(importance: f64) -> f64 {
    (importance.min(IMPORTANCE_CAP) / IMPORTANCE_CAP).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Timestamp;

    fn episode(importance: f64) -> SequenceEpisode<i32> {
        SequenceEpisode::new(vec![1, 2, 3], vec![1.0, 0.0], vec![0.0, 1.0], Timestamp(0), importance, 0.0)
    }

    #[test]
    fn importance_only_query_scores_importance() {
        let breakdown = compute_breakdown(&episode(5.0), &MemoryQuery::new());
        assert!((breakdown.combined() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn weights_renormalise_over_supplied_components() {
        let query = MemoryQuery::new().with_pattern(vec![1, 2, 3]);
        let breakdown = compute_breakdown(&episode(0.0), &query);
        // (0.4·1 + 0.1·0) / 0.5
        assert!((breakdown.combined() - 0.8).abs() < 1e-12);
        assert!(breakdown.temporal.is_none());
    }

    #[test]
    fn full_query_uses_all_weights() {
        let query = MemoryQuery::new()
            .with_pattern(vec![1, 2, 3])
            .with_temporal_context(vec![1.0, 0.0])
            .with_spatial_context(vec![1.0, 0.0]);
        let breakdown = compute_breakdown(&episode(20.0), &query);
        // (0.4 + 0.3 + 0 + 0.1) / 1.0
        assert!((breakdown.combined() - 0.8).abs() < 1e-12);
        assert_eq!(breakdown.spatial, Some(0.0));
    }

    #[test]
    fn importance_saturates() {
        assert!((importance_score(25.0) - 1.0).abs() < 1e-12);
        assert!(importance_score(-3.0).abs() < 1e-12);
    }
}
