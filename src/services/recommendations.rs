use std::cmp::Ordering;
use std::sync::Arc;

use thiserror::Error;

use crate::models::{ItemFeatureMatrix, MappingError, NormalizedMappings};
use crate::services::scoring::{ScoringError, ScoringModel};

pub const DEFAULT_NUM_RECOMMENDATIONS: usize = 5;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("scoring failed: {0}")]
    Scoring(#[from] ScoringError),

    #[error("model returned {found} scores for {expected} items")]
    ScoreCountMismatch { expected: usize, found: usize },

    #[error("item index {0} has no external identifier")]
    InconsistentIndex(usize),
}

/// Top-N recommender over immutable, preloaded artifacts.
///
/// Holds nothing mutable, so a single instance can be shared across
/// request handlers behind an `Arc`.
pub struct RecommendationEngine {
    model: Arc<dyn ScoringModel>,
    mappings: NormalizedMappings,
    item_features: ItemFeatureMatrix,
}

impl RecommendationEngine {
    pub fn new(
        model: Arc<dyn ScoringModel>,
        mappings: NormalizedMappings,
        item_features: ItemFeatureMatrix,
    ) -> Self {
        Self {
            model,
            mappings,
            item_features,
        }
    }

    /// Recommends up to `num_rec` external item ids for an external user id.
    ///
    /// Returns `Ok(None)` when the user is unknown. Results are ordered by
    /// descending score, ties broken by ascending internal item index.
    pub fn recommend(
        &self,
        user_ext_id: &str,
        num_rec: usize,
    ) -> Result<Option<Vec<String>>, EngineError> {
        let user_ext_id = user_ext_id.trim();

        let Some(internal_user) = self.mappings.users.get(user_ext_id) else {
            return Ok(None);
        };

        let n_items = self.mappings.items.len();
        let item_indices: Vec<usize> = (0..n_items).collect();
        let scores = self
            .model
            .predict(internal_user, &item_indices, &self.item_features)?;

        if scores.len() != n_items {
            return Err(EngineError::ScoreCountMismatch {
                expected: n_items,
                found: scores.len(),
            });
        }

        top_n(&scores, num_rec)
            .into_iter()
            .map(|index| {
                self.mappings
                    .reverse_items
                    .get(index)
                    .map(str::to_string)
                    .ok_or(EngineError::InconsistentIndex(index))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }

    /// First `limit` user ids in artifact order
    pub fn sample_user_ids(&self, limit: usize) -> Vec<String> {
        self.mappings
            .users
            .keys()
            .take(limit)
            .map(str::to_string)
            .collect()
    }

    pub fn user_count(&self) -> usize {
        self.mappings.users.len()
    }

    pub fn item_count(&self) -> usize {
        self.mappings.items.len()
    }

    pub fn item_features(&self) -> &ItemFeatureMatrix {
        &self.item_features
    }

    /// Why the mapping artifact was replaced with empty tables, if it was
    pub fn mapping_warning(&self) -> Option<&MappingError> {
        self.mappings.warning.as_ref()
    }
}

/// Ranking order: higher score first, NaN last, equal scores by lower index
fn rank_order(scores: &[f32], a: usize, b: usize) -> Ordering {
    let (sa, sb) = (scores[a], scores[b]);
    let by_score = match (sa.is_nan(), sb.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => sb.partial_cmp(&sa).unwrap_or(Ordering::Equal),
    };
    by_score.then(a.cmp(&b))
}

/// Indices of the `n` best scores in ranking order.
///
/// Partitions with quickselect first so only the kept prefix is sorted.
fn top_n(scores: &[f32], n: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..scores.len()).collect();
    if n == 0 {
        return Vec::new();
    }
    if n < indices.len() {
        indices.select_nth_unstable_by(n - 1, |&a, &b| rank_order(scores, a, b));
        indices.truncate(n);
    }
    indices.sort_unstable_by(|&a, &b| rank_order(scores, a, b));
    indices
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;
    use mockall::predicate::*;
    use serde_json::json;

    mock! {
        Model {}

        impl ScoringModel for Model {
            fn predict(
                &self,
                user_index: usize,
                item_indices: &[usize],
                item_features: &ItemFeatureMatrix,
            ) -> Result<Vec<f32>, ScoringError>;
        }
    }

    fn abc_mappings() -> NormalizedMappings {
        NormalizedMappings::from_raw(&json!([{"1": 0, "2": 1}, {"A": 0, "B": 1, "C": 2}]))
    }

    fn engine_with_scores(scores: Vec<f32>) -> RecommendationEngine {
        let mut model = MockModel::new();
        model
            .expect_predict()
            .returning(move |_, _, _| Ok(scores.clone()));
        RecommendationEngine::new(
            Arc::new(model),
            abc_mappings(),
            ItemFeatureMatrix::identity(3),
        )
    }

    #[test]
    fn test_recommends_highest_scores_first() {
        let engine = engine_with_scores(vec![0.2, 0.9, 0.5]);
        let recs = engine.recommend("1", 2).unwrap();
        assert_eq!(recs, Some(vec!["B".to_string(), "C".to_string()]));
    }

    #[test]
    fn test_scores_full_item_range_for_internal_user() {
        let mut model = MockModel::new();
        model
            .expect_predict()
            .with(
                eq(1),
                function(|items: &[usize]| items == [0usize, 1, 2]),
                always(),
            )
            .times(1)
            .returning(|_, _, _| Ok(vec![0.0, 0.0, 1.0]));
        let engine = RecommendationEngine::new(
            Arc::new(model),
            abc_mappings(),
            ItemFeatureMatrix::identity(3),
        );

        assert_eq!(engine.recommend("2", 1).unwrap(), Some(vec!["C".to_string()]));
    }

    #[test]
    fn test_unknown_user_is_not_found() {
        let mut model = MockModel::new();
        model.expect_predict().never();
        let engine = RecommendationEngine::new(
            Arc::new(model),
            abc_mappings(),
            ItemFeatureMatrix::identity(3),
        );

        assert_eq!(engine.recommend("999", 5).unwrap(), None);
        assert_eq!(engine.recommend("999", 0).unwrap(), None);
    }

    #[test]
    fn test_whitespace_is_stripped() {
        let engine = engine_with_scores(vec![0.2, 0.9, 0.5]);
        assert_eq!(
            engine.recommend(" 1 ", 3).unwrap(),
            engine.recommend("1", 3).unwrap()
        );
        assert_eq!(
            engine.recommend("\t2\n", 1).unwrap(),
            Some(vec!["B".to_string()])
        );
    }

    #[test]
    fn test_num_rec_larger_than_catalog_returns_everything() {
        let engine = engine_with_scores(vec![0.2, 0.9, 0.5]);
        let recs = engine.recommend("1", 50).unwrap().unwrap();
        assert_eq!(recs, vec!["B", "C", "A"]);
    }

    #[test]
    fn test_zero_requested_is_empty() {
        let engine = engine_with_scores(vec![0.2, 0.9, 0.5]);
        assert_eq!(engine.recommend("1", 0).unwrap(), Some(vec![]));
    }

    #[test]
    fn test_ties_resolve_by_ascending_index() {
        let engine = engine_with_scores(vec![0.5, 0.5, 0.5]);
        assert_eq!(
            engine.recommend("1", 2).unwrap().unwrap(),
            vec!["A", "B"]
        );

        let engine = engine_with_scores(vec![0.1, 0.7, 0.7]);
        assert_eq!(
            engine.recommend("1", 3).unwrap().unwrap(),
            vec!["B", "C", "A"]
        );
    }

    #[test]
    fn test_repeated_calls_are_identical() {
        let engine = engine_with_scores(vec![0.3, 0.3, 0.8]);
        let first = engine.recommend("2", 2).unwrap();
        let second = engine.recommend("2", 2).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_nan_scores_rank_last() {
        let engine = engine_with_scores(vec![f32::NAN, 0.1, -4.0]);
        assert_eq!(
            engine.recommend("1", 3).unwrap().unwrap(),
            vec!["B", "C", "A"]
        );
    }

    #[test]
    fn test_empty_mapping_never_finds_users() {
        let mut model = MockModel::new();
        model.expect_predict().never();
        let engine = RecommendationEngine::new(
            Arc::new(model),
            NormalizedMappings::from_raw(&json!("not a pair")),
            ItemFeatureMatrix::identity(3),
        );

        assert!(engine.mapping_warning().is_some());
        assert_eq!(engine.recommend("1", 5).unwrap(), None);
        assert!(engine.sample_user_ids(10).is_empty());
    }

    #[test]
    fn test_missing_reverse_entry_is_an_error() {
        let mut model = MockModel::new();
        model
            .expect_predict()
            .returning(|_, _, _| Ok(vec![0.1, 0.9]));
        // internal indices 0 and 5: index 1 has no external id
        let mappings = NormalizedMappings::from_raw(&json!([{"u": 0}, {"A": 0, "B": 5}]));
        let engine =
            RecommendationEngine::new(Arc::new(model), mappings, ItemFeatureMatrix::identity(6));

        assert!(matches!(
            engine.recommend("u", 2),
            Err(EngineError::InconsistentIndex(1))
        ));
    }

    #[test]
    fn test_scoring_errors_propagate() {
        let mut model = MockModel::new();
        model
            .expect_predict()
            .returning(|_, _, _| Err(ScoringError::UserOutOfRange { index: 0, users: 0 }));
        let engine = RecommendationEngine::new(
            Arc::new(model),
            abc_mappings(),
            ItemFeatureMatrix::identity(3),
        );

        assert!(matches!(
            engine.recommend("1", 1),
            Err(EngineError::Scoring(_))
        ));
    }

    #[test]
    fn test_short_score_vector_is_rejected() {
        let engine = engine_with_scores(vec![0.4]);
        assert!(matches!(
            engine.recommend("1", 1),
            Err(EngineError::ScoreCountMismatch {
                expected: 3,
                found: 1
            })
        ));
    }

    #[test]
    fn test_sample_user_ids_respects_limit() {
        let engine = engine_with_scores(vec![0.0, 0.0, 0.0]);
        assert_eq!(engine.sample_user_ids(1), vec!["1"]);
        assert_eq!(engine.sample_user_ids(10), vec!["1", "2"]);
    }

    #[test]
    fn test_top_n_ordering_property() {
        let scores = [0.4, -1.0, 0.4, 2.5, 0.0, 0.4, 2.5];
        let ranked = top_n(&scores, 5);
        assert_eq!(ranked, vec![3, 6, 0, 2, 5]);
        for pair in ranked.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            assert!(scores[a] >= scores[b]);
            if scores[a] == scores[b] {
                assert!(a < b);
            }
        }
    }
}
