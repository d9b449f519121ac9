use ndarray::{Array1, Array2};
use serde::Deserialize;
use thiserror::Error;

use crate::models::ItemFeatureMatrix;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoringError {
    #[error("user index {index} is out of range for {users} users")]
    UserOutOfRange { index: usize, users: usize },

    #[error("item index {index} has no feature row ({rows} rows available)")]
    ItemOutOfRange { index: usize, rows: usize },

    #[error("item features have {found} columns but the model expects {expected}")]
    FeatureDimension { expected: usize, found: usize },

    #[error("invalid model: {0}")]
    InvalidModel(String),
}

/// A trained relevance model.
///
/// Implementations return exactly one score per entry of `item_indices`, in
/// the same order, higher meaning more relevant.
pub trait ScoringModel: Send + Sync {
    fn predict(
        &self,
        user_index: usize,
        item_indices: &[usize],
        item_features: &ItemFeatureMatrix,
    ) -> Result<Vec<f32>, ScoringError>;
}

/// On-disk form of [`HybridModel`]
#[derive(Debug, Clone, Deserialize)]
pub struct HybridModelArtifact {
    pub no_components: usize,
    pub user_embeddings: Vec<Vec<f32>>,
    pub user_biases: Vec<f32>,
    pub item_feature_embeddings: Vec<Vec<f32>>,
    pub item_feature_biases: Vec<f32>,
}

/// Hybrid matrix factorization model with identity user features.
///
/// An item's latent vector is the feature-weighted sum of feature embeddings,
/// so items are described purely through the item feature matrix.
#[derive(Debug, Clone)]
pub struct HybridModel {
    user_embeddings: Array2<f32>,
    user_biases: Array1<f32>,
    item_feature_embeddings: Array2<f32>,
    item_feature_biases: Array1<f32>,
}

impl HybridModel {
    pub fn n_users(&self) -> usize {
        self.user_embeddings.nrows()
    }

    pub fn n_item_features(&self) -> usize {
        self.item_feature_embeddings.nrows()
    }

    pub fn no_components(&self) -> usize {
        self.user_embeddings.ncols()
    }
}

impl TryFrom<HybridModelArtifact> for HybridModel {
    type Error = ScoringError;

    fn try_from(artifact: HybridModelArtifact) -> Result<Self, Self::Error> {
        let k = artifact.no_components;

        if artifact.user_embeddings.len() != artifact.user_biases.len() {
            return Err(ScoringError::InvalidModel(format!(
                "{} user embeddings but {} user biases",
                artifact.user_embeddings.len(),
                artifact.user_biases.len()
            )));
        }
        if artifact.item_feature_embeddings.len() != artifact.item_feature_biases.len() {
            return Err(ScoringError::InvalidModel(format!(
                "{} item feature embeddings but {} item feature biases",
                artifact.item_feature_embeddings.len(),
                artifact.item_feature_biases.len()
            )));
        }

        Ok(Self {
            user_embeddings: stack_rows(artifact.user_embeddings, k, "user_embeddings")?,
            user_biases: Array1::from(artifact.user_biases),
            item_feature_embeddings: stack_rows(
                artifact.item_feature_embeddings,
                k,
                "item_feature_embeddings",
            )?,
            item_feature_biases: Array1::from(artifact.item_feature_biases),
        })
    }
}

fn stack_rows(rows: Vec<Vec<f32>>, k: usize, name: &str) -> Result<Array2<f32>, ScoringError> {
    let n = rows.len();
    if let Some(row) = rows.iter().position(|r| r.len() != k) {
        return Err(ScoringError::InvalidModel(format!(
            "{name} row {row} has {} components, expected {k}",
            rows[row].len()
        )));
    }
    let flat: Vec<f32> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((n, k), flat)
        .map_err(|e| ScoringError::InvalidModel(format!("{name}: {e}")))
}

impl ScoringModel for HybridModel {
    fn predict(
        &self,
        user_index: usize,
        item_indices: &[usize],
        item_features: &ItemFeatureMatrix,
    ) -> Result<Vec<f32>, ScoringError> {
        if user_index >= self.n_users() {
            return Err(ScoringError::UserOutOfRange {
                index: user_index,
                users: self.n_users(),
            });
        }
        if item_features.n_cols() != self.n_item_features() {
            return Err(ScoringError::FeatureDimension {
                expected: self.n_item_features(),
                found: item_features.n_cols(),
            });
        }

        let user = self.user_embeddings.row(user_index);
        let user_bias = self.user_biases[user_index];
        let mut item_repr = Array1::<f32>::zeros(self.no_components());
        let mut scores = Vec::with_capacity(item_indices.len());

        for &item in item_indices {
            let features = item_features
                .row(item)
                .ok_or(ScoringError::ItemOutOfRange {
                    index: item,
                    rows: item_features.n_rows(),
                })?;

            item_repr.fill(0.0);
            let mut item_bias = 0.0;
            for (feature, weight) in features {
                item_repr.scaled_add(weight, &self.item_feature_embeddings.row(feature));
                item_bias += weight * self.item_feature_biases[feature];
            }

            scores.push(user.dot(&item_repr) + user_bias + item_bias);
        }

        Ok(scores)
    }
}
