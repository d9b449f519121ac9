use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::models::{ArtifactStatus, ItemFeatureMatrix, NormalizedMappings};
use crate::services::recommendations::RecommendationEngine;
use crate::services::scoring::{HybridModel, HybridModelArtifact, ScoringError};

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid model artifact: {0}")]
    InvalidModel(#[from] ScoringError),

    #[error("invalid item feature artifact: {0}")]
    InvalidFeatures(String),
}

/// Locations of the three trained artifacts
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub mapping: PathBuf,
    pub item_features: PathBuf,
}

/// The trained artifacts, loaded once and never mutated
pub struct ArtifactStore {
    pub model: HybridModel,
    pub mappings: NormalizedMappings,
    pub item_features: ItemFeatureMatrix,
    pub loaded_at: DateTime<Utc>,
}

impl ArtifactStore {
    /// Reads and validates every artifact.
    ///
    /// Unreadable or unparsable files are errors. A mapping artifact with the
    /// wrong shape is not: it becomes empty tables with a warning attached.
    pub fn load(paths: &ArtifactPaths) -> Result<Self, ArtifactError> {
        let model: HybridModelArtifact = read_json(&paths.model)?;
        let model = HybridModel::try_from(model)?;
        tracing::info!(
            path = %paths.model.display(),
            users = model.n_users(),
            item_features = model.n_item_features(),
            components = model.no_components(),
            "Loaded scoring model"
        );

        let raw_mapping: Value = read_json(&paths.mapping)?;
        let mappings = NormalizedMappings::from_raw(&raw_mapping);
        match &mappings.warning {
            Some(warning) => tracing::error!(
                path = %paths.mapping.display(),
                error = %warning,
                "Mapping is malformed, continuing with empty mappings"
            ),
            None => tracing::info!(
                path = %paths.mapping.display(),
                users = mappings.users.len(),
                items = mappings.items.len(),
                "Loaded identifier mappings"
            ),
        }

        let item_features: ItemFeatureMatrix = read_json(&paths.item_features)?;
        item_features
            .validate()
            .map_err(|e| ArtifactError::InvalidFeatures(e.to_string()))?;
        tracing::info!(
            path = %paths.item_features.display(),
            rows = item_features.n_rows(),
            cols = item_features.n_cols(),
            "Loaded item features"
        );

        if item_features.n_rows() < mappings.items.len() {
            tracing::warn!(
                rows = item_features.n_rows(),
                items = mappings.items.len(),
                "Item feature matrix has fewer rows than mapped items"
            );
        }

        Ok(Self {
            model,
            mappings,
            item_features,
            loaded_at: Utc::now(),
        })
    }

    pub fn status(&self) -> ArtifactStatus {
        ArtifactStatus {
            users: self.mappings.users.len(),
            items: self.mappings.items.len(),
            feature_rows: self.item_features.n_rows(),
            feature_cols: self.item_features.n_cols(),
            loaded_at: self.loaded_at,
            mapping_warning: self.mappings.warning.as_ref().map(ToString::to_string),
        }
    }

    /// Hands the artifacts to a recommendation engine
    pub fn into_engine(self) -> RecommendationEngine {
        RecommendationEngine::new(Arc::new(self.model), self.mappings, self.item_features)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let bytes = fs::read(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
