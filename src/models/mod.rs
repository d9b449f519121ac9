use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod features;
pub mod mapping;

pub use features::{FeatureMatrixError, ItemFeatureMatrix};
pub use mapping::{
    IdMapping, ItemMapping, MappingError, NormalizedMappings, ReverseItemMapping, UserMapping,
};

/// Query for a recommendation lookup
#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationQuery {
    pub user_id: String,
    /// Falls back to the configured default when absent
    #[serde(default)]
    pub num_rec: Option<usize>,
}

/// Successful lookup, highest scored item first
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationResponse {
    pub user_id: String,
    pub recommendations: Vec<String>,
}

/// Returned when the user is unknown or nothing could be recommended
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserNotFoundResponse {
    pub error: String,
    pub example_user_ids: Vec<String>,
}

/// Summary of the artifacts loaded at startup
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArtifactStatus {
    pub users: usize,
    pub items: usize,
    pub feature_rows: usize,
    pub feature_cols: usize,
    pub loaded_at: DateTime<Utc>,
    pub mapping_warning: Option<String>,
}
