use std::sync::Arc;

use crate::config::Config;
use crate::models::ArtifactStatus;
use crate::services::RecommendationEngine;

/// Page settings that do not depend on the artifacts
#[derive(Debug, Clone)]
pub struct ShellSettings {
    pub page_title: String,
    pub default_user_id: String,
    pub example_user_ids: Vec<String>,
    pub num_recommendations: usize,
}

impl ShellSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            page_title: config.page_title.clone(),
            default_user_id: config.default_user_id.clone(),
            example_user_ids: config.example_user_ids(),
            num_recommendations: config.num_recommendations,
        }
    }
}

impl Default for ShellSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Shared application state.
///
/// Everything here is built once at startup and only ever read.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RecommendationEngine>,
    pub status: Arc<ArtifactStatus>,
    pub shell: Arc<ShellSettings>,
}

impl AppState {
    pub fn new(engine: RecommendationEngine, status: ArtifactStatus, shell: ShellSettings) -> Self {
        Self {
            engine: Arc::new(engine),
            status: Arc::new(status),
            shell: Arc::new(shell),
        }
    }
}
