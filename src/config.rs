use std::path::PathBuf;

use serde::Deserialize;

use crate::services::{ArtifactPaths, DEFAULT_NUM_RECOMMENDATIONS};

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Trained scoring model artifact
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,

    /// `[user_map, item_map]` identifier mapping artifact
    #[serde(default = "default_mapping_path")]
    pub mapping_path: PathBuf,

    /// Item feature matrix artifact
    #[serde(default = "default_item_features_path")]
    pub item_features_path: PathBuf,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Recommendations shown per lookup
    #[serde(default = "default_num_recommendations")]
    pub num_recommendations: usize,

    /// Value pre-filled in the user id input
    #[serde(default = "default_user_id")]
    pub default_user_id: String,

    /// Comma separated user ids listed in the sidebar
    #[serde(default = "default_example_user_ids")]
    pub example_user_ids: String,

    #[serde(default = "default_page_title")]
    pub page_title: String,
}

fn default_model_path() -> PathBuf {
    PathBuf::from("models/lightfm_model.json")
}

fn default_mapping_path() -> PathBuf {
    PathBuf::from("models/lightfm_mapping.json")
}

fn default_item_features_path() -> PathBuf {
    PathBuf::from("models/lightfm_item_features.json")
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8501
}

fn default_num_recommendations() -> usize {
    DEFAULT_NUM_RECOMMENDATIONS
}

fn default_user_id() -> String {
    "1".to_string()
}

fn default_example_user_ids() -> String {
    [
        "5506791954036110",
        "5506791961431145",
        "5506791988747277",
        "5506791966136056",
        "5506791974854999",
    ]
    .join(",")
}

fn default_page_title() -> String {
    "Pratilipi Recommendation System".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            mapping_path: default_mapping_path(),
            item_features_path: default_item_features_path(),
            host: default_host(),
            port: default_port(),
            num_recommendations: default_num_recommendations(),
            default_user_id: default_user_id(),
            example_user_ids: default_example_user_ids(),
            page_title: default_page_title(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.num_recommendations == 0 {
            anyhow::bail!("NUM_RECOMMENDATIONS must be at least 1");
        }
        Ok(())
    }

    pub fn artifact_paths(&self) -> ArtifactPaths {
        ArtifactPaths {
            model: self.model_path.clone(),
            mapping: self.mapping_path.clone(),
            item_features: self.item_features_path.clone(),
        }
    }

    pub fn example_user_ids(&self) -> Vec<String> {
        self.example_user_ids
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.num_recommendations, 5);
        assert_eq!(config.default_user_id, "1");
        assert_eq!(config.example_user_ids().len(), 5);
        assert_eq!(config.bind_address(), "127.0.0.1:8501");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_iter_overrides() {
        let config: Config = envy::from_iter(vec![
            ("PORT".to_string(), "9000".to_string()),
            ("NUM_RECOMMENDATIONS".to_string(), "10".to_string()),
            ("EXAMPLE_USER_IDS".to_string(), " 7, ,8 ".to_string()),
        ])
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.num_recommendations, 10);
        assert_eq!(config.example_user_ids(), vec!["7", "8"]);
        assert_eq!(config.model_path, default_model_path());
    }

    #[test]
    fn test_zero_recommendations_rejected() {
        let config = Config {
            num_recommendations: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
