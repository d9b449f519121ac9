pub mod artifacts;
pub mod recommendations;
pub mod scoring;

pub use artifacts::{ArtifactError, ArtifactPaths, ArtifactStore};
pub use recommendations::{EngineError, RecommendationEngine, DEFAULT_NUM_RECOMMENDATIONS};
pub use scoring::{HybridModel, HybridModelArtifact, ScoringError, ScoringModel};
