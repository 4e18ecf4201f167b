//! Shared application state

use insight_llm::{GenerationConfig, build_generator};
use insight_research::{ResearchConfig, ResearchPipeline};
use insight_utils::EnvLookup;
use std::sync::Arc;
use tracing::info;

/// State shared by every request handler
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ResearchPipeline>,
}

impl AppState {
    pub fn new(pipeline: Arc<ResearchPipeline>) -> Self {
        Self { pipeline }
    }

    /// Build the generator and pipeline from environment configuration
    ///
    /// Fails when the credential is missing or a data file cannot be read.
    pub fn from_lookup(env: &EnvLookup) -> anyhow::Result<Self> {
        let generation = GenerationConfig::from_lookup(env)?;
        let generator = build_generator(&generation)?;
        info!(provider = %generation.provider, model = %generation.model, "text generator ready");

        let research = ResearchConfig::from_lookup(env)?;
        let pipeline = ResearchPipeline::from_config(&research, generator)?;

        Ok(Self::new(Arc::new(pipeline)))
    }
}
