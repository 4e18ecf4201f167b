//! Loading and rendering templates by name

use crate::{PromptTemplate, Result, Substitutions, TemplateSource};
use std::sync::Arc;
use tracing::debug;

/// Renders named templates from a [`TemplateSource`]
///
/// The template is loaded and compiled on every call; nothing is cached.
#[derive(Clone)]
pub struct PromptEngine {
    source: Arc<dyn TemplateSource>,
}

impl PromptEngine {
    pub fn new(source: Arc<dyn TemplateSource>) -> Self {
        Self { source }
    }

    /// Load `name` and compile it against the tokens in `substitutions`
    pub fn load(&self, name: &str, substitutions: &Substitutions) -> Result<PromptTemplate> {
        let text = self.source.load(name)?;
        PromptTemplate::compile(name, &text, substitutions.tokens())
    }

    /// Load `name` and render it with `substitutions`
    pub fn render(&self, name: &str, substitutions: &Substitutions) -> Result<String> {
        let template = self.load(name, substitutions)?;
        let rendered = template.render(substitutions);
        debug!(
            template = name,
            placeholders = template.placeholders().len(),
            chars = rendered.chars().count(),
            "rendered prompt"
        );
        Ok(rendered)
    }
}

impl std::fmt::Debug for PromptEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptEngine").finish_non_exhaustive()
    }
}
