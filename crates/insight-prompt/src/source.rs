//! Template sources

use crate::Result;

/// Somewhere raw template text can be loaded from by name
pub trait TemplateSource: Send + Sync {
    /// Load the raw text of template `name`
    ///
    /// Returns [`crate::PromptError::TemplateNotFound`] when no such template exists.
    fn load(&self, name: &str) -> Result<String>;
}
