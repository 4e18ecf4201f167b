//! Error types for prompt operations

use thiserror::Error;

/// Result type for prompt operations
pub type Result<T> = std::result::Result<T, PromptError>;

/// Errors that can occur during prompt operations
#[derive(Error, Debug)]
pub enum PromptError {
    /// No template with this name exists in the source
    #[error("Template '{name}' not found: {detail}")]
    TemplateNotFound { name: String, detail: String },

    /// File exists but could not be read
    #[error("Failed to load template file '{path}': {detail}")]
    FileLoadError { path: String, detail: String },

    /// Placeholder token that cannot be recognized in a template
    #[error("Invalid placeholder '{token}': {detail}")]
    InvalidPlaceholder { token: String, detail: String },

    /// Lock error for thread safety
    #[error("Lock error: {0}")]
    LockError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
