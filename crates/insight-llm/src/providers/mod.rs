//! Concrete LLM provider implementations
//!
//! This module contains implementations of the LLMProvider trait for
//! various LLM services.

#[cfg(feature = "gemini")]
pub mod gemini;
#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "gemini")]
pub use gemini::{GeminiConfig, GeminiProvider};
#[cfg(feature = "openai")]
pub use openai::{OpenAIConfig, OpenAIProvider};

/// Reject credentials that cannot possibly authenticate
pub(crate) fn require_api_key(provider: &str, api_key: &str) -> crate::Result<()> {
    if api_key.trim().is_empty() {
        return Err(crate::LLMError::ConfigurationError(format!(
            "{provider} API key is empty"
        )));
    }
    Ok(())
}
