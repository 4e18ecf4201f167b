//! LLM provider abstraction layer for insight-rs
//!
//! This crate provides provider-agnostic abstractions for interacting with
//! Large Language Models (LLMs). It includes:
//!
//! - Message types for LLM communication
//! - Completion request/response types
//! - Provider trait for LLM implementations
//! - The [`TextGenerator`] capability used by the research pipeline
//! - Concrete provider implementations (behind feature flags)

pub mod completion;
pub mod error;
pub mod generator;
pub mod messages;
pub mod provider;

// Re-export main types
pub use completion::{CompletionRequest, CompletionResponse, StopReason, TokenUsage};
pub use error::{LLMError, Result};
pub use generator::{
    GenerationConfig, ProviderKind, ProviderTextGenerator, TextGenerator, build_generator,
};
pub use messages::{Message, Role};
pub use provider::LLMProvider;

// Provider implementations (feature-gated)
#[cfg(any(feature = "gemini", feature = "openai"))]
pub mod providers;
