//! Prompt template management for insight-rs
//!
//! Templates are plain text with literal placeholder tokens. They are loaded
//! by name from a [`TemplateSource`] and rendered in a single pass with an
//! ordered set of [`Substitutions`].
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use insight_prompt::{PromptEngine, PromptRegistry, Substitutions};
//!
//! let registry = PromptRegistry::new();
//! registry.register("hypothesis_prompt", "{department_name}の{position_title}向け");
//!
//! let engine = PromptEngine::new(Arc::new(registry));
//! let subs = Substitutions::new()
//!     .with("{department_name}", "情報システム部")
//!     .with("{position_title}", "部長");
//!
//! let prompt = engine.render("hypothesis_prompt", &subs).unwrap();
//! assert_eq!(prompt, "情報システム部の部長向け");
//! ```

mod engine;
mod error;
mod loader;
mod registry;
mod source;
mod template;

pub use engine::PromptEngine;
pub use error::{PromptError, Result};
pub use loader::FileLoader;
pub use registry::PromptRegistry;
pub use source::TemplateSource;
pub use template::{PromptTemplate, Substitutions};
