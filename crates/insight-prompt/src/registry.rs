//! Prompt template registry
//!
//! This module provides [`PromptRegistry`], a thread-safe in-memory
//! [`TemplateSource`].

use crate::{PromptError, Result, TemplateSource};
use std::collections::HashMap;
use std::sync::RwLock;

/// A thread-safe registry of raw template texts
///
/// Used to embed templates in a binary or to supply them in tests.
///
/// # Examples
///
/// ```
/// use insight_prompt::{PromptRegistry, TemplateSource};
///
/// let registry = PromptRegistry::new();
/// registry.register("greeting", "{name}さん、こんにちは");
///
/// assert_eq!(registry.load("greeting").unwrap(), "{name}さん、こんにちは");
/// assert!(registry.load("missing").is_err());
/// ```
pub struct PromptRegistry {
    templates: RwLock<HashMap<String, String>>,
}

impl PromptRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            templates: RwLock::new(HashMap::new()),
        }
    }

    /// Build a registry from `(name, text)` pairs
    pub fn from_templates<I, K, V>(templates: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let registry = Self::new();
        for (name, text) in templates {
            registry.register(name, text);
        }
        registry
    }

    /// Register a template
    ///
    /// If a template with the same name already exists, it will be replaced.
    pub fn register(&self, name: impl Into<String>, text: impl Into<String>) {
        if let Ok(mut templates) = self.templates.write() {
            templates.insert(name.into(), text.into());
        }
    }

    /// Check if a template is registered
    pub fn contains(&self, name: &str) -> bool {
        self.templates
            .read()
            .map(|t| t.contains_key(name))
            .unwrap_or(false)
    }

    /// List all registered template names
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .templates
            .read()
            .map(|t| t.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.templates.read().map(|t| t.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TemplateSource for PromptRegistry {
    fn load(&self, name: &str) -> Result<String> {
        let templates = self
            .templates
            .read()
            .map_err(|e| PromptError::LockError(e.to_string()))?;
        templates
            .get(name)
            .cloned()
            .ok_or_else(|| PromptError::TemplateNotFound {
                name: name.to_string(),
                detail: "not registered".to_string(),
            })
    }
}

impl Default for PromptRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PromptRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptRegistry")
            .field("templates", &self.list())
            .finish()
    }
}
