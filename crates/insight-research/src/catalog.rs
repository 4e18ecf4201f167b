//! Solution catalog
//!
//! The catalog is the fixed list of products a salesperson can propose. It is
//! loaded once at startup and shared read-only.

use crate::error::{ResearchError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

const CATALOG_SOURCE: &str = "solution catalog";

/// One sellable solution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolutionCatalogEntry {
    pub name: String,
    pub features: String,
    pub use_case: String,
}

impl SolutionCatalogEntry {
    pub fn new(
        name: impl Into<String>,
        features: impl Into<String>,
        use_case: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            features: features.into(),
            use_case: use_case.into(),
        }
    }

    /// `・<name>：<features>（用途：<use_case>）`
    pub fn bullet(&self) -> String {
        format!("・{}：{}（用途：{}）", self.name, self.features, self.use_case)
    }
}

/// Ordered, read-only list of solutions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SolutionCatalog {
    entries: Vec<SolutionCatalogEntry>,
}

impl SolutionCatalog {
    pub fn from_entries(entries: Vec<SolutionCatalogEntry>) -> Self {
        Self { entries }
    }

    /// Parse a JSON array of entries
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ResearchError::data_file(CATALOG_SOURCE, e))
    }

    /// Load the catalog from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            ResearchError::data_file(CATALOG_SOURCE, format!("{}: {e}", path.display()))
        })?;
        serde_json::from_str(&json).map_err(|e| {
            ResearchError::data_file(CATALOG_SOURCE, format!("{}: {e}", path.display()))
        })
    }

    pub fn entries(&self) -> &[SolutionCatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One bullet line per entry in catalog order, no trailing newline
    pub fn render_enumeration(&self) -> String {
        self.entries
            .iter()
            .map(SolutionCatalogEntry::bullet)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
