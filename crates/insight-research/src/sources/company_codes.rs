//! Company name to securities code lookup

use crate::error::{ResearchError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

const CODES_SOURCE: &str = "company codes";

/// Securities code identifying a listed company (e.g. `7203`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompanyCode(String);

impl CompanyCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CompanyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Static lookup from display name to code
///
/// Matching is exact: no trimming, no case folding, no fuzzy search.
#[derive(Debug, Clone, Default)]
pub struct CompanyCodeResolver {
    codes: HashMap<String, CompanyCode>,
}

impl CompanyCodeResolver {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            codes: pairs
                .into_iter()
                .map(|(name, code)| (name.into(), CompanyCode::new(code)))
                .collect(),
        }
    }

    /// Parse a JSON object `{"<name>": "<code>"}`
    pub fn from_json(json: &str) -> Result<Self> {
        let codes: HashMap<String, String> =
            serde_json::from_str(json).map_err(|e| ResearchError::data_file(CODES_SOURCE, e))?;
        Ok(Self::from_pairs(codes))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            ResearchError::data_file(CODES_SOURCE, format!("{}: {e}", path.display()))
        })?;
        let codes: HashMap<String, String> = serde_json::from_str(&json).map_err(|e| {
            ResearchError::data_file(CODES_SOURCE, format!("{}: {e}", path.display()))
        })?;
        Ok(Self::from_pairs(codes))
    }

    pub fn resolve(&self, name: &str) -> Option<CompanyCode> {
        self.codes.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}
