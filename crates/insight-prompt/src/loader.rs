//! File-based template loader
//!
//! This module provides [`FileLoader`] for loading templates from the filesystem.

use crate::{PromptError, Result, TemplateSource};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

const TEMPLATE_EXTENSION: &str = "txt";

/// A file-based template loader
///
/// Templates live directly under the base directory as `{name}.txt` (UTF-8).
/// Every [`TemplateSource::load`] call reads the file again, so edits on disk
/// are picked up without a restart.
///
/// # Directory Structure
///
/// ```text
/// data/prompts/
/// ├── prompt.txt
/// ├── hypothesis_prompt.txt
/// ├── solution_matching_prompt.txt
/// └── hearing_prompt.txt
/// ```
#[derive(Debug, Clone)]
pub struct FileLoader {
    base_path: PathBuf,
}

impl FileLoader {
    /// Create a new file loader with the given base path
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Get the base path
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Path a template name maps to
    pub fn template_path(&self, name: &str) -> PathBuf {
        self.base_path
            .join(format!("{name}.{TEMPLATE_EXTENSION}"))
    }

    /// List all template names (without loading content)
    pub fn list_templates(&self) -> Result<Vec<String>> {
        let entries =
            std::fs::read_dir(&self.base_path).map_err(|e| PromptError::FileLoadError {
                path: self.base_path.display().to_string(),
                detail: e.to_string(),
            })?;

        let mut names = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file()
                && path.extension().and_then(|e| e.to_str()) == Some(TEMPLATE_EXTENSION)
            {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

impl TemplateSource for FileLoader {
    fn load(&self, name: &str) -> Result<String> {
        if name.is_empty() || name.contains(['/', '\\']) || name == ".." {
            return Err(PromptError::TemplateNotFound {
                name: name.to_string(),
                detail: "template names may not contain path separators".to_string(),
            });
        }

        let path = self.template_path(name);
        debug!(path = %path.display(), "loading template");
        std::fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => PromptError::TemplateNotFound {
                name: name.to_string(),
                detail: format!("{} does not exist", path.display()),
            },
            _ => PromptError::FileLoadError {
                path: path.display().to_string(),
                detail: e.to_string(),
            },
        })
    }
}
