//! Error types for research operations

use insight_llm::LLMError;
use insight_prompt::PromptError;
use thiserror::Error;

/// Message shown when a company name is not in the code table
pub const COMPANY_NOT_FOUND_MESSAGE: &str =
    "指定された企業名が辞書に存在しません。先に企業コードを登録してください。";

/// Message shown when no securities report PDF could be located
pub const DOCUMENT_NOT_FOUND_MESSAGE: &str = "PDFリンクが見つかりませんでした。";

/// Research pipeline errors
#[derive(Debug, Error)]
pub enum ResearchError {
    /// Company name has no registered code
    #[error("Company not registered: {0}")]
    CompanyNotFound(String),

    /// No report link yielded a PDF location
    #[error("No securities report PDF found for code {0}")]
    DocumentNotFound(String),

    /// Listing page could not be fetched or understood
    #[error("Locator error: {0}")]
    Locator(String),

    /// Network failure or non-success status fetching a resource
    #[error("Fetch failed for {url}: {detail}")]
    Fetch { url: String, detail: String },

    /// Downloaded bytes are not a readable document
    #[error("Failed to parse document: {0}")]
    Parse(String),

    /// Text generation failed
    #[error("Generation failed: {0}")]
    Generation(#[from] LLMError),

    /// Prompt template could not be loaded or compiled
    #[error("Template error: {0}")]
    Template(#[from] PromptError),

    /// A startup data file (catalog, code table) could not be read or parsed
    #[error("Failed to load {source_name}: {detail}")]
    DataFile {
        source_name: &'static str,
        detail: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Internal(String),
}

/// Result type alias for research operations
pub type Result<T> = std::result::Result<T, ResearchError>;

impl ResearchError {
    /// Text placed in `error_message` of a pipeline result
    pub fn user_message(&self) -> String {
        match self {
            Self::CompanyNotFound(_) => COMPANY_NOT_FOUND_MESSAGE.to_string(),
            Self::DocumentNotFound(_) => DOCUMENT_NOT_FOUND_MESSAGE.to_string(),
            other => format!("APIサーバーエラー: {other}"),
        }
    }

    /// Whether later generation stages can still succeed after this error
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Generation(e) => e.is_fatal(),
            _ => false,
        }
    }

    pub(crate) fn data_file(source_name: &'static str, detail: impl ToString) -> Self {
        Self::DataFile {
            source_name,
            detail: detail.to_string(),
        }
    }

    pub(crate) fn fetch(url: impl ToString, detail: impl ToString) -> Self {
        Self::Fetch {
            url: url.to_string(),
            detail: detail.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ResearchError::fetch("https://example.com/a.pdf", "HTTP 500");
        assert_eq!(
            err.to_string(),
            "Fetch failed for https://example.com/a.pdf: HTTP 500"
        );
    }

    #[test]
    fn test_user_messages() {
        assert_eq!(
            ResearchError::CompanyNotFound("x".into()).user_message(),
            COMPANY_NOT_FOUND_MESSAGE
        );
        assert_eq!(
            ResearchError::DocumentNotFound("7203".into()).user_message(),
            DOCUMENT_NOT_FOUND_MESSAGE
        );
        assert!(
            ResearchError::Parse("bad header".into())
                .user_message()
                .starts_with("APIサーバーエラー: ")
        );
    }

    #[test]
    fn test_fatal_follows_generator() {
        assert!(ResearchError::from(LLMError::AuthenticationFailed).is_fatal());
        assert!(!ResearchError::from(LLMError::RequestFailed("503".into())).is_fatal());
        assert!(!ResearchError::Locator("down".into()).is_fatal());
    }
}
