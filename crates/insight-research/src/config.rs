//! Configuration for research operations

use crate::error::{ResearchError, Result};
use insight_utils::EnvLookup;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_LISTING_URL: &str = "https://www.nikkei.com/nkd/company/ednr/?scode=";
pub const DEFAULT_DOCUMENT_ORIGIN: &str = "https://www.nikkei.com";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0";
pub const DEFAULT_ANCHOR_PHRASE: &str = "有価証券報告書";
pub const DEFAULT_SCRIPT_PATTERN: &str = r#"window\['pdfLocation'\]\s*=\s*"(.*?)""#;
pub const DEFAULT_MAX_PDF_CHARS: usize = 90_000;

/// Configuration for the research pipeline and its sources
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchConfig {
    /// Listing page URL prefix; the company code is appended
    pub listing_url: String,

    /// Origin the extracted PDF path is joined onto
    pub document_origin: String,

    /// User-Agent sent on every scrape and download request
    pub user_agent: String,

    /// Link text that marks a securities report anchor
    pub anchor_phrase: String,

    /// Pattern whose first capture group is the PDF path
    pub script_pattern: String,

    /// Character budget for extracted report text
    pub max_pdf_chars: usize,

    /// Timeout for scrape and download requests
    pub request_timeout: Duration,

    /// Outbound scrape requests allowed per second
    pub scrape_rate_per_sec: u32,

    /// Directory holding `<name>.txt` prompt templates
    pub prompts_dir: PathBuf,

    /// JSON array of solution catalog entries
    pub solutions_file: PathBuf,

    /// JSON object mapping company names to codes
    pub company_codes_file: PathBuf,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            listing_url: DEFAULT_LISTING_URL.to_string(),
            document_origin: DEFAULT_DOCUMENT_ORIGIN.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            anchor_phrase: DEFAULT_ANCHOR_PHRASE.to_string(),
            script_pattern: DEFAULT_SCRIPT_PATTERN.to_string(),
            max_pdf_chars: DEFAULT_MAX_PDF_CHARS,
            request_timeout: Duration::from_secs(30),
            scrape_rate_per_sec: 5,
            prompts_dir: PathBuf::from("data/prompts"),
            solutions_file: PathBuf::from("data/solutions.json"),
            company_codes_file: PathBuf::from("data/company_codes.json"),
        }
    }
}

impl ResearchConfig {
    /// Create a new configuration builder
    pub fn builder() -> ResearchConfigBuilder {
        ResearchConfigBuilder::default()
    }

    /// Read overrides from the environment
    ///
    /// Recognized: `PROMPTS_DIR`, `SOLUTIONS_FILE`, `COMPANY_CODES_FILE`,
    /// `MAX_PDF_CHARS`, `REQUEST_TIMEOUT_SECS`, `SCRAPE_RATE_PER_SEC`.
    pub fn from_lookup(env: &EnvLookup) -> Result<Self> {
        let invalid = |e: insight_utils::config::EnvParseError| ResearchError::Config(e.to_string());

        let mut builder = Self::builder();
        if let Some(dir) = env.get("PROMPTS_DIR") {
            builder = builder.prompts_dir(dir);
        }
        if let Some(file) = env.get("SOLUTIONS_FILE") {
            builder = builder.solutions_file(file);
        }
        if let Some(file) = env.get("COMPANY_CODES_FILE") {
            builder = builder.company_codes_file(file);
        }
        if let Some(chars) = env.parse::<usize>("MAX_PDF_CHARS").map_err(invalid)? {
            builder = builder.max_pdf_chars(chars);
        }
        if let Some(secs) = env.parse::<u64>("REQUEST_TIMEOUT_SECS").map_err(invalid)? {
            builder = builder.request_timeout(Duration::from_secs(secs));
        }
        if let Some(rate) = env.parse::<u32>("SCRAPE_RATE_PER_SEC").map_err(invalid)? {
            builder = builder.scrape_rate_per_sec(rate);
        }
        builder.build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_pdf_chars == 0 {
            return Err(ResearchError::Config(
                "max_pdf_chars must be greater than 0".to_string(),
            ));
        }

        if self.scrape_rate_per_sec == 0 {
            return Err(ResearchError::Config(
                "scrape_rate_per_sec must be greater than 0".to_string(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(ResearchError::Config(
                "request_timeout must be greater than 0".to_string(),
            ));
        }

        if self.anchor_phrase.is_empty() {
            return Err(ResearchError::Config("anchor_phrase is empty".to_string()));
        }

        for (name, value) in [
            ("listing_url", self.listing_url.as_str()),
            ("document_origin", self.document_origin.as_str()),
        ] {
            Url::parse(value)
                .map_err(|e| ResearchError::Config(format!("{name} '{value}' is not a URL: {e}")))?;
        }

        let pattern = Regex::new(&self.script_pattern)
            .map_err(|e| ResearchError::Config(format!("script_pattern: {e}")))?;
        if pattern.captures_len() < 2 {
            return Err(ResearchError::Config(
                "script_pattern needs a capture group for the PDF path".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for ResearchConfig
#[derive(Debug, Default)]
pub struct ResearchConfigBuilder {
    listing_url: Option<String>,
    document_origin: Option<String>,
    user_agent: Option<String>,
    anchor_phrase: Option<String>,
    script_pattern: Option<String>,
    max_pdf_chars: Option<usize>,
    request_timeout: Option<Duration>,
    scrape_rate_per_sec: Option<u32>,
    prompts_dir: Option<PathBuf>,
    solutions_file: Option<PathBuf>,
    company_codes_file: Option<PathBuf>,
}

impl ResearchConfigBuilder {
    /// Set the listing page URL prefix
    pub fn listing_url(mut self, url: impl Into<String>) -> Self {
        self.listing_url = Some(url.into());
        self
    }

    /// Set the origin PDF paths are joined onto
    pub fn document_origin(mut self, origin: impl Into<String>) -> Self {
        self.document_origin = Some(origin.into());
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn anchor_phrase(mut self, phrase: impl Into<String>) -> Self {
        self.anchor_phrase = Some(phrase.into());
        self
    }

    pub fn script_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.script_pattern = Some(pattern.into());
        self
    }

    /// Set the extraction character budget
    pub fn max_pdf_chars(mut self, chars: usize) -> Self {
        self.max_pdf_chars = Some(chars);
        self
    }

    /// Set request timeout
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.request_timeout = Some(duration);
        self
    }

    pub fn scrape_rate_per_sec(mut self, rate: u32) -> Self {
        self.scrape_rate_per_sec = Some(rate);
        self
    }

    pub fn prompts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.prompts_dir = Some(dir.into());
        self
    }

    pub fn solutions_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.solutions_file = Some(file.into());
        self
    }

    pub fn company_codes_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.company_codes_file = Some(file.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<ResearchConfig> {
        let defaults = ResearchConfig::default();

        let config = ResearchConfig {
            listing_url: self.listing_url.unwrap_or(defaults.listing_url),
            document_origin: self.document_origin.unwrap_or(defaults.document_origin),
            user_agent: self.user_agent.unwrap_or(defaults.user_agent),
            anchor_phrase: self.anchor_phrase.unwrap_or(defaults.anchor_phrase),
            script_pattern: self.script_pattern.unwrap_or(defaults.script_pattern),
            max_pdf_chars: self.max_pdf_chars.unwrap_or(defaults.max_pdf_chars),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            scrape_rate_per_sec: self
                .scrape_rate_per_sec
                .unwrap_or(defaults.scrape_rate_per_sec),
            prompts_dir: self.prompts_dir.unwrap_or(defaults.prompts_dir),
            solutions_file: self.solutions_file.unwrap_or(defaults.solutions_file),
            company_codes_file: self
                .company_codes_file
                .unwrap_or(defaults.company_codes_file),
        };

        config.validate()?;
        Ok(config)
    }
}
