//! Text generation capability
//!
//! The research pipeline only ever needs "prompt in, text out". This module
//! narrows an [`LLMProvider`] down to that shape and builds one from the
//! environment.

use crate::{CompletionRequest, LLMError, LLMProvider, Message, Result};
use async_trait::async_trait;
use insight_utils::EnvLookup;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, instrument};

const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-pro";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
const DEFAULT_TIMEOUT_SECS: u64 = 300;
const DEFAULT_MAX_TOKENS: usize = 8192;

/// Produces free text from a single prompt
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text for `prompt`. Empty output is a valid result.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Model identifier used for generation
    fn model(&self) -> &str;
}

/// [`TextGenerator`] backed by any [`LLMProvider`]
pub struct ProviderTextGenerator {
    provider: Arc<dyn LLMProvider>,
    model: String,
    max_tokens: usize,
    temperature: Option<f32>,
}

impl ProviderTextGenerator {
    pub fn new(provider: Arc<dyn LLMProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

#[async_trait]
impl TextGenerator for ProviderTextGenerator {
    #[instrument(skip(self, prompt), fields(provider = %self.provider.name(), model = %self.model, prompt_chars = prompt.chars().count()))]
    async fn generate(&self, prompt: &str) -> Result<String> {
        let mut builder = CompletionRequest::builder(&self.model)
            .add_message(Message::user(prompt))
            .max_tokens(self.max_tokens);
        if let Some(temperature) = self.temperature {
            builder = builder.temperature(temperature);
        }

        let response = self.provider.complete(builder.build()).await?;
        debug!(
            stop_reason = ?response.stop_reason,
            tokens = response.usage.total(),
            "generation finished"
        );
        Ok(response.message.content)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Which backend serves generation requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderKind {
    #[default]
    Gemini,
    OpenAI,
}

impl FromStr for ProviderKind {
    type Err = LLMError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAI),
            other => Err(LLMError::ConfigurationError(format!(
                "unknown LLM provider '{other}' (expected gemini or openai)"
            ))),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gemini => f.write_str("gemini"),
            Self::OpenAI => f.write_str("openai"),
        }
    }
}

/// Settings for building a [`TextGenerator`]
#[derive(Clone)]
pub struct GenerationConfig {
    pub provider: ProviderKind,
    pub model: String,
    pub api_key: String,
    /// Overrides the provider's default endpoint
    pub api_base: Option<String>,
    pub timeout_secs: u64,
    pub max_tokens: usize,
    pub temperature: Option<f32>,
}

impl GenerationConfig {
    /// Gemini settings with defaults
    pub fn gemini(api_key: impl Into<String>) -> Self {
        Self {
            provider: ProviderKind::Gemini,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            api_key: api_key.into(),
            api_base: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: None,
        }
    }

    /// OpenAI-compatible settings with defaults
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self {
            provider: ProviderKind::OpenAI,
            model: DEFAULT_OPENAI_MODEL.to_string(),
            ..Self::gemini(api_key)
        }
    }

    /// Read settings from environment variables
    ///
    /// | Variable | Default |
    /// |---|---|
    /// | `LLM_PROVIDER` | `gemini` |
    /// | `GOOGLE_API_KEY` / `GEMINI_MODEL_NAME` | - / `gemini-2.5-pro` |
    /// | `OPENAI_API_KEY` / `OPENAI_MODEL` / `OPENAI_API_BASE` | - / `gpt-4o` / provider default |
    /// | `LLM_TIMEOUT_SECS` | `300` |
    /// | `LLM_MAX_TOKENS` | `8192` |
    /// | `LLM_TEMPERATURE` | unset |
    pub fn from_lookup(env: &EnvLookup) -> Result<Self> {
        let provider = env
            .get("LLM_PROVIDER")
            .map(|v| v.parse::<ProviderKind>())
            .transpose()?
            .unwrap_or_default();

        let mut config = match provider {
            ProviderKind::Gemini => {
                let mut config = Self::gemini(env.get_or("GOOGLE_API_KEY", ""));
                config.model = env.get_or("GEMINI_MODEL_NAME", DEFAULT_GEMINI_MODEL);
                config.api_base = env.get("GEMINI_API_BASE");
                config
            }
            ProviderKind::OpenAI => {
                let mut config = Self::openai(env.get_or("OPENAI_API_KEY", ""));
                config.model = env.get_or("OPENAI_MODEL", DEFAULT_OPENAI_MODEL);
                config.api_base = env.get("OPENAI_API_BASE");
                config
            }
        };

        let invalid = |e: insight_utils::config::EnvParseError| {
            LLMError::ConfigurationError(e.to_string())
        };
        if let Some(timeout) = env.parse::<u64>("LLM_TIMEOUT_SECS").map_err(invalid)? {
            config.timeout_secs = timeout;
        }
        if let Some(max_tokens) = env.parse::<usize>("LLM_MAX_TOKENS").map_err(invalid)? {
            config.max_tokens = max_tokens;
        }
        config.temperature = env.parse::<f32>("LLM_TEMPERATURE").map_err(invalid)?;

        Ok(config)
    }

    /// Check the settings before any network call is attempted
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            let var = match self.provider {
                ProviderKind::Gemini => "GOOGLE_API_KEY",
                ProviderKind::OpenAI => "OPENAI_API_KEY",
            };
            return Err(LLMError::ConfigurationError(format!(
                "{var} is not set; {} generation needs an API key",
                self.provider
            )));
        }
        if self.model.trim().is_empty() {
            return Err(LLMError::ConfigurationError("model name is empty".to_string()));
        }
        if self.max_tokens == 0 {
            return Err(LLMError::ConfigurationError(
                "max_tokens must be greater than 0".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(LLMError::ConfigurationError(
                "timeout must be greater than 0".to_string(),
            ));
        }
        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(LLMError::ConfigurationError(format!(
                    "temperature {t} is outside 0.0..=2.0"
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .finish()
    }
}

/// Build the configured generator
pub fn build_generator(config: &GenerationConfig) -> Result<Arc<dyn TextGenerator>> {
    config.validate()?;

    let provider: Arc<dyn LLMProvider> = match config.provider {
        #[cfg(feature = "gemini")]
        ProviderKind::Gemini => {
            let mut provider_config = crate::providers::GeminiConfig::new(&config.api_key)
                .with_timeout(config.timeout_secs);
            if let Some(base) = &config.api_base {
                provider_config = provider_config.with_api_base(base);
            }
            Arc::new(crate::providers::GeminiProvider::with_config(provider_config)?)
        }
        #[cfg(feature = "openai")]
        ProviderKind::OpenAI => {
            let mut provider_config = crate::providers::OpenAIConfig::new(&config.api_key)
                .with_timeout(config.timeout_secs);
            if let Some(base) = &config.api_base {
                provider_config = provider_config.with_api_base(base);
            }
            Arc::new(crate::providers::OpenAIProvider::with_config(provider_config)?)
        }
        #[allow(unreachable_patterns)]
        other => {
            return Err(LLMError::ConfigurationError(format!(
                "provider '{other}' is not compiled in"
            )));
        }
    };

    let mut generator =
        ProviderTextGenerator::new(provider, &config.model).with_max_tokens(config.max_tokens);
    if let Some(t) = config.temperature {
        generator = generator.with_temperature(t);
    }
    Ok(Arc::new(generator))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CompletionResponse, StopReason, TokenUsage};
    use mockall::mock;
    use mockall::predicate::always;

    mock! {
        Provider {}

        #[async_trait]
        impl LLMProvider for Provider {
            async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;
            fn name(&self) -> &str;
        }
    }

    fn response(text: &str) -> CompletionResponse {
        CompletionResponse {
            message: Message::assistant(text),
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage::default(),
        }
    }

    #[tokio::test]
    async fn test_generate_sends_single_user_message() {
        let mut provider = MockProvider::new();
        provider.expect_name().return_const("mock".to_string());
        provider
            .expect_complete()
            .withf(|req| {
                req.model == "gemini-2.5-pro"
                    && req.max_tokens == 8192
                    && req.messages.len() == 1
                    && req.messages[0].text() == "企業分析"
            })
            .times(1)
            .returning(|_| Ok(response("分析結果")));

        let generator = ProviderTextGenerator::new(Arc::new(provider), "gemini-2.5-pro");
        let text = generator.generate("企業分析").await.unwrap();
        assert_eq!(text, "分析結果");
        assert_eq!(generator.model(), "gemini-2.5-pro");
    }

    #[tokio::test]
    async fn test_empty_output_is_success() {
        let mut provider = MockProvider::new();
        provider.expect_name().return_const("mock".to_string());
        provider
            .expect_complete()
            .with(always())
            .returning(|_| Ok(response("")));

        let generator = ProviderTextGenerator::new(Arc::new(provider), "m");
        assert_eq!(generator.generate("x").await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let mut provider = MockProvider::new();
        provider.expect_name().return_const("mock".to_string());
        provider
            .expect_complete()
            .returning(|_| Err(LLMError::AuthenticationFailed));

        let generator = ProviderTextGenerator::new(Arc::new(provider), "m");
        let err = generator.generate("x").await.unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_provider_kind_parse() {
        assert_eq!("Gemini".parse::<ProviderKind>().unwrap(), ProviderKind::Gemini);
        assert_eq!("openai".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAI);
        assert!("claude".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_from_lookup_defaults_to_gemini() {
        let env = EnvLookup::from_pairs([("GOOGLE_API_KEY", "g-key")]);
        let config = GenerationConfig::from_lookup(&env).unwrap();

        assert_eq!(config.provider, ProviderKind::Gemini);
        assert_eq!(config.model, "gemini-2.5-pro");
        assert_eq!(config.api_key, "g-key");
        assert_eq!(config.timeout_secs, 300);
        assert_eq!(config.max_tokens, 8192);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup_openai_overrides() {
        let env = EnvLookup::from_pairs([
            ("LLM_PROVIDER", "openai"),
            ("OPENAI_API_KEY", "o-key"),
            ("OPENAI_API_BASE", "http://localhost:1234/v1"),
            ("LLM_MAX_TOKENS", "2048"),
            ("LLM_TEMPERATURE", "0.2"),
        ]);
        let config = GenerationConfig::from_lookup(&env).unwrap();

        assert_eq!(config.provider, ProviderKind::OpenAI);
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.api_base.as_deref(), Some("http://localhost:1234/v1"));
        assert_eq!(config.max_tokens, 2048);
        assert_eq!(config.temperature, Some(0.2));
    }

    #[test]
    fn test_from_lookup_rejects_bad_number() {
        let env = EnvLookup::from_pairs([("GOOGLE_API_KEY", "k"), ("LLM_TIMEOUT_SECS", "soon")]);
        let err = GenerationConfig::from_lookup(&env).unwrap_err();
        assert!(err.to_string().contains("LLM_TIMEOUT_SECS"));
    }

    #[test]
    fn test_missing_key_fails_validation() {
        let config = GenerationConfig::from_lookup(&EnvLookup::from_pairs(
            std::iter::empty::<(String, String)>(),
        ))
        .unwrap();
        let err = build_generator(&config).err().unwrap();
        assert!(err.to_string().contains("GOOGLE_API_KEY"));
    }

    #[test]
    fn test_build_generator_uses_configured_model() {
        let mut config = GenerationConfig::gemini("key");
        config.model = "gemini-2.5-flash".to_string();
        let generator = build_generator(&config).unwrap();
        assert_eq!(generator.model(), "gemini-2.5-flash");
    }

    #[test]
    fn test_debug_redacts_key() {
        let rendered = format!("{:?}", GenerationConfig::gemini("secret-key"));
        assert!(!rendered.contains("secret-key"));
    }
}
