//! Configuration management utilities

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Load variables from a `.env` file in the current directory or its parents.
///
/// Variables that are already set in the process environment win. Returns the
/// path of the file that was loaded, if any.
pub fn load_env_file() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}

/// Error produced when an environment variable holds an unparseable value
#[derive(Debug, Error)]
#[error("invalid value '{value}' for {key}: {detail}")]
pub struct EnvParseError {
    pub key: String,
    pub value: String,
    pub detail: String,
}

type LookupFn = dyn Fn(&str) -> Option<String> + Send + Sync;

/// Source of configuration variables
///
/// Reads from the process environment by default. Tests build one from
/// explicit pairs so they never touch global state.
#[derive(Clone)]
pub struct EnvLookup {
    source: Arc<LookupFn>,
}

impl EnvLookup {
    /// Lookup backed by `std::env::var`
    pub fn process() -> Self {
        Self {
            source: Arc::new(|key| std::env::var(key).ok()),
        }
    }

    /// Lookup backed by a fixed set of pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map: HashMap<String, String> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            source: Arc::new(move |key| map.get(key).cloned()),
        }
    }

    /// Raw value of `key`, treating blank values as unset
    pub fn get(&self, key: &str) -> Option<String> {
        (self.source)(key).filter(|v| !v.trim().is_empty())
    }

    /// Value of `key` or `default` when unset
    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse `key` into `T`; `Ok(None)` when unset
    pub fn parse<T>(&self, key: &str) -> Result<Option<T>, EnvParseError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match self.get(key) {
            None => Ok(None),
            Some(value) => value
                .trim()
                .parse::<T>()
                .map(Some)
                .map_err(|e| EnvParseError {
                    key: key.to_string(),
                    detail: e.to_string(),
                    value,
                }),
        }
    }
}

impl Default for EnvLookup {
    fn default() -> Self {
        Self::process()
    }
}

impl fmt::Debug for EnvLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvLookup").finish_non_exhaustive()
    }
}

/// Output format for log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable, multi-field lines
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}' (expected pretty or json)")),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application name
    pub app_name: String,
    /// Environment (dev, prod, etc.)
    pub environment: String,
    /// Log output format
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "insight-rs".to_string(),
            environment: "development".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl Config {
    /// Read `APP_NAME`, `APP_ENV` and `LOG_FORMAT`
    pub fn from_lookup(env: &EnvLookup) -> Result<Self, EnvParseError> {
        let defaults = Self::default();
        Ok(Self {
            app_name: env.get_or("APP_NAME", &defaults.app_name),
            environment: env.get_or("APP_ENV", &defaults.environment),
            log_format: env.parse("LOG_FORMAT")?.unwrap_or(defaults.log_format),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_ignores_blank_values() {
        let env = EnvLookup::from_pairs([("A", "value"), ("B", "   ")]);
        assert_eq!(env.get("A").as_deref(), Some("value"));
        assert_eq!(env.get("B"), None);
        assert_eq!(env.get_or("B", "fallback"), "fallback");
    }

    #[test]
    fn test_parse_values() {
        let env = EnvLookup::from_pairs([("N", " 42 "), ("BAD", "forty")]);
        assert_eq!(env.parse::<u32>("N").unwrap(), Some(42));
        assert_eq!(env.parse::<u32>("MISSING").unwrap(), None);

        let err = env.parse::<u32>("BAD").unwrap_err();
        assert_eq!(err.key, "BAD");
        assert!(err.to_string().contains("forty"));
    }

    #[test]
    fn test_config_from_lookup() {
        let env = EnvLookup::from_pairs([("APP_ENV", "production"), ("LOG_FORMAT", "JSON")]);
        let config = Config::from_lookup(&env).unwrap();
        assert_eq!(config.app_name, "insight-rs");
        assert_eq!(config.environment, "production");
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_log_format() {
        let env = EnvLookup::from_pairs([("LOG_FORMAT", "xml")]);
        assert!(Config::from_lookup(&env).is_err());
    }

    #[test]
    fn test_log_format_serde() {
        let json = serde_json::to_string(&LogFormat::Json).unwrap();
        assert_eq!(json, "\"json\"");
    }
}
