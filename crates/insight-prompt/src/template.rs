//! Literal placeholder templates
//!
//! A template is plain text containing placeholder tokens such as
//! `{company_name}` or `[企業名を入力]`. Tokens are matched literally; there is no
//! expression syntax. A template is compiled against the set of tokens that
//! will be substituted, so text that merely looks like a placeholder is left
//! untouched.

use crate::{PromptError, Result};
use regex::Regex;

/// Ordered `(token, value)` pairs applied to a template
///
/// Setting a token that is already present replaces its value in place, so
/// iteration order stays the order in which tokens were first added.
///
/// # Examples
///
/// ```
/// use insight_prompt::Substitutions;
///
/// let subs = Substitutions::new()
///     .with("{department_name}", "営業部")
///     .with("{position_title}", "部長")
///     .with("{department_name}", "経営企画部");
///
/// assert_eq!(subs.len(), 2);
/// assert_eq!(subs.get("{department_name}"), Some("経営企画部"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Substitutions {
    pairs: Vec<(String, String)>,
}

impl Substitutions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `token` to `value`, replacing any earlier value
    pub fn set(&mut self, token: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let token = token.into();
        let value = value.into();
        match self.pairs.iter_mut().find(|(t, _)| *t == token) {
            Some(slot) => slot.1 = value,
            None => self.pairs.push((token, value)),
        }
        self
    }

    /// Builder form of [`Substitutions::set`]
    pub fn with(mut self, token: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(token, value);
        self
    }

    pub fn get(&self, token: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(t, _)| t == token)
            .map(|(_, v)| v.as_str())
    }

    /// Tokens in insertion order
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|(t, _)| t.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(t, v)| (t.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A template compiled into literal and placeholder segments
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    name: String,
    segments: Vec<Segment>,
}

impl PromptTemplate {
    /// Compile `text`, recognizing only the given tokens
    ///
    /// Matching is leftmost-first; when two tokens start at the same position
    /// the longer one wins. Empty tokens are rejected.
    pub fn compile<'a>(
        name: impl Into<String>,
        text: &str,
        tokens: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self> {
        let mut tokens: Vec<&str> = tokens.into_iter().collect();
        if let Some(empty) = tokens.iter().find(|t| t.is_empty()) {
            return Err(PromptError::InvalidPlaceholder {
                token: (*empty).to_string(),
                detail: "placeholder token is empty".to_string(),
            });
        }
        tokens.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        tokens.dedup();

        let name = name.into();
        if tokens.is_empty() {
            return Ok(Self {
                name,
                segments: vec![Segment::Literal(text.to_string())],
            });
        }

        let pattern = tokens
            .iter()
            .map(|t| regex::escape(t))
            .collect::<Vec<_>>()
            .join("|");
        let matcher = Regex::new(&pattern).map_err(|e| PromptError::InvalidPlaceholder {
            token: pattern.clone(),
            detail: e.to_string(),
        })?;

        let mut segments = Vec::new();
        let mut cursor = 0;
        for found in matcher.find_iter(text) {
            if found.start() > cursor {
                segments.push(Segment::Literal(text[cursor..found.start()].to_string()));
            }
            segments.push(Segment::Placeholder(found.as_str().to_string()));
            cursor = found.end();
        }
        if cursor < text.len() {
            segments.push(Segment::Literal(text[cursor..].to_string()));
        }

        Ok(Self { name, segments })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Placeholder tokens found in the template, in order of appearance
    pub fn placeholders(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Placeholder(token) => Some(token.as_str()),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// Render in a single pass; values are inserted as-is and never re-scanned
    pub fn render(&self, substitutions: &Substitutions) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(token) => {
                    out.push_str(substitutions.get(token).unwrap_or(token.as_str()));
                }
            }
        }
        out
    }
}
