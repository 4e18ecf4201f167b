//! Pipeline result types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    ResolveCode,
    LocateDocument,
    ExtractText,
    Summarize,
    Hypothesis,
    MatchSolutions,
    HearingItems,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ResolveCode => "resolve_code",
            Self::LocateDocument => "locate_document",
            Self::ExtractText => "extract_text",
            Self::Summarize => "summarize",
            Self::Hypothesis => "hypothesis",
            Self::MatchSolutions => "match_solutions",
            Self::HearingItems => "hearing_items",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Completed,
    Failed,
    Skipped,
}

/// Outcome of one stage, in execution order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageReport {
    pub stage: Stage,
    pub status: StageStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

impl StageReport {
    pub fn skipped(stage: Stage) -> Self {
        Self {
            stage,
            status: StageStatus::Skipped,
            error: None,
            started_at: Utc::now(),
            elapsed_ms: 0,
        }
    }
}

/// Everything a research run produced
///
/// `success` is true once the summary exists; later stage failures are
/// reported through `error_message` and `stages`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineResult {
    pub success: bool,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub hypothesis: String,
    #[serde(default)]
    pub hearing_items: String,
    #[serde(default)]
    pub matching_result: String,
    #[serde(default)]
    pub error_message: String,
    #[serde(default)]
    pub stages: Vec<StageReport>,
}

impl PipelineResult {
    pub fn failure(error_message: impl Into<String>, stages: Vec<StageReport>) -> Self {
        Self {
            success: false,
            error_message: error_message.into(),
            stages,
            ..Self::default()
        }
    }

    /// Report for `stage`, if it was reached
    pub fn stage(&self, stage: Stage) -> Option<&StageReport> {
        self.stages.iter().find(|r| r.stage == stage)
    }

    pub fn stage_status(&self, stage: Stage) -> Option<StageStatus> {
        self.stage(stage).map(|r| r.status)
    }
}

/// Result of running the matching stage on its own
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SolutionMatchResult {
    pub success: bool,
    #[serde(default)]
    pub matching_result: String,
    #[serde(default)]
    pub error_message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_defaults() {
        let result = PipelineResult::failure("PDFリンクが見つかりませんでした。", Vec::new());
        assert!(!result.success);
        assert!(result.summary.is_empty());
        assert!(result.hearing_items.is_empty());
    }

    #[test]
    fn test_serialized_shape() {
        let result = PipelineResult {
            success: true,
            summary: "要約".to_string(),
            stages: vec![StageReport::skipped(Stage::Hypothesis)],
            ..PipelineResult::default()
        };
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["matching_result"], "");
        assert_eq!(json["stages"][0]["stage"], "hypothesis");
        assert_eq!(json["stages"][0]["status"], "skipped");
        assert!(json["stages"][0].get("error").is_none());
    }

    #[test]
    fn test_stage_display_matches_serde() {
        let json = serde_json::to_value(Stage::MatchSolutions).unwrap();
        assert_eq!(json, Stage::MatchSolutions.to_string());
    }
}
