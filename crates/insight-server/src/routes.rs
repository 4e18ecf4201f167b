//! HTTP routes
//!
//! | Method | Path | Body | Response |
//! |---|---|---|---|
//! | GET | `/` | - | `{"message": ...}` |
//! | GET | `/solutions` | - | `{success, solutions}` |
//! | POST | `/search-company` | `PipelineRequest` | `PipelineResult` |
//! | POST | `/match-solutions` | `{hypothesis}` | `{success, matching_result, error_message}` |
//!
//! Pipeline runs execute inline in the handler future under `catch_unwind`: a
//! panic becomes a 500 and a dropped connection cancels the run.

use crate::error::AppError;
use crate::state::AppState;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::FutureExt;
use insight_research::{PipelineRequest, PipelineResult, SolutionCatalogEntry, SolutionMatchResult};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tracing::info;

pub const ROOT_MESSAGE: &str = "顧客理解AIエージェント API";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/solutions", get(solutions))
        .route("/search-company", post(search_company))
        .route("/match-solutions", post(match_solutions))
        .with_state(state)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SolutionsResponse {
    pub success: bool,
    pub solutions: Vec<SolutionCatalogEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SolutionMatchRequest {
    pub hypothesis: String,
}

async fn root() -> Json<Value> {
    Json(json!({ "message": ROOT_MESSAGE }))
}

async fn solutions(State(state): State<AppState>) -> Json<SolutionsResponse> {
    Json(SolutionsResponse {
        success: true,
        solutions: state.pipeline.catalog().entries().to_vec(),
    })
}

async fn search_company(
    State(state): State<AppState>,
    Json(request): Json<PipelineRequest>,
) -> Result<Json<PipelineResult>, AppError> {
    info!(
        company = %request.company_name,
        department = %request.department_name,
        position = %request.position_name,
        "search-company"
    );

    let result = contain_panic(state.pipeline.run(&request)).await?;
    Ok(Json(result))
}

async fn match_solutions(
    State(state): State<AppState>,
    Json(request): Json<SolutionMatchRequest>,
) -> Result<Json<SolutionMatchResult>, AppError> {
    let result = contain_panic(state.pipeline.run_matching(&request.hypothesis)).await?;
    Ok(Json(result))
}

async fn contain_panic<F: Future>(work: F) -> Result<F::Output, AppError> {
    AssertUnwindSafe(work)
        .catch_unwind()
        .await
        .map_err(|payload| AppError::Panicked(panic_message(payload.as_ref())))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use insight_prompt::PromptRegistry;
    use insight_research::{
        CompanyCode, CompanyCodeResolver, DocumentExtractor, PdfReference, ReportLocator,
        ResearchPipeline, SolutionCatalog, StageStatus,
    };
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct StaticLocator;

    #[async_trait]
    impl ReportLocator for StaticLocator {
        async fn locate(
            &self,
            code: &CompanyCode,
        ) -> insight_research::Result<Option<PdfReference>> {
            if code.as_str() == "0000" {
                return Ok(None);
            }
            PdfReference::parse("https://www.nikkei.com/pdf/report.pdf").map(Some)
        }
    }

    struct StaticExtractor;

    #[async_trait]
    impl DocumentExtractor for StaticExtractor {
        async fn extract(
            &self,
            _reference: &PdfReference,
            _max_chars: usize,
        ) -> insight_research::Result<String> {
            Ok("報告書本文".to_string())
        }
    }

    /// Echoes the first line of the prompt; panics on request
    struct EchoGenerator;

    #[async_trait]
    impl insight_llm::TextGenerator for EchoGenerator {
        async fn generate(&self, prompt: &str) -> insight_llm::Result<String> {
            assert!(!prompt.contains("PANIC"), "generator exploded");
            Ok(format!("echo:{}", prompt.lines().next().unwrap_or_default()))
        }

        fn model(&self) -> &str {
            "echo"
        }
    }

    /// Counts generations that ran to completion
    struct SlowGenerator {
        finished: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl insight_llm::TextGenerator for SlowGenerator {
        async fn generate(&self, _prompt: &str) -> insight_llm::Result<String> {
            tokio::time::sleep(Duration::from_millis(100)).await;
            self.finished.fetch_add(1, Ordering::SeqCst);
            Ok("slow".to_string())
        }

        fn model(&self) -> &str {
            "slow"
        }
    }

    fn test_state(generator: Arc<dyn insight_llm::TextGenerator>) -> AppState {
        let pipeline = ResearchPipeline::builder()
            .resolver(Arc::new(CompanyCodeResolver::from_pairs([
                ("トヨタ自動車", "7203"),
                ("報告書なし", "0000"),
                ("PANIC", "9999"),
            ])))
            .locator(Arc::new(StaticLocator))
            .extractor(Arc::new(StaticExtractor))
            .template_source(Arc::new(PromptRegistry::from_templates([
                ("prompt", "summary [企業名を入力]"),
                ("hypothesis_prompt", "hypothesis {department_name}"),
                ("solution_matching_prompt", "matching {hypothesis}\n{solutions}"),
                ("hearing_prompt", "hearing {position_name}"),
            ])))
            .generator(generator)
            .catalog(Arc::new(
                SolutionCatalog::from_json(r#"[{"name":"CRM","features":"顧客管理","use_case":"営業"}]"#)
                    .unwrap(),
            ))
            .build()
            .unwrap();
        AppState::new(Arc::new(pipeline))
    }

    async fn spawn_app() -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(test_state(Arc::new(EchoGenerator)));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn test_root() {
        let addr = spawn_app().await;
        let body: Value = reqwest::get(format!("http://{addr}/"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["message"], ROOT_MESSAGE);
    }

    #[tokio::test]
    async fn test_solutions() {
        let addr = spawn_app().await;
        let body: SolutionsResponse = reqwest::get(format!("http://{addr}/solutions"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(body.success);
        assert_eq!(body.solutions.len(), 1);
        assert_eq!(body.solutions[0].name, "CRM");
    }

    #[tokio::test]
    async fn test_search_company_with_persona() {
        let addr = spawn_app().await;
        let response = reqwest::Client::new()
            .post(format!("http://{addr}/search-company"))
            .json(&json!({
                "company_name": "トヨタ自動車",
                "department_name": "営業部",
                "position_name": "部長"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let result: PipelineResult = response.json().await.unwrap();
        assert!(result.success);
        assert_eq!(result.summary, "echo:summary トヨタ自動車");
        assert_eq!(result.hypothesis, "echo:hypothesis 営業部");
        assert_eq!(result.matching_result, "echo:matching echo:hypothesis 営業部");
        assert_eq!(result.hearing_items, "echo:hearing 部長");
        assert!(result.stages.iter().all(|s| s.status == StageStatus::Completed));
    }

    #[tokio::test]
    async fn test_stage_failures_are_http_200() {
        let addr = spawn_app().await;
        let client = reqwest::Client::new();

        for (company, expected) in [
            ("未登録の会社", "辞書に存在しません"),
            ("報告書なし", "PDF"),
        ] {
            let response = client
                .post(format!("http://{addr}/search-company"))
                .json(&json!({ "company_name": company }))
                .send()
                .await
                .unwrap();
            assert_eq!(response.status(), 200);

            let result: PipelineResult = response.json().await.unwrap();
            assert!(!result.success);
            assert!(result.error_message.contains(expected));
        }
    }

    #[tokio::test]
    async fn test_panic_becomes_500() {
        let addr = spawn_app().await;
        let response = reqwest::Client::new()
            .post(format!("http://{addr}/search-company"))
            .json(&json!({ "company_name": "PANIC" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 500);

        let body: Value = response.json().await.unwrap();
        assert!(body["detail"].as_str().unwrap().contains("generator exploded"));
    }

    #[tokio::test]
    async fn test_match_solutions() {
        let addr = spawn_app().await;
        let result: SolutionMatchResult = reqwest::Client::new()
            .post(format!("http://{addr}/match-solutions"))
            .json(&json!({ "hypothesis": "在庫管理の効率化" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.matching_result, "echo:matching 在庫管理の効率化");
    }

    #[tokio::test]
    async fn test_dropped_request_stops_the_pipeline() {
        let finished = Arc::new(AtomicUsize::new(0));
        let state = test_state(Arc::new(SlowGenerator {
            finished: finished.clone(),
        }));
        let request = PipelineRequest::new("トヨタ自動車").with_persona("営業部", "部長", "");

        let outcome = tokio::time::timeout(
            Duration::from_millis(50),
            search_company(State(state), Json(request)),
        )
        .await;
        assert!(outcome.is_err());

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 0);
    }
}
