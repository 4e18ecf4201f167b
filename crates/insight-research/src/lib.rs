//! Customer research pipeline
//!
//! Given a company name and an optional buyer persona, this crate produces:
//!
//! - A summary of the company's securities report (有価証券報告書)
//! - A sales hypothesis for the persona
//! - Matching solutions from a fixed catalog
//! - Hearing items for a discovery call
//!
//! # Architecture
//!
//! [`ResearchPipeline`] runs the stages in sequence against injected parts:
//! - [`CompanyCodeResolver`]: company name to securities code
//! - [`ReportLocator`]: code to report PDF URL (Nikkei scraping)
//! - [`DocumentExtractor`]: PDF URL to bounded text (lopdf)
//! - [`insight_prompt::PromptEngine`]: named templates with literal placeholders
//! - [`insight_llm::TextGenerator`]: prompt in, text out
//!
//! # Example
//!
//! ```rust,ignore
//! use insight_llm::{GenerationConfig, build_generator};
//! use insight_research::{PipelineRequest, ResearchConfig, ResearchPipeline};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let generator = build_generator(&GenerationConfig::gemini("api-key"))?;
//!     let pipeline = ResearchPipeline::from_config(&ResearchConfig::default(), generator)?;
//!
//!     let request = PipelineRequest::new("トヨタ自動車").with_persona("情報システム部", "部長", "");
//!     let result = pipeline.run(&request).await;
//!     println!("{}", result.summary);
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod prompts;
pub mod sources;

pub use catalog::{SolutionCatalog, SolutionCatalogEntry};
pub use config::{ResearchConfig, ResearchConfigBuilder};
pub use engine::{
    PipelineRequest, PipelineResult, ResearchPipeline, SolutionMatchResult, Stage, StageReport,
    StageStatus,
};
pub use error::{ResearchError, Result};
pub use sources::{
    CompanyCode, CompanyCodeResolver, DocumentExtractor, NikkeiReportLocator, PdfReference,
    PdfTextExtractor, ReportLocator,
};
