//! Staged research pipeline
//!
//! ```text
//! ResolveCode → LocateDocument → ExtractText → Summarize
//!     → (persona?) Hypothesis → MatchSolutions → HearingItems
//! ```
//!
//! Stages run strictly in sequence. Anything before the summary is all or
//! nothing; once the summary exists the run is a success and later stage
//! failures are collected into `error_message`.

use crate::catalog::SolutionCatalog;
use crate::config::ResearchConfig;
use crate::engine::request::{Persona, PipelineRequest};
use crate::engine::result::{
    PipelineResult, SolutionMatchResult, Stage, StageReport, StageStatus,
};
use crate::error::{ResearchError, Result};
use crate::prompts;
use crate::sources::{
    CompanyCodeResolver, DocumentExtractor, NikkeiReportLocator, PdfTextExtractor, ReportLocator,
};
use chrono::Utc;
use insight_llm::TextGenerator;
use insight_prompt::{FileLoader, PromptEngine, TemplateSource};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};

/// Records a [`StageReport`] per stage as the run progresses
#[derive(Default)]
struct StageLog {
    reports: Vec<StageReport>,
}

impl StageLog {
    async fn run<T, F>(&mut self, stage: Stage, work: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let started_at = Utc::now();
        let clock = Instant::now();
        let outcome = work.await;
        let elapsed_ms = u64::try_from(clock.elapsed().as_millis()).unwrap_or(u64::MAX);

        let (status, error) = match &outcome {
            Ok(_) => {
                info!(%stage, elapsed_ms, "stage completed");
                (StageStatus::Completed, None)
            }
            Err(e) => {
                warn!(%stage, elapsed_ms, error = %e, "stage failed");
                (StageStatus::Failed, Some(e.to_string()))
            }
        };
        self.reports.push(StageReport {
            stage,
            status,
            error,
            started_at,
            elapsed_ms,
        });
        outcome
    }

    fn skip(&mut self, stage: Stage) {
        info!(%stage, "stage skipped");
        self.reports.push(StageReport::skipped(stage));
    }

    fn finish(self) -> Vec<StageReport> {
        self.reports
    }
}

/// Runs the research stages against injected sources and generator
pub struct ResearchPipeline {
    resolver: Arc<CompanyCodeResolver>,
    locator: Arc<dyn ReportLocator>,
    extractor: Arc<dyn DocumentExtractor>,
    prompts: PromptEngine,
    generator: Arc<dyn TextGenerator>,
    catalog: Arc<SolutionCatalog>,
    max_chars: usize,
}

impl ResearchPipeline {
    pub fn builder() -> ResearchPipelineBuilder {
        ResearchPipelineBuilder::default()
    }

    /// Production wiring: data files and templates from `config`, Nikkei
    /// locator, lopdf extractor
    pub fn from_config(config: &ResearchConfig, generator: Arc<dyn TextGenerator>) -> Result<Self> {
        config.validate()?;

        let resolver = CompanyCodeResolver::from_file(&config.company_codes_file)?;
        let catalog = SolutionCatalog::from_file(&config.solutions_file)?;
        info!(
            companies = resolver.len(),
            solutions = catalog.len(),
            prompts_dir = %config.prompts_dir.display(),
            "research data loaded"
        );

        // Templates are re-read on every render; only the directory is required here
        let loader = FileLoader::new(&config.prompts_dir);
        let available = loader.list_templates()?;
        for name in prompts::ALL_TEMPLATES {
            if !available.iter().any(|t| t == name) {
                warn!(template = name, prompts_dir = %config.prompts_dir.display(), "template missing");
            }
        }

        Self::builder()
            .resolver(Arc::new(resolver))
            .locator(Arc::new(NikkeiReportLocator::new(config)?))
            .extractor(Arc::new(PdfTextExtractor::new(config)?))
            .template_source(Arc::new(loader))
            .generator(generator)
            .catalog(Arc::new(catalog))
            .max_chars(config.max_pdf_chars)
            .build()
    }

    pub fn catalog(&self) -> &SolutionCatalog {
        &self.catalog
    }

    /// Run every applicable stage for `request`
    ///
    /// Never fails: stage errors are reported in the returned result.
    #[instrument(skip(self, request), fields(company = %request.company_name))]
    pub async fn run(&self, request: &PipelineRequest) -> PipelineResult {
        let mut log = StageLog::default();

        let summary = match self.summarize_company(request, &mut log).await {
            Ok(summary) => summary,
            Err(e) => return PipelineResult::failure(e.user_message(), log.finish()),
        };
        let mut result = PipelineResult {
            success: true,
            summary,
            ..PipelineResult::default()
        };

        let Some(persona) = request.persona() else {
            for stage in [Stage::Hypothesis, Stage::MatchSolutions, Stage::HearingItems] {
                log.skip(stage);
            }
            result.stages = log.finish();
            return result;
        };

        let mut errors = Vec::new();

        match log
            .run(
                Stage::Hypothesis,
                self.generate_hypothesis(&result.summary, persona),
            )
            .await
        {
            Ok(hypothesis) => result.hypothesis = hypothesis,
            Err(e) => {
                errors.push(e.user_message());
                log.skip(Stage::MatchSolutions);
                log.skip(Stage::HearingItems);
                result.error_message = errors.join("\n");
                result.stages = log.finish();
                return result;
            }
        }

        let mut generator_unusable = false;
        if result.hypothesis.is_empty() {
            log.skip(Stage::MatchSolutions);
        } else {
            match log
                .run(Stage::MatchSolutions, self.match_solutions(&result.hypothesis))
                .await
            {
                Ok(matching) => result.matching_result = matching,
                Err(e) => {
                    generator_unusable = e.is_fatal();
                    errors.push(e.user_message());
                }
            }
        }

        if generator_unusable {
            log.skip(Stage::HearingItems);
        } else {
            match log
                .run(
                    Stage::HearingItems,
                    self.generate_hearing_items(&request.company_name, persona, &result.hypothesis),
                )
                .await
            {
                Ok(items) => result.hearing_items = items,
                Err(e) => errors.push(e.user_message()),
            }
        }

        result.error_message = errors.join("\n");
        result.stages = log.finish();
        result
    }

    /// Run the matching stage on its own
    #[instrument(skip_all)]
    pub async fn run_matching(&self, hypothesis: &str) -> SolutionMatchResult {
        match self.match_solutions(hypothesis).await {
            Ok(matching_result) => SolutionMatchResult {
                success: true,
                matching_result,
                error_message: String::new(),
            },
            Err(e) => {
                warn!(error = %e, "solution matching failed");
                SolutionMatchResult {
                    success: false,
                    matching_result: String::new(),
                    error_message: e.user_message(),
                }
            }
        }
    }

    async fn summarize_company(
        &self,
        request: &PipelineRequest,
        log: &mut StageLog,
    ) -> Result<String> {
        let company_name = request.company_name.as_str();

        let code = log
            .run(Stage::ResolveCode, async {
                self.resolver
                    .resolve(company_name)
                    .ok_or_else(|| ResearchError::CompanyNotFound(company_name.to_string()))
            })
            .await?;

        let reference = log
            .run(Stage::LocateDocument, async {
                self.locator
                    .locate(&code)
                    .await?
                    .ok_or_else(|| ResearchError::DocumentNotFound(code.to_string()))
            })
            .await?;

        let report_text = log
            .run(
                Stage::ExtractText,
                self.extractor.extract(&reference, self.max_chars),
            )
            .await?;

        log.run(Stage::Summarize, self.summarize(company_name, &report_text))
            .await
    }

    async fn summarize(&self, company_name: &str, report_text: &str) -> Result<String> {
        let rendered = self.prompts.render(
            prompts::SUMMARY_TEMPLATE,
            &prompts::summary_substitutions(company_name),
        )?;
        let prompt = prompts::append_report_text(&rendered, report_text);
        Ok(self.generator.generate(&prompt).await?)
    }

    async fn generate_hypothesis(&self, summary: &str, persona: Persona<'_>) -> Result<String> {
        let prompt = self.prompts.render(
            prompts::HYPOTHESIS_TEMPLATE,
            &prompts::hypothesis_substitutions(
                summary,
                persona.department_name,
                persona.position_name,
                persona.job_scope,
            ),
        )?;
        Ok(self.generator.generate(&prompt).await?)
    }

    /// Match `hypothesis` against the solution catalog
    pub async fn match_solutions(&self, hypothesis: &str) -> Result<String> {
        let prompt = self.prompts.render(
            prompts::MATCHING_TEMPLATE,
            &prompts::matching_substitutions(hypothesis, &self.catalog.render_enumeration()),
        )?;
        Ok(self.generator.generate(&prompt).await?)
    }

    async fn generate_hearing_items(
        &self,
        company_name: &str,
        persona: Persona<'_>,
        hypothesis: &str,
    ) -> Result<String> {
        let prompt = self.prompts.render(
            prompts::HEARING_TEMPLATE,
            &prompts::hearing_substitutions(
                company_name,
                persona.department_name,
                persona.position_name,
                hypothesis,
            ),
        )?;
        Ok(self.generator.generate(&prompt).await?)
    }
}

/// Builder for ResearchPipeline
#[derive(Default)]
pub struct ResearchPipelineBuilder {
    resolver: Option<Arc<CompanyCodeResolver>>,
    locator: Option<Arc<dyn ReportLocator>>,
    extractor: Option<Arc<dyn DocumentExtractor>>,
    template_source: Option<Arc<dyn TemplateSource>>,
    generator: Option<Arc<dyn TextGenerator>>,
    catalog: Option<Arc<SolutionCatalog>>,
    max_chars: Option<usize>,
}

impl ResearchPipelineBuilder {
    pub fn resolver(mut self, resolver: Arc<CompanyCodeResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn locator(mut self, locator: Arc<dyn ReportLocator>) -> Self {
        self.locator = Some(locator);
        self
    }

    pub fn extractor(mut self, extractor: Arc<dyn DocumentExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn template_source(mut self, source: Arc<dyn TemplateSource>) -> Self {
        self.template_source = Some(source);
        self
    }

    pub fn generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn catalog(mut self, catalog: Arc<SolutionCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Extraction character budget (default 90,000)
    pub fn max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = Some(max_chars);
        self
    }

    pub fn build(self) -> Result<ResearchPipeline> {
        fn missing(part: &str) -> ResearchError {
            ResearchError::Config(format!("research pipeline needs a {part}"))
        }

        let max_chars = self
            .max_chars
            .unwrap_or(crate::config::DEFAULT_MAX_PDF_CHARS);
        if max_chars == 0 {
            return Err(ResearchError::Config(
                "max_chars must be greater than 0".to_string(),
            ));
        }

        Ok(ResearchPipeline {
            resolver: self.resolver.ok_or_else(|| missing("company code resolver"))?,
            locator: self.locator.ok_or_else(|| missing("report locator"))?,
            extractor: self.extractor.ok_or_else(|| missing("document extractor"))?,
            prompts: PromptEngine::new(
                self.template_source
                    .ok_or_else(|| missing("template source"))?,
            ),
            generator: self.generator.ok_or_else(|| missing("text generator"))?,
            catalog: self.catalog.unwrap_or_default(),
            max_chars,
        })
    }
}
