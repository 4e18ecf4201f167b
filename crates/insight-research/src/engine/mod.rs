//! Research engine
//!
//! Orchestrates the sources, prompt templates and generator into one staged run

pub mod pipeline;
pub mod request;
pub mod result;

pub use pipeline::{ResearchPipeline, ResearchPipelineBuilder};
pub use request::{Persona, PipelineRequest};
pub use result::{PipelineResult, SolutionMatchResult, Stage, StageReport, StageStatus};
