//! Prompt templates used by each pipeline stage
//!
//! Template names map to `<prompts_dir>/<name>.txt`. Each builder returns the
//! complete substitution set for its template.

use insight_prompt::Substitutions;

/// Report summary template
pub const SUMMARY_TEMPLATE: &str = "prompt";
/// Sales hypothesis template
pub const HYPOTHESIS_TEMPLATE: &str = "hypothesis_prompt";
/// Solution matching template
pub const MATCHING_TEMPLATE: &str = "solution_matching_prompt";
/// Hearing items template
pub const HEARING_TEMPLATE: &str = "hearing_prompt";

/// Company name token in the summary template
pub const COMPANY_NAME_TOKEN: &str = "[企業名を入力]";

/// Every template the pipeline loads
pub const ALL_TEMPLATES: [&str; 4] = [
    SUMMARY_TEMPLATE,
    HYPOTHESIS_TEMPLATE,
    MATCHING_TEMPLATE,
    HEARING_TEMPLATE,
];

pub fn summary_substitutions(company_name: &str) -> Substitutions {
    Substitutions::new().with(COMPANY_NAME_TOKEN, company_name)
}

/// The report text follows the rendered template after a single newline
pub fn append_report_text(rendered: &str, report_text: &str) -> String {
    let mut prompt = String::with_capacity(rendered.len() + 1 + report_text.len());
    prompt.push_str(rendered);
    prompt.push('\n');
    prompt.push_str(report_text);
    prompt
}

pub fn hypothesis_substitutions(
    summary: &str,
    department_name: &str,
    position_name: &str,
    job_scope: &str,
) -> Substitutions {
    Substitutions::new()
        .with("{securities_report_summary}", summary)
        .with("{department_name}", department_name)
        .with("{position_title}", position_name)
        .with("{job_scope}", job_scope)
}

pub fn matching_substitutions(hypothesis: &str, solutions: &str) -> Substitutions {
    Substitutions::new()
        .with("{hypothesis}", hypothesis)
        .with("{solutions}", solutions)
}

pub fn hearing_substitutions(
    company_name: &str,
    department_name: &str,
    position_name: &str,
    hypothesis: &str,
) -> Substitutions {
    Substitutions::new()
        .with("{company_name}", company_name)
        .with("{department_name}", department_name)
        .with("{position_name}", position_name)
        .with("{company_size}", "")
        .with("{industry}", "")
        .with("{hypothesis}", hypothesis)
}
