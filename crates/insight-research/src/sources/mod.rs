//! External sources the pipeline reads from

pub mod company_codes;
pub mod document;
pub mod securities_report;

pub use company_codes::{CompanyCode, CompanyCodeResolver};
pub use document::{DocumentExtractor, PdfTextExtractor, extract_text_from_bytes, truncate_chars};
pub use securities_report::{
    NikkeiReportLocator, PdfReference, ReportLocator, find_pdf_path, find_report_links,
};
