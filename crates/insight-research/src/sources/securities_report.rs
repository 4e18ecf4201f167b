//! Securities report (有価証券報告書) locator
//!
//! Finds the PDF of a company's latest securities report by scraping the
//! Nikkei disclosure listing:
//!
//! 1. Fetch the listing page for the company code
//! 2. Follow every link whose text contains the anchor phrase, in page order
//! 3. Search the linked page's scripts for `window['pdfLocation'] = "..."`
//! 4. The first hit is joined onto the document origin and returned
//!
//! Rate limit: configurable, 5 requests per second by default.

use crate::config::ResearchConfig;
use crate::error::{ResearchError, Result};
use crate::sources::CompanyCode;
use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use regex::Regex;
use reqwest::{Client, Response};
use scraper::{Html, Selector};
use std::fmt;
use std::num::NonZeroU32;
use std::sync::{Arc, LazyLock};
use tracing::{debug, info, instrument, warn};
use url::Url;

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a").expect("static selector"));
static SCRIPT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script").expect("static selector"));

/// Absolute URL of a report PDF
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfReference(Url);

impl PdfReference {
    pub fn new(url: Url) -> Self {
        Self(url)
    }

    pub fn parse(url: &str) -> Result<Self> {
        Url::parse(url)
            .map(Self)
            .map_err(|e| ResearchError::Locator(format!("invalid PDF URL '{url}': {e}")))
    }

    pub fn url(&self) -> &Url {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for PdfReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// Finds the source document for a company
#[async_trait]
pub trait ReportLocator: Send + Sync {
    /// `Ok(None)` when no candidate page points at a PDF
    async fn locate(&self, code: &CompanyCode) -> Result<Option<PdfReference>>;
}

/// [`ReportLocator`] backed by the Nikkei disclosure pages
pub struct NikkeiReportLocator {
    client: Client,
    listing_url: String,
    document_origin: String,
    user_agent: String,
    anchor_phrase: String,
    script_pattern: Regex,
    rate_limiter: SharedRateLimiter,
}

impl NikkeiReportLocator {
    /// Create a locator from validated configuration
    pub fn new(config: &ResearchConfig) -> Result<Self> {
        let script_pattern = Regex::new(&config.script_pattern)
            .map_err(|e| ResearchError::Config(format!("script_pattern: {e}")))?;
        let rate = NonZeroU32::new(config.scrape_rate_per_sec).ok_or_else(|| {
            ResearchError::Config("scrape_rate_per_sec must be greater than 0".to_string())
        })?;
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ResearchError::Config(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            listing_url: config.listing_url.clone(),
            document_origin: config.document_origin.clone(),
            user_agent: config.user_agent.clone(),
            anchor_phrase: config.anchor_phrase.clone(),
            script_pattern,
            rate_limiter: Arc::new(RateLimiter::direct(Quota::per_second(rate))),
        })
    }

    async fn get(&self, url: &Url) -> reqwest::Result<Response> {
        self.rate_limiter.until_ready().await;

        self.client
            .get(url.clone())
            .header("User-Agent", &self.user_agent)
            .send()
            .await
    }

    async fn fetch_listing(&self, url: &Url) -> Result<String> {
        let response = self
            .get(url)
            .await
            .map_err(|e| ResearchError::Locator(format!("{url}: {e}")))?;

        if !response.status().is_success() {
            return Err(ResearchError::Locator(format!(
                "{url}: HTTP {}",
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| ResearchError::Locator(format!("{url}: body read failed: {e}")))
    }

    /// `Ok(None)` for a non-success status
    async fn fetch_candidate(&self, url: &Url) -> Result<Option<String>> {
        let response = self
            .get(url)
            .await
            .map_err(|e| ResearchError::fetch(url, e))?;

        if !response.status().is_success() {
            warn!(%url, status = %response.status(), "skipping report link");
            return Ok(None);
        }

        response
            .text()
            .await
            .map(Some)
            .map_err(|e| ResearchError::fetch(url, format!("body read failed: {e}")))
    }

    fn document_reference(&self, path: &str) -> Result<PdfReference> {
        let origin = self.document_origin.trim_end_matches('/');
        let joined = if path.starts_with('/') {
            format!("{origin}{path}")
        } else {
            format!("{origin}/{path}")
        };
        PdfReference::parse(&joined)
    }
}

#[async_trait]
impl ReportLocator for NikkeiReportLocator {
    #[instrument(skip(self), fields(code = %code))]
    async fn locate(&self, code: &CompanyCode) -> Result<Option<PdfReference>> {
        let listing_url = Url::parse(&format!("{}{}", self.listing_url, code))
            .map_err(|e| ResearchError::Locator(format!("invalid listing URL: {e}")))?;

        let listing = self.fetch_listing(&listing_url).await?;
        let candidates = find_report_links(&listing, &listing_url, &self.anchor_phrase);
        debug!(candidates = candidates.len(), "report links found");

        for candidate in candidates {
            let Some(page) = self.fetch_candidate(&candidate).await? else {
                continue;
            };

            if let Some(path) = find_pdf_path(&page, &self.script_pattern) {
                let reference = self.document_reference(&path)?;
                info!(pdf = %reference, "securities report located");
                return Ok(Some(reference));
            }
            debug!(url = %candidate, "no PDF location on page");
        }

        Ok(None)
    }
}

/// Absolute URLs of `<a>` elements whose text contains `phrase`, in document order
///
/// Anchors without an `href`, or whose `href` cannot be resolved against
/// `base`, are skipped.
pub fn find_report_links(html: &str, base: &Url, phrase: &str) -> Vec<Url> {
    let document = Html::parse_document(html);

    document
        .select(&ANCHOR_SELECTOR)
        .filter(|a| a.text().collect::<String>().contains(phrase))
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| match base.join(href) {
            Ok(url) => Some(url),
            Err(e) => {
                debug!(href, error = %e, "unresolvable report link");
                None
            }
        })
        .collect()
}

/// First capture of `pattern` in the concatenated text of all `<script>` elements
pub fn find_pdf_path(html: &str, pattern: &Regex) -> Option<String> {
    let document = Html::parse_document(html);

    let scripts: String = document
        .select(&SCRIPT_SELECTOR)
        .flat_map(|script| script.text())
        .collect();

    pattern
        .captures(&scripts)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_SCRIPT_PATTERN;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn pattern() -> Regex {
        Regex::new(DEFAULT_SCRIPT_PATTERN).unwrap()
    }

    fn report_page(pdf_path: &str) -> String {
        format!(
            r#"<html><head><script>var x = 1;</script><script>window['pdfLocation'] = "{pdf_path}";</script></head><body></body></html>"#
        )
    }

    fn locator_for(server: &MockServer) -> NikkeiReportLocator {
        let config = ResearchConfig::builder()
            .listing_url(format!("{}/nkd/company/ednr/?scode=", server.uri()))
            .document_origin(server.uri())
            .scrape_rate_per_sec(100)
            .build()
            .unwrap();
        NikkeiReportLocator::new(&config).unwrap()
    }

    #[test]
    fn test_find_report_links() {
        let base = Url::parse("https://www.nikkei.com/nkd/company/ednr/?scode=7203").unwrap();
        let html = r#"
            <a href="/a">決算短信</a>
            <a href="/b">2024年3月期 有価証券報告書</a>
            <a>有価証券報告書 (no href)</a>
            <a href="c?id=2"><span>有価証券報告書</span></a>
        "#;

        let links = find_report_links(html, &base, "有価証券報告書");
        let links: Vec<_> = links.iter().map(Url::as_str).collect();
        assert_eq!(
            links,
            vec![
                "https://www.nikkei.com/b",
                "https://www.nikkei.com/nkd/company/ednr/c?id=2",
            ]
        );
    }

    #[test]
    fn test_find_pdf_path() {
        assert_eq!(
            find_pdf_path(&report_page("/pdf/7203.pdf"), &pattern()).as_deref(),
            Some("/pdf/7203.pdf")
        );

        let spaced = r#"<script>window['pdfLocation']   =   "/x.pdf"</script>"#;
        assert_eq!(find_pdf_path(spaced, &pattern()).as_deref(), Some("/x.pdf"));

        assert_eq!(find_pdf_path("<script>var a;</script>", &pattern()), None);
        assert_eq!(find_pdf_path(r#"<p>window['pdfLocation'] = "/p.pdf"</p>"#, &pattern()), None);
    }

    #[tokio::test]
    async fn test_first_match_wins() {
        let server = MockServer::start().await;
        let listing = r#"
            <a href="/other">決算短信</a>
            <a href="/report/1">有価証券報告書</a>
            <a href="/report/2">有価証券報告書（訂正）</a>
        "#;

        Mock::given(method("GET"))
            .and(path("/nkd/company/ednr/"))
            .and(query_param("scode", "7203"))
            .respond_with(ResponseTemplate::new(200).set_body_string(listing))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/report/1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(report_page("/pdf/first.pdf")))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/report/2"))
            .respond_with(ResponseTemplate::new(200).set_body_string(report_page("/pdf/second.pdf")))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/other"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let locator = locator_for(&server);
        let found = locator.locate(&CompanyCode::new("7203")).await.unwrap();

        assert_eq!(
            found.unwrap().as_str(),
            format!("{}/pdf/first.pdf", server.uri())
        );
    }

    #[tokio::test]
    async fn test_failed_candidate_is_skipped() {
        let server = MockServer::start().await;
        let listing = r#"<a href="/gone">有価証券報告書</a><a href="/report">有価証券報告書</a>"#;

        Mock::given(method("GET"))
            .and(path("/nkd/company/ednr/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(listing))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/report"))
            .respond_with(ResponseTemplate::new(200).set_body_string(report_page("/pdf/r.pdf")))
            .mount(&server)
            .await;

        let found = locator_for(&server)
            .locate(&CompanyCode::new("6758"))
            .await
            .unwrap();
        assert!(found.unwrap().as_str().ends_with("/pdf/r.pdf"));
    }

    #[tokio::test]
    async fn test_no_match_returns_none() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/nkd/company/ednr/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"<a href="/report">有価証券報告書</a>"#),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/report"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<script>var a;</script>"))
            .mount(&server)
            .await;

        let found = locator_for(&server)
            .locate(&CompanyCode::new("7974"))
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_listing_error_is_locator_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/nkd/company/ednr/"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = locator_for(&server)
            .locate(&CompanyCode::new("7203"))
            .await
            .unwrap_err();
        assert!(matches!(err, ResearchError::Locator(_)));
    }

    #[tokio::test]
    async fn test_sends_browser_user_agent() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/nkd/company/ednr/"))
            .and(wiremock::matchers::header("User-Agent", "Mozilla/5.0"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .expect(1)
            .mount(&server)
            .await;

        let found = locator_for(&server)
            .locate(&CompanyCode::new("7203"))
            .await
            .unwrap();
        assert!(found.is_none());
    }
}
