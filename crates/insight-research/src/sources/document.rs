//! PDF download and text extraction

use crate::config::ResearchConfig;
use crate::error::{ResearchError, Result};
use crate::sources::PdfReference;
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, instrument};

/// Turns a document reference into bounded plain text
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    /// Text of the document, at most `max_chars` characters
    async fn extract(&self, reference: &PdfReference, max_chars: usize) -> Result<String>;
}

/// [`DocumentExtractor`] that downloads a PDF and reads it with lopdf
pub struct PdfTextExtractor {
    client: Client,
    user_agent: String,
}

impl PdfTextExtractor {
    pub fn new(config: &ResearchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ResearchError::Config(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            user_agent: config.user_agent.clone(),
        })
    }

    async fn download(&self, reference: &PdfReference) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(reference.url().clone())
            .header("User-Agent", &self.user_agent)
            .send()
            .await
            .map_err(|e| ResearchError::fetch(reference, e))?;

        if !response.status().is_success() {
            return Err(ResearchError::fetch(
                reference,
                format!("HTTP {}", response.status()),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ResearchError::fetch(reference, format!("body read failed: {e}")))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl DocumentExtractor for PdfTextExtractor {
    #[instrument(skip(self), fields(url = %reference))]
    async fn extract(&self, reference: &PdfReference, max_chars: usize) -> Result<String> {
        let bytes = self.download(reference).await?;
        debug!(bytes = bytes.len(), "PDF downloaded");

        let text = tokio::task::spawn_blocking(move || extract_text_from_bytes(&bytes))
            .await
            .map_err(|e| ResearchError::Internal(format!("PDF extraction task failed: {e}")))??;

        let total = text.chars().count();
        let truncated = truncate_chars(&text, max_chars);
        info!(
            chars = total,
            kept = truncated.chars().count(),
            "report text extracted"
        );
        Ok(truncated.to_string())
    }
}

/// Text of every page in page order
///
/// Pages whose text cannot be decoded contribute nothing.
pub fn extract_text_from_bytes(bytes: &[u8]) -> Result<String> {
    let document =
        lopdf::Document::load_mem(bytes).map_err(|e| ResearchError::Parse(e.to_string()))?;

    let mut text = String::new();
    for page_num in document.get_pages().keys() {
        match document.extract_text(&[*page_num]) {
            Ok(page_text) => text.push_str(&page_text),
            Err(e) => debug!(page = page_num, error = %e, "page text unreadable"),
        }
    }
    Ok(text)
}

/// First `max_chars` characters of `text`, never splitting a character
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{Document, Object, Stream, dictionary};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn build_pdf(pages: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![50.into(), 700.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Resources" => resources_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    fn extractor() -> PdfTextExtractor {
        PdfTextExtractor::new(&ResearchConfig::default()).unwrap()
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("有価証券報告書", 4), "有価証券");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn test_extract_pages_in_order() {
        let bytes = build_pdf(&["First page", "Second page"]);
        let text = extract_text_from_bytes(&bytes).unwrap();

        let first = text.find("First page").unwrap();
        let second = text.find("Second page").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_not_a_pdf() {
        let err = extract_text_from_bytes(b"<html>not a pdf</html>").unwrap_err();
        assert!(matches!(err, ResearchError::Parse(_)));
    }

    #[tokio::test]
    async fn test_extract_truncates_to_prefix() {
        let bytes = build_pdf(&["Revenue grew in every segment this year"]);
        let full = extract_text_from_bytes(&bytes).unwrap();
        assert!(full.chars().count() > 10);

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pdf/report.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(bytes))
            .mount(&server)
            .await;

        let reference = PdfReference::parse(&format!("{}/pdf/report.pdf", server.uri())).unwrap();
        let text = extractor().extract(&reference, 10).await.unwrap();

        assert_eq!(text.chars().count(), 10);
        assert!(full.starts_with(&text));
    }

    #[tokio::test]
    async fn test_download_failure_is_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let reference = PdfReference::parse(&format!("{}/missing.pdf", server.uri())).unwrap();
        let err = extractor().extract(&reference, 100).await.unwrap_err();
        assert!(matches!(err, ResearchError::Fetch { .. }));
    }

    #[tokio::test]
    async fn test_garbage_body_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not a pdf"))
            .mount(&server)
            .await;

        let reference = PdfReference::parse(&format!("{}/x.pdf", server.uri())).unwrap();
        let err = extractor().extract(&reference, 100).await.unwrap_err();
        assert!(matches!(err, ResearchError::Parse(_)));
    }
}
