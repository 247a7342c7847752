//! Plain-text extraction from uploaded resources.
//!
//! [`ContentExtractor::extract`] never fails. When real text cannot be
//! produced it returns a placeholder naming the file and its size, so the
//! generation pipeline always has something to send.

pub mod docx;
pub mod pdf;

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;

use self::pdf::PdfCapability;

pub const DOCX_MEDIA_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "json", "js", "ts", "tsx", "jsx", "html", "css", "py", "java", "cpp", "c", "cs",
    "go", "rb",
];

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("no PDF engine could be loaded")]
    Unavailable,

    #[error("extraction failed: {0}")]
    Failed(String),
}

/// An uploaded or downloaded file. Only ever read.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub data: Bytes,
    pub media_type: String,
    pub filename: String,
}

impl SourceDocument {
    pub fn new(
        data: impl Into<Bytes>,
        media_type: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            data: data.into(),
            media_type: media_type.into(),
            filename: filename.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Lower-cased extension, empty when the name has none.
    pub fn extension(&self) -> String {
        Path::new(&self.filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default()
    }

    pub fn class(&self) -> DocumentClass {
        DocumentClass::classify(&self.media_type, &self.extension())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentClass {
    PlainText,
    Pdf,
    Docx,
    Unsupported,
}

impl DocumentClass {
    /// Checked in precedence order: text, PDF, DOCX.
    pub fn classify(media_type: &str, extension: &str) -> Self {
        let media_type = media_type.to_ascii_lowercase();
        if media_type.contains("text") || TEXT_EXTENSIONS.contains(&extension) {
            DocumentClass::PlainText
        } else if media_type == PDF_MEDIA_TYPE || extension == "pdf" {
            DocumentClass::Pdf
        } else if media_type == DOCX_MEDIA_TYPE || extension == "docx" {
            DocumentClass::Docx
        } else {
            DocumentClass::Unsupported
        }
    }
}

#[derive(Clone, Default)]
pub struct ContentExtractor {
    pdf: Arc<PdfCapability>,
}

impl ContentExtractor {
    pub fn new(pdf: PdfCapability) -> Self {
        Self { pdf: Arc::new(pdf) }
    }

    pub fn pdf_capability(&self) -> &PdfCapability {
        &self.pdf
    }

    #[tracing::instrument(skip_all, fields(filename = %document.filename, size = document.size()))]
    pub async fn extract(&self, document: &SourceDocument) -> String {
        let class = document.class();
        tracing::debug!(?class, media_type = %document.media_type, "extracting text");

        match class {
            DocumentClass::PlainText => String::from_utf8_lossy(&document.data).into_owned(),
            DocumentClass::Pdf => match self.extract_pdf(document).await {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(error = %e, "PDF processing failed, using fallback");
                    pdf_placeholder(document)
                }
            },
            DocumentClass::Docx => match self.extract_docx(document).await {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(error = %e, "DOCX processing failed, using fallback");
                    docx_placeholder(document)
                }
            },
            DocumentClass::Unsupported => unsupported_placeholder(document),
        }
    }

    async fn extract_docx(&self, document: &SourceDocument) -> Result<String, ExtractError> {
        let data = document.data.clone();

        tokio::task::spawn_blocking(move || docx::extract_raw_text(&data))
            .await
            .map_err(|e| ExtractError::Failed(format!("extraction task failed: {}", e)))?
    }

    async fn extract_pdf(&self, document: &SourceDocument) -> Result<String, ExtractError> {
        let engine = self.pdf.engine().await?;
        let data = document.data.clone();

        tokio::task::spawn_blocking(move || pdf::extract_pages(engine.as_ref(), &data))
            .await
            .map_err(|e| ExtractError::Failed(format!("extraction task failed: {}", e)))?
    }
}

pub fn pdf_placeholder(document: &SourceDocument) -> String {
    format!(
        "PDF File: {} ({}) - Text extraction not available. Please upload as text or use a different format for AI analysis.",
        document.filename,
        format_file_size(document.size())
    )
}

pub fn docx_placeholder(document: &SourceDocument) -> String {
    format!(
        "DOCX File: {} ({}) - Text extraction failed. Please upload as text or use a different format for AI analysis.",
        document.filename,
        format_file_size(document.size())
    )
}

pub fn unsupported_placeholder(document: &SourceDocument) -> String {
    format!(
        "File: {} ({}) - Content extraction not supported for this file type.",
        document.filename,
        format_file_size(document.size())
    )
}

/// Binary units, two decimals at most, trailing zeros dropped.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::pdf::{PdfEngine, PdfSource};
    use async_trait::async_trait;

    struct NoSource;

    #[async_trait]
    impl PdfSource for NoSource {
        fn name(&self) -> &str {
            "none"
        }

        async fn try_load(&self) -> Option<Arc<dyn PdfEngine>> {
            None
        }
    }

    fn extractor_without_pdf() -> ContentExtractor {
        ContentExtractor::new(PdfCapability::new(vec![Box::new(NoSource)]))
    }

    #[test]
    fn size_formatting() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(1), "1 Bytes");
        assert_eq!(format_file_size(1000), "1000 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(1_048_576), "1 MB");
        assert_eq!(format_file_size(5 * 1024 * 1024 * 1024), "5 GB");
        assert_eq!(format_file_size(3 * 1024 * 1024 * 1024 * 1024), "3072 GB");
    }

    #[test]
    fn classification_precedence() {
        assert_eq!(DocumentClass::classify("text/plain", "pdf"), DocumentClass::PlainText);
        assert_eq!(DocumentClass::classify("", "rb"), DocumentClass::PlainText);
        assert_eq!(DocumentClass::classify("application/pdf", ""), DocumentClass::Pdf);
        assert_eq!(DocumentClass::classify("", "pdf"), DocumentClass::Pdf);
        assert_eq!(DocumentClass::classify(DOCX_MEDIA_TYPE, ""), DocumentClass::Docx);
        assert_eq!(DocumentClass::classify("application/octet-stream", "docx"), DocumentClass::Docx);
        assert_eq!(DocumentClass::classify("image/png", "png"), DocumentClass::Unsupported);
    }

    #[test]
    fn extension_is_case_insensitive() {
        let doc = SourceDocument::new(Vec::new(), "", "Notes.MD");
        assert_eq!(doc.extension(), "md");
        assert_eq!(doc.class(), DocumentClass::PlainText);
    }

    #[tokio::test]
    async fn plain_text_is_returned_verbatim() {
        let body = "Photosynthesis converts light into chemical energy.\n  Indented line\n";
        let doc = SourceDocument::new(body.as_bytes().to_vec(), "", "notes.txt");
        assert_eq!(extractor_without_pdf().extract(&doc).await, body);
    }

    #[tokio::test]
    async fn unknown_empty_file_names_itself() {
        let doc = SourceDocument::new(Vec::new(), "", "foo.xyz");
        let text = extractor_without_pdf().extract(&doc).await;
        assert!(text.contains("foo.xyz"));
        assert!(text.contains("0 Bytes"));
    }

    #[tokio::test]
    async fn pdf_without_engine_falls_back_to_placeholder() {
        let doc = SourceDocument::new(b"%PDF-1.4".to_vec(), PDF_MEDIA_TYPE, "lecture.pdf");
        let text = extractor_without_pdf().extract(&doc).await;
        assert_eq!(text, pdf_placeholder(&doc));
        assert!(text.contains("lecture.pdf"));
        assert!(text.contains("8 Bytes"));
    }

    #[tokio::test]
    async fn corrupt_pdf_falls_back_to_placeholder() {
        let extractor = ContentExtractor::new(PdfCapability::new(vec![Box::new(pdf::LopdfSource)]));
        let doc = SourceDocument::new(b"%PDF-1.4 broken".to_vec(), "", "broken.pdf");
        assert_eq!(extractor.extract(&doc).await, pdf_placeholder(&doc));
        assert!(extractor.pdf_capability().is_loaded());
    }

    #[tokio::test]
    async fn generated_pdf_is_extracted_page_by_page() {
        let extractor = ContentExtractor::new(PdfCapability::new(vec![Box::new(pdf::LopdfSource)]));
        let data = pdf::tests::pdf_with_pages(&["Hello World", "Second page"]);
        let doc = SourceDocument::new(data, PDF_MEDIA_TYPE, "lecture.pdf");

        assert_eq!(extractor.extract(&doc).await, "Hello World\n\nSecond page");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn docx_documents_extract_concurrently() {
        let extractor = extractor_without_pdf();
        let docs: Vec<SourceDocument> = (0..8)
            .map(|i| {
                let body = format!("<w:p><w:r><w:t>Chapter {}</w:t></w:r></w:p>", i);
                SourceDocument::new(docx::tests::docx_with_body(&body), DOCX_MEDIA_TYPE, "ch.docx")
            })
            .collect();

        let mut tasks = tokio::task::JoinSet::new();
        for (i, doc) in docs.into_iter().enumerate() {
            let extractor = extractor.clone();
            tasks.spawn(async move { (i, extractor.extract(&doc).await) });
        }
        while let Some(joined) = tasks.join_next().await {
            let (i, text) = joined.unwrap();
            assert_eq!(text, format!("Chapter {}", i));
        }
    }

    #[tokio::test]
    async fn docx_text_is_extracted() {
        let data = docx::tests::docx_with_body("<w:p><w:r><w:t>Newton's laws</w:t></w:r></w:p>");
        let doc = SourceDocument::new(data, DOCX_MEDIA_TYPE, "physics.docx");
        assert_eq!(extractor_without_pdf().extract(&doc).await, "Newton's laws");
    }

    #[tokio::test]
    async fn unreadable_docx_falls_back_to_placeholder() {
        let doc = SourceDocument::new(b"garbage".to_vec(), "", "essay.docx");
        let text = extractor_without_pdf().extract(&doc).await;
        assert!(text.starts_with("DOCX File: essay.docx (7 Bytes)"));
    }
}
