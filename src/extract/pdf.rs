//! PDF text extraction behind a lazily loaded engine.
//!
//! Engines come from an ordered list of [`PdfSource`]s. The first source that
//! loads is kept for the life of the [`PdfCapability`]; when none loads,
//! nothing is remembered and the next extraction tries again.

use std::collections::BTreeMap;
use std::io::Write;
use std::process::Command;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;

use super::ExtractError;

/// An opened document.
pub trait PdfPages: Send {
    fn page_count(&self) -> usize;
    /// Zero-based page index.
    fn page_text(&self, index: usize) -> Result<String, ExtractError>;
}

pub trait PdfEngine: Send + Sync {
    fn name(&self) -> &str;
    fn open(&self, data: &[u8]) -> Result<Box<dyn PdfPages>, ExtractError>;
}

/// One place an engine may be obtained from.
#[async_trait]
pub trait PdfSource: Send + Sync {
    fn name(&self) -> &str;
    async fn try_load(&self) -> Option<Arc<dyn PdfEngine>>;
}

pub struct PdfCapability {
    sources: Vec<Box<dyn PdfSource>>,
    engine: OnceCell<Arc<dyn PdfEngine>>,
}

impl Default for PdfCapability {
    /// `pdftotext` when installed, the built-in parser otherwise.
    fn default() -> Self {
        Self::new(vec![
            Box::new(PdftotextSource::default()),
            Box::new(LopdfSource),
        ])
    }
}

impl PdfCapability {
    pub fn new(sources: Vec<Box<dyn PdfSource>>) -> Self {
        Self {
            sources,
            engine: OnceCell::new(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.engine.initialized()
    }

    /// Returns the memoised engine, loading it on first use.
    pub async fn engine(&self) -> Result<Arc<dyn PdfEngine>, ExtractError> {
        self.engine
            .get_or_try_init(|| async {
                for source in &self.sources {
                    match source.try_load().await {
                        Some(engine) => {
                            tracing::info!(source = source.name(), engine = engine.name(), "PDF engine loaded");
                            return Ok(engine);
                        }
                        None => tracing::warn!(source = source.name(), "PDF engine source unavailable"),
                    }
                }
                Err(ExtractError::Unavailable)
            })
            .await
            .cloned()
    }
}

/// Concatenate every page: words within a page joined by single spaces,
/// pages separated by a blank line.
pub fn extract_pages(engine: &dyn PdfEngine, data: &[u8]) -> Result<String, ExtractError> {
    let document = engine.open(data)?;
    let mut pages = Vec::with_capacity(document.page_count());

    for index in 0..document.page_count() {
        let text = document.page_text(index)?;
        pages.push(text.split_whitespace().collect::<Vec<_>>().join(" "));
    }

    Ok(pages.join("\n\n").trim().to_string())
}

// ── lopdf ──────────────────────────────────────────────────────────────────

/// Always available; parses in-process.
pub struct LopdfSource;

#[async_trait]
impl PdfSource for LopdfSource {
    fn name(&self) -> &str {
        "lopdf"
    }

    async fn try_load(&self) -> Option<Arc<dyn PdfEngine>> {
        Some(Arc::new(LopdfEngine))
    }
}

pub struct LopdfEngine;

struct LopdfPages {
    document: lopdf::Document,
    page_numbers: Vec<u32>,
}

impl PdfEngine for LopdfEngine {
    fn name(&self) -> &str {
        "lopdf"
    }

    fn open(&self, data: &[u8]) -> Result<Box<dyn PdfPages>, ExtractError> {
        let document = lopdf::Document::load_mem(data)
            .map_err(|e| ExtractError::Failed(format!("failed to parse PDF: {}", e)))?;
        let pages: BTreeMap<u32, lopdf::ObjectId> = document.get_pages();
        let page_numbers = pages.keys().copied().collect();

        Ok(Box::new(LopdfPages {
            document,
            page_numbers,
        }))
    }
}

impl PdfPages for LopdfPages {
    fn page_count(&self) -> usize {
        self.page_numbers.len()
    }

    fn page_text(&self, index: usize) -> Result<String, ExtractError> {
        let number = self
            .page_numbers
            .get(index)
            .ok_or_else(|| ExtractError::Failed(format!("page {} out of range", index + 1)))?;
        self.document
            .extract_text(&[*number])
            .map_err(|e| ExtractError::Failed(format!("page {}: {}", number, e)))
    }
}

// ── pdftotext ─────────────────────────────────────────────────────────────

/// Uses the poppler `pdftotext` executable when it can be run.
pub struct PdftotextSource {
    pub program: String,
}

impl Default for PdftotextSource {
    fn default() -> Self {
        Self {
            program: "pdftotext".to_string(),
        }
    }
}

#[async_trait]
impl PdfSource for PdftotextSource {
    fn name(&self) -> &str {
        &self.program
    }

    async fn try_load(&self) -> Option<Arc<dyn PdfEngine>> {
        // `pdftotext -v` prints its version and exits 0 on current poppler builds.
        let probe = tokio::process::Command::new(&self.program)
            .arg("-v")
            .output()
            .await
            .ok()?;
        if !probe.status.success() {
            return None;
        }
        Some(Arc::new(PdftotextEngine {
            program: self.program.clone(),
        }))
    }
}

pub struct PdftotextEngine {
    program: String,
}

struct SplitPages(Vec<String>);

impl PdfEngine for PdftotextEngine {
    fn name(&self) -> &str {
        "pdftotext"
    }

    fn open(&self, data: &[u8]) -> Result<Box<dyn PdfPages>, ExtractError> {
        let mut input = tempfile::NamedTempFile::new()
            .map_err(|e| ExtractError::Failed(format!("failed to create temp file: {}", e)))?;
        input
            .write_all(data)
            .map_err(|e| ExtractError::Failed(format!("failed to write temp file: {}", e)))?;

        let output = Command::new(&self.program)
            .arg("-layout")
            .arg(input.path())
            .arg("-")
            .output()
            .map_err(|e| ExtractError::Failed(format!("failed to run {}: {}", self.program, e)))?;

        if !output.status.success() {
            return Err(ExtractError::Failed(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(Box::new(SplitPages(split_form_feeds(&String::from_utf8_lossy(
            &output.stdout,
        )))))
    }
}

impl PdfPages for SplitPages {
    fn page_count(&self) -> usize {
        self.0.len()
    }

    fn page_text(&self, index: usize) -> Result<String, ExtractError> {
        self.0
            .get(index)
            .cloned()
            .ok_or_else(|| ExtractError::Failed(format!("page {} out of range", index + 1)))
    }
}

/// pdftotext ends every page with a form feed, so the final segment is empty.
fn split_form_feeds(text: &str) -> Vec<String> {
    let mut pages: Vec<String> = text.split('\u{000C}').map(str::to_string).collect();
    if pages.last().is_some_and(|p| p.trim().is_empty()) {
        pages.pop();
    }
    pages
}
