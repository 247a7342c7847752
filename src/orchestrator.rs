//! Extract → build → send → normalize.
//!
//! Extraction never fails. A failed model call or download stops the run and
//! comes back as one [`GenerationError`] whose message names the stage.

use std::sync::Arc;

use crate::client::{ProxyError, TextGenerator};
use crate::extract::{ContentExtractor, SourceDocument};
use crate::fetch::{self, FetchError};
use crate::normalize::{
    FlashcardGeneration, GenerationResult, TextGeneration, compose_comprehensive, normalize,
    normalize_flashcards, normalize_text,
};
use crate::prompts::{GenerationKind, GenerationRequest, PromptKind, build_request};

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Failed to generate {}: {source}", .kind.label())]
    Generation {
        kind: PromptKind,
        #[source]
        source: ProxyError,
    },

    #[error("Failed to generate comprehensive analysis: {0}")]
    Comprehensive(Box<GenerationError>),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

#[derive(Clone)]
pub struct Orchestrator {
    extractor: ContentExtractor,
    generator: Arc<dyn TextGenerator>,
}

impl Orchestrator {
    pub fn new(extractor: ContentExtractor, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            extractor,
            generator,
        }
    }

    pub fn extractor(&self) -> &ContentExtractor {
        &self.extractor
    }

    #[tracing::instrument(skip(self, document), fields(filename = %document.filename))]
    pub async fn process_resource(
        &self,
        document: &SourceDocument,
        kind: GenerationKind,
        title: &str,
    ) -> Result<GenerationResult, GenerationError> {
        let text = self.extractor.extract(document).await;
        let request = build_request(kind, &text, title);

        let result = match kind.prompt_kind() {
            Some(prompt_kind) => self.generate(&request, prompt_kind).await,
            None => self.generate_comprehensive(&request).await,
        };

        match &result {
            Ok(_) => tracing::info!("generation complete"),
            Err(e) => tracing::error!(error = %e, "generation failed"),
        }
        result
    }

    #[tracing::instrument(skip(self))]
    pub async fn process_resource_from_url(
        &self,
        url: &str,
        kind: GenerationKind,
        title: &str,
    ) -> Result<GenerationResult, GenerationError> {
        let filename = fetch::resource_filename(url, title);
        let resource = fetch::fetch_resource(url).await.inspect_err(|e| {
            tracing::error!(error = %e, "error processing resource from URL");
        })?;

        let document = SourceDocument::new(resource.data, resource.media_type, filename.clone());
        let title = if title.is_empty() { filename.as_str() } else { title };
        self.process_resource(&document, kind, title).await
    }

    async fn call(
        &self,
        request: &GenerationRequest,
        kind: PromptKind,
    ) -> Result<String, GenerationError> {
        self.generator
            .generate(&request.prompt(kind))
            .await
            .map_err(|source| GenerationError::Generation { kind, source })
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
        kind: PromptKind,
    ) -> Result<GenerationResult, GenerationError> {
        let raw = self.call(request, kind).await?;
        Ok(normalize(kind, &raw, &request.title))
    }

    async fn generate_text(
        &self,
        request: &GenerationRequest,
        kind: PromptKind,
    ) -> Result<TextGeneration, GenerationError> {
        let raw = self.call(request, kind).await?;
        Ok(normalize_text(kind, &raw, &request.title))
    }

    async fn generate_flashcards(
        &self,
        request: &GenerationRequest,
    ) -> Result<FlashcardGeneration, GenerationError> {
        let raw = self.call(request, PromptKind::Flashcards).await?;
        Ok(normalize_flashcards(&raw, &request.title))
    }

    /// All three calls run at once; the first failure fails the whole result.
    async fn generate_comprehensive(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, GenerationError> {
        let (summary, study_plan, flashcards) = tokio::try_join!(
            self.generate_text(request, PromptKind::Summary),
            self.generate_text(request, PromptKind::StudyPlan),
            self.generate_flashcards(request)
        )
        .map_err(|e| GenerationError::Comprehensive(Box::new(e)))?;

        Ok(compose_comprehensive(summary, study_plan, flashcards))
    }
}
