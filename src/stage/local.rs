//! [`LocalStageClient`]: runs the stages in-process.
//!
//! Extraction and rendering happen on this machine; generation goes through
//! any [`ContentGenerator`].  Extraction is CPU-bound (PDF parsing) and runs
//! on the blocking pool so the async runtime is never stalled.

use std::sync::Arc;

use async_trait::async_trait;

use crate::extract::extract_document;
use crate::llm::ContentGenerator;
use crate::render::render_guide;

use super::{
    require_speech_text, Artifact, Document, ExtractedText, SpokenSummary, Stage, StageClient,
    StageError, StageErrorKind, StudyMaterial, MIN_TEXT_CHARS,
};

pub struct LocalStageClient {
    generator: Arc<dyn ContentGenerator>,
    speech_available: bool,
}

impl LocalStageClient {
    pub fn new(generator: Arc<dyn ContentGenerator>) -> Self {
        Self {
            generator,
            speech_available: false,
        }
    }

    /// Declare whether a speech engine is present.  Without one the
    /// synthesize stage yields a text fallback.
    pub fn with_speech(mut self, available: bool) -> Self {
        self.speech_available = available;
        self
    }
}

#[async_trait]
impl StageClient for LocalStageClient {
    async fn extract(&self, document: &Document) -> Result<ExtractedText, StageError> {
        let document = document.clone();
        tokio::task::spawn_blocking(move || extract_document(&document))
            .await
            .map_err(|e| {
                log::error!("extract: worker task failed: {e}");
                StageError::with_default_message(Stage::Extract, StageErrorKind::Upstream)
            })?
    }

    async fn generate(&self, text: &str) -> Result<StudyMaterial, StageError> {
        if text.trim().chars().count() < MIN_TEXT_CHARS {
            return Err(StageError::new(
                Stage::Generate,
                StageErrorKind::MissingInput,
                "No text provided for processing",
            ));
        }

        self.generator
            .generate(text)
            .await
            .map_err(|e| e.into_stage_error())
    }

    async fn render(
        &self,
        material: &StudyMaterial,
        title: &str,
    ) -> Result<Artifact, StageError> {
        Ok(render_guide(material, title))
    }

    async fn synthesize(&self, text: &str) -> Result<SpokenSummary, StageError> {
        require_speech_text(text)?;
        if self.speech_available {
            Ok(SpokenSummary::Playable {
                text: text.to_string(),
            })
        } else {
            log::info!("synthesize: no speech engine, returning text summary");
            Ok(SpokenSummary::fallback(text))
        }
    }
}
