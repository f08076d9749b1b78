//! `ContentGenerator` trait and the `ApiGenerator` implementation.

use async_trait::async_trait;

use crate::config::LlmConfig;
use crate::llm::client::{ChatClient, LlmError};
use crate::llm::prompt::PromptBuilder;
use crate::stage::StudyMaterial;

// ---------------------------------------------------------------------------
// ContentGenerator trait
// ---------------------------------------------------------------------------

/// Produces study material from plain text.
///
/// Implementors must be `Send + Sync` so they can be shared as
/// `Arc<dyn ContentGenerator>`.  `text` arrives already truncated.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(&self, text: &str) -> Result<StudyMaterial, LlmError>;
}

// ---------------------------------------------------------------------------
// ApiGenerator
// ---------------------------------------------------------------------------

/// Generates study material through an OpenAI-compatible chat endpoint.
///
/// The answer must deserialize into [`StudyMaterial`]; anything else is a
/// [`LlmError::Schema`].  An empty `flashcards` array is valid.
pub struct ApiGenerator {
    chat: ChatClient,
}

impl ApiGenerator {
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            chat: ChatClient::from_config(config),
        }
    }
}

#[async_trait]
impl ContentGenerator for ApiGenerator {
    async fn generate(&self, text: &str) -> Result<StudyMaterial, LlmError> {
        let (system_msg, user_msg) = PromptBuilder::study_material(text);
        let material: StudyMaterial = self.chat.complete_json(&system_msg, &user_msg).await?;
        log::debug!(
            "generate-content: {} summary chars, {} flashcards (model {})",
            material.summary.len(),
            material.flashcards.len(),
            self.chat.config().model
        );
        Ok(material)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
