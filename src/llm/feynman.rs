//! Feynman-technique review: compare a learner's own explanation against the
//! study material and return feedback plus flashcards for the gaps.

use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::llm::client::{ChatClient, LlmError};
use crate::llm::prompt::PromptBuilder;
use crate::stage::{truncate_for_generation, Flashcard};

/// Characters of material and of explanation forwarded to the model.
pub const MAX_REVIEW_CHARS: usize = 8000;

/// What the reviewer sends back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeynmanFeedback {
    /// Corrections, missing points, and praise where earned.
    pub feedback: String,
    /// Cards for missed or misunderstood concepts only.
    pub flashcards: Vec<Flashcard>,
}

pub struct FeynmanReviewer {
    chat: ChatClient,
}

impl FeynmanReviewer {
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            chat: ChatClient::from_config(config),
        }
    }

    /// Review `explanation` against `material`.
    ///
    /// # Errors
    /// [`LlmError::MissingInput`] when either side is blank; otherwise any
    /// transport or schema error from the model call.
    pub async fn review(
        &self,
        material: &str,
        explanation: &str,
    ) -> Result<FeynmanFeedback, LlmError> {
        if material.trim().is_empty() || explanation.trim().is_empty() {
            return Err(LlmError::MissingInput(
                "Missing study material or explanation.".into(),
            ));
        }

        let material = truncate_for_generation(material, MAX_REVIEW_CHARS);
        let explanation = truncate_for_generation(explanation, MAX_REVIEW_CHARS);
        let (system_msg, user_msg) = PromptBuilder::feynman(&material, &explanation);

        let feedback: FeynmanFeedback = self.chat.complete_json(&system_msg, &user_msg).await?;
        log::debug!("feynman: {} gap flashcards", feedback.flashcards.len());
        Ok(feedback)
    }
}
