//! Prompt builder for study-material generation and Feynman review.
//!
//! Both prompts ask for a single JSON object so the answer can be parsed
//! straight into [`StudyMaterial`](crate::stage::StudyMaterial) or
//! [`FeynmanFeedback`](crate::llm::FeynmanFeedback).

// ---------------------------------------------------------------------------
// System instructions
// ---------------------------------------------------------------------------

const STUDY_MATERIAL_SYSTEM: &str = "\
You are an expert study guide creator. Based on the study material you are given, create:

1. A comprehensive but concise summary (2-3 paragraphs) that captures the key concepts and important details.
2. 8-12 flashcards with clear questions and detailed answers that would help a student prepare for an exam.

Make sure the flashcards cover the most important concepts, definitions, and facts from the material.

Reply with ONLY a JSON object of this shape:
{\"summary\": string, \"flashcards\": [{\"question\": string, \"answer\": string}]}";

const FEYNMAN_SYSTEM: &str = "\
You are an expert tutor. The user is trying to explain the study material below in their own words (Feynman Technique). Your job is to:
- Compare the user's explanation to the study material.
- Identify any concepts, facts, or details the user missed or got wrong.
- Give clear, constructive feedback on what was missing or incorrect, and what was well explained.
- Generate 4-8 flashcards (Q&A) for the concepts the user missed or misunderstood, based on the study material.

Reply with ONLY a JSON object of this shape:
{\"feedback\": string, \"flashcards\": [{\"question\": string, \"answer\": string}]}
Flashcards cover missed or incorrect concepts only.";

// ---------------------------------------------------------------------------
// PromptBuilder
// ---------------------------------------------------------------------------

/// Builds `(system_msg, user_msg)` pairs for OpenAI-compatible chat APIs.
///
/// # Example
/// ```rust
/// use study_kit::llm::PromptBuilder;
///
/// let (system, user) = PromptBuilder::study_material("Photosynthesis converts light.");
/// assert!(system.contains("flashcards"));
/// assert!(user.contains("Photosynthesis"));
/// ```
pub struct PromptBuilder;

impl PromptBuilder {
    /// Prompt for summary + flashcards from (already truncated) text.
    pub fn study_material(text: &str) -> (String, String) {
        let user_msg = format!("Study Material:\n{text}");
        (STUDY_MATERIAL_SYSTEM.to_string(), user_msg)
    }

    /// Prompt comparing a learner's explanation against the material.
    pub fn feynman(material: &str, explanation: &str) -> (String, String) {
        let user_msg =
            format!("STUDY MATERIAL:\n{material}\n\nUSER EXPLANATION:\n{explanation}");
        (FEYNMAN_SYSTEM.to_string(), user_msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn study_material_prompt_embeds_text() {
        let (system, user) = PromptBuilder::study_material("The French Revolution began in 1789.");
        assert!(system.contains("\"summary\""));
        assert!(user.ends_with("The French Revolution began in 1789."));
    }

    #[test]
    fn feynman_prompt_orders_material_before_explanation() {
        let (system, user) = PromptBuilder::feynman("MATERIAL-X", "EXPLANATION-Y");
        assert!(system.contains("Feynman"));
        let m = user.find("MATERIAL-X").unwrap();
        let e = user.find("EXPLANATION-Y").unwrap();
        assert!(m < e);
    }
}
