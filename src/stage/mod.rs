//! Stage clients: the request/response contract of each pipeline step.
//!
//! ```text
//! Document ──extract──▶ ExtractedText ──generate──▶ StudyMaterial
//!                                                      │
//!                     Artifact (guide) ◀──render───────┤
//!                     SpokenSummary   ◀──synthesize────┘ (summary text)
//! ```
//!
//! [`StageClient`] is implemented by:
//! * [`HttpStageClient`]: calls the study-kit web service (`/api/...`).
//! * [`LocalStageClient`]: runs extraction and rendering in-process and
//!   talks to an OpenAI-compatible model for generation.
//!
//! Both report failures as [`StageError`], built through the same
//! translation rules so the orchestrator never cares which one it drives.

pub mod error;
pub mod http;
pub mod local;
pub mod types;

use async_trait::async_trait;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use error::{translate_failure, ErrorClass, StageError, StageErrorKind};
pub use http::HttpStageClient;
pub use local::LocalStageClient;
pub use types::{
    normalize_whitespace, truncate_for_generation, Artifact, ArtifactKind, Document,
    ExtractedText, Flashcard, MediaType, SpokenSummary, StudyMaterial, MIN_TEXT_CHARS,
    TRUNCATION_MARKER,
};

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// One remote-call step of the content pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Extract,
    Generate,
    Render,
    Synthesize,
}

impl Stage {
    pub fn label(self) -> &'static str {
        match self {
            Stage::Extract => "extract",
            Stage::Generate => "generate-content",
            Stage::Render => "render",
            Stage::Synthesize => "synthesize",
        }
    }

    /// Message reported when the service gives no reason of its own.
    pub fn default_message(self) -> &'static str {
        match self {
            Stage::Extract => "Failed to extract text from file",
            Stage::Generate => "Failed to generate study materials",
            Stage::Render => "Failed to generate PDF",
            Stage::Synthesize => "Failed to generate audio",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// StageClient
// ---------------------------------------------------------------------------

/// Invokes the four pipeline stages.
///
/// Implementors must be `Send + Sync` so they can be shared as
/// `Arc<dyn StageClient>`.  A client performs the call and nothing else: it
/// never touches orchestrator or UI state.
#[async_trait]
pub trait StageClient: Send + Sync {
    /// Pull plain text out of an uploaded document.
    async fn extract(&self, document: &Document) -> Result<ExtractedText, StageError>;

    /// Turn (already truncated) text into a summary and flashcards.
    async fn generate(&self, text: &str) -> Result<StudyMaterial, StageError>;

    /// Render the downloadable study guide.
    async fn render(&self, material: &StudyMaterial, title: &str)
        -> Result<Artifact, StageError>;

    /// Prepare the summary for spoken playback.
    async fn synthesize(&self, text: &str) -> Result<SpokenSummary, StageError>;
}

/// Shared input check for the synthesize stage.
pub(crate) fn require_speech_text(text: &str) -> Result<(), StageError> {
    if text.trim().is_empty() {
        return Err(StageError::new(
            Stage::Synthesize,
            StageErrorKind::MissingInput,
            "No text provided for audio generation",
        ));
    }
    Ok(())
}
