//! Pipeline orchestrator: drives extract → generate → render → synthesize.
//!
//! [`PipelineOrchestrator`] owns the [`PipelineState`] and publishes every
//! transition to its subscribers over `tokio::sync::mpsc`.
//!
//! # Pipeline flow
//!
//! ```text
//! run(document, title)
//!   └─▶ Extracting   stages.extract(document)
//!         └─▶ Generating   stages.generate(truncate(text, 8000))
//!               └─▶ Rendering    stages.render(material, title)   → guide handle
//!                     └─▶ Synthesizing stages.synthesize(summary) → audio handle
//!                           ├─ Ok  → spoken summary
//!                           └─ Err → warn + text fallback
//!                                 └─▶ Done
//! any Err from extract / generate / render ─▶ Failed(stage), later stages skipped
//! ```
//!
//! Stages run strictly one after the other.  There is no cancellation and
//! no timeout here: a run ends when a stage succeeds or fails.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::stage::{
    truncate_for_generation, Document, SpokenSummary, Stage, StageClient, StageError,
};

use super::artifacts::{ArtifactStore, PipelineResult};
use super::state::PipelineState;

/// Characters of extracted text forwarded to the generate stage.
pub const DEFAULT_MAX_GENERATION_CHARS: usize = 8000;

// ---------------------------------------------------------------------------
// PipelineOrchestrator
// ---------------------------------------------------------------------------

/// Drives one document at a time through the four stages.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use study_kit::config::AppConfig;
/// use study_kit::pipeline::{PipelineOrchestrator, StudySession};
/// use study_kit::stage::{Document, HttpStageClient};
///
/// # async fn example() {
/// let config = AppConfig::default();
/// let stages = Arc::new(HttpStageClient::from_config(&config.service));
/// let mut orchestrator = PipelineOrchestrator::new(stages);
/// let mut progress = orchestrator.subscribe();
/// tokio::spawn(async move {
///     while let Some(state) = progress.recv().await {
///         println!("{}% {}", state.progress(), state.label());
///     }
/// });
///
/// let mut session = StudySession::new();
/// let doc = Document::new("notes.txt", "text/plain", b"...".to_vec());
/// match orchestrator.run(&doc, "notes.txt", session.store_mut()).await {
///     Ok(result) => session.install(result),
///     Err(e) => eprintln!("{e}"),
/// }
/// # }
/// ```
pub struct PipelineOrchestrator {
    stages: Arc<dyn StageClient>,
    max_generation_chars: usize,
    state: PipelineState,
    subscribers: Vec<mpsc::UnboundedSender<PipelineState>>,
}

impl PipelineOrchestrator {
    pub fn new(stages: Arc<dyn StageClient>) -> Self {
        Self {
            stages,
            max_generation_chars: DEFAULT_MAX_GENERATION_CHARS,
            state: PipelineState::Idle,
            subscribers: Vec::new(),
        }
    }

    pub fn with_max_generation_chars(mut self, max_chars: usize) -> Self {
        self.max_generation_chars = max_chars;
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn progress(&self) -> u8 {
        self.state.progress()
    }

    /// Receive every state entered from now on (the silent reset to `Idle`
    /// at the start of a run is not published).
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<PipelineState> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    /// Return to `Idle` after a finished or failed run.
    pub fn reset(&mut self) {
        self.state = PipelineState::Idle;
    }

    // -----------------------------------------------------------------------
    // State transitions
    // -----------------------------------------------------------------------

    /// The single place state changes; publishes to live subscribers.
    fn transition(&mut self, next: PipelineState) {
        log::debug!("pipeline: {:?} → {:?} ({}%)", self.state, next, next.progress());
        self.state = next;
        self.subscribers.retain(|tx| tx.send(next).is_ok());
    }

    fn fail(&mut self, stage: Stage, err: StageError) -> StageError {
        log::warn!("pipeline: {stage} failed: {}", err.message);
        self.transition(PipelineState::Failed(stage));
        err
    }

    // -----------------------------------------------------------------------
    // Run
    // -----------------------------------------------------------------------

    /// Process `document` end to end.
    ///
    /// Artifacts are written into `store`; the returned handles belong to
    /// the caller, who revokes them once the result is superseded.
    ///
    /// # Errors
    /// The first failing stage's [`StageError`], message unchanged.  The
    /// orchestrator is left in `Failed(stage)` with its progress frozen.
    pub async fn run(
        &mut self,
        document: &Document,
        title: &str,
        store: &mut ArtifactStore,
    ) -> Result<PipelineResult, StageError> {
        self.state = PipelineState::Idle;
        log::info!("pipeline: processing {:?} ({} bytes)", document.name, document.bytes.len());

        // ── 1. Extract ───────────────────────────────────────────────────
        self.transition(PipelineState::Extracting);
        let text = match self.stages.extract(document).await {
            Ok(text) => text,
            Err(e) => return Err(self.fail(Stage::Extract, e)),
        };

        // ── 2. Generate ──────────────────────────────────────────────────
        self.transition(PipelineState::Generating);
        let prompt_text = truncate_for_generation(text.as_str(), self.max_generation_chars);
        let material = match self.stages.generate(&prompt_text).await {
            Ok(material) => material,
            Err(e) => return Err(self.fail(Stage::Generate, e)),
        };
        log::info!(
            "pipeline: generated {} flashcards",
            material.flashcards.len()
        );

        // ── 3. Render ────────────────────────────────────────────────────
        self.transition(PipelineState::Rendering);
        let guide = match self.stages.render(&material, title).await {
            Ok(artifact) => store.insert(artifact),
            Err(e) => return Err(self.fail(Stage::Render, e)),
        };

        // ── 4. Synthesize (never fails the run) ──────────────────────────
        self.transition(PipelineState::Synthesizing);
        // A blank summary is rejected by the stage and lands in the fallback
        // too, so a finished run always carries an audio handle.
        let spoken = match self.stages.synthesize(&material.summary).await {
            Ok(spoken) => spoken,
            Err(e) => {
                log::warn!("pipeline: synthesize failed ({}), using text summary", e.message);
                SpokenSummary::fallback(&material.summary)
            }
        };
        let audio = Some(store.insert(spoken.into_artifact()));

        self.transition(PipelineState::Done);
        Ok(PipelineResult {
            material,
            guide,
            audio,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
