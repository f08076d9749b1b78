//! Pipeline state machine.
//!
//! [`PipelineState`] drives the orchestrator.  Each state carries the
//! progress percentage that is published the moment the state is entered,
//! before its stage call goes out.

use crate::stage::Stage;

// ---------------------------------------------------------------------------
// PipelineState
// ---------------------------------------------------------------------------

/// States of the content pipeline.
///
/// ```text
/// Idle ──run──▶ Extracting (20) ──▶ Generating (50) ──▶ Rendering (75)
///                                                       ──▶ Synthesizing (90) ──▶ Done (100)
/// any non-Idle state ──stage error──▶ Failed(stage)
/// Done / Failed ──reset or next run──▶ Idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineState {
    /// No run in progress.
    #[default]
    Idle,

    /// Pulling text out of the document.
    Extracting,

    /// Waiting for the summary and flashcards.
    Generating,

    /// Building the downloadable guide.
    Rendering,

    /// Preparing the spoken summary.
    Synthesizing,

    /// Every stage succeeded.
    Done,

    /// The named stage failed; later stages were skipped.
    Failed(Stage),
}

impl PipelineState {
    /// State entered right before `stage` is called.
    pub fn entering(stage: Stage) -> Self {
        match stage {
            Stage::Extract => PipelineState::Extracting,
            Stage::Generate => PipelineState::Generating,
            Stage::Render => PipelineState::Rendering,
            Stage::Synthesize => PipelineState::Synthesizing,
        }
    }

    /// The stage this state is running (or failed in).
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineState::Extracting => Some(Stage::Extract),
            PipelineState::Generating => Some(Stage::Generate),
            PipelineState::Rendering => Some(Stage::Render),
            PipelineState::Synthesizing => Some(Stage::Synthesize),
            PipelineState::Failed(stage) => Some(*stage),
            PipelineState::Idle | PipelineState::Done => None,
        }
    }

    /// Progress percentage, 0–100.  A failed run stays at the value of the
    /// stage it failed in.
    ///
    /// ```
    /// use study_kit::pipeline::PipelineState;
    /// use study_kit::stage::Stage;
    ///
    /// assert_eq!(PipelineState::Idle.progress(), 0);
    /// assert_eq!(PipelineState::Rendering.progress(), 75);
    /// assert_eq!(PipelineState::Failed(Stage::Generate).progress(), 50);
    /// ```
    pub fn progress(&self) -> u8 {
        match self {
            PipelineState::Idle => 0,
            PipelineState::Extracting => 20,
            PipelineState::Generating => 50,
            PipelineState::Rendering => 75,
            PipelineState::Synthesizing => 90,
            PipelineState::Done => 100,
            PipelineState::Failed(stage) => PipelineState::entering(*stage).progress(),
        }
    }

    /// Returns `true` while a stage call is outstanding.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            PipelineState::Extracting
                | PipelineState::Generating
                | PipelineState::Rendering
                | PipelineState::Synthesizing
        )
    }

    /// `Done` or `Failed`; nothing more is published until the next run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed(_))
    }

    /// A short human-readable label for status output.
    pub fn label(&self) -> &'static str {
        match self {
            PipelineState::Idle => "Idle",
            PipelineState::Extracting => "Extracting text",
            PipelineState::Generating => "Generating study materials",
            PipelineState::Rendering => "Rendering study guide",
            PipelineState::Synthesizing => "Preparing audio summary",
            PipelineState::Done => "Done",
            PipelineState::Failed(_) => "Failed",
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
