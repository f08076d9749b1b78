//! Pipeline orchestrator module for study-kit.
//!
//! This module sequences the four stages of a run and keeps the artifacts
//! they produce.
//!
//! # Architecture
//!
//! ```text
//! Document
//!    │
//!    ▼
//! PipelineOrchestrator::run()  ── Arc<dyn StageClient> (HTTP or local)
//!    │
//!    ├─ Extracting   20%
//!    ├─ Generating   50%
//!    ├─ Rendering    75%  → ArtifactStore::insert(guide)
//!    ├─ Synthesizing 90%  → ArtifactStore::insert(audio | text fallback)
//!    └─ Done        100%
//!
//! PipelineState (mpsc) ──▶ subscribers (CLI progress line)
//! PipelineResult ──▶ StudySession::install()  (revokes the previous result)
//! ```

pub mod artifacts;
pub mod runner;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use artifacts::{ArtifactHandle, ArtifactStore, PipelineResult, StudySession};
pub use runner::{PipelineOrchestrator, DEFAULT_MAX_GENERATION_CHARS};
pub use state::PipelineState;
