//! Language-model module for study-kit.
//!
//! This module provides:
//! * [`ContentGenerator`]: async trait producing [`StudyMaterial`](crate::stage::StudyMaterial).
//! * [`ApiGenerator`]: OpenAI-compatible implementation of it.
//! * [`FeynmanReviewer`]: feedback on a learner's own explanation.
//! * [`PromptBuilder`]: system/user prompts for both.
//! * [`ChatClient`] / [`LlmError`]: shared transport and errors.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use study_kit::config::AppConfig;
//! use study_kit::llm::{ApiGenerator, ContentGenerator};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::load().unwrap().with_env_overrides();
//!     let generator = ApiGenerator::from_config(&config.llm);
//!
//!     let material = generator
//!         .generate("The Krebs cycle oxidises acetyl-CoA ...")
//!         .await
//!         .unwrap();
//!     println!("{}", material.summary);
//! }
//! ```

pub mod client;
pub mod feynman;
pub mod generator;
pub mod prompt;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use client::{ChatClient, LlmError};
pub use feynman::{FeynmanFeedback, FeynmanReviewer, MAX_REVIEW_CHARS};
pub use generator::{ApiGenerator, ContentGenerator};
pub use prompt::PromptBuilder;
