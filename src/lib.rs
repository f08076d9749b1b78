//! study-kit: turn a document into a study kit and keep a pomodoro timer in
//! sync with its service.
//!
//! * [`pipeline`] runs extract → generate → render → synthesize over a
//!   [`stage::StageClient`].
//! * [`timer`] polls the remote pomodoro service.
//! * [`playback`] speaks the summary through a single owned engine.

pub mod config;
pub mod extract;
pub mod llm;
pub mod pipeline;
pub mod playback;
pub mod render;
pub mod stage;
pub mod timer;
