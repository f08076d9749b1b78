//! Spoken playback of the study summary.
//!
//! [`PlaybackController`] owns one [`SpeechEngine`] and guarantees that at
//! most one utterance is active at a time.

pub mod controller;
pub mod engine;

pub use controller::{PlaybackController, PlaybackState};
pub use engine::{
    NoSpeech, PlaybackEvent, ProcessSpeech, SpeechEngine, SpeechError, UtteranceId,
};
