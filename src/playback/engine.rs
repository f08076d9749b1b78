//! Speech engine seam.
//!
//! [`SpeechEngine`] is the one audio resource the [`PlaybackController`]
//! drives.  [`ProcessSpeech`] speaks through an external TTS program run as
//! a child process; [`NoSpeech`] stands in when nothing is configured.
//!
//! [`PlaybackController`]: super::PlaybackController

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use thiserror::Error;

use crate::config::SpeechConfig;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("speech is not available on this system")]
    Unavailable,

    #[error("nothing to speak")]
    EmptyText,

    #[error("failed to start speech command: {0}")]
    Spawn(String),
}

/// Identifies one `speak` call so late events from a cancelled utterance can
/// be told apart from the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UtteranceId(pub u64);

/// Completion notices reported by an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    Ended(UtteranceId),
    Failed(UtteranceId),
}

impl PlaybackEvent {
    pub fn utterance(self) -> UtteranceId {
        match self {
            PlaybackEvent::Ended(id) | PlaybackEvent::Failed(id) => id,
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechEngine trait
// ---------------------------------------------------------------------------

/// A single speech output.
///
/// # Contract
///
/// - `speak` starts `text` and returns without waiting for it to finish.
/// - `cancel` silences whatever is playing; it is a no-op when idle.
/// - `poll_event` reports a finished or failed utterance once.
pub trait SpeechEngine: Send {
    fn is_available(&self) -> bool;

    fn speak(&mut self, id: UtteranceId, text: &str) -> Result<(), SpeechError>;

    fn cancel(&mut self);

    fn poll_event(&mut self) -> Option<PlaybackEvent> {
        None
    }
}

// ---------------------------------------------------------------------------
// NoSpeech
// ---------------------------------------------------------------------------

/// Engine for systems without speech output.
#[derive(Debug, Default)]
pub struct NoSpeech;

impl SpeechEngine for NoSpeech {
    fn is_available(&self) -> bool {
        false
    }

    fn speak(&mut self, _id: UtteranceId, _text: &str) -> Result<(), SpeechError> {
        Err(SpeechError::Unavailable)
    }

    fn cancel(&mut self) {}
}

// ---------------------------------------------------------------------------
// ProcessSpeech
// ---------------------------------------------------------------------------

/// Words per minute most TTS programs treat as normal speed.
const BASE_WPM: f32 = 175.0;

/// Speaks by running a configured program with the text as its last
/// argument, e.g. `espeak-ng -s {wpm} <text>`.
///
/// `{rate}` and `{wpm}` inside `args` are replaced with the configured rate
/// and the equivalent words per minute.
pub struct ProcessSpeech {
    program: String,
    args: Vec<String>,
    rate: f32,
    current: Option<(UtteranceId, Child)>,
}

impl ProcessSpeech {
    pub fn new(program: impl Into<String>, args: Vec<String>, rate: f32) -> Self {
        Self {
            program: program.into(),
            args,
            rate,
            current: None,
        }
    }

    /// `None` when no command is configured.
    pub fn from_config(config: &SpeechConfig) -> Option<Self> {
        let program = config.command.as_deref()?.trim();
        if program.is_empty() {
            return None;
        }
        Some(Self::new(program, config.args.clone(), config.rate))
    }

    fn expanded_args(&self) -> Vec<String> {
        let rate = format!("{}", self.rate);
        let wpm = format!("{}", (BASE_WPM * self.rate).round() as u32);
        self.args
            .iter()
            .map(|arg| arg.replace("{rate}", &rate).replace("{wpm}", &wpm))
            .collect()
    }
}

/// Locate `program` either as a path or on `PATH`.
fn find_program(program: &str) -> Option<PathBuf> {
    let direct = Path::new(program);
    if direct.components().count() > 1 {
        return direct.is_file().then(|| direct.to_path_buf());
    }
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

/// Kill `child` and reap it so no zombie is left behind.  Inside a tokio
/// runtime the wait runs on the blocking pool, never on a worker thread.
fn kill_and_reap(id: UtteranceId, mut child: Child) {
    if let Err(e) = child.kill() {
        log::debug!("playback: kill {id:?}: {e}");
    }
    if let Ok(Some(_)) = child.try_wait() {
        return;
    }
    match tokio::runtime::Handle::try_current() {
        Ok(runtime) => {
            runtime.spawn_blocking(move || {
                let _ = child.wait();
            });
        }
        Err(_) => {
            let _ = child.wait();
        }
    }
}

impl SpeechEngine for ProcessSpeech {
    fn is_available(&self) -> bool {
        find_program(&self.program).is_some()
    }

    fn speak(&mut self, id: UtteranceId, text: &str) -> Result<(), SpeechError> {
        if text.trim().is_empty() {
            return Err(SpeechError::EmptyText);
        }
        self.cancel();

        let child = Command::new(&self.program)
            .args(self.expanded_args())
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| SpeechError::Spawn(format!("{}: {e}", self.program)))?;

        log::debug!("playback: {id:?} speaking via {} (pid {})", self.program, child.id());
        self.current = Some((id, child));
        Ok(())
    }

    fn cancel(&mut self) {
        if let Some((id, child)) = self.current.take() {
            kill_and_reap(id, child);
            log::debug!("playback: cancelled {id:?}");
        }
    }

    fn poll_event(&mut self) -> Option<PlaybackEvent> {
        let (id, child) = self.current.as_mut()?;
        let id = *id;
        let event = match child.try_wait() {
            Ok(None) => return None,
            Ok(Some(status)) if status.success() => PlaybackEvent::Ended(id),
            Ok(Some(status)) => {
                log::warn!("playback: speech command exited with {status}");
                PlaybackEvent::Failed(id)
            }
            Err(e) => {
                log::warn!("playback: could not query speech command: {e}");
                PlaybackEvent::Failed(id)
            }
        };
        self.current = None;
        Some(event)
    }
}

impl Drop for ProcessSpeech {
    fn drop(&mut self) {
        self.cancel();
    }
}
