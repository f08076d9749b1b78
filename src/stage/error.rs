//! Uniform error type for every pipeline stage.
//!
//! Whatever the transport (HTTP service or in-process), a failing stage is
//! reported as a [`StageError`] whose `message` is the user-facing text.  The
//! remote service's `{"error": "..."}` payload wins when present; otherwise
//! the stage's default message is used.

use thiserror::Error;

use super::Stage;

// ---------------------------------------------------------------------------
// ErrorClass
// ---------------------------------------------------------------------------

/// Coarse error taxonomy shared by every surface of the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Missing or invalid caller input ("bad request").
    Input,
    /// A remote service failed or answered with something unusable.
    Upstream,
    /// The service could not be reached at all.
    Connectivity,
}

impl ErrorClass {
    /// HTTP-equivalent status for this class.
    pub fn status_code(self) -> u16 {
        match self {
            ErrorClass::Input => 400,
            ErrorClass::Upstream => 500,
            ErrorClass::Connectivity => 503,
        }
    }
}

// ---------------------------------------------------------------------------
// StageErrorKind
// ---------------------------------------------------------------------------

/// What went wrong inside a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageErrorKind {
    /// The stage received no payload at all (no file, no text).
    MissingInput,
    /// The document's media type is neither plain text nor PDF.
    UnsupportedType,
    /// Too little readable text survived extraction.
    EmptyContent,
    /// The remote service rejected the request with a 4xx status.
    Rejected,
    /// Content generation failed or its output violated the schema.
    Generation,
    /// Any other remote failure or malformed response.
    Upstream,
    /// The request never got a response.
    Transport,
}

impl StageErrorKind {
    pub fn class(self) -> ErrorClass {
        match self {
            StageErrorKind::MissingInput
            | StageErrorKind::UnsupportedType
            | StageErrorKind::EmptyContent
            | StageErrorKind::Rejected => ErrorClass::Input,
            StageErrorKind::Generation | StageErrorKind::Upstream => ErrorClass::Upstream,
            StageErrorKind::Transport => ErrorClass::Connectivity,
        }
    }
}

// ---------------------------------------------------------------------------
// StageError
// ---------------------------------------------------------------------------

/// A failed stage call.  `Display` is the bare user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct StageError {
    pub stage: Stage,
    pub kind: StageErrorKind,
    pub message: String,
}

impl StageError {
    pub fn new(stage: Stage, kind: StageErrorKind, message: impl Into<String>) -> Self {
        Self {
            stage,
            kind,
            message: message.into(),
        }
    }

    /// Error carrying the stage's default message.
    pub fn with_default_message(stage: Stage, kind: StageErrorKind) -> Self {
        Self::new(stage, kind, stage.default_message())
    }

    /// The request failed before a response arrived.
    pub fn transport(stage: Stage, cause: &reqwest::Error) -> Self {
        log::warn!("{}: request failed: {cause}", stage.label());
        Self::with_default_message(stage, StageErrorKind::Transport)
    }

    pub fn class(&self) -> ErrorClass {
        self.kind.class()
    }
}

/// Translate a non-success response into a [`StageError`].
///
/// `body` is the raw response body; when it is a JSON object with a
/// non-empty `error` string that text becomes the message verbatim.
pub fn translate_failure(stage: Stage, status: u16, body: &str) -> StageError {
    let remote_message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| json.get("error").and_then(|e| e.as_str()).map(str::to_owned))
        .filter(|msg| !msg.trim().is_empty());

    let kind = if (400..500).contains(&status) {
        StageErrorKind::Rejected
    } else if stage == Stage::Generate {
        StageErrorKind::Generation
    } else {
        StageErrorKind::Upstream
    };

    match remote_message {
        Some(message) => StageError::new(stage, kind, message),
        None => StageError::with_default_message(stage, kind),
    }
}
