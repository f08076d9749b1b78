//! Request and response types exchanged with the pipeline stages.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{Stage, StageError, StageErrorKind};

/// Minimum number of characters an extracted text must keep after
/// whitespace normalisation.
pub const MIN_TEXT_CHARS: usize = 10;

/// Marker appended to text cut down by [`truncate_for_generation`].
pub const TRUNCATION_MARKER: &str = "...";

// ---------------------------------------------------------------------------
// MediaType
// ---------------------------------------------------------------------------

/// Document formats the extract stage understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    PlainText,
    Pdf,
}

impl MediaType {
    /// Parse a declared MIME type; parameters such as `charset` are ignored.
    ///
    /// ```
    /// use study_kit::stage::MediaType;
    ///
    /// assert_eq!(MediaType::parse("text/plain; charset=utf-8"), Some(MediaType::PlainText));
    /// assert_eq!(MediaType::parse("application/pdf"), Some(MediaType::Pdf));
    /// assert_eq!(MediaType::parse("image/png"), None);
    /// ```
    pub fn parse(declared: &str) -> Option<Self> {
        let essence = declared.split(';').next().unwrap_or("").trim();
        if essence.eq_ignore_ascii_case("text/plain") {
            Some(Self::PlainText)
        } else if essence.eq_ignore_ascii_case("application/pdf") {
            Some(Self::Pdf)
        } else {
            None
        }
    }

    /// Guess from a file extension (`.txt`, `.pdf`).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "txt" => Some(Self::PlainText),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            Self::PlainText => "text/plain",
            Self::Pdf => "application/pdf",
        }
    }
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// An uploaded document: raw bytes plus the media type its sender declared.
#[derive(Debug, Clone)]
pub struct Document {
    pub name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl Document {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, declaring its media type from the extension.
    /// Unknown extensions are declared as `application/octet-stream` and
    /// rejected later by the extract stage.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let media_type = MediaType::from_path(path)
            .map(MediaType::mime)
            .unwrap_or("application/octet-stream");
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".into());
        Ok(Self::new(name, media_type, bytes))
    }
}

// ---------------------------------------------------------------------------
// ExtractedText
// ---------------------------------------------------------------------------

/// Collapse every whitespace run to a single space and trim the ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalised plain text of at least [`MIN_TEXT_CHARS`] characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText(String);

impl ExtractedText {
    /// Normalise `raw` and enforce the minimum length.
    pub fn new(raw: &str) -> Result<Self, StageError> {
        let text = normalize_whitespace(raw);
        if text.chars().count() < MIN_TEXT_CHARS {
            return Err(StageError::new(
                Stage::Extract,
                StageErrorKind::EmptyContent,
                "File appears to be empty or contains no readable text",
            ));
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Cut `text` to its first `max_chars` characters and append
/// [`TRUNCATION_MARKER`]; shorter text is returned unchanged.
///
/// ```
/// use study_kit::stage::truncate_for_generation;
///
/// assert_eq!(truncate_for_generation("abcdef", 4), "abcd...");
/// assert_eq!(truncate_for_generation("abcd", 4), "abcd");
/// ```
pub fn truncate_for_generation(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{}", &text[..cut], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}

// ---------------------------------------------------------------------------
// StudyMaterial
// ---------------------------------------------------------------------------

/// One question/answer card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub question: String,
    pub answer: String,
}

/// Output of the generate stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyMaterial {
    pub summary: String,
    pub flashcards: Vec<Flashcard>,
}

// ---------------------------------------------------------------------------
// Artifact
// ---------------------------------------------------------------------------

/// What an artifact is for, so the UI knows which actions to offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// The downloadable study guide.
    Guide,
    /// Summary text meant to be spoken by the playback engine.
    Speech,
    /// Summary text with a note for readers without speech support.
    TextSummary,
}

/// A generated binary or text artifact with its declared type and name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub content_type: String,
    pub filename: String,
    pub bytes: Vec<u8>,
}

// ---------------------------------------------------------------------------
// SpokenSummary
// ---------------------------------------------------------------------------

/// Output of the synthesize stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpokenSummary {
    /// Speech is available; `text` is handed to the playback engine.
    Playable { text: String },
    /// Speech is unavailable; a readable text file stands in for audio.
    TextFallback { text: String },
}

impl SpokenSummary {
    pub const FILENAME: &'static str = "summary-text.txt";

    pub fn fallback(summary: &str) -> Self {
        Self::TextFallback {
            text: format!(
                "Audio Summary:\n\n{summary}\n\nNote: Use your device's text-to-speech feature to listen to this content."
            ),
        }
    }

    pub fn is_playable(&self) -> bool {
        matches!(self, Self::Playable { .. })
    }

    pub fn into_artifact(self) -> Artifact {
        let (kind, text) = match self {
            Self::Playable { text } => (ArtifactKind::Speech, text),
            Self::TextFallback { text } => (ArtifactKind::TextSummary, text),
        };
        Artifact {
            kind,
            content_type: "text/plain; charset=utf-8".into(),
            filename: Self::FILENAME.into(),
            bytes: text.into_bytes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracted_text_collapses_whitespace() {
        let text = ExtractedText::new("  Photosynthesis\n\n\tconverts   light  ").unwrap();
        assert_eq!(text.as_str(), "Photosynthesis converts light");
    }

    #[test]
    fn extracted_text_accepts_exactly_ten_chars() {
        assert!(ExtractedText::new("abcde fghi").is_ok());
    }

    #[test]
    fn extracted_text_rejects_short_input() {
        let err = ExtractedText::new("  abc \n de ").unwrap_err();
        assert_eq!(err.stage, Stage::Extract);
        assert_eq!(err.kind, StageErrorKind::EmptyContent);
    }

    #[test]
    fn extracted_text_counts_characters_not_bytes() {
        // 10 characters, 30 bytes.
        assert!(ExtractedText::new("สวัสดีครับ").is_ok());
        assert!(ExtractedText::new("ก ข ค ง จ").is_err());
    }

    #[test]
    fn truncation_keeps_exactly_max_chars_plus_marker() {
        let long = "x".repeat(8_500);
        let out = truncate_for_generation(&long, 8_000);
        assert_eq!(out.chars().count(), 8_000 + TRUNCATION_MARKER.len());
        assert!(out.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let out = truncate_for_generation("ééééé", 2);
        assert_eq!(out, "éé...");
    }

    #[test]
    fn fallback_contains_summary_and_note() {
        let spoken = SpokenSummary::fallback("Cells divide.");
        assert!(!spoken.is_playable());
        let artifact = spoken.into_artifact();
        let body = String::from_utf8(artifact.bytes).unwrap();
        assert!(body.contains("Cells divide."));
        assert!(body.contains("text-to-speech"));
        assert_eq!(artifact.kind, ArtifactKind::TextSummary);
        assert_eq!(artifact.filename, "summary-text.txt");
    }

    #[test]
    fn media_type_from_extension() {
        assert_eq!(MediaType::from_path(Path::new("notes.TXT")), Some(MediaType::PlainText));
        assert_eq!(MediaType::from_path(Path::new("a/b/lecture.pdf")), Some(MediaType::Pdf));
        assert_eq!(MediaType::from_path(Path::new("slides.pptx")), None);
    }
}
