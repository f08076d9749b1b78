//! Text extraction for uploaded documents.
//!
//! | Media type        | Decoder                           | Checks              |
//! |-------------------|-----------------------------------|---------------------|
//! | `text/plain`      | lossy UTF-8                       | ≥ 10 chars          |
//! | `application/pdf` | `lopdf`, byte scan as fallback    | ≥ 50, then ≥ 10     |
//! | anything else     | n/a                               | `UnsupportedType`   |
//!
//! The PDF path rejects documents with fewer than
//! [`MIN_PDF_READABLE_CHARS`] readable characters before the general
//! [`ExtractedText`] check runs.

pub mod pdf;

use crate::stage::{
    normalize_whitespace, Document, ExtractedText, MediaType, Stage, StageError, StageErrorKind,
};

pub use pdf::{decode_pdf, readable_ascii, DecodedPdf};

/// Readable characters a PDF must yield before it is considered text-based.
pub const MIN_PDF_READABLE_CHARS: usize = 50;

/// Extract normalised text from `document`.
///
/// # Errors
/// * `MissingInput`: the document has no bytes.
/// * `UnsupportedType`: neither plain text nor PDF.
/// * `EmptyContent`: too little readable text.
pub fn extract_document(document: &Document) -> Result<ExtractedText, StageError> {
    if document.bytes.is_empty() {
        return Err(StageError::new(
            Stage::Extract,
            StageErrorKind::MissingInput,
            "No file provided",
        ));
    }

    let media_type = MediaType::parse(&document.media_type).ok_or_else(|| {
        log::debug!(
            "extract: rejecting {:?} with media type {:?}",
            document.name,
            document.media_type
        );
        StageError::new(
            Stage::Extract,
            StageErrorKind::UnsupportedType,
            "Unsupported file type. Please upload a PDF or text file.",
        )
    })?;

    let raw = match media_type {
        MediaType::PlainText => String::from_utf8_lossy(&document.bytes).into_owned(),
        MediaType::Pdf => {
            let decoded = decode_pdf(&document.bytes);
            let readable = normalize_whitespace(&decoded.text);
            if readable.chars().count() < MIN_PDF_READABLE_CHARS {
                return Err(StageError::new(
                    Stage::Extract,
                    StageErrorKind::EmptyContent,
                    "Could not extract readable text from PDF. Please try a text-based PDF or convert to .txt format.",
                ));
            }
            readable
        }
    };

    let text = ExtractedText::new(&raw)?;
    log::debug!(
        "extract: {:?} yielded {} chars",
        document.name,
        text.as_str().chars().count()
    );
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(media_type: &str, bytes: &[u8]) -> Document {
        Document::new("upload", media_type, bytes.to_vec())
    }

    #[test]
    fn plain_text_of_ten_chars_succeeds() {
        let text = extract_document(&doc("text/plain", b"0123456789")).unwrap();
        assert_eq!(text.as_str(), "0123456789");
    }

    #[test]
    fn plain_text_of_five_chars_is_empty_content() {
        let err = extract_document(&doc("text/plain", b"hello")).unwrap_err();
        assert_eq!(err.kind, StageErrorKind::EmptyContent);
        assert_eq!(
            err.message,
            "File appears to be empty or contains no readable text"
        );
    }

    #[test]
    fn whitespace_only_text_is_empty_content() {
        let err = extract_document(&doc("text/plain", b" \n\t \n    \r\n  ")).unwrap_err();
        assert_eq!(err.kind, StageErrorKind::EmptyContent);
    }

    #[test]
    fn no_bytes_is_missing_input() {
        let err = extract_document(&doc("text/plain", b"")).unwrap_err();
        assert_eq!(err.kind, StageErrorKind::MissingInput);
        assert_eq!(err.message, "No file provided");
    }

    #[test]
    fn unknown_media_type_is_unsupported() {
        let err = extract_document(&doc("image/png", b"\x89PNG....")).unwrap_err();
        assert_eq!(err.kind, StageErrorKind::UnsupportedType);
        assert_eq!(err.stage, Stage::Extract);
    }

    #[test]
    fn pdf_below_fifty_readable_chars_fails_early() {
        // 28 readable chars: would pass the 10-char check but not the PDF one.
        let bytes = b"\x00\x00abcdefghij klmnopqrst uvwxyz\xff\xff";
        let err = extract_document(&doc("application/pdf", bytes)).unwrap_err();
        assert_eq!(err.kind, StageErrorKind::EmptyContent);
        assert!(err.message.starts_with("Could not extract readable text from PDF"));
    }

    #[test]
    fn pdf_byte_scan_with_enough_text_succeeds() {
        let mut bytes = vec![0u8, 0xff, 0xfe];
        bytes.extend_from_slice(b"Newton's first law: an object at rest stays at rest unless acted upon.");
        bytes.extend_from_slice(&[0x00, 0x9f]);

        let text = extract_document(&doc("application/pdf", &bytes)).unwrap();
        assert_eq!(
            text.as_str(),
            "Newton's first law: an object at rest stays at rest unless acted upon."
        );
    }

    #[test]
    fn declared_charset_is_accepted() {
        let text =
            extract_document(&doc("text/plain; charset=utf-8", b"Enough plain text here")).unwrap();
        assert_eq!(text.as_str(), "Enough plain text here");
    }
}
