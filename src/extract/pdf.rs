//! PDF decoding for the extract stage.
//!
//! The document is parsed with `lopdf` first.  Scanned, encrypted or
//! malformed files that yield no text fall back to a byte scan that keeps
//! only printable ASCII, which recovers text from uncompressed content
//! streams.  Either way the caller applies the readable-text threshold.

use lopdf::Document as PdfDocument;

/// Text found in a PDF, plus which decoder produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPdf {
    pub text: String,
    pub parsed: bool,
}

/// Decode `bytes`, preferring structural parsing over the byte scan.
pub fn decode_pdf(bytes: &[u8]) -> DecodedPdf {
    match parse_text(bytes) {
        Some(text) => DecodedPdf { text, parsed: true },
        None => DecodedPdf {
            text: readable_ascii(bytes),
            parsed: false,
        },
    }
}

/// Extract page text with `lopdf`.  `None` when parsing fails or no page
/// has any text.
fn parse_text(bytes: &[u8]) -> Option<String> {
    let doc = match PdfDocument::load_mem(bytes) {
        Ok(doc) => doc,
        Err(e) => {
            log::debug!("extract: lopdf could not parse document ({e}); using byte scan");
            return None;
        }
    };

    let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
    let mut text = String::new();
    for page in &pages {
        let page_text = doc.extract_text(&[*page]).unwrap_or_default();
        text.push_str(&page_text);
        if !page_text.ends_with('\n') && !page_text.is_empty() {
            text.push('\n');
        }
    }

    log::debug!("extract: lopdf read {} chars from {} pages", text.len(), pages.len());

    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Lossy-decode `bytes` and blank out everything that is not printable
/// ASCII or a newline, then collapse whitespace.
pub fn readable_ascii(bytes: &[u8]) -> String {
    let decoded = String::from_utf8_lossy(bytes);
    let filtered: String = decoded
        .chars()
        .map(|c| if c == '\n' || (' '..='~').contains(&c) { c } else { ' ' })
        .collect();
    crate::stage::normalize_whitespace(&filtered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Object, Stream};

    /// Build a one-page PDF that shows `text` in Helvetica.
    fn pdf_with_text(text: &str) -> Vec<u8> {
        let mut doc = PdfDocument::with_version("1.4");

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let content = format!(
            "BT /F1 12 Tf 72 700 Td ({}) Tj ET",
            text.replace('\\', "\\\\")
                .replace('(', "\\(")
                .replace(')', "\\)")
        );
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => resources_id,
            "Contents" => content_id,
        });
        let pages_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        });
        if let Ok(Object::Dictionary(dict)) = doc.get_object_mut(page_id) {
            dict.set("Parent", pages_id);
        }
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }

    #[test]
    fn parses_text_from_real_pdf() {
        let bytes = pdf_with_text("The mitochondria is the powerhouse of the cell");
        let decoded = decode_pdf(&bytes);
        assert!(decoded.parsed);
        assert!(
            decoded.text.contains("mitochondria") || decoded.text.contains("powerhouse"),
            "unexpected text: {:?}",
            decoded.text
        );
    }

    #[test]
    fn garbage_falls_back_to_byte_scan() {
        let decoded = decode_pdf(b"\x00\x01not a pdf\xff\xfe at all");
        assert!(!decoded.parsed);
        assert_eq!(decoded.text, "not a pdf at all");
    }

    #[test]
    fn byte_scan_blanks_non_ascii() {
        assert_eq!(readable_ascii("caf\u{e9}\tbar\r\nbaz".as_bytes()), "caf bar baz");
    }
}
