//! Study-guide rendering.
//!
//! [`render_guide`] turns a [`StudyMaterial`] into a self-contained HTML page:
//! a header naming the source document, the summary, then every flashcard
//! in input order.  The output depends only on its inputs, so rendering the
//! same material twice yields identical bytes.

use std::fmt::Write as _;

use crate::stage::{Artifact, ArtifactKind, StudyMaterial};

/// Declared content type of a rendered guide.
pub const GUIDE_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Suggested download name of a rendered guide.
pub const GUIDE_FILENAME: &str = "study-guide.html";

const STYLE: &str = "\
body { font-family: Arial, sans-serif; line-height: 1.6; margin: 40px; color: #333; }
.header { text-align: center; border-bottom: 2px solid #333; padding-bottom: 20px; margin-bottom: 30px; }
.title { font-size: 24px; font-weight: bold; margin-bottom: 10px; }
.subtitle { font-size: 16px; color: #666; }
.section { margin-bottom: 30px; }
.section-title { font-size: 20px; font-weight: bold; margin-bottom: 15px; color: #2563eb; }
.flashcard { border: 1px solid #ddd; border-radius: 8px; padding: 15px; margin-bottom: 15px; background-color: #f9f9f9; }
.question { font-weight: bold; margin-bottom: 8px; color: #1f2937; }
.answer { color: #4b5563; }
.summary-text { text-align: justify; line-height: 1.8; }
";

/// Escape text for use inside HTML element content.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render `material` as the downloadable study guide.
///
/// Never fails; an empty flashcard list renders an empty section.
pub fn render_guide(material: &StudyMaterial, title: &str) -> Artifact {
    let mut html = String::with_capacity(4096 + material.summary.len());

    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<title>Study Guide</title>\n<style>\n");
    html.push_str(STYLE);
    html.push_str("</style>\n</head>\n<body>\n");

    let _ = write!(
        html,
        "<div class=\"header\">\n<div class=\"title\">Study Guide</div>\n\
         <div class=\"subtitle\">Generated from: {}</div>\n</div>\n",
        escape_html(title)
    );

    let _ = write!(
        html,
        "<div class=\"section\">\n<div class=\"section-title\">Summary</div>\n\
         <div class=\"summary-text\">{}</div>\n</div>\n",
        escape_html(&material.summary)
    );

    html.push_str("<div class=\"section\">\n<div class=\"section-title\">Flashcards</div>\n");
    for (index, card) in material.flashcards.iter().enumerate() {
        let _ = write!(
            html,
            "<div class=\"flashcard\">\n<div class=\"question\">Q{}: {}</div>\n\
             <div class=\"answer\">A: {}</div>\n</div>\n",
            index + 1,
            escape_html(&card.question),
            escape_html(&card.answer)
        );
    }
    html.push_str("</div>\n</body>\n</html>\n");

    Artifact {
        kind: ArtifactKind::Guide,
        content_type: GUIDE_CONTENT_TYPE.into(),
        filename: GUIDE_FILENAME.into(),
        bytes: html.into_bytes(),
    }
}
