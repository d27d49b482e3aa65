//! # ragspace-extract
//!
//! Text extraction for the ragspace ingestion pipeline.
//!
//! Converts raw file bytes plus a MIME type into plain text:
//!
//! | MIME type | Behavior |
//! |-----------|----------|
//! | `text/*`, `application/json` | UTF-8 decode (lossy) |
//! | `application/pdf` | placeholder string, not an error |
//! | DOCX | placeholder string, not an error |
//! | anything else | empty string |
//!
//! Binary formats the pipeline cannot read yet are "ingested" with a
//! non-informative placeholder rather than failing the file, and the empty
//! string tells the caller there is nothing to ingest.

use tracing::debug;

/// MIME type of DOCX files.
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Placeholder stored for PDF files until a real extractor is wired in.
pub const PDF_PLACEHOLDER: &str = "[PDF content extraction not supported yet]";

/// Placeholder stored for DOCX files until a real extractor is wired in.
pub const DOCX_PLACEHOLDER: &str = "[DOCX content extraction not supported yet]";

/// Extract plain text from raw bytes by MIME type.
#[must_use]
pub fn extract_text(bytes: &[u8], mime_type: &str) -> String {
    if mime_type.starts_with("text/") || mime_type == "application/json" {
        return String::from_utf8_lossy(bytes).into_owned();
    }

    if mime_type == "application/pdf" {
        return PDF_PLACEHOLDER.to_string();
    }

    if mime_type == DOCX_MIME {
        return DOCX_PLACEHOLDER.to_string();
    }

    debug!("no extractor for mime type {mime_type}, yielding empty text");
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_passthrough() {
        let text = extract_text(b"hello world", "text/plain");
        assert_eq!(text, "hello world");
    }

    #[test]
    fn test_markdown_passthrough() {
        let text = extract_text(b"# Title\n\nBody", "text/markdown");
        assert_eq!(text, "# Title\n\nBody");
    }

    #[test]
    fn test_json_passthrough() {
        let text = extract_text(br#"{"k": 1}"#, "application/json");
        assert_eq!(text, r#"{"k": 1}"#);
    }

    #[test]
    fn test_invalid_utf8_is_lossy_not_fatal() {
        let text = extract_text(&[0x68, 0x69, 0xFF], "text/plain");
        assert!(text.starts_with("hi"));
    }

    #[test]
    fn test_pdf_yields_placeholder() {
        let text = extract_text(b"%PDF-1.7", "application/pdf");
        assert_eq!(text, PDF_PLACEHOLDER);
    }

    #[test]
    fn test_docx_yields_placeholder() {
        let text = extract_text(b"PK\x03\x04", DOCX_MIME);
        assert_eq!(text, DOCX_PLACEHOLDER);
    }

    #[test]
    fn test_unknown_mime_yields_empty() {
        assert_eq!(extract_text(&[0u8; 16], "application/octet-stream"), "");
        assert_eq!(extract_text(b"GIF89a", "image/gif"), "");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(extract_text(b"", "text/plain"), "");
    }
}
