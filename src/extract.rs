//! Plain-text extraction for uploaded files.
//!
//! PDFs go through `pdf-extract`; text and markdown are decoded as UTF-8
//! (lossy). Anything else is rejected and the caller skips the file.

use std::path::Path;

use thiserror::Error;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_TEXT: &str = "text/plain";
pub const MIME_MARKDOWN: &str = "text/markdown";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported file type: {0}")]
    Unsupported(String),
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Content type for a path, judged by extension.
pub fn content_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_string_lossy().to_lowercase();
    match ext.as_str() {
        "pdf" => Some(MIME_PDF),
        "txt" => Some(MIME_TEXT),
        "md" | "markdown" => Some(MIME_MARKDOWN),
        _ => None,
    }
}

/// Extract plain text from file content of the given type.
pub fn extract_text(bytes: &[u8], content_type: &str) -> Result<String, ExtractError> {
    match content_type {
        MIME_PDF => {
            pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))
        }
        MIME_TEXT | MIME_MARKDOWN => Ok(String::from_utf8_lossy(bytes).into_owned()),
        other => Err(ExtractError::Unsupported(other.to_string())),
    }
}

/// Read and extract a file. Returns the text and its content type.
pub fn extract_file(path: &Path) -> Result<(String, &'static str), ExtractError> {
    let content_type = content_type_for(path)
        .ok_or_else(|| ExtractError::Unsupported(path.display().to_string()))?;
    let bytes = std::fs::read(path).map_err(|source| ExtractError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok((extract_text(&bytes, content_type)?, content_type))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_content_type_by_extension() {
        assert_eq!(content_type_for(Path::new("a/b/Notes.PDF")), Some(MIME_PDF));
        assert_eq!(content_type_for(Path::new("x.txt")), Some(MIME_TEXT));
        assert_eq!(content_type_for(Path::new("x.md")), Some(MIME_MARKDOWN));
        assert_eq!(content_type_for(Path::new("x.docx")), None);
        assert_eq!(content_type_for(Path::new("Makefile")), None);
    }

    #[test]
    fn test_text_is_decoded_lossily() {
        let text = extract_text(b"caf\xc3\xa9 \xff", MIME_TEXT).unwrap();
        assert!(text.starts_with("café "));
    }

    #[test]
    fn test_invalid_pdf_returns_error() {
        let err = extract_text(b"not a pdf", MIME_PDF).unwrap_err();
        assert!(matches!(err, ExtractError::Pdf(_)));
    }

    #[test]
    fn test_unsupported_file_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("slides.pptx");
        std::fs::write(&path, b"zip").unwrap();
        assert!(matches!(extract_file(&path), Err(ExtractError::Unsupported(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let err = extract_file(&tmp.path().join("gone.txt")).unwrap_err();
        assert!(matches!(err, ExtractError::Io { .. }));
    }
}
