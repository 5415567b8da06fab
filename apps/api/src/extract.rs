//! Resume text extraction.
//!
//! PDF and DOCX are the supported formats. Extraction never fails the
//! pipeline: callers collapse any non-text outcome to an empty string via
//! [`Extraction::into_text`], and the distinction between "blank document"
//! and "broken document" stays here, in the logs.

use std::path::Path;

use docx_rs::{DocumentChild, ParagraphChild, RunChild};
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("pdf parsing failed for {path}: {detail}")]
    Pdf { path: String, detail: String },
    #[error("docx parsing failed for {path}: {detail}")]
    Docx { path: String, detail: String },
}

/// Outcome of one extraction attempt.
///
/// `Unsupported` and `Failed` both read as "no text" downstream, but they are
/// different conditions: the first is a document we never try to parse, the
/// second is a parse that went wrong.
#[derive(Debug)]
pub enum Extraction {
    Text(String),
    Unsupported(String),
    Failed(ExtractError),
}

impl Extraction {
    /// Collapses to the plain-text contract: no text means empty string.
    pub fn into_text(self) -> String {
        match self {
            Extraction::Text(text) => text,
            Extraction::Unsupported(_) | Extraction::Failed(_) => String::new(),
        }
    }
}

/// Extracts resume text from a file on disk, routing on the extension.
pub fn extract_resume_text(path: &Path) -> Extraction {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    let result = match extension.as_str() {
        "pdf" => extract_pdf(path),
        "docx" => extract_docx(path),
        _ => {
            warn!(
                "unsupported resume extension {:?} for {}",
                extension,
                path.display()
            );
            return Extraction::Unsupported(extension);
        }
    };

    match result {
        Ok(text) => {
            info!(
                "extracted {} chars from {}",
                text.chars().count(),
                path.display()
            );
            Extraction::Text(text)
        }
        Err(e) => {
            error!("resume extraction failed for {}: {e}", path.display());
            Extraction::Failed(e)
        }
    }
}

/// Per-page PDF extraction. Pages with no text contribute nothing.
fn extract_pdf(path: &Path) -> Result<String, ExtractError> {
    let pages = pdf_extract::extract_text_by_pages(path).map_err(|e| ExtractError::Pdf {
        path: path.display().to_string(),
        detail: e.to_string(),
    })?;

    let mut text = String::new();
    for page in &pages {
        if page.is_empty() {
            continue;
        }
        text.push_str(page);
        text.push('\n');
    }
    Ok(text.trim().to_string())
}

/// Walks the DOCX body and joins paragraph text with newlines.
fn extract_docx(path: &Path) -> Result<String, ExtractError> {
    let data = std::fs::read(path).map_err(|source| ExtractError::Read {
        path: path.display().to_string(),
        source,
    })?;

    let docx = docx_rs::read_docx(&data).map_err(|e| ExtractError::Docx {
        path: path.display().to_string(),
        detail: e.to_string(),
    })?;

    let mut paragraphs: Vec<String> = Vec::new();
    for child in docx.document.children {
        if let DocumentChild::Paragraph(paragraph) = child {
            let mut line = String::new();
            for paragraph_child in paragraph.children {
                if let ParagraphChild::Run(run) = paragraph_child {
                    for run_child in run.children {
                        if let RunChild::Text(text) = run_child {
                            line.push_str(&text.text);
                        }
                    }
                }
            }
            paragraphs.push(line);
        }
    }
    Ok(paragraphs.join("\n").trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use docx_rs::{Docx, Paragraph, Run};
    use std::fs;
    use tempfile::tempdir;

    fn write_docx(path: &Path, paragraphs: &[&str]) {
        let mut docx = Docx::new();
        for paragraph in paragraphs {
            docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(*paragraph)));
        }
        let file = fs::File::create(path).unwrap();
        docx.build().pack(file).unwrap();
    }

    #[test]
    fn test_docx_paragraphs_join_with_newlines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("resume.docx");
        write_docx(&path, &["Ada Lovelace", "Rust, Postgres, Kubernetes"]);

        let extraction = extract_resume_text(&path);
        let Extraction::Text(text) = extraction else {
            panic!("expected text, got {extraction:?}");
        };
        assert_eq!(text, "Ada Lovelace\nRust, Postgres, Kubernetes");
    }

    #[test]
    fn test_extension_routing_is_case_insensitive() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("RESUME.DOCX");
        write_docx(&path, &["Ada Lovelace"]);

        assert!(matches!(extract_resume_text(&path), Extraction::Text(_)));
    }

    #[test]
    fn test_empty_docx_extracts_empty_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("blank.docx");
        write_docx(&path, &[]);

        let Extraction::Text(text) = extract_resume_text(&path) else {
            panic!("expected text outcome");
        };
        assert_eq!(text, "");
    }

    #[test]
    fn test_unsupported_extension_is_not_parsed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("resume.txt");
        fs::write(&path, "plain text resume").unwrap();

        let extraction = extract_resume_text(&path);
        assert!(matches!(extraction, Extraction::Unsupported(ref ext) if ext == "txt"));
        assert_eq!(extraction.into_text(), "");
    }

    #[test]
    fn test_missing_extension_is_unsupported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("resume");
        fs::write(&path, "bytes").unwrap();

        assert!(matches!(
            extract_resume_text(&path),
            Extraction::Unsupported(_)
        ));
    }

    #[test]
    fn test_corrupt_pdf_fails_and_collapses_to_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        fs::write(&path, b"%PDF-not-really").unwrap();

        let extraction = extract_resume_text(&path);
        assert!(matches!(extraction, Extraction::Failed(ExtractError::Pdf { .. })));
        assert_eq!(extraction.into_text(), "");
    }

    #[test]
    fn test_corrupt_docx_fails_and_collapses_to_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.docx");
        fs::write(&path, b"not a zip archive").unwrap();

        let extraction = extract_resume_text(&path);
        assert!(matches!(extraction, Extraction::Failed(ExtractError::Docx { .. })));
        assert_eq!(extraction.into_text(), "");
    }

    #[test]
    fn test_missing_pdf_reports_failure() {
        let extraction = extract_resume_text(Path::new("/nonexistent/resume.pdf"));
        assert!(matches!(extraction, Extraction::Failed(_)));
    }
}
