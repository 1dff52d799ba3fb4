use std::path::Path;

use thiserror::Error;

use certlist_core::{BackendError, PageSource, PageText};
use certlist_parsing::{CertifiedListExtractor, ParsingConfig, ParsingError};

// Re-export domain types for convenience
pub use certlist_core::{ExtractionFailure, ExtractionResult, MemberRecord};

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("extraction error: {0}")]
    Parsing(#[from] ParsingError),
    #[cfg(not(feature = "pdf"))]
    #[error("PDF support not compiled in (enable the `pdf` feature of certlist-ingest)")]
    NoPdfSupport,
}

/// Page source for text dumps such as `pdftotext -layout` output, where pages
/// are separated by form feeds.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextFileSource;

impl PageSource for TextFileSource {
    fn extract_pages(&self, path: &Path) -> Result<Vec<PageText>, BackendError> {
        if !path.exists() {
            return Err(BackendError::NotFound(path.display().to_string()));
        }
        let bytes = std::fs::read(path)?;
        let text = String::from_utf8(bytes)
            .map_err(|e| BackendError::ExtractionError(format!("not valid UTF-8: {e}")))?;

        let mut pages: Vec<PageText> = text.split('\x0c').map(PageText::new).collect();
        // pdftotext ends the last page with a form feed too
        if pages.len() > 1 && pages.last().is_some_and(PageText::is_empty) {
            pages.pop();
        }
        Ok(pages)
    }
}

/// Whether a path is handled as a text dump rather than a PDF.
pub fn is_text_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("txt"))
}

/// Load per-page text from a `.txt` dump or a PDF.
pub fn load_pages(path: &Path) -> Result<Vec<PageText>, IngestError> {
    with_source(path, |source| {
        source.extract_pages(path).map_err(ParsingError::from)
    })
}

/// Extract committee members from a certified list file.
///
/// Dispatches on file extension:
/// - `.txt` → form-feed separated text dump
/// - anything else → PDF (requires `pdf` feature / mupdf)
pub fn extract_certified_list(path: &Path) -> Result<ExtractionResult, IngestError> {
    extract_certified_list_with_config(path, ParsingConfig::default())
}

/// Like [`extract_certified_list`], with a custom parsing configuration.
pub fn extract_certified_list_with_config(
    path: &Path,
    config: ParsingConfig,
) -> Result<ExtractionResult, IngestError> {
    let extractor = CertifiedListExtractor::with_config(config);
    with_source(path, |source| extractor.extract_from_source(path, source))
}

fn with_source<T>(
    path: &Path,
    f: impl FnOnce(&dyn PageSource) -> Result<T, ParsingError>,
) -> Result<T, IngestError> {
    if is_text_path(path) {
        tracing::debug!(path = %path.display(), "reading text dump");
        return f(&TextFileSource).map_err(IngestError::Parsing);
    }
    with_pdf_source(path, f)
}

#[cfg(feature = "pdf")]
fn with_pdf_source<T>(
    path: &Path,
    f: impl FnOnce(&dyn PageSource) -> Result<T, ParsingError>,
) -> Result<T, IngestError> {
    tracing::debug!(path = %path.display(), "reading PDF");
    let source = certlist_pdf_mupdf::MupdfSource::default();
    f(&source).map_err(IngestError::Parsing)
}

#[cfg(not(feature = "pdf"))]
fn with_pdf_source<T>(
    _path: &Path,
    _f: impl FnOnce(&dyn PageSource) -> Result<T, ParsingError>,
) -> Result<T, IngestError> {
    Err(IngestError::NoPdfSupport)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const LIST: &str = "BOARD OF ELECTIONS IN THE CITY OF NEW YORK\n\
        Kings County, Republican Party\n\
        The following were duly elected as Republican County Committee members\n\
        Petition   Office   ED/AD   Office Holder   Address   Tally   Entry Type\n\
        12   County Committee   5/44   Jane Roe   10 Court St Brooklyn, NY 11201   31   Contested\n\
        Page 1 of 2\n\
        \x0c\
        Petition   Office   ED/AD   Office Holder   Address   Tally   Entry Type\n\
        13   County Committee   6/44   Vacancy   Uncontested\n\
        Page 2 of 2\n\
        \x0c";

    fn write_temp(suffix: &str, contents: &[u8]) -> tempfile::NamedTempFile {
        let mut f = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        f.write_all(contents).unwrap();
        f
    }

    #[test]
    fn text_source_splits_on_form_feed() {
        let f = write_temp(".txt", LIST.as_bytes());
        let pages = TextFileSource.extract_pages(f.path()).unwrap();
        assert_eq!(pages.len(), 2);
        assert!(pages[0].text().contains("Kings County"));
        assert!(pages[1].text().starts_with("Petition"));
    }

    #[test]
    fn text_source_missing_file() {
        let err = TextFileSource
            .extract_pages(Path::new("/nonexistent/list.txt"))
            .unwrap_err();
        assert!(matches!(err, BackendError::NotFound(_)));
    }

    #[test]
    fn text_source_rejects_invalid_utf8() {
        let f = write_temp(".txt", &[0x66, 0xff, 0xfe]);
        let err = TextFileSource.extract_pages(f.path()).unwrap_err();
        assert!(matches!(err, BackendError::ExtractionError(_)));
    }

    #[test]
    fn txt_extension_dispatch() {
        assert!(is_text_path(Path::new("a/list.TXT")));
        assert!(!is_text_path(Path::new("a/list.pdf")));
        assert!(!is_text_path(Path::new("a/list")));
    }

    #[test]
    fn extract_from_text_dump() {
        let f = write_temp(".txt", LIST.as_bytes());
        let result = extract_certified_list(f.path()).unwrap();
        assert_eq!(result.county.as_deref(), Some("Kings County"));
        assert_eq!(result.party.as_deref(), Some("Republican"));
        assert_eq!(result.members.len(), 2);
        assert!(result.failures.is_empty());
        assert_eq!(result.members[0].tally, Some(31));
        assert!(result.members[1].is_vacancy());
        assert_eq!(result.stats.pages, 2);
    }

    #[test]
    fn load_pages_reports_missing_file() {
        let err = load_pages(Path::new("/nonexistent/list.txt")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/list.txt"));
    }
}
