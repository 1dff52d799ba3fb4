use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("document not found: {0}")]
    NotFound(String),
    #[error("failed to open document: {0}")]
    OpenError(String),
    #[error("failed to extract text: {0}")]
    ExtractionError(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The text of one page, as an ordered sequence of non-blank lines.
///
/// Blank and whitespace-only lines are dropped on construction, so marker
/// indices found by the page analyzer always refer to lines with content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageText {
    lines: Vec<String>,
}

impl PageText {
    pub fn new(text: &str) -> Self {
        Self::from_lines(text.lines())
    }

    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let lines = lines
            .into_iter()
            .map(Into::into)
            .filter(|l: &String| !l.trim().is_empty())
            .collect();
        Self { lines }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The page re-joined with `\n`, for patterns that may span a line break.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// Trait for document ingestion backends.
///
/// Implementors turn a document on disk into its pages of linearized text;
/// everything after that (marker detection, row parsing, aggregation) lives in
/// `certlist_parsing::CertifiedListExtractor`.
pub trait PageSource: Send + Sync {
    /// Extract the text of every page, in document order.
    fn extract_pages(&self, path: &Path) -> Result<Vec<PageText>, BackendError>;
}
