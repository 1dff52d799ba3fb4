use std::path::Path;

use thiserror::Error;

pub mod config;
pub mod extractor;
pub mod page;
pub mod row;

pub use config::{ListOverride, ParsingConfig, ParsingConfigBuilder};
pub use extractor::CertifiedListExtractor;
pub use page::{PageAnalysis, TableRegion};
// Re-export domain types from core (canonical definitions live there)
pub use certlist_core::{
    BackendError, ExtractionFailure, ExtractionResult, FailureReason, MemberRecord, PageSource,
    PageText, RowParseError,
};

#[derive(Error, Debug)]
pub enum ParsingError {
    #[error("backend error: {0}")]
    Backend(#[from] certlist_core::BackendError),
}

/// Extract committee members from a certified list using the given source
/// for text extraction.
///
/// Pipeline:
/// 1. Extract per-page text via `source`
/// 2. Per page, pick up county and party declarations and locate the member table
/// 3. Parse every table row against the county known so far
/// 4. Backfill the document's party and source name onto every member
pub fn extract_certified_list(
    path: &Path,
    source: &dyn PageSource,
) -> Result<ExtractionResult, ParsingError> {
    CertifiedListExtractor::new().extract_from_source(path, source)
}
