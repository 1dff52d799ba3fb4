use std::path::Path;

use certlist_core::{
    ExtractionFailure, ExtractionResult, ExtractionStats, FailureReason, MemberRecord, PageSource,
    PageText, RowParseError,
};

use crate::ParsingError;
use crate::config::ParsingConfig;
use crate::page::{self, PageAnalysis};
use crate::row;

/// A configurable certified list extraction pipeline.
///
/// Holds a [`ParsingConfig`] and exposes each pipeline step as a method.
/// The default constructor uses built-in defaults; use
/// [`CertifiedListExtractor::with_config`] to supply custom patterns.
pub struct CertifiedListExtractor {
    config: ParsingConfig,
}

impl Default for CertifiedListExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl CertifiedListExtractor {
    /// Create an extractor with default configuration.
    pub fn new() -> Self {
        Self {
            config: ParsingConfig::default(),
        }
    }

    /// Create an extractor with a custom configuration.
    pub fn with_config(config: ParsingConfig) -> Self {
        Self { config }
    }

    /// Get a reference to the current config.
    pub fn config(&self) -> &ParsingConfig {
        &self.config
    }

    /// Find county, party and member table on one page.
    pub fn analyze_page(&self, page: &PageText) -> PageAnalysis {
        page::analyze_page_with_config(page, &self.config)
    }

    /// Parse a single member row against an already-known county.
    pub fn parse_row(&self, line: &str, county: &str) -> Result<MemberRecord, RowParseError> {
        row::parse_member_row_with_config(line, county, &self.config)
    }

    /// Read a document through `source`, then extract it.
    ///
    /// The result is named after the file name of `path`.
    pub fn extract_from_source(
        &self,
        path: &Path,
        source: &dyn PageSource,
    ) -> Result<ExtractionResult, ParsingError> {
        let pages = source.extract_pages(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Ok(self.extract_from_pages(&pages, &name))
    }

    /// Run the extraction over pages already split into text.
    ///
    /// Never fails: malformed rows end up in [`ExtractionResult::failures`]
    /// next to whatever rows parsed.
    pub fn extract_from_pages(&self, pages: &[PageText], source: &str) -> ExtractionResult {
        let result = pages
            .iter()
            .enumerate()
            .fold(Accumulator::default(), |acc, (index, page)| {
                acc.absorb(self, index + 1, page)
            })
            .finish(source);

        tracing::info!(
            source,
            county = result.county.as_deref().unwrap_or(""),
            party = result.party.as_deref().unwrap_or(""),
            members = result.members.len(),
            failures = result.failures.len(),
            "certified list extracted"
        );
        result
    }
}

/// State threaded through the page fold.
#[derive(Default)]
struct Accumulator {
    county: Option<String>,
    party: Option<String>,
    members: Vec<MemberRecord>,
    failures: Vec<ExtractionFailure>,
    stats: ExtractionStats,
}

impl Accumulator {
    fn absorb(mut self, extractor: &CertifiedListExtractor, page_number: usize, page: &PageText) -> Self {
        let analysis = extractor.analyze_page(page);
        self.stats.pages += 1;

        adopt(&mut self.county, analysis.county, "county", page_number);
        adopt(&mut self.party, analysis.party, "party", page_number);

        let Some(region) = analysis.table else {
            tracing::debug!(page = page_number, "no member table on page");
            return self;
        };
        self.stats.pages_with_table += 1;

        let rows = region.rows(page);
        tracing::debug!(page = page_number, rows = rows.len(), "member table found");

        for line in rows {
            self.stats.rows_seen += 1;

            let Some(county) = self.county.as_deref() else {
                self.fail(page_number, line, FailureReason::MissingCountyContext);
                continue;
            };

            match extractor.parse_row(line, county) {
                Ok(member) => {
                    self.stats.rows_parsed += 1;
                    self.members.push(member);
                }
                Err(error) => {
                    tracing::debug!(page = page_number, %error, "row rejected");
                    self.fail(page_number, line, FailureReason::Row { error });
                }
            }
        }

        self
    }

    fn fail(&mut self, page: usize, line: &str, reason: FailureReason) {
        self.stats.rows_failed += 1;
        self.failures.push(ExtractionFailure {
            page,
            line: line.to_string(),
            reason,
        });
    }

    /// Backfill document-wide context onto every member.
    ///
    /// Party is applied here rather than per page: the party statement may be
    /// printed after some member rows.
    fn finish(mut self, source: &str) -> ExtractionResult {
        for member in &mut self.members {
            member.party = self.party.clone();
            member.data_source = source.to_string();
        }

        if self.stats.rows_failed > 0 {
            tracing::warn!(
                source,
                failed = self.stats.rows_failed,
                seen = self.stats.rows_seen,
                "some member rows could not be parsed"
            );
        }

        ExtractionResult {
            county: self.county,
            party: self.party,
            members: self.members,
            failures: self.failures,
            source: source.to_string(),
            stats: self.stats,
        }
    }
}

/// First value seen wins; later disagreeing values are reported, not applied.
fn adopt(slot: &mut Option<String>, found: Option<String>, what: &str, page: usize) {
    let Some(found) = found else { return };
    match slot {
        None => {
            tracing::debug!(page, value = %found, "{what} declared");
            *slot = Some(found);
        }
        Some(current) if *current != found => {
            tracing::warn!(page, kept = %current, ignored = %found, "conflicting {what} declaration");
        }
        Some(_) => {}
    }
}
