use serde::{Deserialize, Serialize};

pub mod backend;
pub mod config_file;
pub mod failure;

// Re-export for convenience
pub use backend::{BackendError, PageSource, PageText};
pub use failure::{ExtractionFailure, FailureReason, RowField, RowParseError};

/// Jurisdiction every record is attributed to unless configured otherwise.
pub const DEFAULT_STATE: &str = "NY";

/// One county committee seat as printed in a certified list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecord {
    pub petition_number: Option<u32>,
    pub office: String,
    /// The composite `ED/AD` field exactly as printed.
    pub ed_ad: String,
    pub electoral_district: u32,
    pub assembly_district: u32,
    /// Holder's name, or the vacancy sentinel for an unfilled seat.
    pub office_holder: String,
    pub address: Option<String>,
    pub tally: Option<u32>,
    /// Free-text classification such as "Uncontested". Empty when the row
    /// ended before it.
    pub entry_type: String,
    pub county: String,
    /// Document-wide party, backfilled after all pages are read.
    pub party: Option<String>,
    pub state: String,
    pub data_source: String,
    /// Set when the office holder column carried the vacancy sentinel.
    #[serde(default)]
    pub vacancy: bool,
}

impl MemberRecord {
    pub fn is_vacancy(&self) -> bool {
        self.vacancy
    }
}

/// Counters describing one extraction run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    pub pages: usize,
    pub pages_with_table: usize,
    pub rows_seen: usize,
    pub rows_parsed: usize,
    pub rows_failed: usize,
}

/// Result of extracting one certified list document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// First county declared anywhere in the document.
    pub county: Option<String>,
    /// First party declared anywhere in the document.
    pub party: Option<String>,
    pub members: Vec<MemberRecord>,
    pub failures: Vec<ExtractionFailure>,
    /// Identifier of the source document (usually its file name).
    pub source: String,
    pub stats: ExtractionStats,
}

impl ExtractionResult {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn vacancies(&self) -> usize {
        self.members.iter().filter(|m| m.is_vacancy()).count()
    }
}
