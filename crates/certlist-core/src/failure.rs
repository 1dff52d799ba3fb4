use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Positional field of a member row, named in shape diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowField {
    PetitionNumber,
    Office,
    District,
    OfficeHolder,
    Address,
    Tally,
    EntryType,
}

impl fmt::Display for RowField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PetitionNumber => "petition number",
            Self::Office => "office",
            Self::District => "ED/AD",
            Self::OfficeHolder => "office holder",
            Self::Address => "address",
            Self::Tally => "tally",
            Self::EntryType => "entry type",
        };
        f.write_str(name)
    }
}

/// Why a single member row could not be turned into a record.
///
/// Every variant keeps the full raw line: root-causing a bad row means
/// reading the original text.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowParseError {
    #[error("office field not valid: {} (row: {line})", found_or_end(.found))]
    OfficeFieldInvalid { found: Option<String>, line: String },
    #[error("ED/AD field not valid: {} (row: {line})", found_or_end(.found))]
    DistrictFieldInvalid { found: Option<String>, line: String },
    #[error("tally field not valid: {} (row: {line})", found_or_end(.found))]
    TallyFieldInvalid { found: Option<String>, line: String },
    #[error("unexpected field shape: expected {expected} (row: {line})")]
    UnexpectedFieldShape { expected: RowField, line: String },
    #[error("county not provided for member row: {line}")]
    MissingCounty { line: String },
}

fn found_or_end(found: &Option<String>) -> String {
    match found {
        Some(f) => format!("{f:?}"),
        None => "<end of row>".to_string(),
    }
}

impl RowParseError {
    /// The raw line that failed.
    pub fn line(&self) -> &str {
        match self {
            Self::OfficeFieldInvalid { line, .. }
            | Self::DistrictFieldInvalid { line, .. }
            | Self::TallyFieldInvalid { line, .. }
            | Self::UnexpectedFieldShape { line, .. }
            | Self::MissingCounty { line } => line,
        }
    }

    /// The field whose expectation was violated.
    pub fn field(&self) -> Option<RowField> {
        match self {
            Self::OfficeFieldInvalid { .. } => Some(RowField::Office),
            Self::DistrictFieldInvalid { .. } => Some(RowField::District),
            Self::TallyFieldInvalid { .. } => Some(RowField::Tally),
            Self::UnexpectedFieldShape { expected, .. } => Some(*expected),
            Self::MissingCounty { .. } => None,
        }
    }

    /// Short stable identifier, used in exports and storage.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::OfficeFieldInvalid { .. } => "office_field_invalid",
            Self::DistrictFieldInvalid { .. } => "district_field_invalid",
            Self::TallyFieldInvalid { .. } => "tally_field_invalid",
            Self::UnexpectedFieldShape { .. } => "unexpected_field_shape",
            Self::MissingCounty { .. } => "missing_county",
        }
    }
}

/// Diagnostic attached to an [`ExtractionFailure`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FailureReason {
    /// The row itself was malformed.
    Row { error: RowParseError },
    /// A table region appeared before any page declared the county.
    MissingCountyContext,
}

impl FailureReason {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Row { error } => error.kind(),
            Self::MissingCountyContext => "missing_county_context",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Row { error } => write!(f, "{error}"),
            Self::MissingCountyContext => {
                f.write_str("table region found before any county was declared")
            }
        }
    }
}

/// One row that did not make it into the member list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionFailure {
    /// 1-based page number the row appeared on.
    pub page: usize,
    pub line: String,
    pub reason: FailureReason,
}
