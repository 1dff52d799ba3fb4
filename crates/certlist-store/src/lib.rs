//! SQLite persistence for extracted certified lists.
//!
//! Stores one row per imported document, its member records and the rows it
//! failed to parse. Records are checked against the storage schema before
//! anything is written: a document either lands whole or not at all.

mod db;
mod query;

use std::path::{Path, PathBuf};

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use certlist_core::{ExtractionResult, MemberRecord};

pub use query::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, MemberQuery};

/// Two-letter codes accepted in the `state` column.
pub const US_STATE_CODES: [&str; 50] = [
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "FL", "GA", "HI", "ID", "IL", "IN", "IA",
    "KS", "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH", "NJ",
    "NM", "NY", "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VT",
    "VA", "WA", "WV", "WI", "WY",
];

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("invalid record for {holder:?} ({ed_ad}): {message}")]
    Validation {
        holder: String,
        ed_ad: String,
        message: String,
    },
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// One imported document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListSummary {
    pub id: i64,
    pub source: String,
    pub county: Option<String>,
    pub party: Option<String>,
    pub members: usize,
    pub failures: usize,
    /// Unix seconds.
    pub imported_at: i64,
}

/// A page of members matching a [`MemberQuery`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberPage {
    pub members: Vec<MemberRecord>,
    /// Matches across all pages.
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

impl MemberPage {
    pub fn has_more(&self) -> bool {
        self.offset + self.members.len() < self.total
    }
}

/// Handle to a certified list database.
pub struct CertifiedListStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl CertifiedListStore {
    /// Open (creating if needed) a database file and ensure the schema exists.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            tracing::warn!(path = %parent.display(), error = %e, "could not create database directory");
        }
        let conn = Connection::open(path)?;
        db::init_database(&conn)?;
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Open a throwaway in-memory database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        db::init_database(&conn)?;
        Ok(Self { conn, path: None })
    }

    /// Path of the database file, `None` when in memory.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Validate and persist one extraction result in a single transaction.
    ///
    /// Returns the id of the stored list.
    pub fn save(&self, result: &ExtractionResult) -> Result<i64, StoreError> {
        for member in &result.members {
            validate(member)?;
        }
        let id = db::insert_result(&self.conn, result, now_secs())?;
        tracing::info!(
            id,
            source = %result.source,
            members = result.members.len(),
            failures = result.failures.len(),
            "certified list saved"
        );
        Ok(id)
    }

    /// Members matching `query`, ordered by county, ED/AD, then petition.
    pub fn list_members(&self, query: &MemberQuery) -> Result<MemberPage, StoreError> {
        query::list_members(&self.conn, query)
    }

    /// Number of members matching `query`, ignoring its pagination.
    pub fn count_members(&self, query: &MemberQuery) -> Result<usize, StoreError> {
        query::count_members(&self.conn, query)
    }

    /// All imported documents, newest first.
    pub fn lists(&self) -> Result<Vec<ListSummary>, StoreError> {
        query::lists(&self.conn)
    }
}

/// Check a member against the storage schema.
pub fn validate(member: &MemberRecord) -> Result<(), StoreError> {
    let fail = |message: String| StoreError::Validation {
        holder: member.office_holder.clone(),
        ed_ad: member.ed_ad.clone(),
        message,
    };

    let required = [
        ("county", member.county.as_str()),
        ("office", member.office.as_str()),
        ("office_holder", member.office_holder.as_str()),
        ("entry_type", member.entry_type.as_str()),
        ("data_source", member.data_source.as_str()),
        ("party", member.party.as_deref().unwrap_or("")),
    ];
    if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
        return Err(fail(format!("{field} is required")));
    }

    if !US_STATE_CODES.contains(&member.state.as_str()) {
        return Err(fail(format!("{:?} is not a US state code", member.state)));
    }
    Ok(())
}

fn now_secs() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use certlist_core::{ExtractionFailure, ExtractionStats, FailureReason};

    pub(crate) fn member(holder: &str, ed: u32, ad: u32) -> MemberRecord {
        MemberRecord {
            petition_number: Some(ed * 10),
            office: "County Committee".into(),
            ed_ad: format!("{ed}/{ad}"),
            electoral_district: ed,
            assembly_district: ad,
            office_holder: holder.into(),
            address: Some("1 Main St New York, NY 10001".into()),
            tally: Some(7),
            entry_type: "Uncontested".into(),
            county: "New York County".into(),
            party: Some("Democratic".into()),
            state: "NY".into(),
            data_source: "manhattan.pdf".into(),
            vacancy: false,
        }
    }

    pub(crate) fn result_with(members: Vec<MemberRecord>) -> ExtractionResult {
        ExtractionResult {
            county: Some("New York County".into()),
            party: Some("Democratic".into()),
            stats: ExtractionStats {
                pages: 1,
                pages_with_table: 1,
                rows_seen: members.len() + 1,
                rows_parsed: members.len(),
                rows_failed: 1,
            },
            members,
            failures: vec![ExtractionFailure {
                page: 1,
                line: "junk row".into(),
                reason: FailureReason::MissingCountyContext,
            }],
            source: "manhattan.pdf".into(),
        }
    }

    #[test]
    fn test_validate_accepts_complete_member() {
        assert!(validate(&member("Ann Lee", 1, 65)).is_ok());
    }

    #[test]
    fn test_validate_requires_party() {
        let mut m = member("Ann Lee", 1, 65);
        m.party = None;
        let err = validate(&m).unwrap_err();
        assert!(err.to_string().contains("party is required"));
    }

    #[test]
    fn test_validate_requires_entry_type() {
        let mut m = member("Ann Lee", 1, 65);
        m.entry_type = "  ".into();
        assert!(matches!(validate(&m), Err(StoreError::Validation { .. })));
    }

    #[test]
    fn test_validate_rejects_unknown_state() {
        let mut m = member("Ann Lee", 1, 65);
        m.state = "DC".into();
        let err = validate(&m).unwrap_err();
        assert!(err.to_string().contains("not a US state code"));
    }

    #[test]
    fn test_save_is_all_or_nothing() {
        let store = CertifiedListStore::open_in_memory().unwrap();
        let mut bad = member("Bad Row", 2, 65);
        bad.data_source.clear();
        let err = store
            .save(&result_with(vec![member("Ann Lee", 1, 65), bad]))
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation { .. }));
        assert!(store.lists().unwrap().is_empty());
        assert_eq!(store.count_members(&MemberQuery::default()).unwrap(), 0);
    }

    #[test]
    fn test_save_and_list() {
        let store = CertifiedListStore::open_in_memory().unwrap();
        let id = store
            .save(&result_with(vec![member("Ann Lee", 1, 65), member("Bo Chen", 2, 65)]))
            .unwrap();

        let lists = store.lists().unwrap();
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].id, id);
        assert_eq!(lists[0].members, 2);
        assert_eq!(lists[0].failures, 1);
        assert_eq!(lists[0].county.as_deref(), Some("New York County"));
        assert!(store.path().is_none());
    }

    #[test]
    fn test_open_file_backed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("certlist.db");
        {
            let store = CertifiedListStore::open(&path).unwrap();
            store.save(&result_with(vec![member("Ann Lee", 1, 65)])).unwrap();
        }
        let store = CertifiedListStore::open(&path).unwrap();
        assert_eq!(store.path(), Some(path.as_path()));
        assert_eq!(store.count_members(&MemberQuery::default()).unwrap(), 1);
    }

    #[test]
    fn test_member_page_has_more() {
        let page = MemberPage {
            members: vec![member("Ann Lee", 1, 65)],
            total: 3,
            limit: 1,
            offset: 1,
        };
        assert!(page.has_more());
    }
}
