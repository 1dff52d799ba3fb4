//! Filtered, paginated reads.

use rusqlite::types::Value;
use rusqlite::{Connection, Row, params_from_iter};

use certlist_core::MemberRecord;

use crate::{ListSummary, MemberPage, StoreError};

/// Page size when a query does not set one.
pub const DEFAULT_PAGE_SIZE: usize = 10;
/// Largest page size a query may ask for.
pub const MAX_PAGE_SIZE: usize = 25;

/// Filters for [`crate::CertifiedListStore::list_members`]. Unset filters
/// match everything; text filters ignore case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberQuery {
    pub county: Option<String>,
    pub party: Option<String>,
    pub electoral_district: Option<u32>,
    pub assembly_district: Option<u32>,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl MemberQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn county(mut self, county: impl Into<String>) -> Self {
        self.county = Some(county.into());
        self
    }

    pub fn party(mut self, party: impl Into<String>) -> Self {
        self.party = Some(party.into());
        self
    }

    pub fn electoral_district(mut self, ed: u32) -> Self {
        self.electoral_district = Some(ed);
        self
    }

    pub fn assembly_district(mut self, ad: u32) -> Self {
        self.assembly_district = Some(ad);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Requested limit clamped to `1..=MAX_PAGE_SIZE`.
    pub fn effective_limit(&self) -> usize {
        self.limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    /// `WHERE` clause and its bound values.
    fn filter(&self) -> (String, Vec<Value>) {
        let mut clauses = Vec::new();
        let mut values = Vec::new();

        if let Some(county) = &self.county {
            clauses.push("county = ? COLLATE NOCASE");
            values.push(Value::Text(county.trim().to_string()));
        }
        if let Some(party) = &self.party {
            clauses.push("party = ? COLLATE NOCASE");
            values.push(Value::Text(party.trim().to_string()));
        }
        if let Some(ed) = self.electoral_district {
            clauses.push("electoral_district = ?");
            values.push(Value::Integer(ed.into()));
        }
        if let Some(ad) = self.assembly_district {
            clauses.push("assembly_district = ?");
            values.push(Value::Integer(ad.into()));
        }

        if clauses.is_empty() {
            (String::new(), values)
        } else {
            (format!(" WHERE {}", clauses.join(" AND ")), values)
        }
    }
}

const MEMBER_COLUMNS: &str = "petition_number, office, ed_ad, electoral_district, \
     assembly_district, office_holder, address, tally, entry_type, county, party, state, \
     data_source, vacancy";

fn member_from_row(row: &Row<'_>) -> rusqlite::Result<MemberRecord> {
    Ok(MemberRecord {
        petition_number: row.get(0)?,
        office: row.get(1)?,
        ed_ad: row.get(2)?,
        electoral_district: row.get(3)?,
        assembly_district: row.get(4)?,
        office_holder: row.get(5)?,
        address: row.get(6)?,
        tally: row.get(7)?,
        entry_type: row.get(8)?,
        county: row.get(9)?,
        party: row.get(10)?,
        state: row.get(11)?,
        data_source: row.get(12)?,
        vacancy: row.get(13)?,
    })
}

pub fn count_members(conn: &Connection, query: &MemberQuery) -> Result<usize, StoreError> {
    let (filter, values) = query.filter();
    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM members{filter}"),
        params_from_iter(values),
        |row| row.get(0),
    )?;
    Ok(total as usize)
}

pub fn list_members(conn: &Connection, query: &MemberQuery) -> Result<MemberPage, StoreError> {
    let limit = query.effective_limit();
    let total = count_members(conn, query)?;

    let (filter, mut values) = query.filter();
    values.push(Value::Integer(limit as i64));
    values.push(Value::Integer(query.offset as i64));

    let mut stmt = conn.prepare(&format!(
        "SELECT {MEMBER_COLUMNS} FROM members{filter} \
         ORDER BY county, electoral_district, assembly_district, petition_number, id \
         LIMIT ? OFFSET ?"
    ))?;
    let members = stmt
        .query_map(params_from_iter(values), member_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(total, returned = members.len(), limit, offset = query.offset, "member query");

    Ok(MemberPage {
        members,
        total,
        limit,
        offset: query.offset,
    })
}

pub fn lists(conn: &Connection) -> Result<Vec<ListSummary>, StoreError> {
    let mut stmt = conn.prepare_cached(
        "SELECT l.id, l.source, l.county, l.party, l.imported_at, \
           (SELECT COUNT(*) FROM members m WHERE m.list_id = l.id), \
           (SELECT COUNT(*) FROM failures f WHERE f.list_id = l.id) \
         FROM certified_lists l \
         ORDER BY l.imported_at DESC, l.id DESC",
    )?;
    let lists = stmt
        .query_map([], |row| {
            Ok(ListSummary {
                id: row.get(0)?,
                source: row.get(1)?,
                county: row.get(2)?,
                party: row.get(3)?,
                imported_at: row.get(4)?,
                members: row.get::<_, i64>(5)? as usize,
                failures: row.get::<_, i64>(6)? as usize,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(lists)
}
