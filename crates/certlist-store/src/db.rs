//! SQLite schema and write path.

use rusqlite::{Connection, params};

use certlist_core::ExtractionResult;

use crate::StoreError;

/// Initialize the database with the required schema.
/// Sets WAL mode and NORMAL synchronous for performance.
pub fn init_database(conn: &Connection) -> Result<(), StoreError> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS certified_lists (
            id INTEGER PRIMARY KEY,
            source TEXT NOT NULL,
            county TEXT,
            party TEXT,
            pages INTEGER NOT NULL,
            rows_seen INTEGER NOT NULL,
            rows_parsed INTEGER NOT NULL,
            rows_failed INTEGER NOT NULL,
            imported_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS members (
            id INTEGER PRIMARY KEY,
            list_id INTEGER NOT NULL REFERENCES certified_lists(id) ON DELETE CASCADE,
            petition_number INTEGER,
            office TEXT NOT NULL,
            ed_ad TEXT NOT NULL,
            electoral_district INTEGER NOT NULL,
            assembly_district INTEGER NOT NULL,
            office_holder TEXT NOT NULL,
            address TEXT,
            tally INTEGER,
            entry_type TEXT NOT NULL,
            county TEXT NOT NULL,
            party TEXT NOT NULL,
            state TEXT NOT NULL,
            data_source TEXT NOT NULL,
            vacancy INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS failures (
            id INTEGER PRIMARY KEY,
            list_id INTEGER NOT NULL REFERENCES certified_lists(id) ON DELETE CASCADE,
            page INTEGER NOT NULL,
            line TEXT NOT NULL,
            reason TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_members_county_party ON members(county, party);
        CREATE INDEX IF NOT EXISTS idx_members_districts ON members(electoral_district, assembly_district);
        CREATE INDEX IF NOT EXISTS idx_failures_list ON failures(list_id);
        "#,
    )?;

    Ok(())
}

/// Insert a document, its members and its failures. Returns the list id.
pub fn insert_result(
    conn: &Connection,
    result: &ExtractionResult,
    imported_at: i64,
) -> Result<i64, StoreError> {
    let tx = conn.unchecked_transaction()?;

    tx.execute(
        "INSERT INTO certified_lists \
         (source, county, party, pages, rows_seen, rows_parsed, rows_failed, imported_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            result.source,
            result.county,
            result.party,
            result.stats.pages as i64,
            result.stats.rows_seen as i64,
            result.stats.rows_parsed as i64,
            result.stats.rows_failed as i64,
            imported_at,
        ],
    )?;
    let list_id = tx.last_insert_rowid();

    {
        let mut member_stmt = tx.prepare_cached(
            "INSERT INTO members \
             (list_id, petition_number, office, ed_ad, electoral_district, assembly_district, \
              office_holder, address, tally, entry_type, county, party, state, data_source, vacancy) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        )?;
        for m in &result.members {
            member_stmt.execute(params![
                list_id,
                m.petition_number,
                m.office,
                m.ed_ad,
                m.electoral_district,
                m.assembly_district,
                m.office_holder,
                m.address,
                m.tally,
                m.entry_type,
                m.county,
                m.party,
                m.state,
                m.data_source,
                m.vacancy,
            ])?;
        }
    }

    {
        let mut failure_stmt = tx.prepare_cached(
            "INSERT INTO failures (list_id, page, line, reason) VALUES (?1, ?2, ?3, ?4)",
        )?;
        for f in &result.failures {
            let reason = serde_json::to_string(&f.reason)?;
            failure_stmt.execute(params![list_id, f.page as i64, f.line, reason])?;
        }
    }

    tx.commit()?;
    Ok(list_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{member, result_with};

    fn count(conn: &Connection, table: &str) -> i64 {
        conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_init_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_database(&conn).unwrap();
        init_database(&conn).unwrap();
        assert_eq!(count(&conn, "members"), 0);
    }

    #[test]
    fn test_insert_writes_all_tables() {
        let conn = Connection::open_in_memory().unwrap();
        init_database(&conn).unwrap();
        let id = insert_result(&conn, &result_with(vec![member("Ann Lee", 1, 65)]), 42).unwrap();

        assert_eq!(count(&conn, "certified_lists"), 1);
        assert_eq!(count(&conn, "members"), 1);
        assert_eq!(count(&conn, "failures"), 1);

        let reason: String = conn
            .query_row("SELECT reason FROM failures WHERE list_id = ?1", [id], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(reason, r#"{"reason":"missing_county_context"}"#);
    }
}
