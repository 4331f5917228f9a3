use crate::db::connection::Database;
use crate::domain::listing::SearchLink;
use crate::errors::StoreError;
use rusqlite::params;

pub fn list_search_links(db: &Database) -> Result<Vec<SearchLink>, StoreError> {
    db.with_conn(|conn| {
        let mut stmt = conn
            .prepare("SELECT id, link, source FROM search_links ORDER BY id ASC")
            .map_err(|e| StoreError::DbError(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| {
                Ok(SearchLink {
                    id: row.get(0)?,
                    url: row.get(1)?,
                    source_name: row.get(2)?,
                })
            })
            .map_err(|e| StoreError::DbError(e.to_string()))?;

        let mut links = Vec::new();
        for r in rows {
            links.push(r.map_err(|e| StoreError::DbError(e.to_string()))?);
        }
        Ok(links)
    })
}

/// Saves a search link, registering its source first. Re-adding an existing
/// (link, source) pair returns the existing id.
pub fn add_search_link(db: &Database, url: &str, source: &str) -> Result<i64, StoreError> {
    add_source(db, source)?;

    db.with_conn(|conn| {
        conn.execute(
            "INSERT OR IGNORE INTO search_links (link, source) VALUES (?1, ?2)",
            params![url, source],
        )
        .map_err(|e| StoreError::DbError(e.to_string()))?;

        conn.query_row(
            "SELECT id FROM search_links WHERE link = ?1 AND source = ?2",
            params![url, source],
            |row| row.get(0),
        )
        .map_err(|e| StoreError::DbError(e.to_string()))
    })
}

pub fn add_source(db: &Database, source: &str) -> Result<(), StoreError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT OR IGNORE INTO sources (source) VALUES (?1)",
            params![source],
        )
        .map_err(|e| StoreError::DbError(e.to_string()))?;
        Ok(())
    })
}

pub fn list_sources(db: &Database) -> Result<Vec<String>, StoreError> {
    db.with_conn(|conn| {
        let mut stmt = conn
            .prepare("SELECT source FROM sources ORDER BY source ASC")
            .map_err(|e| StoreError::DbError(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| row.get(0))
            .map_err(|e| StoreError::DbError(e.to_string()))?;

        let mut sources = Vec::new();
        for r in rows {
            sources.push(r.map_err(|e| StoreError::DbError(e.to_string()))?);
        }
        Ok(sources)
    })
}
