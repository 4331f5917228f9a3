use crate::db::connection::Database;
use crate::domain::listing::NormalizedListing;
use crate::errors::StoreError;
use rusqlite::{params, OptionalExtension};

/// A stored listing still waiting for the enrichment phases.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingListing {
    pub id: i64,
    pub url: String,
    pub title: Option<String>,
    pub city: Option<String>,
    pub price: Option<i64>,
}

pub fn listing_exists_by_url(db: &Database, url: &str) -> Result<bool, StoreError> {
    db.with_conn(|conn| {
        let found = conn
            .query_row(
                "SELECT 1 FROM buildings WHERE a_url = ?1 LIMIT 1",
                params![url],
                |_| Ok(()),
            )
            .optional()
            .map_err(|e| StoreError::DbError(e.to_string()))?;
        Ok(found.is_some())
    })
}

/// Inserts a new row and returns its `a_id`. Enrichment columns stay NULL and
/// `c_treated` starts at 0.
pub fn insert_listing(db: &Database, listing: &NormalizedListing) -> Result<i64, StoreError> {
    db.with_conn(|conn| {
        conn.execute(
            r#"
            INSERT INTO buildings (
                a_source, a_externalId, a_url, a_title, a_city, a_postalCode,
                a_price, a_surfaceArea, a_description, a_images,
                a_publicationDate, a_dpe, a_ges, c_treated
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8, ?9, ?10,
                ?11, ?12, ?13, 0
            )
            "#,
            params![
                listing.source_name,
                listing.external_id,
                listing.url,
                listing.title,
                listing.city,
                listing.postal_code,
                listing.price,
                listing.surface_area,
                listing.description,
                listing.images,
                listing.scraped_date,
                listing.dpe,
                listing.ges,
            ],
        )
        .map_err(|e| StoreError::DbError(e.to_string()))?;

        Ok(conn.last_insert_rowid())
    })
}

pub fn count_listings(db: &Database) -> Result<i64, StoreError> {
    db.with_conn(|conn| {
        conn.query_row("SELECT COUNT(*) FROM buildings", [], |row| row.get(0))
            .map_err(|e| StoreError::DbError(e.to_string()))
    })
}

/// Rows with `c_treated = 0`, oldest first.
pub fn list_untreated(db: &Database) -> Result<Vec<PendingListing>, StoreError> {
    db.with_conn(|conn| {
        let mut stmt = conn
            .prepare(
                r#"
                SELECT a_id, a_url, a_title, a_city, a_price
                FROM buildings
                WHERE c_treated = 0
                ORDER BY a_id ASC
                "#,
            )
            .map_err(|e| StoreError::DbError(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| {
                Ok(PendingListing {
                    id: row.get(0)?,
                    url: row.get(1)?,
                    title: row.get(2)?,
                    city: row.get(3)?,
                    price: row.get(4)?,
                })
            })
            .map_err(|e| StoreError::DbError(e.to_string()))?;

        let mut out = Vec::new();
        for r in rows {
            out.push(r.map_err(|e| StoreError::DbError(e.to_string()))?);
        }
        Ok(out)
    })
}
