use rusqlite::Connection;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::errors::StoreError;

const SCHEMA_SQL: &str = include_str!("../../sql/schema.sql");

/// SQLite handle. The connection is opened on first use and reused for the
/// rest of the run.
pub struct Database {
    path: PathBuf,
    conn: RefCell<Option<Connection>>,
}

impl Database {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            conn: RefCell::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Provides a mutable connection to the closure.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StoreError>,
    {
        let mut slot = self
            .conn
            .try_borrow_mut()
            .map_err(|_| StoreError::DbError("connection already in use".into()))?;

        if slot.is_none() {
            let conn = Connection::open(&self.path)
                .map_err(|e| StoreError::DbError(format!("Open DB failed: {e}")))?;
            conn.execute_batch("PRAGMA foreign_keys = ON;")
                .map_err(|e| StoreError::DbError(format!("Enable foreign keys failed: {e}")))?;
            *slot = Some(conn);
        }

        match slot.as_mut() {
            Some(conn) => f(conn),
            None => Err(StoreError::DbError("connection unavailable".into())),
        }
    }
}

/// Creates the tables if they don't exist yet.
pub fn init_db(db: &Database) -> Result<(), StoreError> {
    db.with_conn(|conn| {
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| StoreError::SchemaError(format!("Failed to apply schema: {e}")))?;
        Ok(())
    })?;

    info!(path = %db.path().display(), "Database initialized");
    Ok(())
}
