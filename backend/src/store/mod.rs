//! SQLite-backed record store.
//!
//! One row in `files` per uploaded spreadsheet and one row in `sheets` per worksheet of
//! that upload. A sheet's name, header row, and parsed rows live in the same `sheets`
//! row, so they can only appear or disappear together. `sheets` rows cascade away with
//! their file.
//!
//! The store owns a single connection behind a mutex. Every caller goes through
//! [`Store::with_conn`], which makes the store single-writer; mutations additionally run
//! in `BEGIN IMMEDIATE` transactions so the database file stays consistent when several
//! processes share it.

mod records;
mod schema;
mod tokens;

pub use records::NewRecord;
pub(crate) use records::{
    delete_record, list_summaries, load_owner, load_record, load_sheet, load_sheet_names,
    remove_sheet,
};

use crate::error::{ServiceError, ServiceResult};
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::types::Type;
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    pub fn open_path(path: impl AsRef<Path>) -> ServiceResult<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> ServiceResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> ServiceResult<Self> {
        conn.busy_timeout(Duration::from_secs(5))?;
        schema::init(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `f` with exclusive access to the connection.
    pub(crate) fn with_conn<T, F>(&self, f: F) -> ServiceResult<T>
    where
        F: FnOnce(&mut Connection) -> ServiceResult<T>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| ServiceError::Internal("store mutex poisoned".to_string()))?;
        f(&mut *conn)
    }
}

/// Current time at the precision the store keeps.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Fixed-width RFC 3339, so text order in SQLite matches time order.
pub(crate) fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(column: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}
