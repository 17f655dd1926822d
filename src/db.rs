use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use anyhow::Result;
use chrono::Local;
use rusqlite::Connection;

use crate::models::TIMESTAMP_FORMAT;

pub mod achievements;
pub mod challenges;
pub mod daily;
pub mod questions;
pub mod schema;
pub mod submissions;
pub mod users;

pub type DbResult<T> = Result<T, rusqlite::Error>;

/// The one storage handle for the whole process. Handlers and scheduler
/// jobs all share it; the connection is serialized behind a mutex and every
/// engine mutation is a single statement or an explicit transaction.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let db = Self { conn: Mutex::new(conn) };
        db.initialize()?;
        Ok(db)
    }

    /// Fresh private database, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn: Mutex::new(conn) };
        db.initialize()?;
        Ok(db)
    }

    fn initialize(&self) -> DbResult<()> {
        log::debug!("[initialize] creating tables...");
        let conn = self.conn();
        conn.pragma_update(None, "foreign_keys", "ON")?;
        for table in schema::ALL_TABLES {
            conn.execute(table, [])?;
        }
        Ok(())
    }

    /// Lock poisoning only happens after a panic inside a lock holder, at
    /// which point the process is already going down.
    pub(crate) fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }
}

/// Current local time in the format every `last_active` write uses.
pub(crate) fn now_timestamp() -> String {
    Local::now().naive_local().format(TIMESTAMP_FORMAT).to_string()
}

/// Today's calendar date as stored in `assigned_date`.
pub(crate) fn today_string() -> String {
    Local::now().date_naive().to_string()
}

/// Maps a UNIQUE/PRIMARY KEY violation into `Ok(false)` so that
/// insert-if-absent callers can report "already there" without an error.
pub(crate) fn swallow_constraint_violation(err: rusqlite::Error) -> DbResult<bool> {
    match err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Ok(false)
        }
        other => Err(other),
    }
}
