//! Durable visit storage.
//!
//! One `SQLite` file holds two append-only tables, `directory_history` and
//! `file_history`. This module is the only code that touches the file; the
//! rest of the crate goes through [`HistoryStore::append`] and
//! [`HistoryStore::scan`].

mod types;

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, ErrorCode, Row, Transaction, TransactionBehavior};

use crate::error::{Error, Result};

pub use types::{
    DirectoryVisit, FileType, FileVisit, VisitKind, VisitRecord, format_timestamp,
    parse_timestamp,
};

/// Lock handling for one store connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// How long `SQLite` itself waits on a locked database per statement.
    pub busy_timeout: Duration,
    /// Extra attempts for an append that still finds the store busy.
    pub max_retries: u32,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            busy_timeout: Duration::from_millis(2000),
            max_retries: 5,
        }
    }
}

/// Columns each table must carry. Anything else present is left alone.
const REQUIRED_COLUMNS: [(&str, &[&str]); 2] = [
    ("directory_history", &["path", "timestamp"]),
    ("file_history", &["path", "file_type", "action", "timestamp"]),
];

/// Longest busy timeout `SQLite` accepts (milliseconds in a C `int`).
pub const MAX_BUSY_TIMEOUT: Duration = Duration::from_millis(2_147_483_647);
/// Upper bound on append retries, keeping the total wait bounded.
pub const MAX_RETRIES: u32 = 20;

const BACKOFF_BASE_MS: u64 = 10;
const BACKOFF_CAP_MS: u64 = 500;

pub struct HistoryStore {
    conn: Connection,
    path: PathBuf,
    max_retries: u32,
}

impl HistoryStore {
    /// Open the store at `path`, creating the file and schema if absent.
    ///
    /// # Errors
    /// `StoreUnavailable` if the file cannot be opened or stays locked,
    /// `CorruptStore` if it is not a database or a table lacks a required column.
    pub fn open(path: &Path, options: &StoreOptions) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| Error::StoreUnavailable {
                path: path.to_path_buf(),
                reason: format!("create directory {}: {e}", parent.display()),
            })?;
        }
        let conn = Connection::open(path).map_err(|e| classify(path, e))?;
        conn.busy_timeout(options.busy_timeout.min(MAX_BUSY_TIMEOUT))
            .map_err(|e| classify(path, e))?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |r| r.get::<_, String>(0))
            .map_err(|e| classify(path, e))?;
        conn.pragma_update(None, "synchronous", "NORMAL")
            .map_err(|e| classify(path, e))?;

        Self::with_connection(conn, path.to_path_buf(), options)
    }

    /// Open a throwaway store that lives only as long as the returned value.
    ///
    /// # Errors
    /// Returns an error if `SQLite` cannot allocate the database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn, PathBuf::from(":memory:"), &StoreOptions::default())
    }

    fn with_connection(conn: Connection, path: PathBuf, options: &StoreOptions) -> Result<Self> {
        init_schema(&conn).map_err(|e| match e {
            Error::Sqlite(inner) => classify(&path, inner),
            Error::CorruptStore { reason, .. } => Error::CorruptStore {
                path: path.clone(),
                reason,
            },
            other => other,
        })?;
        Ok(Self {
            conn,
            path,
            max_retries: options.max_retries.min(MAX_RETRIES),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Durably append one visit row in its own write transaction.
    ///
    /// A busy store is retried with exponential backoff up to `max_retries`
    /// times; the row is either committed or not written at all.
    ///
    /// # Errors
    /// `StoreUnavailable` once the retry budget is spent, or any other
    /// classified `SQLite` failure.
    pub fn append(&self, record: &VisitRecord) -> Result<()> {
        let mut attempt = 0;
        loop {
            match self.try_append(record) {
                Ok(()) => return Ok(()),
                Err(e) if is_busy(&e) && attempt < self.max_retries => {
                    let delay = backoff(attempt);
                    tracing::debug!(
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis(),
                        path = record.path(),
                        "history store busy, retrying append"
                    );
                    std::thread::sleep(delay);
                    attempt += 1;
                }
                Err(e) => return Err(classify(&self.path, e)),
            }
        }
    }

    fn try_append(&self, record: &VisitRecord) -> rusqlite::Result<()> {
        // IMMEDIATE takes the write lock up front so a busy store fails
        // before any row is staged.
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;
        match record {
            VisitRecord::Directory(v) => {
                tx.execute(
                    "INSERT INTO directory_history (path, timestamp) VALUES (?1, ?2)",
                    rusqlite::params![v.path, format_timestamp(&v.visited_at)],
                )?;
            }
            VisitRecord::File(v) => {
                tx.execute(
                    "INSERT INTO file_history (path, file_type, action, timestamp)
                     VALUES (?1, ?2, ?3, ?4)",
                    rusqlite::params![
                        v.path,
                        v.file_type.as_str(),
                        v.action,
                        format_timestamp(&v.visited_at)
                    ],
                )?;
            }
        }
        tx.commit()
    }

    /// Return every row of `kind`, optionally only those at or after `since`.
    ///
    /// Rows that cannot be decoded are skipped with a warning. Order is unspecified.
    ///
    /// # Errors
    /// Returns a classified error if the table cannot be read.
    pub fn scan(&self, kind: VisitKind, since: Option<DateTime<Utc>>) -> Result<Vec<VisitRecord>> {
        Ok(match kind {
            VisitKind::Directory => self
                .scan_directories(since)?
                .into_iter()
                .map(VisitRecord::from)
                .collect(),
            VisitKind::File => self
                .scan_files(since)?
                .into_iter()
                .map(VisitRecord::from)
                .collect(),
        })
    }

    /// # Errors
    /// Returns a classified error if the table cannot be read.
    pub fn scan_directories(&self, since: Option<DateTime<Utc>>) -> Result<Vec<DirectoryVisit>> {
        self.scan_table(
            VisitKind::Directory,
            "SELECT path, timestamp FROM directory_history",
            map_directory_row,
            since,
            |v: &DirectoryVisit| v.visited_at,
        )
    }

    /// # Errors
    /// Returns a classified error if the table cannot be read.
    pub fn scan_files(&self, since: Option<DateTime<Utc>>) -> Result<Vec<FileVisit>> {
        self.scan_table(
            VisitKind::File,
            "SELECT path, file_type, action, timestamp FROM file_history",
            map_file_row,
            since,
            |v: &FileVisit| v.visited_at,
        )
    }

    fn scan_table<T>(
        &self,
        kind: VisitKind,
        sql: &str,
        map: fn(&Row<'_>) -> rusqlite::Result<Option<T>>,
        since: Option<DateTime<Utc>>,
        visited_at: fn(&T) -> DateTime<Utc>,
    ) -> Result<Vec<T>> {
        let mut stmt = self.conn.prepare(sql).map_err(|e| classify(&self.path, e))?;
        let rows = stmt.query_map([], map).map_err(|e| classify(&self.path, e))?;

        let mut result = Vec::new();
        let mut skipped = 0_usize;
        for row in rows {
            match row {
                Ok(Some(visit)) => {
                    if since.is_none_or(|cutoff| visited_at(&visit) >= cutoff) {
                        result.push(visit);
                    }
                }
                Ok(None)
                | Err(
                    rusqlite::Error::InvalidColumnType(..)
                    | rusqlite::Error::FromSqlConversionFailure(..),
                ) => skipped += 1,
                Err(e) => return Err(classify(&self.path, e)),
            }
        }
        if skipped > 0 {
            tracing::warn!(table = kind.table(), skipped, "skipped malformed history rows");
        }
        Ok(result)
    }

    /// Number of rows stored for `kind`, malformed ones included.
    ///
    /// # Errors
    /// Returns a classified error if the count query fails.
    pub fn count(&self, kind: VisitKind) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", kind.table());
        let n: i64 = self
            .conn
            .query_row(&sql, [], |r| r.get(0))
            .map_err(|e| classify(&self.path, e))?;
        Ok(u64::try_from(n).unwrap_or(0))
    }
}

/// Create both tables if absent, check their columns, then add indexes.
///
/// Indexes come last: creating one on a table missing its column would fail
/// with a generic error instead of `CorruptStore`.
fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS directory_history (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            path      TEXT    NOT NULL,
            timestamp TEXT    NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
        CREATE TABLE IF NOT EXISTS file_history (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            path      TEXT    NOT NULL,
            file_type TEXT    NOT NULL,
            action    TEXT    NOT NULL DEFAULT 'opened',
            timestamp TEXT    NOT NULL DEFAULT CURRENT_TIMESTAMP
        );",
    )?;
    verify_schema(conn)?;
    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_directory_history_path ON directory_history(path);
        CREATE INDEX IF NOT EXISTS idx_directory_history_timestamp ON directory_history(timestamp);
        CREATE INDEX IF NOT EXISTS idx_file_history_path ON file_history(path);
        CREATE INDEX IF NOT EXISTS idx_file_history_timestamp ON file_history(timestamp);",
    )?;
    Ok(())
}

fn verify_schema(conn: &Connection) -> Result<()> {
    for (table, columns) in REQUIRED_COLUMNS {
        let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1)")?;
        let present = stmt
            .query_map([table], |r| r.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        if let Some(missing) = columns.iter().find(|c| !present.iter().any(|p| p == *c)) {
            return Err(Error::CorruptStore {
                path: PathBuf::new(),
                reason: format!("table {table} is missing column {missing}"),
            });
        }
    }
    Ok(())
}

fn text_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<String>> {
    Ok(row.get_ref(idx)?.as_str().ok().map(str::to_owned))
}

fn map_directory_row(row: &Row<'_>) -> rusqlite::Result<Option<DirectoryVisit>> {
    let path = text_column(row, 0)?;
    let visited_at = types::timestamp_from_sql(row.get_ref(1)?);
    Ok(path
        .filter(|p| !p.is_empty())
        .zip(visited_at)
        .map(|(path, visited_at)| DirectoryVisit { path, visited_at }))
}

fn map_file_row(row: &Row<'_>) -> rusqlite::Result<Option<FileVisit>> {
    let path = text_column(row, 0)?.filter(|p| !p.is_empty());
    let file_type = text_column(row, 1)?;
    let action = text_column(row, 2)?;
    let visited_at = types::timestamp_from_sql(row.get_ref(3)?);
    Ok(match (path, file_type, action, visited_at) {
        (Some(path), Some(file_type), Some(action), Some(visited_at)) => Some(FileVisit {
            path,
            file_type: FileType::new(file_type),
            action,
            visited_at,
        }),
        _ => None,
    })
}

fn is_busy(err: &rusqlite::Error) -> bool {
    matches!(
        err.sqlite_error_code(),
        Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
    )
}

fn backoff(attempt: u32) -> Duration {
    let ms = BACKOFF_BASE_MS.saturating_mul(1_u64 << attempt.min(16));
    Duration::from_millis(ms.min(BACKOFF_CAP_MS))
}

/// Map a raw `SQLite` failure onto the store's error taxonomy.
fn classify(path: &Path, err: rusqlite::Error) -> Error {
    match err.sqlite_error_code() {
        Some(
            ErrorCode::DatabaseBusy
            | ErrorCode::DatabaseLocked
            | ErrorCode::CannotOpen
            | ErrorCode::PermissionDenied
            | ErrorCode::ReadOnly,
        ) => Error::StoreUnavailable {
            path: path.to_path_buf(),
            reason: err.to_string(),
        },
        Some(ErrorCode::NotADatabase | ErrorCode::DatabaseCorrupt) => Error::CorruptStore {
            path: path.to_path_buf(),
            reason: err.to_string(),
        },
        _ => Error::Sqlite(err),
    }
}
