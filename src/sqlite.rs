use std::{collections::VecDeque, path::PathBuf, sync::Arc, time::Duration};

use log::debug;
use rusqlite::{params, types::ValueRef, Connection, OpenFlags};

use crate::store::{quote_ident, Query, Row, RowCursor, Store, StoreError, Value};

/// Rows read per round trip by an unbounded cursor.
pub const DEFAULT_FETCH_SIZE: usize = 256;

/// How long a connection waits on a locked database before failing.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite store configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SqliteConfig {
    /// Path (or `file:` URI) of the SQLite database
    pub db_path: PathBuf,
    /// Rows buffered per chunk by unbounded cursors
    pub fetch_size: usize,
    /// Busy timeout applied to every connection
    pub busy_timeout: Duration,
}

impl SqliteConfig {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            fetch_size: DEFAULT_FETCH_SIZE,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    /// Zero is treated as one.
    pub fn with_fetch_size(mut self, fetch_size: usize) -> Self {
        self.fetch_size = fetch_size.max(1);
        self
    }

    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }
}

/// Read-only SQLite store. Every [`Store::open`] opens a new connection.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    config: SqliteConfig,
}

impl SqliteStore {
    pub fn new(config: SqliteConfig) -> Self {
        Self { config }
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&self.config.db_path, flags)
            .map_err(StoreError::connection)?;
        conn.busy_timeout(self.config.busy_timeout)
            .map_err(StoreError::connection)?;
        debug!("opened sqlite connection to {}", self.config.db_path.display());
        Ok(conn)
    }
}

impl Store for SqliteStore {
    type Cursor = SqliteCursor;

    fn open(&self, query: &Query) -> Result<SqliteCursor, StoreError> {
        let conn = self.connect()?;
        let mut cursor = SqliteCursor {
            conn,
            query: query.clone(),
            fetch_size: self.config.fetch_size,
            buffer: VecDeque::new(),
            last_rowid: None,
            exhausted: false,
        };
        // Surface query errors (missing table, bad column) at open time.
        cursor.fill()?;
        Ok(cursor)
    }
}

/// Cursor owning one SQLite connection.
///
/// Unbounded queries walk the table in rowid order, `fetch_size` rows per
/// statement, so memory stays bounded without the cursor borrowing its own
/// connection. Bounded queries are read in a single statement. Tables
/// declared `WITHOUT ROWID` are not supported.
pub struct SqliteCursor {
    conn: Connection,
    query: Query,
    fetch_size: usize,
    buffer: VecDeque<Row>,
    last_rowid: Option<i64>,
    exhausted: bool,
}

impl SqliteCursor {
    fn fill(&mut self) -> Result<(), StoreError> {
        if self.query.is_bounded() {
            self.fill_bounded()
        } else {
            self.fill_chunk()
        }
    }

    fn fill_bounded(&mut self) -> Result<(), StoreError> {
        let sql = format!(
            "SELECT {} FROM {} ORDER BY rowid LIMIT ?1 OFFSET ?2",
            self.query.projection(),
            quote_ident(&self.query.table)
        );
        let limit = self.query.limit.map_or(-1, to_sql_int);
        let offset = self.query.offset.map_or(0, to_sql_int);

        let mut stmt = self.conn.prepare(&sql).map_err(StoreError::query)?;
        let columns = column_names(&stmt, 0);
        let mut rows = stmt.query(params![limit, offset]).map_err(StoreError::query)?;
        while let Some(row) = rows.next().map_err(StoreError::query)? {
            let values = (0..columns.len())
                .map(|i| row.get_ref(i).map(to_value))
                .collect::<Result<Vec<_>, _>>()
                .map_err(StoreError::query)?;
            self.buffer.push_back(Row::new(columns.clone(), values));
        }
        self.exhausted = true;
        Ok(())
    }

    fn fill_chunk(&mut self) -> Result<(), StoreError> {
        let limit = to_sql_int(self.fetch_size);
        let select = format!(
            "SELECT rowid, {} FROM {}",
            self.query.projection(),
            quote_ident(&self.query.table)
        );
        // The first chunk has no lower bound so a row at rowid i64::MIN is kept.
        let (sql, after) = match self.last_rowid {
            Some(after) => (
                format!("{select} WHERE rowid > ?1 ORDER BY rowid LIMIT ?2"),
                Some(after),
            ),
            None => (format!("{select} ORDER BY rowid LIMIT ?1"), None),
        };

        let mut stmt = self.conn.prepare_cached(&sql).map_err(StoreError::query)?;
        let columns = column_names(&stmt, 1);
        let mut rows = match after {
            Some(after) => stmt.query(params![after, limit]),
            None => stmt.query(params![limit]),
        }
        .map_err(StoreError::query)?;
        let mut fetched = 0;
        while let Some(row) = rows.next().map_err(StoreError::query)? {
            let rowid: i64 = row.get(0).map_err(StoreError::query)?;
            let values = (1..=columns.len())
                .map(|i| row.get_ref(i).map(to_value))
                .collect::<Result<Vec<_>, _>>()
                .map_err(StoreError::query)?;
            self.buffer.push_back(Row::new(columns.clone(), values));
            self.last_rowid = Some(rowid);
            fetched += 1;
        }
        if fetched < self.fetch_size {
            self.exhausted = true;
        }
        debug!("fetched {fetched} rows from {}", self.query.table);
        Ok(())
    }
}

impl RowCursor for SqliteCursor {
    fn next_row(&mut self) -> Result<Option<Row>, StoreError> {
        if self.buffer.is_empty() && !self.exhausted {
            self.fill()?;
        }
        Ok(self.buffer.pop_front())
    }
}

impl Drop for SqliteCursor {
    fn drop(&mut self) {
        debug!("closing sqlite connection for {}", self.query.table);
    }
}

fn column_names(stmt: &rusqlite::Statement<'_>, skip: usize) -> Arc<[String]> {
    stmt.column_names()
        .into_iter()
        .skip(skip)
        .map(str::to_string)
        .collect()
}

fn to_sql_int(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn to_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(r) => Value::Real(r),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    }
}
