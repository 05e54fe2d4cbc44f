// Shared test doubles and fixtures.

#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

use rusqlite::{params, Connection};
use tempfile::NamedTempFile;

use row_stream::{Query, Row, RowCursor, Store, StoreError, Value};

pub const COLUMNS: [&str; 4] = ["user_id", "name", "email", "age"];

/// Acquire/release/pull counters shared between a store and its cursors.
#[derive(Debug, Default)]
pub struct Counters {
    pub acquired: Cell<usize>,
    pub released: Cell<usize>,
    pub pulled: Cell<usize>,
}

impl Counters {
    pub fn open_connections(&self) -> usize {
        self.acquired.get() - self.released.get()
    }
}

/// In-memory store that records every connection it hands out.
pub struct CountingStore {
    rows: Rc<Vec<Vec<Value>>>,
    pub counters: Rc<Counters>,
    refuse_connections: bool,
    fail_after: Option<usize>,
}

impl CountingStore {
    pub fn new(rows: Vec<Vec<Value>>) -> Self {
        Self {
            rows: Rc::new(rows),
            counters: Rc::default(),
            refuse_connections: false,
            fail_after: None,
        }
    }

    /// Users `u-0..u-n` with the given ages.
    pub fn with_ages(ages: impl IntoIterator<Item = Value>) -> Self {
        Self::new(
            ages.into_iter()
                .enumerate()
                .map(|(i, age)| user_row(i, age))
                .collect(),
        )
    }

    /// Every connection attempt fails.
    pub fn refusing() -> Self {
        Self {
            refuse_connections: true,
            ..Self::new(Vec::new())
        }
    }

    /// Cursors fail with a query error after producing `n` rows.
    pub fn failing_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }
}

pub fn user_row(i: usize, age: Value) -> Vec<Value> {
    vec![
        Value::Text(format!("u-{i}")),
        Value::Text(format!("User {i}")),
        Value::Text(format!("user{i}@example.com")),
        age,
    ]
}

impl Store for CountingStore {
    type Cursor = CountingCursor;

    fn open(&self, query: &Query) -> Result<CountingCursor, StoreError> {
        if self.refuse_connections {
            return Err(StoreError::connection("connection refused"));
        }
        let fields: Vec<String> = match &query.fields {
            Some(fields) => fields.clone(),
            None => COLUMNS.iter().map(|c| c.to_string()).collect(),
        };
        let indices = fields
            .iter()
            .map(|f| {
                COLUMNS
                    .iter()
                    .position(|c| c == f)
                    .ok_or_else(|| StoreError::query(format!("no such column: {f}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let start = query.offset.unwrap_or(0).min(self.rows.len());
        let end = query
            .limit
            .map_or(self.rows.len(), |l| start.saturating_add(l).min(self.rows.len()));

        self.counters.acquired.set(self.counters.acquired.get() + 1);
        Ok(CountingCursor {
            rows: Rc::clone(&self.rows),
            columns: fields.into(),
            indices,
            next: start,
            end,
            produced: 0,
            fail_after: self.fail_after,
            counters: Rc::clone(&self.counters),
        })
    }
}

pub struct CountingCursor {
    rows: Rc<Vec<Vec<Value>>>,
    columns: Arc<[String]>,
    indices: Vec<usize>,
    next: usize,
    end: usize,
    produced: usize,
    fail_after: Option<usize>,
    counters: Rc<Counters>,
}

impl RowCursor for CountingCursor {
    fn next_row(&mut self) -> Result<Option<Row>, StoreError> {
        self.counters.pulled.set(self.counters.pulled.get() + 1);
        if self.fail_after == Some(self.produced) {
            return Err(StoreError::query("lost connection to store"));
        }
        if self.next >= self.end {
            return Ok(None);
        }
        let source = &self.rows[self.next];
        let values = self.indices.iter().map(|&i| source[i].clone()).collect();
        self.next += 1;
        self.produced += 1;
        Ok(Some(Row::new(Arc::clone(&self.columns), values)))
    }
}

impl Drop for CountingCursor {
    fn drop(&mut self) {
        self.counters.released.set(self.counters.released.get() + 1);
    }
}

/// Creates the users table on `conn`.
pub fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE user_data (
            user_id VARCHAR(36) NOT NULL PRIMARY KEY,
            name VARCHAR(100) NOT NULL,
            email VARCHAR(100) NOT NULL UNIQUE,
            age DECIMAL(5,0) NOT NULL
        );
        "#,
    )
}

/// Temporary on-disk database holding `ages.len()` users.
pub fn create_temp_db(ages: &[Value]) -> rusqlite::Result<NamedTempFile> {
    let temp_file = NamedTempFile::new().expect("failed to create temp file");
    let conn = Connection::open(temp_file.path())?;
    initialize_schema(&conn)?;
    insert_users(&conn, ages)?;
    Ok(temp_file)
}

pub fn insert_users(conn: &Connection, ages: &[Value]) -> rusqlite::Result<()> {
    let mut stmt =
        conn.prepare("INSERT INTO user_data (user_id, name, email, age) VALUES (?1, ?2, ?3, ?4)")?;
    for (i, age) in ages.iter().enumerate() {
        let age: rusqlite::types::Value = match age {
            Value::Null => rusqlite::types::Value::Null,
            Value::Integer(v) => (*v).into(),
            Value::Real(v) => (*v).into(),
            Value::Text(v) => v.clone().into(),
            Value::Blob(v) => v.clone().into(),
        };
        stmt.execute(params![
            format!("u-{i}"),
            format!("User {i}"),
            format!("user{i}@example.com"),
            age
        ])?;
    }
    Ok(())
}
