//! Boundary with the external store.
//!
//! A [`Store`] hands out one [`RowCursor`] per [`Query`]. Each cursor owns the
//! connection it was opened with and releases it when dropped, so the
//! lifetime of a store-side resource is exactly the lifetime of its cursor.

use std::{error::Error as StdError, fmt, sync::Arc};

use thiserror::Error;

/// Boxed backend error carried by [`StoreError`].
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Core value types produced by a store
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Real(r) => write!(f, "{r}"),
            Value::Text(s) => write!(f, "{s:?}"),
            Value::Blob(b) => write!(f, "<{} byte blob>", b.len()),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// A single row as returned by a cursor.
///
/// Column names are shared between all rows of one result set.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Looks a value up by column name.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|i| self.values.get(i))
    }

    /// Removes a value by column name, leaving `Null` in its place.
    pub fn take(&mut self, column: &str) -> Option<Value> {
        let i = self.columns.iter().position(|c| c == column)?;
        self.values.get_mut(i).map(std::mem::take)
    }
}

/// Read query against a single table.
///
/// `fields: None` selects every column. A query with neither `limit` nor
/// `offset` is unbounded and may produce arbitrarily many rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: String,
    pub fields: Option<Vec<String>>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl Query {
    /// `SELECT * FROM <table>`
    pub fn all(table: &str) -> Self {
        Self {
            table: table.to_string(),
            fields: None,
            limit: None,
            offset: None,
        }
    }

    /// `SELECT <fields> FROM <table>`
    pub fn select(table: &str, fields: &[&str]) -> Self {
        Self {
            fields: Some(fields.iter().map(|f| f.to_string()).collect()),
            ..Self::all(table)
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn is_bounded(&self) -> bool {
        self.limit.is_some() || self.offset.is_some()
    }

    /// Comma-separated, quoted projection list.
    pub fn projection(&self) -> String {
        match &self.fields {
            Some(fields) => fields
                .iter()
                .map(|f| quote_ident(f))
                .collect::<Vec<_>>()
                .join(", "),
            None => "*".to_string(),
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SELECT {} FROM {}",
            self.projection(),
            quote_ident(&self.table)
        )?;
        if let Some(limit) = self.limit {
            write!(f, " LIMIT {limit}")?;
        }
        if let Some(offset) = self.offset {
            if self.limit.is_none() {
                f.write_str(" LIMIT -1")?;
            }
            write!(f, " OFFSET {offset}")?;
        }
        Ok(())
    }
}

/// Quotes an SQL identifier, doubling any embedded quote.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Errors raised by the store or while decoding its rows.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store refused a connection.
    #[error("failed to connect to store: {0}")]
    Connection(#[source] BoxError),

    /// A query failed to prepare or execute.
    #[error("query failed: {0}")]
    Query(#[source] BoxError),

    /// A required column is not part of the row.
    #[error("column `{0}` missing from row")]
    MissingColumn(String),

    /// A required column is NULL.
    #[error("column `{0}` is NULL")]
    UnexpectedNull(String),
}

impl StoreError {
    pub fn connection(err: impl Into<BoxError>) -> Self {
        StoreError::Connection(err.into())
    }

    pub fn query(err: impl Into<BoxError>) -> Self {
        StoreError::Query(err.into())
    }
}

/// Source of cursors. One call to [`Store::open`] acquires one connection.
pub trait Store {
    type Cursor: RowCursor;

    fn open(&self, query: &Query) -> Result<Self::Cursor, StoreError>;
}

/// Forward-only row cursor. Dropping it releases its connection.
pub trait RowCursor {
    /// Produces the next row, or `None` once the result set is exhausted.
    fn next_row(&mut self) -> Result<Option<Row>, StoreError>;
}
