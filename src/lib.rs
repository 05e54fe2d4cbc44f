//! Bounded-memory access to a users table.
//!
//! # Intention
//!
//! - Stream rows one at a time, in fixed-size batches, or page by page,
//!   without ever holding the full result set.
//! - Compute aggregates (the average age) as a single streaming pass.
//! - Tie every store connection to the lifetime of the producer that opened
//!   it, so exhausting, failing, or dropping a sequence always releases it.
//!
//! # Architectural Boundaries
//!
//! - The store is reached only through [`store::Store`]; [`sqlite`] is the
//!   one backend shipped here.
//! - No schema provisioning, seeding, caching or query planning.
//!
//! # Example
//!
//! ```no_run
//! use row_stream::{SqliteConfig, SqliteStore, UserTable};
//!
//! # fn main() -> row_stream::Result<()> {
//! let store = SqliteStore::new(SqliteConfig::new("users.db"));
//! let users = UserTable::new(&store, "user_data");
//!
//! for record in users.stream_records().take(6) {
//!     println!("{}", record?);
//! }
//! users.process_batches(50)?;
//! for page in users.lazy_paginate(100)? {
//!     println!("{} users", page?.len());
//! }
//! println!("{}", users.compute_average()?);
//! # Ok(())
//! # }
//! ```

pub mod average;
pub mod batch;
pub mod config;
pub mod error;
pub mod logger;
pub mod paginate;
mod producer;
pub mod record;
pub mod sqlite;
pub mod store;
pub mod stream;
pub mod table;

pub use average::AverageAge;
pub use batch::{Batch, BatchFilter, Batches, MalformedAge, RecordFormat};
pub use error::{Result, StreamError};
pub use paginate::{Page, Pages};
pub use producer::ProducerState;
pub use record::Record;
pub use sqlite::{SqliteConfig, SqliteStore};
pub use store::{Query, Row, RowCursor, Store, StoreError, Value};
pub use stream::{AgeStream, RecordStream};
pub use table::{UserTable, DEFAULT_TABLE};
