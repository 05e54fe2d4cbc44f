//! Entry point binding a store to the users table.

use std::io::{self, Write};

use crate::average::{average_of, AverageAge};
use crate::batch::{BatchFilter, Batches};
use crate::error::Result;
use crate::paginate::{fetch_page, Page, Pages};
use crate::store::Store;
use crate::stream::{AgeStream, RecordStream};

/// Table read when none is configured.
pub const DEFAULT_TABLE: &str = "user_data";

/// A users table inside a [`Store`].
///
/// Every producer returned here is lazy and owns its own store connection;
/// nothing is shared between two producers.
pub struct UserTable<'s, S: Store> {
    store: &'s S,
    table: String,
}

impl<'s, S: Store> UserTable<'s, S> {
    pub fn new(store: &'s S, table: impl Into<String>) -> Self {
        Self {
            store,
            table: table.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.table
    }

    /// One record at a time over `SELECT user_id, name, email, age`.
    pub fn stream_records(&self) -> RecordStream<'s, S> {
        RecordStream::new(self.store, &self.table)
    }

    /// Records in batches of `batch_size`. Fails immediately on zero.
    pub fn stream_batches(&self, batch_size: usize) -> Result<Batches<'s, S>> {
        Batches::new(self.stream_records(), batch_size)
    }

    /// Prints every record older than 25 to stdout, one per line followed by
    /// a blank line.
    pub fn process_batches(&self, batch_size: usize) -> Result<()> {
        let stdout = io::stdout();
        self.process_batches_with(BatchFilter::new(batch_size), &mut stdout.lock())?;
        Ok(())
    }

    /// Runs `filter` over this table, writing to `out`. Returns the number of
    /// records written.
    pub fn process_batches_with<W: Write>(&self, filter: BatchFilter, out: &mut W) -> Result<usize> {
        filter.run(self.stream_records(), out)
    }

    pub fn fetch_page(&self, page_size: usize, offset: usize) -> Result<Page> {
        fetch_page(self.store, &self.table, page_size, offset)
    }

    /// Pages of `page_size` starting at offset 0. Fails immediately on zero.
    pub fn lazy_paginate(&self, page_size: usize) -> Result<Pages<'s, S>> {
        Pages::new(self.store, &self.table, page_size)
    }

    /// One age at a time over `SELECT age`.
    pub fn stream_ages(&self) -> AgeStream<'s, S> {
        AgeStream::new(self.store, &self.table)
    }

    pub fn compute_average(&self) -> Result<AverageAge> {
        average_of(self.stream_ages())
    }

    /// Computes the average and prints its summary line to stdout.
    pub fn print_average(&self) -> Result<AverageAge> {
        let average = self.compute_average()?;
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{average}")?;
        Ok(average)
    }
}

impl<S: Store> Clone for UserTable<'_, S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store,
            table: self.table.clone(),
        }
    }
}
