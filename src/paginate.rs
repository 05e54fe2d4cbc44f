//! Limit/offset pagination.
//!
//! Every page is a separate query on a separate connection; nothing is held
//! open between pages.

use std::iter::FusedIterator;

use log::debug;

use crate::error::{Result, StreamError};
use crate::record::Record;
use crate::store::{Query, RowCursor, Store};

/// Records returned by one bounded query. At most `page_size` long.
pub type Page = Vec<Record>;

/// Runs `SELECT * FROM <table> LIMIT <page_size> OFFSET <offset>` on a fresh
/// connection, collects the rows and releases the connection.
pub fn fetch_page<S: Store>(
    store: &S,
    table: &str,
    page_size: usize,
    offset: usize,
) -> Result<Page> {
    let query = Query::all(table).with_limit(page_size).with_offset(offset);
    debug!("fetching page: {query}");

    let mut cursor = store.open(&query)?;
    let mut page = Vec::new();
    while let Some(row) = cursor.next_row()? {
        page.push(Record::from_row(row)?);
    }
    Ok(page)
}

/// Lazy sequence of non-empty pages, advancing the offset by `page_size`
/// after each one. Ends on the first empty page or after an error.
pub struct Pages<'s, S: Store> {
    store: &'s S,
    table: String,
    page_size: usize,
    offset: usize,
    done: bool,
}

impl<'s, S: Store> Pages<'s, S> {
    pub(crate) fn new(store: &'s S, table: &str, page_size: usize) -> Result<Self> {
        if page_size == 0 {
            return Err(StreamError::Configuration(
                "page_size must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            store,
            table: table.to_string(),
            page_size,
            offset: 0,
            done: false,
        })
    }

    /// Offset the next page will be requested at.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl<S: Store> Iterator for Pages<'_, S> {
    type Item = Result<Page>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match fetch_page(self.store, &self.table, self.page_size, self.offset) {
            Ok(page) if page.is_empty() => {
                debug!("no rows at offset {}; pagination done", self.offset);
                self.done = true;
                None
            }
            Ok(page) => {
                self.offset = self.offset.saturating_add(self.page_size);
                Some(Ok(page))
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

impl<S: Store> FusedIterator for Pages<'_, S> {}
