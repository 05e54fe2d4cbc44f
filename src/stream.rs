//! Row-by-row producers.

use std::iter::FusedIterator;

use crate::error::{Result, StreamError};
use crate::producer::{Producer, ProducerState};
use crate::record::{coerce_age, Record, RECORD_COLUMNS};
use crate::store::{Query, Store, StoreError};

/// Lazy sequence of [`Record`]s over an unbounded projection.
///
/// The query is issued on the first call to `next`; the connection is held
/// until the sequence is exhausted, fails, or is dropped.
pub struct RecordStream<'s, S: Store> {
    producer: Producer<'s, S>,
}

impl<'s, S: Store> RecordStream<'s, S> {
    pub(crate) fn new(store: &'s S, table: &str) -> Self {
        Self {
            producer: Producer::new(store, Query::select(table, &RECORD_COLUMNS)),
        }
    }

    pub fn state(&self) -> ProducerState {
        self.producer.state()
    }
}

impl<S: Store> Iterator for RecordStream<'_, S> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = match self.producer.next_row()? {
            Ok(row) => row,
            Err(err) => return Some(Err(err.into())),
        };
        match Record::from_row(row) {
            Ok(record) => Some(Ok(record)),
            Err(err) => {
                self.producer.abort();
                Some(Err(err.into()))
            }
        }
    }
}

impl<S: Store> FusedIterator for RecordStream<'_, S> {}

/// Lazy sequence of integer ages, projecting only the `age` column.
///
/// An age that cannot be coerced is fatal: it is returned as
/// [`StreamError::Coercion`] and the sequence ends.
pub struct AgeStream<'s, S: Store> {
    producer: Producer<'s, S>,
}

impl<'s, S: Store> AgeStream<'s, S> {
    pub(crate) fn new(store: &'s S, table: &str) -> Self {
        Self {
            producer: Producer::new(store, Query::select(table, &["age"])),
        }
    }

    pub fn state(&self) -> ProducerState {
        self.producer.state()
    }
}

impl<S: Store> Iterator for AgeStream<'_, S> {
    type Item = Result<i64>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut row = match self.producer.next_row()? {
            Ok(row) => row,
            Err(err) => return Some(Err(err.into())),
        };
        let Some(age) = row.take("age") else {
            self.producer.abort();
            return Some(Err(StoreError::MissingColumn("age".to_string()).into()));
        };
        match coerce_age(&age) {
            Some(age) => Some(Ok(age)),
            None => {
                self.producer.abort();
                Some(Err(StreamError::Coercion(age)))
            }
        }
    }
}

impl<S: Store> FusedIterator for AgeStream<'_, S> {}
