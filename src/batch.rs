//! Fixed-size batching and the age filter that consumes it.

use std::io::{self, Write};
use std::iter::FusedIterator;

use log::{debug, warn};

use crate::error::{Result, StreamError};
use crate::record::Record;
use crate::store::Store;
use crate::stream::RecordStream;

/// Records grouped by [`Batches`]. Never empty when yielded.
pub type Batch = Vec<Record>;

/// Records strictly older than this pass the filter.
pub const AGE_THRESHOLD: i64 = 25;

/// Regroups a [`RecordStream`] into batches of `batch_size` records; the
/// last batch may be shorter.
pub struct Batches<'s, S: Store> {
    records: RecordStream<'s, S>,
    batch_size: usize,
}

impl<'s, S: Store> Batches<'s, S> {
    /// Fails before any I/O when `batch_size` is zero.
    pub(crate) fn new(records: RecordStream<'s, S>, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(StreamError::Configuration(
                "batch_size must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            records,
            batch_size,
        })
    }
}

impl<S: Store> Iterator for Batches<'_, S> {
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut batch = Vec::new();
        while batch.len() < self.batch_size {
            match self.records.next() {
                Some(Ok(record)) => batch.push(record),
                Some(Err(err)) => return Some(Err(err)),
                None => break,
            }
        }
        if batch.is_empty() {
            None
        } else {
            Some(Ok(batch))
        }
    }
}

impl<S: Store> FusedIterator for Batches<'_, S> {}

/// What the filter does with an age that cannot be read as a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedAge {
    /// Abort with [`StreamError::Coercion`].
    #[default]
    Fail,
    /// Log a warning and leave the record out.
    Skip,
}

/// How qualifying records are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordFormat {
    /// The record's display form followed by a blank line.
    #[default]
    Plain,
    /// One JSON object per line.
    Json,
}

/// Streams batches and writes every record older than [`AGE_THRESHOLD`].
#[derive(Debug, Clone, Copy)]
pub struct BatchFilter {
    batch_size: usize,
    malformed: MalformedAge,
    format: RecordFormat,
}

impl BatchFilter {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size,
            malformed: MalformedAge::default(),
            format: RecordFormat::default(),
        }
    }

    pub fn with_malformed_age(mut self, malformed: MalformedAge) -> Self {
        self.malformed = malformed;
        self
    }

    pub fn with_format(mut self, format: RecordFormat) -> Self {
        self.format = format;
        self
    }

    /// Runs the filter over `records`, writing matches to `out`.
    ///
    /// Returns the number of records written.
    pub fn run<S: Store, W: Write>(
        &self,
        records: RecordStream<'_, S>,
        out: &mut W,
    ) -> Result<usize> {
        let mut written = 0;
        for (index, batch) in Batches::new(records, self.batch_size)?.enumerate() {
            let batch = batch?;
            debug!("filtering batch {index} of {} records", batch.len());
            for record in self.filter(batch)? {
                self.write_record(&record, out)?;
                written += 1;
            }
        }
        out.flush()?;
        Ok(written)
    }

    /// Keeps records older than [`AGE_THRESHOLD`], preserving order.
    pub fn filter(&self, batch: Batch) -> Result<Vec<Record>> {
        let mut kept = Vec::new();
        for record in batch {
            match record.age_as_int() {
                Some(age) if age > AGE_THRESHOLD => kept.push(record),
                Some(_) => {}
                None => match self.malformed {
                    MalformedAge::Fail => return Err(StreamError::Coercion(record.age)),
                    MalformedAge::Skip => {
                        warn!(
                            "skipping user {}: age {} is not a number",
                            record.user_id, record.age
                        );
                    }
                },
            }
        }
        Ok(kept)
    }

    fn write_record<W: Write>(&self, record: &Record, out: &mut W) -> Result<()> {
        match self.format {
            RecordFormat::Plain => {
                writeln!(out, "{record}")?;
                writeln!(out)?;
            }
            RecordFormat::Json => {
                serde_json::to_writer(&mut *out, record).map_err(io::Error::from)?;
                writeln!(out)?;
            }
        }
        Ok(())
    }
}
