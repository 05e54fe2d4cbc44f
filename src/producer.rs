//! Lifecycle shared by every lazy row producer.
//!
//! ```text
//! Idle ──first pull──▶ Open ──┬─ exhausted ─▶ Exhausted
//!   │                         ├─ error ─────▶ Failed
//!   └─ open error ─▶ Failed   └─ dropped ───▶ Cancelled
//! ```
//!
//! Every terminal transition goes through [`Producer::finish`], which drops
//! the cursor and with it the store connection.

use log::debug;

use crate::store::{Query, Row, RowCursor, Store, StoreError};

/// Where a producer is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProducerState {
    /// Nothing acquired yet; the query is issued on the first pull.
    Idle,
    /// A cursor is held and rows are being produced.
    Open,
    /// All rows were produced and the cursor released.
    Exhausted,
    /// An error was surfaced and the cursor released.
    Failed,
    /// The consumer stopped early and the cursor was released.
    ///
    /// Reached only when a producer is dropped while open, so callers see
    /// it in the `debug!` log rather than through `state()`.
    Cancelled,
}

impl ProducerState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ProducerState::Idle | ProducerState::Open)
    }
}

pub(crate) struct Producer<'s, S: Store> {
    store: &'s S,
    query: Query,
    cursor: Option<S::Cursor>,
    state: ProducerState,
}

impl<'s, S: Store> Producer<'s, S> {
    pub(crate) fn new(store: &'s S, query: Query) -> Self {
        Self {
            store,
            query,
            cursor: None,
            state: ProducerState::Idle,
        }
    }

    pub(crate) fn state(&self) -> ProducerState {
        self.state
    }

    /// Pulls the next row, opening the cursor on first use.
    ///
    /// Returns `None` once a terminal state is reached; an error is returned
    /// exactly once, after the cursor has already been released.
    pub(crate) fn next_row(&mut self) -> Option<Result<Row, StoreError>> {
        match self.state {
            ProducerState::Idle => {
                debug!("opening query: {}", self.query);
                match self.store.open(&self.query) {
                    Ok(cursor) => {
                        self.cursor = Some(cursor);
                        self.state = ProducerState::Open;
                    }
                    Err(err) => {
                        self.finish(ProducerState::Failed);
                        return Some(Err(err));
                    }
                }
            }
            ProducerState::Open => {}
            _ => return None,
        }

        let cursor = self.cursor.as_mut()?;
        match cursor.next_row() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.finish(ProducerState::Exhausted);
                None
            }
            Err(err) => {
                self.finish(ProducerState::Failed);
                Some(Err(err))
            }
        }
    }

    /// Marks the producer failed after a downstream decode error.
    pub(crate) fn abort(&mut self) {
        if !self.state.is_terminal() {
            self.finish(ProducerState::Failed);
        }
    }

    /// Releases an open cursor ahead of exhaustion.
    fn cancel(&mut self) {
        if self.state == ProducerState::Open {
            self.finish(ProducerState::Cancelled);
        }
    }

    fn finish(&mut self, state: ProducerState) {
        let released = self.cursor.take().is_some();
        self.state = state;
        debug!(
            "query on {} finished as {:?} (cursor released: {released})",
            self.query.table, state
        );
    }
}

impl<S: Store> Drop for Producer<'_, S> {
    fn drop(&mut self) {
        self.cancel();
    }
}
