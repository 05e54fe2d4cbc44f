//! Error types surfaced by the producers and consumers.

use std::io;

use thiserror::Error;

use crate::store::{StoreError, Value};

/// Errors returned by every sequence producer and consumer in this crate.
#[derive(Error, Debug)]
pub enum StreamError {
    /// Invalid arguments to a producer, rejected before any I/O.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The store refused a connection, a query failed, or a row could not be
    /// decoded. Always fatal to the producer that raised it.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// An age value could not be converted to an integer on a path where
    /// conversion is mandatory.
    #[error("age value {0} cannot be converted to an integer")]
    Coercion(Value),

    /// Writing consumer output failed.
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

pub type Result<T, E = StreamError> = std::result::Result<T, E>;
