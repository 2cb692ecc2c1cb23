//! Error handling for instiflow
//!
//! Defines the ingestion/reporting error taxonomy and establishes a unified
//! Result type using anyhow for context chaining and error propagation.
//!
//! Duplicate natural keys are deliberately NOT an error variant: they are a
//! routed branch of the ingestion pipeline (skip or replace, per the target
//! collection's declared policy).

use thiserror::Error;

/// Core error types for flow-tracker operations
#[derive(Error, Debug)]
pub enum FlowError {
    /// Header mismatch, malformed date, non-numeric required field
    #[error("format error: {0}")]
    Format(String),

    /// Spreadsheet totals mismatch or unmapped city; surfaced, never blocking
    #[error("reconciliation warning: {0}")]
    Reconciliation(String),

    /// A store write failed mid-batch; earlier chunks stay committed
    #[error("persistence error after {chunks_committed} committed chunk(s): {message}")]
    Persistence {
        chunks_committed: usize,
        message: String,
    },

    /// Duplicate quarter worksheets, unparseable worksheet names
    #[error("ambiguous input: {0}")]
    AmbiguousInput(String),

    #[error("database error: {0}")]
    Db(String),

    #[error("io error")]
    Io(#[from] std::io::Error),
}

/// Result type alias for flow-tracker operations
pub type Result<T> = anyhow::Result<T>;
