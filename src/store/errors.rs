//! Store error types

use std::path::PathBuf;

use thiserror::Error;

/// Errors a partition store reports for a single call
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("partition '{0}' not found")]
    UnknownPartition(String),

    #[error("partition '{partition}' unavailable: {reason}")]
    Unavailable { partition: String, reason: String },

    #[error("malformed document in partition '{partition}': {reason}")]
    Decode { partition: String, reason: String },

    #[error("store internal error: {0}")]
    Internal(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised while loading a collection export directory
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed collection file {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type LoadResult<T> = Result<T, LoadError>;
