use std::path::PathBuf;

use thiserror::Error;

/// Durable store failures. The gate logs these and carries on without the store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to (de)serialize entry: {message}")]
    Serialization { message: String },

    #[error("store task failed: {message}")]
    Task { message: String },
}

pub type StoreResult<T> = Result<T, StoreError>;
