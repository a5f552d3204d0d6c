//! Error types for the persistence layer.
//!
//! Engine operations never fail outward; these errors only travel as far as the
//! gateway, which logs them and carries on with in-memory state.

use std::path::PathBuf;
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt selection state under key '{key}': {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not serialize selection state: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("unsupported selection state version {found} under key '{key}'")]
    UnsupportedVersion { key: String, found: u32 },

    /// Raised by stores that refuse writes (tests, read-only mounts).
    #[error("store is unavailable: {0}")]
    Unavailable(String),
}
