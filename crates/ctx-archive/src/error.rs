use ctx_store::StoreError;
use thiserror::Error;

/// Errors from archive export and import.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// An entry path is not `meta.json` or `tls/<endpoint>/<file>`, or would
    /// escape its directory.
    #[error("invalid archive path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    /// The archive holds no `meta.json` entry.
    #[error("invalid context archive: no metadata found")]
    MissingMetadata,

    /// An entry ended before the size announced in its header.
    #[error("archive entry {path:?} is truncated")]
    Truncated { path: String },

    /// The input exceeded the import bound.
    #[error("archive exceeds the maximum size of {limit} bytes")]
    TooLarge { limit: u64 },

    /// The export producer thread panicked.
    #[error("archive producer panicked")]
    ProducerPanicked,

    /// Reading from or writing to the store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// `meta.json` could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error on the archive stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for archive operations.
pub type ArchiveResult<T> = Result<T, ArchiveError>;
