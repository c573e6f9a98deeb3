use thiserror::Error;

/// Errors from context store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No context with this name exists.
    #[error("context {name:?} does not exist")]
    ContextNotFound { name: String },

    /// The context exists (or not), but this TLS file does not.
    #[error("TLS data for {context}/{endpoint}/{file} does not exist")]
    TlsDataNotFound {
        context: String,
        endpoint: String,
        file: String,
    },

    /// A stored TLS file is larger than the configured read bound.
    #[error("TLS file {path} exceeds the maximum size of {limit} bytes")]
    TlsDataTooLarge { path: String, limit: u64 },

    /// An endpoint or file name would not stay inside its directory.
    #[error("invalid {what} {segment:?}: {reason}")]
    InvalidPathSegment {
        what: &'static str,
        segment: String,
        reason: String,
    },

    /// The default context is computed, it cannot be written.
    #[error("default context cannot be created nor updated")]
    DefaultContextNotWritable,

    /// The default context is computed, it cannot be removed.
    #[error("default context cannot be removed")]
    DefaultContextNotRemovable,

    /// The default context's TLS material cannot be replaced.
    #[error("default context cannot be edited")]
    DefaultContextNotEditable,

    /// The resolver supplied by the host failed.
    #[error("failed to resolve default context: {0}")]
    DefaultContextResolution(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The store configuration could not be loaded.
    #[error("invalid store configuration: {0}")]
    Config(String),

    /// JSON encoding or decoding failure.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error from the underlying filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Returns `true` for the NotFound-shaped variants.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ContextNotFound { .. } | Self::TlsDataNotFound { .. }
        )
    }

    /// Returns `true` for the business-rule errors raised by the default
    /// context overlay.
    pub fn is_default_context_violation(&self) -> bool {
        matches!(
            self,
            Self::DefaultContextNotWritable
                | Self::DefaultContextNotRemovable
                | Self::DefaultContextNotEditable
        )
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
