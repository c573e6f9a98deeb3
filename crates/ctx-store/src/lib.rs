//! File-backed, content-addressed context store.
//!
//! A *context* bundles the endpoint records a command-line tool needs to
//! reach a remote target, plus the TLS material to authenticate to it. This
//! crate persists contexts under a single root directory:
//!
//! ```text
//! <root>/meta/<ContextId>/meta.json
//! <root>/tls/<ContextId>/<endpoint>/<file>
//! ```
//!
//! where `ContextId` is a digest of the context name (see `ctx-crypto`), so
//! arbitrary names can never escape the root.
//!
//! # Layers
//!
//! - [`MetadataStore`] -- JSON records keyed by directory-safe strings
//! - [`TlsStore`] -- raw TLS blobs keyed by (key, endpoint, file), `0600`
//! - [`FileContextStore`] -- name → digest mapping over both, implementing
//!   the [`ContextReader`], [`ContextLister`], [`ContextWriter`] and
//!   [`StorageInfoProvider`] traits
//! - [`DefaultContextStore`] -- overlay adding the computed `default` context
//!
//! Records are decoded through a [`TypeRegistry`]; kinds without a
//! registered type round-trip as generic JSON.
//!
//! # Design Rules
//!
//! 1. Names are hashed, never joined onto paths. Endpoint and file names are
//!    validated as single path segments before any join.
//! 2. Lower layers report absence as `None`; the facade builds NotFound
//!    errors carrying the user-facing name.
//! 3. TLS material is replaced, never merged.
//! 4. All I/O errors are propagated. There are no retries and no locking:
//!    concurrent writers to the same name race, the last one wins.

pub mod config;
pub mod default_context;
pub mod error;
mod fsutil;
pub mod metadata;
pub mod names;
pub mod registry;
pub mod store;
pub mod tls;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use config::StoreConfig;
pub use default_context::{
    DefaultContext, DefaultContextStore, ResolverError, DEFAULT_CONTEXT_NAME, IN_MEMORY_PATH,
};
pub use error::{StoreError, StoreResult};
pub use metadata::{MetadataStore, META_FILE};
pub use registry::TypeRegistry;
pub use store::FileContextStore;
pub use tls::TlsStore;
pub use traits::{ContextLister, ContextReader, ContextStore, ContextWriter, StorageInfoProvider};

pub use ctx_types::{
    ContextId, ContextMetadata, ContextTlsData, EndpointFiles, EndpointTlsData, Payload,
    StorageInfo,
};
