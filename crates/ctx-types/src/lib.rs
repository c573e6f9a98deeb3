//! Foundation types for ctxstore.
//!
//! A *context* is a named bundle describing how a command-line tool reaches
//! one or more remote endpoints, plus the TLS material needed to
//! authenticate to them. Every other ctxstore crate depends on `ctx-types`.
//!
//! # Key Types
//!
//! - [`ContextId`] -- Digest of a context name, used as its on-disk directory
//! - [`Payload`] -- Either generic JSON or a typed value decoded through a registry
//! - [`ContextMetadata`] -- The persisted record: name, metadata, endpoints
//! - [`EndpointTlsData`] / [`ContextTlsData`] -- Raw TLS files per endpoint
//! - [`StorageInfo`] -- Physical paths backing one context

pub mod id;
pub mod metadata;
pub mod payload;
pub mod tls;

pub use id::ContextId;
pub use metadata::{ContextMetadata, StorageInfo};
pub use payload::{ErasedPayload, Payload, TypedPayload};
pub use tls::{ContextTlsData, EndpointFiles, EndpointTlsData};
