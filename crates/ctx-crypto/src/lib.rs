//! Name hashing for ctxstore.
//!
//! A context name is never used as a path. Each store is handed a
//! [`NameHasher`] at construction and derives the on-disk [`ContextId`] from
//! it, which removes traversal and path-length hazards deterministically.
//!
//! Both hashers wrap established libraries, no custom cryptography.
//!
//! [`ContextId`]: ctx_types::ContextId

pub mod hasher;

pub use hasher::{Blake3NameHasher, NameHasher, Sha256NameHasher};
