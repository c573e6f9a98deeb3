//! Overlay that adds one computed, never-persisted context to a store.
//!
//! The content of the `default` context comes from the host (environment
//! variables, legacy configuration, ...) through a resolver closure that is
//! called again on every read. Writes to the reserved name are rejected with
//! fixed business-rule errors; every other name goes to the inner store.

use std::error::Error;
use std::fmt;
use std::path::PathBuf;

use ctx_types::{ContextMetadata, ContextTlsData, EndpointFiles, EndpointTlsData, StorageInfo};

use crate::error::{StoreError, StoreResult};
use crate::traits::{
    ContextLister, ContextReader, ContextStore, ContextWriter, StorageInfoProvider,
};

/// Reserved name of the computed context.
pub const DEFAULT_CONTEXT_NAME: &str = "default";

/// Storage path reported for the default context, which has no files.
pub const IN_MEMORY_PATH: &str = "<IN MEMORY>";

/// Error type resolvers may return.
pub type ResolverError = Box<dyn Error + Send + Sync>;

/// The computed content of the default context.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DefaultContext {
    pub meta: ContextMetadata,
    pub tls: ContextTlsData,
}

/// A [`ContextStore`] decorated with the virtual `default` context.
pub struct DefaultContextStore<S, R> {
    inner: S,
    resolver: R,
}

impl<S, R> DefaultContextStore<S, R>
where
    S: ContextStore,
    R: Fn() -> Result<DefaultContext, ResolverError> + Send + Sync,
{
    pub fn new(inner: S, resolver: R) -> Self {
        Self { inner, resolver }
    }

    /// The decorated store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Run the resolver. The returned record is always named `default`.
    pub fn resolve(&self) -> StoreResult<DefaultContext> {
        let mut context = (self.resolver)().map_err(StoreError::DefaultContextResolution)?;
        context.meta.name = DEFAULT_CONTEXT_NAME.to_string();
        Ok(context)
    }
}

fn is_default(name: &str) -> bool {
    name == DEFAULT_CONTEXT_NAME
}

impl<S, R> ContextReader for DefaultContextStore<S, R>
where
    S: ContextStore,
    R: Fn() -> Result<DefaultContext, ResolverError> + Send + Sync,
{
    fn get_metadata(&self, name: &str) -> StoreResult<ContextMetadata> {
        if is_default(name) {
            return Ok(self.resolve()?.meta);
        }
        self.inner.get_metadata(name)
    }

    fn list_tls_files(&self, name: &str) -> StoreResult<EndpointFiles> {
        if is_default(name) {
            return Ok(self.resolve()?.tls.file_names());
        }
        self.inner.list_tls_files(name)
    }

    fn get_tls_data(&self, name: &str, endpoint: &str, file: &str) -> StoreResult<Vec<u8>> {
        if !is_default(name) {
            return self.inner.get_tls_data(name, endpoint, file);
        }
        self.resolve()?
            .tls
            .file(endpoint, file)
            .map(<[u8]>::to_vec)
            .ok_or_else(|| StoreError::TlsDataNotFound {
                context: DEFAULT_CONTEXT_NAME.to_string(),
                endpoint: endpoint.to_string(),
                file: file.to_string(),
            })
    }
}

impl<S, R> ContextLister for DefaultContextStore<S, R>
where
    S: ContextStore,
    R: Fn() -> Result<DefaultContext, ResolverError> + Send + Sync,
{
    /// Inner contexts followed by the freshly resolved default context.
    ///
    /// A persisted context that happens to use the reserved name is hidden,
    /// so the listing holds exactly one `default` entry.
    fn list(&self) -> StoreResult<Vec<ContextMetadata>> {
        let mut contexts: Vec<ContextMetadata> = self
            .inner
            .list()?
            .into_iter()
            .filter(|meta| !is_default(&meta.name))
            .collect();
        contexts.push(self.resolve()?.meta);
        Ok(contexts)
    }
}

impl<S, R> ContextWriter for DefaultContextStore<S, R>
where
    S: ContextStore,
    R: Fn() -> Result<DefaultContext, ResolverError> + Send + Sync,
{
    fn create_or_update(&self, meta: &ContextMetadata) -> StoreResult<()> {
        if is_default(&meta.name) {
            return Err(StoreError::DefaultContextNotWritable);
        }
        self.inner.create_or_update(meta)
    }

    fn remove(&self, name: &str) -> StoreResult<()> {
        if is_default(name) {
            return Err(StoreError::DefaultContextNotRemovable);
        }
        self.inner.remove(name)
    }

    fn reset_tls_material(&self, name: &str, data: Option<&ContextTlsData>) -> StoreResult<()> {
        if is_default(name) {
            return Err(StoreError::DefaultContextNotEditable);
        }
        self.inner.reset_tls_material(name, data)
    }

    fn reset_endpoint_tls_material(
        &self,
        name: &str,
        endpoint: &str,
        data: Option<&EndpointTlsData>,
    ) -> StoreResult<()> {
        if is_default(name) {
            return Err(StoreError::DefaultContextNotEditable);
        }
        self.inner.reset_endpoint_tls_material(name, endpoint, data)
    }
}

impl<S, R> StorageInfoProvider for DefaultContextStore<S, R>
where
    S: ContextStore,
    R: Fn() -> Result<DefaultContext, ResolverError> + Send + Sync,
{
    fn storage_info(&self, name: &str) -> StorageInfo {
        if is_default(name) {
            return StorageInfo {
                metadata_path: PathBuf::from(IN_MEMORY_PATH),
                tls_path: PathBuf::from(IN_MEMORY_PATH),
            };
        }
        self.inner.storage_info(name)
    }
}

impl<S: fmt::Debug, R> fmt::Debug for DefaultContextStore<S, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultContextStore")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}
