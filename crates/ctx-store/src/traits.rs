//! Read/write boundaries of a context store.
//!
//! The file-backed [`FileContextStore`](crate::FileContextStore) and the
//! [`DefaultContextStore`](crate::DefaultContextStore) overlay both implement
//! these traits, and the archive codec is written against them. Every method
//! takes the user-facing context name; mapping it to a storage key is the
//! implementation's business.

use ctx_types::{ContextMetadata, ContextTlsData, EndpointFiles, EndpointTlsData, StorageInfo};

use crate::error::StoreResult;

/// Read access to single contexts.
pub trait ContextReader: Send + Sync {
    /// Read a context's record.
    ///
    /// Fails with [`StoreError::ContextNotFound`](crate::StoreError::ContextNotFound)
    /// if no context has this name.
    fn get_metadata(&self, name: &str) -> StoreResult<ContextMetadata>;

    /// Endpoint name → file names of the context's TLS material.
    ///
    /// A context without TLS material (or an unknown one) yields an empty map.
    fn list_tls_files(&self, name: &str) -> StoreResult<EndpointFiles>;

    /// Read one TLS file.
    ///
    /// Fails with [`StoreError::TlsDataNotFound`](crate::StoreError::TlsDataNotFound)
    /// if the (context, endpoint, file) triple does not exist.
    fn get_tls_data(&self, name: &str, endpoint: &str, file: &str) -> StoreResult<Vec<u8>>;

    /// Read every TLS file of a context into memory.
    fn get_tls_material(&self, name: &str) -> StoreResult<ContextTlsData> {
        let mut material = ContextTlsData::new();
        for (endpoint, files) in self.list_tls_files(name)? {
            let data = material.endpoint_mut(&endpoint);
            for file in files {
                let bytes = self.get_tls_data(name, &endpoint, &file)?;
                data.insert(file, bytes);
            }
        }
        Ok(material)
    }
}

/// Enumeration of all contexts.
pub trait ContextLister: Send + Sync {
    /// All context records.
    fn list(&self) -> StoreResult<Vec<ContextMetadata>>;

    /// Names of all contexts, in listing order.
    fn names(&self) -> StoreResult<Vec<String>> {
        Ok(self.list()?.into_iter().map(|meta| meta.name).collect())
    }
}

/// Mutation of contexts.
pub trait ContextWriter: Send + Sync {
    /// Create the context named `meta.name`, or overwrite its record.
    fn create_or_update(&self, meta: &ContextMetadata) -> StoreResult<()>;

    /// Delete a context's record and TLS material. Idempotent.
    fn remove(&self, name: &str) -> StoreResult<()>;

    /// Replace all TLS material of a context. `None` only clears it.
    fn reset_tls_material(&self, name: &str, data: Option<&ContextTlsData>) -> StoreResult<()>;

    /// Replace the TLS material of one endpoint. `None` only clears it.
    fn reset_endpoint_tls_material(
        &self,
        name: &str,
        endpoint: &str,
        data: Option<&EndpointTlsData>,
    ) -> StoreResult<()>;
}

/// Diagnostics: where a context lives on disk.
pub trait StorageInfoProvider: Send + Sync {
    /// Physical directories of a context. Performs no I/O.
    fn storage_info(&self, name: &str) -> StorageInfo;
}

/// A complete context store.
pub trait ContextStore: ContextReader + ContextLister + ContextWriter + StorageInfoProvider {}

impl<T> ContextStore for T where
    T: ContextReader + ContextLister + ContextWriter + StorageInfoProvider + ?Sized
{
}
