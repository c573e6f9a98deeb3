use std::fmt;
use std::sync::Arc;

use ctx_crypto::{NameHasher, Sha256NameHasher};
use ctx_types::{
    ContextId, ContextMetadata, ContextTlsData, EndpointFiles, EndpointTlsData, StorageInfo,
};
use tracing::debug;

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::metadata::MetadataStore;
use crate::names::{validate_endpoint_name, validate_file_name};
use crate::registry::TypeRegistry;
use crate::tls::TlsStore;
use crate::traits::{ContextLister, ContextReader, ContextWriter, StorageInfoProvider};

/// File-backed, content-addressed context store.
///
/// Composes a [`MetadataStore`] rooted at `<root>/meta` and a [`TlsStore`]
/// rooted at `<root>/tls`. Context names are never used as paths: each name
/// is hashed to a [`ContextId`] whose hex form is the directory name in both
/// trees. The lower stores only see that key and report absence as `None`;
/// this type, which knows both key and name, builds the NotFound errors.
pub struct FileContextStore {
    meta: MetadataStore,
    tls: TlsStore,
    hasher: Arc<dyn NameHasher>,
}

impl FileContextStore {
    /// Open a store with the SHA-256 name hasher.
    pub fn new(config: &StoreConfig, registry: TypeRegistry) -> Self {
        Self::with_hasher(config, registry, Arc::new(Sha256NameHasher))
    }

    /// Open a store with an explicit name hasher.
    pub fn with_hasher(
        config: &StoreConfig,
        registry: TypeRegistry,
        hasher: Arc<dyn NameHasher>,
    ) -> Self {
        Self {
            meta: MetadataStore::new(config.metadata_root(), registry)
                .with_max_depth(config.max_list_depth),
            tls: TlsStore::new(config.tls_root(), config.max_tls_file_size),
            hasher,
        }
    }

    /// The on-disk identifier of `name`.
    pub fn context_id(&self, name: &str) -> ContextId {
        self.hasher.context_id(name)
    }

    pub fn hasher(&self) -> &dyn NameHasher {
        self.hasher.as_ref()
    }

    pub fn registry(&self) -> &TypeRegistry {
        self.meta.registry()
    }

    fn key(&self, name: &str) -> String {
        self.context_id(name).to_hex()
    }

    fn write_endpoint_files(&self, key: &str, endpoint: &str, data: &EndpointTlsData) -> StoreResult<()> {
        for (file, bytes) in &data.files {
            self.tls.create_or_update(key, endpoint, file, bytes)?;
        }
        Ok(())
    }
}

/// Reject bad names before anything is deleted.
fn validate_endpoint_data(endpoint: &str, data: &EndpointTlsData) -> StoreResult<()> {
    validate_endpoint_name(endpoint)?;
    data.files.keys().try_for_each(|file| validate_file_name(file))
}

impl ContextReader for FileContextStore {
    fn get_metadata(&self, name: &str) -> StoreResult<ContextMetadata> {
        self.meta
            .get(&self.key(name))?
            .ok_or_else(|| StoreError::ContextNotFound {
                name: name.to_string(),
            })
    }

    fn list_tls_files(&self, name: &str) -> StoreResult<EndpointFiles> {
        self.tls.list_context_data(&self.key(name))
    }

    fn get_tls_data(&self, name: &str, endpoint: &str, file: &str) -> StoreResult<Vec<u8>> {
        self.tls
            .get_data(&self.key(name), endpoint, file)?
            .ok_or_else(|| StoreError::TlsDataNotFound {
                context: name.to_string(),
                endpoint: endpoint.to_string(),
                file: file.to_string(),
            })
    }
}

impl ContextLister for FileContextStore {
    fn list(&self) -> StoreResult<Vec<ContextMetadata>> {
        Ok(self.meta.list()?.into_iter().map(|(_, meta)| meta).collect())
    }
}

impl ContextWriter for FileContextStore {
    fn create_or_update(&self, meta: &ContextMetadata) -> StoreResult<()> {
        let id = self.context_id(&meta.name);
        self.meta.create_or_update(&id.to_hex(), meta)?;
        debug!(name = %meta.name, id = %id.short_hex(), "context saved");
        Ok(())
    }

    fn remove(&self, name: &str) -> StoreResult<()> {
        let id = self.context_id(name);
        let key = id.to_hex();
        self.meta.remove(&key)?;
        self.tls.remove_all_context_data(&key)?;
        debug!(name, id = %id.short_hex(), "context removed");
        Ok(())
    }

    fn reset_tls_material(&self, name: &str, data: Option<&ContextTlsData>) -> StoreResult<()> {
        if let Some(data) = data {
            for (endpoint, files) in &data.endpoints {
                validate_endpoint_data(endpoint, files)?;
            }
        }

        let key = self.key(name);
        self.tls.remove_all_context_data(&key)?;
        if let Some(data) = data {
            for (endpoint, files) in &data.endpoints {
                self.write_endpoint_files(&key, endpoint, files)?;
            }
        }
        debug!(name, "TLS material reset");
        Ok(())
    }

    fn reset_endpoint_tls_material(
        &self,
        name: &str,
        endpoint: &str,
        data: Option<&EndpointTlsData>,
    ) -> StoreResult<()> {
        match data {
            Some(data) => validate_endpoint_data(endpoint, data)?,
            None => validate_endpoint_name(endpoint)?,
        }

        let key = self.key(name);
        self.tls.remove_all_endpoint_data(&key, endpoint)?;
        if let Some(data) = data {
            self.write_endpoint_files(&key, endpoint, data)?;
        }
        debug!(name, endpoint, "endpoint TLS material reset");
        Ok(())
    }
}

impl StorageInfoProvider for FileContextStore {
    fn storage_info(&self, name: &str) -> StorageInfo {
        let key = self.key(name);
        StorageInfo {
            metadata_path: self.meta.context_dir(&key),
            tls_path: self.tls.context_dir(&key),
        }
    }
}

impl fmt::Debug for FileContextStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileContextStore")
            .field("metadata_root", &self.meta.root())
            .field("tls_root", &self.tls.root())
            .field("hasher", &self.hasher.algorithm())
            .finish()
    }
}
