//! Raw TLS blob persistence at `<root>/<key>/<endpoint>/<file>`.
//!
//! This tree holds private key material, so it is written more restrictively
//! than the metadata tree: endpoint directories are `0700` and files `0600`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ctx_types::EndpointFiles;
use tracing::debug;

use crate::error::StoreResult;
use crate::fsutil;
use crate::names::{validate_endpoint_name, validate_file_name};

const DIR_MODE: u32 = 0o700;
const FILE_MODE: u32 = 0o600;

/// Stores TLS files per (key, endpoint, file name).
#[derive(Clone, Debug)]
pub struct TlsStore {
    root: PathBuf,
    max_file_size: u64,
}

impl TlsStore {
    /// Create a store rooted at `root`, bounding reads to `max_file_size` bytes.
    pub fn new(root: impl Into<PathBuf>, max_file_size: u64) -> Self {
        Self {
            root: root.into(),
            max_file_size,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding all TLS data for `key`. Path computation only.
    pub fn context_dir(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    fn endpoint_dir(&self, key: &str, endpoint: &str) -> StoreResult<PathBuf> {
        validate_endpoint_name(endpoint)?;
        Ok(fsutil::join_key(&self.root, key)?.join(endpoint))
    }

    fn file_path(&self, key: &str, endpoint: &str, file: &str) -> StoreResult<PathBuf> {
        validate_file_name(file)?;
        Ok(self.endpoint_dir(key, endpoint)?.join(file))
    }

    /// Write one file, replacing any previous content.
    pub fn create_or_update(
        &self,
        key: &str,
        endpoint: &str,
        file: &str,
        data: &[u8],
    ) -> StoreResult<()> {
        let path = self.file_path(key, endpoint, file)?;
        let endpoint_dir = self.endpoint_dir(key, endpoint)?;
        fsutil::create_dir_all(&endpoint_dir, DIR_MODE)?;
        fsutil::write_file(&path, data, FILE_MODE)?;
        debug!(key, endpoint, file, bytes = data.len(), "TLS file written");
        Ok(())
    }

    /// Read one file.
    ///
    /// Returns `Ok(None)` if it does not exist and
    /// [`StoreError::TlsDataTooLarge`](crate::StoreError::TlsDataTooLarge)
    /// if it exceeds the configured bound.
    pub fn get_data(&self, key: &str, endpoint: &str, file: &str) -> StoreResult<Option<Vec<u8>>> {
        let path = self.file_path(key, endpoint, file)?;
        fsutil::read_bounded(&path, self.max_file_size)
    }

    /// Delete one file. Idempotent.
    pub fn remove(&self, key: &str, endpoint: &str, file: &str) -> StoreResult<()> {
        let path = self.file_path(key, endpoint, file)?;
        fsutil::remove_file(&path)?;
        Ok(())
    }

    /// Delete every file of one endpoint. Idempotent.
    pub fn remove_all_endpoint_data(&self, key: &str, endpoint: &str) -> StoreResult<()> {
        let dir = self.endpoint_dir(key, endpoint)?;
        fsutil::remove_dir_all(&dir)?;
        debug!(key, endpoint, "TLS endpoint data removed");
        Ok(())
    }

    /// Delete every file of every endpoint of `key`. Idempotent.
    pub fn remove_all_context_data(&self, key: &str) -> StoreResult<()> {
        let dir = fsutil::join_key(&self.root, key)?;
        fsutil::remove_dir_all(&dir)?;
        debug!(key, "TLS context data removed");
        Ok(())
    }

    /// Endpoint name → sorted file names for `key`. Content is not read.
    ///
    /// A context without TLS data yields an empty map.
    pub fn list_context_data(&self, key: &str) -> StoreResult<EndpointFiles> {
        let dir = fsutil::join_key(&self.root, key)?;
        let mut result = EndpointFiles::new();

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(result),
            Err(e) => return Err(e.into()),
        };

        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let Ok(endpoint) = entry.file_name().into_string() else {
                continue;
            };
            let mut files = Vec::new();
            for file in fs::read_dir(entry.path())? {
                let file = file?;
                if file.file_type()?.is_dir() {
                    continue;
                }
                if let Ok(name) = file.file_name().into_string() {
                    files.push(name);
                }
            }
            files.sort();
            result.insert(endpoint, files);
        }
        Ok(result)
    }
}
