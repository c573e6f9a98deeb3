//! JSON persistence of context records at `<root>/<key>/meta.json`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ctx_types::ContextMetadata;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::StoreResult;
use crate::fsutil;
use crate::registry::TypeRegistry;

/// File name of a persisted context record.
pub const META_FILE: &str = "meta.json";

const DIR_MODE: u32 = 0o755;
const FILE_MODE: u32 = 0o644;

/// Stores one [`ContextMetadata`] per key.
///
/// Keys are directory-safe strings and may contain `/` to nest. Writes
/// overwrite in place: there is no atomic rename, the last writer wins.
#[derive(Clone, Debug)]
pub struct MetadataStore {
    root: PathBuf,
    registry: TypeRegistry,
    max_depth: usize,
}

impl MetadataStore {
    /// Create a store rooted at `root`. The directory is created lazily.
    pub fn new(root: impl Into<PathBuf>, registry: TypeRegistry) -> Self {
        Self {
            root: root.into(),
            registry,
            max_depth: 16,
        }
    }

    /// Builder: bound how deep [`list`](Self::list) descends.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Directory holding the record for `key`. Path computation only.
    pub fn context_dir(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    /// Write `record` under `key`, creating directories as needed.
    pub fn create_or_update(&self, key: &str, record: &ContextMetadata) -> StoreResult<()> {
        let dir = fsutil::join_key(&self.root, key)?;
        let data = serde_json::to_vec(record)?;
        fsutil::create_dir_all(&dir, DIR_MODE)?;
        fsutil::write_file(&dir.join(META_FILE), &data, FILE_MODE)?;
        debug!(key, name = %record.name, bytes = data.len(), "metadata written");
        Ok(())
    }

    /// Read the record for `key`.
    ///
    /// Returns `Ok(None)` if no record exists. Payloads are decoded through
    /// the registry; kinds without a registered type stay generic JSON.
    pub fn get(&self, key: &str) -> StoreResult<Option<ContextMetadata>> {
        let dir = fsutil::join_key(&self.root, key)?;
        self.read_record(&dir.join(META_FILE))
    }

    /// Delete the record for `key` and everything under its directory.
    /// Removing a missing key is not an error.
    pub fn remove(&self, key: &str) -> StoreResult<()> {
        let dir = fsutil::join_key(&self.root, key)?;
        fsutil::remove_dir_all(&dir)?;
        debug!(key, "metadata removed");
        Ok(())
    }

    /// List every record under the root, sorted by name.
    ///
    /// Any directory directly containing `meta.json` is a context, including
    /// directories nested inside another context. Each entry is returned with
    /// its slash-joined key. A missing root is an empty store; a single
    /// unreadable or malformed record fails the whole listing.
    pub fn list(&self) -> StoreResult<Vec<(String, ContextMetadata)>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        let walker = WalkDir::new(&self.root)
            .min_depth(2)
            .max_depth(self.max_depth.saturating_add(1))
            .sort_by_file_name();

        for entry in walker {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_type().is_file() || entry.file_name() != META_FILE {
                continue;
            }
            let Some(key) = self.key_of(entry.path()) else {
                continue;
            };
            // Removed between the walk and the read.
            if let Some(record) = self.read_record(entry.path())? {
                records.push((key, record));
            }
        }

        records.sort_by(|a, b| a.1.name.cmp(&b.1.name));
        debug!(root = %self.root.display(), count = records.len(), "metadata listed");
        Ok(records)
    }

    fn read_record(&self, path: &Path) -> StoreResult<Option<ContextMetadata>> {
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let generic: ContextMetadata = serde_json::from_slice(&data)?;
        Ok(Some(self.registry.resolve_record(generic)?))
    }

    /// Slash-joined key of the directory containing `meta_path`.
    fn key_of(&self, meta_path: &Path) -> Option<String> {
        let dir = meta_path.parent()?.strip_prefix(&self.root).ok()?;
        let segments: Option<Vec<&str>> = dir.iter().map(|s| s.to_str()).collect();
        Some(segments?.join("/"))
    }
}
