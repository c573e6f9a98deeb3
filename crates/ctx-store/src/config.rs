use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Directory under the root holding one `<id>/meta.json` per context.
pub const METADATA_DIR: &str = "meta";

/// Directory under the root holding one `<id>/<endpoint>/<file>` tree per context.
pub const TLS_DIR: &str = "tls";

/// Configuration of a file-backed context store.
///
/// Every field has a default, so a TOML file only needs the keys it changes:
///
/// ```toml
/// root = "/home/me/.ctxstore/contexts"
/// max_tls_file_size = 1048576
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Store root; metadata and TLS trees live underneath.
    pub root: PathBuf,
    /// Upper bound on a single TLS file read (default: 10 MiB).
    pub max_tls_file_size: u64,
    /// Maximum directory depth explored when listing metadata (default: 16).
    pub max_list_depth: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("contexts"),
            max_tls_file_size: 10 * 1024 * 1024, // 10 MiB
            max_list_depth: 16,
        }
    }
}

impl StoreConfig {
    /// Default limits, rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> StoreResult<Self> {
        toml::from_str(text).map_err(|e| StoreError::Config(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// `<root>/meta`
    pub fn metadata_root(&self) -> PathBuf {
        self.root.join(METADATA_DIR)
    }

    /// `<root>/tls`
    pub fn tls_root(&self) -> PathBuf {
        self.root.join(TLS_DIR)
    }
}
