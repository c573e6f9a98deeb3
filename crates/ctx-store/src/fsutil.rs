//! Small filesystem helpers shared by the metadata and TLS stores.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use crate::error::{StoreError, StoreResult};
use crate::names::validate_path_segment;

/// Join a slash-separated key onto `root`, validating every segment.
pub(crate) fn join_key(root: &Path, key: &str) -> StoreResult<PathBuf> {
    let mut path = root.to_path_buf();
    for segment in key.split('/') {
        validate_path_segment("context key", segment)?;
        path.push(segment);
    }
    Ok(path)
}

/// Create `dir` and its parents. New directories get `mode` on unix.
pub(crate) fn create_dir_all(dir: &Path, mode: u32) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        fs::DirBuilder::new().recursive(true).mode(mode).create(dir)
    }

    #[cfg(not(unix))]
    {
        let _ = mode;
        fs::create_dir_all(dir)
    }
}

/// Overwrite `path` with `data` and force its permissions to `mode` on unix.
pub(crate) fn write_file(path: &Path, data: &[u8], mode: u32) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(mode)
            .open(path)?;
        // `mode` only applies on creation; tighten pre-existing files too.
        file.set_permissions(fs::Permissions::from_mode(mode))?;
        file.write_all(data)
    }

    #[cfg(not(unix))]
    {
        let _ = mode;
        fs::write(path, data)
    }
}

/// Read at most `limit` bytes from `path`.
///
/// Returns `Ok(None)` if the file does not exist and
/// [`StoreError::TlsDataTooLarge`] if it holds more than `limit` bytes.
pub(crate) fn read_bounded(path: &Path, limit: u64) -> StoreResult<Option<Vec<u8>>> {
    let file = match fs::File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let mut data = Vec::new();
    // One extra byte tells "exactly at the limit" apart from "over it".
    file.take(limit.saturating_add(1)).read_to_end(&mut data)?;
    if data.len() as u64 > limit {
        return Err(StoreError::TlsDataTooLarge {
            path: path.display().to_string(),
            limit,
        });
    }
    Ok(Some(data))
}

/// Recursively delete `path`; a missing path is not an error.
pub(crate) fn remove_dir_all(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

/// Delete one file; a missing file is not an error.
pub(crate) fn remove_file(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}
