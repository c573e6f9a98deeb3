use std::io::{self, Read};

use ctx_store::names::validate_path_segment;
use ctx_store::{ContextMetadata, ContextTlsData, ContextWriter, META_FILE};
use tar::{Archive, EntryType};
use tracing::debug;

use crate::error::{ArchiveError, ArchiveResult};
use crate::TLS_DIR;

/// Upper bound on the size of an imported archive (10 MiB).
pub const MAX_IMPORT_SIZE: u64 = 10 * 1024 * 1024;

/// Where an archive entry goes.
#[derive(Debug, PartialEq, Eq)]
enum EntryTarget {
    Metadata,
    Tls { endpoint: String, file: String },
}

/// Import an archive produced by [`export`](crate::export) as context `name`.
///
/// The whole archive is read and validated before anything is written. The
/// record from `meta.json` is stored with its name replaced by `name`, then
/// the destination's TLS material is replaced (not merged) by the archive's.
/// The first error aborts the import.
pub fn import<W, R>(name: &str, store: &W, reader: R) -> ArchiveResult<()>
where
    W: ContextWriter + ?Sized,
    R: Read,
{
    let mut bounded = BoundedReader::new(reader, MAX_IMPORT_SIZE);
    let (mut meta, tls) = match read_entries(&mut bounded) {
        Err(_) if bounded.exceeded => {
            return Err(ArchiveError::TooLarge {
                limit: MAX_IMPORT_SIZE,
            })
        }
        other => other?,
    };

    meta.name = name.to_string();
    store.create_or_update(&meta)?;
    store.reset_tls_material(name, Some(&tls))?;
    debug!(name, endpoints = tls.endpoints.len(), "context imported");
    Ok(())
}

fn read_entries<R: Read>(reader: R) -> ArchiveResult<(ContextMetadata, ContextTlsData)> {
    let mut archive = Archive::new(reader);
    let mut meta = None;
    let mut tls = ContextTlsData::new();

    for entry in archive.entries()? {
        let mut entry = entry?;
        if entry.header().entry_type() != EntryType::Regular {
            continue;
        }

        let path = entry_path(&entry.path_bytes())?;
        let target = classify(&path)?;

        let expected = entry.size();
        let mut data = Vec::new();
        entry.read_to_end(&mut data)?;
        if data.len() as u64 != expected {
            return Err(ArchiveError::Truncated { path });
        }

        match target {
            EntryTarget::Metadata => {
                meta = Some(serde_json::from_slice::<ContextMetadata>(&data)?);
            }
            EntryTarget::Tls { endpoint, file } => {
                tls.endpoint_mut(&endpoint).insert(file, data);
            }
        }
    }

    let meta = meta.ok_or(ArchiveError::MissingMetadata)?;
    Ok((meta, tls))
}

/// Entry names must be UTF-8; lossy decoding could map two names to one file.
fn entry_path(raw: &[u8]) -> ArchiveResult<String> {
    std::str::from_utf8(raw)
        .map(str::to_string)
        .map_err(|_| ArchiveError::InvalidPath {
            path: String::from_utf8_lossy(raw).into_owned(),
            reason: "entry name is not valid UTF-8".to_string(),
        })
}

/// Validate an entry path and decide where it goes.
fn classify(path: &str) -> ArchiveResult<EntryTarget> {
    let invalid = |reason: &str| ArchiveError::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    };

    if path.starts_with('/') {
        return Err(invalid("absolute paths are not allowed"));
    }
    if path.contains('\\') {
        return Err(invalid("unexpected '\\' in path"));
    }
    if path == META_FILE {
        return Ok(EntryTarget::Metadata);
    }

    let rest = path
        .strip_prefix(TLS_DIR)
        .and_then(|rest| rest.strip_prefix('/'))
        .ok_or_else(|| invalid("unexpected context file"))?;

    let segments: Vec<&str> = rest.split('/').collect();
    let [endpoint, file] = segments.as_slice() else {
        return Err(invalid("expected tls/<endpoint>/<file>"));
    };
    for segment in [endpoint, file] {
        validate_path_segment("archive path segment", segment)
            .map_err(|e| invalid(&e.to_string()))?;
    }

    Ok(EntryTarget::Tls {
        endpoint: endpoint.to_string(),
        file: file.to_string(),
    })
}

/// Reader that fails once more than `limit` bytes have been consumed.
struct BoundedReader<R> {
    inner: R,
    remaining: u64,
    exceeded: bool,
}

impl<R> BoundedReader<R> {
    fn new(inner: R, limit: u64) -> Self {
        Self {
            inner,
            remaining: limit,
            exceeded: false,
        }
    }
}

impl<R: Read> Read for BoundedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.remaining == 0 {
            // Only an error if the source really has more.
            let mut probe = [0u8; 1];
            if self.inner.read(&mut probe)? == 0 {
                return Ok(0);
            }
            self.exceeded = true;
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "archive size limit exceeded",
            ));
        }
        let max = buf.len().min(usize::try_from(self.remaining).unwrap_or(usize::MAX));
        let n = self.inner.read(&mut buf[..max])?;
        self.remaining -= n as u64;
        Ok(n)
    }
}
