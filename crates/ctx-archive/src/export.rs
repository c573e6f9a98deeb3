use std::io::{self, BufWriter, Read, Write};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use ctx_store::{ContextReader, META_FILE};
use tar::{Builder, EntryType, Header};
use tracing::{debug, warn};

use crate::error::{ArchiveError, ArchiveResult};
use crate::pipe::{pipe, PipeReader, PipeWriter};
use crate::TLS_DIR;

/// Size of the chunks the producer hands to the pipe.
const CHUNK_SIZE: usize = 64 * 1024;

const META_MODE: u32 = 0o644;
const DIR_MODE: u32 = 0o700;
const FILE_MODE: u32 = 0o600;

/// Streaming view of an archive being produced on another thread.
///
/// Read it to the end to get the whole archive. A producer failure surfaces
/// as a read error whose message is the [`ArchiveError`]. Dropping the
/// reader early makes the producer stop at its next write.
#[derive(Debug)]
pub struct ExportReader {
    reader: PipeReader,
    producer: JoinHandle<ArchiveResult<()>>,
}

impl ExportReader {
    /// Stop reading and wait for the producer's outcome.
    ///
    /// Unread data is discarded; if the producer had not finished yet it
    /// fails with a broken pipe.
    pub fn join(self) -> ArchiveResult<()> {
        let Self { reader, producer } = self;
        drop(reader);
        producer.join().map_err(|_| ArchiveError::ProducerPanicked)?
    }
}

impl Read for ExportReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

/// Export one context as a tar stream.
///
/// The archive is written by a producer thread into a bounded pipe, so the
/// caller can start consuming before the archive is complete and the whole
/// archive is never buffered in memory.
pub fn export<S>(name: &str, store: Arc<S>) -> ExportReader
where
    S: ContextReader + ?Sized + 'static,
{
    let (writer, reader) = pipe();
    let name = name.to_string();
    let producer = thread::spawn(move || produce(&name, store.as_ref(), writer));
    ExportReader { reader, producer }
}

fn produce<S>(name: &str, store: &S, writer: PipeWriter) -> ArchiveResult<()>
where
    S: ContextReader + ?Sized,
{
    let mut buffered = BufWriter::with_capacity(CHUNK_SIZE, writer);
    let result = export_to(name, store, &mut buffered)
        .and_then(|()| buffered.flush().map_err(ArchiveError::from));
    let (writer, _unflushed) = buffered.into_parts();

    match &result {
        Ok(()) => debug!(name, "context exported"),
        Err(e) => {
            warn!(name, error = %e, "context export aborted");
            writer.close_with_error(io::Error::other(e.to_string()));
        }
    }
    result
}

/// Write one context's archive into `out` on the calling thread.
///
/// Layout:
///
/// ```text
/// meta.json                 0644  JSON context record
/// tls/                      0700  only if the context has TLS data
/// tls/<endpoint>/           0700  one per endpoint
/// tls/<endpoint>/<file>     0600  raw bytes
/// ```
pub fn export_to<S, W>(name: &str, store: &S, out: W) -> ArchiveResult<()>
where
    S: ContextReader + ?Sized,
    W: Write,
{
    let mut builder = Builder::new(out);

    let meta = store.get_metadata(name)?;
    let meta_bytes = serde_json::to_vec(&meta)?;
    append_file(&mut builder, META_FILE, &meta_bytes, META_MODE)?;

    let tls_files = store.list_tls_files(name)?;
    if !tls_files.is_empty() {
        append_dir(&mut builder, TLS_DIR)?;
        for (endpoint, files) in &tls_files {
            let endpoint_dir = format!("{TLS_DIR}/{endpoint}");
            append_dir(&mut builder, &endpoint_dir)?;
            for file in files {
                let data = store.get_tls_data(name, endpoint, file)?;
                append_file(&mut builder, &format!("{endpoint_dir}/{file}"), &data, FILE_MODE)?;
            }
        }
    }

    builder.finish()?;
    Ok(())
}

fn append_file<W: Write>(builder: &mut Builder<W>, path: &str, data: &[u8], mode: u32) -> io::Result<()> {
    let mut header = Header::new_ustar();
    header.set_entry_type(EntryType::Regular);
    header.set_mode(mode);
    header.set_size(data.len() as u64);
    builder.append_data(&mut header, path, data)
}

fn append_dir<W: Write>(builder: &mut Builder<W>, path: &str) -> io::Result<()> {
    let mut header = Header::new_ustar();
    header.set_entry_type(EntryType::Directory);
    header.set_mode(DIR_MODE);
    header.set_size(0);
    builder.append_data(&mut header, path, io::empty())
}
