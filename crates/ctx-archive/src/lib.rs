//! Context archive format for ctxstore.
//!
//! One context's full state (its `meta.json` record and every TLS file) is
//! exchanged as a single tar stream. Archives are produced and consumed only
//! through [`export`] and [`import`]; they are not meant to be hand-authored.
//!
//! # Architecture
//!
//! - **[`export`]**: runs the tar writer on a producer thread feeding a
//!   bounded [`pipe`], and hands back a reader. Nothing is buffered beyond
//!   the pipe's few chunks.
//! - **[`export_to`]**: the same archive, written synchronously to any `Write`.
//! - **[`import`]**: validates every entry path, accumulates TLS files in
//!   memory, then writes the record and replaces the TLS material in one go.

pub mod error;
pub mod export;
pub mod import;
pub mod pipe;

pub use error::{ArchiveError, ArchiveResult};
pub use export::{export, export_to, ExportReader};
pub use import::{import, MAX_IMPORT_SIZE};

/// Archive directory holding `<endpoint>/<file>` entries.
pub const TLS_DIR: &str = "tls";

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Read};
    use std::sync::Arc;

    use ctx_store::{
        ContextLister, ContextMetadata, ContextReader, ContextTlsData, ContextWriter,
        DefaultContext, DefaultContextStore, EndpointTlsData, FileContextStore, StoreConfig,
        StoreError, TypeRegistry,
    };
    use serde_json::json;

    fn open(dir: &tempfile::TempDir) -> Arc<FileContextStore> {
        Arc::new(FileContextStore::new(
            &StoreConfig::new(dir.path()),
            TypeRegistry::new(),
        ))
    }

    fn record(name: &str) -> ContextMetadata {
        ContextMetadata::new(name)
            .with_metadata(json!({"Description": "exported", "Extra": {"k": [1, 2]}}))
            .with_endpoint("docker", json!({"Host": "tcp://10.0.0.1:2376"}))
            .with_endpoint("kubernetes", json!({"Namespace": "dev"}))
    }

    fn tls() -> ContextTlsData {
        ContextTlsData::new().with_endpoint(
            "ep1",
            EndpointTlsData::new()
                .with_file("f1", b"first file".to_vec())
                .with_file("f2", vec![0u8, 159, 146, 150, 255]),
        )
    }

    fn seed(store: &FileContextStore, name: &str) {
        store.create_or_update(&record(name)).unwrap();
        store.reset_tls_material(name, Some(&tls())).unwrap();
    }

    fn archive_bytes(store: &Arc<FileContextStore>, name: &str) -> Vec<u8> {
        let mut bytes = Vec::new();
        export(name, Arc::clone(store))
            .read_to_end(&mut bytes)
            .unwrap();
        bytes
    }

    /// Build an archive with raw entry names, bypassing tar's own path checks.
    fn raw_archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let raw: Vec<(&[u8], &[u8])> = entries
            .iter()
            .map(|(path, data)| (path.as_bytes(), *data))
            .collect();
        raw_archive_bytes(&raw)
    }

    fn raw_archive_bytes(entries: &[(&[u8], &[u8])]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for (path, data) in entries {
            let mut header = tar::Header::new_old();
            let name = &mut header.as_old_mut().name;
            name[..path.len()].copy_from_slice(path);
            header.set_entry_type(tar::EntryType::Regular);
            header.set_mode(0o600);
            header.set_size(data.len() as u64);
            header.set_cksum();
            builder.append(&header, *data).unwrap();
        }
        builder.into_inner().unwrap()
    }

    fn meta_json(name: &str) -> Vec<u8> {
        serde_json::to_vec(&record(name)).unwrap()
    }

    #[test]
    fn default_context_can_be_exported() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir);
        let inner = FileContextStore::new(&StoreConfig::new(dir.path()), TypeRegistry::new());
        let overlay = Arc::new(DefaultContextStore::new(inner, || {
            Ok(DefaultContext {
                meta: ContextMetadata::new("ignored")
                    .with_endpoint("docker", json!({"Host": "unix:///var/run/docker.sock"})),
                tls: ContextTlsData::new().with_endpoint(
                    "docker",
                    EndpointTlsData::new().with_file("ca.pem", b"CA".to_vec()),
                ),
            })
        }));

        import("from-default", overlay.as_ref(), export("default", Arc::clone(&overlay))).unwrap();

        let copied = store.get_metadata("from-default").unwrap();
        assert_eq!(copied.name, "from-default");
        assert_eq!(
            copied.endpoint("docker").unwrap().to_json().unwrap(),
            json!({"Host": "unix:///var/run/docker.sock"})
        );
        assert_eq!(store.get_tls_data("from-default", "docker", "ca.pem").unwrap(), b"CA");
    }

    #[test]
    fn export_import_equivalence() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir);
        seed(&store, "ctx-a");

        import("ctx-b", store.as_ref(), export("ctx-a", Arc::clone(&store))).unwrap();

        let a = store.get_metadata("ctx-a").unwrap();
        let b = store.get_metadata("ctx-b").unwrap();
        assert_eq!(b.name, "ctx-b");
        assert_eq!(b.metadata, a.metadata);
        assert_eq!(b.endpoints, a.endpoints);
        assert_eq!(store.get_tls_material("ctx-b").unwrap(), tls());
        assert_eq!(store.names().unwrap(), vec!["ctx-a", "ctx-b"]);
    }

    #[test]
    fn import_into_another_store() {
        let src_dir = tempfile::tempdir().unwrap();
        let dst_dir = tempfile::tempdir().unwrap();
        let src = open(&src_dir);
        let dst = open(&dst_dir);
        seed(&src, "prod");

        let bytes = archive_bytes(&src, "prod");
        import("prod-copy", dst.as_ref(), &bytes[..]).unwrap();

        assert_eq!(dst.get_metadata("prod-copy").unwrap(), record("prod-copy"));
        assert_eq!(
            dst.get_tls_data("prod-copy", "ep1", "f2").unwrap(),
            tls().file("ep1", "f2").unwrap()
        );
    }

    #[test]
    fn archive_layout_and_modes() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir);
        seed(&store, "ctx-a");

        let bytes = archive_bytes(&store, "ctx-a");
        let mut archive = tar::Archive::new(&bytes[..]);
        let entries: Vec<(String, tar::EntryType, u32)> = archive
            .entries()
            .unwrap()
            .map(|e| {
                let e = e.unwrap();
                let header = e.header();
                (
                    String::from_utf8(e.path_bytes().into_owned())
                        .unwrap()
                        .trim_end_matches('/')
                        .to_string(),
                    header.entry_type(),
                    header.mode().unwrap(),
                )
            })
            .collect();

        assert_eq!(
            entries,
            vec![
                ("meta.json".to_string(), tar::EntryType::Regular, 0o644),
                ("tls".to_string(), tar::EntryType::Directory, 0o700),
                ("tls/ep1".to_string(), tar::EntryType::Directory, 0o700),
                ("tls/ep1/f1".to_string(), tar::EntryType::Regular, 0o600),
                ("tls/ep1/f2".to_string(), tar::EntryType::Regular, 0o600),
            ]
        );
    }

    #[test]
    fn context_without_tls_has_no_tls_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir);
        store.create_or_update(&record("bare")).unwrap();

        let bytes = archive_bytes(&store, "bare");
        let mut archive = tar::Archive::new(&bytes[..]);
        assert_eq!(archive.entries().unwrap().count(), 1);
    }

    #[test]
    fn export_to_matches_streamed_export() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir);
        seed(&store, "ctx-a");

        let mut direct = Vec::new();
        export_to("ctx-a", store.as_ref(), &mut direct).unwrap();
        assert_eq!(direct, archive_bytes(&store, "ctx-a"));
    }

    #[test]
    fn import_replaces_not_merges() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir);
        seed(&store, "src");
        store.create_or_update(&record("dst")).unwrap();
        store
            .reset_endpoint_tls_material(
                "dst",
                "stale",
                Some(&EndpointTlsData::new().with_file("old.pem", b"OLD".to_vec())),
            )
            .unwrap();

        import("dst", store.as_ref(), export("src", Arc::clone(&store))).unwrap();

        let files = store.list_tls_files("dst").unwrap();
        assert!(!files.contains_key("stale"));
        assert!(matches!(
            store.get_tls_data("dst", "stale", "old.pem"),
            Err(StoreError::TlsDataNotFound { .. })
        ));
        assert_eq!(store.get_tls_material("dst").unwrap(), tls());
    }

    #[test]
    fn export_of_unknown_context_fails_the_reader() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir);

        let mut reader = export("ghost", Arc::clone(&store));
        let mut bytes = Vec::new();
        let err = reader.read_to_end(&mut bytes).unwrap_err();
        assert!(err.to_string().contains("ghost"));
        assert!(matches!(
            reader.join(),
            Err(ArchiveError::Store(StoreError::ContextNotFound { .. }))
        ));
    }

    #[test]
    fn dropped_consumer_stops_the_producer() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir);
        store.create_or_update(&record("big")).unwrap();
        let blob = vec![7u8; 4 * 1024 * 1024];
        store
            .reset_endpoint_tls_material(
                "big",
                "docker",
                Some(&EndpointTlsData::new().with_file("bundle.pem", blob)),
            )
            .unwrap();

        let mut reader = export("big", Arc::clone(&store));
        let mut head = [0u8; 512];
        reader.read_exact(&mut head).unwrap();
        // Joining drops the reader; the producer must not hang.
        assert!(matches!(reader.join(), Err(ArchiveError::Io(_))));
    }

    #[test]
    fn aborted_stream_leaves_destination_untouched() {
        struct FailAfter<R> {
            inner: R,
            remaining: usize,
        }

        impl<R: Read> Read for FailAfter<R> {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                if self.remaining == 0 {
                    return Err(io::Error::new(io::ErrorKind::ConnectionAborted, "consumer aborted"));
                }
                let max = buf.len().min(self.remaining);
                let n = self.inner.read(&mut buf[..max])?;
                self.remaining -= n;
                Ok(n)
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir);
        seed(&store, "src");
        let prior = ContextMetadata::new("dst").with_metadata(json!({"Description": "before"}));
        store.create_or_update(&prior).unwrap();
        let prior_tls = ContextTlsData::new().with_endpoint(
            "docker",
            EndpointTlsData::new().with_file("ca.pem", b"PRIOR".to_vec()),
        );
        store.reset_tls_material("dst", Some(&prior_tls)).unwrap();

        // Past the meta.json entry, inside the TLS entries.
        let truncated = FailAfter {
            inner: export("src", Arc::clone(&store)),
            remaining: 2048,
        };
        assert!(import("dst", store.as_ref(), truncated).is_err());

        assert_eq!(store.get_metadata("dst").unwrap(), prior);
        assert_eq!(store.get_tls_material("dst").unwrap(), prior_tls);
    }

    #[test]
    fn truncated_entry_is_detected() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir);
        seed(&store, "src");

        let bytes = archive_bytes(&store, "src");
        // Header of meta.json plus a few bytes of its content.
        let cut = &bytes[..512 + 10];
        let err = import("dst", store.as_ref(), cut).unwrap_err();
        assert!(matches!(err, ArchiveError::Truncated { .. } | ArchiveError::Io(_)));
        assert!(store.get_metadata("dst").unwrap_err().is_not_found());
    }

    #[test]
    fn import_without_metadata_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir);
        let bytes = raw_archive(&[("tls/docker/ca.pem", &b"CA"[..])]);

        let err = import("dst", store.as_ref(), &bytes[..]).unwrap_err();
        assert!(matches!(err, ArchiveError::MissingMetadata));
        assert!(store.list_tls_files("dst").unwrap().is_empty());
    }

    #[test]
    fn import_rejects_traversal_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir);
        let meta = meta_json("x");

        for bad in [
            "tls/../../escape",
            "tls/docker/../../../escape",
            "/etc/passwd",
            "tls/docker/sub/ca.pem",
            "tls/docker\\ca.pem",
            "../meta.json",
        ] {
            let bytes = raw_archive(&[("meta.json", meta.as_slice()), (bad, &b"EVIL"[..])]);
            let err = import("dst", store.as_ref(), &bytes[..]).unwrap_err();
            assert!(
                matches!(err, ArchiveError::InvalidPath { .. }),
                "{bad}: unexpected {err}"
            );
        }
        assert!(store.get_metadata("dst").unwrap_err().is_not_found());
        assert!(!dir.path().join("escape").exists());
    }

    #[test]
    fn import_rejects_non_utf8_entry_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir);
        let meta = meta_json("x");
        let bytes = raw_archive_bytes(&[
            (&b"meta.json"[..], meta.as_slice()),
            (&b"tls/docker/\xffa.pem"[..], &b"FIRST"[..]),
            (&b"tls/docker/\xfea.pem"[..], &b"SECOND"[..]),
        ]);

        let err = import("dst", store.as_ref(), &bytes[..]).unwrap_err();
        assert!(matches!(err, ArchiveError::InvalidPath { .. }), "unexpected {err}");
        assert!(store.get_metadata("dst").unwrap_err().is_not_found());
        assert!(store.list_tls_files("dst").unwrap().is_empty());
    }

    #[test]
    fn import_skips_directory_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir);

        let mut builder = tar::Builder::new(Vec::new());
        let mut header = tar::Header::new_ustar();
        header.set_entry_type(tar::EntryType::Directory);
        header.set_mode(0o700);
        header.set_size(0);
        builder.append_data(&mut header, "unrelated", io::empty()).unwrap();
        let meta = meta_json("x");
        let mut header = tar::Header::new_ustar();
        header.set_size(meta.len() as u64);
        header.set_mode(0o644);
        builder.append_data(&mut header, "meta.json", meta.as_slice()).unwrap();
        let bytes = builder.into_inner().unwrap();

        import("dst", store.as_ref(), &bytes[..]).unwrap();
        assert_eq!(store.get_metadata("dst").unwrap().name, "dst");
    }

    #[test]
    fn import_enforces_size_limit() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir);
        let meta = meta_json("x");
        let huge = vec![0u8; MAX_IMPORT_SIZE as usize];
        let bytes = raw_archive(&[("meta.json", meta.as_slice()), ("tls/docker/big", huge.as_slice())]);

        let err = import("dst", store.as_ref(), &bytes[..]).unwrap_err();
        assert!(matches!(err, ArchiveError::TooLarge { .. }));
        assert!(store.get_metadata("dst").unwrap_err().is_not_found());
    }
}
