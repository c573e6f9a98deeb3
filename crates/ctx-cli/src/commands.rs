use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::sync::Arc;

use anyhow::Context as _;
use colored::Colorize;
use ctx_store::{
    ContextLister, ContextReader, ContextWriter, DefaultContext, DefaultContextStore,
    FileContextStore, ResolverError, StorageInfoProvider, StoreConfig, TypeRegistry,
    DEFAULT_CONTEXT_NAME,
};
use serde_json::json;
use tracing::info;

use crate::cli::*;

type Resolver = fn() -> Result<DefaultContext, ResolverError>;

/// The store every command works on.
pub type Store = DefaultContextStore<FileContextStore, Resolver>;

fn empty_default() -> Result<DefaultContext, ResolverError> {
    Ok(DefaultContext::default())
}

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let store = Arc::new(open_store(&cli)?);
    match cli.command {
        Command::Ls => cmd_ls(&store),
        Command::Inspect(args) => cmd_inspect(&store, &args.name),
        Command::Export(args) => cmd_export(&store, args),
        Command::Import(args) => cmd_import(&store, args),
        Command::Rm(args) => cmd_rm(&store, &args.names),
        Command::Info(args) => cmd_info(&store, &args.name),
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<StoreConfig> {
    let mut config = match &cli.config {
        Some(path) => StoreConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => StoreConfig::default(),
    };
    if let Some(root) = &cli.root {
        config.root = root.clone();
    }
    Ok(config)
}

pub fn open_store(cli: &Cli) -> anyhow::Result<Store> {
    let config = load_config(cli)?;
    info!(root = %config.root.display(), "opening context store");
    let inner = FileContextStore::new(&config, TypeRegistry::new());
    Ok(DefaultContextStore::new(inner, empty_default as Resolver))
}

fn cmd_ls(store: &Store) -> anyhow::Result<()> {
    let contexts = store.list()?;
    if contexts.is_empty() {
        println!("No contexts.");
        return Ok(());
    }
    for meta in &contexts {
        let name = if meta.name == DEFAULT_CONTEXT_NAME {
            meta.name.green().bold()
        } else {
            meta.name.bold()
        };
        let kinds: Vec<&str> = meta.endpoints.keys().map(String::as_str).collect();
        println!("{}  {}", name, kinds.join(",").cyan());
    }
    Ok(())
}

fn cmd_inspect(store: &Store, name: &str) -> anyhow::Result<()> {
    let meta = store.get_metadata(name)?;
    let tls = store.list_tls_files(name)?;
    let info = store.storage_info(name);
    let doc = json!({
        "Name": meta.name,
        "Metadata": meta.metadata,
        "Endpoints": meta.endpoints,
        "TLSMaterial": tls,
        "Storage": {
            "MetadataPath": info.metadata_path,
            "TLSPath": info.tls_path,
        },
    });
    println!("{}", serde_json::to_string_pretty(&doc)?);
    Ok(())
}

fn cmd_export(store: &Arc<Store>, args: TransferArgs) -> anyhow::Result<()> {
    let mut reader = ctx_archive::export(&args.name, Arc::clone(store));
    let copied = match &args.file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating {}", path.display()))?;
            let mut out = BufWriter::new(file);
            io::copy(&mut reader, &mut out).and_then(|n| out.flush().map(|()| n))
        }
        None => io::copy(&mut reader, &mut io::stdout().lock()),
    };
    // The producer's error is more precise than the pipe's.
    let outcome = reader
        .join()
        .map_err(anyhow::Error::from)
        .and_then(|()| copied.map_err(anyhow::Error::from));
    let bytes = match outcome {
        Ok(bytes) => bytes,
        Err(e) => {
            if let Some(path) = &args.file {
                // Drop the partial archive.
                let _ = std::fs::remove_file(path);
            }
            return Err(e);
        }
    };

    if let Some(path) = &args.file {
        println!(
            "{} Exported {} to {} ({} bytes)",
            "✓".green().bold(),
            args.name.yellow(),
            path.display(),
            bytes
        );
    }
    Ok(())
}

fn cmd_import(store: &Store, args: TransferArgs) -> anyhow::Result<()> {
    match &args.file {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("opening {}", path.display()))?;
            ctx_archive::import(&args.name, store, BufReader::new(file))?;
        }
        None => ctx_archive::import(&args.name, store, io::stdin().lock())?,
    }
    println!("{} Imported {}", "✓".green().bold(), args.name.yellow());
    Ok(())
}

fn cmd_rm(store: &Store, names: &[String]) -> anyhow::Result<()> {
    for name in names {
        store
            .remove(name)
            .with_context(|| format!("removing {name}"))?;
        println!("Removed {}", name.yellow());
    }
    Ok(())
}

fn cmd_info(store: &Store, name: &str) -> anyhow::Result<()> {
    let info = store.storage_info(name);
    println!("{}", name.bold());
    println!("  metadata: {}", info.metadata_path.display());
    println!("  tls:      {}", info.tls_path.display());
    Ok(())
}
