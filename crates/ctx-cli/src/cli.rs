use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ctx", about = "Inspect and move contexts of a ctxstore", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Store root (overrides the root from --config)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// TOML store configuration
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Raise log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Command {
    /// List contexts
    Ls,
    /// Show a context's record and TLS files
    Inspect(NameArgs),
    /// Write a context archive to a file or stdout
    Export(TransferArgs),
    /// Read a context archive from a file or stdin
    Import(TransferArgs),
    /// Remove contexts
    Rm(RmArgs),
    /// Show where a context is stored
    Info(NameArgs),
}

#[derive(Args)]
pub struct NameArgs {
    pub name: String,
}

#[derive(Args)]
pub struct TransferArgs {
    pub name: String,
    /// Archive path; standard streams when omitted
    pub file: Option<PathBuf>,
}

#[derive(Args)]
pub struct RmArgs {
    #[arg(required = true)]
    pub names: Vec<String>,
}
