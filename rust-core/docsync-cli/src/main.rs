// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//!
//! docsync: command-line access to a local docsync store.
//!
//! ```text
//! docsync normalize '{"age": {"$ne": 12}}'
//! docsync --root ./data create --doc report
//! docsync --root ./data attach --doc report --file ./chart.png --type image/png
//! docsync --root ./data ls --doc report
//! docsync --root ./data rm --doc report chart.png
//! docsync --root ./data collect
//! ```
//!
//! Logs go to stderr; set `RUST_LOG` to change the level.

mod output;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use docsync_attachments::{Attachment, AttachmentStore};
use docsync_query::{normalize, Value};
use docsync_store::{Datastore, DatastoreConfig, DocumentRevision};

use output::{format_attachments, format_report, format_revision, OutputFormat};

/// Version string, pulled from Cargo.toml at compile time.
const VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

// ---------------------------------------------------------------------------
// CLI argument parsing
// ---------------------------------------------------------------------------

/// docsync: local document store with selectors and attachments.
#[derive(Parser, Debug)]
#[command(name = "docsync", version = VERSION, about = "docsync store tool")]
struct Cli {
    /// Store root directory.
    #[arg(long, global = true, conflicts_with = "config")]
    root: Option<PathBuf>,

    /// JSON file with a store configuration.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format.
    #[arg(long, global = true, value_enum, ignore_case = true, default_value_t)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the canonical form of a JSON selector, or fail if it is rejected.
    Normalize {
        /// The selector, as JSON.
        selector: String,
    },
    /// Create a document.
    Create {
        #[arg(long)]
        doc: String,
        /// Document body, as JSON.
        #[arg(long, default_value = "{}")]
        body: String,
    },
    /// Attach a file to the current revision of a document.
    Attach {
        #[arg(long)]
        doc: String,
        #[arg(long)]
        file: PathBuf,
        /// Attachment name. Defaults to the file name.
        #[arg(long)]
        name: Option<String>,
        /// MIME type.
        #[arg(long = "type", default_value = DEFAULT_MIME_TYPE)]
        mime_type: String,
    },
    /// List the attachments on the current revision of a document.
    Ls {
        #[arg(long)]
        doc: String,
    },
    /// Remove attachments from the current revision of a document.
    Rm {
        #[arg(long)]
        doc: String,
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Delete blobs no attachment references.
    Collect,
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn datastore_config(root: Option<&Path>, config: Option<&Path>) -> anyhow::Result<DatastoreConfig> {
    Ok(match (config, root) {
        (Some(path), _) => DatastoreConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        (None, Some(root)) => DatastoreConfig::at(root),
        (None, None) => DatastoreConfig::default(),
    })
}

fn open_stores(config: DatastoreConfig) -> anyhow::Result<AttachmentStore> {
    let root = config.root.clone();
    let datastore = Datastore::open(config)
        .with_context(|| format!("opening store at {}", root.display()))?;
    Ok(AttachmentStore::open(Arc::new(datastore))?)
}

fn current(store: &AttachmentStore, doc: &str) -> anyhow::Result<DocumentRevision> {
    store
        .datastore()
        .get_document(doc)?
        .ok_or_else(|| anyhow!("document {doc} not found"))
}

fn parse_json<T: serde::de::DeserializeOwned>(text: &str, what: &str) -> anyhow::Result<T> {
    serde_json::from_str(text).with_context(|| format!("{what} is not valid JSON"))
}

/// Run one command and return what should be printed.
fn run(cli: Cli) -> anyhow::Result<String> {
    let Cli {
        root,
        config,
        format,
        command,
    } = cli;
    let open = || -> anyhow::Result<AttachmentStore> {
        open_stores(datastore_config(root.as_deref(), config.as_deref())?)
    };

    match command {
        Command::Normalize { selector } => {
            let raw: Value = parse_json(&selector, "selector")?;
            let canonical = normalize(&raw)?;
            Ok(serde_json::to_string_pretty(&canonical)?)
        }
        Command::Create { doc, body } => {
            let body: serde_json::Value = parse_json(&body, "body")?;
            let revision = open()?.datastore().create_document(&doc, &body)?;
            Ok(format_revision(&revision, format))
        }
        Command::Attach {
            doc,
            file,
            name,
            mime_type,
        } => {
            let name = match name {
                Some(name) => name,
                None => file
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .ok_or_else(|| anyhow!("{} has no file name", file.display()))?,
            };
            let store = open()?;
            let revision = current(&store, &doc)?;
            let attachment = Attachment::from_file(name, mime_type, file);
            let next = store.add_all(&revision, vec![attachment])?;
            Ok(format_revision(&next, format))
        }
        Command::Ls { doc } => {
            let store = open()?;
            let revision = current(&store, &doc)?;
            Ok(format_attachments(&store.list(&revision)?, format))
        }
        Command::Rm { doc, names } => {
            let store = open()?;
            let revision = current(&store, &doc)?;
            let next = store.remove(&revision, names.as_slice())?;
            Ok(format_revision(&next, format))
        }
        Command::Collect => {
            let report = open()?.collector().collect()?;
            Ok(format_report(&report, format))
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    tracing::debug!(?cli, "parsed arguments");
    let out = run(cli)?;
    println!("{out}");
    Ok(())
}
