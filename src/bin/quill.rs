//! QuillDB CLI
//!
//! Opens an engine on a data directory in-process and runs one command.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use quilldb::wal::{WalEntry, WalReader, WalRecovery};
use quilldb::{Config, DbClient, Document, Engine, QuillError};
use tracing_subscriber::{fmt, EnvFilter};

/// QuillDB CLI
#[derive(Parser, Debug)]
#[command(name = "quill")]
#[command(about = "Document store with a write-ahead log")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./quilldb_data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a JSON document
    Put {
        /// The key to write
        key: String,

        /// The document contents, as JSON
        json: String,

        /// Instance version to submit (defaults to stored version + 1)
        #[arg(long)]
        version: Option<u64>,
    },

    /// Print the document stored under a key
    Get {
        /// The key to read
        key: String,
    },

    /// Delete a key
    Delete {
        /// The key to delete
        key: String,
    },

    /// List documents in key order
    Scan {
        /// First key (inclusive)
        #[arg(long, default_value = "")]
        start: String,

        /// Last key (exclusive); empty for no bound
        #[arg(long, default_value = "")]
        end: String,
    },

    /// Check the log for a torn tail without changing it
    WalVerify,

    /// Print every logged entry
    WalDump,
}

fn main() -> ExitCode {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,quilldb=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> quilldb::Result<()> {
    let config = Config::builder().data_dir(&args.data_dir).build();

    match args.command {
        Commands::WalVerify => {
            let result = WalRecovery::verify(&config.wal_dir())?;
            println!("records:               {}", result.records_recovered);
            println!("torn index bytes:      {}", result.index_bytes_discarded);
            println!("torn data bytes:       {}", result.data_bytes_discarded);
            return Ok(());
        }
        Commands::WalDump => {
            for record in WalReader::open(&config.wal_dir())? {
                let entry = WalEntry::decode(&record?)?;
                println!(
                    "lsn={} ts={} {:?}",
                    entry.lsn,
                    entry.timestamp_ms,
                    entry.request.body.request_type()
                );
            }
            return Ok(());
        }
        _ => {}
    }

    tracing::debug!("QuillDB v{} at {}", quilldb::VERSION, args.data_dir.display());

    let engine = Arc::new(Engine::open(config)?);
    let client = DbClient::direct(Arc::clone(&engine))?;

    match args.command {
        Commands::Put { key, json, version } => {
            let value: serde_json::Value = serde_json::from_str(&json)?;
            let document = match client.get(key.as_bytes())? {
                Some(stored) => client.update_document(&stored, &value)?,
                None => client.create_document(key.as_bytes(), &value)?,
            };
            let document = match version {
                Some(v) => with_version(&document, v),
                None => document,
            };
            client.write(&document)?;
            println!("OK (version {})", document.instance_version());
        }
        Commands::Get { key } => match client.get(key.as_bytes())? {
            Some(document) => print_document(&client, &document)?,
            None => println!("(not found)"),
        },
        Commands::Delete { key } => {
            client.delete_keys(vec![key.into_bytes()])?;
            println!("OK");
        }
        Commands::Scan { start, end } => {
            for document in client.get_range(start.as_bytes(), end.as_bytes())? {
                print_document(&client, &document)?;
            }
        }
        Commands::WalVerify | Commands::WalDump => {}
    }

    drop(client);
    match Arc::try_unwrap(engine) {
        Ok(engine) => engine.close(),
        Err(_) => Ok(()),
    }
}

fn with_version(document: &Document, version: u64) -> Document {
    Document::from_parts(
        document.key().to_vec(),
        document.contents().to_vec(),
        document.content_class().to_string(),
        document.content_type().to_string(),
        document.schema_version(),
        version,
    )
}

fn print_document(client: &DbClient, document: &Document) -> Result<(), QuillError> {
    let value: serde_json::Value = client.contents_of(document)?;
    println!(
        "{} v{} {}",
        String::from_utf8_lossy(document.key()),
        document.instance_version(),
        value
    );
    Ok(())
}
