//! Inspection commands for declared entities.
//!
//! Loads a declaration file, reads one entity record from JSON and prints what
//! the resolver makes of it.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};

use docmap_core::config::{Config, Settings};
use docmap_resolver::{DeclarationFile, MetadataResolver, Record};

#[derive(Parser, Debug)]
#[command(name = "docmap")]
#[command(author, version, about = "Resolve search document mappings for declared entities", long_about = None)]
pub struct Cli {
    /// Path to config file (defaults to docmap.toml + docmap.<RUST_ENV>.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// TOML file declaring entity classes
    #[arg(short, long)]
    pub declarations: PathBuf,

    /// JSON file holding one entity record
    #[arg(short, long)]
    pub entity: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Field descriptors with current values
    Fields,
    /// The identifier descriptor
    Identifier,
    /// Index field name to source member mapping
    Mapping,
    /// Class-level boost
    Boost,
    /// Repository declared for the class
    Repository,
    /// Whether the class declares itself a document
    Document,
    /// Synchronization callback and its outcome for this record
    Sync,
    /// Everything above in one object
    Describe,
}

pub fn load_settings(config: Option<&Path>) -> Result<Settings> {
    let config = match config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };
    config.settings()
}

pub fn init_tracing(level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set tracing subscriber")
}

pub fn read_record(path: &Path) -> Result<Record> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing entity record {}", path.display()))
}

pub fn run(command: Commands, declarations: &Path, record: &Record, settings: &Settings) -> Result<Value> {
    let registry = DeclarationFile::from_path(declarations)?.into_registry();
    let resolver = MetadataResolver::with_settings(registry, settings);
    tracing::debug!(class = %record.class, ?command, "resolving");

    let out = match command {
        Commands::Fields => serde_json::to_value(resolver.get_fields(record)?)?,
        Commands::Identifier => serde_json::to_value(resolver.get_identifier(record)?)?,
        Commands::Mapping => serde_json::to_value(resolver.get_field_mapping(record)?)?,
        Commands::Boost => json!(resolver.get_entity_boost(record)?),
        Commands::Repository => json!(resolver.get_repository(record)),
        Commands::Document => json!(resolver.has_document_declaration(record)),
        Commands::Sync => json!({
            "callback": resolver.get_synchronization_callback(record),
            "synchronize": resolver.should_synchronize(record)?,
        }),
        Commands::Describe => serde_json::to_value(resolver.describe(record)?)?,
    };
    Ok(out)
}
