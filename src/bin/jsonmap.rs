//! JSON Mapper CLI
//!
//! Normalizes JSON documents through declared schemas.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use familiar_jsonmap::{MapperConfig, Record, SchemaSet};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "jsonmap")]
#[command(about = "Normalize JSON documents through declared schemas")]
struct Cli {
    /// Schema declaration file (JSON)
    #[arg(short, long, default_value = "schemas.json")]
    schemas: PathBuf,

    /// Config file (TOML)
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a record from a document and print its raw form
    Normalize {
        /// Schema name
        schema: String,
        /// Input document (stdin when omitted)
        input: Option<PathBuf>,
    },

    /// Print one field of a document in typed form
    Get {
        /// Schema name
        schema: String,
        /// Attribute name
        field: String,
        /// Input document (stdin when omitted)
        input: Option<PathBuf>,
    },

    /// List declared schemas, or the fields of one schema
    Fields {
        /// Schema name
        schema: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = match MapperConfig::load_from(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log.filter.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli, &config) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli, config: &MapperConfig) -> anyhow::Result<()> {
    let schemas = SchemaSet::load(&cli.schemas)
        .with_context(|| format!("loading schemas from {}", cli.schemas.display()))?;

    match cli.command {
        Commands::Normalize { schema, input } => {
            let schema = schemas.require(&schema)?;
            let record = build_record(schema, input.as_deref(), config)?;
            println!("{}", config.render(&record.to_json())?);
            Ok(())
        }

        Commands::Get {
            schema,
            field,
            input,
        } => {
            let schema = schemas.require(&schema)?;
            let record = build_record(schema, input.as_deref(), config)?;
            println!("{}", record.get(&field)?);
            Ok(())
        }

        Commands::Fields { schema: None } => {
            for name in schemas.names() {
                println!("{}", name);
            }
            Ok(())
        }

        Commands::Fields { schema: Some(name) } => {
            let schema = schemas.require(&name)?;
            println!("{}", schema.name());
            for (attr, field) in schema.fields() {
                match field.name() {
                    Some(key) if key != attr => {
                        println!("  {} ({}) -> {}", attr, field.kind_name(), key)
                    }
                    _ => println!("  {} ({})", attr, field.kind_name()),
                }
            }
            Ok(())
        }
    }
}

fn build_record(
    schema: &familiar_jsonmap::Schema,
    input: Option<&Path>,
    config: &MapperConfig,
) -> anyhow::Result<Record> {
    let content = match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let document: Value = serde_json::from_str(&content)?;
    let Value::Object(map) = document else {
        bail!("expected a JSON object at the document root");
    };

    Ok(Record::with_options(schema, map, config.construct_options())?)
}
