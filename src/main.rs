use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use hnswdb::{Config, NotFoundError, ValidationError, VectorDB, VectorDBError, VectorId};

#[derive(Parser)]
#[command(name = "hnswdb", about = "Embedded vector database with an HNSW index")]
struct Args {
    /// Path to the database file
    db_path: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Initialize a new database
    Init {
        /// Number of components per vector
        dimension: usize,
    },

    /// Add a vector, e.g. `add 1.0,2.0,3.0 '{"key": "val"}'`
    Add {
        /// Comma-separated floats
        #[arg(allow_hyphen_values = true)]
        vector: String,

        /// JSON metadata document
        metadata: String,
    },

    /// Print a vector and its metadata
    Get {
        /// Vector ID
        id: VectorId,
    },

    /// Replace a vector and its metadata
    Update {
        /// Vector ID
        id: VectorId,

        /// Comma-separated floats
        #[arg(allow_hyphen_values = true)]
        vector: String,

        /// JSON metadata document
        metadata: String,
    },

    /// Delete a vector
    Delete {
        /// Vector ID
        id: VectorId,
    },

    /// Rebuild the HNSW index from stored vectors
    Rebuild,

    /// Print the k nearest neighbors of a query vector
    Search {
        /// Number of neighbors
        k: usize,

        /// Comma-separated floats
        #[arg(allow_hyphen_values = true)]
        vector: String,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> hnswdb::Result<()> {
    // Only search needs the graph at open; rebuild builds it explicitly.
    let config = Config {
        auto_rebuild: false,
        rebuild_on_open: matches!(args.command, Command::Search { .. }),
        ..Config::default()
    };

    let path = args.db_path;

    if let Command::Init { dimension } = args.command {
        let db = VectorDB::create(&path, dimension, config)?;
        println!(
            "Database initialized at '{}' with dimension {}",
            path.display(),
            dimension
        );
        return db.close();
    }

    let db = VectorDB::open(&path, config)?;

    match args.command {
        Command::Init { .. } => {}
        Command::Add { vector, metadata } => {
            let vector = parse_vector(&vector)?;
            let metadata = parse_metadata(&metadata)?;
            let id = db.add_vector(&vector, metadata)?;
            println!("Vector added with ID: {}", id);
        }
        Command::Get { id } => {
            let record = db
                .get_vector(id)?
                .ok_or_else(|| VectorDBError::from(NotFoundError::vector(id)))?;
            println!("ID: {}", record.id);
            println!("Metadata: {}", serde_json::to_string_pretty(&record.metadata)?);
            println!("Vector: {}", format_vector(&record.vector));
        }
        Command::Update {
            id,
            vector,
            metadata,
        } => {
            let vector = parse_vector(&vector)?;
            let metadata = parse_metadata(&metadata)?;
            if !db.update_vector(id, &vector, metadata)? {
                return Err(NotFoundError::vector(id).into());
            }
            println!("Vector {} updated", id);
        }
        Command::Delete { id } => {
            if !db.delete_vector(id)? {
                return Err(NotFoundError::vector(id).into());
            }
            println!("Vector {} deleted", id);
        }
        Command::Rebuild => {
            println!("Rebuilding index...");
            db.rebuild_index()?;
            println!("Index rebuilt over {} vectors", db.len()?);
        }
        Command::Search { k, vector } => {
            let query = parse_vector(&vector)?;
            let results = db.search(&query, k)?;

            println!("Search results (ID, Distance):");
            if results.is_empty() {
                println!("No results found.");
            }
            for hit in results {
                println!("- ID: {}, Dist: {}", hit.id, hit.euclidean());
            }
        }
    }

    db.close()
}

/// Parses `"1.0,2.0,3.0"` into its components.
fn parse_vector(s: &str) -> Result<Vec<f32>, VectorDBError> {
    s.split(',')
        .map(|item| {
            item.trim().parse::<f32>().map_err(|_| {
                ValidationError::invalid_field(
                    "vector",
                    format!("'{}' is not a number; expected comma-separated floats", item),
                )
                .into()
            })
        })
        .collect()
}

fn parse_metadata(s: &str) -> Result<Value, VectorDBError> {
    Ok(serde_json::from_str(s)?)
}

fn format_vector(vector: &[f32]) -> String {
    let parts: Vec<String> = vector.iter().map(f32::to_string).collect();
    format!("[{}]", parts.join(", "))
}
