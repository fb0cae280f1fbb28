//! Mapflow CLI — inspect marker normalization, filtering, and stored drawings.
//!
//! Usage:
//!   mapflow normalize <records.json>
//!   mapflow filter <records.json> [--search term] [--field Name=Value]...
//!   mapflow document <subcommand> [--db path]

use clap::{Parser, Subcommand};
use mapflow::{filter, normalize, FilterState, SqliteDocumentStore};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mapflow", version, about = "Map data & interaction engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize a JSON file of raw records into canonical markers
    Normalize {
        /// Path to a JSON array of records
        file: PathBuf,
    },
    /// Normalize records and print the subset a filter state keeps
    Filter {
        /// Path to a JSON array of records
        file: PathBuf,
        /// Free-text search term
        #[arg(long)]
        search: Option<String>,
        /// Per-field filter as Name=Value (repeatable)
        #[arg(long = "field", value_name = "NAME=VALUE")]
        fields: Vec<String>,
    },
    /// Inspect persisted drawing documents
    Document {
        #[command(subcommand)]
        action: DocumentAction,
        /// Path to SQLite database file
        #[arg(long, global = true)]
        db: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum DocumentAction {
    /// Print one document's GeoJSON content
    Get {
        /// Document id
        id: String,
    },
    /// List documents linked to an entity
    List {
        /// Linked entity id
        entity: String,
    },
}

/// Get the default database path (~/.local/share/mapflow/mapflow.db)
fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    let mapflow_dir = data_dir.join("mapflow");
    std::fs::create_dir_all(&mapflow_dir).ok();
    mapflow_dir.join("mapflow.db")
}

fn read_records(file: &PathBuf) -> Result<Vec<serde_json::Value>, String> {
    let raw = std::fs::read_to_string(file)
        .map_err(|e| format!("cannot read '{}': {}", file.display(), e))?;
    serde_json::from_str(&raw).map_err(|e| format!("invalid records JSON: {}", e))
}

fn print_markers(markers: &[mapflow::Marker]) {
    println!("{:<20}  {:<24}  {:>10}  {:>11}  ADDRESS", "ID", "TITLE", "LAT", "LNG");
    println!("{}", "-".repeat(96));
    for m in markers {
        let fmt = |v: Option<f64>| v.map(|v| format!("{v:.4}")).unwrap_or_else(|| "-".to_string());
        println!(
            "{:<20}  {:<24}  {:>10}  {:>11}  {}",
            m.id,
            m.title,
            fmt(m.latitude),
            fmt(m.longitude),
            m.address
        );
    }
}

fn cmd_normalize(file: &PathBuf) -> i32 {
    let records = match read_records(file) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let markers = normalize(&records);
    print_markers(&markers);
    println!("{} markers", markers.len());
    0
}

fn cmd_filter(file: &PathBuf, search: Option<String>, fields: &[String]) -> i32 {
    let records = match read_records(file) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let mut state = FilterState::new();
    if let Some(term) = search {
        state.search_term = term;
    }
    for pair in fields {
        match pair.split_once('=') {
            Some((name, value)) => {
                state.field_values.insert(name.to_string(), value.to_string());
            }
            None => {
                eprintln!("Error: field filter '{}' is not NAME=VALUE", pair);
                return 1;
            }
        }
    }
    let markers = normalize(&records);
    let visible = filter::apply(&markers, &state);
    print_markers(&visible);
    println!("{} of {} markers visible", visible.len(), markers.len());
    0
}

fn open_store(db: Option<PathBuf>) -> Result<SqliteDocumentStore, String> {
    let db_path = db.unwrap_or_else(default_db_path);
    SqliteDocumentStore::open(&db_path).map_err(|e| format!("Failed to open database: {}", e))
}

fn cmd_document_get(store: &SqliteDocumentStore, id: &str) -> i32 {
    match store.get_document(id) {
        Ok(doc) => {
            println!("{}", doc.content);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_document_list(store: &SqliteDocumentStore, entity: &str) -> i32 {
    let docs = match store.list_documents(entity) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    if docs.is_empty() {
        println!("No documents for entity '{}'.", entity);
        return 0;
    }
    println!("{:<36}  {:<24}  {:<20}", "ID", "TITLE", "UPDATED");
    println!("{}", "-".repeat(84));
    for doc in docs {
        println!(
            "{:<36}  {:<24}  {:<20}",
            doc.id,
            doc.title,
            doc.updated_at.format("%Y-%m-%d %H:%M:%S")
        );
    }
    0
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let code = match cli.command {
        Commands::Normalize { file } => cmd_normalize(&file),
        Commands::Filter { file, search, fields } => cmd_filter(&file, search, &fields),
        Commands::Document { action, db } => {
            let store = match open_store(db) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            };
            match action {
                DocumentAction::Get { id } => cmd_document_get(&store, &id),
                DocumentAction::List { entity } => cmd_document_list(&store, &entity),
            }
        }
    };
    std::process::exit(code);
}
