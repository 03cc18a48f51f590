//! Entity Catalog CLI
//!
//! Register entity types, manage entities, and export both to CSV.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use entity_catalog::{
    CatalogConfig, CatalogError, Database, EntityData, EntityId, EntityStore, Exporter,
    SchemaRegistry,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "catalog")]
#[command(about = "Dynamic-schema entity catalog")]
struct Cli {
    /// Config file to load (optional)
    #[arg(short, long)]
    config: Option<String>,

    /// Database file (overrides config)
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Login user
    #[arg(short, long, env = "CATALOG_USER")]
    user: Option<String>,

    /// Login password
    #[arg(short, long, env = "CATALOG_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage entity types
    Types {
        #[command(subcommand)]
        command: TypeCommands,
    },

    /// Manage entities
    Entities {
        #[command(subcommand)]
        command: EntityCommands,
    },

    /// Export to timestamped CSV files
    Export {
        #[command(subcommand)]
        command: ExportCommands,
    },

    /// Show where the database lives
    Whereis,
}

#[derive(Subcommand)]
enum TypeCommands {
    /// Register a type, replacing its attributes if it already exists
    Register {
        /// Type name
        name: String,
        /// Attribute name (repeatable)
        #[arg(short, long = "attr")]
        attributes: Vec<String>,
    },

    /// List all types
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Fuzzy search type names
    Search {
        query: String,
        #[arg(short, long, default_value_t = 5)]
        limit: usize,
    },
}

#[derive(Subcommand)]
enum EntityCommands {
    /// Create an entity from key=value fields
    Create {
        /// Entity type name
        type_name: String,
        /// Fields as key=value
        #[arg(value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },

    /// List entities
    List {
        /// Only entities of this type
        #[arg(short = 't', long = "type")]
        type_name: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one entity
    Get { id: EntityId },

    /// Merge key=value fields into an entity
    Update {
        id: EntityId,
        #[arg(value_parser = parse_field, required = true)]
        fields: Vec<(String, String)>,
    },

    /// Delete an entity
    Delete { id: EntityId },
}

#[derive(Subcommand)]
enum ExportCommands {
    /// Export entity types
    Types,
    /// Export entities
    Entities,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = CatalogConfig::load_from(cli.config.as_deref())
        .context("failed to load configuration")?;
    let db_path = cli
        .database
        .clone()
        .unwrap_or_else(|| config.database_path());

    if let Commands::Whereis = cli.command {
        println!("{}", db_path.display());
        return Ok(());
    }

    let session = config.auth.login(
        cli.user.as_deref().unwrap_or_default(),
        cli.password.as_deref().unwrap_or_default(),
    )?;
    tracing::debug!(user = %session.user, role = ?session.role, "session opened");

    let db = Database::open(&db_path)
        .with_context(|| format!("failed to open database {}", db_path.display()))?;
    let registry = SchemaRegistry::new(db.clone());
    let store = EntityStore::new(db);

    match cli.command {
        Commands::Types { command } => run_types(&registry, command),
        Commands::Entities { command } => run_entities(&registry, &store, command),
        Commands::Export { command } => {
            let exporter = Exporter::new(config.export_dir());
            println!("📂 Exporting into {}", exporter.dir().display());
            let path = match command {
                ExportCommands::Types => exporter.export_entity_types(&registry.list_types()?)?,
                ExportCommands::Entities => exporter.export_entities(&store.list_entities(None)?)?,
            };
            println!("✅ Exported to {}", path.display());
            Ok(())
        }
        Commands::Whereis => Ok(()),
    }
}

fn run_types(registry: &SchemaRegistry, command: TypeCommands) -> anyhow::Result<()> {
    match command {
        TypeCommands::Register { name, attributes } => {
            registry.register_type(&name, attributes)?;
            println!("✅ Entity type {} registered", name);
        }

        TypeCommands::List { json } => {
            let types = registry.list_types()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&types)?);
            } else if types.is_empty() {
                println!("No entity types registered yet.");
            } else {
                println!("📚 Entity types:");
                for t in types {
                    println!("  {} [{}]", t.name, t.attributes.join(", "));
                }
            }
        }

        TypeCommands::Search { query, limit } => {
            for hit in registry.search_types(&query, limit)? {
                println!("  {} (score {})", hit.name, hit.score);
            }
        }
    }
    Ok(())
}

fn run_entities(
    registry: &SchemaRegistry,
    store: &EntityStore,
    command: EntityCommands,
) -> anyhow::Result<()> {
    match command {
        EntityCommands::Create { type_name, fields } => {
            let data: EntityData = fields.into_iter().collect();
            match store.create_entity(&type_name, &data) {
                Ok(id) => println!("✅ Entity created with ID {}", id),
                Err(e @ CatalogError::TypeNotFound { .. }) => {
                    if let Some(hit) = registry.search_types(&type_name, 1)?.first() {
                        bail!("{} (did you mean {}?)", e, hit.name);
                    }
                    return Err(e.into());
                }
                Err(e) => return Err(e.into()),
            }
        }

        EntityCommands::List { type_name, json } => {
            let entities = store.list_entities(type_name.as_deref())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entities)?);
            } else if entities.is_empty() {
                println!("No entities found.");
            } else {
                for entity in entities {
                    let fields: Vec<String> = entity
                        .data
                        .iter()
                        .map(|(k, v)| format!("{}={}", k, v))
                        .collect();
                    println!(
                        "  #{} {} {} [{}]",
                        entity.id,
                        entity.type_name,
                        entity.created_at.format("%Y-%m-%d %H:%M:%S"),
                        fields.join(", ")
                    );
                }
            }
        }

        EntityCommands::Get { id } => {
            let entity = store
                .get_entity(id)?
                .ok_or(CatalogError::EntityNotFound { id })?;
            println!("{}", serde_json::to_string_pretty(&entity)?);

            match registry.get_type(&entity.type_name)? {
                Some(entity_type) => {
                    let undeclared = entity.undeclared_keys(&entity_type);
                    if !undeclared.is_empty() {
                        println!(
                            "⚠️  Keys not declared by {}: {}",
                            entity_type.name,
                            undeclared.join(", ")
                        );
                    }
                }
                None => println!("⚠️  Entity type {} is no longer registered", entity.type_name),
            }
        }

        EntityCommands::Update { id, fields } => {
            let data: EntityData = fields.into_iter().collect();
            store.update_entity(id, &data)?;
            println!("✅ Entity {} updated", id);
        }

        EntityCommands::Delete { id } => {
            store.delete_entity(id)?;
            println!("✅ Entity {} deleted", id);
        }
    }
    Ok(())
}

fn parse_field(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    if key.is_empty() {
        return Err(format!("empty key in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}
