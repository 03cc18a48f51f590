//! Catalog Config CLI
//!
//! View and manage entity catalog configuration.

use clap::{Parser, Subcommand};
use entity_catalog::CatalogConfig;

#[derive(Parser)]
#[command(name = "catalog-config")]
#[command(about = "View and manage entity catalog configuration")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show current configuration
    Show {
        /// Config file to load (optional)
        #[arg(short, long)]
        config: Option<String>,

        /// Output as TOML
        #[arg(long)]
        toml: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Initialize a new config file
    Init {
        /// Output path (default: catalog.toml)
        #[arg(short, long, default_value = "catalog.toml")]
        output: String,
    },

    /// Validate configuration
    Validate {
        /// Config file to validate
        #[arg(short, long)]
        config: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Show { config, toml, json } => {
            let cfg = CatalogConfig::load_from(config.as_deref())?;

            if json {
                println!("{}", serde_json::to_string_pretty(&cfg)?);
            } else if toml {
                println!("{}", ::toml::to_string_pretty(&cfg)?);
            } else {
                println!("📋 Entity Catalog Configuration\n");
                println!("Database:");
                println!("  Path: {}", cfg.database_path().display());

                println!("\nExport:");
                println!("  Directory: {}", cfg.export_dir().display());

                println!("\nAuth:");
                println!("  Username: {}", cfg.auth.username);
            }
        }

        Commands::Init { output } => {
            let cfg = CatalogConfig::default();
            cfg.save(&output)?;
            println!("✅ Created config file: {}", output);
        }

        Commands::Validate { config } => match CatalogConfig::load_from(config.as_deref()) {
            Ok(cfg) => {
                println!("✅ Configuration is valid");
                println!("   Database: {}", cfg.database_path().display());
                println!("   Exports: {}", cfg.export_dir().display());
            }
            Err(e) => {
                eprintln!("❌ Configuration error: {}", e);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}
